//! Finds the plaintext behind a hash digest, by exhaustive charset enumeration,
//! by scanning a word list or by looking it up in a precomputed table.
//!
//! Searches run on their own thread and report their progress through events,
//! see [`SearchJob::spawn`].

mod charset;
mod custom;
mod dictionary;
mod error;
mod event;
mod hash;
mod job;
mod ntlm;
mod progress;
mod rainbow_table;
mod registry;
mod source;

pub use charset::{
    charset_from_preset, CharsetEnumerator, CharsetSpec, DIGITS, LOWERCASE, PUNCTUATION,
    UPPERCASE,
};
pub use custom::CustomHash;
pub use dictionary::DictionaryScanner;
pub use error::{UnhashError, UnhashResult};
pub use event::{Event, MatchResult, Outcome, SearchHandle, SearchReport};
pub use hash::{fallback_digest, HashFunction, HashProvider, TargetDigest};
pub use job::{JobBuilder, JobState, SearchJob, Strategy};
pub use ntlm::utf16_le;
pub use progress::{CancellationToken, ProgressEvent, ProgressReporter};
pub use rainbow_table::{RainbowEntry, RainbowLookup};
pub use registry::{AlgorithmId, HashRegistry};
pub use source::{Line, Lines};

/// The algorithm used when none is given.
pub const DEFAULT_ALGORITHM: &str = "MD5";

/// The default minimum candidate length.
pub const DEFAULT_MIN_LENGTH: usize = 1;

/// The default maximum candidate length.
pub const DEFAULT_MAX_LENGTH: usize = 4;

/// The longest candidate a charset search can produce.
/// Any charset of two characters or more overflows the search space before that.
pub const MAX_LENGTH_ALLOWED: usize = 64;

/// A charset search reports its progress every this many candidates.
pub const CHARSET_REPORT_INTERVAL: u64 = 10_000;

/// Dictionary and rainbow searches report their progress every this many lines.
pub const STREAM_REPORT_INTERVAL: u64 = 1_000;

/// The digest size of both BLAKE2 variants, in bytes.
pub const BLAKE2_DIGEST_SIZE: usize = 32;

/// The identifier a host supplied hash function is bound to.
pub const CUSTOM_ALGORITHM: &str = "CUSTOM";
