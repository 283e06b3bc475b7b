use std::fmt::{self, Display};

use blake2::{digest::consts::U32, Blake2b, Blake2s256};
use digest::{Digest as _, DynDigest};
use md4::Md4;
use md5::Md5;
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};
use sha3::{Sha3_224, Sha3_256, Sha3_384, Sha3_512};

use crate::{
    error::{UnhashError, UnhashResult},
    ntlm::utf16_le,
};

/// Something able to turn a candidate into a digest string.
///
/// Implementations must not fail: a provider that cannot compute its own digest
/// is expected to recover by itself, see [`fallback_digest`].
pub trait HashProvider: Send + Sync {
    /// Returns the digest of `input` as a string, usually lowercase hexadecimal.
    fn digest(&self, input: &[u8]) -> String;
}

/// All the built-in hash functions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HashFunction {
    Ntlm,
    Md4,
    Md5,
    Sha1,
    Sha2_224,
    Sha2_256,
    Sha2_384,
    Sha2_512,
    Sha3_224,
    Sha3_256,
    Sha3_384,
    Sha3_512,
    Blake2b,
    Blake2s,
}

impl HashFunction {
    pub const ALL: [HashFunction; 14] = [
        Self::Ntlm,
        Self::Md4,
        Self::Md5,
        Self::Sha1,
        Self::Sha2_224,
        Self::Sha2_256,
        Self::Sha2_384,
        Self::Sha2_512,
        Self::Sha3_224,
        Self::Sha3_256,
        Self::Sha3_384,
        Self::Sha3_512,
        Self::Blake2b,
        Self::Blake2s,
    ];

    /// Returns the CPU implementation of this hash.
    /// NTLM is MD4 over the UTF-16LE encoding of the input, the encoding is done by [`HashProvider::digest`].
    pub fn cpu(&self) -> Box<dyn DynDigest> {
        match self {
            Self::Ntlm | Self::Md4 => Box::new(Md4::new()),
            Self::Md5 => Box::new(Md5::new()),
            Self::Sha1 => Box::new(Sha1::new()),
            Self::Sha2_224 => Box::new(Sha224::new()),
            Self::Sha2_256 => Box::new(Sha256::new()),
            Self::Sha2_384 => Box::new(Sha384::new()),
            Self::Sha2_512 => Box::new(Sha512::new()),
            Self::Sha3_224 => Box::new(Sha3_224::new()),
            Self::Sha3_256 => Box::new(Sha3_256::new()),
            Self::Sha3_384 => Box::new(Sha3_384::new()),
            Self::Sha3_512 => Box::new(Sha3_512::new()),
            Self::Blake2b => Box::new(Blake2b::<U32>::new()),
            Self::Blake2s => Box::new(Blake2s256::new()),
        }
    }

    /// The identifier this hash is registered under.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Ntlm => "NTLM",
            Self::Md4 => "MD4",
            Self::Md5 => "MD5",
            Self::Sha1 => "SHA1",
            Self::Sha2_224 => "SHA224",
            Self::Sha2_256 => "SHA256",
            Self::Sha2_384 => "SHA384",
            Self::Sha2_512 => "SHA512",
            Self::Sha3_224 => "SHA3_224",
            Self::Sha3_256 => "SHA3_256",
            Self::Sha3_384 => "SHA3_384",
            Self::Sha3_512 => "SHA3_512",
            Self::Blake2b => "BLAKE2B",
            Self::Blake2s => "BLAKE2S",
        }
    }

    /// The size of a digest in bytes.
    pub fn digest_size(&self) -> usize {
        self.cpu().output_size()
    }
}

impl HashProvider for HashFunction {
    fn digest(&self, input: &[u8]) -> String {
        let mut hasher = self.cpu();

        if *self == Self::Ntlm {
            hasher.update(&utf16_le(input));
        } else {
            hasher.update(input);
        }

        hex::encode(hasher.finalize())
    }
}

impl Display for HashFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// The digest used when a provider fails: lowercase hexadecimal MD5.
pub fn fallback_digest(input: &[u8]) -> String {
    HashFunction::Md5.digest(input)
}

/// The digest a search is looking a preimage for, normalized to lowercase.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TargetDigest(String);

impl TargetDigest {
    /// Normalizes a target digest.
    /// Custom hashes may produce hex-like strings, so only emptiness and inner whitespace are rejected.
    pub fn new(digest: &str) -> UnhashResult<Self> {
        let digest = digest.trim();

        if digest.is_empty() || digest.contains(char::is_whitespace) {
            return Err(UnhashError::InvalidDigest(digest.to_owned()));
        }

        Ok(Self(digest.to_lowercase()))
    }

    /// Returns true if the given digest is exactly this target.
    #[inline]
    pub fn matches(&self, digest: &str) -> bool {
        self.0 == digest
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TargetDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
