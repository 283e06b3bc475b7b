use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use tracing::{debug, trace};

use crate::{
    dictionary::DictionaryScanner,
    error::{UnhashError, UnhashResult},
    hash::{HashProvider, TargetDigest},
    source::{self, Lines},
};

/// An entry of a rainbow table, `digest:plaintext`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RainbowEntry {
    /// The digest, lowercase.
    pub digest: String,
    pub plaintext: String,
}

impl RainbowEntry {
    /// Parses a trimmed line. The digest ends at the first colon, so the plaintext may contain colons.
    /// Returns `None` for lines without a colon.
    pub fn parse(line: &str) -> Option<Self> {
        let (digest, plaintext) = line.split_once(':')?;

        Some(Self {
            digest: digest.to_lowercase(),
            plaintext: plaintext.to_owned(),
        })
    }
}

/// A plain text rainbow table: precomputed `digest:plaintext` pairs, one per line.
///
/// Looking up a digest never hashes anything, the target is compared to the
/// stored digests directly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RainbowLookup {
    path: PathBuf,
}

impl RainbowLookup {
    /// Creates a lookup without touching the file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a lookup and makes sure the file can be opened.
    pub fn open(path: impl Into<PathBuf>) -> UnhashResult<Self> {
        let table = Self::new(path);
        source::open(&table.path)?;

        Ok(table)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Counts the lines of the table, blank and malformed lines included.
    pub fn count_lines(&self) -> UnhashResult<u64> {
        source::count_lines(&self.path)
    }

    /// Returns every trimmed line with its line number.
    pub fn lines(&self) -> UnhashResult<Lines<BufReader<File>>> {
        Ok(Lines::new(source::open(&self.path)?))
    }

    /// Returns the well-formed entries of the table.
    pub fn entries(&self) -> UnhashResult<impl Iterator<Item = RainbowEntry>> {
        Ok(self.lines()?.filter_map(|line| {
            let entry = RainbowEntry::parse(&line.text);
            if entry.is_none() && !line.text.is_empty() {
                trace!(line = line.number, "skipping a rainbow table line without a colon");
            }
            entry
        }))
    }

    /// Finds the first entry whose digest is the target.
    pub fn find(&self, target: &TargetDigest) -> UnhashResult<Option<RainbowEntry>> {
        Ok(self.entries()?.find(|entry| target.matches(&entry.digest)))
    }

    /// Writes a rainbow table with an entry for every candidate of a dictionary,
    /// overwriting the file at `path`.
    pub fn generate(
        dictionary: &DictionaryScanner,
        provider: &dyn HashProvider,
        path: impl Into<PathBuf>,
    ) -> UnhashResult<Self> {
        let table = Self::new(path);
        let written = table.write_entries(dictionary, provider)?;
        debug!(path = %table.path.display(), written, "generated a rainbow table");

        Ok(table)
    }

    fn write_entries(
        &self,
        dictionary: &DictionaryScanner,
        provider: &dyn HashProvider,
    ) -> UnhashResult<u64> {
        let io_error = |err| UnhashError::unavailable(&self.path, err);

        let file = File::options()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)
            .map_err(io_error)?;

        let mut writer = BufWriter::with_capacity(1024 * 1024, file);
        let mut written = 0;

        for candidate in dictionary.candidates()? {
            let digest = provider.digest(candidate.as_bytes());
            writeln!(writer, "{digest}:{candidate}").map_err(io_error)?;
            written += 1;
        }

        writer.flush().map_err(io_error)?;

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::{RainbowEntry, RainbowLookup};
    use crate::{
        dictionary::DictionaryScanner,
        hash::{HashFunction, TargetDigest},
    };

    fn table(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            Some(RainbowEntry {
                digest: "abcdef".to_owned(),
                plaintext: "a:b:c".to_owned()
            }),
            RainbowEntry::parse("ABCdef:a:b:c")
        );
        assert_eq!(None, RainbowEntry::parse("no colon here"));
    }

    #[test]
    fn test_find_is_case_insensitive() {
        let file = table(b"5f4dcc3b5aa765d61d8327deb882cf99:password\n");
        let lookup = RainbowLookup::open(file.path()).unwrap();

        let target = TargetDigest::new("5F4DCC3B5AA765D61D8327DEB882CF99").unwrap();
        let entry = lookup.find(&target).unwrap().unwrap();
        assert_eq!("password", entry.plaintext);
        assert_eq!("5f4dcc3b5aa765d61d8327deb882cf99", entry.digest);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let file = table(b"garbage\n\n827CCB0EEA8A706C4C34A16891F84E7B:12345\n");
        let lookup = RainbowLookup::new(file.path());

        assert_eq!(3, lookup.count_lines().unwrap());

        let entries: Vec<_> = lookup.entries().unwrap().collect();
        assert_eq!(1, entries.len());
        assert_eq!("827ccb0eea8a706c4c34a16891f84e7b", entries[0].digest);
    }

    #[test]
    fn test_generate() {
        let words = table(b"password\n\n12345\n");
        let dictionary = DictionaryScanner::open(words.path()).unwrap();
        let out = tempfile::tempdir().unwrap();

        let lookup =
            RainbowLookup::generate(&dictionary, &HashFunction::Md5, out.path().join("md5.txt"))
                .unwrap();

        let entries: Vec<_> = lookup.entries().unwrap().collect();
        assert_eq!(2, entries.len());

        let target = TargetDigest::new("827ccb0eea8a706c4c34a16891f84e7b").unwrap();
        assert_eq!("12345", lookup.find(&target).unwrap().unwrap().plaintext);
    }
}
