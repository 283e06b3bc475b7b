use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use crate::{
    error::UnhashResult,
    source::{self, Lines},
};

/// A word list, one candidate per line.
///
/// The file is read twice by a search: once to count its lines and once to
/// test its candidates. Both passes open the file again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DictionaryScanner {
    path: PathBuf,
}

impl DictionaryScanner {
    /// Creates a scanner without touching the file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a scanner and makes sure the file can be opened.
    pub fn open(path: impl Into<PathBuf>) -> UnhashResult<Self> {
        let scanner = Self::new(path);
        source::open(&scanner.path)?;

        Ok(scanner)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Counts the lines of the word list, blank lines included.
    pub fn count_lines(&self) -> UnhashResult<u64> {
        source::count_lines(&self.path)
    }

    /// Returns every trimmed line, blank lines included, with its line number.
    pub fn lines(&self) -> UnhashResult<Lines<BufReader<File>>> {
        Ok(Lines::new(source::open(&self.path)?))
    }

    /// Returns the candidates of the word list: trimmed lines, blank lines skipped.
    pub fn candidates(&self) -> UnhashResult<impl Iterator<Item = String>> {
        Ok(self
            .lines()?
            .map(|line| line.text)
            .filter(|text| !text.is_empty()))
    }
}
