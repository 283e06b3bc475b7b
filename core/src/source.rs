//! Line streaming shared by the dictionary and rainbow table strategies.

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use tracing::warn;

use crate::error::{UnhashError, UnhashResult};

const READ_BUFFER_CAPACITY: usize = 1024 * 1024;

/// Opens a text resource for reading.
/// Directories and other non-regular files open fine on some platforms, they are rejected here.
pub(crate) fn open(path: &Path) -> UnhashResult<BufReader<File>> {
    let file = File::open(path).map_err(|err| UnhashError::unavailable(path, err))?;
    let metadata = file
        .metadata()
        .map_err(|err| UnhashError::unavailable(path, err))?;

    if !metadata.is_file() {
        return Err(UnhashError::unavailable(
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
        ));
    }

    Ok(BufReader::with_capacity(READ_BUFFER_CAPACITY, file))
}

/// Counts the lines of a text resource, including blank ones.
pub(crate) fn count_lines(path: &Path) -> UnhashResult<u64> {
    let mut count = 0;

    for line in open(path)?.split(b'\n') {
        line.map_err(|err| UnhashError::unavailable(path, err))?;
        count += 1;
    }

    Ok(count)
}

/// A line of a text resource, decoded permissively and trimmed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    /// The 1-indexed line number.
    pub number: u64,
    pub text: String,
}

/// An iterator over the lines of a text resource.
///
/// Invalid UTF-8 is replaced. A read error ends the iteration early instead of
/// failing, the error is only logged.
pub struct Lines<R> {
    reader: R,
    buf: Vec<u8>,
    number: u64,
}

impl<R: BufRead> Lines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            number: 0,
        }
    }
}

impl<R: BufRead> Iterator for Lines<R> {
    type Item = Line;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();

        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                self.number += 1;
                Some(Line {
                    number: self.number,
                    text: String::from_utf8_lossy(&self.buf).trim().to_owned(),
                })
            }
            Err(err) => {
                warn!(%err, line = self.number + 1, "stopped reading the resource");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{io::Write, path::Path};

    use tempfile::NamedTempFile;

    use super::{count_lines, open, Line, Lines};
    use crate::error::UnhashError;

    #[test]
    fn test_lines() {
        let lines: Vec<_> = Lines::new(b"  one \r\n\ntwo".as_slice()).collect();

        assert_eq!(
            vec![
                Line {
                    number: 1,
                    text: "one".to_owned()
                },
                Line {
                    number: 2,
                    text: String::new()
                },
                Line {
                    number: 3,
                    text: "two".to_owned()
                },
            ],
            lines
        );
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let lines: Vec<_> = Lines::new(b"caf\xe9\n".as_slice()).collect();
        assert_eq!("caf\u{fffd}", lines[0].text);
    }

    #[test]
    fn test_count_lines() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"a\n\nb\nc").unwrap();

        assert_eq!(4, count_lines(file.path()).unwrap());
    }

    #[test]
    fn test_directory_is_not_a_resource() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            open(dir.path()),
            Err(UnhashError::ResourceUnavailable { .. })
        ));
        assert!(count_lines(dir.path()).is_err());
    }

    #[test]
    fn test_missing_resource() {
        assert!(matches!(
            count_lines(Path::new("/definitely/not/here.txt")),
            Err(UnhashError::ResourceUnavailable { .. })
        ));
    }
}
