use std::iter::FusedIterator;

use crate::{
    error::{UnhashError, UnhashResult},
    MAX_LENGTH_ALLOWED,
};

/// Lowercase ASCII letters, preset `a`.
pub const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";

/// Uppercase ASCII letters, preset `A`.
pub const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// ASCII digits, preset `0`.
pub const DIGITS: &str = "0123456789";

/// ASCII punctuation, preset `!`.
pub const PUNCTUATION: &str = r##"!"#$%&'()*+,-./:;<=>?@[\]^_`{|}~"##;

/// Builds a charset from preset flags (`a`, `A`, `0`, `!`) followed by extra characters.
/// Unknown flags are ignored and duplicates are dropped later by [`CharsetSpec::new`].
pub fn charset_from_preset(preset: &str, extra: &str) -> String {
    let mut charset = String::new();

    for (flag, chars) in [
        ('a', LOWERCASE),
        ('A', UPPERCASE),
        ('0', DIGITS),
        ('!', PUNCTUATION),
    ] {
        if preset.contains(flag) {
            charset.push_str(chars);
        }
    }

    charset.push_str(extra);
    charset
}

/// An ordered set of characters and a range of lengths to enumerate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharsetSpec {
    /// The charset, in enumeration order.
    charset: Vec<char>,
    min_length: usize,
    max_length: usize,
    /// `search_spaces[i]` is the index of the first candidate of length `min_length + i`.
    /// The last element is the total number of candidates.
    search_spaces: Vec<u64>,
}

impl CharsetSpec {
    /// Creates a new charset specification.
    /// Repeated characters keep their first position.
    pub fn new(charset: &str, min_length: usize, max_length: usize) -> UnhashResult<Self> {
        let mut chars = Vec::new();
        for c in charset.chars() {
            if !chars.contains(&c) {
                chars.push(c);
            }
        }

        if chars.is_empty() {
            return Err(UnhashError::EmptyCharset);
        }

        if min_length == 0 || min_length > max_length || max_length > MAX_LENGTH_ALLOWED {
            return Err(UnhashError::InvalidRange {
                min: min_length,
                max: max_length,
            });
        }

        // create the search spaces
        let base = chars.len() as u64;
        let mut n: u64 = 0;
        let mut search_spaces = vec![n];

        for length in min_length..=max_length {
            n = u32::try_from(length)
                .ok()
                .and_then(|length| base.checked_pow(length))
                .and_then(|tier| n.checked_add(tier))
                .ok_or_else(|| {
                    let bits = (length as f64 * (base as f64).log2()).ceil();
                    UnhashError::Space(bits.clamp(65., 255.) as u8)
                })?;
            search_spaces.push(n);
        }

        Ok(Self {
            charset: chars,
            min_length,
            max_length,
            search_spaces,
        })
    }

    pub fn charset(&self) -> &[char] {
        &self.charset
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// The number of candidates, that is the sum of `len(charset)^L` for every length `L`.
    pub fn total(&self) -> u64 {
        self.search_spaces[self.search_spaces.len() - 1]
    }

    /// Returns a new enumeration of every candidate, shortest first.
    pub fn candidates(&self) -> CharsetEnumerator {
        CharsetEnumerator::new(self.clone())
    }

    /// Returns the charset positions of the candidate at `index` in the enumeration order.
    fn digits_at(&self, index: u64) -> Option<Vec<usize>> {
        if index >= self.total() {
            return None;
        }

        let tier = self
            .search_spaces
            .iter()
            .rposition(|space| index >= *space)?;

        let base = self.charset.len() as u64;
        let mut counter = index - self.search_spaces[tier];
        let mut digits = vec![0; self.min_length + tier];

        // the first character is the most significant digit
        for digit in digits.iter_mut().rev() {
            *digit = (counter % base) as usize;
            counter /= base;
        }

        Some(digits)
    }

    /// Creates the candidate found at `index` in the enumeration order.
    pub fn candidate_at(&self, index: u64) -> Option<String> {
        self.digits_at(index).map(|digits| self.plaintext(&digits))
    }

    /// Returns the position of a candidate in the enumeration order,
    /// or `None` if it cannot be produced by this specification.
    pub fn index_of(&self, candidate: &str) -> Option<u64> {
        let len = candidate.chars().count();
        if !(self.min_length..=self.max_length).contains(&len) {
            return None;
        }

        let base = self.charset.len() as u64;
        let mut counter = 0;
        for c in candidate.chars() {
            let digit = self.charset.iter().position(|x| *x == c)?;
            counter = counter * base + digit as u64;
        }

        Some(self.search_spaces[len - self.min_length] + counter)
    }

    fn plaintext(&self, digits: &[usize]) -> String {
        digits.iter().map(|&digit| self.charset[digit]).collect()
    }
}

/// A lazy enumeration of the candidates of a [`CharsetSpec`].
///
/// Candidates are ordered by length, then like an odometer where the first
/// character of the charset is the lowest digit and the leftmost position the
/// most significant one.
#[derive(Clone, Debug)]
pub struct CharsetEnumerator {
    spec: CharsetSpec,
    /// The charset positions of the next candidate.
    digits: Vec<usize>,
    /// The index of the next candidate.
    position: u64,
}

impl CharsetEnumerator {
    fn new(spec: CharsetSpec) -> Self {
        Self {
            digits: vec![0; spec.min_length],
            spec,
            position: 0,
        }
    }

    /// The number of candidates already produced.
    pub fn position(&self) -> u64 {
        self.position
    }

    fn advance(&mut self) {
        let base = self.spec.charset.len();

        for digit in self.digits.iter_mut().rev() {
            *digit += 1;
            if *digit < base {
                return;
            }
            *digit = 0;
        }

        // every position wrapped around, move on to the next length
        self.digits.push(0);
    }
}

impl Iterator for CharsetEnumerator {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.spec.total() {
            return None;
        }

        let candidate = self.spec.plaintext(&self.digits);
        self.position += 1;
        self.advance();

        Some(candidate)
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        let target = self.position.saturating_add(n as u64);

        match self.spec.digits_at(target) {
            Some(digits) => {
                self.digits = digits;
                self.position = target;
                self.next()
            }
            None => {
                self.position = self.spec.total();
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.spec.total() - self.position;

        match usize::try_from(remaining) {
            Ok(remaining) => (remaining, Some(remaining)),
            Err(_) => (usize::MAX, None),
        }
    }
}

impl FusedIterator for CharsetEnumerator {}
