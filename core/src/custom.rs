use std::{
    error::Error,
    panic::{self, AssertUnwindSafe},
};

use tracing::warn;

use crate::hash::{fallback_digest, HashProvider};

type CustomFn = dyn Fn(&str) -> Result<String, Box<dyn Error + Send + Sync>> + Send + Sync;

/// A hash function supplied by the hosting application.
///
/// The function receives the candidate as text and returns its digest.
/// When it returns an error or panics, the candidate is hashed with MD5 instead
/// so that a broken function never stops a running search.
pub struct CustomHash {
    function: Box<CustomFn>,
}

impl CustomHash {
    /// Wraps a fallible function.
    pub fn new<F, E>(function: F) -> Self
    where
        F: Fn(&str) -> Result<String, E> + Send + Sync + 'static,
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        Self {
            function: Box::new(move |text: &str| {
                function(text).map_err(Into::<Box<dyn Error + Send + Sync>>::into)
            }),
        }
    }

    /// Wraps a function that cannot report errors.
    pub fn infallible<F>(function: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self::new(move |text| Ok::<_, Box<dyn Error + Send + Sync>>(function(text)))
    }
}

impl HashProvider for CustomHash {
    fn digest(&self, input: &[u8]) -> String {
        let text = String::from_utf8_lossy(input);

        match panic::catch_unwind(AssertUnwindSafe(|| (self.function)(&text))) {
            Ok(Ok(digest)) => digest,
            Ok(Err(err)) => {
                warn!(%err, "custom hash function failed, falling back to MD5");
                fallback_digest(input)
            }
            Err(_) => {
                warn!("custom hash function panicked, falling back to MD5");
                fallback_digest(input)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CustomHash;
    use crate::hash::{fallback_digest, HashProvider};

    #[test]
    fn test_custom_digest() {
        // sum of the character codes, in hexadecimal
        let custom = CustomHash::infallible(|text| {
            format!("{:x}", text.chars().map(|c| c as u32).sum::<u32>())
        });

        assert_eq!("c5", custom.digest(b"abc"));
    }

    #[test]
    fn test_error_falls_back_to_md5() {
        let custom = CustomHash::new(|_| Err("broken"));
        assert_eq!(fallback_digest(b"abc"), custom.digest(b"abc"));
    }

    #[test]
    fn test_panic_falls_back_to_md5() {
        let custom = CustomHash::infallible(|text| {
            if text == "boom" {
                panic!("custom hash exploded");
            }
            text.to_uppercase()
        });

        assert_eq!(fallback_digest(b"boom"), custom.digest(b"boom"));
        assert_eq!("SAFE", custom.digest(b"safe"));
    }
}
