use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt::Display;

/// Symbols a short code may contain: lowercase, uppercase, digits and `_`.
pub const ALPHABET: &[u8; 63] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_";

/// Every short code has exactly this many characters.
pub const LENGTH: usize = 10;

/// Returns `true` iff `code` has [`LENGTH`] characters, all from [`ALPHABET`].
///
/// This is a cheap pre-filter; it never touches storage.
pub fn is_valid(code: &str) -> bool {
    code.len() == LENGTH && code.bytes().all(is_alphabet_byte)
}

fn is_alphabet_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// A validated short code identifying a shortened URL.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShortCode(String);

impl ShortCode {
    /// Creates a new `ShortCode` after validating the input.
    pub fn new(code: impl Into<String>) -> Result<Self, CoreError> {
        let code = code.into();
        if !is_valid(&code) {
            return Err(CoreError::InvalidShortCode(format!(
                "must be {} characters from [a-zA-Z0-9_], got '{}'",
                LENGTH, code
            )));
        }
        Ok(Self(code))
    }

    /// Creates a `ShortCode` without validation.
    ///
    /// Use this only for codes produced by the generator, which always emits
    /// valid output.
    pub fn new_unchecked(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Generates the full shortened URL based on the provided base URL.
    ///
    /// An empty base URL yields the bare code.
    pub fn to_url(&self, base_url: &str) -> String {
        if base_url.is_empty() {
            return self.0.clone();
        }
        format!("{}/{}", base_url.trim_end_matches('/'), self.0)
    }

    /// Returns the short code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ShortCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ShortCode {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ShortCode> for String {
    fn from(value: ShortCode) -> Self {
        value.0
    }
}
