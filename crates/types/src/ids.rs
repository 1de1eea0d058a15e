//! Newtype wrapper for placeholder tokens.
//!
//! A token is the literal `P#` followed by two to four ASCII digits. Wrapping
//! it keeps arbitrary strings out of the replacement map.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Prefix every placeholder token starts with.
pub const TOKEN_PREFIX: &str = "P#";
pub const MIN_TOKEN_DIGITS: usize = 2;
pub const MAX_TOKEN_DIGITS: usize = 4;

/// Returned when a string does not have the `P#` + 2..=4 digits shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{0}' is not a placeholder token (expected P# followed by 2-4 digits)")]
pub struct InvalidToken(pub String);

/// A placeholder seeded into a TOC row, e.g. `P#0007`.
#[derive(Debug, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlaceholderToken(Arc<str>);

impl PlaceholderToken {
    /// Validates and wraps a token string.
    pub fn new(token: &str) -> Result<Self, InvalidToken> {
        if Self::is_token(token) {
            Ok(Self(token.into()))
        } else {
            Err(InvalidToken(token.to_string()))
        }
    }

    /// Token for the `index`-th TOC row (1-based), zero-padded to four digits.
    pub fn numbered(index: usize) -> Result<Self, InvalidToken> {
        Self::new(&format!("{}{:04}", TOKEN_PREFIX, index))
    }

    /// True when the whole string is a token; substrings never qualify.
    pub fn is_token(s: &str) -> bool {
        s.strip_prefix(TOKEN_PREFIX).is_some_and(|digits| {
            (MIN_TOKEN_DIGITS..=MAX_TOKEN_DIGITS).contains(&digits.len())
                && digits.bytes().all(|b| b.is_ascii_digit())
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PlaceholderToken {
    type Error = InvalidToken;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(&s)
    }
}

impl TryFrom<&str> for PlaceholderToken {
    type Error = InvalidToken;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<PlaceholderToken> for String {
    fn from(token: PlaceholderToken) -> Self {
        token.0.to_string()
    }
}

impl AsRef<str> for PlaceholderToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaceholderToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
