//! Location join codes.
//!
//! A join code is the short alphanumeric code printed on a café's menu board
//! or receipt, and embedded in the location's QR code. Customers type it or
//! scan it to link their account to that location.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`JoinCode`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum JoinCodeError {
    /// The input is empty after trimming.
    #[error("join code cannot be empty")]
    Empty,
    /// The input is too long to be a join code.
    #[error("join code must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character outside `[A-Za-z0-9]`.
    #[error("join code must contain only letters and digits")]
    InvalidCharacter,
}

/// A normalized location join code.
///
/// Codes are matched case-insensitively by the remote store; parsing trims
/// surrounding whitespace and uppercases the input so every lookup and
/// comparison happens on the canonical form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct JoinCode(String);

impl JoinCode {
    /// Maximum length of a join code.
    pub const MAX_LENGTH: usize = 32;

    /// Parse a `JoinCode` from user or scanner input.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, too long, or
    /// contains a non-alphanumeric character.
    pub fn parse(s: &str) -> Result<Self, JoinCodeError> {
        let s = s.trim();

        if s.is_empty() {
            return Err(JoinCodeError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(JoinCodeError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if !s.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(JoinCodeError::InvalidCharacter);
        }

        Ok(Self(s.to_ascii_uppercase()))
    }

    /// Returns the canonical (uppercase) code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JoinCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl core::str::FromStr for JoinCode {
    type Err = JoinCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_uppercases() {
        let code = JoinCode::parse("a3f8c2").unwrap();
        assert_eq!(code.as_str(), "A3F8C2");
    }

    #[test]
    fn test_parse_trims() {
        let code = JoinCode::parse("  A3F8C2 \n").unwrap();
        assert_eq!(code.as_str(), "A3F8C2");
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(JoinCode::parse("  "), Err(JoinCodeError::Empty)));
    }

    #[test]
    fn test_parse_too_long() {
        let long = "A".repeat(33);
        assert!(matches!(
            JoinCode::parse(&long),
            Err(JoinCodeError::TooLong { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_symbols() {
        assert!(matches!(
            JoinCode::parse("A3F-8C2"),
            Err(JoinCodeError::InvalidCharacter)
        ));
    }

    #[test]
    fn test_case_insensitive_equality_via_normalization() {
        assert_eq!(
            JoinCode::parse("cafe01").unwrap(),
            JoinCode::parse("CAFE01").unwrap()
        );
    }
}
