//! The customer-facing QR display token.
//!
//! Every customer profile carries a 16-digit numeric token that is rendered
//! as a QR code at the register. The token is generated client-side at
//! profile creation; uniqueness is statistical (see [`ScanToken::generate`])
//! and enforced only by the remote store's unique constraint.

use core::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ScanToken`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum ScanTokenError {
    /// The input is not exactly 16 characters.
    #[error("scan token must be exactly {expected} digits, got {got}")]
    WrongLength {
        /// Required length.
        expected: usize,
        /// Actual length of the input.
        got: usize,
    },
    /// The input contains a non-digit character.
    #[error("scan token must contain only digits")]
    NonDigit,
    /// The input has a leading zero.
    #[error("scan token cannot start with a zero")]
    LeadingZero,
}

/// A 16-digit numeric token displayed to the register as a QR code.
///
/// The first digit is never zero, so the token always occupies the full
/// sixteen digits when rendered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ScanToken(String);

impl ScanToken {
    /// Number of digits in a scan token.
    pub const DIGITS: usize = 16;

    const MIN: u64 = 1_000_000_000_000_000;
    const SPAN: u64 = 9_000_000_000_000_000;

    /// Generate a fresh random token.
    ///
    /// Draws uniformly from `[10^15, 10^16)`. Collisions across profiles are
    /// statistically improbable but not impossible; the remote store's
    /// unique constraint is the backstop, and profile creation surfaces a
    /// conflict error if one ever occurs.
    #[must_use]
    pub fn generate() -> Self {
        let n = rand::rng().random_range(0..Self::SPAN) + Self::MIN;
        Self(n.to_string())
    }

    /// Parse a `ScanToken` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not exactly 16 digits or starts
    /// with a zero.
    pub fn parse(s: &str) -> Result<Self, ScanTokenError> {
        if s.len() != Self::DIGITS {
            return Err(ScanTokenError::WrongLength {
                expected: Self::DIGITS,
                got: s.len(),
            });
        }

        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ScanTokenError::NonDigit);
        }

        if s.starts_with('0') {
            return Err(ScanTokenError::LeadingZero);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScanToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
