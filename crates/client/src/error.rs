//! Client-facing error types.
//!
//! Every state-machine operation returns `Result<_, StoreError>` instead of
//! panicking or letting transport failures escape. The `Display` output of
//! each variant is the message shown to the customer, so the wording here is
//! user-facing.

use thiserror::Error;

use beanpass_core::{EmailError, JoinCodeError};

use crate::remote::RemoteError;

/// Errors produced by the identity/location state machine.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The supplied email address failed validation.
    #[error("invalid email: {0}")]
    Email(#[from] EmailError),

    /// The supplied join code failed validation.
    #[error("invalid location code: {0}")]
    JoinCode(#[from] JoinCodeError),

    /// The remote service rejected the credentials. The message is the
    /// remote service's own wording, surfaced verbatim and never retried.
    #[error("{0}")]
    Credentials(String),

    /// A lookup found nothing: the join code matched no active location, or
    /// the customer-location id is not among the saved locations.
    #[error("{0}")]
    NotFound(String),

    /// The operation requires a signed-in customer. Failed fast locally,
    /// without a remote call.
    #[error("You need to be signed in to do that.")]
    Unauthenticated,

    /// Remote service failure (transport, conflict, malformed record).
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_message_is_verbatim() {
        let err = StoreError::Credentials("Invalid login credentials".to_string());
        assert_eq!(err.to_string(), "Invalid login credentials");
    }

    #[test]
    fn test_not_found_message() {
        let err = StoreError::NotFound("We couldn't find that location code.".to_string());
        assert_eq!(err.to_string(), "We couldn't find that location code.");
    }
}
