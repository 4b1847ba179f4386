//! Session types.

use secrecy::SecretString;

use beanpass_core::{AccountId, Email};

/// A live credential grant identifying the signed-in subject.
///
/// The remote account service owns the session (issuance, expiry); the
/// client holds this non-owning cached copy, invalidated on sign-out or an
/// expiry notification.
#[derive(Clone)]
pub struct Session {
    /// Subject identity the grant was issued for.
    pub account_id: AccountId,
    /// Email the subject authenticated with.
    pub email: Email,
    /// Opaque access token presented on authenticated remote calls.
    pub access_token: SecretString,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("account_id", &self.account_id)
            .field("email", &self.email)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let session = Session {
            account_id: AccountId::generate(),
            email: Email::parse("user@example.com").unwrap(),
            access_token: SecretString::from("super-secret"),
        };
        let debug = format!("{session:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret"));
    }
}
