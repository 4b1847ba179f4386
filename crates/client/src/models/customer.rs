//! Customer profile domain type.

use chrono::{DateTime, Utc};

use beanpass_core::{AccountId, Balance, CustomerId, Email, OrgId, ScanToken};

/// The customer-facing account record, distinct from the raw credential.
///
/// Created at most once per subject identity, never deleted by this client.
/// The balance is mutated only by the payment backend.
#[derive(Debug, Clone)]
pub struct CustomerProfile {
    /// Stable profile ID.
    pub id: CustomerId,
    /// The credential subject this profile is linked to.
    pub account_id: AccountId,
    /// Customer's first name.
    pub first_name: String,
    /// Customer's last name.
    pub last_name: String,
    /// Customer's email address.
    pub email: Email,
    /// The QR display token shown at the register.
    pub scan_token: ScanToken,
    /// Stored-value balance.
    pub balance: Balance,
    /// Organization of the customer's first connected location, unset until
    /// then.
    pub org_id: Option<OrgId>,
    /// Whether the profile is active.
    pub active: bool,
    /// When the profile was created.
    pub created_at: DateTime<Utc>,
}

impl CustomerProfile {
    /// The customer's display name ("First Last", with missing parts
    /// dropped).
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(first: &str, last: &str) -> CustomerProfile {
        CustomerProfile {
            id: CustomerId::generate(),
            account_id: AccountId::generate(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: Email::parse("user@example.com").unwrap(),
            scan_token: ScanToken::generate(),
            balance: Balance::ZERO,
            org_id: None,
            active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(profile("Ada", "Lovelace").display_name(), "Ada Lovelace");
        assert_eq!(profile("Ada", "").display_name(), "Ada");
        assert_eq!(profile("", "").display_name(), "");
    }
}
