//! Wire records for the remote account service.
//!
//! Rows arrive as loosely-typed JSON; every record is validated into a
//! domain type here, at the point data crosses into the core, so malformed
//! or partial rows fail fast with [`RemoteError::Record`] instead of
//! propagating as silently-wrong fields.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use beanpass_core::{Balance, Email, JoinCode, ScanToken};

use crate::models::{CustomerProfile, Location, SavedLocation, Session};
use crate::remote::{NewCustomer, NewSavedLocation, RemoteError};

// ─────────────────────────────────────────────────────────────────────────────
// Auth records
// ─────────────────────────────────────────────────────────────────────────────

/// Response body of the credential endpoints.
#[derive(Debug, Deserialize)]
pub struct SessionRecord {
    pub access_token: String,
    pub user: AccountRecord,
}

/// The subject identity embedded in auth responses.
#[derive(Debug, Deserialize)]
pub struct AccountRecord {
    pub id: Uuid,
    pub email: String,
}

impl TryFrom<SessionRecord> for Session {
    type Error = RemoteError;

    fn try_from(record: SessionRecord) -> Result<Self, Self::Error> {
        if record.access_token.is_empty() {
            return Err(RemoteError::Record("session has no access token".into()));
        }
        let email = Email::parse(&record.user.email)
            .map_err(|e| RemoteError::Record(format!("session email: {e}")))?;

        Ok(Self {
            account_id: record.user.id.into(),
            email,
            access_token: SecretString::from(record.access_token),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Table records
// ─────────────────────────────────────────────────────────────────────────────

/// A row of the `customers` table.
#[derive(Debug, Deserialize)]
pub struct CustomerRecord {
    pub id: Uuid,
    pub auth_account_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub scan_token: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    pub org_id: Option<Uuid>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<CustomerRecord> for CustomerProfile {
    type Error = RemoteError;

    fn try_from(record: CustomerRecord) -> Result<Self, Self::Error> {
        let email = Email::parse(&record.email)
            .map_err(|e| RemoteError::Record(format!("customer {}: {e}", record.id)))?;
        let scan_token = ScanToken::parse(&record.scan_token)
            .map_err(|e| RemoteError::Record(format!("customer {}: {e}", record.id)))?;

        Ok(Self {
            id: record.id.into(),
            account_id: record.auth_account_id.into(),
            first_name: record.first_name,
            last_name: record.last_name,
            email,
            scan_token,
            balance: Balance::new(record.balance),
            org_id: record.org_id.map(Into::into),
            active: record.active,
            created_at: record.created_at,
        })
    }
}

/// Insert body for the `customers` table.
#[derive(Debug, Serialize)]
pub struct NewCustomerRecord {
    pub auth_account_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub scan_token: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}

impl From<&NewCustomer> for NewCustomerRecord {
    fn from(new: &NewCustomer) -> Self {
        Self {
            auth_account_id: new.account_id.as_uuid(),
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            email: new.email.as_str().to_string(),
            scan_token: new.scan_token.as_str().to_string(),
            balance: new.balance.amount(),
        }
    }
}

/// A row of the `locations` table.
#[derive(Debug, Deserialize)]
pub struct LocationRecord {
    pub id: Uuid,
    pub name: String,
    pub short_code: Option<String>,
    pub join_code: String,
    pub org_id: Uuid,
    pub city: Option<String>,
    pub state: Option<String>,
    pub active: bool,
}

impl TryFrom<LocationRecord> for Location {
    type Error = RemoteError;

    fn try_from(record: LocationRecord) -> Result<Self, Self::Error> {
        let join_code = JoinCode::parse(&record.join_code)
            .map_err(|e| RemoteError::Record(format!("location {}: {e}", record.id)))?;

        Ok(Self {
            id: record.id.into(),
            name: record.name,
            short_code: record.short_code,
            join_code,
            org_id: record.org_id.into(),
            city: record.city,
            state: record.state,
            active: record.active,
        })
    }
}

/// A row of the `customer_locations` table with its embedded location join.
#[derive(Debug, Deserialize)]
pub struct SavedLocationRecord {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub location_id: Uuid,
    pub org_id: Uuid,
    pub is_home: bool,
    pub first_visited_at: DateTime<Utc>,
    pub last_visited_at: DateTime<Utc>,
    pub location: LocationRecord,
}

impl TryFrom<SavedLocationRecord> for SavedLocation {
    type Error = RemoteError;

    fn try_from(record: SavedLocationRecord) -> Result<Self, Self::Error> {
        let location = Location::try_from(record.location)?;

        Ok(Self {
            id: record.id.into(),
            customer_id: record.customer_id.into(),
            location_id: record.location_id.into(),
            org_id: record.org_id.into(),
            is_home: record.is_home,
            first_visited_at: record.first_visited_at,
            last_visited_at: record.last_visited_at,
            location,
        })
    }
}

/// Insert body for the `customer_locations` table.
#[derive(Debug, Serialize)]
pub struct NewSavedLocationRecord {
    pub customer_id: Uuid,
    pub location_id: Uuid,
    pub org_id: Uuid,
    pub is_home: bool,
}

impl From<&NewSavedLocation> for NewSavedLocationRecord {
    fn from(new: &NewSavedLocation) -> Self {
        Self {
            customer_id: new.customer_id.as_uuid(),
            location_id: new.location_id.as_uuid(),
            org_id: new.org_id.as_uuid(),
            is_home: new.is_home,
        }
    }
}
