//! Remote account service interface.
//!
//! The remote service owns credential verification and the relational store
//! of `customers`, `locations`, and `customer_locations`. The client
//! consumes it through the [`AccountService`] trait so the state machine can
//! run against the real HTTP service ([`http::HttpAccountService`]) or the
//! hermetic in-memory service ([`memory::MemoryAccountService`]).
//!
//! The store treats every write as "fire, then re-read": the remote store is
//! the single source of truth and nothing here attempts merge semantics.

pub mod http;
pub mod memory;
pub mod types;

use thiserror::Error;
use tokio::sync::broadcast;

use beanpass_core::{
    AccountId, Balance, CustomerId, CustomerLocationId, Email, JoinCode, LocationId, OrgId,
    ScanToken,
};

use crate::models::{CustomerProfile, Location, SavedLocation, Session};

/// Errors from the remote account service boundary.
#[derive(Debug, Error, Clone)]
pub enum RemoteError {
    /// Account creation was rejected because the email is already
    /// registered. The state machine treats this as a sign-in, not a
    /// failure.
    #[error("an account with this email already exists")]
    AlreadyRegistered,

    /// Credential verification failed. The message is the remote service's
    /// own wording.
    #[error("{0}")]
    Credentials(String),

    /// A unique constraint was violated (e.g. a scan token collision at
    /// profile creation).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A wire record failed validation at the boundary.
    #[error("malformed record from remote service: {0}")]
    Record(String),

    /// Transport-level failure (connection, timeout, unexpected status).
    #[error("remote service unavailable: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// A session-change notification.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A session was established (sign-up, sign-in, or recovery).
    SignedIn(Session),
    /// The session ended (sign-out or expiry).
    SignedOut,
}

/// Fields for inserting a new customer profile.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub account_id: AccountId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub scan_token: ScanToken,
    pub balance: Balance,
}

/// Fields for inserting a new customer-location link.
#[derive(Debug, Clone)]
pub struct NewSavedLocation {
    pub customer_id: CustomerId,
    pub location_id: LocationId,
    pub org_id: OrgId,
    pub is_home: bool,
}

/// The remote account service, as consumed by the client core.
///
/// Credential operations mirror the auth surface; record operations cover
/// the three logical tables. Implementations must deliver [`SessionEvent`]s
/// on the broadcast channel for every session establishment or termination
/// they observe, including ones caused by the caller's own credential calls.
pub trait AccountService: Send + Sync + 'static {
    /// Create a new credential account.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::AlreadyRegistered`] if the email is taken.
    fn create_account(
        &self,
        email: &Email,
        password: &str,
    ) -> impl Future<Output = Result<AccountId, RemoteError>> + Send;

    /// Verify credentials and establish a session.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Credentials`] with the service's message if
    /// verification fails.
    fn verify_credentials(
        &self,
        email: &Email,
        password: &str,
    ) -> impl Future<Output = Result<Session, RemoteError>> + Send;

    /// Terminate the current session.
    fn end_session(&self) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Recover the current session, if one exists.
    fn current_session(&self)
    -> impl Future<Output = Result<Option<Session>, RemoteError>> + Send;

    /// Subscribe to session-change notifications.
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;

    /// Find the customer profile linked to a subject identity.
    fn find_customer(
        &self,
        account_id: AccountId,
    ) -> impl Future<Output = Result<Option<CustomerProfile>, RemoteError>> + Send;

    /// Insert a customer profile.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Conflict`] if a unique constraint (subject
    /// link or scan token) is violated.
    fn insert_customer(
        &self,
        new: NewCustomer,
    ) -> impl Future<Output = Result<CustomerProfile, RemoteError>> + Send;

    /// Stamp a customer's organization affiliation.
    fn set_customer_org(
        &self,
        customer_id: CustomerId,
        org_id: OrgId,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Find an active location by its join code (codes are canonical
    /// uppercase, so the lookup is case-insensitive by construction).
    fn find_active_location(
        &self,
        code: &JoinCode,
    ) -> impl Future<Output = Result<Option<Location>, RemoteError>> + Send;

    /// List a customer's saved locations with embedded location fields,
    /// ordered home-first then most-recently-visited.
    fn list_saved_locations(
        &self,
        customer_id: CustomerId,
    ) -> impl Future<Output = Result<Vec<SavedLocation>, RemoteError>> + Send;

    /// Insert a customer-location link.
    fn insert_saved_location(
        &self,
        new: NewSavedLocation,
    ) -> impl Future<Output = Result<SavedLocation, RemoteError>> + Send;

    /// Set or clear the home flag on a single link row.
    fn set_home_flag(
        &self,
        id: CustomerLocationId,
        is_home: bool,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;
}
