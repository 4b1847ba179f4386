//! In-memory implementation of the remote account service.
//!
//! Backs the integration tests and the CLI's demo mode with the same table
//! semantics the real service exposes: unique constraints, case-insensitive
//! join-code lookup, ordered saved-location reads, and session events fired
//! from the credential calls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use secrecy::SecretString;
use tokio::sync::broadcast;

use beanpass_core::{
    AccountId, CustomerId, CustomerLocationId, Email, JoinCode, LocationId, OrgId,
};

use crate::models::{CustomerProfile, Location, SavedLocation, Session};
use crate::remote::{AccountService, NewCustomer, NewSavedLocation, RemoteError, SessionEvent};

const EVENT_CHANNEL_CAPACITY: usize = 16;

#[derive(Clone)]
struct MemAccount {
    id: AccountId,
    email: Email,
    password: String,
}

#[derive(Default)]
struct MemTables {
    accounts: Vec<MemAccount>,
    session: Option<Session>,
    customers: Vec<CustomerProfile>,
    locations: Vec<Location>,
    customer_locations: Vec<SavedLocation>,
}

/// Hermetic account service backed by in-memory tables.
#[derive(Clone)]
pub struct MemoryAccountService {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    tables: Mutex<MemTables>,
    events: broadcast::Sender<SessionEvent>,
    /// Artificial latency applied to profile and location reads, for
    /// exercising interleavings in tests.
    read_delay: Mutex<Option<Duration>>,
    /// When set, the next `end_session` call reports a transport failure
    /// without terminating the session.
    fail_end_session: AtomicBool,
    /// When set, `set_home_flag` calls for this row report a transport
    /// failure without applying the write.
    fail_home_flag_for: Mutex<Option<CustomerLocationId>>,
}

impl Default for MemoryAccountService {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAccountService {
    /// Create an empty service.
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(MemoryInner {
                tables: Mutex::new(MemTables::default()),
                events,
                read_delay: Mutex::new(None),
                fail_end_session: AtomicBool::new(false),
                fail_home_flag_for: Mutex::new(None),
            }),
        }
    }

    fn tables(&self) -> MutexGuard<'_, MemTables> {
        // A poisoned lock means a test already panicked; propagating the
        // panic keeps the failure attributable.
        #[allow(clippy::unwrap_used)]
        self.inner.tables.lock().unwrap()
    }

    /// Seed a location row.
    pub fn add_location(
        &self,
        name: &str,
        join_code: JoinCode,
        org_id: OrgId,
        city: Option<&str>,
        state: Option<&str>,
        active: bool,
    ) -> Location {
        let location = Location {
            id: LocationId::generate(),
            name: name.to_string(),
            short_code: None,
            join_code,
            org_id,
            city: city.map(ToString::to_string),
            state: state.map(ToString::to_string),
            active,
        };
        self.tables().locations.push(location.clone());
        location
    }

    /// Apply artificial latency to profile and saved-location reads.
    pub fn set_read_delay(&self, delay: Option<Duration>) {
        if let Ok(mut guard) = self.inner.read_delay.lock() {
            *guard = delay;
        }
    }

    /// Make `end_session` calls report a transport failure.
    pub fn set_end_session_failure(&self, fail: bool) {
        self.inner.fail_end_session.store(fail, Ordering::SeqCst);
    }

    /// Make `set_home_flag` calls for one row report a transport failure,
    /// for exercising the partial-write window in home reassignment.
    pub fn set_home_flag_failure(&self, id: Option<CustomerLocationId>) {
        if let Ok(mut guard) = self.inner.fail_home_flag_for.lock() {
            *guard = id;
        }
    }

    /// Count `customer_locations` rows for a customer, bypassing ordering.
    #[must_use]
    pub fn customer_location_count(&self, customer_id: CustomerId) -> usize {
        self.tables()
            .customer_locations
            .iter()
            .filter(|row| row.customer_id == customer_id)
            .count()
    }

    /// Read a customer row straight out of the table.
    #[must_use]
    pub fn customer_by_account(&self, account_id: AccountId) -> Option<CustomerProfile> {
        self.tables()
            .customers
            .iter()
            .find(|c| c.account_id == account_id)
            .cloned()
    }

    async fn apply_read_delay(&self) {
        let delay = self.inner.read_delay.lock().ok().and_then(|guard| *guard);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn make_session(account: &MemAccount) -> Session {
        Session {
            account_id: account.id,
            email: account.email.clone(),
            access_token: SecretString::from(format!("mem-token-{}", account.id)),
        }
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.inner.events.send(event);
    }
}

impl AccountService for MemoryAccountService {
    async fn create_account(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<AccountId, RemoteError> {
        let session = {
            let mut tables = self.tables();

            if tables
                .accounts
                .iter()
                .any(|a| a.email.as_str().eq_ignore_ascii_case(email.as_str()))
            {
                return Err(RemoteError::AlreadyRegistered);
            }

            let account = MemAccount {
                id: AccountId::generate(),
                email: email.clone(),
                password: password.to_string(),
            };
            let session = Self::make_session(&account);
            tables.accounts.push(account);
            tables.session = Some(session.clone());
            session
        };

        let account_id = session.account_id;
        self.emit(SessionEvent::SignedIn(session));
        Ok(account_id)
    }

    async fn verify_credentials(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<Session, RemoteError> {
        let session = {
            let mut tables = self.tables();

            let account = tables
                .accounts
                .iter()
                .find(|a| {
                    a.email.as_str().eq_ignore_ascii_case(email.as_str())
                        && a.password == password
                })
                .cloned()
                .ok_or_else(|| {
                    RemoteError::Credentials("Invalid login credentials".to_string())
                })?;

            let session = Self::make_session(&account);
            tables.session = Some(session.clone());
            session
        };

        self.emit(SessionEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn end_session(&self) -> Result<(), RemoteError> {
        if self.inner.fail_end_session.load(Ordering::SeqCst) {
            return Err(RemoteError::Transport(
                "connection reset during logout".to_string(),
            ));
        }

        self.tables().session = None;
        self.emit(SessionEvent::SignedOut);
        Ok(())
    }

    async fn current_session(&self) -> Result<Option<Session>, RemoteError> {
        Ok(self.tables().session.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    async fn find_customer(
        &self,
        account_id: AccountId,
    ) -> Result<Option<CustomerProfile>, RemoteError> {
        self.apply_read_delay().await;
        Ok(self
            .tables()
            .customers
            .iter()
            .find(|c| c.account_id == account_id)
            .cloned())
    }

    async fn insert_customer(&self, new: NewCustomer) -> Result<CustomerProfile, RemoteError> {
        let mut tables = self.tables();

        if tables.customers.iter().any(|c| c.account_id == new.account_id) {
            return Err(RemoteError::Conflict(
                "customer already exists for this account".to_string(),
            ));
        }
        if tables
            .customers
            .iter()
            .any(|c| c.scan_token == new.scan_token)
        {
            return Err(RemoteError::Conflict("scan token already in use".to_string()));
        }

        let profile = CustomerProfile {
            id: CustomerId::generate(),
            account_id: new.account_id,
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            scan_token: new.scan_token,
            balance: new.balance,
            org_id: None,
            active: true,
            created_at: Utc::now(),
        };
        tables.customers.push(profile.clone());
        Ok(profile)
    }

    async fn set_customer_org(
        &self,
        customer_id: CustomerId,
        org_id: OrgId,
    ) -> Result<(), RemoteError> {
        let mut tables = self.tables();
        let customer = tables
            .customers
            .iter_mut()
            .find(|c| c.id == customer_id)
            .ok_or_else(|| RemoteError::Record(format!("no customer {customer_id}")))?;
        customer.org_id = Some(org_id);
        Ok(())
    }

    async fn find_active_location(&self, code: &JoinCode) -> Result<Option<Location>, RemoteError> {
        Ok(self
            .tables()
            .locations
            .iter()
            .find(|l| l.active && l.join_code == *code)
            .cloned())
    }

    async fn list_saved_locations(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<SavedLocation>, RemoteError> {
        self.apply_read_delay().await;

        let mut rows: Vec<SavedLocation> = self
            .tables()
            .customer_locations
            .iter()
            .filter(|row| row.customer_id == customer_id)
            .cloned()
            .collect();

        // Home first, then most recently visited.
        rows.sort_by(|a, b| {
            b.is_home
                .cmp(&a.is_home)
                .then(b.last_visited_at.cmp(&a.last_visited_at))
        });

        Ok(rows)
    }

    async fn insert_saved_location(
        &self,
        new: NewSavedLocation,
    ) -> Result<SavedLocation, RemoteError> {
        let mut tables = self.tables();

        if tables
            .customer_locations
            .iter()
            .any(|row| row.customer_id == new.customer_id && row.location_id == new.location_id)
        {
            return Err(RemoteError::Conflict(
                "customer is already linked to this location".to_string(),
            ));
        }

        let location = tables
            .locations
            .iter()
            .find(|l| l.id == new.location_id)
            .cloned()
            .ok_or_else(|| RemoteError::Record(format!("no location {}", new.location_id)))?;

        let now = Utc::now();
        let row = SavedLocation {
            id: CustomerLocationId::generate(),
            customer_id: new.customer_id,
            location_id: new.location_id,
            org_id: new.org_id,
            is_home: new.is_home,
            first_visited_at: now,
            last_visited_at: now,
            location,
        };
        tables.customer_locations.push(row.clone());
        Ok(row)
    }

    async fn set_home_flag(
        &self,
        id: CustomerLocationId,
        is_home: bool,
    ) -> Result<(), RemoteError> {
        let failing = self.inner.fail_home_flag_for.lock().ok().and_then(|g| *g);
        if failing == Some(id) {
            return Err(RemoteError::Transport(
                "connection reset during update".to_string(),
            ));
        }

        let mut tables = self.tables();
        let row = tables
            .customer_locations
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or_else(|| RemoteError::Record(format!("no customer_location {id}")))?;
        row.is_home = is_home;
        Ok(())
    }
}
