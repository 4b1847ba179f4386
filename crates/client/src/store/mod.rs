//! The identity/location state machine.
//!
//! A single [`ClientStore`] owns the in-memory snapshot of session, profile,
//! and saved locations. Every operation mutates remote state first and then
//! resynchronizes the snapshot from the authoritative store: writes are
//! "fire, then re-read", never "assume and merge".
//!
//! There is exactly one code path that produces an authenticated snapshot -
//! [`ClientStore::initialize`], sign-in, and session-change notifications
//! all converge on the same resynchronization routine, so racing triggers
//! yield the same final state.
//!
//! # Stale fetches
//!
//! Remote calls are not cancelable. Instead, every resynchronization carries
//! a generation ticket claimed when its trigger was observed; any later
//! identity change (sign-out, a different sign-in) claims a newer ticket,
//! and commits with an outdated ticket are discarded. A signed-out user
//! whose earlier fetch resolves late never sees that result applied.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use beanpass_core::{Balance, CustomerId, CustomerLocationId, Email, JoinCode, ScanToken};

use crate::error::StoreError;
use crate::models::{CustomerProfile, SavedLocation, Session};
use crate::remote::{AccountService, NewCustomer, NewSavedLocation, RemoteError, SessionEvent};

/// The immutable state snapshot published to the UI.
///
/// Mutations are atomic assignments of a new value through the watch
/// channel; readers never observe a snapshot mid-update.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Current credential grant, if signed in.
    pub session: Option<Session>,
    /// Customer profile for the current subject, if one exists.
    pub profile: Option<CustomerProfile>,
    /// Saved locations, home-first then most-recently-visited.
    pub saved_locations: Vec<SavedLocation>,
    /// True only until the first session resolution after process start.
    /// UI consumers block rendering on this flag to avoid a flash of the
    /// wrong screen.
    pub initializing: bool,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            session: None,
            profile: None,
            saved_locations: Vec::new(),
            initializing: true,
        }
    }
}

impl Snapshot {
    /// A recognized login without a linked profile (e.g. the sign-up
    /// fallback path) must complete profile setup before anything else.
    #[must_use]
    pub const fn needs_profile_setup(&self) -> bool {
        self.session.is_some() && self.profile.is_none()
    }

    /// The saved location flagged as home, if any.
    #[must_use]
    pub fn home_location(&self) -> Option<&SavedLocation> {
        self.saved_locations.iter().find(|row| row.is_home)
    }
}

/// The identity/location state machine.
///
/// Cheaply cloneable handle; all clones share one snapshot, one generation
/// counter, and one notification listener. The notification subscription is
/// registered by [`initialize`](Self::initialize) and released by
/// [`shutdown`](Self::shutdown) or drop.
pub struct ClientStore<S> {
    inner: Arc<StoreInner<S>>,
}

impl<S> Clone for ClientStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct StoreInner<S> {
    service: S,
    state: watch::Sender<Snapshot>,
    sync_gen: AtomicU64,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl<S> Drop for StoreInner<S> {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.listener.lock()
            && let Some(handle) = guard.take()
        {
            handle.abort();
        }
    }
}

impl<S: AccountService> ClientStore<S> {
    /// Create a store over an account service. The snapshot starts in the
    /// `initializing` state; call [`initialize`](Self::initialize) once to
    /// resolve it.
    #[must_use]
    pub fn new(service: S) -> Self {
        let (state, _) = watch::channel(Snapshot::default());
        Self {
            inner: Arc::new(StoreInner {
                service,
                state,
                sync_gen: AtomicU64::new(0),
                listener: Mutex::new(None),
            }),
        }
    }

    /// A copy of the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.inner.state.borrow().clone()
    }

    /// Watch the snapshot for changes (for UI re-evaluation).
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Snapshot> {
        self.inner.state.subscribe()
    }

    /// Recover an existing session and start listening for session changes.
    ///
    /// The notification subscription is registered before the first remote
    /// call, so a notification fired by the same underlying credential
    /// check cannot be missed; both paths converge on the same idempotent
    /// resynchronization. `initializing` flips to `false` exactly once,
    /// after the first resolution - success, absence, or failure (a failed
    /// recovery starts the client signed out rather than stuck loading).
    pub async fn initialize(&self) {
        let rx = self.inner.service.subscribe();

        match self.inner.service.current_session().await {
            Ok(Some(session)) => {
                let generation = self.claim_generation();
                if let Err(err) = self.resync(generation, session).await {
                    tracing::warn!(error = %err, "initial resynchronization failed; starting signed out");
                }
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(error = %err, "session recovery failed; starting signed out");
            }
        }

        self.inner.state.send_modify(|snap| snap.initializing = false);

        let weak = Arc::downgrade(&self.inner);
        let handle = tokio::spawn(listen(weak, rx));
        if let Ok(mut guard) = self.inner.listener.lock()
            && let Some(previous) = guard.replace(handle)
        {
            previous.abort();
        }
    }

    /// Stop listening for session-change notifications.
    pub fn shutdown(&self) {
        if let Ok(mut guard) = self.inner.listener.lock()
            && let Some(handle) = guard.take()
        {
            handle.abort();
        }
    }

    /// Create an account and its customer profile.
    ///
    /// An email that is already registered is treated as a login, not an
    /// error: a café operator account can be reused as a customer account.
    /// On successful creation this performs no snapshot update of its own -
    /// the session notification for the new account drives the usual
    /// resynchronization, and the profile-setup gate covers the interim.
    ///
    /// # Errors
    ///
    /// Returns validation, credential, or remote errors; never an error for
    /// the already-registered case (that path reports the sign-in outcome).
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<(), StoreError> {
        let email = Email::parse(email)?;

        let account_id = match self.inner.service.create_account(&email, password).await {
            Ok(account_id) => account_id,
            Err(RemoteError::AlreadyRegistered) => {
                tracing::info!("email already registered; treating sign-up as sign-in");
                return self.sign_in_parsed(&email, password).await;
            }
            Err(err) => return Err(err.into()),
        };

        self.inner
            .service
            .insert_customer(NewCustomer {
                account_id,
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                email,
                scan_token: ScanToken::generate(),
                balance: Balance::ZERO,
            })
            .await?;

        Ok(())
    }

    /// Verify credentials and update the snapshot synchronously, so the
    /// caller can navigate immediately without waiting for a notification.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Credentials`] with the remote service's own
    /// message on rejection; never retries.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), StoreError> {
        let email = Email::parse(email)?;
        self.sign_in_parsed(&email, password).await
    }

    /// Terminate the session and clear the local snapshot.
    ///
    /// The snapshot clears regardless of the remote outcome: local state
    /// must never reflect a stale authenticated view after the user has
    /// asked to leave. A remote failure is logged, not surfaced.
    pub async fn sign_out(&self) {
        // Invalidate any in-flight resynchronization before the grant goes.
        self.claim_generation();

        let result = self.inner.service.end_session().await;
        self.clear();

        if let Err(err) = result {
            tracing::warn!(error = %err, "remote session termination failed; local state cleared anyway");
        }
    }

    /// Create the customer profile for a session that has none.
    ///
    /// # Errors
    ///
    /// Fails fast with [`StoreError::Unauthenticated`] if no session is
    /// present, without a remote call.
    pub async fn complete_profile_setup(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<(), StoreError> {
        let generation = self.current_generation();
        let Some(session) = self.snapshot().session else {
            return Err(StoreError::Unauthenticated);
        };

        let profile = self
            .inner
            .service
            .insert_customer(NewCustomer {
                account_id: session.account_id,
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                email: session.email,
                scan_token: ScanToken::generate(),
                balance: Balance::ZERO,
            })
            .await?;

        self.commit(generation, move |snap| snap.profile = Some(profile));
        Ok(())
    }

    /// Link the current customer to the location with this join code.
    ///
    /// The join is idempotent: an existing link returns success with the
    /// location's display name and inserts nothing. The first location a
    /// customer ever connects to becomes home and stamps the profile's
    /// organization. The saved-location snapshot is reloaded from the
    /// remote store before returning (read-after-write consistency).
    ///
    /// Returns the location's display name for the UI.
    ///
    /// # Errors
    ///
    /// Fails fast with [`StoreError::Unauthenticated`] if no profile is
    /// present; returns [`StoreError::NotFound`] if the code matches no
    /// active location.
    pub async fn connect_location(&self, code: &str) -> Result<String, StoreError> {
        let generation = self.current_generation();
        let snapshot = self.snapshot();
        let Some(profile) = snapshot.profile else {
            return Err(StoreError::Unauthenticated);
        };

        let code = JoinCode::parse(code)?;
        let location = self
            .inner
            .service
            .find_active_location(&code)
            .await?
            .ok_or_else(|| {
                StoreError::NotFound(
                    "We couldn't find a location with that code. Double-check it and try again."
                        .to_string(),
                )
            })?;

        // Idempotent join: an existing link is success, not a duplicate.
        if snapshot
            .saved_locations
            .iter()
            .any(|row| row.location_id == location.id)
        {
            return Ok(location.name);
        }

        let is_first = snapshot.saved_locations.is_empty();
        self.inner
            .service
            .insert_saved_location(NewSavedLocation {
                customer_id: profile.id,
                location_id: location.id,
                org_id: location.org_id,
                is_home: is_first,
            })
            .await?;

        if is_first {
            // The first connection scopes the profile to the location's
            // organization.
            self.inner
                .service
                .set_customer_org(profile.id, location.org_id)
                .await?;
            if let Some(fresh) = self.inner.service.find_customer(profile.account_id).await? {
                self.commit(generation, move |snap| snap.profile = Some(fresh));
            }
        }

        self.reload_saved_locations(generation, profile.id).await?;

        tracing::info!(location = %location.name, "location connected");
        Ok(location.name)
    }

    /// Make this saved location the customer's home.
    ///
    /// The previous home record is cleared first, then the target is set;
    /// the two writes are not atomic at the remote store, so a reader in
    /// between can transiently observe zero home locations. The mandatory
    /// reload afterward is the recovery mechanism, and the reported outcome
    /// is the second write's.
    ///
    /// # Errors
    ///
    /// Fails fast with [`StoreError::Unauthenticated`] if no profile is
    /// present; returns [`StoreError::NotFound`] if the id is not among the
    /// saved locations.
    pub async fn set_home_location(&self, id: CustomerLocationId) -> Result<(), StoreError> {
        let generation = self.current_generation();
        let snapshot = self.snapshot();
        let Some(profile) = snapshot.profile else {
            return Err(StoreError::Unauthenticated);
        };

        let target = snapshot
            .saved_locations
            .iter()
            .find(|row| row.id == id)
            .ok_or_else(|| {
                StoreError::NotFound("That saved location could not be found.".to_string())
            })?;

        if let Some(home) = snapshot
            .saved_locations
            .iter()
            .find(|row| row.is_home && row.id != target.id)
            && let Err(err) = self.inner.service.set_home_flag(home.id, false).await
        {
            tracing::warn!(error = %err, "failed to clear previous home location");
        }

        let result = self.inner.service.set_home_flag(target.id, true).await;

        self.reload_saved_locations(generation, profile.id).await?;
        result.map_err(Into::into)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internal: resynchronization
    // ─────────────────────────────────────────────────────────────────────

    /// Claim a fresh generation ticket, invalidating in-flight commits.
    fn claim_generation(&self) -> u64 {
        self.inner.sync_gen.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// The current generation, for operations that do not change identity.
    fn current_generation(&self) -> u64 {
        self.inner.sync_gen.load(Ordering::SeqCst)
    }

    /// Apply a snapshot mutation unless a newer generation was claimed
    /// while the caller was suspended.
    fn commit<F: FnOnce(&mut Snapshot)>(&self, generation: u64, mutate: F) {
        if self.inner.sync_gen.load(Ordering::SeqCst) == generation {
            self.inner.state.send_modify(mutate);
        } else {
            tracing::debug!(generation, "discarding stale snapshot update");
        }
    }

    /// The single routine that produces an authenticated snapshot: load the
    /// profile for the session's subject and, if one exists, its saved
    /// locations, then commit everything as one atomic assignment.
    async fn resync(&self, generation: u64, session: Session) -> Result<(), StoreError> {
        let profile = self
            .inner
            .service
            .find_customer(session.account_id)
            .await?;

        let saved_locations = match &profile {
            Some(profile) => {
                self.inner
                    .service
                    .list_saved_locations(profile.id)
                    .await?
            }
            None => Vec::new(),
        };

        self.commit(generation, move |snap| {
            snap.session = Some(session);
            snap.profile = profile;
            snap.saved_locations = saved_locations;
        });
        Ok(())
    }

    async fn sign_in_parsed(&self, email: &Email, password: &str) -> Result<(), StoreError> {
        let session = self
            .inner
            .service
            .verify_credentials(email, password)
            .await
            .map_err(|err| match err {
                RemoteError::Credentials(message) => StoreError::Credentials(message),
                other => StoreError::Remote(other),
            })?;

        let generation = self.claim_generation();
        self.resync(generation, session).await
    }

    async fn reload_saved_locations(
        &self,
        generation: u64,
        customer_id: CustomerId,
    ) -> Result<(), StoreError> {
        let saved_locations = self.inner.service.list_saved_locations(customer_id).await?;
        self.commit(generation, move |snap| {
            snap.saved_locations = saved_locations;
        });
        Ok(())
    }

    fn clear(&self) {
        self.inner.state.send_modify(|snap| {
            snap.session = None;
            snap.profile = None;
            snap.saved_locations = Vec::new();
        });
    }
}

/// Session-change listener task. Holds only a weak reference so dropping
/// the last store handle tears the listener down.
async fn listen<S: AccountService>(
    weak: Weak<StoreInner<S>>,
    mut rx: broadcast::Receiver<SessionEvent>,
) {
    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "session events lagged");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        let Some(inner) = weak.upgrade() else { break };
        let store = ClientStore { inner };

        match event {
            SessionEvent::SignedIn(session) => {
                let generation = store.claim_generation();
                if let Err(err) = store.resync(generation, session).await {
                    tracing::warn!(error = %err, "resynchronization after session change failed");
                }
            }
            SessionEvent::SignedOut => {
                store.claim_generation();
                store.clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::memory::MemoryAccountService;

    use beanpass_core::{JoinCode, OrgId};

    async fn signed_in_store() -> (ClientStore<MemoryAccountService>, MemoryAccountService) {
        let service = MemoryAccountService::new();
        let store = ClientStore::new(service.clone());
        store.initialize().await;
        store
            .sign_up("ada@example.com", "hunter2468", "Ada", "Lovelace")
            .await
            .unwrap();
        store.sign_in("ada@example.com", "hunter2468").await.unwrap();
        (store, service)
    }

    #[test]
    fn test_default_snapshot_is_initializing() {
        let snapshot = Snapshot::default();
        assert!(snapshot.initializing);
        assert!(snapshot.session.is_none());
        assert!(snapshot.profile.is_none());
        assert!(snapshot.saved_locations.is_empty());
    }

    #[tokio::test]
    async fn test_initialize_resolves_signed_out() {
        let store = ClientStore::new(MemoryAccountService::new());
        store.initialize().await;

        let snapshot = store.snapshot();
        assert!(!snapshot.initializing);
        assert!(snapshot.session.is_none());
        store.shutdown();
    }

    #[tokio::test]
    async fn test_sign_in_updates_snapshot_synchronously() {
        let (store, _service) = signed_in_store().await;

        let snapshot = store.snapshot();
        assert!(snapshot.session.is_some());
        assert!(snapshot.profile.is_some());
        assert!(!snapshot.needs_profile_setup());
        store.shutdown();
    }

    #[tokio::test]
    async fn test_sign_in_bad_password_is_verbatim_credentials_error() {
        let (store, _service) = signed_in_store().await;
        store.sign_out().await;

        let err = store
            .sign_in("ada@example.com", "wrong-password")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Credentials(_)));
        assert_eq!(err.to_string(), "Invalid login credentials");
        store.shutdown();
    }

    #[tokio::test]
    async fn test_connect_requires_profile() {
        let store = ClientStore::new(MemoryAccountService::new());
        store.initialize().await;

        let err = store.connect_location("CAFE01").await.unwrap_err();
        assert!(matches!(err, StoreError::Unauthenticated));
        store.shutdown();
    }

    #[tokio::test]
    async fn test_set_home_requires_saved_location() {
        let (store, service) = signed_in_store().await;
        service.add_location(
            "Corner Roasters",
            JoinCode::parse("CAFE01").unwrap(),
            OrgId::generate(),
            None,
            None,
            true,
        );

        let err = store
            .set_home_location(CustomerLocationId::generate())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        store.shutdown();
    }

    #[tokio::test]
    async fn test_inactive_location_is_not_found() {
        let (store, service) = signed_in_store().await;
        service.add_location(
            "Closed Cafe",
            JoinCode::parse("GONE99").unwrap(),
            OrgId::generate(),
            None,
            None,
            false,
        );

        let err = store.connect_location("GONE99").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        store.shutdown();
    }

    #[tokio::test]
    async fn test_join_code_lookup_is_case_insensitive() {
        let (store, service) = signed_in_store().await;
        service.add_location(
            "Corner Roasters",
            JoinCode::parse("CAFE01").unwrap(),
            OrgId::generate(),
            Some("Portland"),
            Some("OR"),
            true,
        );

        let name = store.connect_location("  cafe01 ").await.unwrap();
        assert_eq!(name, "Corner Roasters");
        store.shutdown();
    }
}
