//! HTTP implementation of the remote account service.
//!
//! Talks to a PostgREST-style service: credential endpoints under
//! `/auth/v1/`, table endpoints under `/rest/v1/`. Every request carries the
//! public API key; authenticated requests additionally carry the session's
//! bearer token.
//!
//! Session-change notifications are fired locally from this client's own
//! credential calls. The first resolution of a sign-in may therefore race
//! with the notification for the same credential check; both paths converge
//! on the state machine's idempotent resynchronization.

use std::sync::{Arc, Mutex};

use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use url::Url;

use beanpass_core::{AccountId, CustomerId, CustomerLocationId, Email, JoinCode, OrgId};

use crate::config::ClientConfig;
use crate::models::{CustomerProfile, Location, SavedLocation, Session};
use crate::remote::types::{
    CustomerRecord, LocationRecord, NewCustomerRecord, NewSavedLocationRecord, SavedLocationRecord,
    SessionRecord,
};
use crate::remote::{AccountService, NewCustomer, NewSavedLocation, RemoteError, SessionEvent};

/// Capacity of the session-event channel; events are tiny and consumers
/// resynchronize from scratch, so lag only costs a redundant resync.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Error body returned by the credential endpoints.
#[derive(Debug, Deserialize)]
struct AuthErrorBody {
    msg: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
}

impl AuthErrorBody {
    fn message(self) -> String {
        self.msg
            .or(self.error_description)
            .or(self.message)
            .unwrap_or_else(|| "Request failed".to_string())
    }
}

/// Response body of the account-creation endpoint.
#[derive(Debug, Deserialize)]
struct SignupResponse {
    id: uuid::Uuid,
}

/// Client for the remote account service.
///
/// Cheaply cloneable; all clones share one HTTP connection pool, one cached
/// session, and one event channel.
#[derive(Clone)]
pub struct HttpAccountService {
    inner: Arc<HttpAccountServiceInner>,
}

struct HttpAccountServiceInner {
    client: reqwest::Client,
    base_url: Url,
    service_key: String,
    // Non-owning cached copy of the current grant. Durable token storage is
    // the embedder's concern; a fresh process starts signed out.
    session: Mutex<Option<Session>>,
    events: broadcast::Sender<SessionEvent>,
}

impl HttpAccountService {
    /// Create a new client for the configured remote service.
    #[must_use]
    pub fn new(config: &ClientConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(HttpAccountServiceInner {
                client: reqwest::Client::new(),
                base_url: config.service_url.clone(),
                service_key: config.service_key.expose_secret().to_string(),
                session: Mutex::new(None),
                events,
            }),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, RemoteError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| RemoteError::Transport(format!("invalid endpoint {path}: {e}")))
    }

    /// Bearer token for authenticated REST calls: the session token when
    /// signed in, the public key otherwise.
    fn bearer(&self) -> String {
        self.inner
            .session
            .lock()
            .ok()
            .and_then(|guard| {
                guard
                    .as_ref()
                    .map(|s| s.access_token.expose_secret().to_string())
            })
            .unwrap_or_else(|| self.inner.service_key.clone())
    }

    fn store_session(&self, session: Option<Session>) {
        if let Ok(mut guard) = self.inner.session.lock() {
            *guard = session;
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No receivers is fine: nothing has subscribed yet.
        let _ = self.inner.events.send(event);
    }

    async fn error_message(response: reqwest::Response) -> (reqwest::StatusCode, String) {
        let status = response.status();
        let message = response
            .json::<AuthErrorBody>()
            .await
            .map_or_else(|_| format!("request failed ({status})"), AuthErrorBody::message);
        (status, message)
    }

    /// Classify a failure from the `/auth/v1/*` credential endpoints. Only
    /// here does a 4xx mean the credentials themselves were rejected.
    async fn auth_error(response: reqwest::Response) -> RemoteError {
        let (status, message) = Self::error_message(response).await;
        classify_auth_error(status, message)
    }

    /// Classify a failure from the `/rest/v1/*` table endpoints. A 4xx here
    /// is a query or policy problem, never a credential message fit to show
    /// the user verbatim.
    async fn table_error(response: reqwest::Response) -> RemoteError {
        let (status, message) = Self::error_message(response).await;
        classify_table_error(status, message)
    }

    /// Execute a GET against a REST table endpoint and decode the row set.
    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, RemoteError> {
        let mut url = self.endpoint(&format!("rest/v1/{table}"))?;
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));

        let response = self
            .inner
            .client
            .get(url)
            .header("apikey", &self.inner.service_key)
            .bearer_auth(self.bearer())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::table_error(response).await);
        }

        Ok(response.json().await?)
    }

    /// Execute an insert against a REST table endpoint, returning the
    /// created row.
    async fn insert<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<T, RemoteError> {
        let url = self.endpoint(&format!("rest/v1/{table}"))?;

        let response = self
            .inner
            .client
            .post(url)
            .header("apikey", &self.inner.service_key)
            .header("Prefer", "return=representation")
            .bearer_auth(self.bearer())
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::table_error(response).await);
        }

        let mut rows: Vec<T> = response.json().await?;
        rows.pop()
            .ok_or_else(|| RemoteError::Record(format!("{table} insert returned no row")))
    }

    /// Execute a single-row update by id.
    async fn update_by_id<B: serde::Serialize>(
        &self,
        table: &str,
        id: uuid::Uuid,
        body: &B,
    ) -> Result<(), RemoteError> {
        let mut url = self.endpoint(&format!("rest/v1/{table}"))?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));

        let response = self
            .inner
            .client
            .patch(url)
            .header("apikey", &self.inner.service_key)
            .bearer_auth(self.bearer())
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::table_error(response).await);
        }

        Ok(())
    }
}

impl AccountService for HttpAccountService {
    async fn create_account(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<AccountId, RemoteError> {
        let url = self.endpoint("auth/v1/signup")?;

        let response = self
            .inner
            .client
            .post(url)
            .header("apikey", &self.inner.service_key)
            .json(&serde_json::json!({
                "email": email.as_str(),
                "password": password,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::auth_error(response).await);
        }

        let signup: SignupResponse = response.json().await?;
        tracing::info!(account_id = %signup.id, "account created");

        // The new account is signed in; the session comes from the same
        // credentials it was created with.
        let session = self.verify_credentials(email, password).await?;
        let account_id = session.account_id;
        debug_assert_eq!(account_id.as_uuid(), signup.id);

        Ok(account_id)
    }

    async fn verify_credentials(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<Session, RemoteError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let response = self
            .inner
            .client
            .post(url)
            .header("apikey", &self.inner.service_key)
            .json(&serde_json::json!({
                "email": email.as_str(),
                "password": password,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::auth_error(response).await);
        }

        let record: SessionRecord = response.json().await?;
        let session = Session::try_from(record)?;

        self.store_session(Some(session.clone()));
        self.emit(SessionEvent::SignedIn(session.clone()));

        Ok(session)
    }

    async fn end_session(&self) -> Result<(), RemoteError> {
        let url = self.endpoint("auth/v1/logout")?;
        let bearer = self.bearer();

        // Local state clears before the remote call resolves; the grant is
        // gone from this client's point of view either way.
        self.store_session(None);
        self.emit(SessionEvent::SignedOut);

        let response = self
            .inner
            .client
            .post(url)
            .header("apikey", &self.inner.service_key)
            .bearer_auth(bearer)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::auth_error(response).await);
        }

        Ok(())
    }

    async fn current_session(&self) -> Result<Option<Session>, RemoteError> {
        Ok(self
            .inner
            .session
            .lock()
            .ok()
            .and_then(|guard| guard.clone()))
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    async fn find_customer(
        &self,
        account_id: AccountId,
    ) -> Result<Option<CustomerProfile>, RemoteError> {
        let rows: Vec<CustomerRecord> = self
            .select(
                "customers",
                &[
                    ("auth_account_id", format!("eq.{account_id}")),
                    ("select", "*".to_string()),
                ],
            )
            .await?;

        rows.into_iter().next().map(TryInto::try_into).transpose()
    }

    async fn insert_customer(&self, new: NewCustomer) -> Result<CustomerProfile, RemoteError> {
        let record: CustomerRecord = self
            .insert("customers", &NewCustomerRecord::from(&new))
            .await?;
        record.try_into()
    }

    async fn set_customer_org(
        &self,
        customer_id: CustomerId,
        org_id: OrgId,
    ) -> Result<(), RemoteError> {
        self.update_by_id(
            "customers",
            customer_id.as_uuid(),
            &serde_json::json!({ "org_id": org_id.as_uuid() }),
        )
        .await
    }

    async fn find_active_location(&self, code: &JoinCode) -> Result<Option<Location>, RemoteError> {
        let rows: Vec<LocationRecord> = self
            .select(
                "locations",
                &[
                    // ilike without wildcards is a case-insensitive match;
                    // stored codes are not guaranteed canonical.
                    ("join_code", format!("ilike.{code}")),
                    ("active", "is.true".to_string()),
                    ("select", "*".to_string()),
                ],
            )
            .await?;

        rows.into_iter().next().map(TryInto::try_into).transpose()
    }

    async fn list_saved_locations(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<SavedLocation>, RemoteError> {
        let rows: Vec<SavedLocationRecord> = self
            .select(
                "customer_locations",
                &[
                    ("customer_id", format!("eq.{customer_id}")),
                    ("select", "*,location:locations(*)".to_string()),
                    ("order", "is_home.desc,last_visited_at.desc".to_string()),
                ],
            )
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn insert_saved_location(
        &self,
        new: NewSavedLocation,
    ) -> Result<SavedLocation, RemoteError> {
        // Re-select with the embedded location join; the insert response
        // carries only the bare row.
        let record: SavedLocationRecord = {
            #[derive(serde::Deserialize)]
            struct BareRow {
                id: uuid::Uuid,
            }

            let bare: BareRow = self
                .insert("customer_locations", &NewSavedLocationRecord::from(&new))
                .await?;

            let mut rows: Vec<SavedLocationRecord> = self
                .select(
                    "customer_locations",
                    &[
                        ("id", format!("eq.{}", bare.id)),
                        ("select", "*,location:locations(*)".to_string()),
                    ],
                )
                .await?;

            rows.pop().ok_or_else(|| {
                RemoteError::Record("inserted customer_location row not found".into())
            })?
        };

        record.try_into()
    }

    async fn set_home_flag(
        &self,
        id: CustomerLocationId,
        is_home: bool,
    ) -> Result<(), RemoteError> {
        self.update_by_id(
            "customer_locations",
            id.as_uuid(),
            &serde_json::json!({ "is_home": is_home }),
        )
        .await
    }
}

fn classify_auth_error(status: reqwest::StatusCode, message: String) -> RemoteError {
    let lowered = message.to_lowercase();
    if lowered.contains("already registered") || lowered.contains("already exists") {
        RemoteError::AlreadyRegistered
    } else if status == reqwest::StatusCode::CONFLICT {
        RemoteError::Conflict(message)
    } else if status.is_client_error() {
        RemoteError::Credentials(message)
    } else {
        RemoteError::Transport(message)
    }
}

fn classify_table_error(status: reqwest::StatusCode, message: String) -> RemoteError {
    if status == reqwest::StatusCode::CONFLICT {
        RemoteError::Conflict(message)
    } else {
        RemoteError::Transport(message)
    }
}
