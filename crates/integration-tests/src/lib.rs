//! Integration tests for Beanpass.
//!
//! The tests drive the full client state machine against the in-memory
//! account service, so they need no network, no external database, and no
//! environment configuration.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p beanpass-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `identity` - Sign-up, sign-in, sign-out, and resynchronization races
//! - `locations` - Join, home promotion, and saved-location ordering

#![cfg_attr(not(test), forbid(unsafe_code))]

use beanpass_client::models::Location;
use beanpass_client::remote::memory::MemoryAccountService;
use beanpass_client::{ClientStore, Snapshot};
use beanpass_core::{JoinCode, OrgId};

pub const EMAIL: &str = "ada@example.com";
pub const PASSWORD: &str = "hunter2468";

/// One store over one in-memory service, initialized and listening.
pub struct TestContext {
    pub service: MemoryAccountService,
    pub store: ClientStore<MemoryAccountService>,
}

impl TestContext {
    /// A fresh, signed-out context.
    pub async fn new() -> Self {
        let service = MemoryAccountService::new();
        let store = ClientStore::new(service.clone());
        store.initialize().await;
        Self { service, store }
    }

    /// A context signed in as [`EMAIL`] with a complete profile.
    ///
    /// # Panics
    ///
    /// Panics if sign-up or sign-in fails; test setup errors should fail
    /// loudly.
    pub async fn signed_in() -> Self {
        let ctx = Self::new().await;
        ctx.store
            .sign_up(EMAIL, PASSWORD, "Ada", "Lovelace")
            .await
            .expect("sign-up failed");
        ctx.store
            .sign_in(EMAIL, PASSWORD)
            .await
            .expect("sign-in failed");
        ctx
    }

    /// Seed an active location under a fresh organization.
    ///
    /// # Panics
    ///
    /// Panics on an invalid join code; seeds are hard-coded in tests.
    pub fn seed_location(&self, name: &str, code: &str) -> Location {
        self.service.add_location(
            name,
            JoinCode::parse(code).expect("invalid seed join code"),
            OrgId::generate(),
            Some("Portland"),
            Some("OR"),
            true,
        )
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }
}
