//! The full customer journey against an in-memory account service:
//! sign up, connect to two cafés, switch home, sign out. No network, no
//! configuration.

use beanpass_client::remote::memory::MemoryAccountService;
use beanpass_client::{ClientStore, StoreError};
use beanpass_core::{JoinCode, OrgId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DemoError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Demo data error: {0}")]
    Seed(#[from] beanpass_core::JoinCodeError),
}

#[allow(clippy::print_stdout)]
pub async fn run() -> Result<(), DemoError> {
    let service = MemoryAccountService::new();
    let org = OrgId::generate();
    service.add_location(
        "Corner Roasters",
        JoinCode::parse("CAFE01")?,
        org,
        Some("Portland"),
        Some("OR"),
        true,
    );
    service.add_location(
        "Harbor Beans",
        JoinCode::parse("CAFE02")?,
        org,
        Some("Seattle"),
        Some("WA"),
        true,
    );

    let store = ClientStore::new(service);
    store.initialize().await;

    println!("Signing up ada@example.com ...");
    store
        .sign_up("ada@example.com", "hunter2468", "Ada", "Lovelace")
        .await?;
    store.sign_in("ada@example.com", "hunter2468").await?;

    let snapshot = store.snapshot();
    if let Some(profile) = &snapshot.profile {
        println!("  Scan token: {}", profile.scan_token);
        println!("  Balance:    {}", profile.balance);
    }

    println!("Connecting to CAFE01 (first location becomes home) ...");
    let name = store.connect_location("CAFE01").await?;
    println!("  Connected to {name}");

    println!("Connecting to CAFE02 ...");
    let name = store.connect_location("CAFE02").await?;
    println!("  Connected to {name}");

    println!("Switching home to the second location ...");
    let second = store
        .snapshot()
        .saved_locations
        .iter()
        .find(|row| !row.is_home)
        .map(|row| (row.id, row.location.name.clone()));
    if let Some((id, name)) = second {
        store.set_home_location(id).await?;
        println!("  {name} is now home");
    }

    for row in &store.snapshot().saved_locations {
        let marker = if row.is_home { " (home)" } else { "" };
        println!("  - {}{marker}", row.location.name);
    }

    println!("Signing out ...");
    store.sign_out().await;
    store.shutdown();
    println!("Done.");
    Ok(())
}
