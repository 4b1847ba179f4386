//! CLI command implementations.

pub mod account;
pub mod demo;
pub mod location;
pub mod scan;

use beanpass_client::remote::http::HttpAccountService;
use beanpass_client::{ClientConfig, ClientStore, StoreError};
use thiserror::Error;

/// Errors shared by the remote-backed commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Missing or malformed service configuration.
    #[error(transparent)]
    Config(#[from] beanpass_client::ConfigError),

    /// A state-machine operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The requested list position does not exist.
    #[error("No saved location at position {0}; run `beanpass location list` first")]
    NoSuchPosition(usize),
}

/// Build a store against the configured service and sign in.
pub(crate) async fn signed_in_store(
    email: &str,
    password: &str,
) -> Result<ClientStore<HttpAccountService>, CliError> {
    let config = ClientConfig::from_env()?;
    let service = HttpAccountService::new(&config);
    let store = ClientStore::new(service);
    store.initialize().await;
    store.sign_in(email, password).await?;
    Ok(store)
}
