//! Beanpass client core.
//!
//! This crate is the logic layer of the Beanpass mobile-web client: customers
//! sign up, obtain a QR-code identity token, and link their account to one or
//! more café locations, one of which is flagged "home".
//!
//! The UI layer, the remote authentication/database service, and the camera
//! hardware are external collaborators. This crate owns:
//!
//! - [`store`] - The identity/location state machine: a single snapshot of
//!   session, profile, and saved locations, mutated only by its own
//!   operations and published through a watch channel.
//! - [`guard`] - The pure route guard policy derived from the snapshot.
//! - [`scanner`] - The QR decode session lifecycle over a camera device.
//! - [`remote`] - The account-service interface, with an HTTP implementation
//!   and an in-memory implementation for tests and demos.
//! - [`prefs`] - Durable client-side preferences (install prompt dismissal).

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod guard;
pub mod models;
pub mod prefs;
pub mod remote;
pub mod scanner;
pub mod store;

pub use config::{ClientConfig, ConfigError};
pub use error::StoreError;
pub use store::{ClientStore, Snapshot};
