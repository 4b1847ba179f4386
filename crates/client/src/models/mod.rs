//! Domain models for the client core.
//!
//! These are validated domain objects, separate from the wire records that
//! cross the remote-service boundary (see [`crate::remote::types`]).

pub mod customer;
pub mod location;
pub mod session;

pub use customer::CustomerProfile;
pub use location::{Location, SavedLocation};
pub use session::Session;
