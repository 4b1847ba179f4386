//! Core types for Beanpass.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod balance;
pub mod email;
pub mod id;
pub mod join_code;
pub mod scan_token;

pub use balance::Balance;
pub use email::{Email, EmailError};
pub use id::*;
pub use join_code::{JoinCode, JoinCodeError};
pub use scan_token::{ScanToken, ScanTokenError};
