//! Beanpass Core - Shared types library.
//!
//! This crate provides common types used across all Beanpass components:
//! - `client` - The mobile-web client core (state machine, guard, scanner)
//! - `cli` - Command-line tools for driving the client against a service
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no async.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, scan tokens,
//!   join codes, and balances

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
