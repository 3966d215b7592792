//! Parkline Core - Shared types library.
//!
//! This crate provides common types used across all Parkline components:
//! - `app` - Session, catalog, reservation lifecycle and backends
//! - `cli` - Command-line front end (one-shot commands and interactive shell)
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, credentials, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
