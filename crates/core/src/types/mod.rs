//! Core types for Parkline.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod credentials;
pub mod id;
pub mod price;
pub mod status;

pub use credentials::{CredentialError, Email, Password, Username};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use status::*;
