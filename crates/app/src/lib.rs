//! Parkline application library.
//!
//! Everything a front end needs to book and administer parking spots:
//! session persistence, the lot catalog, the reservation lifecycle,
//! dashboard aggregation, CSV export and the two interchangeable backends.
//!
//! # Layers
//!
//! - [`state::AppState`] - controller a front end drives
//! - [`backend::ParkingBackend`] - demo (in memory) or remote (REST)
//! - [`catalog`], [`lifecycle`] - lot and reservation rules used by the demo
//!   backend and the test server
//! - [`dashboard`], [`export`] - pure derivations over lots and reservations

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod lifecycle;
pub mod models;
pub mod notice;
pub mod session;
pub mod state;

pub use backend::{DemoBackend, ParkingBackend, RemoteBackend, build_backend};
pub use config::{AppConfig, BackendMode};
pub use error::AppError;
pub use state::{AppState, View};
