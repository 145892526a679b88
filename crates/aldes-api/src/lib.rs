//! Async Rust client for the Aldes cloud API (AldesConnect).
//!
//! The API is small: an OAuth password-grant token endpoint, an account-wide
//! product listing, a per-product document, and a JSON-RPC command endpoint
//! used to change the ventilation mode. [`AldesClient`] wraps all of it
//! behind a bearer token that is refreshed transparently on HTTP 401.

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod products;
pub mod transport;

pub use client::AldesClient;
pub use error::Error;
pub use models::{ProductData, ProductDocument, ProductIndicator, ProductSummary};
pub use transport::TransportConfig;

/// Production API root.
pub const DEFAULT_API_URL: &str = "https://aldesiotsuite-aldeswebapi.azurewebsites.net";
