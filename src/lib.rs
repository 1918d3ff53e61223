//! Unofficial client library for the ClassCharts student API.
//!
//! Handles the session credential lifecycle so callers don't have to:
//! every request gets the current token attached, a near-expiry or
//! server-rejected token is renewed transparently (with concurrent
//! renewals collapsed into one call), and the tagged response envelope is
//! decoded into typed success or failure results.
//!
//! ```no_run
//! use classcharts_client::{ApiClient, ApiConfig};
//!
//! # async fn run() -> Result<(), classcharts_client::ApiError> {
//! let client = ApiClient::new(ApiConfig::default())?;
//! client.login("ABC123", "2008-01-01").await?;
//! let announcements = client.get_announcements().await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError, Envelope};
pub use auth::{Credential, CredentialStore, MemoryCredentialStore};
pub use config::ApiConfig;
