//! Authentication: the session credential, where it lives, and how it is
//! renewed.
//!
//! This module provides:
//! - `Credential`: opaque session token plus grant time, with the staleness
//!   rule that triggers proactive renewal
//! - `CredentialStore`: storage abstraction, with an in-memory reference
//!   implementation
//! - `Authenticator`: refresh-on-demand against the renewal endpoint, with
//!   single-flight coordination across concurrent callers

pub mod authenticator;
pub mod credential;
pub mod store;

pub use authenticator::{AuthError, Authenticator};
pub use credential::{Credential, STALENESS_WINDOW_SECS};
pub use store::{CredentialStore, MemoryCredentialStore, StoreError};
