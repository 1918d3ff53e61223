use thiserror::Error;

use crate::auth::{AuthError, StoreError};

use super::envelope::DecodeError;
use super::transport::TransportError;

/// Errors surfaced by client operations.
///
/// Callers receive either a typed payload or one of these - never a partial
/// result. `ServerRejected` carries the server's own message plus the
/// expiry flag so the caller can decide whether to prompt re-login.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("failed to decode response: {0}")]
    Decode(#[from] DecodeError),

    #[error("server rejected request: {message}")]
    ServerRejected { message: String, expired: bool },

    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("network error: {0}")]
    Network(#[from] TransportError),

    #[error("failed to persist credential: {0}")]
    Store(#[from] StoreError),

    #[error("unauthorized - session token rejected after refresh")]
    Unauthorized,
}
