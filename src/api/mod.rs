//! API layer: transport seam, envelope codec, auth interceptor, and the
//! client composition root.
//!
//! The API wraps every response in a shared envelope shape and
//! authenticates with an opaque session token carried in the
//! `Authorization` header. The interceptor attaches and renews that token
//! transparently; login and renewal themselves are bypass paths.

pub mod client;
pub mod envelope;
pub mod error;
pub mod interceptor;
pub mod transport;

pub use client::ApiClient;
pub use envelope::{DecodeError, Envelope};
pub use error::ApiError;
pub use interceptor::{AuthFailure, AuthInterceptor, RetryDecision};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport, TransportError};
