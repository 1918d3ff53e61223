//! Per-request authentication decisions.
//!
//! `prepare` runs before a request leaves: bypass paths and explicitly
//! marked requests pass through untouched (with the marker stripped),
//! everything else gets the current credential attached, refreshing it
//! first when missing or stale. `should_retry` runs after a failed attempt
//! and grants exactly one refresh-and-retry for authentication failures.

use std::sync::Arc;

use tracing::debug;

use crate::auth::{Authenticator, CredentialStore};

use super::error::ApiError;
use super::transport::ApiRequest;

/// Classification of a failed attempt, fed to `should_retry`.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthFailure {
    /// HTTP 401 from the transport.
    Unauthorized,
    /// Failure envelope from the server.
    Rejected { message: String, expired: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// The credential was refreshed; resend the request once.
    RefreshAndRetry,
    /// Not an authentication failure; surface it unchanged.
    Propagate,
}

pub struct AuthInterceptor {
    store: Arc<dyn CredentialStore>,
    authenticator: Arc<Authenticator>,
    bypass_paths: Vec<String>,
}

impl AuthInterceptor {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        authenticator: Arc<Authenticator>,
        bypass_paths: Vec<String>,
    ) -> Self {
        Self {
            store,
            authenticator,
            bypass_paths,
        }
    }

    fn is_bypass_path(&self, path: &str) -> bool {
        self.bypass_paths
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Decide whether to bypass or attach the session credential.
    pub async fn prepare(&self, mut request: ApiRequest) -> Result<ApiRequest, ApiError> {
        if self.is_bypass_path(&request.path) || request.has_bypass() {
            debug!(path = %request.path, "bypassing authentication");
            request.strip_bypass();
            return Ok(request);
        }

        let credential = match self.store.get() {
            Some(current) if !current.requires_refresh() => current,
            current => self.authenticator.refresh(current.as_ref()).await?,
        };
        Ok(request.authorization(&credential.session_token)?)
    }

    /// Classify a failed attempt. Authentication failures (401, or a
    /// failure envelope flagged expired) earn a refresh and one retry;
    /// anything else propagates.
    pub async fn should_retry(&self, failure: &AuthFailure) -> Result<RetryDecision, ApiError> {
        let is_auth_failure = match failure {
            AuthFailure::Unauthorized => true,
            AuthFailure::Rejected { expired, .. } => *expired,
        };
        if !is_auth_failure {
            return Ok(RetryDecision::Propagate);
        }

        debug!("authentication failure, refreshing credential for retry");
        let stale = self.store.get();
        self.authenticator.refresh(stale.as_ref()).await?;
        Ok(RetryDecision::RefreshAndRetry)
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::AUTHORIZATION;

    use crate::api::transport::testing::StubTransport;
    use crate::auth::{Credential, MemoryCredentialStore};
    use crate::config::ApiConfig;

    use super::*;

    fn interceptor_with(
        transport: Arc<StubTransport>,
        store: Arc<dyn CredentialStore>,
    ) -> AuthInterceptor {
        let config = ApiConfig::default();
        let authenticator = Arc::new(Authenticator::new(
            transport,
            Arc::clone(&store),
            config.clone(),
        ));
        AuthInterceptor::new(store, authenticator, config.bypass_paths())
    }

    fn no_network() -> Arc<StubTransport> {
        Arc::new(StubTransport::new(|request| {
            panic!("unexpected network call to {}", request.path)
        }))
    }

    #[tokio::test]
    async fn test_bypass_path_never_gets_credential() {
        let store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());
        store.set(Credential::new("S1")).expect("set failed");
        let interceptor = interceptor_with(no_network(), store);

        let prepared = interceptor
            .prepare(ApiRequest::post("/apiv2student/login"))
            .await
            .expect("prepare failed");
        assert!(prepared.headers.get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_bypass_header_is_stripped_and_skips_auth() {
        let store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());
        store.set(Credential::new("S1")).expect("set failed");
        let interceptor = interceptor_with(no_network(), store);

        let prepared = interceptor
            .prepare(ApiRequest::get("/apiv2student/announcements").bypass())
            .await
            .expect("prepare failed");
        assert!(!prepared.has_bypass());
        assert!(prepared.headers.get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_fresh_credential_is_attached_without_network() {
        let store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());
        store.set(Credential::new("S1")).expect("set failed");
        let interceptor = interceptor_with(no_network(), store);

        let prepared = interceptor
            .prepare(ApiRequest::get("/apiv2student/announcements"))
            .await
            .expect("prepare failed");
        let value = prepared.headers.get(AUTHORIZATION).expect("missing header");
        assert_eq!(value.to_str().expect("non-ascii header"), "Basic S1");
    }

    #[tokio::test]
    async fn test_non_expired_rejection_propagates() {
        let store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());
        let interceptor = interceptor_with(no_network(), store);

        let decision = interceptor
            .should_retry(&AuthFailure::Rejected {
                message: "bad request".to_string(),
                expired: false,
            })
            .await
            .expect("should_retry failed");
        assert_eq!(decision, RetryDecision::Propagate);
    }
}
