//! API client for communicating with the ClassCharts student API.
//!
//! Wires the credential store, authenticator, interceptor, and transport
//! together and exposes the resource operations. Every response runs
//! through the same pipeline: prepare, send, classify, at most one
//! authenticated retry, then envelope decode.

use std::sync::Arc;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::auth::{Authenticator, Credential, CredentialStore, MemoryCredentialStore};
use crate::config::ApiConfig;
use crate::models::{Announcement, Detention, SessionInfo, SessionMeta};

use super::envelope::Envelope;
use super::error::ApiError;
use super::interceptor::{AuthFailure, AuthInterceptor, RetryDecision};
use super::transport::{ApiRequest, HttpTransport, Transport};

/// Placeholder captcha token the login endpoint expects from API clients.
const CAPTCHA_PLACEHOLDER: &str = "no-captcha-available";

pub struct ApiClient {
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
    authenticator: Arc<Authenticator>,
    interceptor: AuthInterceptor,
    config: ApiConfig,
}

impl ApiClient {
    /// Create a client with the reqwest transport and an in-memory store.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(config.base_url.clone())?);
        let store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());
        Ok(Self::with_parts(transport, store, config))
    }

    /// Create a client from explicit parts. Tests substitute a stub
    /// transport or an alternate credential store here.
    pub fn with_parts(
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
        config: ApiConfig,
    ) -> Self {
        let authenticator = Arc::new(Authenticator::new(
            Arc::clone(&transport),
            Arc::clone(&store),
            config.clone(),
        ));
        let interceptor = AuthInterceptor::new(
            Arc::clone(&store),
            Arc::clone(&authenticator),
            config.bypass_paths(),
        );
        Self {
            transport,
            store,
            authenticator,
            interceptor,
            config,
        }
    }

    /// Log in with a student code and date of birth.
    ///
    /// The only operation that creates a credential from nothing: on
    /// success the session token from the response metadata is minted into
    /// a credential and stored.
    pub async fn login(&self, code: &str, dob: &str) -> Result<(), ApiError> {
        let request = ApiRequest::post(self.config.login_path())
            .form("code", code.to_lowercase())
            .form("dob", dob)
            .form("recaptcha-token", CAPTCHA_PLACEHOLDER)
            .form("remember", "true");

        let prepared = self.interceptor.prepare(request).await?;
        let response = self.transport.send(prepared).await?;
        let envelope: Envelope<Value, SessionMeta> = Envelope::decode(&response.body)?;

        match envelope {
            Envelope::Failure { message, expired } => {
                Err(ApiError::ServerRejected { message, expired })
            }
            Envelope::Success { meta, .. } => {
                // Unlike refresh, a store failure here is fatal: without a
                // stored credential no later request can authenticate.
                self.store.set(Credential::new(meta.session_id))?;
                debug!("login succeeded, credential stored");
                Ok(())
            }
        }
    }

    /// Fetch the student record. The ping response carries it alongside
    /// the rotated session token, which is persisted as a side effect.
    pub async fn get_student_info(&self) -> Result<SessionInfo, ApiError> {
        let (info, _credential) = self.authenticator.ping().await?;
        Ok(info)
    }

    /// Fetch school announcements.
    pub async fn get_announcements(&self) -> Result<Vec<Announcement>, ApiError> {
        self.fetch(ApiRequest::get(format!(
            "{}/announcements",
            self.config.student_api_path
        )))
        .await
    }

    /// Fetch detentions.
    pub async fn get_detentions(&self) -> Result<Vec<Detention>, ApiError> {
        self.fetch(ApiRequest::get(format!(
            "{}/detentions",
            self.config.student_api_path
        )))
        .await
    }

    /// Drop the stored credential.
    pub fn logout(&self) {
        self.store.clear();
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.get().is_some()
    }

    async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let (data, _meta) = self.send_enveloped::<T, Value>(request).await?;
        Ok(data)
    }

    /// Full pipeline: prepare, send, classify, at most one auth retry,
    /// decode. The retried request is re-prepared from the original so it
    /// picks up the refreshed credential.
    async fn send_enveloped<T, M>(&self, request: ApiRequest) -> Result<(T, M), ApiError>
    where
        T: DeserializeOwned,
        M: DeserializeOwned,
    {
        let mut attempted_retry = false;
        loop {
            let prepared = self.interceptor.prepare(request.clone()).await?;
            let response = self.transport.send(prepared).await?;

            let failure = if response.status == StatusCode::UNAUTHORIZED {
                AuthFailure::Unauthorized
            } else {
                match Envelope::<T, M>::decode(&response.body)? {
                    Envelope::Success { data, meta } => return Ok((data, meta)),
                    Envelope::Failure { message, expired } => {
                        AuthFailure::Rejected { message, expired }
                    }
                }
            };

            if !attempted_retry {
                if let RetryDecision::RefreshAndRetry =
                    self.interceptor.should_retry(&failure).await?
                {
                    attempted_retry = true;
                    debug!(path = %request.path, "retrying with refreshed credential");
                    continue;
                }
            }

            return Err(match failure {
                AuthFailure::Unauthorized => ApiError::Unauthorized,
                AuthFailure::Rejected { message, expired } => {
                    ApiError::ServerRejected { message, expired }
                }
            });
        }
    }
}
