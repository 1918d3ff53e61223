//! Session renewal with single-flight coordination.
//!
//! Any number of concurrent requests may discover a stale credential at the
//! same moment. The authenticator collapses those discoveries into one
//! renewal call: the first caller spawns the call as an independent task and
//! parks a shared handle to it; late arrivals await the same handle and
//! receive the same credential (or the same error). Spawning means a caller
//! being cancelled cannot abort a renewal other waiters depend on.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::api::envelope::Envelope;
use crate::api::transport::{ApiRequest, Transport};
use crate::config::ApiConfig;
use crate::models::{SessionInfo, SessionMeta};

use super::{Credential, CredentialStore};

/// Renewal errors. Clone-able (string payloads only) so a single renewal
/// result can fan out to every waiter of the shared future.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("session renewal rejected by server: {message}")]
    ServerRejected { message: String, expired: bool },

    #[error("session renewal transport failure: {0}")]
    Transport(String),

    #[error("session renewal response corrupted: {0}")]
    Decode(String),

    #[error("session renewal task aborted")]
    Aborted,
}

type RenewalResult = Result<(SessionInfo, Credential), AuthError>;
type SharedRenewal = Shared<BoxFuture<'static, RenewalResult>>;

pub struct Authenticator {
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
    config: ApiConfig,
    inflight: Mutex<Option<SharedRenewal>>,
}

impl Authenticator {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
        config: ApiConfig,
    ) -> Self {
        Self {
            transport,
            store,
            config,
            inflight: Mutex::new(None),
        }
    }

    /// Produce a usable credential, renewing the session if needed.
    ///
    /// `stale` is the credential the caller found wanting (None when
    /// refreshing from an unauthenticated state). If the store already
    /// holds a different, non-stale credential, another caller refreshed
    /// in the meantime and that credential is returned with no network
    /// call at all.
    pub async fn refresh(&self, stale: Option<&Credential>) -> Result<Credential, AuthError> {
        if let Some(current) = self.already_renewed(stale) {
            debug!("credential already renewed by another caller, skipping network call");
            return Ok(current);
        }

        let shared = {
            let mut slot = self.inflight.lock().await;
            match slot.as_ref() {
                Some(existing) => existing.clone(),
                None => {
                    // Re-check inside the lock: a renewal that completed
                    // while we waited has already replaced the credential.
                    if let Some(current) = self.already_renewed(stale) {
                        debug!("renewal finished while waiting for the slot");
                        return Ok(current);
                    }
                    let fut = self.spawn_renewal();
                    *slot = Some(fut.clone());
                    fut
                }
            }
        };

        let (_, credential) = self.await_and_clear(shared).await?;
        Ok(credential)
    }

    /// The renewal call surfaced directly: the ping response carries the
    /// student record alongside the rotated session token, so this doubles
    /// as the student-info fetch. Always renews.
    pub async fn ping(&self) -> RenewalResult {
        let shared = {
            let mut slot = self.inflight.lock().await;
            match slot.as_ref() {
                Some(existing) => existing.clone(),
                None => {
                    let fut = self.spawn_renewal();
                    *slot = Some(fut.clone());
                    fut
                }
            }
        };
        self.await_and_clear(shared).await
    }

    /// The de-duplication rule: if the store holds a credential different
    /// from the one the caller found stale, and it is not itself stale,
    /// someone else already refreshed.
    fn already_renewed(&self, stale: Option<&Credential>) -> Option<Credential> {
        let current = self.store.get()?;
        let replaced = stale.map(|s| *s != current).unwrap_or(true);
        (replaced && !current.requires_refresh()).then_some(current)
    }

    fn spawn_renewal(&self) -> SharedRenewal {
        let transport = Arc::clone(&self.transport);
        let store = Arc::clone(&self.store);
        let config = self.config.clone();
        let handle = tokio::spawn(Self::renewal_call(transport, store, config));
        async move {
            match handle.await {
                Ok(result) => result,
                Err(err) => {
                    warn!(error = %err, "renewal task did not complete");
                    Err(AuthError::Aborted)
                }
            }
        }
        .boxed()
        .shared()
    }

    async fn await_and_clear(&self, shared: SharedRenewal) -> RenewalResult {
        let result = shared.clone().await;

        // Clear the slot, but only our own entry: a newer renewal may
        // already have parked its future there.
        let mut slot = self.inflight.lock().await;
        if slot.as_ref().map(|f| f.ptr_eq(&shared)).unwrap_or(false) {
            *slot = None;
        }

        result
    }

    async fn renewal_call(
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
        config: ApiConfig,
    ) -> RenewalResult {
        // Authenticates manually with the best-known token and carries the
        // bypass marker so the interceptor never recurses into refresh.
        let mut request = ApiRequest::post(config.ping_path())
            .form("include_data", "true")
            .bypass();
        if let Some(current) = store.get() {
            request = request
                .authorization(&current.session_token)
                .map_err(|e| AuthError::Transport(e.to_string()))?;
        }

        debug!(path = %request.path, "renewing session");
        let response = transport
            .send(request)
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let envelope: Envelope<SessionInfo, SessionMeta> = match Envelope::decode(&response.body) {
            Ok(envelope) => envelope,
            Err(_) if !response.status.is_success() => {
                return Err(AuthError::Transport(format!(
                    "renewal returned status {}",
                    response.status
                )));
            }
            Err(err) => return Err(AuthError::Decode(err.to_string())),
        };

        match envelope {
            Envelope::Failure { message, expired } => {
                Err(AuthError::ServerRejected { message, expired })
            }
            Envelope::Success { data, meta } => {
                let credential = Credential::new(meta.session_id);
                // Best-effort: the in-memory credential still serves the
                // current request cycle even if persistence fails.
                if let Err(err) = store.set(credential.clone()) {
                    warn!(error = %err, "failed to persist renewed credential");
                }
                debug!("session renewed");
                Ok((data, credential))
            }
        }
    }
}
