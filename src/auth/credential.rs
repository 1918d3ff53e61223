use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Staleness window in seconds.
/// Shorter than the server-side session expiry so the credential is
/// renewed proactively instead of waiting for a rejection.
pub const STALENESS_WINDOW_SECS: i64 = 170;

/// Proof of session identity: an opaque token plus the time it was granted.
///
/// Credentials are never mutated. Login and renewal always construct a new
/// value, and equality (exact token and timestamp match) is what the
/// authenticator uses to tell "still the credential I found stale" apart
/// from "someone else already replaced it".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub session_token: String,
    pub granted_at: DateTime<Utc>,
}

impl Credential {
    /// Mint a credential granted now.
    pub fn new(session_token: impl Into<String>) -> Self {
        Self {
            session_token: session_token.into(),
            granted_at: Utc::now(),
        }
    }

    /// Construct with an explicit grant time.
    pub fn with_granted_at(session_token: impl Into<String>, granted_at: DateTime<Utc>) -> Self {
        Self {
            session_token: session_token.into(),
            granted_at,
        }
    }

    /// Whether the staleness window has elapsed since the grant.
    pub fn requires_refresh(&self) -> bool {
        Utc::now() - self.granted_at >= Duration::seconds(STALENESS_WINDOW_SECS)
    }

    /// Seconds remaining before the credential goes stale (for display).
    pub fn seconds_until_stale(&self) -> i64 {
        let stale_at = self.granted_at + Duration::seconds(STALENESS_WINDOW_SECS);
        (stale_at - Utc::now()).num_seconds().max(0)
    }
}
