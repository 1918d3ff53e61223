//! Client endpoint configuration.
//!
//! Holds the base URL and API path prefix used to build request paths.
//! The bypass path set used by the interceptor is derived from here so
//! that login and session renewal are never routed through credential
//! attachment.

use serde::{Deserialize, Serialize};

/// Default base URL for the ClassCharts API.
const DEFAULT_BASE_URL: &str = "https://www.classcharts.com";

/// Path prefix for the student-facing API endpoints.
const DEFAULT_STUDENT_API_PATH: &str = "/apiv2student";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub student_api_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            student_api_path: DEFAULT_STUDENT_API_PATH.to_string(),
        }
    }
}

impl ApiConfig {
    /// Configuration pointing at an alternate host, e.g. a test server.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Path of the session renewal endpoint.
    pub fn ping_path(&self) -> String {
        format!("{}/ping", self.student_api_path)
    }

    /// Path of the login endpoint.
    pub fn login_path(&self) -> String {
        format!("{}/login", self.student_api_path)
    }

    /// Path prefixes that must never have a credential attached.
    /// Login creates the session and renewal rotates it; authenticating
    /// either one would be circular.
    pub fn bypass_paths(&self) -> Vec<String> {
        vec![self.login_path(), self.ping_path()]
    }
}
