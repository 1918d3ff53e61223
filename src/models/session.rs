//! Payload and metadata types for the login and renewal envelopes.
//!
//! Renewal response keys arrive in either snake_case or camelCase depending
//! on the endpoint version, so the session token field accepts both.

use serde::{Deserialize, Serialize};

use super::Student;

/// Payload of the ping response when `include_data=true`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    #[serde(default)]
    pub user: Option<Student>,
}

/// Metadata of the login and ping envelopes: API version plus the session
/// token the next request must authenticate with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMeta {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(alias = "sessionId")]
    pub session_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_accepts_both_key_styles() {
        let snake: SessionMeta =
            serde_json::from_str(r#"{"session_id":"S1","version":"2.0"}"#).expect("decode failed");
        assert_eq!(snake.session_id, "S1");
        assert_eq!(snake.version.as_deref(), Some("2.0"));

        let camel: SessionMeta = serde_json::from_str(r#"{"sessionId":"S2"}"#).expect("decode failed");
        assert_eq!(camel.session_id, "S2");
        assert!(camel.version.is_none());
    }

    #[test]
    fn test_session_info_decodes_without_user() {
        let info: SessionInfo = serde_json::from_str("{}").expect("decode failed");
        assert!(info.user.is_none());
    }
}
