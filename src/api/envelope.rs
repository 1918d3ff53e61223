//! Wire envelope shared by every API response.
//!
//! The server wraps every body in the same shape: a success carries `data`
//! plus `meta`, a failure carries a zero `success` flag, an `error` message,
//! and an optional `expired` flag. The decoder tries the success shape
//! first, then the failure shape; a body matching neither is corrupted.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

/// Maximum body length quoted in decode errors.
const MAX_ERROR_BODY_LENGTH: usize = 200;

#[derive(Error, Debug, Clone)]
#[error("corrupted response body: {0}")]
pub struct DecodeError(pub String);

/// Decoded response envelope, generic over payload and metadata types.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T, M> {
    Success { data: T, meta: M },
    Failure { message: String, expired: bool },
}

impl<T, M> Envelope<T, M>
where
    T: DeserializeOwned,
    M: DeserializeOwned,
{
    /// Decode a wire body.
    ///
    /// Success requires both `data` and `meta` present and individually
    /// well-formed; a present-but-malformed field is a decode error, not a
    /// fall-through. Failure requires the `success` discriminator equal to
    /// zero plus an `error` message. `expired` defaults to false when
    /// missing or unparseable.
    pub fn decode(body: &str) -> Result<Self, DecodeError> {
        let value: Value =
            serde_json::from_str(body).map_err(|_| DecodeError(truncate_body(body)))?;
        let object = value
            .as_object()
            .ok_or_else(|| DecodeError(truncate_body(body)))?;

        if let (Some(data), Some(meta)) = (object.get("data"), object.get("meta")) {
            let data = serde_json::from_value(data.clone())
                .map_err(|e| DecodeError(format!("malformed data field: {}", e)))?;
            let meta = serde_json::from_value(meta.clone())
                .map_err(|e| DecodeError(format!("malformed meta field: {}", e)))?;
            return Ok(Envelope::Success { data, meta });
        }

        let failure_flagged = matches!(object.get("success"), Some(flag) if flag_is_zero(flag));
        if failure_flagged {
            if let Some(message) = object.get("error").and_then(Value::as_str) {
                let expired = object.get("expired").map(parse_expired_flag).unwrap_or(false);
                return Ok(Envelope::Failure {
                    message: message.to_string(),
                    expired,
                });
            }
        }

        Err(DecodeError(truncate_body(body)))
    }
}

impl<T, M> Envelope<T, M>
where
    T: Serialize,
    M: Serialize,
{
    /// Encode the mirror of `decode`: success writes `data` and `meta`
    /// directly with no discriminator, failure writes the zero `success`
    /// flag plus message and expiry flag.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        let mut object = Map::new();
        match self {
            Envelope::Success { data, meta } => {
                object.insert("data".to_string(), serde_json::to_value(data)?);
                object.insert("meta".to_string(), serde_json::to_value(meta)?);
            }
            Envelope::Failure { message, expired } => {
                object.insert("success".to_string(), Value::from(0));
                object.insert("error".to_string(), Value::from(message.as_str()));
                object.insert(
                    "expired".to_string(),
                    Value::from(if *expired { 1 } else { 0 }),
                );
            }
        }
        serde_json::to_string(&Value::Object(object))
    }
}

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        body.to_string()
    } else {
        let cut = body
            .char_indices()
            .take_while(|(i, _)| *i < MAX_ERROR_BODY_LENGTH)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}... (truncated, {} total bytes)", &body[..cut], body.len())
    }
}

fn flag_is_zero(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Bool(b) => !b,
        Value::String(s) => s == "0" || s.eq_ignore_ascii_case("false"),
        _ => false,
    }
}

fn parse_expired_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
        Value::String(s) => s == "1" || s.eq_ignore_ascii_case("true"),
        other => {
            warn!(flag = %other, "unparseable expired flag, assuming false");
            false
        }
    }
}
