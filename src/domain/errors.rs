//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    /// Transport failure: connection refused, timeout, TLS.
    #[error("Network error: {0}")]
    Network(String),

    /// Body was not valid JSON or did not match the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Server answered outside the 2xx range. `payload` is the parsed error body.
    #[error("HTTP {status}")]
    Api { status: u16, payload: Value },

    #[error("State error: {0}")]
    State(String),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Неизвестный справочник: {0}")]
    UnknownDirectory(String),
}

impl DomainError {
    /// HTTP status for `Api` failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            DomainError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server-reported error codes (`errors[].code`) carried by an `Api` failure.
    pub fn error_codes(&self) -> Vec<String> {
        match self {
            DomainError::Api { payload, .. } => error_codes(payload),
            _ => Vec::new(),
        }
    }
}

/// Extract `errors[].code` from a server payload. Missing or malformed entries are skipped.
pub fn error_codes(payload: &Value) -> Vec<String> {
    payload
        .get("errors")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e.get("code").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_codes_from_api_failure() {
        let err = DomainError::Api {
            status: 409,
            payload: json!({"errors": [{"code": "ROOM_BUSY"}, {"code": "GROUP_BUSY"}, {"msg": "x"}]}),
        };
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.error_codes(), vec!["ROOM_BUSY", "GROUP_BUSY"]);
    }

    #[test]
    fn test_error_codes_absent() {
        assert!(error_codes(&json!({})).is_empty());
        assert!(error_codes(&json!({"errors": "nope"})).is_empty());
        assert!(DomainError::Network("down".into()).error_codes().is_empty());
    }
}
