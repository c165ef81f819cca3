//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::DomainError;
use crate::ports::endpoint::Endpoint;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Schedule API session. One instance per process run; carries the CSRF token.
#[async_trait::async_trait]
pub trait ApiPort: Send + Sync {
    async fn get(&self, endpoint: &Endpoint) -> Result<Value, DomainError>;

    async fn post(&self, endpoint: &Endpoint, body: &Value) -> Result<Value, DomainError>;

    async fn put(&self, endpoint: &Endpoint, body: &Value) -> Result<Value, DomainError>;

    async fn delete(&self, endpoint: &Endpoint) -> Result<Value, DomainError>;
}

/// Decode a JSON response into a typed payload.
pub fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, DomainError> {
    serde_json::from_value(value).map_err(|e| DomainError::Decode(format!("{}: {}", what, e)))
}

/// Client-local persistent slot for the last selected group. Last write wins.
#[async_trait::async_trait]
pub trait SessionStorePort: Send + Sync {
    async fn last_group(&self) -> Result<Option<String>, DomainError>;

    async fn set_last_group(&self, code: &str) -> Result<(), DomainError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Transient, non-blocking message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

pub trait NoticePort: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Blocking user prompts used by the admin flows.
pub trait PromptPort: Send + Sync {
    /// Free-text prompt. `None` when the user cancels.
    fn text(&self, message: &str) -> Result<Option<String>, DomainError>;

    fn confirm(&self, message: &str) -> Result<bool, DomainError>;
}
