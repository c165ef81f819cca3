//! HTTP adapters. Implement ApiPort.
//!
//! reqwest client for the live API, in-memory mock for demo runs and tests.

pub mod api_client;
pub mod mock_api;

pub use api_client::HttpApiClient;
pub use mock_api::{MockApi, MockMethod, MockReply, RecordedRequest};

use crate::domain::DomainError;
use crate::ports::ApiPort;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Live,
    Demo,
}

/// Demo data only when asked for. An unreachable `/health` is logged, and the
/// live client is kept so requests fail visibly instead of showing fake data.
pub async fn open_session(
    base_url: &str,
    timeout: Duration,
    demo: bool,
) -> Result<(Arc<dyn ApiPort>, SessionMode), DomainError> {
    if demo {
        warn!("TIMETABLE_DEMO set, using built-in demo data");
        return Ok((Arc::new(MockApi::demo()), SessionMode::Demo));
    }
    let client = HttpApiClient::new(base_url, timeout)?;
    match client.health().await {
        Ok(status) => info!(url = %base_url, %status, "API reachable"),
        Err(e) => warn!(url = %base_url, error = %e, "API health check failed, staying live"),
    }
    Ok((Arc::new(client), SessionMode::Live))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_unreachable_server_keeps_live_client() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let (api, mode) = open_session(&format!("http://{}", addr), Duration::from_secs(2), false)
            .await
            .unwrap();
        assert_eq!(mode, SessionMode::Live);
        let err = api
            .get(&crate::ports::Endpoint::new("/api/v1/admin/groups"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Network(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_demo_only_when_requested() {
        let (_, mode) = open_session("http://127.0.0.1:9", Duration::from_secs(1), true)
            .await
            .unwrap();
        assert_eq!(mode, SessionMode::Demo);
    }
}
