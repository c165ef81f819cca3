//! Implements ApiPort over reqwest. JSON in, JSON out, CSRF header on every call.
//!
//! The CSRF token is fetched lazily from `/api/v1/csrf` on the first request and
//! memoized for the lifetime of the client. It is never refreshed, even when the
//! server later rejects it.

use crate::domain::DomainError;
use crate::ports::{ApiPort, Endpoint};
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, Url};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

const CSRF_PATH: &str = "/api/v1/csrf";
const CSRF_HEADER: &str = "X-CSRF-Token";
const HEALTH_PATH: &str = "/health";

#[derive(Deserialize)]
struct CsrfResponse {
    csrf: String,
}

/// HTTP session against the schedule API. Keeps cookies and the CSRF token.
pub struct HttpApiClient {
    client: Client,
    base_url: Url,
    csrf: OnceCell<String>,
}

impl HttpApiClient {
    /// Create a client for `base_url` (e.g. "http://127.0.0.1:5000").
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DomainError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| DomainError::Config(format!("invalid base_url {}: {}", base_url, e)))?;
        let client = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::Network(format!("build http client: {}", e)))?;
        Ok(Self {
            client,
            base_url,
            csrf: OnceCell::new(),
        })
    }

    /// Liveness check. Does not touch the CSRF token.
    pub async fn health(&self) -> Result<Value, DomainError> {
        let url = self.url(&Endpoint::new(HEALTH_PATH))?;
        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DomainError::Network(format!("GET {}: {}", HEALTH_PATH, e)))?;
        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| DomainError::Network(format!("read {}: {}", HEALTH_PATH, e)))?;
        finish(status.as_u16(), status.is_success(), &text)
    }

    /// Appends the endpoint below the base path, so a prefix like `/timetable` is kept.
    fn url(&self, endpoint: &Endpoint) -> Result<Url, DomainError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DomainError::Config("base_url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(endpoint.path().split('/').filter(|s| !s.is_empty()))
            .extend(endpoint.segments());
        if !endpoint.query_pairs().is_empty() {
            url.query_pairs_mut().extend_pairs(endpoint.query_pairs());
        }
        Ok(url)
    }

    async fn csrf_token(&self) -> Result<&str, DomainError> {
        let token = self
            .csrf
            .get_or_try_init(|| async {
                let url = self.url(&Endpoint::new(CSRF_PATH))?;
                let res = self
                    .client
                    .get(url)
                    .header(ACCEPT, "application/json")
                    .send()
                    .await
                    .map_err(|e| DomainError::Network(format!("GET {}: {}", CSRF_PATH, e)))?;
                let body: CsrfResponse = res
                    .json()
                    .await
                    .map_err(|e| DomainError::Decode(format!("csrf response: {}", e)))?;
                info!("obtained CSRF token for this session");
                Ok::<_, DomainError>(body.csrf)
            })
            .await?;
        Ok(token.as_str())
    }

    async fn request(
        &self,
        method: Method,
        endpoint: &Endpoint,
        body: Option<&Value>,
    ) -> Result<Value, DomainError> {
        let token = self.csrf_token().await?.to_string();
        let url = self.url(endpoint)?;
        debug!(method = %method, endpoint = %endpoint, "api request");

        let mut req = self
            .client
            .request(method.clone(), url)
            .header(ACCEPT, "application/json")
            .header(CSRF_HEADER, token);
        if let Some(b) = body {
            req = req.json(b);
        }

        let res = req
            .send()
            .await
            .map_err(|e| DomainError::Network(format!("{} {}: {}", method, endpoint, e)))?;
        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| DomainError::Network(format!("read {} {}: {}", method, endpoint, e)))?;

        if !status.is_success() {
            warn!(method = %method, endpoint = %endpoint, status = %status, "API returned error");
        }
        finish(status.as_u16(), status.is_success(), &text)
    }
}

/// Empty body is `{}`. Non-2xx becomes `Api` with the parsed payload (raw text if not JSON).
fn finish(status: u16, success: bool, text: &str) -> Result<Value, DomainError> {
    if success {
        return parse_body(text);
    }
    let payload = parse_body(text).unwrap_or_else(|_| Value::String(text.to_string()));
    Err(DomainError::Api { status, payload })
}

fn parse_body(text: &str) -> Result<Value, DomainError> {
    if text.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(text).map_err(|e| DomainError::Decode(format!("response body: {}", e)))
}

#[async_trait::async_trait]
impl ApiPort for HttpApiClient {
    async fn get(&self, endpoint: &Endpoint) -> Result<Value, DomainError> {
        self.request(Method::GET, endpoint, None).await
    }

    async fn post(&self, endpoint: &Endpoint, body: &Value) -> Result<Value, DomainError> {
        self.request(Method::POST, endpoint, Some(body)).await
    }

    async fn put(&self, endpoint: &Endpoint, body: &Value) -> Result<Value, DomainError> {
        self.request(Method::PUT, endpoint, Some(body)).await
    }

    async fn delete(&self, endpoint: &Endpoint) -> Result<Value, DomainError> {
        self.request(Method::DELETE, endpoint, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    #[test]
    fn test_empty_body_is_empty_object() {
        assert_eq!(finish(204, true, "").unwrap(), json!({}));
        assert_eq!(finish(200, true, "  \n").unwrap(), json!({}));
    }

    #[test]
    fn test_error_status_carries_payload() {
        let err = finish(409, false, r#"{"errors":[{"code":"ROOM_BUSY"}]}"#).unwrap_err();
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.error_codes(), vec!["ROOM_BUSY"]);
    }

    #[test]
    fn test_error_status_with_html_body() {
        let err = finish(502, false, "<html>bad gateway</html>").unwrap_err();
        match err {
            DomainError::Api { status, payload } => {
                assert_eq!(status, 502);
                assert_eq!(payload, Value::String("<html>bad gateway</html>".into()));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_success_with_invalid_json_is_decode_error() {
        assert!(matches!(finish(200, true, "{oops"), Err(DomainError::Decode(_))));
    }

    #[test]
    fn test_url_encodes_segments_and_query() {
        let client = HttpApiClient::new("http://localhost:5000", Duration::from_secs(1)).unwrap();
        let url = client
            .url(
                &Endpoint::new("/api/v1/schedule/group")
                    .segment("ПИ/101")
                    .query("date", "2025-09-01")
                    .query("range", "week"),
            )
            .unwrap();
        assert_eq!(url.host_str(), Some("localhost"));
        assert!(url.path().starts_with("/api/v1/schedule/group/"));
        assert!(url.path().ends_with("%2F101"));
        assert_eq!(url.query(), Some("date=2025-09-01&range=week"));
    }

    #[test]
    fn test_base_path_prefix_is_kept() {
        for base in ["https://host.example/timetable", "https://host.example/timetable/"] {
            let client = HttpApiClient::new(base, Duration::from_secs(1)).unwrap();
            let url = client.url(&Endpoint::new("/api/v1/csrf")).unwrap();
            assert_eq!(url.as_str(), "https://host.example/timetable/api/v1/csrf");
        }
        let client = HttpApiClient::new("http://localhost:5000", Duration::from_secs(1)).unwrap();
        let url = client.url(&Endpoint::new("/health")).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/health");
    }

    #[derive(Debug, Clone)]
    struct SeenRequest {
        path: String,
        csrf: Option<String>,
    }

    /// Minimal HTTP/1.1 server: answers `/csrf` with a token and everything else with `{"ok":true}`.
    async fn serve_stub() -> (String, Arc<Mutex<Vec<SeenRequest>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let log = Arc::clone(&log);
                tokio::spawn(async move {
                    let (read, mut write) = socket.into_split();
                    let mut reader = BufReader::new(read);
                    loop {
                        let mut request_line = String::new();
                        if reader.read_line(&mut request_line).await.unwrap_or(0) == 0 {
                            return;
                        }
                        let path = request_line.split_whitespace().nth(1).unwrap_or("").to_string();
                        let mut csrf = None;
                        let mut len = 0usize;
                        loop {
                            let mut line = String::new();
                            if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
                                return;
                            }
                            let line = line.trim_end();
                            if line.is_empty() {
                                break;
                            }
                            if let Some((name, value)) = line.split_once(':') {
                                match name.trim().to_ascii_lowercase().as_str() {
                                    "x-csrf-token" => csrf = Some(value.trim().to_string()),
                                    "content-length" => len = value.trim().parse().unwrap_or(0),
                                    _ => {}
                                }
                            }
                        }
                        let mut body = vec![0u8; len];
                        if len > 0 && reader.read_exact(&mut body).await.is_err() {
                            return;
                        }
                        let reply = if path.ends_with(CSRF_PATH) {
                            r#"{"csrf":"tok-1"}"#
                        } else {
                            r#"{"ok":true}"#
                        };
                        log.lock().unwrap().push(SeenRequest { path, csrf });
                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
                            reply.len(),
                            reply
                        );
                        if write.write_all(response.as_bytes()).await.is_err() {
                            return;
                        }
                    }
                });
            }
        });
        (format!("http://{}", addr), seen)
    }

    #[tokio::test]
    async fn test_csrf_fetched_once_and_sent_on_every_call() {
        let (base, seen) = serve_stub().await;
        let client = HttpApiClient::new(&format!("{}/timetable", base), Duration::from_secs(5)).unwrap();

        client.health().await.unwrap();
        assert!(seen.lock().unwrap().iter().all(|r| !r.path.ends_with(CSRF_PATH)));

        client
            .get(&Endpoint::new("/api/v1/suggest").query("q", "пи"))
            .await
            .unwrap();
        client
            .post(&Endpoint::new("/api/v1/admin/groups"), &json!({"name": "ПИ-303"}))
            .await
            .unwrap();

        let seen = seen.lock().unwrap().clone();
        let paths: Vec<&str> = seen.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths[0], "/timetable/health");
        assert_eq!(paths[1], "/timetable/api/v1/csrf");
        assert!(paths[2].starts_with("/timetable/api/v1/suggest?q="));
        assert_eq!(paths[3], "/timetable/api/v1/admin/groups");
        assert_eq!(paths.iter().filter(|p| p.ends_with(CSRF_PATH)).count(), 1);
        assert_eq!(seen[0].csrf, None);
        assert_eq!(seen[2].csrf.as_deref(), Some("tok-1"));
        assert_eq!(seen[3].csrf.as_deref(), Some("tok-1"));
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        assert!(matches!(
            HttpApiClient::new("not a url", Duration::from_secs(1)),
            Err(DomainError::Config(_))
        ));
    }
}
