//! In-memory ApiPort for offline demo runs and tests.
//!
//! Routes match the endpoint's display form (`path?query`) first, then the
//! bare path. Every call is recorded so tests can assert on traffic.

use crate::domain::DomainError;
use crate::ports::{ApiPort, Endpoint};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockMethod {
    Get,
    Post,
    Put,
    Delete,
}

/// Canned response.
#[derive(Debug, Clone)]
pub enum MockReply {
    Ok(Value),
    Fail { status: u16, payload: Value },
    Offline,
    Delayed(Duration, Box<MockReply>),
}

impl MockReply {
    pub fn delayed(ms: u64, reply: MockReply) -> Self {
        MockReply::Delayed(Duration::from_millis(ms), Box::new(reply))
    }
}

type Handler = Box<dyn Fn(&Endpoint) -> MockReply + Send + Sync>;

enum Responder {
    /// Replies are consumed in order; the last one repeats.
    Queue(VecDeque<MockReply>),
    Handler(Handler),
}

struct Route {
    method: MockMethod,
    pattern: String,
    responder: Responder,
}

/// A request as seen by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: MockMethod,
    pub endpoint: String,
    pub body: Option<Value>,
}

#[derive(Default)]
pub struct MockApi {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for `method pattern`. Further calls append to the queue.
    pub fn on(self, method: MockMethod, pattern: &str, reply: MockReply) -> Self {
        {
            let mut routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());
            let existing = routes.iter().position(|r| {
                r.method == method && r.pattern == pattern && matches!(r.responder, Responder::Queue(_))
            });
            match existing {
                Some(idx) => {
                    if let Responder::Queue(q) = &mut routes[idx].responder {
                        q.push_back(reply);
                    }
                }
                None => routes.push(Route {
                    method,
                    pattern: pattern.to_string(),
                    responder: Responder::Queue(VecDeque::from([reply])),
                }),
            }
        }
        self
    }

    /// Answer `method pattern` with a function of the endpoint.
    pub fn on_fn<F>(self, method: MockMethod, pattern: &str, handler: F) -> Self
    where
        F: Fn(&Endpoint) -> MockReply + Send + Sync + 'static,
    {
        self.routes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Route {
                method,
                pattern: pattern.to_string(),
                responder: Responder::Handler(Box::new(handler)),
            });
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of recorded calls with `method` whose endpoint starts with `prefix`.
    pub fn count(&self, method: MockMethod, prefix: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.endpoint.starts_with(prefix))
            .count()
    }

    fn reply_for(&self, method: MockMethod, endpoint: &Endpoint) -> MockReply {
        let display = endpoint.to_string();
        let path = endpoint.full_path();
        let mut routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());
        let idx = routes
            .iter()
            .position(|r| r.method == method && r.pattern == display)
            .or_else(|| {
                routes
                    .iter()
                    .position(|r| r.method == method && r.pattern == path)
            });
        let Some(idx) = idx else {
            return MockReply::Fail {
                status: 404,
                payload: json!({"error": "not found"}),
            };
        };
        match &mut routes[idx].responder {
            Responder::Queue(q) if q.len() > 1 => q.pop_front().unwrap_or(MockReply::Offline),
            Responder::Queue(q) => q.front().cloned().unwrap_or(MockReply::Offline),
            Responder::Handler(h) => h(endpoint),
        }
    }

    async fn respond(
        &self,
        method: MockMethod,
        endpoint: &Endpoint,
        body: Option<&Value>,
    ) -> Result<Value, DomainError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedRequest {
                method,
                endpoint: endpoint.to_string(),
                body: body.cloned(),
            });
        let mut reply = self.reply_for(method, endpoint);
        loop {
            match reply {
                MockReply::Delayed(d, inner) => {
                    tokio::time::sleep(d).await;
                    reply = *inner;
                }
                MockReply::Ok(v) => return Ok(v),
                MockReply::Fail { status, payload } => {
                    return Err(DomainError::Api { status, payload });
                }
                MockReply::Offline => {
                    return Err(DomainError::Network(format!("{} unreachable", endpoint)));
                }
            }
        }
    }

    /// Offline demo data: a couple of groups, teachers and subjects, and a fixed day.
    pub fn demo() -> Self {
        info!("[MOCK] using built-in demo data instead of a live API");
        let suggest = vec![
            json!({"type": "group", "id": 1, "label": "ПИ-101", "code": "PI-101"}),
            json!({"type": "group", "id": 2, "label": "ИС-202", "code": "IS-202"}),
            json!({"type": "teacher", "id": 101, "label": "Иванов И.И."}),
            json!({"type": "teacher", "id": 102, "label": "Петров П.П."}),
            json!({"type": "subject", "id": 201, "label": "Программирование"}),
            json!({"type": "subject", "id": 202, "label": "Высшая математика"}),
        ];
        let day = json!({"lessons": [
            {"time_slot": {"start_time": "08:30", "end_time": "10:00", "order_no": 1},
             "subject": {"name": "Программирование"}, "teacher": {"full_name": "Иванов И.И."},
             "room": {"number": "204"}, "lesson_type": {"name": "Лекция"}},
            {"is_break": true, "from": "10:00", "to": "10:10"},
            {"time_slot": {"start_time": "10:10", "end_time": "11:40", "order_no": 2},
             "subject": {"name": "Высшая математика"}, "teacher": {"full_name": "Петров П.П."},
             "lesson_type": {"name": "Практика"}, "is_remote": true,
             "homework": {"text": "№ 14–18"}}
        ]});

        let mut api = MockApi::new()
            .on_fn(MockMethod::Get, "/api/v1/suggest", move |endpoint| {
                let q = endpoint
                    .query_pairs()
                    .iter()
                    .find(|(k, _)| k == "q")
                    .map(|(_, v)| v.to_lowercase())
                    .unwrap_or_default();
                let items: Vec<Value> = suggest
                    .iter()
                    .filter(|i| {
                        let label = i["label"].as_str().unwrap_or_default().to_lowercase();
                        let code = i["code"].as_str().unwrap_or_default().to_lowercase();
                        label.contains(&q) || code.contains(&q)
                    })
                    .cloned()
                    .collect();
                MockReply::delayed(80, MockReply::Ok(json!({ "items": items })))
            })
            .on_fn(MockMethod::Get, "/api/v1/schedule/group/PI-101", move |endpoint| {
                let week = endpoint
                    .query_pairs()
                    .iter()
                    .any(|(k, v)| k == "range" && v == "week");
                if week {
                    let date = endpoint
                        .query_pairs()
                        .iter()
                        .find(|(k, _)| k == "date")
                        .map(|(_, v)| v.clone())
                        .unwrap_or_default();
                    MockReply::Ok(json!({"days": [
                        {"date": date, "lessons": day["lessons"].clone()}
                    ]}))
                } else {
                    MockReply::Ok(day.clone())
                }
            })
            .on(
                MockMethod::Get,
                "/api/v1/schedule/group/IS-202",
                MockReply::Ok(json!({"lessons": []})),
            )
            .on(
                MockMethod::Get,
                "/api/v1/admin/dashboard/summary",
                MockReply::Ok(json!({
                    "counters": {"groups": 2, "teachers": 2, "rooms": 1, "subjects": 2},
                    "week": [],
                    "conflicts": []
                })),
            );
        for slug in [
            "groups",
            "teachers",
            "rooms",
            "subjects",
            "lesson-types",
            "time-slots",
            "buildings",
            "room-types",
        ] {
            api = api.on(
                MockMethod::Get,
                &format!("/api/v1/admin/{}", slug),
                MockReply::Ok(json!({"items": []})),
            );
        }
        api
    }
}

#[async_trait::async_trait]
impl ApiPort for MockApi {
    async fn get(&self, endpoint: &Endpoint) -> Result<Value, DomainError> {
        self.respond(MockMethod::Get, endpoint, None).await
    }

    async fn post(&self, endpoint: &Endpoint, body: &Value) -> Result<Value, DomainError> {
        self.respond(MockMethod::Post, endpoint, Some(body)).await
    }

    async fn put(&self, endpoint: &Endpoint, body: &Value) -> Result<Value, DomainError> {
        self.respond(MockMethod::Put, endpoint, Some(body)).await
    }

    async fn delete(&self, endpoint: &Endpoint) -> Result<Value, DomainError> {
        self.respond(MockMethod::Delete, endpoint, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queue_repeats_last_reply() {
        let api = MockApi::new()
            .on(MockMethod::Get, "/a", MockReply::Ok(json!(1)))
            .on(MockMethod::Get, "/a", MockReply::Ok(json!(2)));
        let e = Endpoint::new("/a");
        assert_eq!(api.get(&e).await.unwrap(), json!(1));
        assert_eq!(api.get(&e).await.unwrap(), json!(2));
        assert_eq!(api.get(&e).await.unwrap(), json!(2));
        assert_eq!(api.count(MockMethod::Get, "/a"), 3);
    }

    #[tokio::test]
    async fn test_unmatched_route_is_404() {
        let api = MockApi::new();
        let err = api.delete(&Endpoint::new("/x")).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_demo_suggest_filters_by_query() {
        let api = MockApi::demo();
        let v = api
            .get(&Endpoint::new("/api/v1/suggest").query("q", "пи").query("limit", 10))
            .await
            .unwrap();
        let items = v["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["code"], "PI-101");
    }
}
