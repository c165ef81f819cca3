//! Search-as-you-type over `/api/v1/suggest`.
//!
//! Two states: closed, or open with candidates and a highlighted index.
//! Every input bumps a generation counter and aborts the previous pending task
//! (debounce sleep plus in-flight request); a response is applied only when its
//! generation is still the latest, so a slow early query never overwrites a
//! newer one.

use crate::domain::entities::SuggestResponse;
use crate::domain::{DomainError, GroupSelected, SuggestItem, SuggestKind};
use crate::ports::{decode, ApiPort, Endpoint, Notice, NoticePort, SessionStorePort};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const SUGGEST_PATH: &str = "/api/v1/suggest";

/// Debounce between the last keystroke and the suggestion request.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

pub const DEFAULT_LIMIT: u32 = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum TypeaheadState {
    Closed,
    Open {
        items: Vec<SuggestItem>,
        highlighted: usize,
    },
}

/// Point-in-time copy of the typeahead for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeaheadSnapshot {
    pub input: String,
    /// Query the open list was fetched for.
    pub query: String,
    pub state: TypeaheadState,
}

struct Inner {
    input: String,
    query: String,
    state: TypeaheadState,
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

impl Inner {
    /// Invalidate whatever is pending.
    fn cancel(&mut self) -> u64 {
        self.generation += 1;
        if let Some(task) = self.pending.take() {
            task.abort();
        }
        self.generation
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Typeahead {
    api: Arc<dyn ApiPort>,
    store: Arc<dyn SessionStorePort>,
    selections: broadcast::Sender<GroupSelected>,
    debounce: Duration,
    limit: u32,
    kind: Option<SuggestKind>,
    notices: Option<Arc<dyn NoticePort>>,
    inner: Arc<Mutex<Inner>>,
}

impl Typeahead {
    pub fn new(api: Arc<dyn ApiPort>, store: Arc<dyn SessionStorePort>, debounce: Duration) -> Self {
        let (selections, _) = broadcast::channel(16);
        Self {
            api,
            store,
            selections,
            debounce,
            limit: DEFAULT_LIMIT,
            kind: None,
            notices: None,
            inner: Arc::new(Mutex::new(Inner {
                input: String::new(),
                query: String::new(),
                state: TypeaheadState::Closed,
                generation: 0,
                pending: None,
            })),
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Restrict suggestions to one kind (`type=` query parameter).
    pub fn with_kind(mut self, kind: Option<SuggestKind>) -> Self {
        self.kind = kind;
        self
    }

    /// Where a failed save of the last group is reported.
    pub fn with_notices(mut self, notices: Arc<dyn NoticePort>) -> Self {
        self.notices = Some(notices);
        self
    }

    /// Receives a `GroupSelected` for every activated group candidate.
    pub fn subscribe(&self) -> broadcast::Receiver<GroupSelected> {
        self.selections.subscribe()
    }

    pub fn snapshot(&self) -> TypeaheadSnapshot {
        let inner = lock(&self.inner);
        TypeaheadSnapshot {
            input: inner.input.clone(),
            query: inner.query.clone(),
            state: inner.state.clone(),
        }
    }

    /// Text changed. Blank input closes at once; anything else schedules a debounced lookup.
    /// Must be called from within a tokio runtime.
    pub fn input(&self, text: &str) {
        let mut inner = lock(&self.inner);
        inner.input = text.to_string();
        let generation = inner.cancel();
        let query = text.trim().to_string();
        if query.is_empty() {
            inner.state = TypeaheadState::Closed;
            return;
        }

        let api = Arc::clone(&self.api);
        let shared = Arc::clone(&self.inner);
        let debounce = self.debounce;
        let limit = self.limit;
        let kind = self.kind;
        inner.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let result = fetch_suggestions(api.as_ref(), &query, limit, kind).await;

            let mut inner = lock(&shared);
            if inner.generation != generation {
                debug!(query = %query, generation, "dropping stale suggestions");
                return;
            }
            inner.pending = None;
            inner.state = match result {
                Ok(items) if !items.is_empty() => TypeaheadState::Open {
                    items,
                    highlighted: 0,
                },
                Ok(_) => TypeaheadState::Closed,
                Err(e) => {
                    warn!(query = %query, error = %e, "suggest failed");
                    TypeaheadState::Closed
                }
            };
            inner.query = query;
        }));
    }

    /// Wait until no lookup is pending.
    pub async fn settle(&self) {
        loop {
            let task = lock(&self.inner).pending.take();
            match task {
                Some(task) => {
                    let _ = task.await;
                }
                None => break,
            }
        }
    }

    /// Click outside the list and input.
    pub fn dismiss(&self) {
        self.close();
    }

    pub fn escape(&self) {
        self.close();
    }

    fn close(&self) {
        let mut inner = lock(&self.inner);
        inner.cancel();
        inner.state = TypeaheadState::Closed;
    }

    pub fn move_down(&self) {
        self.move_highlight(1);
    }

    pub fn move_up(&self) {
        self.move_highlight(-1);
    }

    fn move_highlight(&self, delta: isize) {
        let mut inner = lock(&self.inner);
        if let TypeaheadState::Open { items, highlighted } = &mut inner.state {
            let last = items.len().saturating_sub(1) as isize;
            *highlighted = (*highlighted as isize + delta).clamp(0, last) as usize;
        }
    }

    /// Enter: activate the highlighted candidate, if the list is open.
    pub async fn enter(&self) -> Result<Option<SuggestItem>, DomainError> {
        let index = match &lock(&self.inner).state {
            TypeaheadState::Open { highlighted, .. } => *highlighted,
            TypeaheadState::Closed => return Ok(None),
        };
        self.activate(index).await
    }

    /// Click on candidate `index`. Sets the input to its label and closes the list;
    /// a group candidate is persisted as the last group and broadcast. The broadcast
    /// happens even when the store cannot be written.
    pub async fn activate(&self, index: usize) -> Result<Option<SuggestItem>, DomainError> {
        let item = {
            let mut inner = lock(&self.inner);
            let item = match &inner.state {
                TypeaheadState::Open { items, .. } => items.get(index).cloned(),
                TypeaheadState::Closed => None,
            };
            let Some(item) = item else {
                return Ok(None);
            };
            inner.cancel();
            inner.input = item.label.clone();
            inner.state = TypeaheadState::Closed;
            item
        };

        if item.kind == SuggestKind::Group {
            if let Some(code) = item.code.as_deref().filter(|c| !c.is_empty()) {
                if let Err(err) = self.store.set_last_group(code).await {
                    warn!(code, error = %err, "could not persist last group");
                    if let Some(notices) = &self.notices {
                        notices.notify(Notice::error(format!(
                            "Не удалось сохранить группу: {}",
                            err
                        )));
                    }
                }
                info!(code, "group selected");
                // No subscribers is fine.
                let _ = self.selections.send(GroupSelected {
                    code: code.to_string(),
                });
            }
        }
        Ok(Some(item))
    }
}

async fn fetch_suggestions(
    api: &dyn ApiPort,
    query: &str,
    limit: u32,
    kind: Option<SuggestKind>,
) -> Result<Vec<SuggestItem>, DomainError> {
    let mut endpoint = Endpoint::new(SUGGEST_PATH)
        .query("q", query)
        .query("limit", limit);
    if let Some(kind) = kind {
        endpoint = endpoint.query("type", kind.as_str());
    }
    let response: SuggestResponse = decode(api.get(&endpoint).await?, "suggest response")?;
    Ok(response.items)
}

/// Splits `text` into (segment, matched) runs for case-insensitive occurrences of `query`.
pub fn highlight_matches(text: &str, query: &str) -> Vec<(String, bool)> {
    let needle: Vec<char> = query.trim().chars().flat_map(char::to_lowercase).collect();
    let chars: Vec<char> = text.chars().collect();
    if needle.is_empty() {
        return vec![(text.to_string(), false)];
    }

    let matches_at = |i: usize| {
        let window = chars.get(i..i + needle.len());
        window.is_some_and(|w| {
            w.iter()
                .flat_map(|c| c.to_lowercase())
                .eq(needle.iter().copied())
        })
    };

    let mut out: Vec<(String, bool)> = Vec::new();
    let mut plain = String::new();
    let mut i = 0;
    while i < chars.len() {
        if matches_at(i) {
            if !plain.is_empty() {
                out.push((std::mem::take(&mut plain), false));
            }
            out.push((chars[i..i + needle.len()].iter().collect(), true));
            i += needle.len();
        } else {
            plain.push(chars[i]);
            i += 1;
        }
    }
    if !plain.is_empty() {
        out.push((plain, false));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::http::{MockApi, MockMethod, MockReply};
    use crate::domain::time::CalendarCursor;
    use crate::domain::ScheduleRange;
    use crate::usecases::schedule_viewer::{ScheduleView, ScheduleViewer};
    use crate::usecases::test_support::{FailingStore, MemoryStore, RecordingNotices};
    use serde_json::json;

    fn query_of(endpoint: &Endpoint) -> String {
        endpoint
            .query_pairs()
            .iter()
            .find(|(k, _)| k == "q")
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    }

    fn labels(state: &TypeaheadState) -> Vec<String> {
        match state {
            TypeaheadState::Open { items, .. } => items.iter().map(|i| i.label.clone()).collect(),
            TypeaheadState::Closed => Vec::new(),
        }
    }

    fn three_groups() -> MockReply {
        MockReply::Ok(json!({"items": [
            {"type": "group", "id": 1, "label": "ПИ-101", "code": "PI-101"},
            {"type": "group", "id": 2, "label": "ПИ-102", "code": "PI-102"},
            {"type": "teacher", "id": 7, "label": "Пименов А.А."}
        ]}))
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_delays_request() {
        let api = Arc::new(MockApi::new().on(MockMethod::Get, SUGGEST_PATH, three_groups()));
        let ta = Typeahead::new(api.clone(), Arc::new(MemoryStore::default()), DEFAULT_DEBOUNCE);

        ta.input("П");
        ta.input("ПИ");
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(api.count(MockMethod::Get, SUGGEST_PATH), 0);
        assert_eq!(ta.snapshot().state, TypeaheadState::Closed);

        ta.settle().await;
        assert_eq!(api.count(MockMethod::Get, SUGGEST_PATH), 1);
        assert_eq!(api.requests()[0].endpoint, "/api/v1/suggest?q=ПИ&limit=10");
        assert_eq!(labels(&ta.snapshot().state).len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_stale_response_never_overwrites_newer_query() {
        let api = Arc::new(MockApi::new().on_fn(MockMethod::Get, SUGGEST_PATH, |endpoint| {
            if query_of(endpoint) == "ПИ" {
                MockReply::delayed(
                    2_000,
                    MockReply::Ok(json!({"items": [{"type": "group", "label": "ПИ-старый", "code": "OLD"}]})),
                )
            } else {
                MockReply::delayed(
                    10,
                    MockReply::Ok(json!({"items": [{"type": "group", "label": "ПИ-1", "code": "PI-1"}]})),
                )
            }
        }));
        let ta = Typeahead::new(api.clone(), Arc::new(MemoryStore::default()), DEFAULT_DEBOUNCE);

        ta.input("ПИ");
        // First request is in flight when the second query arrives.
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(api.count(MockMethod::Get, SUGGEST_PATH), 1);
        ta.input("ПИ-1");
        ta.settle().await;
        tokio::time::sleep(Duration::from_secs(5)).await;

        let snap = ta.snapshot();
        assert_eq!(snap.query, "ПИ-1");
        assert_eq!(labels(&snap.state), vec!["ПИ-1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_input_closes_and_cancels() {
        let api = Arc::new(MockApi::new().on(MockMethod::Get, SUGGEST_PATH, three_groups()));
        let ta = Typeahead::new(api.clone(), Arc::new(MemoryStore::default()), DEFAULT_DEBOUNCE);

        ta.input("ПИ");
        ta.settle().await;
        assert!(matches!(ta.snapshot().state, TypeaheadState::Open { .. }));

        ta.input("ПИ-");
        ta.input("   ");
        assert_eq!(ta.snapshot().state, TypeaheadState::Closed);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(api.count(MockMethod::Get, SUGGEST_PATH), 1);
        assert_eq!(ta.snapshot().state, TypeaheadState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_or_failed_suggest_stays_closed() {
        let api = Arc::new(
            MockApi::new()
                .on(MockMethod::Get, SUGGEST_PATH, MockReply::Ok(json!({"items": []})))
                .on(MockMethod::Get, SUGGEST_PATH, MockReply::Offline),
        );
        let ta = Typeahead::new(api, Arc::new(MemoryStore::default()), DEFAULT_DEBOUNCE);
        ta.input("zz");
        ta.settle().await;
        assert_eq!(ta.snapshot().state, TypeaheadState::Closed);
        ta.input("zzz");
        ta.settle().await;
        assert_eq!(ta.snapshot().state, TypeaheadState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keyboard_highlight_is_clamped() {
        let api = Arc::new(MockApi::new().on(MockMethod::Get, SUGGEST_PATH, three_groups()));
        let ta = Typeahead::new(api, Arc::new(MemoryStore::default()), DEFAULT_DEBOUNCE);
        ta.input("пи");
        ta.settle().await;

        for _ in 0..5 {
            ta.move_down();
        }
        assert!(matches!(ta.snapshot().state, TypeaheadState::Open { highlighted: 2, .. }));
        for _ in 0..5 {
            ta.move_up();
        }
        assert!(matches!(ta.snapshot().state, TypeaheadState::Open { highlighted: 0, .. }));

        ta.move_down();
        let chosen = ta.enter().await.unwrap().unwrap();
        assert_eq!(chosen.label, "ПИ-102");
        let snap = ta.snapshot();
        assert_eq!(snap.input, "ПИ-102");
        assert_eq!(snap.state, TypeaheadState::Closed);
        assert_eq!(ta.enter().await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_escape_and_dismiss_close() {
        let api = Arc::new(MockApi::new().on(MockMethod::Get, SUGGEST_PATH, three_groups()));
        let ta = Typeahead::new(api, Arc::new(MemoryStore::default()), DEFAULT_DEBOUNCE);
        ta.input("пи");
        ta.settle().await;
        ta.escape();
        assert_eq!(ta.snapshot().state, TypeaheadState::Closed);

        ta.input("пи");
        ta.settle().await;
        ta.dismiss();
        assert_eq!(ta.snapshot().state, TypeaheadState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_group_selection_persists_and_triggers_reload() {
        let api = Arc::new(
            MockApi::new()
                .on(MockMethod::Get, SUGGEST_PATH, three_groups())
                .on(
                    MockMethod::Get,
                    "/api/v1/schedule/group/PI-101",
                    MockReply::Ok(json!({"lessons": []})),
                ),
        );
        let store = Arc::new(MemoryStore::default());
        let ta = Typeahead::new(api.clone(), store.clone(), DEFAULT_DEBOUNCE);
        let viewer = ScheduleViewer::new(api.clone(), store.clone());
        let mut selections = ta.subscribe();

        ta.input("ПИ");
        ta.settle().await;
        ta.activate(0).await.unwrap();

        assert_eq!(store.last_group().await.unwrap().as_deref(), Some("PI-101"));
        let selected = selections.recv().await.unwrap();
        assert_eq!(selected.code, "PI-101");

        let cursor = CalendarCursor::new(
            chrono::NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            ScheduleRange::Day,
        );
        let view = viewer.on_group_selected(&selected, cursor).await;
        assert!(matches!(view, ScheduleView::Loaded { ref code, .. } if code == "PI-101"));
        assert_eq!(
            api.count(MockMethod::Get, "/api/v1/schedule/group/PI-101?date=2025-09-01&range=day"),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unwritable_store_still_broadcasts_selection() {
        let api = Arc::new(MockApi::new().on(MockMethod::Get, SUGGEST_PATH, three_groups()));
        let notices = Arc::new(RecordingNotices::default());
        let ta = Typeahead::new(api, Arc::new(FailingStore), DEFAULT_DEBOUNCE)
            .with_notices(notices.clone());
        let mut selections = ta.subscribe();

        ta.input("ПИ");
        ta.settle().await;
        let item = ta.activate(1).await.unwrap().unwrap();

        assert_eq!(item.code.as_deref(), Some("PI-102"));
        assert_eq!(selections.recv().await.unwrap().code, "PI-102");
        assert_eq!(ta.snapshot().input, "ПИ-102");
        let errors = notices.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Не удалось сохранить группу"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_group_selection_is_not_persisted() {
        let api = Arc::new(MockApi::new().on(MockMethod::Get, SUGGEST_PATH, three_groups()));
        let store = Arc::new(MemoryStore::default());
        let ta = Typeahead::new(api, store.clone(), DEFAULT_DEBOUNCE);
        let mut selections = ta.subscribe();

        ta.input("пи");
        ta.settle().await;
        let item = ta.activate(2).await.unwrap().unwrap();
        assert_eq!(item.kind, SuggestKind::Teacher);
        assert_eq!(store.last_group().await.unwrap(), None);
        assert!(selections.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_kind_and_limit_in_query() {
        let api = Arc::new(MockApi::new().on(MockMethod::Get, SUGGEST_PATH, three_groups()));
        let ta = Typeahead::new(api.clone(), Arc::new(MemoryStore::default()), DEFAULT_DEBOUNCE)
            .with_limit(5)
            .with_kind(Some(SuggestKind::Group));
        ta.input("ИТ");
        ta.settle().await;
        assert_eq!(api.requests()[0].endpoint, "/api/v1/suggest?q=ИТ&limit=5&type=group");
    }

    #[test]
    fn test_highlight_matches_case_insensitive() {
        assert_eq!(
            highlight_matches("ПИ-101 пи", "пи"),
            vec![
                ("ПИ".to_string(), true),
                ("-101 ".to_string(), false),
                ("пи".to_string(), true)
            ]
        );
        assert_eq!(highlight_matches("abc", ""), vec![("abc".to_string(), false)]);
    }
}
