//! Group timetable viewer: fetch a day or week for a group code.
//!
//! Reads the last selected group from the session store on boot and reloads
//! whenever the typeahead broadcasts a new selection.

use crate::domain::{
    CalendarCursor, DomainError, GroupSelected, SchedulePayload, ScheduleRange,
};
use crate::ports::{ApiPort, Endpoint, SessionStorePort};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, warn};

const SCHEDULE_GROUP_PATH: &str = "/api/v1/schedule/group";

/// What the viewer currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleView {
    /// No group chosen yet.
    NoGroup,
    Loaded {
        code: String,
        date: NaiveDate,
        range: ScheduleRange,
        payload: SchedulePayload,
    },
    Failed {
        code: String,
        reason: String,
    },
}

pub struct ScheduleViewer {
    api: Arc<dyn ApiPort>,
    store: Arc<dyn SessionStorePort>,
}

impl ScheduleViewer {
    pub fn new(api: Arc<dyn ApiPort>, store: Arc<dyn SessionStorePort>) -> Self {
        Self { api, store }
    }

    /// `GET /api/v1/schedule/group/:code?date=&range=`.
    pub async fn fetch(
        &self,
        code: &str,
        date: NaiveDate,
        range: ScheduleRange,
    ) -> Result<SchedulePayload, DomainError> {
        let endpoint = Endpoint::new(SCHEDULE_GROUP_PATH)
            .segment(code)
            .query("date", crate::domain::time::iso_date(date))
            .query("range", range);
        let value = self.api.get(&endpoint).await?;
        SchedulePayload::from_json(value)
    }

    /// Load `code` at the cursor. Never fails; failures become `ScheduleView::Failed`.
    pub async fn load(&self, code: &str, cursor: CalendarCursor) -> ScheduleView {
        match self.fetch(code, cursor.date, cursor.range).await {
            Ok(payload) => {
                info!(code, date = %cursor.date, range = %cursor.range, "schedule loaded");
                ScheduleView::Loaded {
                    code: code.to_string(),
                    date: cursor.date,
                    range: cursor.range,
                    payload,
                }
            }
            Err(e) => {
                warn!(code, error = %e, "schedule load failed");
                ScheduleView::Failed {
                    code: code.to_string(),
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Reload for the stored group, or `NoGroup` when nothing was ever selected.
    pub async fn reload(&self, cursor: CalendarCursor) -> ScheduleView {
        let code = match self.store.last_group().await {
            Ok(code) => code,
            Err(e) => {
                warn!(error = %e, "could not read last group");
                None
            }
        };
        match code {
            Some(code) => self.load(&code, cursor).await,
            None => ScheduleView::NoGroup,
        }
    }

    pub async fn on_group_selected(
        &self,
        selected: &GroupSelected,
        cursor: CalendarCursor,
    ) -> ScheduleView {
        self.load(&selected.code, cursor).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::http::{MockApi, MockMethod, MockReply};
    use crate::usecases::test_support::MemoryStore;
    use serde_json::json;

    fn cursor(range: ScheduleRange) -> CalendarCursor {
        CalendarCursor::new(NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(), range)
    }

    #[tokio::test]
    async fn test_reload_without_group_is_no_group() {
        let api = Arc::new(MockApi::new());
        let viewer = ScheduleViewer::new(api.clone(), Arc::new(MemoryStore::default()));
        assert_eq!(viewer.reload(cursor(ScheduleRange::Day)).await, ScheduleView::NoGroup);
        assert!(api.requests().is_empty());
    }

    #[tokio::test]
    async fn test_reload_uses_stored_group_and_range() {
        let api = Arc::new(MockApi::new().on(
            MockMethod::Get,
            "/api/v1/schedule/group/PI-101?date=2025-09-01&range=week",
            MockReply::Ok(json!({"days": []})),
        ));
        let viewer = ScheduleViewer::new(api.clone(), Arc::new(MemoryStore::with_group("PI-101")));
        let view = viewer.reload(cursor(ScheduleRange::Week)).await;
        match view {
            ScheduleView::Loaded { code, payload, .. } => {
                assert_eq!(code, "PI-101");
                assert!(matches!(payload, SchedulePayload::Week(_)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failed_load_is_reported_not_raised() {
        let api = Arc::new(MockApi::new().on(
            MockMethod::Get,
            "/api/v1/schedule/group/XX",
            MockReply::Fail {
                status: 404,
                payload: json!({"error": "group not found"}),
            },
        ));
        let viewer = ScheduleViewer::new(api, Arc::new(MemoryStore::default()));
        let view = viewer.load("XX", cursor(ScheduleRange::Day)).await;
        assert_eq!(
            view,
            ScheduleView::Failed {
                code: "XX".into(),
                reason: "HTTP 404".into()
            }
        );
    }
}
