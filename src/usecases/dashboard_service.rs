//! Admin dashboard summary.

use crate::domain::{DashboardSummary, DomainError};
use crate::ports::{ApiPort, Endpoint, Notice, NoticePort, decode};
use std::sync::Arc;
use tracing::{info, warn};

const SUMMARY_PATH: &str = "/api/v1/admin/dashboard/summary";

pub struct DashboardService {
    api: Arc<dyn ApiPort>,
    notices: Arc<dyn NoticePort>,
}

impl DashboardService {
    pub fn new(api: Arc<dyn ApiPort>, notices: Arc<dyn NoticePort>) -> Self {
        Self { api, notices }
    }

    pub async fn fetch(&self) -> Result<DashboardSummary, DomainError> {
        let value = self.api.get(&Endpoint::new(SUMMARY_PATH)).await?;
        decode(value, "dashboard summary")
    }

    /// Summary or `None` after raising `Ошибка дашборда`.
    pub async fn summary(&self) -> Option<DashboardSummary> {
        match self.fetch().await {
            Ok(summary) => {
                info!(
                    week = summary.week.len(),
                    conflicts = summary.conflicts.len(),
                    "dashboard loaded"
                );
                Some(summary)
            }
            Err(e) => {
                warn!(error = %e, "dashboard load failed");
                self.notices.notify(Notice::error("Ошибка дашборда"));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::http::{MockApi, MockMethod, MockReply};
    use crate::usecases::test_support::RecordingNotices;
    use serde_json::json;

    #[tokio::test]
    async fn test_summary_decodes_counters_and_conflicts() {
        let api = Arc::new(MockApi::new().on(
            MockMethod::Get,
            SUMMARY_PATH,
            MockReply::Ok(json!({
                "counters": {"groups": 12, "teachers": 30, "rooms": 8, "subjects": 41},
                "week": [{"id": 1, "date": "2025-09-01", "time_slot_id": 1, "group_id": 2,
                          "teacher_id": 3, "room_id": null, "subject_id": 4}],
                "conflicts": [{"schedule_id": 1, "code": "ROOM_BUSY"}]
            })),
        ));
        let svc = DashboardService::new(api, Arc::new(RecordingNotices::default()));
        let summary = svc.summary().await.unwrap();
        assert_eq!(summary.counters.subjects, 41);
        assert_eq!(summary.week[0].room_id, None);
        assert_eq!(summary.conflicts[0].code, "ROOM_BUSY");
    }

    #[tokio::test]
    async fn test_failure_raises_notice() {
        let api = Arc::new(MockApi::new().on(
            MockMethod::Get,
            SUMMARY_PATH,
            MockReply::Fail {
                status: 403,
                payload: json!({"error": "forbidden"}),
            },
        ));
        let notices = Arc::new(RecordingNotices::default());
        let svc = DashboardService::new(api, notices.clone());
        assert!(svc.summary().await.is_none());
        assert_eq!(notices.errors(), vec!["Ошибка дашборда"]);
    }
}
