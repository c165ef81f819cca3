//! Signed-in teacher's workload for a week or a month.

use crate::domain::time::iso_date;
use crate::domain::{CalendarCursor, DomainError, ScheduleRange, TeacherAggregate};
use crate::ports::{ApiPort, Endpoint, decode};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, warn};

const AGGREGATE_PATH: &str = "/api/v1/teacher/me/aggregate";

pub struct TeacherWorkload {
    api: Arc<dyn ApiPort>,
    cursor: CalendarCursor,
}

impl TeacherWorkload {
    /// Starts on the week containing `today`.
    pub fn new(api: Arc<dyn ApiPort>, today: NaiveDate) -> Self {
        Self {
            api,
            cursor: CalendarCursor::new(today, ScheduleRange::Week),
        }
    }

    pub fn cursor(&self) -> CalendarCursor {
        self.cursor
    }

    pub fn prev(&mut self) {
        self.cursor.prev();
    }

    pub fn next(&mut self) {
        self.cursor.next();
    }

    pub fn jump_to(&mut self, date: NaiveDate) {
        self.cursor.jump_to(date);
    }

    /// Week ↔ month.
    pub fn toggle_range(&mut self) {
        self.cursor
            .toggle_between(ScheduleRange::Week, ScheduleRange::Month);
    }

    pub async fn load(&self) -> Result<TeacherAggregate, DomainError> {
        let endpoint = Endpoint::new(AGGREGATE_PATH)
            .query("date", iso_date(self.cursor.date))
            .query("range", self.cursor.range);
        let result = self
            .api
            .get(&endpoint)
            .await
            .and_then(|v| decode::<TeacherAggregate>(v, "teacher aggregate"));
        match &result {
            Ok(agg) => info!(
                period_start = %agg.period.start,
                pairs = agg.counts.pairs,
                "workload loaded"
            ),
            Err(e) => warn!(error = %e, "workload load failed"),
        }
        result
    }
}
