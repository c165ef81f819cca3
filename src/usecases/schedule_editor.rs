//! Admin schedule editor: a date × time-slot grid plus check-then-create.
//!
//! Creation is two sequential requests. The constraint check is advisory and
//! aborts early on any reported code; the create call is authoritative and can
//! still be refused. The grid is only ever refreshed from the server.

use crate::domain::time::{date_span, iso_date};
use crate::domain::{
    ConstraintCheck, DomainError, Lookup, NewScheduleEntry, ScheduleEntry, TimeSlot,
};
use crate::ports::{ApiPort, Endpoint, Notice, NoticePort, PromptPort, decode};
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

const LOOKUP_PATH: &str = "/api/v1/admin/schedule/lookup";
const SCHEDULE_PATH: &str = "/api/v1/admin/schedule";
const CHECK_PATH: &str = "/api/v1/admin/constraints/check";

/// Rows are dates, columns are time slots in lookup order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleGrid {
    pub days: Vec<NaiveDate>,
    pub slots: Vec<TimeSlot>,
    cells: HashMap<(NaiveDate, i64), ScheduleEntry>,
}

impl ScheduleGrid {
    /// Entries whose date falls outside `[from, to]` or does not parse are dropped.
    /// Two entries in one cell: the later one wins.
    pub fn build(from: NaiveDate, to: NaiveDate, slots: Vec<TimeSlot>, entries: Vec<ScheduleEntry>) -> Self {
        let days = date_span(from, to);
        let mut cells = HashMap::new();
        for entry in entries {
            match entry.day() {
                Some(day) if day >= from && day <= to => {
                    cells.insert((day, entry.time_slot_id), entry);
                }
                _ => debug!(id = entry.id, date = %entry.date, "entry outside grid"),
            }
        }
        Self { days, slots, cells }
    }

    pub fn cell(&self, day: NaiveDate, time_slot_id: i64) -> Option<&ScheduleEntry> {
        self.cells.get(&(day, time_slot_id))
    }

    pub fn entry_count(&self) -> usize {
        self.cells.len()
    }
}

/// How a create attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// The check reported violations; nothing was written.
    Rejected(Vec<String>),
    /// The check itself could not be performed; nothing was written.
    CheckFailed,
    /// The create call was refused.
    Failed(Vec<String>),
}

pub struct ScheduleEditor {
    api: Arc<dyn ApiPort>,
    prompt: Arc<dyn PromptPort>,
    notices: Arc<dyn NoticePort>,
    lookup: Lookup,
    window: Option<(NaiveDate, NaiveDate)>,
    grid: Option<ScheduleGrid>,
}

impl ScheduleEditor {
    pub fn new(
        api: Arc<dyn ApiPort>,
        prompt: Arc<dyn PromptPort>,
        notices: Arc<dyn NoticePort>,
    ) -> Self {
        Self {
            api,
            prompt,
            notices,
            lookup: Lookup::default(),
            window: None,
            grid: None,
        }
    }

    pub fn lookup(&self) -> &Lookup {
        &self.lookup
    }

    pub fn grid(&self) -> Option<&ScheduleGrid> {
        self.grid.as_ref()
    }

    pub async fn load_lookup(&mut self) -> Result<&Lookup, DomainError> {
        let value = self.api.get(&Endpoint::new(LOOKUP_PATH)).await?;
        self.lookup = decode(value, "schedule lookup")?;
        info!(
            slots = self.lookup.timeslots.len(),
            groups = self.lookup.groups.len(),
            "lookup loaded"
        );
        Ok(&self.lookup)
    }

    /// Fetch entries for `[from, to]` and rebuild the grid. Loads the lookup first if empty.
    pub async fn load_grid(&mut self, from: NaiveDate, to: NaiveDate) -> Result<&ScheduleGrid, DomainError> {
        if self.lookup.timeslots.is_empty() {
            self.load_lookup().await?;
        }
        let endpoint = Endpoint::new(SCHEDULE_PATH)
            .query("date_from", iso_date(from))
            .query("date_to", iso_date(to));
        let value = self.api.get(&endpoint).await?;
        let entries = parse_entries(value)?;
        self.window = Some((from, to));
        let grid = ScheduleGrid::build(from, to, self.lookup.timeslots.clone(), entries);
        info!(from = %from, to = %to, entries = grid.entry_count(), "schedule grid loaded");
        Ok(self.grid.insert(grid))
    }

    /// Refresh the current window. A failure keeps the old grid and raises a notice.
    pub async fn reload_grid(&mut self) {
        let Some((from, to)) = self.window else {
            return;
        };
        if let Err(e) = self.load_grid(from, to).await {
            warn!(error = %e, "grid reload failed");
            self.notices.notify(Notice::error("Ошибка загрузки"));
        }
    }

    /// Check the candidate, then create it. Never writes when the check objects.
    pub async fn create(&mut self, entry: &NewScheduleEntry) -> Result<CreateOutcome, DomainError> {
        let body = serde_json::to_value(entry).map_err(|e| DomainError::Decode(e.to_string()))?;

        let check = match self.api.post(&Endpoint::new(CHECK_PATH), &body).await {
            Ok(value) => decode::<ConstraintCheck>(value, "constraint check")
                .map(|c| if c.is_clean() { Vec::new() } else { violation_codes(&c) }),
            Err(e) => {
                let codes = e.error_codes();
                if codes.is_empty() {
                    Err(e)
                } else {
                    Ok(codes)
                }
            }
        };
        let violations = match check {
            Ok(codes) => codes,
            Err(e) => {
                warn!(error = %e, "constraint check failed");
                self.notices.notify(Notice::error("Ошибка /constraints/check"));
                return Ok(CreateOutcome::CheckFailed);
            }
        };
        if !violations.is_empty() {
            info!(codes = ?violations, "create blocked by constraints");
            self.notices.notify(Notice::error(format!(
                "Нарушены ограничения: {}",
                violations.join(", ")
            )));
            return Ok(CreateOutcome::Rejected(violations));
        }

        match self.api.post(&Endpoint::new(SCHEDULE_PATH), &body).await {
            Ok(_) => {
                info!(date = %entry.date, slot = entry.time_slot_id, group = entry.group_id, "schedule entry created");
                self.notices.notify(Notice::info("Создано"));
                self.reload_grid().await;
                Ok(CreateOutcome::Created)
            }
            Err(e) => {
                let codes = e.error_codes();
                warn!(error = %e, codes = ?codes, "schedule create refused");
                let detail = if codes.is_empty() {
                    e.to_string()
                } else {
                    codes.join(", ")
                };
                self.notices
                    .notify(Notice::error(format!("Не удалось создать: {}", detail)));
                Ok(CreateOutcome::Failed(codes))
            }
        }
    }

    /// Confirm, then delete entry `id`. Returns `false` when declined or refused.
    pub async fn delete_entry(&mut self, id: i64) -> Result<bool, DomainError> {
        if !self.prompt.confirm("Удалить пару?")? {
            return Ok(false);
        }
        match self.api.delete(&Endpoint::new(SCHEDULE_PATH).segment(id)).await {
            Ok(_) => {
                info!(id, "schedule entry deleted");
                self.notices.notify(Notice::info("Удалено"));
                self.reload_grid().await;
                Ok(true)
            }
            Err(e) => {
                warn!(id, error = %e, "schedule delete failed");
                self.notices.notify(Notice::error("Ошибка удаления"));
                Ok(false)
            }
        }
    }
}

/// A check with `ok: false` and no codes still blocks; it is reported as `UNKNOWN`.
fn violation_codes(check: &ConstraintCheck) -> Vec<String> {
    let codes = check.codes();
    if codes.is_empty() {
        vec!["UNKNOWN".to_string()]
    } else {
        codes
    }
}

fn parse_entries(value: Value) -> Result<Vec<ScheduleEntry>, DomainError> {
    let list = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => map
            .remove("items")
            .ok_or_else(|| DomainError::Decode("schedule list: missing items".into()))?,
        other => return Err(DomainError::Decode(format!("schedule list: {}", other))),
    };
    decode(list, "schedule list")
}
