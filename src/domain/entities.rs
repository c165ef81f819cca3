//! Domain entities. Pure data structures for the schedule API payloads.
//!
//! Shapes are owned by the server; field-name variants seen across backend
//! versions are accepted through aliases so renderers see one canonical form.

use crate::domain::errors::DomainError;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Accepts a string or a number and yields text; `null` and empty strings become `None`.
fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Boolean flag where `null` means `false`.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// Requested schedule window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleRange {
    Day,
    Week,
    Month,
}

impl ScheduleRange {
    pub fn as_str(self) -> &'static str {
        match self {
            ScheduleRange::Day => "day",
            ScheduleRange::Week => "week",
            ScheduleRange::Month => "month",
        }
    }
}

impl std::fmt::Display for ScheduleRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSlotRef {
    #[serde(default, deserialize_with = "text")]
    pub start_time: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub end_time: Option<String>,
    #[serde(default, alias = "order", deserialize_with = "text")]
    pub order_no: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectRef {
    #[serde(default, alias = "title", deserialize_with = "text")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeacherRef {
    #[serde(default, alias = "name", deserialize_with = "text")]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomRef {
    #[serde(default, alias = "name", deserialize_with = "text")]
    pub number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LessonTypeRef {
    #[serde(default, alias = "title", deserialize_with = "text")]
    pub name: Option<String>,
}

/// Homework arrives either as plain text or as an object with `text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Homework {
    Text(String),
    Entry { text: String },
}

impl Homework {
    pub fn text(&self) -> &str {
        match self {
            Homework::Text(t) => t,
            Homework::Entry { text } => text,
        }
    }
}

/// One scheduled pair, or a break marker when `is_break` is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    #[serde(default)]
    pub time_slot: Option<TimeSlotRef>,
    #[serde(default)]
    pub subject: Option<SubjectRef>,
    #[serde(default)]
    pub teacher: Option<TeacherRef>,
    /// Absent room means the pair runs remotely.
    #[serde(default)]
    pub room: Option<RoomRef>,
    #[serde(default)]
    pub lesson_type: Option<LessonTypeRef>,
    #[serde(default)]
    pub homework: Option<Homework>,
    #[serde(default, alias = "remote", alias = "online", deserialize_with = "flag")]
    pub is_remote: bool,
    #[serde(default, deserialize_with = "flag")]
    pub is_break: bool,
    #[serde(default, deserialize_with = "text")]
    pub from: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub to: Option<String>,
}

impl Lesson {
    pub fn start_time(&self) -> Option<&str> {
        self.time_slot.as_ref().and_then(|t| t.start_time.as_deref())
    }

    pub fn end_time(&self) -> Option<&str> {
        self.time_slot.as_ref().and_then(|t| t.end_time.as_deref())
    }

    /// Break span: explicit `from`/`to`, falling back to the time slot bounds.
    pub fn break_span(&self) -> (&str, &str) {
        let from = self.from.as_deref().or(self.start_time()).unwrap_or("");
        let to = self.to.as_deref().or(self.end_time()).unwrap_or("");
        (from, to)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DaySchedule {
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeekDay {
    #[serde(default, alias = "day", alias = "lesson_date", deserialize_with = "text")]
    pub date: Option<String>,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeekSchedule {
    #[serde(default)]
    pub days: Vec<WeekDay>,
}

/// Schedule payload as returned by `/api/v1/schedule/group/:code`.
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulePayload {
    Day(DaySchedule),
    Week(WeekSchedule),
}

impl SchedulePayload {
    /// Shape detection: a `days` array selects the week form, anything else is a day.
    pub fn from_json(value: Value) -> Result<Self, DomainError> {
        let is_week = value.get("days").is_some_and(Value::is_array);
        if is_week {
            serde_json::from_value(value)
                .map(SchedulePayload::Week)
                .map_err(|e| DomainError::Decode(format!("week schedule: {}", e)))
        } else {
            serde_json::from_value(value)
                .map(SchedulePayload::Day)
                .map_err(|e| DomainError::Decode(format!("day schedule: {}", e)))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestKind {
    Group,
    Teacher,
    Subject,
    #[serde(other)]
    Other,
}

impl SuggestKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SuggestKind::Group => "group",
            SuggestKind::Teacher => "teacher",
            SuggestKind::Subject => "subject",
            SuggestKind::Other => "other",
        }
    }
}

/// Typeahead candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestItem {
    #[serde(rename = "type")]
    pub kind: SuggestKind,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, alias = "name")]
    pub label: String,
    #[serde(default, deserialize_with = "text")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct SuggestResponse {
    #[serde(default)]
    pub items: Vec<SuggestItem>,
}

/// Broadcast when a group candidate is chosen in the typeahead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSelected {
    pub code: String,
}

/// Reference-table row (group, teacher, room, subject, ...). Naming differs per table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminEntity {
    pub id: i64,
    #[serde(default, deserialize_with = "text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub number: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub full_name: Option<String>,
}

/// Time slot as listed by the editor lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: i64,
    #[serde(default, alias = "order", deserialize_with = "text")]
    pub order_no: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub start_time: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub end_time: Option<String>,
}

impl TimeSlot {
    pub fn order_label(&self) -> String {
        self.order_no
            .clone()
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// Reference lists for the schedule editor form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lookup {
    #[serde(default)]
    pub timeslots: Vec<TimeSlot>,
    #[serde(default)]
    pub groups: Vec<AdminEntity>,
    #[serde(default)]
    pub teachers: Vec<AdminEntity>,
    #[serde(default)]
    pub rooms: Vec<AdminEntity>,
    #[serde(default)]
    pub subjects: Vec<AdminEntity>,
    #[serde(default)]
    pub lesson_types: Vec<AdminEntity>,
}

/// Stored schedule row as listed by the admin API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: i64,
    pub date: String,
    pub time_slot_id: i64,
    pub group_id: i64,
    pub teacher_id: i64,
    #[serde(default)]
    pub room_id: Option<i64>,
    pub subject_id: i64,
    #[serde(default)]
    pub lesson_type_id: Option<i64>,
    #[serde(default, deserialize_with = "flag")]
    pub is_remote: bool,
}

impl ScheduleEntry {
    /// Calendar day of the entry. Accepts plain dates and datetimes.
    pub fn day(&self) -> Option<NaiveDate> {
        crate::domain::time::parse_iso_date(&self.date)
    }
}

/// Candidate entry submitted to the constraint check and then to create.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewScheduleEntry {
    pub date: NaiveDate,
    pub time_slot_id: i64,
    pub group_id: i64,
    pub teacher_id: i64,
    pub room_id: Option<i64>,
    pub subject_id: i64,
    pub lesson_type_id: Option<i64>,
    pub is_remote: bool,
    pub requires_computers: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCode {
    pub code: String,
}

/// Result of `/admin/constraints/check`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintCheck {
    #[serde(default, deserialize_with = "flag")]
    pub ok: bool,
    #[serde(default)]
    pub errors: Vec<ErrorCode>,
}

impl ConstraintCheck {
    /// Clean only when the server says ok and reports no codes.
    pub fn is_clean(&self) -> bool {
        self.ok && self.errors.is_empty()
    }

    pub fn codes(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.code.clone()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    #[serde(default)]
    pub groups: u64,
    #[serde(default)]
    pub teachers: u64,
    #[serde(default)]
    pub rooms: u64,
    #[serde(default)]
    pub subjects: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub schedule_id: i64,
    pub code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    #[serde(default)]
    pub counters: Counters,
    #[serde(default)]
    pub week: Vec<ScheduleEntry>,
    #[serde(default)]
    pub conflicts: Vec<Conflict>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkloadCounts {
    #[serde(default)]
    pub work_days: u32,
    #[serde(default)]
    pub hours: f64,
    #[serde(default)]
    pub pairs: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Period {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeacherLesson {
    pub id: i64,
    pub date: String,
    #[serde(default, deserialize_with = "text")]
    pub slot_order: Option<String>,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub group: String,
    #[serde(default, deserialize_with = "text")]
    pub lesson_type: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub room: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    pub is_remote: bool,
}

/// Teacher's aggregated workload for a week or month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeacherAggregate {
    #[serde(default)]
    pub counts: WorkloadCounts,
    #[serde(default)]
    pub period: Period,
    #[serde(default)]
    pub lessons: Vec<TeacherLesson>,
}
