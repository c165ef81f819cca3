//! Core domain layer. No external I/O dependencies.
//!
//! Payload entities, status rules and label normalization live here.

pub mod entities;
pub mod errors;
pub mod label;
pub mod time;

pub use entities::{
    AdminEntity, Conflict, ConstraintCheck, Counters, DashboardSummary, DaySchedule, GroupSelected,
    Lesson, Lookup, NewScheduleEntry, ScheduleEntry, SchedulePayload, ScheduleRange, SuggestItem,
    SuggestKind, TeacherAggregate, TeacherLesson, TimeSlot, WeekDay, WeekSchedule,
};
pub use errors::DomainError;
pub use time::{CalendarCursor, LessonStatus};
