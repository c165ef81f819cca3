//! Application use cases. Orchestrate domain logic via ports.

pub mod dashboard_service;
pub mod directory_service;
pub mod schedule_editor;
pub mod schedule_viewer;
pub mod teacher_workload;
pub mod typeahead;

#[cfg(test)]
mod test_support;

pub use dashboard_service::DashboardService;
pub use directory_service::{DirectoryKind, DirectoryListing, DirectoryRow, DirectoryService};
pub use schedule_editor::{CreateOutcome, ScheduleEditor, ScheduleGrid};
pub use schedule_viewer::{ScheduleView, ScheduleViewer};
pub use teacher_workload::TeacherWorkload;
pub use typeahead::{Typeahead, TypeaheadSnapshot, TypeaheadState};
