//! Reference-table CRUD: list, create via prompt, delete with confirmation.
//!
//! Nothing is applied locally before the server accepts it; a failed call
//! leaves the listing as it was and raises an error notice.

use crate::domain::label::display_label;
use crate::domain::{AdminEntity, DomainError};
use crate::ports::{ApiPort, Endpoint, Notice, NoticePort, PromptPort};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, warn};

const ADMIN_PATH: &str = "/api/v1/admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryKind {
    Groups,
    Teachers,
    Rooms,
    Subjects,
    LessonTypes,
    TimeSlots,
    Buildings,
    RoomTypes,
}

impl DirectoryKind {
    pub const ALL: [DirectoryKind; 8] = [
        DirectoryKind::Groups,
        DirectoryKind::Teachers,
        DirectoryKind::Rooms,
        DirectoryKind::Subjects,
        DirectoryKind::LessonTypes,
        DirectoryKind::TimeSlots,
        DirectoryKind::Buildings,
        DirectoryKind::RoomTypes,
    ];

    /// URL slug under `/api/v1/admin/`.
    pub fn slug(self) -> &'static str {
        match self {
            DirectoryKind::Groups => "groups",
            DirectoryKind::Teachers => "teachers",
            DirectoryKind::Rooms => "rooms",
            DirectoryKind::Subjects => "subjects",
            DirectoryKind::LessonTypes => "lesson-types",
            DirectoryKind::TimeSlots => "time-slots",
            DirectoryKind::Buildings => "buildings",
            DirectoryKind::RoomTypes => "room-types",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            DirectoryKind::Groups => "Группы",
            DirectoryKind::Teachers => "Преподаватели",
            DirectoryKind::Rooms => "Аудитории",
            DirectoryKind::Subjects => "Предметы",
            DirectoryKind::LessonTypes => "Типы занятий",
            DirectoryKind::TimeSlots => "Пары (слоты)",
            DirectoryKind::Buildings => "Корпуса",
            DirectoryKind::RoomTypes => "Типы аудиторий",
        }
    }

    /// Accepts the slug or the legacy `timeslots` name.
    pub fn from_name(name: &str) -> Result<Self, DomainError> {
        let name = name.trim();
        if name == "timeslots" {
            return Ok(DirectoryKind::TimeSlots);
        }
        Self::ALL
            .into_iter()
            .find(|k| k.slug() == name)
            .ok_or_else(|| DomainError::UnknownDirectory(name.to_string()))
    }

    pub fn list_endpoint(self) -> Endpoint {
        Endpoint::new(ADMIN_PATH).segment(self.slug())
    }

    pub fn create_endpoint(self) -> Endpoint {
        self.list_endpoint()
    }

    pub fn item_endpoint(self, id: i64) -> Endpoint {
        self.list_endpoint().segment(id)
    }
}

impl std::fmt::Display for DirectoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

/// Normalized table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryRow {
    pub id: i64,
    pub label: String,
}

impl From<&AdminEntity> for DirectoryRow {
    fn from(entity: &AdminEntity) -> Self {
        Self {
            id: entity.id,
            label: display_label(entity),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryListing {
    NotLoaded,
    Loaded(Vec<DirectoryRow>),
    /// First load failed; nothing to show.
    LoadFailed,
}

/// Rows from `{items}`, `{data}` or a bare array. Rows that do not decode are skipped.
pub fn parse_rows(value: &Value) -> Vec<DirectoryRow> {
    let list = value
        .get("items")
        .or_else(|| value.get("data"))
        .unwrap_or(value)
        .as_array()
        .cloned()
        .unwrap_or_default();
    list.into_iter()
        .filter_map(|v| match serde_json::from_value::<AdminEntity>(v) {
            Ok(e) => Some(DirectoryRow::from(&e)),
            Err(e) => {
                debug!(error = %e, "skipping malformed directory row");
                None
            }
        })
        .collect()
}

pub struct DirectoryService {
    api: Arc<dyn ApiPort>,
    prompt: Arc<dyn PromptPort>,
    notices: Arc<dyn NoticePort>,
    kind: DirectoryKind,
    listing: DirectoryListing,
}

impl DirectoryService {
    pub fn new(
        api: Arc<dyn ApiPort>,
        prompt: Arc<dyn PromptPort>,
        notices: Arc<dyn NoticePort>,
        kind: DirectoryKind,
    ) -> Self {
        Self {
            api,
            prompt,
            notices,
            kind,
            listing: DirectoryListing::NotLoaded,
        }
    }

    pub fn kind(&self) -> DirectoryKind {
        self.kind
    }

    pub fn listing(&self) -> &DirectoryListing {
        &self.listing
    }

    /// Fetch the table. On failure the previous listing stays.
    pub async fn load(&mut self) -> &DirectoryListing {
        match self.api.get(&self.kind.list_endpoint()).await {
            Ok(value) => {
                let rows = parse_rows(&value);
                info!(kind = %self.kind, rows = rows.len(), "directory loaded");
                self.listing = DirectoryListing::Loaded(rows);
            }
            Err(e) => {
                warn!(kind = %self.kind, error = %e, "directory load failed");
                self.notices.notify(Notice::error("Ошибка загрузки"));
                if self.listing == DirectoryListing::NotLoaded {
                    self.listing = DirectoryListing::LoadFailed;
                }
            }
        }
        &self.listing
    }

    /// Prompt for a value and submit it under `name`, `code` and `number`.
    /// Returns `false` when cancelled or rejected.
    pub async fn create(&mut self) -> Result<bool, DomainError> {
        let Some(value) = self
            .prompt
            .text("Название/код:")?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
        else {
            return Ok(false);
        };

        let body = json!({ "name": value, "code": value, "number": value });
        match self.api.post(&self.kind.create_endpoint(), &body).await {
            Ok(_) => {
                info!(kind = %self.kind, value = %value, "directory row created");
                self.load().await;
                Ok(true)
            }
            Err(e) => {
                warn!(kind = %self.kind, error = %e, "directory create failed");
                self.notices.notify(Notice::error("Ошибка создания"));
                Ok(false)
            }
        }
    }

    /// Confirm, then delete row `id`. Returns `false` when declined or rejected.
    pub async fn delete(&mut self, id: i64) -> Result<bool, DomainError> {
        if !self.prompt.confirm("Удалить?")? {
            return Ok(false);
        }
        match self.api.delete(&self.kind.item_endpoint(id)).await {
            Ok(_) => {
                info!(kind = %self.kind, id, "directory row deleted");
                self.load().await;
                Ok(true)
            }
            Err(e) => {
                warn!(kind = %self.kind, id, error = %e, "directory delete failed");
                self.notices.notify(Notice::error("Ошибка удаления"));
                Ok(false)
            }
        }
    }
}
