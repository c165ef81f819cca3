//! Implements InputPort, PromptPort and NoticePort. Inquire-based interactive console.
//!
//! One logical task drives every screen; only the typeahead works in the
//! background between prompts.

use crate::adapters::ui::admin_view::{
    render_dashboard, render_directory, render_grid, render_workload, suggestion_line,
};
use crate::adapters::ui::markup::{Markup, paint};
use crate::adapters::ui::progress::with_spinner;
use crate::adapters::ui::schedule_view::render_view;
use crate::domain::label::{DIRECTORY_CHAIN, GROUP_CHAIN, LabelField, ROOM_CHAIN, TEACHER_CHAIN, label_with};
use crate::domain::time::{iso_date, parse_iso_date, start_of_week, weekday_short, compact_date};
use crate::domain::{AdminEntity, CalendarCursor, DomainError, NewScheduleEntry, ScheduleRange};
use crate::ports::{ApiPort, InputPort, Notice, NoticeLevel, NoticePort, PromptPort, SessionStorePort};
use crate::usecases::{
    DashboardService, DirectoryKind, DirectoryListing, DirectoryService, ScheduleEditor,
    ScheduleView, ScheduleViewer, TeacherWorkload, Typeahead, TypeaheadState,
};
use async_trait::async_trait;
use chrono::{Days, Local, NaiveDate};
use crossterm::ExecutableCommand;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use inquire::ui::{Color as PromptColor, RenderConfig, Styled};
use inquire::{Confirm, InquireError, Select, Text};
use std::io::{Write, stderr};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Applies the prompt theme for all subsequent inquire prompts.
pub fn apply_theme() {
    let config = RenderConfig::default()
        .with_prompt_prefix(Styled::new("›").with_fg(PromptColor::LightCyan))
        .with_highlighted_option_prefix(Styled::new("▸").with_fg(PromptColor::LightCyan))
        .with_canceled_prompt_indicator(Styled::new("отмена").with_fg(PromptColor::DarkGrey));
    inquire::set_global_render_config(config);
}

fn prompt_error(e: InquireError) -> DomainError {
    DomainError::Prompt(e.to_string())
}

fn is_cancel(e: &InquireError) -> bool {
    matches!(
        e,
        InquireError::OperationCanceled | InquireError::OperationInterrupted
    )
}

/// Blocking inquire prompts.
pub struct TerminalPrompt;

impl PromptPort for TerminalPrompt {
    fn text(&self, message: &str) -> Result<Option<String>, DomainError> {
        match Text::new(message).prompt() {
            Ok(value) => Ok(Some(value)),
            Err(e) if is_cancel(&e) => Ok(None),
            Err(e) => Err(prompt_error(e)),
        }
    }

    fn confirm(&self, message: &str) -> Result<bool, DomainError> {
        match Confirm::new(message).with_default(false).prompt() {
            Ok(answer) => Ok(answer),
            Err(e) if is_cancel(&e) => Ok(false),
            Err(e) => Err(prompt_error(e)),
        }
    }
}

/// Transient notices on stderr, coloured by level.
pub struct TerminalNotices;

impl NoticePort for TerminalNotices {
    fn notify(&self, notice: Notice) {
        let (color, mark) = match notice.level {
            NoticeLevel::Info => (Color::Green, "✓"),
            NoticeLevel::Error => (Color::Red, "✗"),
        };
        let mut err = stderr();
        let _ = err.execute(SetForegroundColor(color));
        let _ = err.execute(Print(format!("{} {}\r\n", mark, notice.text)));
        let _ = err.execute(ResetColor);
        let _ = err.flush();
    }
}

/// Select returning the index of the chosen label; `None` on Esc.
fn choose(message: &str, labels: Vec<String>) -> Result<Option<usize>, DomainError> {
    choose_from(message, labels, 0)
}

fn choose_from(message: &str, labels: Vec<String>, start: usize) -> Result<Option<usize>, DomainError> {
    if labels.is_empty() {
        return Ok(None);
    }
    let start = start.min(labels.len() - 1);
    match Select::new(message, labels).with_starting_cursor(start).raw_prompt() {
        Ok(choice) => Ok(Some(choice.index)),
        Err(e) if is_cancel(&e) => Ok(None),
        Err(e) => Err(prompt_error(e)),
    }
}

fn choose_entity(message: &str, items: &[AdminEntity], chain: &[LabelField]) -> Result<Option<i64>, DomainError> {
    let labels = items.iter().map(|e| label_with(e, chain)).collect();
    Ok(choose(message, labels)?.map(|i| items[i].id))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

const MENU: [&str; 7] = [
    "Расписание группы",
    "Поиск",
    "Нагрузка преподавателя",
    "Сводка (админ)",
    "Справочники (админ)",
    "Редактор расписания (админ)",
    "Выход",
];

/// TUI adapter. Inquire prompts over the use-case services.
pub struct TuiInputPort {
    api: Arc<dyn ApiPort>,
    viewer: ScheduleViewer,
    typeahead: Typeahead,
    prompt: Arc<dyn PromptPort>,
    notices: Arc<dyn NoticePort>,
}

impl TuiInputPort {
    pub fn new(
        api: Arc<dyn ApiPort>,
        store: Arc<dyn SessionStorePort>,
        typeahead: Typeahead,
        prompt: Arc<dyn PromptPort>,
        notices: Arc<dyn NoticePort>,
    ) -> Self {
        Self {
            viewer: ScheduleViewer::new(Arc::clone(&api), store),
            api,
            typeahead,
            prompt,
            notices,
        }
    }

    fn show_view(&self, view: &ScheduleView) {
        paint(&render_view(view, Local::now().time()));
    }

    async fn schedule_screen(&self, cursor: &mut CalendarCursor, view: &mut ScheduleView) -> Result<(), DomainError> {
        const ACTIONS: [&str; 7] = ["← Назад", "Вперёд →", "Сегодня", "День / неделя", "Дата…", "Поиск группы", "В меню"];
        loop {
            self.show_view(view);
            let Some(action) = choose("Расписание:", ACTIONS.iter().map(|s| s.to_string()).collect())? else {
                return Ok(());
            };
            match action {
                0 => cursor.prev(),
                1 => cursor.next(),
                2 => cursor.jump_to(today()),
                3 => cursor.toggle_between(ScheduleRange::Day, ScheduleRange::Week),
                4 => {
                    let Some(raw) = self.prompt.text("Дата (ГГГГ-ММ-ДД):")? else {
                        continue;
                    };
                    match parse_iso_date(&raw) {
                        Some(date) => cursor.jump_to(date),
                        None => {
                            self.notices.notify(Notice::error("Неверная дата"));
                            continue;
                        }
                    }
                }
                5 => {
                    if let Some(next) = self.search(*cursor).await? {
                        *view = next;
                    }
                    continue;
                }
                _ => return Ok(()),
            }
            *view = with_spinner("Загрузка расписания…", self.viewer.reload(*cursor)).await;
        }
    }

    /// Type a query, pick a candidate. Returns the reloaded view when a group was chosen.
    async fn search(&self, cursor: CalendarCursor) -> Result<Option<ScheduleView>, DomainError> {
        let mut selections = self.typeahead.subscribe();
        loop {
            let Some(query) = self.prompt.text("Поиск (группа, преподаватель, предмет):")? else {
                self.typeahead.escape();
                return Ok(None);
            };
            self.typeahead.input(&query);
            if query.trim().is_empty() {
                return Ok(None);
            }
            with_spinner("Поиск…", self.typeahead.settle()).await;

            let snapshot = self.typeahead.snapshot();
            let (items, highlighted) = match snapshot.state {
                TypeaheadState::Open { items, highlighted } => (items, highlighted),
                TypeaheadState::Closed => {
                    self.notices.notify(Notice::info("Ничего не найдено"));
                    continue;
                }
            };
            let labels = items.iter().map(|i| suggestion_line(i, &snapshot.query)).collect();
            let Some(index) = choose_from("Результаты:", labels, highlighted)? else {
                self.typeahead.dismiss();
                return Ok(None);
            };
            let item = match self.typeahead.activate(index).await {
                Ok(Some(item)) => item,
                Ok(None) => return Ok(None),
                Err(e) => {
                    warn!(error = %e, "candidate activation failed");
                    self.notices.notify(Notice::error(e.to_string()));
                    return Ok(None);
                }
            };
            debug!(label = %item.label, kind = item.kind.as_str(), "candidate activated");

            return match selections.try_recv() {
                Ok(selected) => {
                    let view = with_spinner(
                        "Загрузка расписания…",
                        self.viewer.on_group_selected(&selected, cursor),
                    )
                    .await;
                    Ok(Some(view))
                }
                Err(_) => {
                    self.notices.notify(Notice::info(format!("Выбрано: {}", item.label)));
                    Ok(None)
                }
            };
        }
    }

    async fn workload_screen(&self) -> Result<(), DomainError> {
        const ACTIONS: [&str; 5] = ["← Назад", "Вперёд →", "Сегодня", "Неделя / месяц", "В меню"];
        let mut workload = TeacherWorkload::new(Arc::clone(&self.api), today());
        loop {
            match with_spinner("Загрузка нагрузки…", workload.load()).await {
                Ok(agg) => paint(&render_workload(&agg)),
                Err(e) => {
                    let mut m = Markup::new();
                    m.error(format!("Не удалось загрузить нагрузку ({}).", e));
                    paint(&m);
                }
            }
            match choose("Нагрузка:", ACTIONS.iter().map(|s| s.to_string()).collect())? {
                Some(0) => workload.prev(),
                Some(1) => workload.next(),
                Some(2) => workload.jump_to(today()),
                Some(3) => workload.toggle_range(),
                _ => return Ok(()),
            }
        }
    }

    async fn dashboard_screen(&self) {
        let service = DashboardService::new(Arc::clone(&self.api), Arc::clone(&self.notices));
        if let Some(summary) = with_spinner("Загрузка сводки…", service.summary()).await {
            paint(&render_dashboard(&summary));
        }
    }

    async fn directories_screen(&self) -> Result<(), DomainError> {
        let labels = DirectoryKind::ALL.iter().map(|k| k.title().to_string()).collect();
        let Some(index) = choose("Справочник:", labels)? else {
            return Ok(());
        };
        let kind = DirectoryKind::ALL[index];
        let mut service = DirectoryService::new(
            Arc::clone(&self.api),
            Arc::clone(&self.prompt),
            Arc::clone(&self.notices),
            kind,
        );
        with_spinner("Загрузка…", service.load()).await;

        const ACTIONS: [&str; 4] = ["Добавить", "Удалить…", "Обновить", "Назад"];
        loop {
            paint(&render_directory(kind, service.listing()));
            match choose("Действие:", ACTIONS.iter().map(|s| s.to_string()).collect())? {
                Some(0) => {
                    service.create().await?;
                }
                Some(1) => {
                    let DirectoryListing::Loaded(rows) = service.listing() else {
                        continue;
                    };
                    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
                    let labels = rows.iter().map(|r| format!("{} · {}", r.id, r.label)).collect();
                    if let Some(i) = choose("Удалить запись:", labels)? {
                        service.delete(ids[i]).await?;
                    }
                }
                Some(2) => {
                    with_spinner("Загрузка…", service.load()).await;
                }
                _ => return Ok(()),
            }
        }
    }

    async fn editor_screen(&self) -> Result<(), DomainError> {
        let mut editor = ScheduleEditor::new(
            Arc::clone(&self.api),
            Arc::clone(&self.prompt),
            Arc::clone(&self.notices),
        );
        let mut from = start_of_week(today());
        const ACTIONS: [&str; 5] = ["Добавить пару", "Удалить пару", "← Неделя", "Неделя →", "Назад"];
        // create and delete reload the grid themselves; only a new window needs a fetch here
        let mut window_changed = true;
        loop {
            let to = from.checked_add_days(Days::new(6)).unwrap_or(from);
            if std::mem::take(&mut window_changed) {
                if let Err(e) = with_spinner("Загрузка сетки…", editor.load_grid(from, to)).await {
                    info!(error = %e, "editor grid unavailable");
                    self.notices.notify(Notice::error("Ошибка загрузки"));
                }
            }
            if let Some(grid) = editor.grid() {
                paint(&render_grid(grid));
            }
            match choose("Редактор:", ACTIONS.iter().map(|s| s.to_string()).collect())? {
                Some(0) => {
                    if let Some(entry) = self.entry_form(&editor, from, to)? {
                        with_spinner("Проверка…", editor.create(&entry)).await?;
                    }
                }
                Some(1) => {
                    let Some(grid) = editor.grid() else {
                        continue;
                    };
                    let mut ids = Vec::new();
                    let mut labels = Vec::new();
                    for day in &grid.days {
                        for slot in &grid.slots {
                            if let Some(e) = grid.cell(*day, slot.id) {
                                ids.push(e.id);
                                labels.push(format!(
                                    "{} {} №{} · #{}",
                                    weekday_short(*day),
                                    compact_date(*day),
                                    slot.order_label(),
                                    e.id
                                ));
                            }
                        }
                    }
                    if let Some(i) = choose("Удалить:", labels)? {
                        editor.delete_entry(ids[i]).await?;
                    }
                }
                Some(2) => {
                    from = from.checked_sub_days(Days::new(7)).unwrap_or(from);
                    window_changed = true;
                }
                Some(3) => {
                    from = from.checked_add_days(Days::new(7)).unwrap_or(from);
                    window_changed = true;
                }
                _ => return Ok(()),
            }
        }
    }

    /// Collect a candidate entry from the lookup lists. `None` when any required choice is skipped.
    fn entry_form(&self, editor: &ScheduleEditor, from: NaiveDate, to: NaiveDate) -> Result<Option<NewScheduleEntry>, DomainError> {
        let lookup = editor.lookup();
        let days = crate::domain::time::date_span(from, to);
        let day_labels = days
            .iter()
            .map(|d| format!("{} {}", weekday_short(*d), iso_date(*d)))
            .collect();
        let Some(day) = choose("Дата:", day_labels)?.map(|i| days[i]) else {
            return Ok(None);
        };
        let slot_labels = lookup
            .timeslots
            .iter()
            .map(|s| {
                format!(
                    "№{} {}–{}",
                    s.order_label(),
                    s.start_time.as_deref().unwrap_or("?"),
                    s.end_time.as_deref().unwrap_or("?")
                )
            })
            .collect();
        let Some(time_slot_id) = choose("Пара:", slot_labels)?.map(|i| lookup.timeslots[i].id) else {
            return Ok(None);
        };
        let Some(group_id) = choose_entity("Группа:", &lookup.groups, GROUP_CHAIN)? else {
            return Ok(None);
        };
        let Some(teacher_id) = choose_entity("Преподаватель:", &lookup.teachers, TEACHER_CHAIN)? else {
            return Ok(None);
        };
        let Some(subject_id) = choose_entity("Предмет:", &lookup.subjects, DIRECTORY_CHAIN)? else {
            return Ok(None);
        };
        let is_remote = self.prompt.confirm("Дистанционно (СДО)?")?;
        let room_id = if is_remote {
            None
        } else {
            choose_entity("Аудитория:", &lookup.rooms, ROOM_CHAIN)?
        };
        let lesson_type_id = choose_entity("Тип занятия:", &lookup.lesson_types, DIRECTORY_CHAIN)?;
        let requires_computers = self.prompt.confirm("Нужны компьютеры?")?;

        Ok(Some(NewScheduleEntry {
            date: day,
            time_slot_id,
            group_id,
            teacher_id,
            room_id,
            subject_id,
            lesson_type_id,
            is_remote,
            requires_computers,
        }))
    }
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        let mut cursor = CalendarCursor::new(today(), ScheduleRange::Day);
        let mut view = with_spinner("Загрузка расписания…", self.viewer.reload(cursor)).await;
        self.show_view(&view);

        loop {
            let labels = MENU.iter().map(|s| s.to_string()).collect();
            let Some(choice) = choose("Меню:", labels)? else {
                break;
            };
            match choice {
                0 => self.schedule_screen(&mut cursor, &mut view).await?,
                1 => {
                    if let Some(next) = self.search(cursor).await? {
                        view = next;
                        self.show_view(&view);
                    }
                }
                2 => self.workload_screen().await?,
                3 => self.dashboard_screen().await,
                4 => self.directories_screen().await?,
                5 => self.editor_screen().await?,
                _ => break,
            }
        }
        info!("bye");
        Ok(())
    }
}
