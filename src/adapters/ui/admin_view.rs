//! Renderers for the admin console, the teacher workload and search candidates.

use crate::adapters::ui::markup::Markup;
use crate::domain::time::{compact_date, weekday_short};
use crate::domain::{DashboardSummary, ScheduleEntry, SuggestItem, SuggestKind, TeacherAggregate};
use crate::usecases::typeahead::highlight_matches;
use crate::usecases::{DirectoryKind, DirectoryListing, ScheduleGrid};

pub const EMPTY_CELL: &str = "пусто";

pub fn render_directory(kind: DirectoryKind, listing: &DirectoryListing) -> Markup {
    let mut out = Markup::new();
    out.heading(kind.title());
    match listing {
        DirectoryListing::NotLoaded => {
            out.muted("Загрузка…");
        }
        DirectoryListing::LoadFailed => {
            out.error("Ошибка загрузки");
        }
        DirectoryListing::Loaded(rows) if rows.is_empty() => {
            out.muted(EMPTY_CELL);
        }
        DirectoryListing::Loaded(rows) => {
            let rows: Vec<Vec<String>> = rows
                .iter()
                .map(|r| vec![r.id.to_string(), r.label.clone()])
                .collect();
            out.table(&["ID", "Название"], &rows);
        }
    }
    out
}

/// `G{group}/T{teacher}/R{room}/S{subject}`; a missing room shows as `R-`.
pub fn entry_cell(entry: &ScheduleEntry) -> String {
    let room = entry
        .room_id
        .map(|r| r.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "G{}/T{}/R{}/S{}",
        entry.group_id, entry.teacher_id, room, entry.subject_id
    )
}

pub fn render_grid(grid: &ScheduleGrid) -> Markup {
    let mut headers = vec!["Дата".to_string()];
    headers.extend(grid.slots.iter().map(|s| match (&s.start_time, &s.end_time) {
        (Some(start), Some(end)) => format!("№{} {}–{}", s.order_label(), start, end),
        _ => format!("№{}", s.order_label()),
    }));
    let rows: Vec<Vec<String>> = grid
        .days
        .iter()
        .map(|day| {
            let mut row = vec![format!("{} {}", weekday_short(*day), compact_date(*day))];
            row.extend(grid.slots.iter().map(|slot| {
                grid.cell(*day, slot.id)
                    .map(|e| format!("#{} {}", e.id, entry_cell(e)))
                    .unwrap_or_else(|| EMPTY_CELL.to_string())
            }));
            row
        })
        .collect();
    let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();
    let mut out = Markup::new();
    out.table(&header_refs, &rows);
    out
}

pub fn render_dashboard(summary: &DashboardSummary) -> Markup {
    let c = &summary.counters;
    let mut out = Markup::new();
    out.heading("Сводка");
    for (title, value) in [
        ("Группы", c.groups),
        ("Преподаватели", c.teachers),
        ("Аудитории", c.rooms),
        ("Предметы", c.subjects),
    ] {
        out.plain(format!("  {}: {}", title, value));
    }

    out.heading("Неделя");
    if summary.week.is_empty() {
        out.muted("  Нет занятий");
    }
    let rows: Vec<Vec<String>> = summary
        .week
        .iter()
        .map(|w| {
            vec![
                w.date.clone(),
                w.time_slot_id.to_string(),
                w.group_id.to_string(),
                w.teacher_id.to_string(),
                w.room_id.map(|r| r.to_string()).unwrap_or_default(),
                w.subject_id.to_string(),
            ]
        })
        .collect();
    if !rows.is_empty() {
        out.table(
            &["Дата", "Слот", "Группа", "Преподаватель", "Аудитория", "Предмет"],
            &rows,
        );
    }

    out.heading("Конфликты");
    if summary.conflicts.is_empty() {
        out.muted("  Нет конфликтов");
    }
    for conflict in &summary.conflicts {
        out.error(format!("  #{}: {}", conflict.schedule_id, conflict.code));
    }
    out
}

pub fn render_workload(agg: &TeacherAggregate) -> Markup {
    let mut out = Markup::new();
    out.heading(format!("{} — {}", agg.period.start, agg.period.end));
    out.plain(format!(
        "Рабочих дней: {} · Часов: {} · Пар: {}",
        agg.counts.work_days, agg.counts.hours, agg.counts.pairs
    ));
    if agg.lessons.is_empty() {
        out.muted("Нет занятий");
        return out;
    }
    let rows: Vec<Vec<String>> = agg
        .lessons
        .iter()
        .map(|l| {
            let room = if l.is_remote {
                "СДО".to_string()
            } else {
                l.room.clone().unwrap_or_else(|| "—".to_string())
            };
            vec![
                l.date.clone(),
                l.slot_order.clone().unwrap_or_default(),
                format!("{}–{}", l.start, l.end),
                l.subject.clone(),
                l.group.clone(),
                l.lesson_type.clone().unwrap_or_default(),
                room,
            ]
        })
        .collect();
    out.table(
        &["Дата", "№", "Время", "Предмет", "Группа", "Тип", "Аудитория"],
        &rows,
    );
    out
}

fn kind_label(kind: SuggestKind) -> &'static str {
    match kind {
        SuggestKind::Group => "группа",
        SuggestKind::Teacher => "преподаватель",
        SuggestKind::Subject => "предмет",
        SuggestKind::Other => "—",
    }
}

/// One candidate line; query matches are wrapped in brackets.
pub fn suggestion_line(item: &SuggestItem, query: &str) -> String {
    let label: String = highlight_matches(&item.label, query)
        .into_iter()
        .map(|(part, hit)| if hit { format!("[{}]", part) } else { part })
        .collect();
    match item.hint.as_deref() {
        Some(hint) => format!("{} ({}, {})", label, kind_label(item.kind), hint),
        None => format!("{} ({})", label, kind_label(item.kind)),
    }
}
