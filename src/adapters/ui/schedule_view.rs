//! Schedule renderer: payload and time of day in, markup out.

use crate::adapters::ui::markup::{Emphasis, Markup};
use crate::domain::time::{day_header, iso_date, status_for_slot};
use crate::domain::{DaySchedule, Lesson, LessonStatus, SchedulePayload, ScheduleRange, WeekSchedule};
use crate::usecases::ScheduleView;
use chrono::NaiveTime;

pub const EMPTY_DAY: &str = "Нет занятий на выбранный день.";
pub const EMPTY_WEEK: &str = "Нет занятий на этой неделе.";
pub const EMPTY_SECTION: &str = "Нет занятий";
pub const NO_GROUP: &str = "Выберите группу через поиск выше.";

const SEP: &str = " · ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LessonBlock {
    /// Only the time span; subject, teacher and room are never shown.
    Break { from: String, to: String },
    Lesson {
        status: LessonStatus,
        title: String,
        meta: String,
    },
}

pub fn lesson_block(lesson: &Lesson, now: NaiveTime) -> LessonBlock {
    if lesson.is_break {
        let (from, to) = lesson.break_span();
        return LessonBlock::Break {
            from: from.to_string(),
            to: to.to_string(),
        };
    }

    let status = status_for_slot(lesson.start_time(), lesson.end_time(), lesson.is_remote, now);
    let subject = lesson
        .subject
        .as_ref()
        .and_then(|s| s.name.as_deref())
        .unwrap_or("Предмет");
    let kind = lesson
        .lesson_type
        .as_ref()
        .and_then(|t| t.name.as_deref())
        .unwrap_or("Занятие");

    let mut meta = Vec::new();
    if lesson.start_time().is_some() || lesson.end_time().is_some() {
        meta.push(format!(
            "{}–{}",
            lesson.start_time().unwrap_or("?"),
            lesson.end_time().unwrap_or("?")
        ));
    }
    if let Some(order) = lesson.time_slot.as_ref().and_then(|t| t.order_no.as_deref()) {
        meta.push(format!("№{}", order));
    }
    match lesson.room.as_ref().and_then(|r| r.number.as_deref()) {
        Some(room) => meta.push(format!("ауд. {}", room)),
        None => meta.push("СДО".to_string()),
    }
    if let Some(teacher) = lesson.teacher.as_ref().and_then(|t| t.full_name.as_deref()) {
        meta.push(teacher.to_string());
    }
    if let Some(hw) = lesson.homework.as_ref().map(|h| h.text().trim()).filter(|t| !t.is_empty()) {
        meta.push(format!("ДЗ: {}", hw));
    }

    LessonBlock::Lesson {
        status,
        title: format!("{}{}{}", subject, SEP, kind),
        meta: meta.join(SEP),
    }
}

fn push_block(out: &mut Markup, block: LessonBlock) {
    match block {
        LessonBlock::Break { from, to } => {
            out.muted(format!("  Перерыв{}{}–{}", SEP, from, to));
        }
        LessonBlock::Lesson { status, title, meta } => {
            out.push(Emphasis::Status(status), format!("  {}", title));
            out.muted(format!("    {}", meta));
        }
    }
}

pub fn render_day(day: &DaySchedule, now: NaiveTime) -> Markup {
    let mut out = Markup::new();
    if day.lessons.is_empty() {
        out.muted(EMPTY_DAY);
        return out;
    }
    for lesson in &day.lessons {
        push_block(&mut out, lesson_block(lesson, now));
    }
    out
}

/// Sections keep server order.
pub fn render_week(week: &WeekSchedule, now: NaiveTime) -> Markup {
    let mut out = Markup::new();
    if week.days.is_empty() {
        out.muted(EMPTY_WEEK);
        return out;
    }
    for day in &week.days {
        let header = day.date.as_deref().map(day_header).unwrap_or_else(|| "—".to_string());
        out.heading(header);
        if day.lessons.is_empty() {
            out.muted(format!("  {}", EMPTY_SECTION));
        }
        for lesson in &day.lessons {
            push_block(&mut out, lesson_block(lesson, now));
        }
    }
    out
}

pub fn render_schedule(payload: &SchedulePayload, now: NaiveTime) -> Markup {
    match payload {
        SchedulePayload::Day(day) => render_day(day, now),
        SchedulePayload::Week(week) => render_week(week, now),
    }
}

/// Full viewer panel: caption plus schedule, or the empty / failed state.
pub fn render_view(view: &ScheduleView, now: NaiveTime) -> Markup {
    let mut out = Markup::new();
    match view {
        ScheduleView::NoGroup => {
            out.muted(NO_GROUP);
        }
        ScheduleView::Failed { reason, .. } => {
            out.error(format!("Не удалось загрузить расписание ({}).", reason));
        }
        ScheduleView::Loaded {
            code,
            date,
            range,
            payload,
        } => {
            let unit = match range {
                ScheduleRange::Week => "неделя",
                _ => "день",
            };
            out.muted(format!(
                "Показываю расписание для группы {} ({}: {}).",
                code,
                unit,
                iso_date(*date)
            ));
            out.append(render_schedule(payload, now));
        }
    }
    out
}
