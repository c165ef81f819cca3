//! Time-of-day status rules and calendar helpers.
//!
//! Lesson status compares hours:minutes only; the date is always "today".

use crate::domain::entities::ScheduleRange;
use chrono::{Datelike, Days, Months, NaiveDate, NaiveTime, Weekday};

/// Temporal status of a lesson relative to the current time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LessonStatus {
    Past,
    Now,
    Next,
    RemotePast,
    Remote,
    RemoteNext,
}

impl LessonStatus {
    /// Emphasis class name.
    pub fn class(self) -> &'static str {
        match self {
            LessonStatus::Past => "past",
            LessonStatus::Now => "now",
            LessonStatus::Next => "next",
            LessonStatus::RemotePast => "remote-past",
            LessonStatus::Remote => "remote",
            LessonStatus::RemoteNext => "remote-next",
        }
    }

    pub fn is_remote(self) -> bool {
        matches!(
            self,
            LessonStatus::RemotePast | LessonStatus::Remote | LessonStatus::RemoteNext
        )
    }

    fn with_remote(self, remote: bool) -> Self {
        match (self, remote) {
            (LessonStatus::Past, true) => LessonStatus::RemotePast,
            (LessonStatus::Now, true) => LessonStatus::Remote,
            (LessonStatus::Next, true) => LessonStatus::RemoteNext,
            (status, _) => status,
        }
    }
}

/// Parses `HH:MM` or `HH:MM:SS` (seconds ignored).
pub fn parse_hhmm(s: &str) -> Option<NaiveTime> {
    let mut parts = s.trim().split(':');
    let h: u32 = parts.next()?.trim().parse().ok()?;
    let m: u32 = parts.next()?.trim().parse().ok()?;
    NaiveTime::from_hms_opt(h, m, 0)
}

/// `now < start` is next, `now > end` is past, otherwise now. Bounds are inclusive.
/// Missing or unparseable bounds yield `now`.
pub fn status_for_slot(
    start: Option<&str>,
    end: Option<&str>,
    remote: bool,
    now: NaiveTime,
) -> LessonStatus {
    let (Some(start), Some(end)) = (start.and_then(parse_hhmm), end.and_then(parse_hhmm)) else {
        return LessonStatus::Now.with_remote(remote);
    };
    let status = if now < start {
        LessonStatus::Next
    } else if now > end {
        LessonStatus::Past
    } else {
        LessonStatus::Now
    };
    status.with_remote(remote)
}

/// `YYYY-MM-DD`.
pub fn iso_date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

/// Parses the leading `YYYY-MM-DD` of a date or datetime string.
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let head = s.trim().get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Monday of the week containing `d`.
pub fn start_of_week(d: NaiveDate) -> NaiveDate {
    let shift = d.weekday().num_days_from_monday() as u64;
    d - Days::new(shift)
}

/// Monday through Sunday of the week containing `anchor`.
pub fn week_dates(anchor: NaiveDate) -> Vec<NaiveDate> {
    let monday = start_of_week(anchor);
    (0..7).map(|i| monday + Days::new(i)).collect()
}

/// Every date in `[from, to]`; empty when `from > to`.
pub fn date_span(from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    from.iter_days().take_while(|d| *d <= to).collect()
}

pub fn weekday_short(d: NaiveDate) -> &'static str {
    match d.weekday() {
        Weekday::Mon => "Пн",
        Weekday::Tue => "Вт",
        Weekday::Wed => "Ср",
        Weekday::Thu => "Чт",
        Weekday::Fri => "Пт",
        Weekday::Sat => "Сб",
        Weekday::Sun => "Вс",
    }
}

pub fn weekday_long(d: NaiveDate) -> &'static str {
    match d.weekday() {
        Weekday::Mon => "понедельник",
        Weekday::Tue => "вторник",
        Weekday::Wed => "среда",
        Weekday::Thu => "четверг",
        Weekday::Fri => "пятница",
        Weekday::Sat => "суббота",
        Weekday::Sun => "воскресенье",
    }
}

/// `dd.mm`.
pub fn compact_date(d: NaiveDate) -> String {
    d.format("%d.%m").to_string()
}

/// Week section header: `понедельник, 01.09`; unparseable input is shown as is.
pub fn day_header(raw: &str) -> String {
    match parse_iso_date(raw) {
        Some(d) => format!("{}, {}", weekday_long(d), compact_date(d)),
        None => raw.to_string(),
    }
}

/// Moves `date` one step back (`dir < 0`) or forward by the range's unit.
pub fn shift(date: NaiveDate, range: ScheduleRange, dir: i32) -> NaiveDate {
    let forward = dir >= 0;
    let moved = match range {
        ScheduleRange::Day if forward => date.checked_add_days(Days::new(1)),
        ScheduleRange::Day => date.checked_sub_days(Days::new(1)),
        ScheduleRange::Week if forward => date.checked_add_days(Days::new(7)),
        ScheduleRange::Week => date.checked_sub_days(Days::new(7)),
        ScheduleRange::Month if forward => date.checked_add_months(Months::new(1)),
        ScheduleRange::Month => date.checked_sub_months(Months::new(1)),
    };
    moved.unwrap_or(date)
}

/// Current date and window of a schedule view, with prev/next/today navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarCursor {
    pub date: NaiveDate,
    pub range: ScheduleRange,
}

impl CalendarCursor {
    pub fn new(date: NaiveDate, range: ScheduleRange) -> Self {
        Self { date, range }
    }

    pub fn prev(&mut self) {
        self.date = shift(self.date, self.range, -1);
    }

    pub fn next(&mut self) {
        self.date = shift(self.date, self.range, 1);
    }

    pub fn jump_to(&mut self, date: NaiveDate) {
        self.date = date;
    }

    /// Flips between two ranges; any other range becomes `a`.
    pub fn toggle_between(&mut self, a: ScheduleRange, b: ScheduleRange) {
        self.range = if self.range == a { b } else { a };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_navigation() {
        let mut c = CalendarCursor::new(d(2025, 9, 3), ScheduleRange::Day);
        c.next();
        assert_eq!(c.date, d(2025, 9, 4));
        c.toggle_between(ScheduleRange::Day, ScheduleRange::Week);
        assert_eq!(c.range, ScheduleRange::Week);
        c.prev();
        assert_eq!(c.date, d(2025, 8, 28));
        c.toggle_between(ScheduleRange::Day, ScheduleRange::Week);
        assert_eq!(c.range, ScheduleRange::Day);
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_status_boundaries() {
        let s = Some("08:30");
        let e = Some("10:00");
        assert_eq!(status_for_slot(s, e, false, t(8, 29)), LessonStatus::Next);
        assert_eq!(status_for_slot(s, e, false, t(8, 30)), LessonStatus::Now);
        assert_eq!(status_for_slot(s, e, false, t(10, 0)), LessonStatus::Now);
        assert_eq!(status_for_slot(s, e, false, t(10, 1)), LessonStatus::Past);
    }

    #[test]
    fn test_status_remote_variants() {
        let s = Some("08:30:00");
        let e = Some("10:00:00");
        assert_eq!(status_for_slot(s, e, true, t(7, 0)), LessonStatus::RemoteNext);
        assert_eq!(status_for_slot(s, e, true, t(9, 0)), LessonStatus::Remote);
        assert_eq!(status_for_slot(s, e, true, t(11, 0)), LessonStatus::RemotePast);
        assert_eq!(LessonStatus::RemoteNext.class(), "remote-next");
    }

    #[test]
    fn test_status_unparseable_times_is_now() {
        assert_eq!(status_for_slot(None, Some("10:00"), false, t(3, 0)), LessonStatus::Now);
        assert_eq!(status_for_slot(Some("xx"), Some("10:00"), true, t(3, 0)), LessonStatus::Remote);
    }

    #[test]
    fn test_week_helpers() {
        // 2025-09-03 is a Wednesday
        assert_eq!(start_of_week(d(2025, 9, 3)), d(2025, 9, 1));
        assert_eq!(start_of_week(d(2025, 9, 7)), d(2025, 9, 1));
        let week = week_dates(d(2025, 9, 3));
        assert_eq!(week.len(), 7);
        assert_eq!(week[6], d(2025, 9, 7));
        assert_eq!(weekday_short(week[0]), "Пн");
    }

    #[test]
    fn test_day_header() {
        assert_eq!(day_header("2025-09-01"), "понедельник, 01.09");
        assert_eq!(day_header("2025-09-02T00:00:00"), "вторник, 02.09");
        assert_eq!(day_header("когда-нибудь"), "когда-нибудь");
    }

    #[test]
    fn test_shift_by_range() {
        let base = d(2025, 1, 31);
        assert_eq!(shift(base, ScheduleRange::Day, 1), d(2025, 2, 1));
        assert_eq!(shift(base, ScheduleRange::Week, -1), d(2025, 1, 24));
        assert_eq!(shift(base, ScheduleRange::Month, 1), d(2025, 2, 28));
    }

    #[test]
    fn test_date_span() {
        assert_eq!(date_span(d(2025, 9, 1), d(2025, 9, 3)).len(), 3);
        assert!(date_span(d(2025, 9, 3), d(2025, 9, 1)).is_empty());
    }
}
