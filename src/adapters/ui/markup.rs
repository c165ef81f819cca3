//! Styled text lines produced by the renderers and painted by the terminal.
//!
//! Renderers stay pure: they return `Markup`, and only `paint` touches stdout.

use crate::domain::LessonStatus;
use crossterm::ExecutableCommand;
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use std::fmt;
use std::io::{Write, stdout};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    Plain,
    Heading,
    Muted,
    Error,
    Status(LessonStatus),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub emphasis: Emphasis,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markup {
    lines: Vec<Line>,
}

impl Markup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, emphasis: Emphasis, text: impl Into<String>) -> &mut Self {
        self.lines.push(Line {
            emphasis,
            text: text.into(),
        });
        self
    }

    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.push(Emphasis::Plain, text)
    }

    pub fn heading(&mut self, text: impl Into<String>) -> &mut Self {
        self.push(Emphasis::Heading, text)
    }

    pub fn muted(&mut self, text: impl Into<String>) -> &mut Self {
        self.push(Emphasis::Muted, text)
    }

    pub fn error(&mut self, text: impl Into<String>) -> &mut Self {
        self.push(Emphasis::Error, text)
    }

    pub fn append(&mut self, other: Markup) -> &mut Self {
        self.lines.extend(other.lines);
        self
    }

    /// Column-aligned table. Widths are counted in chars so Cyrillic pads correctly.
    pub fn table(&mut self, headers: &[&str], rows: &[Vec<String>]) -> &mut Self {
        let cols = headers.len();
        let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
        for row in rows {
            for (i, cell) in row.iter().take(cols).enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
        let format_row = |cells: Vec<&str>| {
            cells
                .iter()
                .enumerate()
                .map(|(i, c)| pad(c, widths[i]))
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        };
        self.heading(format_row(headers.to_vec()));
        self.muted(
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-"),
        );
        for row in rows {
            let cells: Vec<&str> = (0..cols)
                .map(|i| row.get(i).map(String::as_str).unwrap_or(""))
                .collect();
            self.plain(format_row(cells));
        }
        self
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

fn pad(s: &str, width: usize) -> String {
    let n = s.chars().count();
    format!("{}{}", s, " ".repeat(width.saturating_sub(n)))
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line.text)?;
        }
        Ok(())
    }
}

fn status_color(status: LessonStatus) -> Color {
    match status {
        LessonStatus::Past | LessonStatus::RemotePast => Color::DarkGrey,
        LessonStatus::Now => Color::Green,
        LessonStatus::Remote => Color::Magenta,
        LessonStatus::Next => Color::Cyan,
        LessonStatus::RemoteNext => Color::Blue,
    }
}

/// Writes `markup` to stdout with colours per emphasis.
pub fn paint(markup: &Markup) {
    let mut out = stdout();
    for line in markup.lines() {
        match line.emphasis {
            Emphasis::Plain => {}
            Emphasis::Heading => {
                let _ = out.execute(SetAttribute(Attribute::Bold));
            }
            Emphasis::Muted => {
                let _ = out.execute(SetForegroundColor(Color::DarkGrey));
            }
            Emphasis::Error => {
                let _ = out.execute(SetForegroundColor(Color::Red));
            }
            Emphasis::Status(status) => {
                let _ = out.execute(SetForegroundColor(status_color(status)));
                if status == LessonStatus::Now || status == LessonStatus::Remote {
                    let _ = out.execute(SetAttribute(Attribute::Bold));
                }
            }
        }
        let _ = out.execute(Print(&line.text));
        let _ = out.execute(SetAttribute(Attribute::Reset));
        let _ = out.execute(ResetColor);
        let _ = out.execute(Print("\r\n"));
    }
    let _ = out.flush();
}
