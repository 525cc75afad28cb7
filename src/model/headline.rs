use chrono::{NaiveDate, NaiveTime};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A date annotation on a heading line: `2025-01-02 Thu 10:00-11:30`.
///
/// The same shape is used for tracked (`<...>`) and untracked (`[...]`)
/// dates; the bracket kind is decided by where the timestamp is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamp {
    pub date: NaiveDate,
    /// Day-name token exactly as written (`Thu`, `Thursday`, ...)
    pub weekday: Option<String>,
    pub start: Option<NaiveTime>,
    pub end: Option<NaiveTime>,
}

impl Timestamp {
    pub fn new(date: NaiveDate) -> Self {
        Timestamp {
            date,
            weekday: None,
            start: None,
            end: None,
        }
    }
}

impl fmt::Display for Timestamp {
    /// Renders the inside of the brackets: `YYYY-MM-DD[ Day][ HH:MM[-HH:MM]]`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date.format("%Y-%m-%d"))?;
        if let Some(ref day) = self.weekday {
            write!(f, " {}", day)?;
        }
        if let Some(start) = self.start {
            write!(f, " {}", start.format("%H:%M"))?;
            if let Some(end) = self.end {
                write!(f, "-{}", end.format("%H:%M"))?;
            }
        }
        Ok(())
    }
}

/// Structured fields of a heading line.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Headline {
    /// Workflow keyword, only when it belongs to the configured state set
    pub state: Option<String>,
    /// Single uppercase letter from `[#A]`
    pub priority: Option<char>,
    /// Angle-bracket date that drives scheduling views
    pub tracked: Option<Timestamp>,
    /// End of a `<a>--<b>` tracked range
    pub tracked_end: Option<Timestamp>,
    /// Square-bracket informational date
    pub untracked: Option<Timestamp>,
    /// Heading text with state, priority, dates and tags removed
    pub free_text: String,
    /// Trailing `:a:b:` tags in source order
    pub tags: IndexSet<String>,
}

impl Headline {
    pub fn new(free_text: impl Into<String>) -> Self {
        Headline {
            free_text: free_text.into(),
            ..Headline::default()
        }
    }

    pub fn tracked_date(&self) -> Option<NaiveDate> {
        self.tracked.as_ref().map(|t| t.date)
    }

    pub fn untracked_date(&self) -> Option<NaiveDate> {
        self.untracked.as_ref().map(|t| t.date)
    }

    pub fn start_time(&self) -> Option<NaiveTime> {
        self.tracked.as_ref().and_then(|t| t.start)
    }

    pub fn end_time(&self) -> Option<NaiveTime> {
        self.tracked.as_ref().and_then(|t| t.end)
    }

    /// True when a tracked date is present without a start time.
    pub fn is_all_day(&self) -> bool {
        self.tracked.is_some() && self.start_time().is_none()
    }
}
