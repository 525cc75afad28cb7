use chrono::{NaiveDate, NaiveTime};
use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::ops::Range;

use crate::model::config::ValidStates;
use crate::model::headline::{Headline, Timestamp};

/// Deepest heading level recognized
pub const MAX_DEPTH: usize = 6;

/// Inside of a date block: `YYYY-MM-DD[ Day][ HH:MM[-HH:MM]]`
const TIMESTAMP: &str =
    r"(\d{4}-\d{2}-\d{2})(?: ([A-Za-z]+))?(?: (\d{2}:\d{2})(?:-(\d{2}:\d{2}))?)?";

static HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#{1,6}) ").unwrap());
static STATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([A-Z][A-Z_]*)(?:\s|$)").unwrap());
static PRIORITY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[#([A-Z])\]").unwrap());
static TRACKED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("<{TIMESTAMP}>(?:--<{TIMESTAMP}>)?")).unwrap());
static UNTRACKED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"\[{TIMESTAMP}\]")).unwrap());
static TAGS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\s)(:(?:[A-Za-z0-9_-]+:)+)\s*$").unwrap());
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Return the heading depth if `line` is a heading (`#` x 1..=6, then a space).
pub fn classify_heading(line: &str) -> Option<usize> {
    HEADING_RE.captures(line).map(|caps| caps[1].len())
}

/// Parse a heading line into its structured fields.
///
/// Returns `None` only when the line is not a heading. Anything that fails
/// to match (unknown state keyword, malformed priority, impossible date)
/// is left in `free_text` instead of raising an error.
pub fn parse_headline(line: &str, states: &ValidStates) -> Option<Headline> {
    parse_heading_line(line, states).map(|(_, headline)| headline)
}

/// Classify and parse in one pass: `(depth, headline)` for heading lines.
pub fn parse_heading_line(line: &str, states: &ValidStates) -> Option<(usize, Headline)> {
    let depth = classify_heading(line)?;
    Some((depth, parse_headline_text(&line[depth + 1..], states)))
}

/// Parse the part of a heading line after the markers and separating space.
fn parse_headline_text(text: &str, states: &ValidStates) -> Headline {
    let mut headline = Headline::default();
    let mut rest = text.trim_start().to_string();

    // State: leading all-caps keyword, only if configured
    let state = STATE_RE
        .captures(&rest)
        .filter(|caps| states.contains(&caps[1]))
        .map(|caps| (caps[1].to_string(), caps[0].len()));
    if let Some((state, end)) = state {
        headline.state = Some(state);
        rest = rest[end..].trim_start().to_string();
    }

    // Priority: first `[#X]` anywhere
    let priority = PRIORITY_RE
        .captures(&rest)
        .and_then(|caps| Some((caps[1].chars().next()?, caps.get(0)?.range())));
    if let Some((letter, span)) = priority {
        headline.priority = Some(letter);
        rest = cut(&rest, span);
    }

    // Tags: `:a:b:` anchored at the end of the line
    let tags = TAGS_RE.captures(&rest).and_then(|caps| {
        let block = caps.get(1)?;
        let tags: IndexSet<String> = block
            .as_str()
            .split(':')
            .filter(|t| !t.is_empty())
            .map(|t| t.to_string())
            .collect();
        Some((tags, block.range()))
    });
    if let Some((tags, span)) = tags {
        headline.tags = tags;
        rest = cut(&rest, span);
    }

    // Tracked date, optionally a `<a>--<b>` range. A range whose second half
    // does not parse is left as text.
    let tracked = TRACKED_RE.captures(&rest).and_then(|caps| {
        let start = timestamp_from(&caps, 1)?;
        let end = match caps.get(5) {
            Some(_) => Some(timestamp_from(&caps, 5)?),
            None => None,
        };
        Some((start, end, caps.get(0)?.range()))
    });
    if let Some((start, end, span)) = tracked {
        headline.tracked = Some(start);
        headline.tracked_end = end;
        rest = cut(&rest, span);
    }

    // Untracked date
    let untracked = UNTRACKED_RE
        .captures(&rest)
        .and_then(|caps| Some((timestamp_from(&caps, 1)?, caps.get(0)?.range())));
    if let Some((ts, span)) = untracked {
        headline.untracked = Some(ts);
        rest = cut(&rest, span);
    }

    headline.free_text = rest.trim().to_string();
    headline
}

/// Build a timestamp from four consecutive capture groups starting at `first`:
/// date, day name, start time, end time.
fn timestamp_from(caps: &Captures<'_>, first: usize) -> Option<Timestamp> {
    let date = NaiveDate::parse_from_str(caps.get(first)?.as_str(), "%Y-%m-%d").ok()?;
    let weekday = caps.get(first + 1).map(|m| m.as_str().to_string());
    let start = match caps.get(first + 2) {
        Some(m) => Some(NaiveTime::parse_from_str(m.as_str(), "%H:%M").ok()?),
        None => None,
    };
    let end = match caps.get(first + 3) {
        Some(m) => Some(NaiveTime::parse_from_str(m.as_str(), "%H:%M").ok()?),
        None => None,
    };
    Some(Timestamp {
        date,
        weekday,
        start,
        end,
    })
}

/// Remove `range` from `text`, joining the two sides with a single space.
fn cut(text: &str, range: Range<usize>) -> String {
    let left = text[..range.start].trim_end();
    let right = text[range.end..].trim_start();
    match (left.is_empty(), right.is_empty()) {
        (true, _) => right.to_string(),
        (_, true) => left.to_string(),
        _ => format!("{} {}", left, right),
    }
}

/// A tag that can sit inside a `:a:b:` block
pub fn is_valid_tag(tag: &str) -> bool {
    TAG_RE.is_match(tag)
}

/// All-caps token at the start of `text` that the parser would take as the
/// state if it were in the valid set.
pub(crate) fn leading_keyword(text: &str) -> Option<&str> {
    STATE_RE.captures(text).and_then(|caps| caps.get(1)).map(|m| m.as_str())
}

/// Anything shaped like `<date>`, whether or not the date is real
pub(crate) fn has_tracked_shape(text: &str) -> bool {
    TRACKED_RE.is_match(text)
}

/// Anything shaped like `[date]`, whether or not the date is real
pub(crate) fn has_untracked_shape(text: &str) -> bool {
    UNTRACKED_RE.is_match(text)
}
