//! Opening-hours label grammar.
//!
//! Labels are free-form strings from catalog scraping. The grammar accepted
//! here: the literal tokens `closed` and `open 24 hours`, and ranges of the
//! form `H[:MM] am-H[:MM] pm` with optional whitespace and any case. An
//! unparseable label carries no information and callers fall back to role
//! defaults.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};

use crate::window::{Window, DAY_MINUTES};

/// Outcome of parsing a single raw label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Label {
    Closed,
    OpenAllDay,
    Range(Window),
    /// Unparseable; treat as "no information".
    Unknown,
}

/// Parses one opening-hours label.
pub fn parse_label(raw: &str) -> Label {
    let lowered = raw.trim().to_ascii_lowercase();
    if lowered.contains("closed") {
        return Label::Closed;
    }
    if lowered.contains("open 24 hours") {
        return Label::OpenAllDay;
    }

    let Some((left, right)) = lowered.split_once('-') else {
        return Label::Unknown;
    };
    match (clock_minutes(left), clock_minutes(right)) {
        (Some(open), Some(mut close)) => {
            // A close at or before the open means the place runs past
            // midnight; clamp to end of day.
            if close <= open {
                close = DAY_MINUTES;
            }
            Label::Range(Window::from_minutes(open, close))
        }
        _ => Label::Unknown,
    }
}

/// Parses `H[:MM] (am|pm)` into minutes from midnight.
fn clock_minutes(raw: &str) -> Option<f64> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let (digits, pm) = if let Some(stripped) = compact.strip_suffix("am") {
        (stripped, false)
    } else if let Some(stripped) = compact.strip_suffix("pm") {
        (stripped, true)
    } else {
        return None;
    };

    let (h, m) = match digits.split_once(':') {
        Some((h, m)) => (h.parse::<u32>().ok()?, m.parse::<u32>().ok()?),
        None => (digits.parse::<u32>().ok()?, 0),
    };
    if h == 0 || h > 12 || m >= 60 {
        return None;
    }
    let h24 = match (h, pm) {
        (12, false) => 0, // 12 am is midnight
        (12, true) => 12,
        (h, false) => h,
        (h, true) => h + 12,
    };
    Some(f64::from(h24 * 60 + m))
}

/// Resolves the usable windows for one date.
///
/// Each parsed range is intersected with `default`; explicit `closed` with
/// no other usable range yields an empty list and the caller omits the POI
/// for that day. Missing or entirely unparseable entries fall back to
/// `[default]`.
pub fn windows_for_date(
    open_hours: &HashMap<String, Vec<String>>,
    date: NaiveDate,
    default: Window,
) -> Vec<Window> {
    if open_hours.is_empty() {
        return vec![default];
    }
    let Some(raw) = open_hours.get(weekday_name(date)) else {
        return vec![default];
    };

    let mut out = Vec::new();
    let mut closed_explicit = false;
    for label in raw {
        match parse_label(label) {
            Label::Closed => closed_explicit = true,
            Label::OpenAllDay => {
                if let Some(w) = Window::full_day().intersection(&default) {
                    out.push(w);
                }
            }
            Label::Range(range) => {
                if let Some(w) = range.intersection(&default) {
                    out.push(w);
                }
            }
            Label::Unknown => {}
        }
    }

    if !out.is_empty() {
        out
    } else if closed_explicit {
        Vec::new()
    } else {
        vec![default]
    }
}

/// English weekday name matching the catalog's `open_hours` keys.
pub fn weekday_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        chrono::Weekday::Mon => "Monday",
        chrono::Weekday::Tue => "Tuesday",
        chrono::Weekday::Wed => "Wednesday",
        chrono::Weekday::Thu => "Thursday",
        chrono::Weekday::Fri => "Friday",
        chrono::Weekday::Sat => "Saturday",
        chrono::Weekday::Sun => "Sunday",
    }
}
