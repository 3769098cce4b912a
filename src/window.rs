//! Minute-of-day intervals and clock times.
//!
//! A [`Window`] is a closed range `[open, close]` in minutes from midnight,
//! the unit every scheduling computation in the crate operates on. Opening
//! hours, day horizons, and mandatory-visit bounds are all `Window`s.

use std::fmt::Display;
use std::str::FromStr;

use qtty::{Minute, Quantity};
use serde::{Deserialize, Serialize};

/// Minutes in a full day.
pub const DAY_MINUTES: f64 = 24.0 * 60.0;

/// Closed minute-of-day range `[open, close]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    open: Quantity<Minute>,
    close: Quantity<Minute>,
}

impl Window {
    /// Creates the window `[open, close]`.
    ///
    /// # Panics
    ///
    /// Panics if `open > close`.
    pub const fn new(open: Quantity<Minute>, close: Quantity<Minute>) -> Self {
        assert!(
            open.value() <= close.value(),
            "Window open must be <= close"
        );
        Self { open, close }
    }

    pub const fn from_minutes(open: f64, close: f64) -> Self {
        Self::new(Quantity::<Minute>::new(open), Quantity::<Minute>::new(close))
    }

    /// The full day, `[00:00, 24:00]`.
    pub const fn full_day() -> Self {
        Self::from_minutes(0.0, DAY_MINUTES)
    }

    pub const fn open(&self) -> Quantity<Minute> {
        self.open
    }

    pub const fn close(&self) -> Quantity<Minute> {
        self.close
    }

    /// Opening bound in plain minutes.
    pub const fn open_min(&self) -> f64 {
        self.open.value()
    }

    /// Closing bound in plain minutes.
    pub const fn close_min(&self) -> f64 {
        self.close.value()
    }

    pub fn duration(&self) -> Quantity<Minute> {
        self.close - self.open
    }

    /// Returns true if `minute` ∈ `[open, close]`.
    pub const fn contains(&self, minute: f64) -> bool {
        self.open.value() <= minute && minute <= self.close.value()
    }

    /// Returns true if the range `[from, to]` lies entirely inside the window.
    pub const fn covers(&self, from: f64, to: f64) -> bool {
        self.open.value() <= from && to <= self.close.value()
    }

    pub const fn overlaps(&self, other: &Window) -> bool {
        self.open.value() <= other.close.value() && other.open.value() <= self.close.value()
    }

    /// Intersection of two windows, `None` when they do not overlap or the
    /// overlap is a single instant.
    pub fn intersection(&self, other: &Window) -> Option<Window> {
        if !self.overlaps(other) {
            return None;
        }
        let open = self.open.value().max(other.open.value());
        let close = self.close.value().min(other.close.value());
        if open < close {
            Some(Window::from_minutes(open, close))
        } else {
            None
        }
    }
}

impl Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}",
            TimeOfDay::from_minutes(self.open.value()),
            TimeOfDay::from_minutes(self.close.value())
        )
    }
}

/// Clock time as whole minutes from midnight, rendered as `HH:MM`.
///
/// Values up to 25:00 are representable so that a day-end overrun past
/// midnight survives serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub const fn new(minutes: u16) -> Self {
        Self(minutes)
    }

    pub fn from_minutes(minutes: f64) -> Self {
        Self(minutes.round().max(0.0) as u16)
    }

    pub const fn minutes(&self) -> u16 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        f64::from(self.0)
    }
}

impl Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

/// Error parsing an `HH:MM` clock time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid HH:MM time: {0}")]
pub struct ParseTimeError(String);

impl FromStr for TimeOfDay {
    type Err = ParseTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (h, m) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| ParseTimeError(s.to_string()))?;
        let h: u16 = h.parse().map_err(|_| ParseTimeError(s.to_string()))?;
        let m: u16 = m.parse().map_err(|_| ParseTimeError(s.to_string()))?;
        if m >= 60 || h > 25 {
            return Err(ParseTimeError(s.to_string()));
        }
        Ok(Self(h * 60 + m))
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
