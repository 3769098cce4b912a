//! Per-day vehicle specification.

use chrono::NaiveDate;

use crate::window::Window;
use crate::Id;

/// One planning day: a vehicle with a date, a time budget, and a depot.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySpec {
    /// 0-based index, also the vehicle index.
    pub day_index: usize,
    pub date: NaiveDate,
    /// Start/end bounds for the whole day's route.
    pub window: Window,
    pub depot_id: Id,
}

impl DaySpec {
    pub fn start_min(&self) -> f64 {
        self.window.open_min()
    }

    pub fn end_min(&self) -> f64 {
        self.window.close_min()
    }
}
