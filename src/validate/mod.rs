//! Post-hoc rule check for produced plans.
//!
//! Exercised by the test suites rather than the request path: the checks
//! re-derive opening windows from the catalog entities in the selection
//! and audit the plan against meal cadence, hours, pacing overrun, and
//! theme-coverage rules.

use std::collections::HashMap;

use serde::Serialize;

use crate::catalog::{hours, Poi};
use crate::request::{MandatoryVisit, Pacing};
use crate::selector::Selection;
use crate::solver::plan::{DayPlan, Plan, Stop};
use crate::window::Window;
use crate::Id;

/// Meal service windows accepted without a timing warning.
pub const BREAKFAST: Window = Window::from_minutes(7.0 * 60.0, 10.0 * 60.0);
pub const LUNCH: Window = Window::from_minutes(12.0 * 60.0, 14.0 * 60.0);
pub const DINNER: Window = Window::from_minutes(18.0 * 60.0, 21.0 * 60.0);

/// Tolerated overrun past the day window, in minutes.
pub const MAX_DAY_OVERRUN_MIN: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    ConsecutiveMeals,
    MealTiming,
    PoiClosed,
    OutsideHours,
    InsufficientMeals,
    ExcessiveMeals,
    DayOverrun,
    ThemeGap,
    MandatoryDropped,
    MandatoryMisplaced,
}

impl ViolationKind {
    pub fn severity(&self) -> Severity {
        match self {
            ViolationKind::ConsecutiveMeals
            | ViolationKind::PoiClosed
            | ViolationKind::InsufficientMeals
            | ViolationKind::MandatoryDropped
            | ViolationKind::MandatoryMisplaced => Severity::Error,
            ViolationKind::MealTiming
            | ViolationKind::OutsideHours
            | ViolationKind::ExcessiveMeals
            | ViolationKind::DayOverrun
            | ViolationKind::ThemeGap => Severity::Warning,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub severity: Severity,
    pub message: String,
    /// 1-based day number when the violation is day-scoped.
    pub day: Option<usize>,
    pub poi: Option<String>,
}

impl Violation {
    fn new(kind: ViolationKind, message: String, day: Option<usize>, poi: Option<String>) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            message,
            day,
            poi,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationStats {
    pub total_days: usize,
    pub total_stops: usize,
    pub total_meals: u32,
    pub meals_per_day: Vec<u32>,
    pub theme_distribution: HashMap<String, usize>,
    pub day_overruns: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
    pub stats: ValidationStats,
}

impl ValidationReport {
    /// True when no error-severity violation was found.
    pub fn is_valid(&self) -> bool {
        !self
            .violations
            .iter()
            .any(|v| v.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(|v| v.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(|v| v.severity == Severity::Warning)
    }
}

/// Fallback hours when the catalog entity has no entry for the day.
/// Nature spots count as always open; everything else gets 10:00-22:00.
fn default_hours(poi: Option<&Poi>) -> Window {
    if poi.is_some_and(|p| p.has_theme("nature")) {
        Window::full_day()
    } else {
        Window::from_minutes(10.0 * 60.0, 22.0 * 60.0)
    }
}

/// Audits a plan against the selection it was built from.
pub fn validate_plan(
    plan: &Plan,
    selection: &Selection,
    pacing: Pacing,
    mandatory: &HashMap<Id, MandatoryVisit>,
) -> ValidationReport {
    let mut violations = Vec::new();
    let mut stats = ValidationStats {
        total_days: plan.days.len(),
        ..Default::default()
    };

    let poi_lookup: HashMap<&str, &Poi> = selection
        .pois
        .iter()
        .map(|s| (s.poi.id.as_str(), &s.poi))
        .collect();
    let day_end = pacing.day_window().close_min();

    for (day_idx, day) in plan.days.iter().enumerate() {
        let day_num = day_idx + 1;
        let mut meals_today = 0u32;
        let mut prev: Option<&Stop> = None;

        stats.total_stops += day.poi_stops().count();

        check_day_overrun(day, day_num, day_end, &mut violations, &mut stats);

        for stop in day.poi_stops() {
            let poi = poi_lookup.get(stop.base_id.as_str()).copied();

            if let Some(p) = prev {
                if p.role == crate::problem::NodeRole::Meal
                    && stop.role == crate::problem::NodeRole::Meal
                {
                    violations.push(Violation::new(
                        ViolationKind::ConsecutiveMeals,
                        format!("consecutive meals ({} then {})", p.name, stop.name),
                        Some(day_num),
                        Some(stop.name.clone()),
                    ));
                }
            }

            if stop.role == crate::problem::NodeRole::Meal {
                meals_today += 1;
                let arrival = stop.arrival.as_f64();
                let in_window = [BREAKFAST, LUNCH, DINNER]
                    .iter()
                    .any(|w| w.contains(arrival));
                if !in_window {
                    violations.push(Violation::new(
                        ViolationKind::MealTiming,
                        format!("meal at unusual time ({}) at {}", stop.arrival, stop.name),
                        Some(day_num),
                        Some(stop.name.clone()),
                    ));
                }
            }

            check_opening_hours(stop, poi, day, day_num, &mut violations);

            if let Some(p) = poi {
                for theme in &p.themes {
                    *stats.theme_distribution.entry(theme.clone()).or_insert(0) += 1;
                }
            }

            prev = Some(stop);
        }

        stats.meals_per_day.push(meals_today);
        stats.total_meals += meals_today;
    }

    for (day_idx, &meals) in stats.meals_per_day.iter().enumerate() {
        if meals < 1 {
            violations.push(Violation::new(
                ViolationKind::InsufficientMeals,
                format!("day {}: only {} meals", day_idx + 1, meals),
                Some(day_idx + 1),
                None,
            ));
        } else if meals > 3 {
            violations.push(Violation::new(
                ViolationKind::ExcessiveMeals,
                format!("day {}: {} meals", day_idx + 1, meals),
                Some(day_idx + 1),
                None,
            ));
        }
    }

    let missing: Vec<&str> = selection
        .selected_themes
        .iter()
        .filter(|t| !stats.theme_distribution.contains_key(t.as_str()))
        .map(|t| t.as_str())
        .collect();
    if !missing.is_empty() && !plan.days.is_empty() {
        violations.push(Violation::new(
            ViolationKind::ThemeGap,
            format!("themes never visited: {}", missing.join(", ")),
            None,
            None,
        ));
    }

    check_mandatory(plan, mandatory, &mut violations);

    ValidationReport { violations, stats }
}

fn check_day_overrun(
    day: &DayPlan,
    day_num: usize,
    day_end: f64,
    violations: &mut Vec<Violation>,
    stats: &mut ValidationStats,
) {
    let Some(last) = day.stops.last() else {
        return;
    };
    let end = last.arrival.as_f64();
    if end > day_end + MAX_DAY_OVERRUN_MIN {
        let overrun = end - day_end;
        stats.day_overruns.push(overrun);
        violations.push(Violation::new(
            ViolationKind::DayOverrun,
            format!("day {day_num} ends {overrun:.0} min past the pacing limit"),
            Some(day_num),
            None,
        ));
    }
}

fn check_opening_hours(
    stop: &Stop,
    poi: Option<&Poi>,
    day: &DayPlan,
    day_num: usize,
    violations: &mut Vec<Violation>,
) {
    let windows = match poi {
        Some(p) if !p.open_hours.is_empty() => {
            let parsed = hours::windows_for_date(&p.open_hours, day.date, Window::full_day());
            if parsed.is_empty() {
                violations.push(Violation::new(
                    ViolationKind::PoiClosed,
                    format!(
                        "{} is closed on {}",
                        stop.name,
                        hours::weekday_name(day.date)
                    ),
                    Some(day_num),
                    Some(stop.name.clone()),
                ));
                return;
            }
            parsed
        }
        _ => vec![default_hours(poi)],
    };

    let arrival = stop.arrival.as_f64();
    let depart = stop.depart.as_f64();
    if !windows.iter().any(|w| w.covers(arrival, depart)) {
        violations.push(Violation::new(
            ViolationKind::OutsideHours,
            format!(
                "{} visited {}-{} outside opening hours",
                stop.name, stop.arrival, stop.depart
            ),
            Some(day_num),
            Some(stop.name.clone()),
        ));
    }
}

fn check_mandatory(
    plan: &Plan,
    mandatory: &HashMap<Id, MandatoryVisit>,
    violations: &mut Vec<Violation>,
) {
    for (poi_id, visit) in mandatory {
        let placements: Vec<(usize, &Stop)> = plan
            .days
            .iter()
            .enumerate()
            .flat_map(|(i, d)| d.poi_stops().map(move |s| (i + 1, s)))
            .filter(|(_, s)| &s.base_id == poi_id)
            .collect();

        match placements.as_slice() {
            [] => violations.push(Violation::new(
                ViolationKind::MandatoryDropped,
                format!("mandatory visit {poi_id} missing from the plan"),
                None,
                Some(poi_id.clone()),
            )),
            [(day_num, stop)] => {
                let window = visit.window();
                if *day_num != visit.day as usize || !window.contains(stop.arrival.as_f64()) {
                    violations.push(Violation::new(
                        ViolationKind::MandatoryMisplaced,
                        format!(
                            "mandatory visit {poi_id} scheduled day {day_num} at {}, wanted day {} in {window}",
                            stop.arrival, visit.day
                        ),
                        Some(*day_num),
                        Some(poi_id.clone()),
                    ));
                }
            }
            _ => violations.push(Violation::new(
                ViolationKind::MandatoryMisplaced,
                format!("mandatory visit {poi_id} appears more than once"),
                None,
                Some(poi_id.clone()),
            )),
        }
    }
}
