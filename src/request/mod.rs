//! Per-user planning request and its derivations.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::{Coordinates, Role};
use crate::error::PlanError;
use crate::window::{TimeOfDay, Window};
use crate::Id;

/// Default trip length when neither a value nor a date span is given.
pub const DEFAULT_NUM_DAYS: u32 = 3;
/// Upper bound on plannable trip length.
pub const MAX_NUM_DAYS: u32 = 30;

/// Themes used to pad `interest_themes` up to three.
pub const FALLBACK_THEMES: [&str; 3] = ["shopping", "cultural_history", "nature"];

/// Spending preference, mapped to a target catalog price level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetTier {
    Tight,
    #[default]
    Sensible,
    Upscale,
    Luxury,
}

impl BudgetTier {
    pub fn target_price_level(&self) -> u8 {
        match self {
            BudgetTier::Tight => 1,
            BudgetTier::Sensible => 2,
            BudgetTier::Upscale => 3,
            BudgetTier::Luxury => 4,
        }
    }
}

/// Daily intensity: sets the day horizon and per-role service times.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pacing {
    Relaxed,
    #[default]
    Balanced,
    Packed,
}

impl Pacing {
    /// Length of the planning day in minutes.
    pub fn horizon_minutes(&self) -> f64 {
        match self {
            Pacing::Relaxed => 9.0 * 60.0,
            Pacing::Balanced => 11.0 * 60.0,
            Pacing::Packed => 13.0 * 60.0,
        }
    }

    /// The day window: 09:00 plus the pacing horizon.
    pub fn day_window(&self) -> Window {
        let start = 9.0 * 60.0;
        Window::from_minutes(start, start + self.horizon_minutes())
    }

    /// Visit duration in minutes for a POI role.
    pub fn service_minutes(&self, role: Role) -> u32 {
        match (role, self) {
            (Role::Attraction, Pacing::Relaxed) => 120,
            (Role::Attraction, Pacing::Balanced) => 90,
            (Role::Attraction, Pacing::Packed) => 60,
            (Role::Meal, Pacing::Relaxed) => 75,
            (Role::Meal, Pacing::Balanced) => 60,
            (Role::Meal, Pacing::Packed) => 45,
            (Role::Accommodation, _) => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DietaryRestriction {
    Halal,
    Vegan,
    Vegetarian,
}

/// Traveler head counts, used to derive suitability flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Travelers {
    pub adults: u32,
    pub children: u32,
    pub pets: u32,
}

/// Suitability flags steering candidate filters and score dimensions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TravelerFlags {
    pub has_child: bool,
    pub has_pets: bool,
    pub wheelchair_accessible: bool,
    pub is_muslim: bool,
    pub exclude_nightlife: bool,
}

impl TravelerFlags {
    /// Derives the count-based flags from traveler numbers. The remaining
    /// flags stay as explicitly set; explicit wins for those.
    pub fn derived(travelers: &Travelers, explicit: TravelerFlags) -> Self {
        Self {
            has_child: travelers.children > 0,
            has_pets: travelers.pets > 0,
            ..explicit
        }
    }
}

/// A user-pinned visit: a specific day (1-based) and clock window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MandatoryVisit {
    pub day: u32,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl MandatoryVisit {
    pub fn window(&self) -> Window {
        Window::from_minutes(self.start.as_f64(), self.end.as_f64())
    }
}

/// One planning request. See [`crate::planner::Planner::plan`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanRequest {
    pub destination: String,
    #[serde(default)]
    pub num_days: Option<u32>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub budget_tier: BudgetTier,
    #[serde(default)]
    pub pacing: Pacing,
    #[serde(default)]
    pub interest_themes: Vec<String>,
    #[serde(default)]
    pub flags: TravelerFlags,
    #[serde(default)]
    pub dietary_restrictions: Vec<DietaryRestriction>,
    #[serde(default)]
    pub excluded_themes: Vec<String>,
    #[serde(default)]
    pub seed: Option<Coordinates>,
    #[serde(default)]
    pub mandatory: HashMap<Id, MandatoryVisit>,
}

impl PlanRequest {
    /// Trip length: the explicit value, else the date span, else
    /// [`DEFAULT_NUM_DAYS`]; clamped to [`MAX_NUM_DAYS`].
    pub fn resolved_days(&self) -> u32 {
        let days = match (self.num_days, self.start_date, self.end_date) {
            (Some(n), _, _) => n,
            (None, Some(start), Some(end)) => {
                let span = (end - start).num_days() + 1;
                if span > 0 {
                    span as u32
                } else {
                    0
                }
            }
            _ => DEFAULT_NUM_DAYS,
        };
        days.min(MAX_NUM_DAYS)
    }

    /// The three themes driving interest scoring and trim buckets:
    /// `interest_themes` deduplicated, padded from [`FALLBACK_THEMES`].
    pub fn selected_themes(&self) -> [String; 3] {
        let mut themes: Vec<String> = Vec::with_capacity(3);
        for t in &self.interest_themes {
            if themes.len() == 3 {
                break;
            }
            if !themes.contains(t) {
                themes.push(t.clone());
            }
        }
        for f in FALLBACK_THEMES {
            if themes.len() == 3 {
                break;
            }
            if !themes.iter().any(|t| t == f) {
                themes.push(f.to_string());
            }
        }
        [themes[0].clone(), themes[1].clone(), themes[2].clone()]
    }

    /// Checks the request before any oracle call.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.destination.trim().is_empty() {
            return Err(PlanError::InvalidRequest("destination is empty".into()));
        }
        if self.resolved_days() == 0 {
            return Err(PlanError::InvalidRequest(
                "trip resolves to zero days".into(),
            ));
        }
        for (poi_id, visit) in &self.mandatory {
            if visit.day < 1 || visit.day > self.resolved_days() {
                return Err(PlanError::InvalidRequest(format!(
                    "mandatory visit for {poi_id} names day {} outside the trip",
                    visit.day
                )));
            }
            if visit.start >= visit.end {
                return Err(PlanError::InvalidRequest(format!(
                    "mandatory window for {poi_id} is empty ({}-{})",
                    visit.start, visit.end
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_days_prefers_explicit_value() {
        let req = PlanRequest {
            destination: "Singapore".into(),
            num_days: Some(5),
            start_date: NaiveDate::from_ymd_opt(2025, 6, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 6, 3),
            ..Default::default()
        };
        assert_eq!(req.resolved_days(), 5);
    }

    #[test]
    fn resolved_days_from_date_span() {
        let req = PlanRequest {
            destination: "Singapore".into(),
            start_date: NaiveDate::from_ymd_opt(2025, 6, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 6, 10),
            ..Default::default()
        };
        assert_eq!(req.resolved_days(), 10);
    }

    #[test]
    fn resolved_days_defaults_and_clamps() {
        let req = PlanRequest {
            destination: "Singapore".into(),
            ..Default::default()
        };
        assert_eq!(req.resolved_days(), DEFAULT_NUM_DAYS);

        let long = PlanRequest {
            num_days: Some(90),
            ..req
        };
        assert_eq!(long.resolved_days(), MAX_NUM_DAYS);
    }

    #[test]
    fn themes_dedupe_and_pad() {
        let req = PlanRequest {
            interest_themes: vec!["nature".into(), "nature".into()],
            ..Default::default()
        };
        assert_eq!(
            req.selected_themes(),
            ["nature", "shopping", "cultural_history"].map(String::from)
        );
    }

    #[test]
    fn themes_keep_user_order_over_fallback() {
        let req = PlanRequest {
            interest_themes: vec![
                "art_museums".into(),
                "food_culinary".into(),
                "cultural_history".into(),
                "nature".into(),
            ],
            ..Default::default()
        };
        assert_eq!(
            req.selected_themes(),
            ["art_museums", "food_culinary", "cultural_history"].map(String::from)
        );
    }

    #[test]
    fn validation_rejects_empty_destination() {
        let req = PlanRequest::default();
        assert!(matches!(
            req.validate(),
            Err(PlanError::InvalidRequest(_))
        ));
    }

    #[test]
    fn validation_rejects_inverted_date_span() {
        let req = PlanRequest {
            destination: "Singapore".into(),
            start_date: NaiveDate::from_ymd_opt(2025, 6, 10),
            end_date: NaiveDate::from_ymd_opt(2025, 6, 1),
            ..Default::default()
        };
        assert!(matches!(
            req.validate(),
            Err(PlanError::InvalidRequest(_))
        ));
    }

    #[test]
    fn validation_rejects_bad_mandatory_window() {
        let mut req = PlanRequest {
            destination: "Singapore".into(),
            num_days: Some(2),
            ..Default::default()
        };
        req.mandatory.insert(
            "p1".into(),
            MandatoryVisit {
                day: 2,
                start: "16:30".parse().unwrap(),
                end: "15:00".parse().unwrap(),
            },
        );
        assert!(req.validate().is_err());

        req.mandatory.insert(
            "p1".into(),
            MandatoryVisit {
                day: 5,
                start: "15:00".parse().unwrap(),
                end: "16:30".parse().unwrap(),
            },
        );
        assert!(req.validate().is_err());
    }

    #[test]
    fn derived_flags_from_headcounts() {
        let explicit = TravelerFlags {
            is_muslim: true,
            ..Default::default()
        };
        let flags = TravelerFlags::derived(
            &Travelers {
                adults: 2,
                children: 1,
                pets: 0,
            },
            explicit,
        );
        assert!(flags.has_child);
        assert!(!flags.has_pets);
        assert!(flags.is_muslim);
    }

    #[test]
    fn pacing_tables() {
        assert_eq!(Pacing::Relaxed.day_window().to_string(), "09:00-18:00");
        assert_eq!(Pacing::Balanced.day_window().to_string(), "09:00-20:00");
        assert_eq!(Pacing::Packed.day_window().to_string(), "09:00-22:00");
        assert_eq!(Pacing::Packed.service_minutes(Role::Attraction), 60);
        assert_eq!(Pacing::Relaxed.service_minutes(Role::Meal), 75);
        assert_eq!(Pacing::Balanced.service_minutes(Role::Accommodation), 0);
    }
}
