//! MAUT dimension scores and weight renormalisation.
//!
//! Each candidate earns a utility in `[0, 1]`: the weighted sum of its
//! per-dimension scores, with the base weights L1-renormalised over the
//! dimensions applicable to this traveler and POI.

use crate::catalog::{Poi, Role};
use crate::request::PlanRequest;

/// Scoring dimensions in base-weight order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Interest,
    Cost,
    Popularity,
    Child,
    Dietary,
    Pet,
    Access,
}

const ALL_DIMENSIONS: [Dimension; 7] = [
    Dimension::Interest,
    Dimension::Cost,
    Dimension::Popularity,
    Dimension::Child,
    Dimension::Dietary,
    Dimension::Pet,
    Dimension::Access,
];

fn base_weight(dim: Dimension) -> f64 {
    match dim {
        Dimension::Interest => 0.30,
        Dimension::Cost => 0.20,
        Dimension::Popularity => 0.10,
        Dimension::Child => 0.10,
        Dimension::Dietary => 0.10,
        Dimension::Pet => 0.10,
        Dimension::Access => 0.10,
    }
}

fn applicable(dim: Dimension, request: &PlanRequest, poi: &Poi) -> bool {
    match dim {
        Dimension::Interest | Dimension::Cost | Dimension::Popularity => true,
        Dimension::Child => request.flags.has_child,
        Dimension::Pet => request.flags.has_pets,
        Dimension::Dietary => request.flags.is_muslim && poi.has_role(Role::Meal),
        Dimension::Access => request.flags.wheelchair_accessible,
    }
}

/// Utility of one candidate for this request.
pub fn score_poi(request: &PlanRequest, poi: &Poi, selected_themes: &[String; 3]) -> f64 {
    let dims: Vec<Dimension> = ALL_DIMENSIONS
        .into_iter()
        .filter(|d| applicable(*d, request, poi))
        .collect();
    let total: f64 = dims.iter().map(|d| base_weight(*d)).sum();
    if total <= 0.0 {
        return 0.0;
    }

    dims.iter()
        .map(|d| base_weight(*d) / total * dimension_score(*d, request, poi, selected_themes))
        .sum()
}

fn dimension_score(
    dim: Dimension,
    request: &PlanRequest,
    poi: &Poi,
    selected_themes: &[String; 3],
) -> f64 {
    match dim {
        Dimension::Interest => interest_score(poi, selected_themes),
        Dimension::Cost => cost_score(poi.price_level, request.budget_tier.target_price_level()),
        Dimension::Popularity => popularity_score(poi.rating, poi.review_count),
        Dimension::Child => bool_score(poi.attributes.kids_friendly),
        Dimension::Pet => bool_score(poi.attributes.pets_friendly),
        Dimension::Access => bool_score(poi.attributes.wheelchair_accessible()),
        Dimension::Dietary => dietary_score(request, poi),
    }
}

/// Theme overlap with the three selected themes; pure attractions only.
pub fn interest_score(poi: &Poi, selected_themes: &[String; 3]) -> f64 {
    if !poi.is_pure_attraction() {
        return 0.0;
    }
    let hits = selected_themes.iter().filter(|t| poi.has_theme(t)).count();
    hits as f64 / 3.0
}

/// Alignment between a price level and the budget target. An unknown
/// price is neutral-favourable.
pub fn cost_score(price_level: Option<u8>, target: u8) -> f64 {
    match price_level {
        None => 1.0,
        Some(level) => {
            let dist = (f64::from(level) - f64::from(target)).abs();
            (1.0 - dist / 3.0).max(0.0)
        }
    }
}

/// Rating blended with a log-scaled review count (saturating near 1k).
pub fn popularity_score(rating: Option<f64>, review_count: Option<u32>) -> f64 {
    let r = rating.map(|v| (v / 5.0).clamp(0.0, 1.0)).unwrap_or(0.0);
    match review_count {
        None | Some(0) => 0.5 * r,
        Some(n) => {
            let rc = ((1.0 + f64::from(n)).log10() / 3.0).min(1.0);
            0.7 * r + 0.3 * rc
        }
    }
}

fn bool_score(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}

/// 1.0 when any declared restriction is satisfied, 0.5 when none are
/// declared, else 0.0.
pub fn dietary_score(request: &PlanRequest, poi: &Poi) -> f64 {
    use crate::request::DietaryRestriction as D;
    if request.dietary_restrictions.is_empty() {
        return 0.5;
    }
    let a = &poi.attributes;
    let satisfied = request.dietary_restrictions.iter().any(|r| match r {
        D::Halal => a.halal_food,
        D::Vegan => a.vegan_options,
        D::Vegetarian => a.vegetarian_options || a.vegan_options,
    });
    bool_score(satisfied)
}
