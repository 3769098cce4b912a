//! Quota- and theme-balanced trimming of scored candidates.

use std::collections::HashSet;

use crate::catalog::source::RoleQuotas;
use crate::catalog::{Poi, Role};

use super::ScoredPoi;

/// Result of the trim pass.
pub struct TrimOutcome {
    /// Kept candidates, highest score first.
    pub pois: Vec<ScoredPoi>,
    /// Top-scored pure accommodation, the depot candidate.
    pub hotel: Option<Poi>,
}

/// Trims scored candidates to the role quotas.
///
/// Accommodation and meal streams are greedy by score. The attraction
/// quota is split into three buckets aligned with the selected themes
/// (floor plus remainder spread left to right); each bucket takes the
/// best-scored attractions carrying its theme, and leftover quota is
/// topped up from the global attraction ranking. A POI is kept at most
/// once even when it appears in several role streams.
pub fn trim(
    mut scored: Vec<ScoredPoi>,
    selected_themes: &[String; 3],
    quotas: RoleQuotas,
) -> TrimOutcome {
    // Deterministic order: score descending, id as tie-break.
    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.poi.id.cmp(&b.poi.id))
    });

    let mut kept: Vec<ScoredPoi> = Vec::new();
    let mut taken: HashSet<String> = HashSet::new();

    let hotel = scored
        .iter()
        .find(|s| s.poi.is_pure_accommodation())
        .map(|s| s.poi.clone());

    let mut keep = |candidate: &ScoredPoi, kept: &mut Vec<ScoredPoi>| {
        if taken.insert(candidate.poi.id.clone()) {
            kept.push(candidate.clone());
            true
        } else {
            false
        }
    };

    // Accommodation, then meals, greedy by score.
    for role_and_quota in [
        (Role::Accommodation, quotas.accommodation),
        (Role::Meal, quotas.meal),
    ] {
        let (role, quota) = role_and_quota;
        let mut count = 0;
        for candidate in scored.iter().filter(|s| s.poi.has_role(role)) {
            if count == quota {
                break;
            }
            if keep(candidate, &mut kept) {
                count += 1;
            }
        }
    }

    // Attractions: three theme buckets, then a global top-up.
    let attractions: Vec<&ScoredPoi> = scored
        .iter()
        .filter(|s| s.poi.has_role(Role::Attraction))
        .collect();
    let buckets = split_quota(quotas.attraction);
    let mut attraction_count = 0;

    for (theme, bucket) in selected_themes.iter().zip(buckets) {
        let mut count = 0;
        for candidate in attractions.iter().filter(|s| s.poi.has_theme(theme)) {
            if count == bucket {
                break;
            }
            if keep(candidate, &mut kept) {
                count += 1;
                attraction_count += 1;
            }
        }
    }
    for candidate in &attractions {
        if attraction_count == quotas.attraction {
            break;
        }
        if keep(candidate, &mut kept) {
            attraction_count += 1;
        }
    }

    kept.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.poi.id.cmp(&b.poi.id))
    });

    TrimOutcome { pois: kept, hotel }
}

/// Splits a quota into three buckets: floor, with the remainder spread
/// left to right.
fn split_quota(quota: usize) -> [usize; 3] {
    let base = quota / 3;
    let remainder = quota % 3;
    let mut buckets = [base; 3];
    for bucket in buckets.iter_mut().take(remainder) {
        *bucket += 1;
    }
    buckets
}
