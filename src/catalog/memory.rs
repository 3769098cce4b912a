//! In-process catalog backed by a plain vector.
//!
//! Mirrors the quota-aware candidate query of the production catalog so the
//! planning pipeline can be exercised hermetically. Filter semantics follow
//! the selector's neutral-bias rule: rows with unknown rating or review
//! counts pass the minimum filters.

use async_trait::async_trait;

use super::source::{CandidateQuery, CatalogError, CatalogSource};
use super::{Poi, Role};
use crate::transit::haversine;

/// Vector-backed [`CatalogSource`] for one destination.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    destination: String,
    pois: Vec<Poi>,
}

impl MemoryCatalog {
    pub fn new(destination: impl Into<String>, pois: Vec<Poi>) -> Self {
        Self {
            destination: destination.into(),
            pois,
        }
    }

    pub fn len(&self) -> usize {
        self.pois.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pois.is_empty()
    }

    fn matches(&self, poi: &Poi, query: &CandidateQuery) -> bool {
        if let Some(rating) = poi.rating {
            if rating < query.min_rating {
                return false;
            }
        }
        if let Some(reviews) = poi.review_count {
            if reviews < query.min_reviews {
                return false;
            }
        }
        if query.halal_only && poi.has_role(Role::Meal) && !poi.attributes.halal_food {
            return false;
        }
        if query.wheelchair_only && !poi.attributes.wheelchair_accessible() {
            return false;
        }
        if poi.themes.iter().any(|t| query.excluded_themes.contains(t)) {
            return false;
        }
        if query.exclude_nightlife && poi.has_theme("nightlife") {
            return false;
        }
        true
    }
}

#[async_trait]
impl CatalogSource for MemoryCatalog {
    async fn fetch_candidates(&self, query: &CandidateQuery) -> Result<Vec<Poi>, CatalogError> {
        if !self
            .destination
            .eq_ignore_ascii_case(query.destination.trim())
        {
            return Ok(Vec::new());
        }

        let mut rows: Vec<&Poi> = self
            .pois
            .iter()
            .filter(|p| self.matches(p, query))
            .collect();

        // Closest-first when a geographic seed is given, best-rated first
        // otherwise.
        if let Some(seed) = query.seed {
            rows.sort_by(|a, b| {
                let da = a
                    .coordinates
                    .map(|c| haversine::distance_km(seed.lat, seed.lon, c.lat, c.lon))
                    .unwrap_or(f64::MAX);
                let db = b
                    .coordinates
                    .map(|c| haversine::distance_km(seed.lat, seed.lon, c.lat, c.lon))
                    .unwrap_or(f64::MAX);
                da.total_cmp(&db)
            });
        } else {
            rows.sort_by(|a, b| {
                b.rating
                    .unwrap_or(0.0)
                    .total_cmp(&a.rating.unwrap_or(0.0))
                    .then(b.review_count.unwrap_or(0).cmp(&a.review_count.unwrap_or(0)))
            });
        }

        // Per-role quotas; a multi-role POI counts against every stream it
        // appears in but is returned once.
        let mut out: Vec<Poi> = Vec::new();
        let mut taken = (0usize, 0usize, 0usize);
        for poi in rows {
            let mut admitted = false;
            if poi.has_role(Role::Attraction) && taken.0 < query.quotas.attraction {
                taken.0 += 1;
                admitted = true;
            }
            if poi.has_role(Role::Meal) && taken.1 < query.quotas.meal {
                taken.1 += 1;
                admitted = true;
            }
            if poi.has_role(Role::Accommodation) && taken.2 < query.quotas.accommodation {
                taken.2 += 1;
                admitted = true;
            }
            if admitted {
                out.push(poi.clone());
            }
        }
        Ok(out)
    }
}
