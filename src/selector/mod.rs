//! MAUT candidate selection.
//!
//! Fetches role-quota-aware candidates from the catalog oracle, scores
//! each with the multi-attribute utility of [`score`], and trims by role
//! and theme balance in [`trim`].

pub mod score;
pub mod trim;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::source::{CandidateQuery, CatalogSource, RoleQuotas};
use crate::catalog::Poi;
use crate::error::PlanError;
use crate::request::PlanRequest;

/// A candidate POI with its utility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPoi {
    pub poi: Poi,
    pub score: f64,
}

/// Output of the selection stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Selection {
    /// Trimmed candidates, highest score first.
    pub pois: Vec<ScoredPoi>,
    pub selected_themes: [String; 3],
    /// Candidates returned by the oracle.
    pub count_in: usize,
    /// Candidates surviving the trim.
    pub count_out: usize,
    /// Depot candidate: the top-scored pure accommodation, if any.
    pub hotel: Option<Poi>,
}

impl Selection {
    /// A well-formed empty selection for a barren catalog.
    pub fn empty(selected_themes: [String; 3]) -> Self {
        Self {
            pois: Vec::new(),
            selected_themes,
            count_in: 0,
            count_out: 0,
            hotel: None,
        }
    }
}

/// Builds the oracle query for a request.
pub fn candidate_query(request: &PlanRequest) -> CandidateQuery {
    CandidateQuery {
        destination: request.destination.clone(),
        themes: request.selected_themes(),
        quotas: RoleQuotas::for_days(request.resolved_days()),
        min_rating: 2.0,
        min_reviews: 10,
        halal_only: request.flags.is_muslim,
        wheelchair_only: request.flags.wheelchair_accessible,
        excluded_themes: request.excluded_themes.clone(),
        exclude_nightlife: request.flags.exclude_nightlife,
        seed: request.seed,
    }
}

/// Runs the selection stage.
///
/// Business shortfalls (no candidates, no hotel) yield an empty but
/// well-formed [`Selection`]; only oracle I/O failures surface as `Err`.
pub async fn select<C: CatalogSource>(
    catalog: &C,
    request: &PlanRequest,
) -> Result<Selection, PlanError> {
    let selected_themes = request.selected_themes();
    let query = candidate_query(request);

    let rows = catalog.fetch_candidates(&query).await?;
    let count_in = rows.len();
    debug!(count_in, "catalog candidates fetched");

    // Rows without coordinates cannot be routed; drop them up front.
    let scored: Vec<ScoredPoi> = rows
        .into_iter()
        .filter(|p| p.coordinates.is_some())
        .map(|poi| {
            let score = score::score_poi(request, &poi, &selected_themes);
            ScoredPoi { poi, score }
        })
        .collect();

    if scored.is_empty() {
        info!("no usable candidates; returning empty selection");
        return Ok(Selection::empty(selected_themes));
    }

    let outcome = trim::trim(scored, &selected_themes, query.quotas);
    let count_out = outcome.pois.len();
    info!(count_in, count_out, "selection trimmed");

    Ok(Selection {
        pois: outcome.pois,
        selected_themes,
        count_in,
        count_out,
        hotel: outcome.hotel,
    })
}
