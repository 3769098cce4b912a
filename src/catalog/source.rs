//! Catalog oracle seam.

use async_trait::async_trait;
use thiserror::Error;

use super::{Coordinates, Poi};

/// Errors raised by a catalog oracle.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog unreachable: {0}")]
    Unreachable(String),

    #[error("catalog query timed out")]
    Timeout,

    #[error("malformed catalog row: {0}")]
    MalformedRow(String),
}

/// Per-role candidate quotas, a function of trip length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleQuotas {
    pub attraction: usize,
    pub meal: usize,
    pub accommodation: usize,
}

impl RoleQuotas {
    /// Quotas for a trip of `num_days` days.
    pub fn for_days(num_days: u32) -> Self {
        let d = num_days.max(1) as usize;
        Self {
            attraction: (12 * d).min(300),
            meal: (5 * d).min(50),
            accommodation: (d + 5).min(15),
        }
    }
}

/// Candidate-fetch parameters handed to the oracle.
///
/// The oracle may over-return; the selector enforces the quotas again.
#[derive(Debug, Clone)]
pub struct CandidateQuery {
    pub destination: String,
    pub themes: [String; 3],
    pub quotas: RoleQuotas,
    pub min_rating: f64,
    pub min_reviews: u32,
    pub halal_only: bool,
    pub wheelchair_only: bool,
    pub excluded_themes: Vec<String>,
    pub exclude_nightlife: bool,
    pub seed: Option<Coordinates>,
}

/// Read-only catalog oracle.
///
/// Implementations own their connection pooling; a query must honor the
/// caller's deadline and surface [`CatalogError::Timeout`] when it cannot.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_candidates(&self, query: &CandidateQuery) -> Result<Vec<Poi>, CatalogError>;
}
