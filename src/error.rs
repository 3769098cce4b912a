//! Error taxonomy for the planning pipeline.
//!
//! Only request validation and catalog I/O surface as `Err`; an infeasible
//! or timed-out solve returns a [`crate::solver::plan::Plan`] with empty
//! days and a diagnostic note, so callers can retry with relaxed pacing
//! without unwinding.

use thiserror::Error;

use crate::catalog::source::CatalogError;

/// Errors returned by [`crate::planner::Planner::plan`].
#[derive(Debug, Error)]
pub enum PlanError {
    /// The request failed validation before any oracle call was made.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The catalog oracle was unreachable or returned a malformed row.
    #[error("catalog source failure: {0}")]
    DataSource(#[from] CatalogError),
}
