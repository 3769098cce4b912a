//! Pipeline orchestration: selection, problem build, solve, refinement.

use std::sync::Arc;

use tracing::{info, info_span, warn, Instrument};

use crate::catalog::source::CatalogSource;
use crate::config::Settings;
use crate::error::PlanError;
use crate::problem::{self, DepotSite};
use crate::refine::{self, AcoConfig};
use crate::request::PlanRequest;
use crate::selector;
use crate::solver::{self, Plan, SolverParams};
use crate::transit::TravelTimeService;

/// The planning pipeline behind a single entry point.
///
/// A `Planner` is cheap to share across request workers: each call to
/// [`plan`](Planner::plan) owns its selection, problem, and solver state,
/// while the catalog and travel-time clients are process-wide.
pub struct Planner<C> {
    catalog: C,
    transit: Arc<TravelTimeService>,
    solver_params: SolverParams,
    aco: AcoConfig,
    refine: bool,
}

impl<C: CatalogSource> Planner<C> {
    pub fn new(catalog: C, settings: &Settings) -> Self {
        Self {
            catalog,
            transit: Arc::new(TravelTimeService::new(settings)),
            solver_params: SolverParams::default(),
            aco: AcoConfig::default(),
            refine: true,
        }
    }

    pub fn with_solver_params(mut self, params: SolverParams) -> Self {
        self.solver_params = params;
        self
    }

    pub fn with_aco_config(mut self, config: AcoConfig) -> Self {
        self.aco = config;
        self
    }

    /// Disables the ACO refinement stage; days keep their solver order.
    pub fn without_refinement(mut self) -> Self {
        self.refine = false;
        self
    }

    pub fn transit(&self) -> &TravelTimeService {
        &self.transit
    }

    /// Plans an itinerary for one request.
    ///
    /// `Err` means the request was invalid or the catalog failed;
    /// infeasible or timed-out solves come back as an empty plan with a
    /// note so the caller can retry with relaxed pacing.
    pub async fn plan(&self, request: &PlanRequest) -> Result<Plan, PlanError> {
        request.validate()?;
        let plan_id = crate::generate_id();
        let span = info_span!("plan", id = %plan_id, destination = %request.destination);
        self.run_pipeline(request).instrument(span).await
    }

    async fn run_pipeline(&self, request: &PlanRequest) -> Result<Plan, PlanError> {
        let selection = selector::select(&self.catalog, request).await?;

        let depot = match &selection.hotel {
            Some(hotel) => DepotSite::from_poi(hotel),
            None => request.seed.map(DepotSite::at),
        };
        let Some(depot) = depot else {
            warn!("no accommodation selected and no seed location given");
            return Ok(Plan::empty(
                "No depot available: no accommodation selected and no seed location",
            ));
        };
        info!(depot = %depot.name, "depot resolved");

        let problem = problem::build(&selection, &depot, request, &self.transit).await;
        let mut plan = solver::solve(&problem, &self.solver_params, request.pacing);
        if plan.is_empty() {
            return Ok(plan);
        }

        if self.refine {
            refine::refine_plan(&mut plan, &problem, &self.solver_params, &self.aco, None);
        }

        self.fill_distances(&mut plan).await;
        info!(
            days = plan.days.len(),
            stops = plan.meta.total_stops,
            total_km = plan.meta.total_distance_km,
            "plan complete"
        );
        Ok(plan)
    }

    /// Computes per-day and total distances with the travel-time service.
    async fn fill_distances(&self, plan: &mut Plan) {
        let mut total = 0.0;
        for day in &mut plan.days {
            let mut day_total = 0.0;
            for pair in day.stops.windows(2) {
                let from = crate::catalog::Coordinates {
                    lat: pair[0].lat,
                    lon: pair[0].lon,
                };
                let to = crate::catalog::Coordinates {
                    lat: pair[1].lat,
                    lon: pair[1].lon,
                };
                day_total += self.transit.distance_km(from, to).await;
            }
            day.total_distance_km = (day_total * 100.0).round() / 100.0;
            total += day.total_distance_km;
        }
        plan.meta.total_distance_km = (total * 100.0).round() / 100.0;
    }
}
