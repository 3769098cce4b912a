//! CVRPTW solver: one vehicle per day over the built routing problem.
//!
//! The model mirrors a classic routing formulation: arc costs with
//! diversity surcharges, a time dimension with bounded slack, disjunction
//! groups with drop penalties, and a per-day meal dimension. Search is a
//! cheapest-arc construction refined by guided local search under a
//! wall-clock limit.

pub mod model;
pub mod plan;
pub mod search;

use tracing::{info, warn};

use crate::problem::RoutingProblem;
use crate::request::Pacing;

pub use model::{Assignment, RoutingModel, SolverParams};
pub use plan::{DayPlan, OptimizationMethod, Plan, PlanMeta, Stop};

/// Solves the routing problem into a [`Plan`].
///
/// Never fails: structural dead ends (no days, no POIs, unsatisfiable
/// meal minimums) return an empty plan with a diagnostic note so callers
/// can retry with relaxed inputs.
pub fn solve(problem: &RoutingProblem, params: &SolverParams, pacing: Pacing) -> Plan {
    if problem.day_specs.is_empty() {
        return Plan::empty("No days specified");
    }
    if problem.nodes.len() <= 1 {
        return Plan::empty("No POIs available");
    }

    let model = RoutingModel::new(problem, params.clone());
    let assignment = search::solve_assignment(&model);

    if !model.meals_satisfied(&assignment) {
        warn!("daily meal minimum unsatisfiable, returning empty plan");
        return Plan::empty("No feasible solution: daily meal minimum unsatisfiable");
    }

    let dropped_mandatory: Vec<&str> = {
        let visited: std::collections::HashSet<usize> = assignment.visited_nodes().collect();
        model
            .groups
            .iter()
            .filter(|g| g.mandatory && !g.members.iter().any(|m| visited.contains(m)))
            .map(|g| g.base_id.as_str())
            .collect()
    };
    if !dropped_mandatory.is_empty() {
        // Infeasible pins surface through the validator; the plan itself
        // stays usable.
        warn!(?dropped_mandatory, "mandatory visits could not be placed");
    }

    let plan = plan::assemble(&model, &assignment, pacing);
    info!(
        days = plan.days.len(),
        stops = plan.meta.total_stops,
        cost = model.solution_cost(&assignment),
        "cvrptw solved"
    );
    plan
}
