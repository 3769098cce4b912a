//! Intra-day route refinement with ant-colony re-sequencing.
//!
//! Each day's non-depot stops are re-sequenced to shorten the route
//! without changing the day's POI set. A reorder is adopted only when it
//! survives time re-propagation against the problem's windows and does
//! not lengthen the route; otherwise the day keeps its solver order, so
//! refinement never degrades a plan.

pub mod colony;

use std::collections::HashMap;

use tracing::{debug, info};

use crate::problem::RoutingProblem;
use crate::solver::model::{RoutingModel, SolverParams};
use crate::solver::plan::{OptimizationMethod, Plan, Stop};
use crate::transit::haversine;
use crate::window::TimeOfDay;

pub use colony::{AcoConfig, AntColony};

/// Path length (depot → stops → depot) on the flat coordinate plane used
/// by the colony.
fn path_length(depot: (f64, f64), order: &[(f64, f64)]) -> f64 {
    let mut total = 0.0;
    let mut prev = depot;
    for &p in order {
        total += ((prev.0 - p.0).powi(2) + (prev.1 - p.1).powi(2)).sqrt();
        prev = p;
    }
    total + ((prev.0 - depot.0).powi(2) + (prev.1 - depot.1).powi(2)).sqrt()
}

/// Great-circle path length in km, the metric reported to callers and
/// used for the adoption gate.
fn path_km(depot: (f64, f64), order: &[(f64, f64)]) -> f64 {
    let mut total = 0.0;
    let mut prev = depot;
    for &p in order {
        total += haversine::distance_km(prev.0, prev.1, p.0, p.1);
        prev = p;
    }
    total + haversine::distance_km(prev.0, prev.1, depot.0, depot.1)
}

/// Rotations and reversals of a closed tour, evaluated as depot-anchored
/// paths; returns the cheapest ordering of indices.
fn best_anchoring(tour: &[usize], depot: (f64, f64), points: &[(f64, f64)]) -> Vec<usize> {
    let n = tour.len();
    let mut best: Option<(f64, Vec<usize>)> = None;
    for rotation in 0..n {
        for reversed in [false, true] {
            let mut order: Vec<usize> = (0..n).map(|k| tour[(rotation + k) % n]).collect();
            if reversed {
                order.reverse();
            }
            let coords: Vec<(f64, f64)> = order.iter().map(|&i| points[i]).collect();
            let length = path_length(depot, &coords);
            if best.as_ref().map_or(true, |(l, _)| length < *l) {
                best = Some((length, order));
            }
        }
    }
    best.expect("tour is non-empty").1
}

fn has_consecutive_meals(model: &RoutingModel<'_>, route: &[usize]) -> bool {
    route.windows(2).any(|pair| {
        model.problem.nodes[pair[0]].is_meal() && model.problem.nodes[pair[1]].is_meal()
    })
}

/// Refines every day of a plan in place. `seed` pins the colony RNG for
/// reproducible runs.
pub fn refine_plan(
    plan: &mut Plan,
    problem: &RoutingProblem,
    params: &SolverParams,
    config: &AcoConfig,
    seed: Option<u64>,
) {
    let model = RoutingModel::new(problem, params.clone());
    let by_id: HashMap<&str, usize> = problem
        .nodes
        .iter()
        .map(|n| (n.poi_id.as_str(), n.idx))
        .collect();

    for (day_index, day) in plan.days.iter_mut().enumerate() {
        let route: Vec<usize> = day
            .poi_stops()
            .filter_map(|s| by_id.get(s.poi_id.as_str()).copied())
            .collect();
        if route.len() <= 2 || route.len() != day.poi_stops().count() {
            continue;
        }

        let depot = (problem.depot().lat, problem.depot().lon);
        let points: Vec<(f64, f64)> = route
            .iter()
            .map(|&ni| (problem.nodes[ni].lat, problem.nodes[ni].lon))
            .collect();

        let mut colony = match seed {
            Some(s) => AntColony::with_seed(
                colony::euclidean_matrix(&points),
                config.clone(),
                s.wrapping_add(day_index as u64),
            ),
            None => AntColony::new(colony::euclidean_matrix(&points), config.clone()),
        };
        let (tour, _) = colony.optimize();
        let order = best_anchoring(&tour, depot, &points);
        let candidate: Vec<usize> = order.iter().map(|&k| route[k]).collect();
        if candidate == route {
            continue;
        }

        // Adopt only when the reorder stays schedulable and no longer
        // than the solver's ordering.
        let old_coords: Vec<(f64, f64)> = route
            .iter()
            .map(|&ni| (problem.nodes[ni].lat, problem.nodes[ni].lon))
            .collect();
        let new_coords: Vec<(f64, f64)> = candidate
            .iter()
            .map(|&ni| (problem.nodes[ni].lat, problem.nodes[ni].lon))
            .collect();
        if path_km(depot, &new_coords) > path_km(depot, &old_coords) {
            continue;
        }
        if has_consecutive_meals(&model, &candidate) && !has_consecutive_meals(&model, &route) {
            continue;
        }
        let Some(timing) = model.evaluate_day(day_index, &candidate) else {
            debug!(day = day_index, "reorder infeasible, keeping solver order");
            continue;
        };

        // Rewrite the day's stops between the depot brackets with the
        // re-propagated times.
        let mut stops: Vec<Stop> = Vec::with_capacity(candidate.len() + 2);
        let lead_departure = match candidate.first() {
            Some(&first) => {
                let transit = f64::from(problem.transit_minutes(0, first));
                (timing.starts[0] - transit).max(problem.day_specs[day_index].start_min())
            }
            None => problem.day_specs[day_index].start_min(),
        };
        let mut lead = day.stops.first().expect("day has depot brackets").clone();
        let t = TimeOfDay::from_minutes(lead_departure);
        lead.arrival = t;
        lead.start_service = t;
        lead.depart = t;
        stops.push(lead);

        for (k, &ni) in candidate.iter().enumerate() {
            let node = &problem.nodes[ni];
            let original = day
                .poi_stops()
                .find(|s| s.poi_id == node.poi_id)
                .expect("stop exists for routed node");
            let arrival = TimeOfDay::from_minutes(timing.starts[k]);
            let depart = TimeOfDay::from_minutes(timing.starts[k] + f64::from(node.service));
            let mut stop = original.clone();
            stop.arrival = arrival;
            stop.start_service = arrival;
            stop.depart = depart;
            stops.push(stop);
        }

        let mut tail = day.stops.last().expect("day has depot brackets").clone();
        let t = TimeOfDay::from_minutes(timing.end);
        tail.arrival = t;
        tail.start_service = t;
        tail.depart = t;
        stops.push(tail);

        day.stops = stops;
        day.method = OptimizationMethod::CvrptwAco;
        info!(day = day_index, "day re-sequenced by ant colony");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Pacing;
    use crate::solver;
    use crate::test_utils::spread_problem;
    use std::collections::HashSet;
    use std::time::Duration;

    fn fast_params() -> SolverParams {
        SolverParams {
            time_limit: Duration::from_millis(200),
            ..SolverParams::default()
        }
    }

    fn day_length_km(problem: &RoutingProblem, day: &crate::solver::DayPlan) -> f64 {
        let depot = (problem.depot().lat, problem.depot().lon);
        let coords: Vec<(f64, f64)> = day.poi_stops().map(|s| (s.lat, s.lon)).collect();
        path_km(depot, &coords)
    }

    #[test]
    fn refine_preserves_stop_sets_and_never_lengthens() {
        let problem = spread_problem();
        let params = fast_params();
        let plan = solver::solve(&problem, &params, Pacing::Packed);
        assert!(!plan.is_empty());

        let mut refined = plan.clone();
        refine_plan(
            &mut refined,
            &problem,
            &params,
            &AcoConfig::default(),
            Some(9),
        );

        for (before, after) in plan.days.iter().zip(&refined.days) {
            let ids_before: HashSet<_> = before.poi_stops().map(|s| s.poi_id.clone()).collect();
            let ids_after: HashSet<_> = after.poi_stops().map(|s| s.poi_id.clone()).collect();
            assert_eq!(ids_before, ids_after);
            assert_eq!(before.poi_stops().count(), after.poi_stops().count());
            assert!(
                day_length_km(&problem, after)
                    <= day_length_km(&problem, before) + 1e-9
            );
            assert!(after.stops.first().unwrap().is_depot());
            assert!(after.stops.last().unwrap().is_depot());
        }
    }

    #[test]
    fn refine_is_idempotent_on_distance() {
        let problem = spread_problem();
        let params = fast_params();
        let mut plan = solver::solve(&problem, &params, Pacing::Packed);
        refine_plan(&mut plan, &problem, &params, &AcoConfig::default(), Some(9));
        let once: Vec<f64> = plan
            .days
            .iter()
            .map(|d| day_length_km(&problem, d))
            .collect();

        refine_plan(&mut plan, &problem, &params, &AcoConfig::default(), Some(9));
        let twice: Vec<f64> = plan
            .days
            .iter()
            .map(|d| day_length_km(&problem, d))
            .collect();
        for (a, b) in once.iter().zip(&twice) {
            assert!(b <= &(a + 1e-9));
        }
    }

    #[test]
    fn short_days_pass_through_unchanged() {
        let problem = spread_problem();
        let params = fast_params();
        let mut plan = solver::solve(&problem, &params, Pacing::Packed);
        // Truncate a day to two stops plus brackets and refine again.
        let day = &mut plan.days[0];
        while day.poi_stops().count() > 2 {
            let pos = day
                .stops
                .iter()
                .position(|s| !s.is_depot())
                .expect("has poi stop");
            day.stops.remove(pos);
        }
        let before = plan.days[0].clone();
        refine_plan(&mut plan, &problem, &params, &AcoConfig::default(), Some(9));
        assert_eq!(before.stops, plan.days[0].stops);
        assert_eq!(before.method, plan.days[0].method);
    }
}
