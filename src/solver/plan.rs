//! Plan DTOs and solution assembly.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::problem::{NodeRole, RoutingProblem};
use crate::request::Pacing;
use crate::window::TimeOfDay;
use crate::Id;

use super::model::{Assignment, RoutingModel};

/// How a day's ordering was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizationMethod {
    #[serde(rename = "cvrptw")]
    Cvrptw,
    #[serde(rename = "cvrptw+aco")]
    CvrptwAco,
}

/// One scheduled visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    /// Composite id of the routed node (`<base>#day<k>`), the depot keeps
    /// its plain id.
    pub poi_id: Id,
    pub base_id: Id,
    pub name: String,
    pub role: NodeRole,
    pub arrival: TimeOfDay,
    pub start_service: TimeOfDay,
    pub depart: TimeOfDay,
    pub lat: f64,
    pub lon: f64,
}

impl Stop {
    pub fn is_depot(&self) -> bool {
        self.role == NodeRole::Depot
    }
}

/// One scheduled day. The first and last stop are depot visits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub date: NaiveDate,
    pub stops: Vec<Stop>,
    pub meals: u32,
    pub total_distance_km: f64,
    pub method: OptimizationMethod,
}

impl DayPlan {
    /// Stops excluding the depot brackets.
    pub fn poi_stops(&self) -> impl Iterator<Item = &Stop> {
        self.stops.iter().filter(|s| !s.is_depot())
    }
}

/// Aggregate plan metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanMeta {
    pub total_distance_km: f64,
    pub total_stops: usize,
    /// True when travel times came from the Haversine fallback.
    pub degraded_transit: bool,
    pub pacing: Pacing,
}

/// The planner's output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: Id,
    pub days: Vec<DayPlan>,
    /// Diagnostic note when the plan is empty or degraded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub meta: PlanMeta,
}

impl Plan {
    /// An empty plan with a diagnostic note (infeasible or timed-out
    /// solves end here, per the error-propagation contract).
    pub fn empty(note: impl Into<String>) -> Self {
        Self {
            id: crate::generate_id(),
            days: Vec::new(),
            note: Some(note.into()),
            meta: PlanMeta::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// Emits the plan for a solved assignment.
///
/// Every day is bracketed by a leading depot stop at the route departure
/// and a trailing depot stop at the route end; POI stops carry
/// `arrival = start_service` and `depart = arrival + service`.
pub fn assemble(model: &RoutingModel<'_>, assignment: &Assignment, pacing: Pacing) -> Plan {
    let problem: &RoutingProblem = model.problem;
    let depot = problem.depot();
    let mut days = Vec::with_capacity(problem.day_specs.len());
    let mut total_stops = 0usize;

    for spec in &problem.day_specs {
        let route = &assignment.routes[spec.day_index];
        let timing = model
            .evaluate_day(spec.day_index, route)
            .expect("solved assignment must stay feasible");

        let departure = match route.first() {
            Some(&first) => {
                let transit = f64::from(problem.transit_minutes(0, first));
                (timing.starts[0] - transit).max(spec.start_min())
            }
            None => spec.start_min(),
        };

        let mut stops = Vec::with_capacity(route.len() + 2);
        stops.push(depot_stop(problem, departure));
        for (k, &ni) in route.iter().enumerate() {
            let node = &problem.nodes[ni];
            let arrival = TimeOfDay::from_minutes(timing.starts[k]);
            let depart = TimeOfDay::from_minutes(timing.starts[k] + f64::from(node.service));
            stops.push(Stop {
                poi_id: node.poi_id.clone(),
                base_id: node.base_id.clone(),
                name: node.name.clone(),
                role: node.role,
                arrival,
                start_service: arrival,
                depart,
                lat: node.lat,
                lon: node.lon,
            });
        }
        stops.push(depot_stop(problem, timing.end));
        total_stops += route.len();

        days.push(DayPlan {
            date: spec.date,
            stops,
            meals: timing.meals,
            total_distance_km: 0.0,
            method: OptimizationMethod::Cvrptw,
        });
    }

    Plan {
        id: crate::generate_id(),
        days,
        note: None,
        meta: PlanMeta {
            total_distance_km: 0.0,
            total_stops,
            degraded_transit: problem.degraded,
            pacing,
        },
    }
}

fn depot_stop(problem: &RoutingProblem, minute: f64) -> Stop {
    let depot = problem.depot();
    let t = TimeOfDay::from_minutes(minute);
    Stop {
        poi_id: depot.poi_id.clone(),
        base_id: depot.base_id.clone(),
        name: depot.name.clone(),
        role: NodeRole::Depot,
        arrival: t,
        start_service: t,
        depart: t,
        lat: depot.lat,
        lon: depot.lon,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::model::SolverParams;
    use crate::test_utils::tiny_problem;

    #[test]
    fn assemble_brackets_days_with_depot_stops() {
        let problem = tiny_problem(1);
        let model = RoutingModel::new(&problem, SolverParams::default());
        let assignment = Assignment {
            routes: vec![vec![1, 4]], // attraction, then lunch
        };
        let plan = assemble(&model, &assignment, Pacing::Balanced);

        assert_eq!(plan.days.len(), 1);
        let day = &plan.days[0];
        assert_eq!(day.stops.len(), 4);
        assert!(day.stops.first().unwrap().is_depot());
        assert!(day.stops.last().unwrap().is_depot());
        assert_eq!(day.meals, 1);
        assert_eq!(day.poi_stops().count(), 2);
        assert_eq!(plan.meta.total_stops, 2);
    }

    #[test]
    fn stop_times_follow_service_duration() {
        let problem = tiny_problem(1);
        let model = RoutingModel::new(&problem, SolverParams::default());
        let assignment = Assignment {
            routes: vec![vec![4]], // lunch only
        };
        let plan = assemble(&model, &assignment, Pacing::Balanced);
        let lunch = &plan.days[0].stops[1];
        assert_eq!(lunch.arrival.to_string(), "12:00");
        assert_eq!(lunch.start_service, lunch.arrival);
        assert_eq!(lunch.depart.to_string(), "13:00");

        // Leading depot stop departs just in time for the window.
        let out = &plan.days[0].stops[0];
        assert!(out.depart <= lunch.arrival);
        assert!(out.depart.minutes() >= 9 * 60);
    }

    #[test]
    fn empty_plan_carries_note() {
        let plan = Plan::empty("No POIs available");
        assert!(plan.is_empty());
        assert_eq!(plan.note.as_deref(), Some("No POIs available"));
        assert!(!plan.id.is_empty());
    }

    #[test]
    fn plan_serializes_times_as_clock_strings() {
        let problem = tiny_problem(1);
        let model = RoutingModel::new(&problem, SolverParams::default());
        let assignment = Assignment {
            routes: vec![vec![4]],
        };
        let plan = assemble(&model, &assignment, Pacing::Balanced);
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["days"][0]["stops"][1]["arrival"], "12:00");
        assert_eq!(json["days"][0]["stops"][1]["role"], "meal");
    }
}
