//! Routing model: arc costs, disjunction groups, and route feasibility.

use std::collections::HashMap;
use std::time::Duration;

use crate::problem::RoutingProblem;

/// Tunable solver parameters.
#[derive(Debug, Clone)]
pub struct SolverParams {
    /// Wall-clock budget for the whole solve.
    pub time_limit: Duration,
    /// Longest admissible wait before a stop opens, in minutes.
    pub max_slack_minutes: f64,
    /// Cost of leaving a non-mandatory POI unvisited.
    pub drop_penalty: i64,
    /// Effectively unbounded drop cost for mandatory POIs.
    pub mandatory_drop_penalty: i64,
    /// Arc surcharge between two consecutive meals.
    pub meal_to_meal_penalty: u32,
    /// Arc surcharge between stops sharing a primary theme.
    pub same_theme_penalty: u32,
    /// Hard cap on meals per day.
    pub max_meals_per_day: u32,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(15),
            max_slack_minutes: 120.0,
            drop_penalty: 2000,
            mandatory_drop_penalty: 10_000_000,
            meal_to_meal_penalty: 40,
            same_theme_penalty: 15,
            max_meals_per_day: 3,
        }
    }
}

/// Disjunction group: all day-copies of one base POI, of which at most
/// one may be visited.
#[derive(Debug, Clone)]
pub struct Group {
    pub base_id: String,
    pub members: Vec<usize>,
    pub mandatory: bool,
}

/// One candidate solution: a route of node indices per day, depot
/// excluded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assignment {
    pub routes: Vec<Vec<usize>>,
}

impl Assignment {
    pub fn empty(num_days: usize) -> Self {
        Self {
            routes: vec![Vec::new(); num_days],
        }
    }

    pub fn visited_nodes(&self) -> impl Iterator<Item = usize> + '_ {
        self.routes.iter().flatten().copied()
    }
}

/// Timing of one day's route from forward propagation.
#[derive(Debug, Clone, PartialEq)]
pub struct DayTiming {
    /// Service start per stop, aligned with the route.
    pub starts: Vec<f64>,
    /// Cumulative time back at the depot.
    pub end: f64,
    pub meals: u32,
}

/// The CVRPTW model over a built problem.
pub struct RoutingModel<'a> {
    pub problem: &'a RoutingProblem,
    pub params: SolverParams,
    pub groups: Vec<Group>,
    /// Node index → group index; `None` for the depot.
    pub group_of: Vec<Option<usize>>,
    /// Per-day minimum meal count.
    pub meals_required: Vec<u32>,
}

impl<'a> RoutingModel<'a> {
    pub fn new(problem: &'a RoutingProblem, params: SolverParams) -> Self {
        let mut groups: Vec<Group> = Vec::new();
        let mut by_base: HashMap<&str, usize> = HashMap::new();
        let mut group_of: Vec<Option<usize>> = vec![None; problem.nodes.len()];

        for node in problem.nodes.iter().filter(|n| !n.is_depot()) {
            let gi = *by_base.entry(node.base_id.as_str()).or_insert_with(|| {
                groups.push(Group {
                    base_id: node.base_id.clone(),
                    members: Vec::new(),
                    mandatory: false,
                });
                groups.len() - 1
            });
            groups[gi].members.push(node.idx);
            groups[gi].mandatory |= node.is_mandatory;
            group_of[node.idx] = Some(gi);
        }

        let meals_required = problem
            .day_specs
            .iter()
            .map(|d| problem.meals_available(d.day_index).min(1) as u32)
            .collect();

        Self {
            problem,
            params,
            groups,
            group_of,
            meals_required,
        }
    }

    /// Arc cost from `i` to `j`: transit plus the origin's service time
    /// plus the diversity surcharges.
    pub fn arc_cost(&self, i: usize, j: usize) -> i64 {
        let from = &self.problem.nodes[i];
        let to = &self.problem.nodes[j];
        let mut cost =
            i64::from(self.problem.transit_minutes(i, j)) + i64::from(from.service);
        if from.is_meal() && to.is_meal() {
            cost += i64::from(self.params.meal_to_meal_penalty);
        }
        if let (Some(a), Some(b)) = (&from.theme_primary, &to.theme_primary) {
            if a == b {
                cost += i64::from(self.params.same_theme_penalty);
            }
        }
        cost
    }

    pub fn drop_penalty(&self, group: &Group) -> i64 {
        if group.mandatory {
            self.params.mandatory_drop_penalty
        } else {
            self.params.drop_penalty
        }
    }

    /// Forward time propagation along one day's route.
    ///
    /// The depot departure floats inside the day window, and a wait at a
    /// stop may be absorbed by uniformly delaying every earlier stop (the
    /// cumul-variable semantics of a time dimension with bounded slack).
    /// Returns `None` when any stop misses its window, a wait beyond the
    /// slack cap cannot be absorbed, the meal cap is exceeded, or the
    /// route cannot return to the depot inside the day window. Arrival
    /// must fall at or after the window opening and service must finish
    /// by the closing.
    pub fn evaluate_day(&self, day: usize, route: &[usize]) -> Option<DayTiming> {
        const EPS: f64 = 1e-6;
        let spec = &self.problem.day_specs[day];
        let n = route.len();
        if n == 0 {
            return Some(DayTiming {
                starts: Vec::new(),
                end: spec.start_min(),
                meals: 0,
            });
        }

        let mut windows = Vec::with_capacity(n);
        let mut service = Vec::with_capacity(n);
        let mut meals = 0u32;
        for &ni in route {
            let node = &self.problem.nodes[ni];
            windows.push(node.first_window(day)?);
            service.push(f64::from(node.service));
            if node.is_meal() {
                meals += 1;
                if meals > self.params.max_meals_per_day {
                    return None;
                }
            }
        }

        // Backward pass: latest admissible service start per position.
        let mut latest = vec![0.0; n];
        let last = n - 1;
        latest[last] = (windows[last].close_min() - service[last]).min(
            spec.end_min() - service[last] - f64::from(self.problem.transit_minutes(route[last], 0)),
        );
        for k in (0..last).rev() {
            let gap = service[k] + f64::from(self.problem.transit_minutes(route[k], route[k + 1]));
            latest[k] = (windows[k].close_min() - service[k]).min(latest[k + 1] - gap);
        }

        // Forward pass with uniform prefix delays to absorb long waits.
        let mut starts = vec![0.0; n];
        let mut t = spec.start_min();
        let mut prev = 0usize;
        for k in 0..n {
            let ready = t + f64::from(self.problem.transit_minutes(prev, route[k]));
            let arrival = ready.max(windows[k].open_min());
            if arrival > latest[k] + EPS {
                return None;
            }
            let wait = arrival - ready;
            if wait > self.params.max_slack_minutes && k > 0 {
                let shift = wait - self.params.max_slack_minutes;
                let headroom = (0..k)
                    .map(|j| latest[j] - starts[j])
                    .fold(f64::INFINITY, f64::min);
                if headroom + EPS < shift {
                    return None;
                }
                for start in starts.iter_mut().take(k) {
                    *start += shift;
                }
            }
            starts[k] = arrival;
            t = arrival + service[k];
            prev = route[k];
        }

        let end = t + f64::from(self.problem.transit_minutes(prev, 0));
        if end > spec.end_min() + EPS {
            return None;
        }
        Some(DayTiming { starts, end, meals })
    }

    /// True cost of a day's route: depot out, consecutive arcs, depot back.
    pub fn route_cost(&self, route: &[usize]) -> i64 {
        if route.is_empty() {
            return 0;
        }
        let mut cost = self.arc_cost(0, route[0]);
        for pair in route.windows(2) {
            cost += self.arc_cost(pair[0], pair[1]);
        }
        cost + self.arc_cost(route[route.len() - 1], 0)
    }

    /// Full objective: route costs plus drop penalties for unvisited
    /// groups.
    pub fn solution_cost(&self, assignment: &Assignment) -> i64 {
        let mut visited = vec![false; self.groups.len()];
        for ni in assignment.visited_nodes() {
            if let Some(gi) = self.group_of[ni] {
                visited[gi] = true;
            }
        }
        let routes: i64 = assignment.routes.iter().map(|r| self.route_cost(r)).sum();
        let drops: i64 = self
            .groups
            .iter()
            .zip(&visited)
            .filter(|(_, v)| !**v)
            .map(|(g, _)| self.drop_penalty(g))
            .sum();
        routes + drops
    }

    /// True when every day satisfies its minimum meal count.
    pub fn meals_satisfied(&self, assignment: &Assignment) -> bool {
        assignment.routes.iter().enumerate().all(|(day, route)| {
            let meals = route
                .iter()
                .filter(|&&ni| self.problem.nodes[ni].is_meal())
                .count() as u32;
            meals >= self.meals_required[day]
        })
    }

    /// Feasibility of a whole assignment.
    pub fn feasible(&self, assignment: &Assignment) -> bool {
        assignment
            .routes
            .iter()
            .enumerate()
            .all(|(day, route)| self.evaluate_day(day, route).is_some())
    }
}
