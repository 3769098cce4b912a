//! Solver search: cheapest-arc construction and guided local search.
//!
//! The first solution extends each day's route with the cheapest feasible
//! arc, after seeding mandatory visits into their bound days, then repairs
//! short meal counts. The improvement phase runs relocate / 2-opt /
//! reinsert / drop moves under the wall-clock limit; when no move improves
//! the augmented objective, the most expensive frequently-used arcs are
//! penalized and the search continues (guided local search).

use std::collections::HashMap;
use std::time::Instant;

use super::model::{Assignment, RoutingModel};

/// Arc-penalty weight in the augmented objective.
fn gls_lambda(model: &RoutingModel<'_>) -> i64 {
    (model.params.drop_penalty / 100).max(1)
}

/// Runs construction and improvement within the model's time limit.
pub fn solve_assignment(model: &RoutingModel<'_>) -> Assignment {
    let deadline = Instant::now() + model.params.time_limit;
    let mut assignment = construct(model);
    improve(model, &mut assignment, deadline);
    separate_meals(model, &mut assignment);
    assignment
}

/// Group usage bitmap for an assignment.
fn used_groups(model: &RoutingModel<'_>, assignment: &Assignment) -> Vec<bool> {
    let mut used = vec![false; model.groups.len()];
    for ni in assignment.visited_nodes() {
        if let Some(gi) = model.group_of[ni] {
            used[gi] = true;
        }
    }
    used
}

/// Cheapest feasible insertion position for `node` in `route`, with its
/// true-cost delta.
fn best_insertion(
    model: &RoutingModel<'_>,
    route: &[usize],
    day: usize,
    node: usize,
) -> Option<(usize, i64)> {
    let base = model.route_cost(route);
    let mut best: Option<(usize, i64)> = None;
    for pos in 0..=route.len() {
        let mut candidate = route.to_vec();
        candidate.insert(pos, node);
        if model.evaluate_day(day, &candidate).is_none() {
            continue;
        }
        let delta = model.route_cost(&candidate) - base;
        if best.map_or(true, |(_, d)| delta < d) {
            best = Some((pos, delta));
        }
    }
    best
}

/// Builds the first solution.
pub fn construct(model: &RoutingModel<'_>) -> Assignment {
    let num_days = model.problem.day_specs.len();
    let mut assignment = Assignment::empty(num_days);
    let mut used = vec![false; model.groups.len()];

    // Mandatory visits first, into their bound day.
    for (gi, group) in model.groups.iter().enumerate() {
        if !group.mandatory {
            continue;
        }
        'members: for &ni in &group.members {
            let days: Vec<usize> = model.problem.nodes[ni].available_days().collect();
            for day in days {
                if let Some((pos, _)) = best_insertion(model, &assignment.routes[day], day, ni) {
                    assignment.routes[day].insert(pos, ni);
                    used[gi] = true;
                    break 'members;
                }
            }
        }
    }

    // Path-cheapest-arc extension, one day at a time. A meal directly
    // after a meal is considered only when nothing else fits.
    for day in 0..num_days {
        loop {
            let current = *assignment.routes[day].last().unwrap_or(&0);
            let after_meal = model.problem.nodes[current].is_meal();
            let mut best: Option<(i64, usize)> = None;
            let mut best_meal: Option<(i64, usize)> = None;
            for node in model.problem.nodes.iter().filter(|n| !n.is_depot()) {
                let Some(gi) = model.group_of[node.idx] else {
                    continue;
                };
                if used[gi] || !node.windows_by_day.contains_key(&day) {
                    continue;
                }
                let arc = model.arc_cost(current, node.idx);
                let slot = if after_meal && node.is_meal() {
                    &mut best_meal
                } else {
                    &mut best
                };
                if slot.is_some_and(|(c, _)| c <= arc) {
                    continue;
                }
                let mut candidate = assignment.routes[day].clone();
                candidate.push(node.idx);
                if model.evaluate_day(day, &candidate).is_some() {
                    *slot = Some((arc, node.idx));
                }
            }
            match best.or(best_meal) {
                Some((_, ni)) => {
                    assignment.routes[day].push(ni);
                    used[model.group_of[ni].expect("POI node has a group")] = true;
                }
                None => break,
            }
        }
    }

    repair_meals(model, &mut assignment, &mut used);
    assignment
}

/// Meal count of one route.
fn meal_count(model: &RoutingModel<'_>, route: &[usize]) -> u32 {
    route
        .iter()
        .filter(|&&ni| model.problem.nodes[ni].is_meal())
        .count() as u32
}

/// Inserts meals until every day reaches its minimum: fresh groups
/// first, then a surplus meal borrowed from another day, then eviction
/// of a cheap stop to free room.
fn repair_meals(model: &RoutingModel<'_>, assignment: &mut Assignment, used: &mut [bool]) {
    for day in 0..assignment.routes.len() {
        let mut evictions = assignment.routes[day].len() + 1;
        while meal_count(model, &assignment.routes[day]) < model.meals_required[day] {
            let candidate = model
                .problem
                .nodes
                .iter()
                .filter(|n| n.is_meal() && n.windows_by_day.contains_key(&day))
                .filter(|n| model.group_of[n.idx].is_some_and(|gi| !used[gi]))
                .filter_map(|n| {
                    best_insertion(model, &assignment.routes[day], day, n.idx)
                        .map(|(pos, delta)| (delta, pos, n.idx))
                })
                .min_by_key(|&(delta, _, _)| delta);

            if let Some((_, pos, ni)) = candidate {
                assignment.routes[day].insert(pos, ni);
                used[model.group_of[ni].expect("meal node has a group")] = true;
                continue;
            }

            if steal_surplus_meal(model, assignment, day) {
                continue;
            }

            // Nothing fits; free up room by dropping a cheap stop.
            if evictions == 0 {
                break;
            }
            evictions -= 1;
            let victim = assignment.routes[day]
                .iter()
                .enumerate()
                .filter(|(_, &ni)| {
                    let n = &model.problem.nodes[ni];
                    !n.is_mandatory && !n.is_meal()
                })
                .map(|(pos, &ni)| {
                    let mut shorter = assignment.routes[day].clone();
                    shorter.remove(pos);
                    let gain =
                        model.route_cost(&assignment.routes[day]) - model.route_cost(&shorter);
                    (gain, pos, ni)
                })
                .max_by_key(|&(gain, _, _)| gain);
            match victim {
                Some((_, pos, ni)) => {
                    assignment.routes[day].remove(pos);
                    used[model.group_of[ni].expect("POI node has a group")] = false;
                }
                None => break,
            }
        }
    }
}

/// Moves a meal from a day holding more than its minimum onto `day`,
/// switching to the sibling day-copy of the same POI. Returns true on
/// success.
fn steal_surplus_meal(model: &RoutingModel<'_>, assignment: &mut Assignment, day: usize) -> bool {
    for other in 0..assignment.routes.len() {
        if other == day
            || meal_count(model, &assignment.routes[other]) <= model.meals_required[other]
        {
            continue;
        }
        for pos in 0..assignment.routes[other].len() {
            let ni = assignment.routes[other][pos];
            let node = &model.problem.nodes[ni];
            if !node.is_meal() || node.is_mandatory {
                continue;
            }
            let mut shorter = assignment.routes[other].clone();
            shorter.remove(pos);
            if model.evaluate_day(other, &shorter).is_none() {
                continue;
            }
            let gi = model.group_of[ni].expect("meal node has a group");
            for &member in &model.groups[gi].members {
                if !model.problem.nodes[member].windows_by_day.contains_key(&day) {
                    continue;
                }
                if let Some((ins, _)) = best_insertion(model, &assignment.routes[day], day, member)
                {
                    assignment.routes[other] = shorter;
                    assignment.routes[day].insert(ins, member);
                    return true;
                }
            }
        }
    }
    false
}

/// Breaks up back-to-back meals left over by the search: the second meal
/// is re-seated at a non-adjacent position, moved to a sibling day-copy,
/// or dropped when the day holds more meals than required.
fn separate_meals(model: &RoutingModel<'_>, assignment: &mut Assignment) {
    for day in 0..assignment.routes.len() {
        let mut guard = assignment.routes[day].len() + 1;
        while let Some(pos) = first_meal_adjacency(model, &assignment.routes[day]) {
            if guard == 0 {
                break;
            }
            guard -= 1;
            let ni = assignment.routes[day][pos];
            let mut rest = assignment.routes[day].clone();
            rest.remove(pos);

            // Same day, away from other meals.
            if let Some(ins) = meal_safe_insertion(model, &rest, day, ni) {
                let mut fixed = rest.clone();
                fixed.insert(ins, ni);
                assignment.routes[day] = fixed;
                continue;
            }

            // Another day via a sibling copy.
            let gi = model.group_of[ni].expect("meal node has a group");
            let mut moved = false;
            if model.evaluate_day(day, &rest).is_some() {
                'siblings: for &member in &model.groups[gi].members {
                    for (&other, _) in model.problem.nodes[member].windows_by_day.iter() {
                        if other == day {
                            continue;
                        }
                        if meal_count(model, &assignment.routes[other])
                            >= model.params.max_meals_per_day
                        {
                            continue;
                        }
                        if let Some(ins) =
                            meal_safe_insertion(model, &assignment.routes[other], other, member)
                        {
                            assignment.routes[day] = rest.clone();
                            assignment.routes[other].insert(ins, member);
                            moved = true;
                            break 'siblings;
                        }
                    }
                }
            }
            if moved {
                continue;
            }

            // Drop the surplus meal outright when the minimum still holds.
            if meal_count(model, &rest) >= model.meals_required[day]
                && model.evaluate_day(day, &rest).is_some()
            {
                assignment.routes[day] = rest;
                continue;
            }
            break;
        }
    }
}

/// Position of the second meal of the first back-to-back meal pair.
fn first_meal_adjacency(model: &RoutingModel<'_>, route: &[usize]) -> Option<usize> {
    route
        .windows(2)
        .position(|pair| {
            model.problem.nodes[pair[0]].is_meal() && model.problem.nodes[pair[1]].is_meal()
        })
        .map(|i| i + 1)
}

/// Cheapest feasible insertion that does not seat the meal next to
/// another meal.
fn meal_safe_insertion(
    model: &RoutingModel<'_>,
    route: &[usize],
    day: usize,
    node: usize,
) -> Option<usize> {
    let base = model.route_cost(route);
    let mut best: Option<(i64, usize)> = None;
    for pos in 0..=route.len() {
        let next_to_meal = (pos > 0 && model.problem.nodes[route[pos - 1]].is_meal())
            || (pos < route.len() && model.problem.nodes[route[pos]].is_meal());
        if next_to_meal {
            continue;
        }
        let mut candidate = route.to_vec();
        candidate.insert(pos, node);
        if model.evaluate_day(day, &candidate).is_none() {
            continue;
        }
        let delta = model.route_cost(&candidate) - base;
        if best.map_or(true, |(d, _)| delta < d) {
            best = Some((delta, pos));
        }
    }
    best.map(|(_, pos)| pos)
}

type ArcKey = (usize, usize);

/// Arcs of one route including the depot legs.
fn route_arcs(route: &[usize]) -> Vec<ArcKey> {
    if route.is_empty() {
        return Vec::new();
    }
    let mut arcs = Vec::with_capacity(route.len() + 1);
    arcs.push((0, route[0]));
    for pair in route.windows(2) {
        arcs.push((pair[0], pair[1]));
    }
    arcs.push((route[route.len() - 1], 0));
    arcs
}

fn augmented_cost(
    model: &RoutingModel<'_>,
    assignment: &Assignment,
    penalties: &HashMap<ArcKey, i64>,
    lambda: i64,
) -> i64 {
    let mut cost = model.solution_cost(assignment);
    for route in &assignment.routes {
        for arc in route_arcs(route) {
            if let Some(p) = penalties.get(&arc) {
                cost += lambda * p;
            }
        }
    }
    cost
}

/// Guided local search until the deadline; leaves the best true-cost
/// solution in `assignment`.
pub fn improve(model: &RoutingModel<'_>, assignment: &mut Assignment, deadline: Instant) {
    let lambda = gls_lambda(model);
    let mut penalties: HashMap<ArcKey, i64> = HashMap::new();
    let mut best = assignment.clone();
    let mut best_cost = model.solution_cost(assignment);

    while Instant::now() < deadline {
        if apply_first_improving(model, assignment, &penalties, lambda, deadline) {
            let cost = model.solution_cost(assignment);
            if cost < best_cost {
                best_cost = cost;
                best = assignment.clone();
            }
        } else {
            if !penalize(model, assignment, &mut penalties) {
                break;
            }
        }
    }
    *assignment = best;
}

/// Scans the neighborhood; applies the first move improving the augmented
/// objective. Returns false when no move improves.
fn apply_first_improving(
    model: &RoutingModel<'_>,
    assignment: &mut Assignment,
    penalties: &HashMap<ArcKey, i64>,
    lambda: i64,
    deadline: Instant,
) -> bool {
    let current = augmented_cost(model, assignment, penalties, lambda);
    let num_days = assignment.routes.len();
    let used = used_groups(model, assignment);

    // Relocate: move a stop elsewhere, possibly switching to a sibling
    // day-copy of the same POI.
    for day in 0..num_days {
        for pos in 0..assignment.routes[day].len() {
            if Instant::now() >= deadline {
                return false;
            }
            let ni = assignment.routes[day][pos];
            let gi = model.group_of[ni].expect("POI node has a group");
            for &member in &model.groups[gi].members {
                for (target, _) in model.problem.nodes[member].windows_by_day.iter() {
                    let target = *target;
                    if target == day && member == ni {
                        continue;
                    }
                    let mut candidate = assignment.clone();
                    candidate.routes[day].remove(pos);
                    let route = candidate.routes[target].clone();
                    if let Some((ins, _)) = best_insertion(model, &route, target, member) {
                        candidate.routes[target].insert(ins, member);
                        if model.feasible(&candidate)
                            && augmented_cost(model, &candidate, penalties, lambda) < current
                        {
                            *assignment = candidate;
                            return true;
                        }
                    }
                }
            }
        }
    }

    // Intra-day 2-opt: reverse a segment.
    for day in 0..num_days {
        let len = assignment.routes[day].len();
        for i in 0..len {
            for j in (i + 1)..len {
                if Instant::now() >= deadline {
                    return false;
                }
                let mut candidate = assignment.clone();
                candidate.routes[day][i..=j].reverse();
                if model.evaluate_day(day, &candidate.routes[day]).is_some()
                    && augmented_cost(model, &candidate, penalties, lambda) < current
                {
                    *assignment = candidate;
                    return true;
                }
            }
        }
    }

    // Reinsert a dropped group when the drop penalty exceeds the
    // insertion cost.
    for (gi, group) in model.groups.iter().enumerate() {
        if used[gi] {
            continue;
        }
        for &member in &group.members {
            for (&day, _) in model.problem.nodes[member].windows_by_day.iter() {
                if Instant::now() >= deadline {
                    return false;
                }
                if let Some((pos, _)) = best_insertion(model, &assignment.routes[day], day, member)
                {
                    let mut candidate = assignment.clone();
                    candidate.routes[day].insert(pos, member);
                    if meal_count(model, &candidate.routes[day])
                        <= model.params.max_meals_per_day
                        && augmented_cost(model, &candidate, penalties, lambda) < current
                    {
                        *assignment = candidate;
                        return true;
                    }
                }
            }
        }
    }

    // Drop a stop when its removal gain beats the drop penalty.
    for day in 0..num_days {
        for pos in 0..assignment.routes[day].len() {
            let ni = assignment.routes[day][pos];
            let node = &model.problem.nodes[ni];
            if node.is_mandatory {
                continue;
            }
            let mut candidate = assignment.clone();
            candidate.routes[day].remove(pos);
            if meal_count(model, &candidate.routes[day]) < model.meals_required[day]
                || model.evaluate_day(day, &candidate.routes[day]).is_none()
            {
                continue;
            }
            if augmented_cost(model, &candidate, penalties, lambda) < current {
                *assignment = candidate;
                return true;
            }
        }
    }

    false
}

/// Increments the penalty of the highest-utility arcs of the current
/// solution. Returns false when the solution has no arcs to penalize.
fn penalize(
    model: &RoutingModel<'_>,
    assignment: &Assignment,
    penalties: &mut HashMap<ArcKey, i64>,
) -> bool {
    let mut max_utility = 0f64;
    let mut targets: Vec<ArcKey> = Vec::new();
    for route in &assignment.routes {
        for arc in route_arcs(route) {
            let cost = model.arc_cost(arc.0, arc.1) as f64;
            let utility = cost / (1.0 + *penalties.get(&arc).unwrap_or(&0) as f64);
            if utility > max_utility {
                max_utility = utility;
                targets = vec![arc];
            } else if utility == max_utility && utility > 0.0 {
                targets.push(arc);
            }
        }
    }
    if targets.is_empty() {
        return false;
    }
    for arc in targets {
        *penalties.entry(arc).or_insert(0) += 1;
    }
    true
}
