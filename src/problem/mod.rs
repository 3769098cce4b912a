//! Translates a selection into a typed routing problem.
//!
//! The builder materialises one [`Node`] per (POI, day) that is both
//! allowed and open, emits one [`DaySpec`] per trip day, and obtains the
//! transit matrix from the travel-time service (falling back to
//! Haversine when the service degrades).

pub mod day;
pub mod node;

use chrono::{Local, NaiveDate};
use tracing::{debug, info};

use crate::catalog::{hours, Coordinates, Poi, Role};
use crate::request::{MandatoryVisit, PlanRequest};
use crate::selector::Selection;
use crate::transit::TravelTimeService;
use crate::window::Window;
use crate::Id;

pub use day::DaySpec;
pub use node::{composite_id, Node, NodeRole};

/// Start/end location for every day's route, typically the chosen hotel.
#[derive(Debug, Clone, PartialEq)]
pub struct DepotSite {
    pub id: Id,
    pub name: String,
    pub coordinates: Coordinates,
}

impl DepotSite {
    /// Depot from a pure-accommodation POI; `None` when it has no
    /// coordinates.
    pub fn from_poi(poi: &Poi) -> Option<Self> {
        poi.coordinates.map(|coordinates| Self {
            id: poi.id.clone(),
            name: poi.name.clone(),
            coordinates,
        })
    }

    /// Synthetic depot at a raw coordinate, used when the catalog offers
    /// no accommodation but the request carries a seed location.
    pub fn at(coordinates: Coordinates) -> Self {
        Self {
            id: "trip-base".to_string(),
            name: "Trip base".to_string(),
            coordinates,
        }
    }
}

/// The typed CVRPTW instance handed to the solver.
#[derive(Debug, Clone)]
pub struct RoutingProblem {
    pub day_specs: Vec<DaySpec>,
    /// Node 0 is the depot.
    pub nodes: Vec<Node>,
    /// Whole-minute transit times, zero diagonal.
    pub transit: Vec<Vec<u32>>,
    /// True when the matrix came from the Haversine fallback.
    pub degraded: bool,
}

impl RoutingProblem {
    pub fn depot(&self) -> &Node {
        &self.nodes[0]
    }

    pub fn transit_minutes(&self, from: usize, to: usize) -> u32 {
        self.transit[from][to]
    }

    /// Meal-node count available on a given day.
    pub fn meals_available(&self, day: usize) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.is_meal() && n.windows_by_day.contains_key(&day))
            .count()
    }
}

/// Default opening window per role, before day-window intersection.
fn role_default_window(role: Role) -> Window {
    match role {
        Role::Attraction => Window::from_minutes(9.0 * 60.0, 19.0 * 60.0),
        Role::Meal => Window::from_minutes(10.0 * 60.0, 22.0 * 60.0),
        Role::Accommodation => Window::full_day(),
    }
}

/// First day of the trip: the explicit start date or today.
fn resolve_start_date(request: &PlanRequest) -> NaiveDate {
    request
        .start_date
        .unwrap_or_else(|| Local::now().date_naive())
}

/// Node role for a multi-role POI: meals win over attractions;
/// accommodation-only POIs are not routed (the depot covers the stay).
fn node_role(poi: &Poi) -> Option<Role> {
    if poi.has_role(Role::Meal) {
        Some(Role::Meal)
    } else if poi.has_role(Role::Attraction) {
        Some(Role::Attraction)
    } else {
        None
    }
}

/// First selected theme present in the POI's themes.
fn primary_theme(poi: &Poi, selected_themes: &[String; 3]) -> Option<String> {
    selected_themes
        .iter()
        .find(|t| poi.has_theme(t))
        .cloned()
}

/// Builds the routing problem for a selection and depot.
pub async fn build(
    selection: &Selection,
    depot: &DepotSite,
    request: &PlanRequest,
    transit: &TravelTimeService,
) -> RoutingProblem {
    let num_days = request.resolved_days() as usize;
    let start = resolve_start_date(request);
    let day_window = request.pacing.day_window();

    let day_specs: Vec<DaySpec> = (0..num_days)
        .map(|k| DaySpec {
            day_index: k,
            date: start + chrono::Duration::days(k as i64),
            window: day_window,
            depot_id: depot.id.clone(),
        })
        .collect();

    let mut nodes: Vec<Node> = Vec::new();
    nodes.push(Node {
        idx: 0,
        poi_id: depot.id.clone(),
        base_id: depot.id.clone(),
        name: depot.name.clone(),
        role: NodeRole::Depot,
        lat: depot.coordinates.lat,
        lon: depot.coordinates.lon,
        service: 0,
        theme_primary: None,
        is_mandatory: false,
        windows_by_day: day_specs
            .iter()
            .map(|d| (d.day_index, vec![d.window]))
            .collect(),
    });

    for scored in &selection.pois {
        let poi = &scored.poi;
        let Some(role) = node_role(poi) else {
            continue;
        };
        let Some(coordinates) = poi.coordinates else {
            continue;
        };
        if poi.id == depot.id {
            continue;
        }

        let mandate = request.mandatory.get(&poi.id);
        let service = request.pacing.service_minutes(role);
        let theme = primary_theme(poi, &selection.selected_themes);
        let mut materialised = 0usize;

        for spec in &day_specs {
            let Some(windows) = day_windows(poi, role, spec, mandate) else {
                continue;
            };
            let idx = nodes.len();
            nodes.push(Node {
                idx,
                poi_id: composite_id(&poi.id, spec.day_index),
                base_id: poi.id.clone(),
                name: poi.name.clone(),
                role: role.into(),
                lat: coordinates.lat,
                lon: coordinates.lon,
                service,
                theme_primary: theme.clone(),
                is_mandatory: mandate.is_some(),
                windows_by_day: [(spec.day_index, windows)].into_iter().collect(),
            });
            materialised += 1;
        }

        if materialised == 0 {
            debug!(poi = %poi.id, "no open day in the trip, POI dropped");
        }
    }

    let coords: Vec<Coordinates> = nodes
        .iter()
        .map(|n| Coordinates {
            lat: n.lat,
            lon: n.lon,
        })
        .collect();
    let matrix = transit.matrix_minutes(&coords).await;
    info!(
        nodes = nodes.len(),
        days = num_days,
        degraded = matrix.degraded,
        "routing problem built"
    );

    RoutingProblem {
        day_specs,
        nodes,
        transit: matrix.minutes,
        degraded: matrix.degraded,
    }
}

/// Usable windows for one (POI, day), `None` when the day is closed or
/// excluded by a mandatory pin.
fn day_windows(
    poi: &Poi,
    role: Role,
    spec: &DaySpec,
    mandate: Option<&MandatoryVisit>,
) -> Option<Vec<Window>> {
    if let Some(visit) = mandate {
        // Pinned visits exist only on their declared day, with the
        // declared window verbatim.
        let bound_day = (visit.day - 1) as usize;
        if spec.day_index != bound_day {
            return None;
        }
        return Some(vec![visit.window()]);
    }

    let default = role_default_window(role).intersection(&spec.window)?;
    let windows = hours::windows_for_date(&poi.open_hours, spec.date, default);
    if windows.is_empty() {
        None
    } else {
        Some(windows)
    }
}
