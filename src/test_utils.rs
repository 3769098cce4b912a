//! Shared fixtures for unit tests.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::catalog::source::{CandidateQuery, RoleQuotas};
use crate::catalog::{Attributes, Coordinates, Poi, Role};
use crate::problem::{composite_id, DaySpec, DepotSite, Node, NodeRole, RoutingProblem};
use crate::selector::{ScoredPoi, Selection};
use crate::transit::haversine;
use crate::window::Window;

/// A Monday, so weekday-keyed opening hours are predictable.
pub fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
}

pub fn themes3(themes: &[&str]) -> [String; 3] {
    [
        themes[0].to_string(),
        themes[1].to_string(),
        themes[2].to_string(),
    ]
}

/// Catalog POI with sane defaults around central Singapore.
pub fn poi(id: &str, roles: &[Role], themes: &[&str]) -> Poi {
    open_poi(id, roles, themes, 1.2950, 103.8530)
}

pub fn poi_at(id: &str, roles: &[Role], lat: f64, lon: f64) -> Poi {
    open_poi(id, roles, &[], lat, lon)
}

pub fn open_poi(id: &str, roles: &[Role], themes: &[&str], lat: f64, lon: f64) -> Poi {
    Poi {
        id: id.to_string(),
        name: id.to_string(),
        roles: roles.to_vec(),
        themes: themes.iter().map(|t| t.to_string()).collect(),
        coordinates: Some(Coordinates { lat, lon }),
        rating: Some(4.2),
        review_count: Some(120),
        price_level: None,
        attributes: Attributes::default(),
        open_hours: Default::default(),
    }
}

pub fn base_query() -> CandidateQuery {
    CandidateQuery {
        destination: "Singapore".to_string(),
        themes: themes3(&["nature", "cultural_history", "shopping"]),
        quotas: RoleQuotas::for_days(3),
        min_rating: 2.0,
        min_reviews: 10,
        halal_only: false,
        wheelchair_only: false,
        excluded_themes: Vec::new(),
        exclude_nightlife: false,
        seed: None,
    }
}

pub fn selection_of(pois: Vec<ScoredPoi>) -> Selection {
    let count = pois.len();
    Selection {
        pois,
        selected_themes: themes3(&["nature", "cultural_history", "shopping"]),
        count_in: count,
        count_out: count,
        hotel: None,
    }
}

pub fn singapore_depot() -> DepotSite {
    DepotSite {
        id: "hotel".to_string(),
        name: "Marina Bay Hotel".to_string(),
        coordinates: Coordinates {
            lat: 1.2903,
            lon: 103.852,
        },
    }
}

// ── hand-built routing problems ───────────────────────────────────────

struct Spot {
    base: &'static str,
    role: NodeRole,
    lat: f64,
    lon: f64,
    service: u32,
    window: Window,
    theme: Option<&'static str>,
    mandatory_day: Option<usize>,
}

fn assemble_problem(spots: &[Spot], num_days: usize, day_window: Window) -> RoutingProblem {
    let depot = singapore_depot();
    let day_specs: Vec<DaySpec> = (0..num_days)
        .map(|k| DaySpec {
            day_index: k,
            date: monday() + chrono::Duration::days(k as i64),
            window: day_window,
            depot_id: depot.id.clone(),
        })
        .collect();

    let mut nodes = vec![Node {
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
        windows_by_day: day_specs.iter().map(|d| (d.day_index, vec![d.window])).collect(),
    }];

    for spot in spots {
        let days: Vec<usize> = match spot.mandatory_day {
            Some(d) => vec![d],
            None => (0..num_days).collect(),
        };
        for day in days {
            let idx = nodes.len();
            let mut windows = BTreeMap::new();
            windows.insert(day, vec![spot.window]);
            nodes.push(Node {
                idx,
                poi_id: composite_id(spot.base, day),
                base_id: spot.base.to_string(),
                name: spot.base.to_string(),
                role: spot.role,
                lat: spot.lat,
                lon: spot.lon,
                service: spot.service,
                theme_primary: spot.theme.map(str::to_string),
                is_mandatory: spot.mandatory_day.is_some(),
                windows_by_day: windows,
            });
        }
    }

    let coords: Vec<(f64, f64)> = nodes.iter().map(|n| (n.lat, n.lon)).collect();
    RoutingProblem {
        day_specs,
        nodes,
        transit: haversine::matrix_minutes(&coords, 25.0),
        degraded: true,
    }
}

const ATTRACTION_WINDOW: Window = Window::from_minutes(9.0 * 60.0, 19.0 * 60.0);
const LUNCH_WINDOW: Window = Window::from_minutes(12.0 * 60.0, 14.0 * 60.0);
const DINNER_WINDOW: Window = Window::from_minutes(18.0 * 60.0, 20.0 * 60.0);

/// Three nearby attractions plus a lunch and a dinner spot, replicated
/// over `num_days` days with a balanced day window. Node order per day
/// copy: a1, a2, a3, m1, m2 (index 0 is the depot; for one day the meal
/// nodes sit at indices 4 and 5).
pub fn tiny_problem(num_days: usize) -> RoutingProblem {
    let spots = [
        Spot {
            base: "a1",
            role: NodeRole::Attraction,
            lat: 1.3000,
            lon: 103.8550,
            service: 90,
            window: ATTRACTION_WINDOW,
            theme: Some("nature"),
            mandatory_day: None,
        },
        Spot {
            base: "a2",
            role: NodeRole::Attraction,
            lat: 1.3050,
            lon: 103.8600,
            service: 90,
            window: ATTRACTION_WINDOW,
            theme: Some("nature"),
            mandatory_day: None,
        },
        Spot {
            base: "a3",
            role: NodeRole::Attraction,
            lat: 1.2950,
            lon: 103.8450,
            service: 90,
            window: ATTRACTION_WINDOW,
            theme: Some("cultural_history"),
            mandatory_day: None,
        },
        Spot {
            base: "m1",
            role: NodeRole::Meal,
            lat: 1.2980,
            lon: 103.8500,
            service: 60,
            window: LUNCH_WINDOW,
            theme: None,
            mandatory_day: None,
        },
        Spot {
            base: "m2",
            role: NodeRole::Meal,
            lat: 1.2930,
            lon: 103.8560,
            service: 60,
            window: DINNER_WINDOW,
            theme: None,
            mandatory_day: None,
        },
    ];
    assemble_problem(&spots, num_days, Window::from_minutes(9.0 * 60.0, 20.0 * 60.0))
}

/// Two-day problem with a mandatory pin on day 2 (index 1) inside
/// 15:00-16:30.
pub fn mandatory_problem() -> RoutingProblem {
    let mut spots = vec![
        Spot {
            base: "a1",
            role: NodeRole::Attraction,
            lat: 1.3000,
            lon: 103.8550,
            service: 90,
            window: ATTRACTION_WINDOW,
            theme: Some("nature"),
            mandatory_day: None,
        },
        Spot {
            base: "a2",
            role: NodeRole::Attraction,
            lat: 1.3050,
            lon: 103.8600,
            service: 90,
            window: ATTRACTION_WINDOW,
            theme: Some("cultural_history"),
            mandatory_day: None,
        },
        Spot {
            base: "m1",
            role: NodeRole::Meal,
            lat: 1.2980,
            lon: 103.8500,
            service: 60,
            window: LUNCH_WINDOW,
            theme: None,
            mandatory_day: None,
        },
        Spot {
            base: "m2",
            role: NodeRole::Meal,
            lat: 1.2930,
            lon: 103.8560,
            service: 60,
            window: LUNCH_WINDOW,
            theme: None,
            mandatory_day: None,
        },
    ];
    spots.push(Spot {
        base: "pin",
        role: NodeRole::Attraction,
        lat: 1.3100,
        lon: 103.8650,
        service: 90,
        window: Window::from_minutes(15.0 * 60.0, 16.5 * 60.0),
        theme: None,
        mandatory_day: Some(1),
    });
    assemble_problem(&spots, 2, Window::from_minutes(9.0 * 60.0, 20.0 * 60.0))
}

/// One packed day with eight scattered attractions and two meals, enough
/// for the refiner to have something to reorder.
pub fn spread_problem() -> RoutingProblem {
    let ring = [
        (1.2700, 103.8200),
        (1.3200, 103.8900),
        (1.2650, 103.8850),
        (1.3150, 103.8150),
        (1.2900, 103.8950),
        (1.3250, 103.8500),
        (1.2600, 103.8500),
        (1.2950, 103.8100),
    ];
    let names = ["s1", "s2", "s3", "s4", "s5", "s6", "s7", "s8"];
    let mut spots: Vec<Spot> = ring
        .iter()
        .zip(names)
        .map(|(&(lat, lon), base)| Spot {
            base,
            role: NodeRole::Attraction,
            lat,
            lon,
            service: 60,
            window: ATTRACTION_WINDOW,
            theme: None,
            mandatory_day: None,
        })
        .collect();
    spots.push(Spot {
        base: "m1",
        role: NodeRole::Meal,
        lat: 1.2920,
        lon: 103.8540,
        service: 45,
        window: LUNCH_WINDOW,
        theme: None,
        mandatory_day: None,
    });
    spots.push(Spot {
        base: "m2",
        role: NodeRole::Meal,
        lat: 1.2890,
        lon: 103.8490,
        service: 45,
        window: Window::from_minutes(18.0 * 60.0, 21.0 * 60.0),
        theme: None,
        mandatory_day: None,
    });
    assemble_problem(&spots, 1, Window::from_minutes(9.0 * 60.0, 22.0 * 60.0))
}
