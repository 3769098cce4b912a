//! End-to-end pipeline scenarios over an in-process catalog with the
//! driving-graph service disabled.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::NaiveDate;

use itinera::catalog::memory::MemoryCatalog;
use itinera::catalog::{Attributes, Coordinates, Poi, Role};
use itinera::config::Settings;
use itinera::planner::Planner;
use itinera::problem::{self, DepotSite};
use itinera::refine::{self, AcoConfig};
use itinera::request::{MandatoryVisit, Pacing, PlanRequest};
use itinera::selector;
use itinera::solver::{self, Plan, SolverParams};
use itinera::transit::{haversine, TravelTimeService};
use itinera::validate;
use itinera::PlanError;

const DEPOT: Coordinates = Coordinates {
    lat: 1.2903,
    lon: 103.852,
};

fn fixture_poi(id: &str, roles: &[Role], themes: &[&str], lat: f64, lon: f64) -> Poi {
    Poi {
        id: id.to_string(),
        name: id.to_string(),
        roles: roles.to_vec(),
        themes: themes.iter().map(|t| t.to_string()).collect(),
        coordinates: Some(Coordinates { lat, lon }),
        rating: Some(4.3),
        review_count: Some(250),
        price_level: Some(2),
        attributes: Attributes::default(),
        open_hours: HashMap::new(),
    }
}

fn with_hours(mut poi: Poi, label: &str, days: &[&str]) -> Poi {
    for day in days {
        poi.open_hours
            .insert(day.to_string(), vec![label.to_string()]);
    }
    poi
}

const ALL_DAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

fn fast_params() -> SolverParams {
    SolverParams {
        time_limit: Duration::from_millis(200),
        ..SolverParams::default()
    }
}

fn planner_for(catalog: MemoryCatalog) -> Planner<MemoryCatalog> {
    let settings = Settings {
        use_osrm: false,
        ..Settings::default()
    };
    Planner::new(catalog, &settings).with_solver_params(fast_params())
}

fn base_request(days: u32) -> PlanRequest {
    PlanRequest {
        destination: "Singapore".into(),
        num_days: Some(days),
        start_date: NaiveDate::from_ymd_opt(2025, 6, 2), // a Monday
        pacing: Pacing::Balanced,
        interest_themes: vec!["nature".into(), "cultural_history".into()],
        seed: Some(DEPOT),
        ..Default::default()
    }
}

fn assert_plan_invariants(plan: &Plan) {
    let mut bases = HashSet::new();
    for day in &plan.days {
        let first = day.stops.first().expect("day has stops");
        let last = day.stops.last().expect("day has stops");
        assert!(first.is_depot(), "day must start at the depot");
        assert!(last.is_depot(), "day must end at the depot");
        assert!(day.meals <= 3);

        for stop in &day.stops {
            assert!(stop.arrival <= stop.depart);
            assert!(stop.depart.minutes() <= 25 * 60);
        }
        for pair in day.stops.windows(2) {
            assert!(pair[0].depart <= pair[1].arrival);
        }
        for stop in day.poi_stops() {
            assert!(
                bases.insert(stop.base_id.clone()),
                "{} visited twice",
                stop.base_id
            );
        }
    }
}

// ── scenario 1: singleton day ─────────────────────────────────────────

#[tokio::test]
async fn singleton_day_schedules_all_three_stops() {
    let catalog = MemoryCatalog::new(
        "Singapore",
        vec![
            with_hours(
                fixture_poi("garden", &[Role::Attraction], &["nature"], 1.3000, 103.8550),
                "9 am-6 pm",
                &ALL_DAYS,
            ),
            with_hours(
                fixture_poi(
                    "museum",
                    &[Role::Attraction],
                    &["cultural_history"],
                    1.3050,
                    103.8600,
                ),
                "9 am-6 pm",
                &ALL_DAYS,
            ),
            with_hours(
                fixture_poi("kopitiam", &[Role::Meal], &[], 1.2980, 103.8500),
                "12 pm-2 pm",
                &ALL_DAYS,
            ),
        ],
    );

    let plan = planner_for(catalog).plan(&base_request(1)).await.unwrap();
    assert_eq!(plan.days.len(), 1);
    assert_plan_invariants(&plan);

    let day = &plan.days[0];
    assert_eq!(day.poi_stops().count(), 3);
    assert_eq!(day.meals, 1);

    let meal = day
        .poi_stops()
        .find(|s| s.base_id == "kopitiam")
        .expect("meal scheduled");
    assert!(meal.arrival.minutes() >= 12 * 60);
    assert!(meal.arrival.minutes() <= 14 * 60);
}

// ── scenario 2: closed on the trip day ────────────────────────────────

#[tokio::test]
async fn weekday_only_poi_is_dropped_on_saturday() {
    let weekdays = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"];
    let mut weekday_poi = with_hours(
        fixture_poi(
            "weekday-hall",
            &[Role::Attraction],
            &["cultural_history"],
            1.3000,
            103.8550,
        ),
        "9 am-6 pm",
        &weekdays,
    );
    weekday_poi = with_hours(weekday_poi, "closed", &["Saturday", "Sunday"]);

    let catalog = MemoryCatalog::new(
        "Singapore",
        vec![
            weekday_poi,
            fixture_poi("park", &[Role::Attraction], &["nature"], 1.3050, 103.8600),
            fixture_poi("hawker", &[Role::Meal], &[], 1.2980, 103.8500),
        ],
    );

    let mut request = base_request(1);
    request.start_date = NaiveDate::from_ymd_opt(2025, 6, 7); // a Saturday
    let plan = planner_for(catalog).plan(&request).await.unwrap();

    assert!(!plan.is_empty());
    assert_plan_invariants(&plan);
    assert!(
        plan.days
            .iter()
            .flat_map(|d| d.poi_stops())
            .all(|s| s.base_id != "weekday-hall"),
        "closed POI must not be visited"
    );
}

// ── scenario 3: mandatory visit ───────────────────────────────────────

#[tokio::test]
async fn mandatory_visit_lands_on_its_day_and_window() {
    let catalog = MemoryCatalog::new(
        "Singapore",
        vec![
            fixture_poi("pin", &[Role::Attraction], &["cultural_history"], 1.3100, 103.8650),
            fixture_poi("park", &[Role::Attraction], &["nature"], 1.3000, 103.8550),
            fixture_poi("museum", &[Role::Attraction], &["cultural_history"], 1.3050, 103.8600),
            fixture_poi("hawker", &[Role::Meal], &[], 1.2980, 103.8500),
            fixture_poi("bistro", &[Role::Meal], &[], 1.2930, 103.8560),
        ],
    );

    let mut request = base_request(2);
    request.mandatory.insert(
        "pin".into(),
        MandatoryVisit {
            day: 2,
            start: "15:00".parse().unwrap(),
            end: "16:30".parse().unwrap(),
        },
    );

    let plan = planner_for(catalog).plan(&request).await.unwrap();
    assert_eq!(plan.days.len(), 2);
    assert_plan_invariants(&plan);

    let day2_pins: Vec<_> = plan.days[1]
        .poi_stops()
        .filter(|s| s.base_id == "pin")
        .collect();
    assert_eq!(day2_pins.len(), 1, "pin must land on day 2");
    let pin = day2_pins[0];
    assert!(pin.arrival.minutes() >= 15 * 60);
    assert!(pin.arrival.minutes() <= 16 * 60 + 30);
    assert!(plan.days[0].poi_stops().all(|s| s.base_id != "pin"));
}

// ── scenario 4: no meals anywhere ─────────────────────────────────────

#[tokio::test]
async fn zero_meal_catalog_still_plans_days() {
    let catalog = MemoryCatalog::new(
        "Singapore",
        vec![
            fixture_poi("hotel", &[Role::Accommodation], &[], 1.2903, 103.852),
            fixture_poi("park", &[Role::Attraction], &["nature"], 1.3000, 103.8550),
            fixture_poi("museum", &[Role::Attraction], &["cultural_history"], 1.3050, 103.8600),
        ],
    );

    let plan = planner_for(catalog).plan(&base_request(1)).await.unwrap();
    assert!(!plan.is_empty(), "note: {:?}", plan.note);
    assert_plan_invariants(&plan);
    assert!(plan.days.iter().all(|d| d.meals == 0));
    assert!(plan.days[0].poi_stops().count() >= 1);
}

// ── scenario 5: refinement improves or ties ───────────────────────────

fn euclid_path_km(depot: Coordinates, stops: &[(f64, f64)]) -> f64 {
    let mut total = 0.0;
    let mut prev = (depot.lat, depot.lon);
    for &p in stops {
        total += haversine::distance_km(prev.0, prev.1, p.0, p.1);
        prev = p;
    }
    total + haversine::distance_km(prev.0, prev.1, depot.lat, depot.lon)
}

fn plan_distance(plan: &Plan) -> f64 {
    plan.days
        .iter()
        .map(|d| {
            let coords: Vec<(f64, f64)> = d.poi_stops().map(|s| (s.lat, s.lon)).collect();
            euclid_path_km(DEPOT, &coords)
        })
        .sum()
}

#[tokio::test]
async fn refinement_never_lengthens_the_route() {
    // A scattered one-day layout with enough stops to reorder.
    let mut pois = vec![
        fixture_poi("lunch", &[Role::Meal], &[], 1.2920, 103.8540),
        fixture_poi("dinner", &[Role::Meal], &[], 1.2890, 103.8490),
    ];
    let ring = [
        (1.2800, 103.8400),
        (1.3050, 103.8700),
        (1.2750, 103.8650),
        (1.3080, 103.8350),
        (1.2850, 103.8750),
        (1.3120, 103.8550),
        (1.2700, 103.8500),
        (1.2980, 103.8300),
        (1.3150, 103.8450),
        (1.2760, 103.8330),
        (1.3020, 103.8780),
        (1.2880, 103.8680),
    ];
    for (i, &(lat, lon)) in ring.iter().enumerate() {
        pois.push(fixture_poi(
            &format!("spot{i}"),
            &[Role::Attraction],
            &["nature"],
            lat,
            lon,
        ));
    }
    let catalog = MemoryCatalog::new("Singapore", pois);

    let mut request = base_request(1);
    request.pacing = Pacing::Packed;

    let transit = TravelTimeService::disabled();
    let selection = selector::select(&catalog, &request).await.unwrap();
    let depot = DepotSite::at(DEPOT);
    let problem = problem::build(&selection, &depot, &request, &transit).await;

    let params = fast_params();
    let base_plan = solver::solve(&problem, &params, request.pacing);
    assert!(!base_plan.is_empty());
    assert!(base_plan.meta.total_stops >= 8, "got {}", base_plan.meta.total_stops);

    let mut refined = base_plan.clone();
    refine::refine_plan(&mut refined, &problem, &params, &AcoConfig::default(), Some(17));

    let d0 = plan_distance(&base_plan);
    let d1 = plan_distance(&refined);
    assert!(d1 <= d0 + 1e-9, "refined {d1} vs solver {d0}");
    assert!(d1 <= 1.2 * d0 + 1e-9);
    assert_plan_invariants(&refined);

    for (before, after) in base_plan.days.iter().zip(&refined.days) {
        let b: HashSet<_> = before.poi_stops().map(|s| s.poi_id.clone()).collect();
        let a: HashSet<_> = after.poi_stops().map(|s| s.poi_id.clone()).collect();
        assert_eq!(b, a, "refinement must only reorder");
    }
}

// ── scenario 6: transit fallback consistency ──────────────────────────

#[tokio::test]
async fn fallback_distances_match_haversine_reference() {
    let catalog = MemoryCatalog::new(
        "Singapore",
        vec![
            fixture_poi("hotel", &[Role::Accommodation], &[], 1.2903, 103.852),
            fixture_poi("park", &[Role::Attraction], &["nature"], 1.3000, 103.8550),
            fixture_poi("museum", &[Role::Attraction], &["cultural_history"], 1.3050, 103.8600),
            fixture_poi("hawker", &[Role::Meal], &[], 1.2980, 103.8500),
        ],
    );

    let plan = planner_for(catalog).plan(&base_request(1)).await.unwrap();
    assert!(!plan.is_empty());
    assert!(plan.meta.degraded_transit);

    for day in &plan.days {
        let mut reference = 0.0;
        for pair in day.stops.windows(2) {
            reference +=
                haversine::distance_km(pair[0].lat, pair[0].lon, pair[1].lat, pair[1].lon);
        }
        assert!(
            (day.total_distance_km - reference).abs() < 0.1,
            "reported {} vs reference {}",
            day.total_distance_km,
            reference
        );
    }
}

// ── laws ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn quota_monotonicity_over_trip_length() {
    let pois: Vec<Poi> = (0..80)
        .map(|i| {
            fixture_poi(
                &format!("a{i}"),
                &[Role::Attraction],
                &["nature"],
                1.28 + (i as f64) * 0.001,
                103.84 + (i as f64) * 0.001,
            )
        })
        .collect();
    let catalog = MemoryCatalog::new("Singapore", pois);

    let mut last = 0;
    for days in [1u32, 2, 4, 6] {
        let selection = selector::select(&catalog, &base_request(days)).await.unwrap();
        assert!(selection.count_out >= last);
        last = selection.count_out;
    }
}

#[tokio::test]
async fn theme_selection_is_a_pure_function_of_interests() {
    let catalog = MemoryCatalog::new("Singapore", vec![]);
    let mut request = base_request(2);
    request.interest_themes = vec!["food_culinary".into(), "food_culinary".into()];

    let a = selector::select(&catalog, &request).await.unwrap();
    let b = selector::select(&catalog, &request).await.unwrap();
    assert_eq!(a.selected_themes, b.selected_themes);
    assert_eq!(
        a.selected_themes,
        ["food_culinary", "shopping", "cultural_history"].map(String::from)
    );
}

// ── full pipeline audit ───────────────────────────────────────────────

#[tokio::test]
async fn multi_day_plan_passes_the_validator() {
    itinera::config::init_tracing();
    let mut pois = vec![fixture_poi("hotel", &[Role::Accommodation], &[], 1.2903, 103.852)];
    let spots = [
        ("garden", "nature", 1.3000, 103.8550),
        ("reserve", "nature", 1.3100, 103.8650),
        ("museum", "cultural_history", 1.3050, 103.8600),
        ("heritage", "cultural_history", 1.2950, 103.8450),
        ("mall", "shopping", 1.3040, 103.8330),
        ("bazaar", "shopping", 1.2850, 103.8440),
    ];
    for (id, theme, lat, lon) in spots {
        pois.push(fixture_poi(id, &[Role::Attraction], &[theme], lat, lon));
    }
    for i in 0..5 {
        pois.push(fixture_poi(
            &format!("meal{i}"),
            &[Role::Meal],
            &[],
            1.2900 + i as f64 * 0.004,
            103.8480 + i as f64 * 0.004,
        ));
    }
    let catalog = MemoryCatalog::new("Singapore", pois);

    let request = PlanRequest {
        interest_themes: vec!["nature".into(), "cultural_history".into(), "shopping".into()],
        ..base_request(2)
    };
    let selection = selector::select(&catalog, &request).await.unwrap();
    let plan = planner_for(catalog).plan(&request).await.unwrap();
    assert!(!plan.is_empty(), "note: {:?}", plan.note);
    assert_plan_invariants(&plan);

    let report = validate::validate_plan(&plan, &selection, request.pacing, &request.mandatory);
    let errors: Vec<_> = report.errors().collect();
    assert!(errors.is_empty(), "errors: {errors:?}");
    assert!(report.stats.total_meals >= plan.days.len() as u32);
}

// ── error taxonomy ────────────────────────────────────────────────────

#[tokio::test]
async fn invalid_requests_fail_fast() {
    let planner = planner_for(MemoryCatalog::new("Singapore", vec![]));

    let empty_destination = PlanRequest::default();
    assert!(matches!(
        planner.plan(&empty_destination).await,
        Err(PlanError::InvalidRequest(_))
    ));

    let mut bad_window = base_request(1);
    bad_window.mandatory.insert(
        "x".into(),
        MandatoryVisit {
            day: 1,
            start: "16:00".parse().unwrap(),
            end: "15:00".parse().unwrap(),
        },
    );
    assert!(matches!(
        planner.plan(&bad_window).await,
        Err(PlanError::InvalidRequest(_))
    ));
}
