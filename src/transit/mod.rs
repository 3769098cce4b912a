//! Driving-time service: OSRM client with Haversine fallback.
//!
//! The service first probes the configured OSRM instance; the outcome is
//! memoized for the lifetime of the client and can be cleared with
//! [`TravelTimeService::refresh`]. Any timeout, connection error,
//! oversized matrix, or malformed body falls back to great-circle
//! estimates, which degrades quality but never fails a request.

pub mod haversine;

use std::sync::RwLock;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::catalog::Coordinates;
use crate::config::Settings;

/// Largest coordinate set sent to the OSRM `/table` endpoint.
pub const MAX_TABLE_NODES: usize = 1600;
/// Fallback speed for pairwise queries.
pub const PAIRWISE_FALLBACK_KMH: f64 = 30.0;
/// Fallback speed for matrix queries.
pub const MATRIX_FALLBACK_KMH: f64 = 25.0;

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
struct RouteResponse {
    routes: Vec<RouteLeg>,
}

#[derive(Debug, Deserialize)]
struct RouteLeg {
    duration: f64,
    distance: f64,
}

#[derive(Debug, Deserialize)]
struct TableResponse {
    durations: Option<Vec<Vec<Option<f64>>>>,
}

/// A travel-time matrix together with its provenance.
#[derive(Debug, Clone)]
pub struct MatrixResult {
    /// Whole minutes, zero diagonal.
    pub minutes: Vec<Vec<u32>>,
    /// True when the Haversine fallback produced the matrix.
    pub degraded: bool,
}

/// Client for the driving-graph service.
pub struct TravelTimeService {
    base_url: String,
    timeout: Duration,
    enabled: bool,
    client: reqwest::Client,
    available: RwLock<Option<bool>>,
}

impl TravelTimeService {
    pub fn new(settings: &Settings) -> Self {
        Self {
            base_url: settings.osrm_url.trim_end_matches('/').to_string(),
            timeout: settings.osrm_timeout,
            enabled: settings.use_osrm,
            client: reqwest::Client::new(),
            available: RwLock::new(None),
        }
    }

    /// A service that always answers with the Haversine fallback.
    pub fn disabled() -> Self {
        let settings = Settings {
            use_osrm: false,
            ..Settings::default()
        };
        Self::new(&settings)
    }

    /// Clears the memoized availability; the next call probes again.
    pub fn refresh(&self) {
        *self.available.write().expect("availability lock poisoned") = None;
    }

    fn mark_unavailable(&self) {
        *self.available.write().expect("availability lock poisoned") = Some(false);
    }

    /// Lightweight health check, memoized after the first probe.
    async fn osrm_available(&self) -> bool {
        if !self.enabled {
            return false;
        }
        if let Some(known) = *self.available.read().expect("availability lock poisoned") {
            return known;
        }
        let url = format!("{}/route/v1/driving/0,0;0,0?overview=false", self.base_url);
        let ok = match self.client.get(&url).timeout(PROBE_TIMEOUT).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        };
        if !ok {
            warn!("driving-graph probe failed, using Haversine fallback");
        }
        *self.available.write().expect("availability lock poisoned") = Some(ok);
        ok
    }

    async fn fetch_route_leg(&self, a: Coordinates, b: Coordinates) -> Option<RouteLeg> {
        let url = format!(
            "{}/route/v1/driving/{},{};{},{}?overview=false",
            self.base_url, a.lon, a.lat, b.lon, b.lat
        );
        let resp = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    self.mark_unavailable();
                }
                warn!("driving-graph route error: {e}");
            })
            .ok()?;
        let body: RouteResponse = resp
            .error_for_status()
            .ok()?
            .json()
            .await
            .map_err(|e| warn!("driving-graph route body error: {e}"))
            .ok()?;
        body.routes.into_iter().next()
    }

    /// Driving time in seconds between two points.
    pub async fn route_seconds(&self, a: Coordinates, b: Coordinates) -> f64 {
        if self.osrm_available().await {
            if let Some(leg) = self.fetch_route_leg(a, b).await {
                debug!(duration = leg.duration, "driving-graph route");
                return leg.duration;
            }
        }
        haversine::time_seconds(a.lat, a.lon, b.lat, b.lon, PAIRWISE_FALLBACK_KMH)
    }

    /// Driving distance in kilometres between two points.
    pub async fn distance_km(&self, a: Coordinates, b: Coordinates) -> f64 {
        if self.osrm_available().await {
            if let Some(leg) = self.fetch_route_leg(a, b).await {
                return leg.distance / 1000.0;
            }
        }
        haversine::distance_km(a.lat, a.lon, b.lat, b.lon)
    }

    /// `N×N` driving-time matrix in whole minutes.
    pub async fn matrix_minutes(&self, coords: &[Coordinates]) -> MatrixResult {
        let n = coords.len();
        if n <= 1 {
            return MatrixResult {
                minutes: vec![vec![0; n]; n],
                degraded: false,
            };
        }
        if n > MAX_TABLE_NODES {
            info!(n, "matrix too large for driving-graph table, using Haversine");
            return self.fallback_matrix(coords);
        }
        if self.osrm_available().await {
            match self.fetch_table(coords).await {
                Some(minutes) => {
                    info!(n, "driving-graph matrix computed");
                    return MatrixResult {
                        minutes,
                        degraded: false,
                    };
                }
                None => warn!("driving-graph table failed, using Haversine matrix"),
            }
        }
        self.fallback_matrix(coords)
    }

    async fn fetch_table(&self, coords: &[Coordinates]) -> Option<Vec<Vec<u32>>> {
        let coord_str = coords
            .iter()
            .map(|c| format!("{},{}", c.lon, c.lat))
            .collect::<Vec<_>>()
            .join(";");
        let url = format!(
            "{}/table/v1/driving/{coord_str}?annotations=duration",
            self.base_url
        );
        let resp = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    self.mark_unavailable();
                }
                warn!("driving-graph table error: {e}");
            })
            .ok()?;
        let body: TableResponse = resp.error_for_status().ok()?.json().await.ok()?;
        let durations = body.durations?;
        if durations.len() != coords.len() {
            return None;
        }

        let mut minutes = vec![vec![0u32; coords.len()]; coords.len()];
        for (i, row) in durations.iter().enumerate() {
            if row.len() != coords.len() {
                return None;
            }
            for (j, sec) in row.iter().enumerate() {
                let sec = sec.unwrap_or(0.0);
                minutes[i][j] = (sec / 60.0).round().max(0.0) as u32;
            }
        }
        Some(minutes)
    }

    fn fallback_matrix(&self, coords: &[Coordinates]) -> MatrixResult {
        let pairs: Vec<(f64, f64)> = coords.iter().map(|c| (c.lat, c.lon)).collect();
        MatrixResult {
            minutes: haversine::matrix_minutes(&pairs, MATRIX_FALLBACK_KMH),
            degraded: true,
        }
    }
}
