//! Environment-driven settings and tracing setup.

use std::env;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

/// Process-level configuration, read from the environment.
///
/// Recognised variables: `OSRM_URL`, `OSRM_TIMEOUT` (seconds), `USE_OSRM`,
/// `DEFAULT_LIMIT`, `MAX_LIMIT`. Missing or malformed values fall back to
/// the defaults below.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base URL of the driving-graph service.
    pub osrm_url: String,
    /// Connection/request timeout for the driving-graph service.
    pub osrm_timeout: Duration,
    /// Global switch for the driving-graph service; when false every
    /// travel-time query uses the Haversine fallback.
    pub use_osrm: bool,
    /// Advisory catalog page size.
    pub default_limit: usize,
    /// Advisory catalog page cap.
    pub max_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            osrm_url: "http://localhost:5000".to_string(),
            osrm_timeout: Duration::from_secs(5),
            use_osrm: true,
            default_limit: 12,
            max_limit: 90,
        }
    }
}

impl Settings {
    /// Loads settings from the environment, after sourcing `.env` if present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();
        Self {
            osrm_url: env::var("OSRM_URL").unwrap_or(defaults.osrm_url),
            osrm_timeout: parse_var("OSRM_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.osrm_timeout),
            use_osrm: parse_bool("USE_OSRM").unwrap_or(defaults.use_osrm),
            default_limit: parse_var("DEFAULT_LIMIT").unwrap_or(defaults.default_limit),
            max_limit: parse_var("MAX_LIMIT").unwrap_or(defaults.max_limit),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn parse_bool(name: &str) -> Option<bool> {
    let raw = env::var(name).ok()?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

static INIT_TRACING: Once = Once::new();

/// Installs the global tracing subscriber.
///
/// Filter comes from `RUST_LOG`; repeated calls are no-ops so tests may
/// invoke this freely.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_target(true)
            .init();
    });
}
