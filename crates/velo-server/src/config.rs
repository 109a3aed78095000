//! Server configuration from environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use velo_brouter::DEFAULT_BASE_URL;
use velo_core::{EngineConfig, Profile, DEFAULT_MAX_DRAG_DISTANCE, DEFAULT_NEAR_THRESHOLD_DEG};

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub brouter_url: String,
    pub brouter_timeout_s: u64,
    pub default_profile: Profile,
    pub max_concurrent_fetches: usize,
    pub near_threshold_deg: f64,
    /// Path drag reach: map pixels when the request carries a zoom, degrees otherwise.
    pub max_drag_distance: f64,
    /// Idle sessions older than this are dropped by the sweep loop.
    pub session_ttl_s: u64,
    pub max_sessions: usize,
    pub session_sweep_interval_s: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            brouter_url: DEFAULT_BASE_URL.to_string(),
            brouter_timeout_s: 30,
            default_profile: Profile::default(),
            max_concurrent_fetches: 4,
            near_threshold_deg: DEFAULT_NEAR_THRESHOLD_DEG,
            max_drag_distance: DEFAULT_MAX_DRAG_DISTANCE,
            session_ttl_s: 3600,
            max_sessions: 1000,
            session_sweep_interval_s: 60,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("VELO_PORT").unwrap_or(defaults.server_port),
            brouter_url: env::var("BROUTER_URL").unwrap_or(defaults.brouter_url),
            brouter_timeout_s: parse_var("BROUTER_TIMEOUT_S").unwrap_or(defaults.brouter_timeout_s),
            default_profile: parse_var("VELO_DEFAULT_PROFILE").unwrap_or(defaults.default_profile),
            max_concurrent_fetches: parse_var("VELO_MAX_CONCURRENT_FETCHES")
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_concurrent_fetches),
            near_threshold_deg: parse_var("VELO_NEAR_THRESHOLD_DEG")
                .filter(|v: &f64| v.is_finite() && *v >= 0.0)
                .unwrap_or(defaults.near_threshold_deg),
            max_drag_distance: parse_var("VELO_MAX_DRAG_DISTANCE")
                .filter(|v: &f64| v.is_finite() && *v > 0.0)
                .unwrap_or(defaults.max_drag_distance),
            session_ttl_s: parse_var("VELO_SESSION_TTL_S").unwrap_or(defaults.session_ttl_s),
            max_sessions: parse_var("VELO_MAX_SESSIONS").unwrap_or(defaults.max_sessions),
            session_sweep_interval_s: parse_var("VELO_SESSION_SWEEP_S")
                .filter(|s: &u64| *s > 0)
                .unwrap_or(defaults.session_sweep_interval_s),
        }
    }

    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            near_threshold_deg: self.near_threshold_deg,
            max_drag_distance: self.max_drag_distance,
            max_concurrent_fetches: self.max_concurrent_fetches,
            default_profile: self.default_profile,
        }
    }

    pub fn brouter_timeout(&self) -> Duration {
        Duration::from_secs(self.brouter_timeout_s)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_s)
    }
}

fn parse_var<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}
