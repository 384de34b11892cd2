//! Runtime configuration loaded from the environment.

use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

/// Server configuration with logged defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub jwt_secret: String,
    pub db_endpoint: String,
    /// Drain cadence of the queue worker, in milliseconds.
    pub queue_tick_ms: u64,
    /// Capacity of the insert-metrics ring.
    pub metrics_capacity: usize,
    pub default_admin_email: String,
    pub default_admin_password: String,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("PORT", "3000"),
            jwt_secret: try_load("JWT_SECRET", "school-admin-dev-secret"),
            db_endpoint: try_load("DB_ENDPOINT", "mem://"),
            queue_tick_ms: try_load("QUEUE_TICK_MS", "150"),
            metrics_capacity: try_load("METRICS_CAPACITY", "200"),
            default_admin_email: try_load("DEFAULT_ADMIN_EMAIL", "admin@school.local"),
            default_admin_password: try_load("DEFAULT_ADMIN_PASSWORD", "admin123"),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}
