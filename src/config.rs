use crate::errors::{DashboardError, DashboardResult};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_path: PathBuf,
    pub static_dir: PathBuf,
    pub server_port: u16,
    /// Seconds between dataset file polls. Zero disables the watcher.
    pub reload_interval_secs: u64,
    pub rebase_cache_capacity: usize,
}

impl AppConfig {
    pub fn from_env() -> DashboardResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Missing keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> DashboardResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let server_port = var_or("SERVER_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| DashboardError::Config(format!("SERVER_PORT: {e}")))?;

        let reload_interval_secs = var_or("RELOAD_INTERVAL_SECS", "30")
            .parse::<u64>()
            .map_err(|e| DashboardError::Config(format!("RELOAD_INTERVAL_SECS: {e}")))?;

        let rebase_cache_capacity = var_or("REBASE_CACHE_CAPACITY", "32")
            .parse::<usize>()
            .map_err(|e| DashboardError::Config(format!("REBASE_CACHE_CAPACITY: {e}")))?;

        Ok(Self {
            data_path: PathBuf::from(var_or("DASHBOARD_DATA_PATH", "public/data/dashboard.json")),
            static_dir: PathBuf::from(var_or("STATIC_DIR", "out")),
            server_port,
            reload_interval_secs,
            rebase_cache_capacity,
        })
    }
}
