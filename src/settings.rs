//! Process-level settings: database path, HTTP bind address, and the
//! handful of knobs that are fixed for the lifetime of the process rather
//! than hot-reloadable (contrast with [`crate::config::ServerConfig`]).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_base_online_players")]
    pub base_online_players: i64,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_db_path() -> String {
    "vendor_engine.db".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_base_online_players() -> i64 {
    25
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            db_path: default_db_path(),
            bind_addr: default_bind_addr(),
            base_online_players: default_base_online_players(),
            timezone: default_timezone(),
        }
    }
}

impl EngineSettings {
    /// Load from a JSON file if present, then apply environment overrides.
    /// Mirrors the teacher's `Config::from_file` + env-overlay pattern.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) if path.exists() => {
                let contents = fs::read_to_string(path).context("failed to read settings file")?;
                serde_json::from_str(&contents).context("failed to parse settings JSON")?
            }
            _ => EngineSettings::default(),
        };

        if let Ok(db_path) = std::env::var("VENDOR_DB_PATH") {
            settings.db_path = db_path;
        }
        if let Ok(bind_addr) = std::env::var("VENDOR_BIND_ADDR") {
            settings.bind_addr = bind_addr;
        }
        if let Ok(base_online) = std::env::var("VENDOR_BASE_ONLINE_PLAYERS") {
            settings.base_online_players = base_online.parse().context("VENDOR_BASE_ONLINE_PLAYERS must be an integer")?;
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_populated_without_a_file() {
        let settings = EngineSettings::load(None).unwrap();
        assert_eq!(settings.bind_addr, "0.0.0.0:8080");
        assert_eq!(settings.base_online_players, 25);
    }
}
