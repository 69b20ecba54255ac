//! Console configuration stored in ~/.sales-console/config.json
//!
//! Every field has a default, so an empty object (or no file at all) yields
//! the stock behavior: 800ms simulated latency, 5%/10%/5% failure rates,
//! a 300ms search debounce and preferences in a JSON file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

const CONFIG_DIR: &str = ".sales-console";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
    #[serde(default)]
    pub preferences: PreferencesConfig,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            search_debounce_ms: default_search_debounce_ms(),
            preferences: PreferencesConfig::default(),
        }
    }
}

impl ConsoleConfig {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

/// Simulated backend tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
    #[serde(default = "default_fetch_failure_rate")]
    pub fetch_failure_rate: f64,
    #[serde(default = "default_update_failure_rate")]
    pub update_failure_rate: f64,
    #[serde(default = "default_convert_failure_rate")]
    pub convert_failure_rate: f64,
    /// Fixed RNG seed for reproducible failure draws.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            latency_ms: default_latency_ms(),
            fetch_failure_rate: default_fetch_failure_rate(),
            update_failure_rate: default_update_failure_rate(),
            convert_failure_rate: default_convert_failure_rate(),
            seed: None,
        }
    }
}

impl BackendConfig {
    /// No latency, no failures. Handy for tests and scripted sessions.
    pub fn reliable() -> Self {
        Self {
            latency_ms: 0,
            fetch_failure_rate: 0.0,
            update_failure_rate: 0.0,
            convert_failure_rate: 0.0,
            seed: None,
        }
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }

    /// Copy with every rate clamped into [0, 1]; NaN counts as 0.
    pub fn normalized(&self) -> Self {
        Self {
            fetch_failure_rate: clamp_rate(self.fetch_failure_rate),
            update_failure_rate: clamp_rate(self.update_failure_rate),
            convert_failure_rate: clamp_rate(self.convert_failure_rate),
            ..self.clone()
        }
    }
}

fn clamp_rate(rate: f64) -> f64 {
    if rate.is_nan() {
        0.0
    } else {
        rate.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferencesKind {
    Memory,
    #[default]
    File,
    Sqlite,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesConfig {
    #[serde(default)]
    pub kind: PreferencesKind,
    /// Overrides the default location under ~/.sales-console/.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl PreferencesConfig {
    pub fn resolved_path(&self) -> Result<PathBuf, String> {
        if let Some(ref path) = self.path {
            return Ok(path.clone());
        }
        let file = match self.kind {
            PreferencesKind::Sqlite => "preferences.db",
            _ => "preferences.json",
        };
        Ok(config_dir()?.join(file))
    }
}

fn default_latency_ms() -> u64 {
    800
}

fn default_fetch_failure_rate() -> f64 {
    0.05
}

fn default_update_failure_rate() -> f64 {
    0.10
}

fn default_convert_failure_rate() -> f64 {
    0.05
}

fn default_search_debounce_ms() -> u64 {
    300
}

fn config_dir() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or("Could not find home directory")?;
    Ok(home.join(CONFIG_DIR))
}

/// Load configuration from ~/.sales-console/config.json
pub fn load_config() -> Result<ConsoleConfig, String> {
    load_config_from(&config_dir()?.join("config.json"))
}

/// Load configuration from an explicit path. A missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<ConsoleConfig, String> {
    if !path.exists() {
        log::debug!("No config at {}, using defaults", path.display());
        return Ok(ConsoleConfig::default());
    }

    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read config: {}", e))?;

    let mut config: ConsoleConfig =
        serde_json::from_str(&content).map_err(|e| format!("Failed to parse config: {}", e))?;
    config.backend = config.backend.normalized();

    Ok(config)
}
