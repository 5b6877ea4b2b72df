use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{error::ConfigError, model::Location, scheduler::parse_time_of_day};

/// Environment variable holding the OpenWeather API key.
pub const API_KEY_ENV: &str = "WEATHER_API_KEY";

pub const DEFAULT_REPORT_TIME: &str = "08:00";
pub const DEFAULT_API_BASE_URL: &str = "https://api.openweathermap.org";
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Numeric boundaries that trigger alerts when crossed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub temperature_high: f64,
    pub temperature_low: f64,
    pub precipitation_chance: f64,
}

/// One delivery channel for the daily report.
///
/// Example JSON:
/// `[{"type": "console"}, {"type": "webhook", "url": "https://hooks.example/abc"}]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NotificationMethod {
    Console,
    Webhook { url: String },
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub locations: Vec<Location>,
    pub notification_methods: Vec<NotificationMethod>,
    pub alert_thresholds: ThresholdConfig,

    /// Daily report time, "HH:MM" in local time.
    #[serde(default = "default_report_time")]
    pub report_time: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

fn default_report_time() -> String {
    DEFAULT_REPORT_TIME.to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

impl Format {
    fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Format::Toml,
            _ => Format::Json,
        }
    }
}

impl Config {
    /// Load and validate the config file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let parse_err = |message: String| ConfigError::Parse { path: path.to_path_buf(), message };

        let cfg: Config = match Format::for_path(path) {
            Format::Json => serde_json::from_str(&contents).map_err(|e| parse_err(e.to_string()))?,
            Format::Toml => toml::from_str(&contents).map_err(|e| parse_err(e.to_string()))?,
        };

        cfg.validate()?;
        Ok(cfg)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err =
            |message: String| ConfigError::Write { path: path.to_path_buf(), message };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }

        let contents = match Format::for_path(path) {
            Format::Json => {
                serde_json::to_string_pretty(self).map_err(|e| write_err(e.to_string()))?
            }
            Format::Toml => toml::to_string_pretty(self).map_err(|e| write_err(e.to_string()))?,
        };

        fs::write(path, contents).map_err(|e| write_err(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.locations.is_empty() {
            return Err(ConfigError::Invalid("at least one location is required".to_string()));
        }

        if self.notification_methods.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one notification method is required".to_string(),
            ));
        }

        for method in &self.notification_methods {
            if let NotificationMethod::Webhook { url } = method {
                reqwest::Url::parse(url).map_err(|e| {
                    ConfigError::Invalid(format!("invalid webhook url '{url}': {e}"))
                })?;
            }
        }

        let t = &self.alert_thresholds;
        if !(t.temperature_high.is_finite()
            && t.temperature_low.is_finite()
            && t.precipitation_chance.is_finite())
        {
            return Err(ConfigError::Invalid("alert thresholds must be finite numbers".to_string()));
        }
        if t.temperature_low > t.temperature_high {
            return Err(ConfigError::Invalid(format!(
                "temperature_low ({}) is above temperature_high ({})",
                t.temperature_low, t.temperature_high
            )));
        }

        parse_time_of_day(&self.report_time)
            .map_err(|e| ConfigError::Invalid(format!("report_time: {e}")))?;

        reqwest::Url::parse(&self.api_base_url).map_err(|e| {
            ConfigError::Invalid(format!("invalid api_base_url '{}': {e}", self.api_base_url))
        })?;

        Ok(())
    }

    /// Pick the config file: explicit path, then `./config.json`, then the
    /// platform config directory.
    pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }

        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Ok(local);
        }

        Self::config_file_path()
    }

    /// Path to the config file in the platform config directory.
    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        let dirs = ProjectDirs::from("dev", "weatherbot", "weatherbot")
            .ok_or(ConfigError::NoConfigDir)?;

        Ok(dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}

/// Read the API key from [`API_KEY_ENV`].
pub fn api_key_from_env() -> Result<String, ConfigError> {
    api_key_from(std::env::var(API_KEY_ENV).ok())
}

fn api_key_from(value: Option<String>) -> Result<String, ConfigError> {
    match value {
        Some(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(ConfigError::MissingApiKey(API_KEY_ENV)),
    }
}
