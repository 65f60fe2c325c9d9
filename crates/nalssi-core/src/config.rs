use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use nalssi_places::{DEFAULT_SEARCH_LIMIT, DEFAULT_SEPARATOR};
use nalssi_weather::{
    Coordinates, RetryPolicy, WeatherSettings, KAKAO_BASE_URL, OWM_BASE_URL, OWM_GEO_BASE_URL,
};

use crate::error::ConfigError;

/// Environment variable consulted when `weather.api_key` is empty
pub const OPENWEATHER_API_KEY_ENV: &str = "OPENWEATHER_API_KEY";
/// Environment variable consulted when `maps.rest_api_key` is empty
pub const KAKAO_REST_API_KEY_ENV: &str = "KAKAO_REST_API_KEY";

const APP_DIR_NAME: &str = "nalssi";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// All errors joined into one line
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub weather: WeatherConfig,

    #[serde(default)]
    pub maps: MapsConfig,

    #[serde(default)]
    pub favorites: FavoritesConfig,

    #[serde(default)]
    pub search: SearchConfig,

    /// Location shown when nothing else is selected
    #[serde(default)]
    pub location: LocationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// OpenWeatherMap key. Empty falls back to `OPENWEATHER_API_KEY`.
    pub api_key: String,
    pub base_url: String,
    pub geo_base_url: String,
    /// `metric`, `imperial` or `standard`
    pub units: String,
    pub lang: String,
    /// How long fetched conditions are reused
    pub refresh_minutes: u32,
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: OWM_BASE_URL.to_string(),
            geo_base_url: OWM_GEO_BASE_URL.to_string(),
            units: "metric".to_string(),
            lang: "kr".to_string(),
            refresh_minutes: 15,
            timeout_secs: 10,
        }
    }
}

impl WeatherConfig {
    /// Configured key, else the environment variable, else empty.
    pub fn resolved_api_key(&self) -> String {
        resolve_key(&self.api_key, OPENWEATHER_API_KEY_ENV)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Client settings for the weather provider and geocoder.
    pub fn settings(&self) -> WeatherSettings {
        WeatherSettings {
            api_key: self.resolved_api_key(),
            base_url: self.base_url.clone(),
            units: self.units.clone(),
            lang: self.lang.clone(),
            timeout: self.timeout(),
            cache_ttl: Duration::from_secs(u64::from(self.refresh_minutes) * 60),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapsConfig {
    /// Kakao REST key. Empty falls back to `KAKAO_REST_API_KEY`.
    pub rest_api_key: String,
    pub base_url: String,
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            rest_api_key: String::new(),
            base_url: KAKAO_BASE_URL.to_string(),
        }
    }
}

impl MapsConfig {
    pub fn resolved_rest_api_key(&self) -> String {
        resolve_key(&self.rest_api_key, KAKAO_REST_API_KEY_ENV)
    }
}

fn resolve_key(configured: &str, env_var: &str) -> String {
    let configured = configured.trim();
    if !configured.is_empty() {
        return configured.to_string();
    }
    std::env::var(env_var)
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

/// Where favorites are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FavoritesBackend {
    /// `favorites.db` key/value table
    #[default]
    Sqlite,
    /// `favorites-storage.json`
    Json,
    /// Not persisted across runs
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FavoritesConfig {
    pub backend: FavoritesBackend,
    pub data_dir: PathBuf,
}

impl Default for FavoritesConfig {
    fn default() -> Self {
        Self {
            backend: FavoritesBackend::default(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum number of district matches returned
    pub limit: usize,
    /// Separator between administrative levels in the dataset
    pub separator: char,
    /// JSON array of district names replacing the bundled dataset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_path: Option<PathBuf>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_SEARCH_LIMIT,
            separator: DEFAULT_SEPARATOR,
            dataset_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        // Seoul City Hall
        Self {
            name: "서울".to_string(),
            lat: 37.5665,
            lon: 126.978,
        }
    }
}

impl LocationConfig {
    pub fn coords(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }
}

impl Config {
    /// Load configuration from `path`, writing defaults there if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Created default config at {}", path.display());
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Load configuration from `path` and validate it
    ///
    /// Warnings are logged; errors fail the load.
    pub fn load_validated_from(path: &Path) -> Result<(Self, ValidationResult)> {
        let config = Self::load_from(path)?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        validate_url(&self.weather.base_url, "weather.base_url", &mut result);
        validate_url(&self.weather.geo_base_url, "weather.geo_base_url", &mut result);
        validate_url(&self.maps.base_url, "maps.base_url", &mut result);

        if !matches!(self.weather.units.as_str(), "metric" | "imperial" | "standard") {
            result.add_error(
                "weather.units",
                format!(
                    "Units must be metric, imperial or standard, got: {}",
                    self.weather.units
                ),
            );
        }

        if self.weather.timeout_secs == 0 {
            result.add_error("weather.timeout_secs", "Timeout must be greater than 0");
        }

        if self.weather.refresh_minutes == 0 {
            result.add_warning(
                "weather.refresh_minutes",
                "Weather caching disabled (0 minutes)",
            );
        } else if self.weather.refresh_minutes > 1440 {
            result.add_warning(
                "weather.refresh_minutes",
                "Weather refresh interval is more than 24 hours",
            );
        }

        if self.weather.resolved_api_key().is_empty() {
            result.add_warning(
                "weather.api_key",
                format!(
                    "OpenWeatherMap key not configured (set {}) - weather will be unavailable",
                    OPENWEATHER_API_KEY_ENV
                ),
            );
        }

        if self.maps.resolved_rest_api_key().is_empty() {
            result.add_warning(
                "maps.rest_api_key",
                format!(
                    "Kakao REST key not configured (set {}) - place search will be unavailable",
                    KAKAO_REST_API_KEY_ENV
                ),
            );
        }

        if self.search.limit == 0 {
            result.add_error("search.limit", "Search limit must be greater than 0");
        }

        if self.search.separator.is_whitespace() {
            result.add_error("search.separator", "Separator cannot be whitespace");
        }

        if let Some(path) = &self.search.dataset_path {
            if !path.is_file() {
                result.add_error(
                    "search.dataset_path",
                    format!("Dataset file does not exist: {}", path.display()),
                );
            }
        }

        if let Err(e) = self.location.coords().validate() {
            result.add_error("location", e.to_string());
        }

        result
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// `<config_dir>/nalssi/config.toml`
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join(APP_DIR_NAME);

        Ok(config_dir.join(CONFIG_FILE_NAME))
    }
}

fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
    match Url::parse(url_str) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                result.add_error(
                    field_name,
                    format!("URL must use http or https scheme, got: {}", url.scheme()),
                );
            }

            if url.host().is_none() {
                result.add_error(field_name, "URL must have a host");
            }
        }
        Err(e) => {
            result.add_error(field_name, format!("Invalid URL: {}", e));
        }
    }
}
