use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of 3-hour forecast steps covering the next 24 hours.
pub const HOURLY_STEPS: usize = 8;

/// Number of days shown in the daily outlook.
pub const DAILY_DAYS: usize = 5;

/// Time-of-day marker of the forecast step used as a day's representative.
const DAILY_MARKER: &str = "12:00:00";

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Check that both values are finite and within range.
    ///
    /// # Errors
    /// Returns `WeatherError::InvalidCoordinates` otherwise.
    pub fn validate(&self) -> Result<(), WeatherError> {
        let lat_ok = self.lat.is_finite() && (-90.0..=90.0).contains(&self.lat);
        let lon_ok = self.lon.is_finite() && (-180.0..=180.0).contains(&self.lon);
        if lat_ok && lon_ok {
            Ok(())
        } else {
            Err(WeatherError::InvalidCoordinates {
                lat: self.lat,
                lon: self.lon,
            })
        }
    }
}

/// Weather condition categories mapped from OpenWeatherMap condition ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    #[default]
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    HeavyRain,
    Snow,
    Sleet,
    Thunderstorm,
}

impl WeatherCondition {
    /// Convert an OpenWeatherMap condition id to a WeatherCondition
    /// See: https://openweathermap.org/weather-conditions
    pub fn from_owm_code(code: u32) -> Self {
        match code {
            200..=232 => Self::Thunderstorm,
            300..=321 => Self::Drizzle,
            502..=504 | 522 => Self::HeavyRain,
            511 => Self::Sleet, // Freezing rain
            500..=531 => Self::Rain,
            611..=616 => Self::Sleet,
            600..=622 => Self::Snow,
            701..=781 => Self::Fog, // Mist, haze, dust and friends
            800 => Self::Clear,
            801 | 802 => Self::PartlyCloudy,
            803 | 804 => Self::Cloudy,
            _ => Self::Clear,
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::HeavyRain => "Heavy Rain",
            Self::Snow => "Snow",
            Self::Sleet => "Sleet",
            Self::Thunderstorm => "Thunderstorm",
        }
    }

    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Clear => "sun",
            Self::PartlyCloudy => "cloud_sun",
            Self::Cloudy => "cloud",
            Self::Fog => "cloud_fog",
            Self::Drizzle | Self::Rain | Self::HeavyRain => "cloud_rain",
            Self::Snow | Self::Sleet => "cloud_snow",
            Self::Thunderstorm => "cloud_lightning",
        }
    }
}

/// URL of an OpenWeatherMap icon (`large` selects the @2x variant).
pub fn icon_url(icon: &str, large: bool) -> String {
    if large {
        format!("{}/{}@2x.png", ICON_BASE_URL, icon)
    } else {
        format!("{}/{}.png", ICON_BASE_URL, icon)
    }
}

/// 8-point compass label in Korean for a wind bearing in degrees.
pub fn wind_direction_label(deg: f64) -> &'static str {
    const DIRECTIONS: [&str; 8] = ["북", "북동", "동", "남동", "남", "남서", "서", "북서"];
    let idx = (deg.rem_euclid(360.0) / 45.0).round() as usize % DIRECTIONS.len();
    DIRECTIONS[idx]
}

/// Current weather conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    /// Place name reported by the weather service
    pub place_name: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: u8,
    pub pressure: u32,
    pub wind_speed: f64,
    pub wind_deg: f64,
    pub cloudiness: u8,
    /// Visibility in meters
    pub visibility: Option<u32>,
    pub condition: WeatherCondition,
    pub description: String,
    pub icon: String,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
    pub observed_at: DateTime<Utc>,
}

impl CurrentWeather {
    pub fn wind_direction(&self) -> &'static str {
        wind_direction_label(self.wind_deg)
    }
}

/// One 3-hour forecast step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub time: DateTime<Utc>,
    /// Service-provided `YYYY-MM-DD HH:MM:SS` label (UTC)
    pub time_text: String,
    pub temperature: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub condition: WeatherCondition,
    pub description: String,
    pub icon: String,
    pub precipitation_chance: u8,
    /// Rain volume over the step, mm
    pub rain_mm: Option<f64>,
    /// Snow volume over the step, mm
    pub snow_mm: Option<f64>,
}

impl ForecastEntry {
    pub fn has_precipitation(&self) -> bool {
        self.rain_mm.is_some() || self.snow_mm.is_some()
    }
}

/// Multi-day forecast in 3-hour steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub city_name: String,
    pub entries: Vec<ForecastEntry>,
}

impl Forecast {
    /// Steps covering the next 24 hours.
    pub fn hourly(&self) -> &[ForecastEntry] {
        &self.entries[..self.entries.len().min(HOURLY_STEPS)]
    }

    /// One midday step per day, up to [`DAILY_DAYS`].
    pub fn daily(&self) -> Vec<&ForecastEntry> {
        self.entries
            .iter()
            .filter(|e| e.time_text.contains(DAILY_MARKER))
            .take(DAILY_DAYS)
            .collect()
    }

    /// Steps with rain or snow volume.
    pub fn precipitation(&self) -> Vec<&ForecastEntry> {
        self.entries.iter().filter(|e| e.has_precipitation()).collect()
    }
}

/// Current conditions, forecast and resolved place name for one location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherReport {
    pub coords: Coordinates,
    /// Reverse-geocoded name, when the map service resolved one
    pub place_name: Option<String>,
    pub current: CurrentWeather,
    pub forecast: Forecast,
    pub fetched_at: DateTime<Utc>,
}

impl WeatherReport {
    /// Best available display name: geocoded name, else the weather service's.
    pub fn display_name(&self) -> &str {
        self.place_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.current.place_name)
    }
}

/// A resolved place from forward geocoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPlace {
    pub name: String,
    pub coords: Coordinates,
    pub country: Option<String>,
    pub state: Option<String>,
}

/// A keyword search hit from the map service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceResult {
    pub place_name: String,
    pub address_name: String,
    pub coords: Coordinates,
}

/// Weather and map service errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Invalid API key")]
    InvalidApiKey,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid coordinates: {lat}, {lon}")]
    InvalidCoordinates { lat: f64, lon: f64 },
}

impl WeatherError {
    /// User-friendly error message for UI display.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Network(_) => "Unable to load weather. Check your connection and try again.",
            Self::InvalidApiKey => "Weather API key is invalid. Check settings.",
            Self::NotFound(_) => "Location not found. Check and try again.",
            Self::Api { status, .. } if *status >= 500 => {
                "Weather service unavailable. Please try again later."
            }
            Self::Api { .. } => "Weather service error. Please try again.",
            Self::Parse(_) => "Received an unexpected response. Please try again.",
            Self::InvalidCoordinates { .. } => "That location is not valid.",
        }
    }
}
