//! OpenWeatherMap client for current conditions and the 5-day forecast.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::cache::{CoordKey, QueryCache};
use crate::http::{build_client, decode_json};
use crate::retry::{send_with_retry, RetryPolicy};
use crate::types::{
    Coordinates, CurrentWeather, Forecast, ForecastEntry, WeatherCondition, WeatherError,
};

pub const OWM_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CACHE_MINUTES: u64 = 15;

/// Connection settings for [`WeatherProvider`].
#[derive(Debug, Clone)]
pub struct WeatherSettings {
    pub api_key: String,
    pub base_url: String,
    /// `metric`, `imperial` or `standard`
    pub units: String,
    /// Language for condition descriptions, e.g. `kr`
    pub lang: String,
    pub timeout: Duration,
    /// How long a successful response is reused
    pub cache_ttl: Duration,
    pub retry: RetryPolicy,
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: OWM_BASE_URL.to_string(),
            units: "metric".to_string(),
            lang: "kr".to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_MINUTES * 60),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    id: u32,
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    humidity: u8,
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: f64,
    #[serde(default)]
    deg: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwmClouds {
    all: u8,
}

#[derive(Debug, Deserialize)]
struct OwmSys {
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwmCurrentResponse {
    #[serde(default)]
    name: String,
    main: OwmMain,
    weather: Vec<OwmCondition>,
    wind: OwmWind,
    #[serde(default)]
    clouds: OwmClouds,
    visibility: Option<u32>,
    sys: OwmSys,
    dt: i64,
}

#[derive(Debug, Deserialize)]
struct OwmForecastMain {
    temp: f64,
    temp_min: f64,
    temp_max: f64,
}

#[derive(Debug, Deserialize)]
struct OwmVolume {
    #[serde(rename = "3h")]
    three_hours: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwmForecastItem {
    dt: i64,
    dt_txt: String,
    main: OwmForecastMain,
    weather: Vec<OwmCondition>,
    pop: Option<f64>,
    rain: Option<OwmVolume>,
    snow: Option<OwmVolume>,
}

#[derive(Debug, Deserialize)]
struct OwmCity {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct OwmForecastResponse {
    list: Vec<OwmForecastItem>,
    city: OwmCity,
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, WeatherError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| WeatherError::Parse(format!("timestamp out of range: {}", secs)))
}

/// First listed condition, or a clear-sky placeholder when the list is empty.
fn primary_condition(conditions: &[OwmCondition]) -> (WeatherCondition, String, String) {
    match conditions.first() {
        Some(c) => (
            WeatherCondition::from_owm_code(c.id),
            c.description.clone(),
            c.icon.clone(),
        ),
        None => (WeatherCondition::Clear, String::new(), String::new()),
    }
}

impl TryFrom<OwmCurrentResponse> for CurrentWeather {
    type Error = WeatherError;

    fn try_from(raw: OwmCurrentResponse) -> Result<Self, Self::Error> {
        let (condition, description, icon) = primary_condition(&raw.weather);
        Ok(Self {
            place_name: raw.name,
            temperature: raw.main.temp,
            feels_like: raw.main.feels_like,
            temp_min: raw.main.temp_min,
            temp_max: raw.main.temp_max,
            humidity: raw.main.humidity,
            pressure: raw.main.pressure,
            wind_speed: raw.wind.speed,
            wind_deg: raw.wind.deg,
            cloudiness: raw.clouds.all,
            visibility: raw.visibility,
            condition,
            description,
            icon,
            sunrise: timestamp(raw.sys.sunrise)?,
            sunset: timestamp(raw.sys.sunset)?,
            observed_at: timestamp(raw.dt)?,
        })
    }
}

impl TryFrom<OwmForecastItem> for ForecastEntry {
    type Error = WeatherError;

    fn try_from(raw: OwmForecastItem) -> Result<Self, Self::Error> {
        let (condition, description, icon) = primary_condition(&raw.weather);
        let chance = (raw.pop.unwrap_or(0.0).clamp(0.0, 1.0) * 100.0).round() as u8;
        Ok(Self {
            time: timestamp(raw.dt)?,
            time_text: raw.dt_txt,
            temperature: raw.main.temp,
            temp_min: raw.main.temp_min,
            temp_max: raw.main.temp_max,
            condition,
            description,
            icon,
            precipitation_chance: chance,
            rain_mm: raw.rain.and_then(|v| v.three_hours),
            snow_mm: raw.snow.and_then(|v| v.three_hours),
        })
    }
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    settings: WeatherSettings,
    current_cache: Arc<QueryCache<CoordKey, CurrentWeather>>,
    forecast_cache: Arc<QueryCache<CoordKey, Forecast>>,
}

impl WeatherProvider {
    pub fn new(settings: WeatherSettings) -> Result<Self, WeatherError> {
        let client = build_client(settings.timeout)?;

        Ok(Self {
            client: Arc::new(client),
            current_cache: Arc::new(QueryCache::new(settings.cache_ttl)),
            forecast_cache: Arc::new(QueryCache::new(settings.cache_ttl)),
            settings,
        })
    }

    pub fn has_api_key(&self) -> bool {
        !self.settings.api_key.trim().is_empty()
    }

    fn url(&self, endpoint: &str, coords: Coordinates) -> String {
        format!(
            "{}/{}?lat={}&lon={}&appid={}&units={}&lang={}",
            self.settings.base_url.trim_end_matches('/'),
            endpoint,
            coords.lat,
            coords.lon,
            urlencoding::encode(&self.settings.api_key),
            urlencoding::encode(&self.settings.units),
            urlencoding::encode(&self.settings.lang),
        )
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        coords: Coordinates,
    ) -> Result<T, WeatherError> {
        coords.validate()?;
        if !self.has_api_key() {
            tracing::warn!("OpenWeatherMap API key is not configured");
            return Err(WeatherError::InvalidApiKey);
        }

        let url = self.url(endpoint, coords);
        let response = send_with_retry(&self.settings.retry, || self.client.get(&url).send()).await?;
        decode_json(response).await
    }

    /// Current conditions at `coords`.
    #[instrument(skip(self), level = "info")]
    pub async fn current(&self, coords: Coordinates) -> Result<CurrentWeather, WeatherError> {
        let key = CoordKey::from(coords);
        if let Some(hit) = self.current_cache.get(&key) {
            tracing::debug!("Current weather cache hit");
            return Ok(hit);
        }

        let raw: OwmCurrentResponse = self.fetch("weather", coords).await?;
        let current = CurrentWeather::try_from(raw)?;
        self.current_cache.insert(key, current.clone());
        Ok(current)
    }

    /// 5-day forecast in 3-hour steps at `coords`.
    #[instrument(skip(self), level = "info")]
    pub async fn forecast(&self, coords: Coordinates) -> Result<Forecast, WeatherError> {
        let key = CoordKey::from(coords);
        if let Some(hit) = self.forecast_cache.get(&key) {
            tracing::debug!("Forecast cache hit");
            return Ok(hit);
        }

        let raw: OwmForecastResponse = self.fetch("forecast", coords).await?;
        let entries = raw
            .list
            .into_iter()
            .map(ForecastEntry::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let forecast = Forecast {
            city_name: raw.city.name,
            entries,
        };
        tracing::debug!("Fetched {} forecast steps", forecast.entries.len());
        self.forecast_cache.insert(key, forecast.clone());
        Ok(forecast)
    }

    /// Drop all memoized responses.
    pub fn clear_cache(&self) {
        self.current_cache.clear();
        self.forecast_cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base_url: &str) -> WeatherSettings {
        WeatherSettings {
            api_key: "test-key".to_string(),
            base_url: base_url.to_string(),
            retry: RetryPolicy::new(1, 1, 1),
            ..WeatherSettings::default()
        }
    }

    fn current_body() -> serde_json::Value {
        serde_json::json!({
            "name": "Seoul",
            "dt": 1767225600,
            "main": {
                "temp": 3.2, "feels_like": 0.1, "temp_min": 1.0, "temp_max": 5.0,
                "humidity": 48, "pressure": 1021
            },
            "weather": [{"id": 802, "description": "구름조금", "icon": "03d"}],
            "wind": {"speed": 2.6, "deg": 290},
            "clouds": {"all": 40},
            "visibility": 10000,
            "sys": {"sunrise": 1767220000, "sunset": 1767255000}
        })
    }

    fn forecast_item(dt: i64, dt_txt: &str, extra: serde_json::Value) -> serde_json::Value {
        let mut item = serde_json::json!({
            "dt": dt,
            "dt_txt": dt_txt,
            "main": {"temp": 4.0, "temp_min": 2.0, "temp_max": 6.0},
            "weather": [{"id": 500, "description": "약한 비", "icon": "10d"}],
            "pop": 0.35
        });
        if let (Some(obj), Some(extra)) = (item.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                obj.insert(k.clone(), v.clone());
            }
        }
        item
    }

    #[tokio::test]
    async fn test_current_weather() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("appid", "test-key"))
            .and(query_param("units", "metric"))
            .and(query_param("lang", "kr"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
            .mount(&server)
            .await;

        let provider = WeatherProvider::new(settings(&server.uri())).unwrap();
        let current = provider
            .current(Coordinates::new(37.5665, 126.978))
            .await
            .unwrap();

        assert_eq!(current.place_name, "Seoul");
        assert_eq!(current.humidity, 48);
        assert_eq!(current.condition, WeatherCondition::PartlyCloudy);
        assert_eq!(current.description, "구름조금");
        assert_eq!(current.wind_direction(), "서");
        assert_eq!(current.visibility, Some(10000));
        assert_eq!(current.observed_at.timestamp(), 1767225600);
    }

    #[tokio::test]
    async fn test_current_weather_is_memoized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
            .expect(1)
            .mount(&server)
            .await;

        let provider = WeatherProvider::new(settings(&server.uri())).unwrap();
        let coords = Coordinates::new(37.5665, 126.978);
        provider.current(coords).await.unwrap();
        provider.current(coords).await.unwrap();
    }

    #[tokio::test]
    async fn test_forecast() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "city": {"name": "Busan"},
                "list": [
                    forecast_item(1767225600, "2026-01-01 00:00:00", serde_json::json!({})),
                    forecast_item(1767236400, "2026-01-01 03:00:00",
                        serde_json::json!({"rain": {"3h": 0.8}})),
                    forecast_item(1767268800, "2026-01-01 12:00:00",
                        serde_json::json!({"snow": {"3h": 1.5}, "pop": 1.0})),
                ]
            })))
            .mount(&server)
            .await;

        let provider = WeatherProvider::new(settings(&server.uri())).unwrap();
        let forecast = provider
            .forecast(Coordinates::new(35.1796, 129.0756))
            .await
            .unwrap();

        assert_eq!(forecast.city_name, "Busan");
        assert_eq!(forecast.entries.len(), 3);
        assert_eq!(forecast.entries[0].precipitation_chance, 35);
        assert_eq!(forecast.entries[0].condition, WeatherCondition::Rain);
        assert_eq!(forecast.entries[1].rain_mm, Some(0.8));
        assert_eq!(forecast.entries[2].precipitation_chance, 100);
        assert_eq!(forecast.daily().len(), 1);
        assert_eq!(forecast.precipitation().len(), 2);
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_invalid_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "cod": 401, "message": "Invalid API key."
            })))
            .mount(&server)
            .await;

        let provider = WeatherProvider::new(settings(&server.uri())).unwrap();
        let result = provider.current(Coordinates::new(37.0, 127.0)).await;
        assert!(matches!(result, Err(WeatherError::InvalidApiKey)));
    }

    #[tokio::test]
    async fn test_server_error_retried_then_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .expect(2)
            .mount(&server)
            .await;

        let provider = WeatherProvider::new(settings(&server.uri())).unwrap();
        let result = provider.current(Coordinates::new(37.0, 127.0)).await;
        assert!(matches!(result, Err(WeatherError::Api { status: 502, .. })));
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"main\": 1}"))
            .mount(&server)
            .await;

        let provider = WeatherProvider::new(settings(&server.uri())).unwrap();
        let result = provider.current(Coordinates::new(37.0, 127.0)).await;
        assert!(matches!(result, Err(WeatherError::Parse(_))));
    }

    #[tokio::test]
    async fn test_invalid_coordinates_rejected_without_request() {
        let provider = WeatherProvider::new(settings("http://127.0.0.1:9")).unwrap();
        let result = provider.current(Coordinates::new(123.0, 0.0)).await;
        assert!(matches!(result, Err(WeatherError::InvalidCoordinates { .. })));
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let provider = WeatherProvider::new(WeatherSettings {
            base_url: "http://127.0.0.1:9".to_string(),
            ..WeatherSettings::default()
        })
        .unwrap();
        assert!(!provider.has_api_key());
        let result = provider.forecast(Coordinates::new(37.0, 127.0)).await;
        assert!(matches!(result, Err(WeatherError::InvalidApiKey)));
    }
}
