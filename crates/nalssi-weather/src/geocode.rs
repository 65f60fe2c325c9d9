//! Forward geocoding: resolve a place name to coordinates.
//! Uses the OpenWeatherMap Geocoding API with the same API key as the weather client.

use std::sync::Arc;

use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::http::{build_client, decode_json};
use crate::provider::WeatherSettings;
use crate::retry::send_with_retry;
use crate::types::{Coordinates, GeoPlace, WeatherError};

pub const OWM_GEO_BASE_URL: &str = "https://api.openweathermap.org/geo/1.0";

#[derive(Debug, Deserialize)]
struct DirectGeocodeItem {
    name: String,
    lat: f64,
    lon: f64,
    country: Option<String>,
    state: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Geocoder {
    client: Arc<Client>,
    settings: WeatherSettings,
    base_url: String,
}

impl Geocoder {
    /// Build a geocoder sharing the weather client's key, timeout and retry policy.
    pub fn new(settings: WeatherSettings, base_url: &str) -> Result<Self, WeatherError> {
        let client = build_client(settings.timeout)?;
        Ok(Self {
            client: Arc::new(client),
            settings,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Best match for a free-text place name.
    ///
    /// # Errors
    /// Returns `WeatherError::NotFound` when the service knows no such place.
    #[instrument(skip(self), level = "info")]
    pub async fn coords_by_name(&self, name: &str) -> Result<GeoPlace, WeatherError> {
        let query = name.trim();
        if query.is_empty() {
            return Err(WeatherError::NotFound(String::new()));
        }

        let url = format!(
            "{}/direct?q={}&limit=1&appid={}",
            self.base_url,
            urlencoding::encode(query),
            urlencoding::encode(&self.settings.api_key),
        );

        let response = send_with_retry(&self.settings.retry, || self.client.get(&url).send()).await?;
        let items: Vec<DirectGeocodeItem> = decode_json(response).await?;

        let item = items
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::NotFound(query.to_string()))?;

        tracing::info!("Geocoded {:?} to {}, {}", query, item.lat, item.lon);
        Ok(GeoPlace {
            name: item.name,
            coords: Coordinates::new(item.lat, item.lon),
            country: item.country,
            state: item.state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryPolicy;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn geocoder(base_url: &str) -> Geocoder {
        let settings = WeatherSettings {
            api_key: "test-key".to_string(),
            retry: RetryPolicy::none(),
            ..WeatherSettings::default()
        };
        Geocoder::new(settings, base_url).unwrap()
    }

    #[tokio::test]
    async fn test_coords_by_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/direct"))
            .and(query_param("q", "Seoul"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"name": "Seoul", "lat": 37.5666791, "lon": 126.9782914, "country": "KR"}
            ])))
            .mount(&server)
            .await;

        let place = geocoder(&server.uri()).coords_by_name(" Seoul ").await.unwrap();
        assert_eq!(place.name, "Seoul");
        assert_eq!(place.coords, Coordinates::new(37.5666791, 126.9782914));
        assert_eq!(place.country.as_deref(), Some("KR"));
        assert!(place.state.is_none());
    }

    #[tokio::test]
    async fn test_empty_result_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/direct"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let result = geocoder(&server.uri()).coords_by_name("Atlantis").await;
        assert!(matches!(result, Err(WeatherError::NotFound(q)) if q == "Atlantis"));
    }

    #[tokio::test]
    async fn test_blank_name_is_not_found_without_request() {
        let result = geocoder("http://127.0.0.1:9").coords_by_name("   ").await;
        assert!(matches!(result, Err(WeatherError::NotFound(_))));
    }
}
