//! Map service: keyword place search and reverse geocoding.
//!
//! Consumers depend on the [`MapService`] trait; [`KakaoMapClient`] is the
//! production implementation over the Kakao Local REST API.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::http::{build_client, decode_json};
use crate::retry::{send_with_retry, RetryPolicy};
use crate::types::{Coordinates, PlaceResult, WeatherError};

pub const KAKAO_BASE_URL: &str = "https://dapi.kakao.com";

/// Place search and reverse geocoding capability.
pub trait MapService: Send + Sync {
    /// Places matching a free-text keyword. A blank keyword yields nothing.
    fn search(
        &self,
        keyword: &str,
    ) -> impl Future<Output = Result<Vec<PlaceResult>, WeatherError>> + Send;

    /// Short human-readable name for a coordinate, or `None` if unresolved.
    fn reverse_geocode(&self, coords: Coordinates) -> impl Future<Output = Option<String>> + Send;
}

#[derive(Debug, Deserialize)]
struct KeywordDocument {
    place_name: String,
    #[serde(default)]
    address_name: String,
    /// Longitude, as a decimal string
    x: String,
    /// Latitude, as a decimal string
    y: String,
}

#[derive(Debug, Deserialize)]
struct KeywordResponse {
    documents: Vec<KeywordDocument>,
}

#[derive(Debug, Deserialize)]
struct RegionAddress {
    region_1depth_name: String,
    region_2depth_name: String,
}

#[derive(Debug, Deserialize)]
struct AddressDocument {
    address: Option<RegionAddress>,
}

#[derive(Debug, Deserialize)]
struct AddressResponse {
    documents: Vec<AddressDocument>,
}

impl KeywordDocument {
    fn into_place(self) -> Option<PlaceResult> {
        let lon = self.x.trim().parse::<f64>().ok()?;
        let lat = self.y.trim().parse::<f64>().ok()?;
        Some(PlaceResult {
            place_name: self.place_name,
            address_name: self.address_name,
            coords: Coordinates::new(lat, lon),
        })
    }
}

/// "<province> <district>" from the first address document.
fn region_name(response: AddressResponse) -> Option<String> {
    let addr = response.documents.into_iter().next()?.address?;
    let name = format!("{} {}", addr.region_1depth_name, addr.region_2depth_name);
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

#[derive(Debug, Clone)]
pub struct KakaoMapClient {
    client: Arc<Client>,
    rest_api_key: String,
    base_url: String,
    retry: RetryPolicy,
}

impl KakaoMapClient {
    pub fn new(rest_api_key: &str, base_url: &str, timeout: Duration) -> Result<Self, WeatherError> {
        let client = build_client(timeout)?;
        Ok(Self {
            client: Arc::new(client),
            rest_api_key: rest_api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn auth_header(&self) -> String {
        format!("KakaoAK {}", self.rest_api_key)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, WeatherError> {
        let auth = self.auth_header();
        let response = send_with_retry(&self.retry, || {
            self.client.get(url).header("Authorization", &auth).send()
        })
        .await?;
        decode_json(response).await
    }

    /// Keyword search; documents with unparsable coordinates are skipped.
    #[instrument(skip(self), level = "info")]
    pub async fn keyword_search(&self, keyword: &str) -> Result<Vec<PlaceResult>, WeatherError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!(
            "{}/v2/local/search/keyword.json?query={}",
            self.base_url,
            urlencoding::encode(keyword)
        );
        let response: KeywordResponse = self.get_json(&url).await?;

        let total = response.documents.len();
        let places: Vec<PlaceResult> = response
            .documents
            .into_iter()
            .filter_map(KeywordDocument::into_place)
            .collect();
        if places.len() < total {
            tracing::debug!("Skipped {} places with bad coordinates", total - places.len());
        }
        Ok(places)
    }

    /// Region name for a coordinate.
    #[instrument(skip(self), level = "info")]
    pub async fn coord_to_region(&self, coords: Coordinates) -> Result<Option<String>, WeatherError> {
        coords.validate()?;
        let url = format!(
            "{}/v2/local/geo/coord2address.json?x={}&y={}",
            self.base_url, coords.lon, coords.lat
        );
        let response: AddressResponse = self.get_json(&url).await?;
        Ok(region_name(response))
    }
}

impl MapService for KakaoMapClient {
    async fn search(&self, keyword: &str) -> Result<Vec<PlaceResult>, WeatherError> {
        self.keyword_search(keyword).await
    }

    async fn reverse_geocode(&self, coords: Coordinates) -> Option<String> {
        match self.coord_to_region(coords).await {
            Ok(name) => name,
            Err(e) => {
                tracing::debug!("Reverse geocode failed: {}", e);
                None
            }
        }
    }
}
