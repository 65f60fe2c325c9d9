//! Weather and map clients for Nalssi
//!
//! Current conditions and the 5-day forecast come from OpenWeatherMap.
//! Place search and reverse geocoding go through the [`MapService`] trait.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod cache;
pub mod geocode;
mod http;
pub mod maps;
pub mod provider;
pub mod retry;
pub mod types;

pub use geocode::{Geocoder, OWM_GEO_BASE_URL};
pub use maps::{KakaoMapClient, MapService, KAKAO_BASE_URL};
pub use provider::{WeatherProvider, WeatherSettings, OWM_BASE_URL};
pub use retry::RetryPolicy;
pub use types::*;
