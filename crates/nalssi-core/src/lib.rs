//! Nalssi core: configuration, errors and the application root that ties
//! district search, favorites and the weather clients together.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod app;
pub mod config;
pub mod error;

pub use app::{App, Favorites};
pub use config::{
    Config, FavoritesBackend, FavoritesConfig, LocationConfig, MapsConfig, SearchConfig,
    ValidationResult, WeatherConfig, KAKAO_REST_API_KEY_ENV, OPENWEATHER_API_KEY_ENV,
};
pub use error::{AppError, ConfigError};

use anyhow::Result;

/// Install the tracing subscriber. `RUST_LOG` overrides the default `info` filter.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    tracing::debug!("Nalssi core initialized");
    Ok(())
}
