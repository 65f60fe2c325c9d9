//! Application-level error type for Nalssi.
//!
//! Each crate keeps its own error enum; `AppError` wraps them so callers at
//! the edges can log the full error and show `user_message()` to people.

use thiserror::Error;

use nalssi_places::{DatasetError, FavoritesError, StorageError};
use nalssi_weather::WeatherError;

/// Top-level application error type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Weather service error: {0}")]
    Weather(#[from] WeatherError),

    #[error("Favorites error: {0}")]
    Favorites(#[from] FavoritesError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("District dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Weather(e) => e.user_message().to_string(),
            AppError::Favorites(e) => e.user_message(),
            AppError::Storage(_) => "Saved data could not be accessed. Please try again.".to_string(),
            AppError::Dataset(_) => "The district list could not be loaded.".to_string(),
            AppError::Config(e) => e.user_message().to_string(),
            AppError::Io(_) => "A file operation failed. Please try again.".to_string(),
            AppError::Other(_) => "An unexpected error occurred. Please try again.".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_favorites_error_conversion() {
        let app_err: AppError = FavoritesError::CapacityExceeded { max: 6 }.into();
        assert!(matches!(
            app_err,
            AppError::Favorites(FavoritesError::CapacityExceeded { max: 6 })
        ));
        assert!(app_err.user_message().contains('6'));
    }

    #[test]
    fn test_weather_message_propagation() {
        let app_err = AppError::Weather(WeatherError::InvalidApiKey);
        assert_eq!(
            app_err.user_message(),
            WeatherError::InvalidApiKey.user_message()
        );
    }

    #[test]
    fn test_user_messages_are_non_empty() {
        let errors = vec![
            AppError::Weather(WeatherError::NotFound("x".into())),
            AppError::Favorites(FavoritesError::Validation("bad".into())),
            AppError::Storage(StorageError::Io(std::io::Error::other("disk"))),
            AppError::Config(ConfigError::Invalid("x".into())),
            AppError::Config(ConfigError::ParseError("x".into())),
            AppError::Io(std::io::Error::other("io")),
            AppError::Other(anyhow::anyhow!("boom")),
        ];

        for err in errors {
            assert!(!err.user_message().is_empty(), "{:?}", err);
        }
    }
}
