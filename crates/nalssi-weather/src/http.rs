//! Shared HTTP plumbing for the weather and map clients.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::types::WeatherError;

const USER_AGENT: &str = concat!("Nalssi/", env!("CARGO_PKG_VERSION"));

pub(crate) fn build_client(timeout: Duration) -> Result<Client, WeatherError> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Decode a JSON body, mapping error statuses onto `WeatherError`.
pub(crate) async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, WeatherError> {
    let status = response.status();

    if status.is_success() {
        let body = response.text().await?;
        return serde_json::from_str(&body).map_err(|e| WeatherError::Parse(e.to_string()));
    }

    let text = response.text().await.unwrap_or_default();
    match status {
        StatusCode::UNAUTHORIZED => Err(WeatherError::InvalidApiKey),
        StatusCode::NOT_FOUND => Err(WeatherError::NotFound(text)),
        _ => Err(WeatherError::Api {
            status: status.as_u16(),
            message: text,
        }),
    }
}
