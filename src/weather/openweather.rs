use super::{Endpoint, WeatherSource};
use crate::config::Config;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("Invalid or missing API key")]
    Unauthorized,
    #[error("City not found")]
    NotFound,
    #[error("Rate limit reached, try again later")]
    RateLimited,
    #[error("{0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Unavailable("Request timeout - please try again".to_string())
        } else if err.is_connect() {
            UpstreamError::Unavailable("Network error, please check connection".to_string())
        } else {
            UpstreamError::Unavailable(format!("Network error: {}", err))
        }
    }
}

/// OpenWeatherMap adapter. One attempt per call, bounded by the configured
/// request timeout.
pub struct OpenWeatherClient {
    client: Client,
    config: Config,
}

impl OpenWeatherClient {
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("WeatherProxy/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { client, config })
    }

    fn endpoint_url(&self, endpoint: Endpoint) -> String {
        let path = match endpoint {
            Endpoint::CurrentWeather => &self.config.current_path,
            Endpoint::Forecast => &self.config.forecast_path,
            Endpoint::Geocode => &self.config.geocode_path,
            Endpoint::AirPollution => &self.config.air_pollution_path,
        };
        format!("{}{}", self.config.base_url, path)
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn fetch(&self, endpoint: Endpoint, params: &[(&str, String)]) -> Result<Value, UpstreamError> {
        let url = self.endpoint_url(endpoint);
        tracing::info!("Making API request to {} with params: {:?}", endpoint, params);

        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("appid", self.config.api_key.as_str())])
            .send()
            .await?;

        match response.status() {
            reqwest::StatusCode::OK => Ok(response.json::<Value>().await?),
            reqwest::StatusCode::UNAUTHORIZED => Err(UpstreamError::Unauthorized),
            reqwest::StatusCode::NOT_FOUND => Err(UpstreamError::NotFound),
            reqwest::StatusCode::TOO_MANY_REQUESTS => Err(UpstreamError::RateLimited),
            status => Err(UpstreamError::Unavailable(format!(
                "API error: {}",
                status.as_u16()
            ))),
        }
    }
}
