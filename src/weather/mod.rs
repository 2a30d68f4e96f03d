pub mod mapper;
#[cfg(test)]
pub mod mock;
pub mod openweather;
pub mod types;

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

pub use openweather::UpstreamError;

/// Upstream resources the proxy reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    CurrentWeather,
    Forecast,
    Geocode,
    AirPollution,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Endpoint::CurrentWeather => "weather",
            Endpoint::Forecast => "forecast",
            Endpoint::Geocode => "geocode",
            Endpoint::AirPollution => "air_pollution",
        };
        f.write_str(name)
    }
}

/// A weather provider that answers raw JSON for an endpoint and its query
/// parameters. Payload shapes follow OpenWeatherMap; the functions in
/// [`mapper`] turn them into normalized records.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch(&self, endpoint: Endpoint, params: &[(&str, String)]) -> Result<Value, UpstreamError>;
}
