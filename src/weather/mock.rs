use super::{Endpoint, UpstreamError, WeatherSource};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;

/// In-memory source with canned answers per endpoint that records every call.
pub struct MockWeatherClient {
    responses: Mutex<HashMap<Endpoint, Result<Value, UpstreamError>>>,
    calls: Mutex<Vec<(Endpoint, Vec<(String, String)>)>>,
}

impl MockWeatherClient {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answers for every endpoint, shaped like OpenWeatherMap's.
    pub fn with_defaults() -> Self {
        let client = Self::new();
        client.respond(Endpoint::CurrentWeather, Ok(sample_current()));
        client.respond(Endpoint::Forecast, Ok(sample_forecast()));
        client.respond(Endpoint::Geocode, Ok(sample_geocode()));
        client.respond(Endpoint::AirPollution, Ok(sample_air_pollution()));
        client
    }

    pub fn respond(&self, endpoint: Endpoint, response: Result<Value, UpstreamError>) {
        self.responses.lock().insert(endpoint, response);
    }

    pub fn call_count(&self, endpoint: Endpoint) -> usize {
        self.calls.lock().iter().filter(|(e, _)| *e == endpoint).count()
    }

    pub fn last_params(&self, endpoint: Endpoint) -> Option<Vec<(String, String)>> {
        self.calls
            .lock()
            .iter()
            .rev()
            .find(|(e, _)| *e == endpoint)
            .map(|(_, params)| params.clone())
    }
}

#[async_trait]
impl WeatherSource for MockWeatherClient {
    async fn fetch(&self, endpoint: Endpoint, params: &[(&str, String)]) -> Result<Value, UpstreamError> {
        self.calls.lock().push((
            endpoint,
            params.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
        ));

        self.responses
            .lock()
            .get(&endpoint)
            .cloned()
            .unwrap_or_else(|| Err(UpstreamError::Unavailable("no canned response".to_string())))
    }
}

pub fn sample_current() -> Value {
    json!({
        "coord": {"lon": -0.1257, "lat": 51.5085},
        "weather": [{"id": 800, "main": "Clear", "description": "clear sky", "icon": "01d"}],
        "main": {"temp": 15.5, "feels_like": 14.2, "temp_min": 14.0, "temp_max": 16.9, "pressure": 1019, "humidity": 65},
        "visibility": 10000,
        "wind": {"speed": 3.5, "deg": 240},
        "dt": 1642680000,
        "sys": {"country": "GB", "sunrise": 1642665000, "sunset": 1642696000},
        "timezone": 0,
        "name": "London"
    })
}

pub fn sample_forecast() -> Value {
    json!({
        "city": {"name": "Paris", "country": "FR", "timezone": 3600, "coord": {"lat": 48.8534, "lon": 2.3488}},
        "list": [
            {"dt": 1642680000, "main": {"temp": 12.5, "humidity": 80},
             "weather": [{"description": "light rain", "icon": "10d"}], "wind": {"speed": 4.1}},
            {"dt": 1642690800, "main": {"temp": 14.2, "humidity": 75},
             "weather": [{"description": "cloudy", "icon": "04d"}], "wind": {"speed": 3.2}}
        ]
    })
}

pub fn sample_geocode() -> Value {
    json!([
        {"name": "Springfield", "state": "Illinois", "country": "US", "lat": 39.7990, "lon": -89.6440},
        {"name": "Springfield", "country": "JM", "lat": 18.1, "lon": -77.5}
    ])
}

pub fn sample_air_pollution() -> Value {
    json!({
        "coord": {"lon": -0.1257, "lat": 51.5085},
        "list": [{
            "main": {"aqi": 3},
            "components": {"co": 230.31, "no2": 15.1, "o3": 68.66, "so2": 1.92, "pm2_5": 8.34, "pm10": 11.2},
            "dt": 1642680000
        }]
    })
}
