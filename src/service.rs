use serde_json::Value;
use std::sync::Arc;

use crate::cache::{CacheService, CacheServiceStats, TtlCache};
use crate::error::WeatherError;
use crate::utils::validate_coordinates;
use crate::weather::mapper::{
    map_air_quality, map_current_weather, map_forecast, map_locations, MappingError,
};
use crate::weather::types::{
    NormalizedAirQuality, NormalizedForecast, NormalizedLocation, NormalizedWeather, UnitsMode,
};
use crate::weather::{Endpoint, WeatherSource};

/// Most results a location search asks the upstream for.
pub const SEARCH_LIMIT: usize = 8;
pub const MIN_SEARCH_LEN: usize = 2;

/// Coordinates as the caller wrote them, plus their parsed values.
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinates {
    pub lat_raw: String,
    pub lon_raw: String,
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn parse(lat: &str, lon: &str) -> Result<Self, WeatherError> {
        let invalid = || WeatherError::InvalidInput("Invalid latitude or longitude coordinates".to_string());
        let lat_value: f64 = lat.trim().parse().map_err(|_| invalid())?;
        let lon_value: f64 = lon.trim().parse().map_err(|_| invalid())?;
        validate_coordinates(lat_value, lon_value).map_err(WeatherError::InvalidInput)?;

        Ok(Self {
            lat_raw: lat.to_string(),
            lon_raw: lon.to_string(),
            lat: lat_value,
            lon: lon_value,
        })
    }

    /// Cache-key fragment. Equivalent numbers written differently stay distinct.
    pub fn key_fragment(&self) -> String {
        format!("{},{}", self.lat_raw, self.lon_raw)
    }

    fn upstream_params(&self) -> Vec<(&'static str, String)> {
        vec![("lat", self.lat.to_string()), ("lon", self.lon.to_string())]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    City(String),
    Coordinates(Coordinates),
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

impl LocationQuery {
    /// A city wins over coordinates when both are supplied.
    pub fn from_params(
        city: Option<&str>,
        lat: Option<&str>,
        lon: Option<&str>,
    ) -> Result<Self, WeatherError> {
        if let Some(city) = non_blank(city) {
            return Ok(LocationQuery::City(city.to_string()));
        }

        match (non_blank(lat), non_blank(lon)) {
            (Some(lat), Some(lon)) => Ok(LocationQuery::Coordinates(Coordinates::parse(lat, lon)?)),
            _ => Err(WeatherError::InvalidInput(
                "Either city or lat/lon coordinates are required".to_string(),
            )),
        }
    }

    fn key_fragment(&self) -> String {
        match self {
            LocationQuery::City(city) => city.clone(),
            LocationQuery::Coordinates(coords) => coords.key_fragment(),
        }
    }

    fn upstream_params(&self, units: UnitsMode) -> Vec<(&'static str, String)> {
        let mut params = match self {
            LocationQuery::City(city) => vec![("q", city.clone())],
            LocationQuery::Coordinates(coords) => coords.upstream_params(),
        };
        params.push(("units", units.as_str().to_string()));
        params
    }
}

pub fn current_key(query: &LocationQuery, units: UnitsMode) -> String {
    format!("current:{}:{}", query.key_fragment(), units)
}

pub fn forecast_key(query: &LocationQuery, units: UnitsMode) -> String {
    format!("forecast:{}:{}", query.key_fragment(), units)
}

pub fn search_key(query: &str) -> String {
    format!("search:{}", query.to_lowercase())
}

pub fn air_quality_key(coords: &Coordinates) -> String {
    format!("aqi:{}", coords.key_fragment())
}

/// Serves normalized weather data, reading through the per-kind caches.
#[derive(Clone)]
pub struct WeatherService {
    source: Arc<dyn WeatherSource>,
    cache: Arc<CacheService>,
}

impl WeatherService {
    pub fn new(source: Arc<dyn WeatherSource>, cache: Arc<CacheService>) -> Self {
        Self { source, cache }
    }

    pub async fn current_weather(
        &self,
        query: &LocationQuery,
        units: UnitsMode,
    ) -> Result<NormalizedWeather, WeatherError> {
        self.read_through(
            &self.cache.current,
            current_key(query, units),
            Endpoint::CurrentWeather,
            query.upstream_params(units),
            |raw| map_current_weather(raw, units),
        )
        .await
    }

    pub async fn forecast(
        &self,
        query: &LocationQuery,
        units: UnitsMode,
    ) -> Result<NormalizedForecast, WeatherError> {
        self.read_through(
            &self.cache.forecast,
            forecast_key(query, units),
            Endpoint::Forecast,
            query.upstream_params(units),
            |raw| map_forecast(raw, units),
        )
        .await
    }

    pub async fn search_locations(&self, query: &str) -> Result<Vec<NormalizedLocation>, WeatherError> {
        let trimmed = query.trim();
        if trimmed.chars().count() < MIN_SEARCH_LEN {
            return Err(WeatherError::InvalidInput(format!(
                "Search query must be at least {} characters",
                MIN_SEARCH_LEN
            )));
        }

        self.read_through(
            &self.cache.search,
            search_key(query),
            Endpoint::Geocode,
            vec![("q", trimmed.to_string()), ("limit", SEARCH_LIMIT.to_string())],
            map_locations,
        )
        .await
    }

    pub async fn air_quality(&self, coords: &Coordinates) -> Result<NormalizedAirQuality, WeatherError> {
        self.read_through(
            &self.cache.air_quality,
            air_quality_key(coords),
            Endpoint::AirPollution,
            coords.upstream_params(),
            map_air_quality,
        )
        .await
    }

    pub fn cache_stats(&self) -> CacheServiceStats {
        self.cache.stats()
    }

    pub fn cleanup_expired(&self) -> usize {
        self.cache.cleanup_expired()
    }

    /// Serves `key` from `cache`, or makes a single upstream call and stores
    /// the mapped result. Failures are returned as-is and never stored.
    async fn read_through<V, F>(
        &self,
        cache: &TtlCache<V>,
        key: String,
        endpoint: Endpoint,
        params: Vec<(&'static str, String)>,
        map: F,
    ) -> Result<V, WeatherError>
    where
        V: Clone,
        F: FnOnce(&Value) -> Result<V, MappingError>,
    {
        if let Some(hit) = cache.get(&key) {
            tracing::debug!("Cache hit for {}", key);
            return Ok(hit);
        }
        tracing::debug!("Cache miss for {}", key);

        let raw = self.source.fetch(endpoint, &params).await.map_err(|e| {
            tracing::warn!("Upstream {} request failed: {}", endpoint, e);
            WeatherError::from(e)
        })?;
        let value = map(&raw)?;

        cache.set(key, value.clone());
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::tests::ManualClock;
    use crate::cache::CacheTtls;
    use crate::weather::mock::{sample_current, MockWeatherClient};
    use crate::weather::UpstreamError;

    fn service_with(source: Arc<MockWeatherClient>) -> (WeatherService, ManualClock) {
        let clock = ManualClock::new();
        let cache = Arc::new(CacheService::with_clock(CacheTtls::default(), clock.clock()));
        (WeatherService::new(source, cache), clock)
    }

    fn city(name: &str) -> LocationQuery {
        LocationQuery::City(name.to_string())
    }

    #[test]
    fn test_location_query_from_params() {
        assert_eq!(
            LocationQuery::from_params(Some("London"), Some("1"), Some("2")).unwrap(),
            city("London")
        );

        let coords = LocationQuery::from_params(None, Some("40.7128"), Some("-74.0060")).unwrap();
        match coords {
            LocationQuery::Coordinates(c) => {
                assert_eq!(c.lat, 40.7128);
                assert_eq!(c.lon_raw, "-74.0060");
            }
            other => panic!("expected coordinates, got {:?}", other),
        }

        for (city, lat, lon) in [
            (None, None, None),
            (Some("  "), None, None),
            (None, Some("40.0"), None),
            (None, Some("north"), Some("10")),
            (None, Some("95"), Some("10")),
        ] {
            assert!(matches!(
                LocationQuery::from_params(city, lat, lon),
                Err(WeatherError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_cache_keys() {
        let coords = Coordinates::parse("40.0", "-74.0").unwrap();
        let other = Coordinates::parse("40.00", "-74.0").unwrap();

        assert_eq!(current_key(&city("London"), UnitsMode::Metric), "current:London:metric");
        assert_eq!(forecast_key(&city("London"), UnitsMode::Imperial), "forecast:London:imperial");
        assert_eq!(
            current_key(&LocationQuery::Coordinates(coords.clone()), UnitsMode::Metric),
            "current:40.0,-74.0:metric"
        );
        assert_ne!(air_quality_key(&coords), air_quality_key(&other));
        assert_eq!(air_quality_key(&coords), "aqi:40.0,-74.0");
        assert_eq!(search_key("New York"), "search:new york");
    }

    #[tokio::test]
    async fn test_current_weather_is_cached_until_ttl() {
        let source = Arc::new(MockWeatherClient::with_defaults());
        let (service, clock) = service_with(source.clone());

        let first = service.current_weather(&city("London"), UnitsMode::Metric).await.unwrap();
        let second = service.current_weather(&city("London"), UnitsMode::Metric).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.description, "Clear Sky");
        assert_eq!(source.call_count(Endpoint::CurrentWeather), 1);

        // Different units are a different logical query.
        let imperial = service.current_weather(&city("London"), UnitsMode::Imperial).await.unwrap();
        assert_eq!(imperial.temp_unit, "°F");
        assert_eq!(source.call_count(Endpoint::CurrentWeather), 2);

        clock.advance(10 * 60);
        service.current_weather(&city("London"), UnitsMode::Metric).await.unwrap();
        assert_eq!(source.call_count(Endpoint::CurrentWeather), 3);
    }

    #[tokio::test]
    async fn test_upstream_params() {
        let source = Arc::new(MockWeatherClient::with_defaults());
        let (service, _) = service_with(source.clone());

        let query = LocationQuery::from_params(None, Some("40.7128"), Some("-74.0060")).unwrap();
        service.forecast(&query, UnitsMode::Imperial).await.unwrap();

        let params = source.last_params(Endpoint::Forecast).unwrap();
        assert_eq!(
            params,
            vec![
                ("lat".to_string(), "40.7128".to_string()),
                ("lon".to_string(), "-74.006".to_string()),
                ("units".to_string(), "imperial".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let source = Arc::new(MockWeatherClient::new());
        source.respond(Endpoint::CurrentWeather, Err(UpstreamError::NotFound));
        let (service, _) = service_with(source.clone());

        let err = service.current_weather(&city("Atlantis"), UnitsMode::Metric).await.unwrap_err();
        assert!(matches!(err, WeatherError::UpstreamNotFound));

        source.respond(Endpoint::CurrentWeather, Ok(sample_current()));
        service.current_weather(&city("Atlantis"), UnitsMode::Metric).await.unwrap();
        assert_eq!(source.call_count(Endpoint::CurrentWeather), 2);
        assert_eq!(service.cache_stats().current.total_entries, 1);
    }

    #[tokio::test]
    async fn test_mapping_failure_is_surfaced() {
        let source = Arc::new(MockWeatherClient::new());
        source.respond(Endpoint::CurrentWeather, Ok(serde_json::json!({"name": "London"})));
        let (service, _) = service_with(source);

        let err = service.current_weather(&city("London"), UnitsMode::Metric).await.unwrap_err();
        assert_eq!(err.kind(), "mapping_error");
        assert_eq!(service.cache_stats().current.total_entries, 0);
    }

    #[tokio::test]
    async fn test_search_locations() {
        let source = Arc::new(MockWeatherClient::with_defaults());
        let (service, clock) = service_with(source.clone());

        assert!(matches!(
            service.search_locations(" a ").await,
            Err(WeatherError::InvalidInput(_))
        ));
        assert_eq!(source.call_count(Endpoint::Geocode), 0);

        let results = service.search_locations("Springfield").await.unwrap();
        assert_eq!(results[0].display_name, "Springfield, Illinois US");
        assert_eq!(results[1].display_name, "Springfield JM");
        assert_eq!(
            source.last_params(Endpoint::Geocode).unwrap()[1],
            ("limit".to_string(), "8".to_string())
        );

        // Case-insensitive key.
        service.search_locations("SPRINGFIELD").await.unwrap();
        assert_eq!(source.call_count(Endpoint::Geocode), 1);

        clock.advance(5 * 60);
        service.search_locations("springfield").await.unwrap();
        assert_eq!(source.call_count(Endpoint::Geocode), 2);
    }

    #[tokio::test]
    async fn test_air_quality_uses_long_ttl() {
        let source = Arc::new(MockWeatherClient::with_defaults());
        let (service, clock) = service_with(source.clone());
        let coords = Coordinates::parse("51.5085", "-0.1257").unwrap();

        let aq = service.air_quality(&coords).await.unwrap();
        assert_eq!(aq.aqi, 3);
        assert_eq!(aq.aqi_description, "Moderate");

        clock.advance(29 * 60);
        service.air_quality(&coords).await.unwrap();
        assert_eq!(source.call_count(Endpoint::AirPollution), 1);

        clock.advance(60);
        service.air_quality(&coords).await.unwrap();
        assert_eq!(source.call_count(Endpoint::AirPollution), 2);
    }

    #[tokio::test]
    async fn test_cleanup_expired_sweeps_all_namespaces() {
        let source = Arc::new(MockWeatherClient::with_defaults());
        let (service, clock) = service_with(source);
        let coords = Coordinates::parse("51.5", "-0.12").unwrap();

        service.current_weather(&city("London"), UnitsMode::Metric).await.unwrap();
        service.search_locations("Springfield").await.unwrap();
        service.air_quality(&coords).await.unwrap();

        clock.advance(10 * 60);
        assert_eq!(service.cleanup_expired(), 2);

        let stats = service.cache_stats();
        assert_eq!(stats.air_quality.active_entries, 1);
        assert_eq!(stats.current.total_entries, 0);
    }
}
