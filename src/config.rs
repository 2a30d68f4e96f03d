use std::env;
use std::time::Duration;

use crate::cache::CacheTtls;

#[derive(Clone, Debug)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub current_path: String,
    pub forecast_path: String,
    pub geocode_path: String,
    pub air_pollution_path: String,
    pub request_timeout: Duration,
    pub bind_addr: String,
    pub cache_ttls: CacheTtls,
    /// Period of the expired-entry sweep; zero turns it off.
    pub cleanup_interval: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = CacheTtls::default();

        Ok(Config {
            api_key: env::var("WEATHER_API_KEY")
                .map_err(|_| anyhow::anyhow!("WEATHER_API_KEY environment variable is required"))?,
            base_url: env::var("WEATHER_BASE_URL")
                .unwrap_or_else(|_| "https://api.openweathermap.org".to_string()),
            current_path: env::var("WEATHER_CURRENT_PATH")
                .unwrap_or_else(|_| "/data/2.5/weather".to_string()),
            forecast_path: env::var("WEATHER_FORECAST_PATH")
                .unwrap_or_else(|_| "/data/2.5/forecast".to_string()),
            geocode_path: env::var("WEATHER_GEOCODE_PATH")
                .unwrap_or_else(|_| "/geo/1.0/direct".to_string()),
            air_pollution_path: env::var("WEATHER_AIR_POLLUTION_PATH")
                .unwrap_or_else(|_| "/data/2.5/air_pollution".to_string()),
            request_timeout: secs_from_env("WEATHER_REQUEST_TIMEOUT_SECS", Duration::from_secs(10))?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".to_string()),
            cache_ttls: CacheTtls {
                current: secs_from_env("CACHE_TTL_CURRENT_SECS", defaults.current)?,
                forecast: secs_from_env("CACHE_TTL_FORECAST_SECS", defaults.forecast)?,
                search: secs_from_env("CACHE_TTL_SEARCH_SECS", defaults.search)?,
                air_quality: secs_from_env("CACHE_TTL_AIR_QUALITY_SECS", defaults.air_quality)?,
            },
            cleanup_interval: secs_from_env("CACHE_CLEANUP_INTERVAL_SECS", Duration::from_secs(5 * 60))?,
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config {
            api_key: "test_api_key".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
            current_path: "/data/2.5/weather".to_string(),
            forecast_path: "/data/2.5/forecast".to_string(),
            geocode_path: "/geo/1.0/direct".to_string(),
            air_pollution_path: "/data/2.5/air_pollution".to_string(),
            request_timeout: Duration::from_secs(10),
            bind_addr: "127.0.0.1:0".to_string(),
            cache_ttls: CacheTtls::default(),
            cleanup_interval: Duration::ZERO,
        }
    }
}

fn secs_from_env(name: &str, default: Duration) -> anyhow::Result<Duration> {
    match env::var(name) {
        Ok(raw) => parse_secs(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_secs(name: &str, raw: &str) -> anyhow::Result<Duration> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| anyhow::anyhow!("{} must be a whole number of seconds, got {:?}", name, raw))
}
