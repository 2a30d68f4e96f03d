use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    cache::CacheServiceStats,
    error::WeatherError,
    service::{Coordinates, LocationQuery, WeatherService},
    utils::ErrorResponse,
    weather::types::{
        NormalizedAirQuality, NormalizedForecast, NormalizedLocation, NormalizedWeather, UnitsMode,
    },
};

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub weather: WeatherService,
}

// Request/Response types
#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub city: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub units: Option<String>,
}

impl WeatherQuery {
    fn resolve(&self) -> Result<(LocationQuery, UnitsMode), WeatherError> {
        let location = LocationQuery::from_params(
            self.city.as_deref(),
            self.lat.as_deref(),
            self.lon.as_deref(),
        )?;
        let units = match self.units.as_deref() {
            Some(raw) => raw.parse::<UnitsMode>().map_err(WeatherError::InvalidInput)?,
            None => UnitsMode::default(),
        };
        Ok((location, units))
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AirQualityQuery {
    pub lat: Option<String>,
    pub lon: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub removed: usize,
}

// Route handlers
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn get_current_weather(
    State(state): State<AppState>,
    Query(params): Query<WeatherQuery>,
) -> Result<Json<NormalizedWeather>, WeatherError> {
    let (location, units) = params.resolve()?;
    Ok(Json(state.weather.current_weather(&location, units).await?))
}

pub async fn get_forecast(
    State(state): State<AppState>,
    Query(params): Query<WeatherQuery>,
) -> Result<Json<NormalizedForecast>, WeatherError> {
    let (location, units) = params.resolve()?;
    Ok(Json(state.weather.forecast(&location, units).await?))
}

pub async fn search_locations(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<NormalizedLocation>>, WeatherError> {
    let query = params.q.unwrap_or_default();
    Ok(Json(state.weather.search_locations(&query).await?))
}

pub async fn get_air_quality(
    State(state): State<AppState>,
    Query(params): Query<AirQualityQuery>,
) -> Result<Json<NormalizedAirQuality>, WeatherError> {
    let (lat, lon) = match (params.lat.as_deref(), params.lon.as_deref()) {
        (Some(lat), Some(lon)) if !lat.trim().is_empty() && !lon.trim().is_empty() => (lat, lon),
        _ => {
            return Err(WeatherError::InvalidInput(
                "Latitude and longitude are required".to_string(),
            ))
        }
    };
    let coords = Coordinates::parse(lat, lon)?;
    Ok(Json(state.weather.air_quality(&coords).await?))
}

pub async fn get_cache_stats(State(state): State<AppState>) -> Json<CacheServiceStats> {
    Json(state.weather.cache_stats())
}

pub async fn cleanup_cache(State(state): State<AppState>) -> Json<CleanupResponse> {
    let removed = state.weather.cleanup_expired();
    tracing::info!("Manual cache cleanup removed {} entries", removed);
    Json(CleanupResponse { removed })
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new("Endpoint not found", "not_found")),
    )
}

// Create the router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/weather/current", get(get_current_weather))
        .route("/api/weather/forecast", get(get_forecast))
        .route("/api/locations/search", get(search_locations))
        .route("/api/air-quality", get(get_air_quality))
        .route("/api/cache/stats", get(get_cache_stats))
        .route("/api/cache/cleanup", post(cleanup_cache))
        .fallback(not_found)
        .with_state(state)
}
