use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cache;
mod config;
mod error;
mod routes;
mod service;
mod utils;
mod weather;

use cache::CacheService;
use config::Config;
use routes::{create_router, AppState};
use service::WeatherService;
use weather::openweather::OpenWeatherClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weather_proxy=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    let cache = Arc::new(CacheService::new(config.cache_ttls));
    spawn_cleanup(cache.clone(), config.cleanup_interval);

    // Initialize weather client
    let weather_client = Arc::new(OpenWeatherClient::new(config.clone())?);

    let state = AppState {
        weather: WeatherService::new(weather_client, cache),
    };

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Weather proxy starting on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically sweeps expired cache entries. The caches themselves never
/// schedule work.
fn spawn_cleanup(cache: Arc<CacheService>, period: std::time::Duration) {
    if period.is_zero() {
        tracing::info!("Periodic cache cleanup disabled");
        return;
    }

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await;
        loop {
            interval.tick().await;
            let removed = cache.cleanup_expired();
            tracing::debug!("Periodic cache cleanup removed {} entries", removed);
        }
    });
}
