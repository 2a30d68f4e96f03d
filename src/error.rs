use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

use crate::utils::ErrorResponse;
use crate::weather::{mapper::MappingError, UpstreamError};

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("Invalid or missing API key")]
    UpstreamAuth,
    #[error("City not found")]
    UpstreamNotFound,
    #[error("Rate limit reached, try again later")]
    UpstreamRateLimited,
    #[error("{0}")]
    UpstreamUnavailable(String),
    #[error(transparent)]
    Mapping(#[from] MappingError),
}

impl WeatherError {
    /// Stable identifier for the error category.
    pub fn kind(&self) -> &'static str {
        match self {
            WeatherError::InvalidInput(_) => "invalid_input",
            WeatherError::UpstreamAuth => "upstream_auth_error",
            WeatherError::UpstreamNotFound => "upstream_not_found",
            WeatherError::UpstreamRateLimited => "upstream_rate_limited",
            WeatherError::UpstreamUnavailable(_) => "upstream_unavailable",
            WeatherError::Mapping(_) => "mapping_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            WeatherError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            WeatherError::UpstreamAuth => StatusCode::BAD_GATEWAY,
            WeatherError::UpstreamNotFound => StatusCode::NOT_FOUND,
            WeatherError::UpstreamRateLimited => StatusCode::TOO_MANY_REQUESTS,
            WeatherError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            WeatherError::Mapping(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<UpstreamError> for WeatherError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Unauthorized => WeatherError::UpstreamAuth,
            UpstreamError::NotFound => WeatherError::UpstreamNotFound,
            UpstreamError::RateLimited => WeatherError::UpstreamRateLimited,
            UpstreamError::Unavailable(message) => WeatherError::UpstreamUnavailable(message),
        }
    }
}

impl IntoResponse for WeatherError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed ({}): {}", self.kind(), self);
        } else {
            tracing::warn!("Request rejected ({}): {}", self.kind(), self);
        }

        (status, Json(ErrorResponse::new(&self.to_string(), self.kind()))).into_response()
    }
}
