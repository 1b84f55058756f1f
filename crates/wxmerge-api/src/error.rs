//! Request-boundary error type and its HTTP rendering.

use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use wxmerge_weather::WeatherError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Weather(#[from] WeatherError),

    #[error("{0}")]
    Query(String),
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Query(rejection.body_text())
    }
}

/// Body of every error response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Weather(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Weather(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Query(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            tracing::debug!("Request rejected: {}", self);
            self.to_string()
        };

        (status, Json(ErrorBody { message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wxmerge_weather::RangeViolation;

    #[test]
    fn test_validation_errors_are_bad_request() {
        let err = ApiError::from(WeatherError::InvalidRange(RangeViolation::StartAfterEnd));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.to_string(),
            "Start date needs to be greater than or equal end date."
        );
    }

    #[test]
    fn test_decode_failure_is_internal() {
        let err = ApiError::from(WeatherError::Decode("expected value".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_response_carries_json_content_type() {
        let response = ApiError::from(WeatherError::MissingParameter).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()["content-type"].to_str().unwrap(),
            "application/json"
        );
    }
}
