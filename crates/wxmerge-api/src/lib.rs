//! # wxmerge-api
//!
//! HTTP surface of the weather aggregator: three read-only endpoints plus a
//! liveness probe.

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use wxmerge_core::{AppError, Config};
use wxmerge_weather::WeatherAggregator;

pub mod error;
pub mod routes;

pub use error::{ApiError, ErrorBody};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<WeatherAggregator>,
}

impl AppState {
    pub fn new(aggregator: WeatherAggregator) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::liveness))
        .route("/temperatures", get(routes::temperatures))
        .route("/speeds", get(routes::speeds))
        .route("/weather", get(routes::weather))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn serve(config: &Config, state: AppState) -> Result<(), AppError> {
    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;

    tracing::info!(
        "wxmerge v{} listening on {}",
        env!("CARGO_PKG_VERSION"),
        listener.local_addr()?
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
