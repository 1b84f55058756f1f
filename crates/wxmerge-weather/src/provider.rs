//! Single-shot HTTP client for upstream measurement providers.

use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;
use wxmerge_core::{NetworkError, ReqwestErrorExt};

use crate::types::{UpstreamRecord, WeatherError};

const USER_AGENT: &str = concat!("wxmerge/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Arc<Client>,
}

impl UpstreamClient {
    /// Build a client with the transport's default timeouts.
    pub fn new() -> Result<Self, WeatherError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Query one provider for one date: `GET <provider_url>?at=<date>`.
    ///
    /// Exactly one request is sent; nothing is retried.
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch(&self, date: &str, provider_url: &str) -> Result<UpstreamRecord, WeatherError> {
        let url = format!("{}?at={}", provider_url, urlencoding::encode(date));

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| WeatherError::UpstreamUnavailable(e.into_network_error()))?;

        let status = response.status();
        if !status.is_success() {
            let err = Self::rejection(status, response).await;
            tracing::warn!("Upstream {} answered {}: {}", provider_url, status, err);
            return Err(err);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| WeatherError::UpstreamUnavailable(e.into_network_error()))?;

        serde_json::from_slice(&body).map_err(|e| WeatherError::Decode(e.to_string()))
    }

    /// Turn a non-success response into an error, preferring the
    /// provider's own `message` when the body carries one.
    async fn rejection(status: StatusCode, response: Response) -> WeatherError {
        let body = response.bytes().await.unwrap_or_default();

        let message = serde_json::from_slice::<Value>(&body)
            .ok()
            .and_then(|value| match value.get("message") {
                Some(Value::String(message)) => Some(message.clone()),
                Some(other) => Some(other.to_string()),
                None => None,
            });

        match message {
            Some(message) => WeatherError::UpstreamRejected(message),
            None => WeatherError::UpstreamUnavailable(NetworkError::ServerError {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("Unknown status")
                    .to_string(),
            }),
        }
    }
}
