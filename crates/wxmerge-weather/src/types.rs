use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};
use std::fmt;
use wxmerge_core::{NetworkError, ProviderConfig};

/// An absolute point in time with its UTC offset resolved.
pub type Instant = DateTime<FixedOffset>;

/// Fields returned by one provider for one date, `date` included.
pub type UpstreamRecord = Map<String, Value>;

/// Union of a temperature record and a wind-speed record for the same day.
pub type MergedRecord = Map<String, Value>;

/// Measurement type served by an upstream provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    Temperature,
    WindSpeed,
}

impl Facet {
    /// Base URL of the provider serving this facet
    pub fn provider_url(self, providers: &ProviderConfig) -> &str {
        match self {
            Self::Temperature => &providers.temperature_api_url,
            Self::WindSpeed => &providers.windspeed_api_url,
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temperature => f.write_str("temperature"),
            Self::WindSpeed => f.write_str("wind speed"),
        }
    }
}

/// Merge a wind-speed record into a temperature record.
///
/// Speed fields win on key collision.
pub fn merge_records(mut temperature: UpstreamRecord, speed: UpstreamRecord) -> MergedRecord {
    temperature.extend(speed);
    temperature
}

/// Which bound a date range violated.
///
/// Both variants render to fixed client-facing sentences; callers match on
/// the variant, clients only ever see the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeViolation {
    StartAfterEnd,
    OutOfBounds,
}

impl fmt::Display for RangeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartAfterEnd => {
                f.write_str("Start date needs to be greater than or equal end date.")
            }
            Self::OutOfBounds => f.write_str(
                "Start date needs to be less than 1900-01-01T00:00:00Z and end date can't be from the feature.",
            ),
        }
    }
}

/// Weather aggregation errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Both, start and end parameters needs to be provided.")]
    MissingParameter,

    #[error("Expecting date in ISO8601 format, eg. 2018-08-01T00:00:00Z, gets {0} instead.")]
    InvalidDateFormat(String),

    #[error("{0}")]
    InvalidRange(RangeViolation),

    #[error("{0}")]
    UpstreamRejected(String),

    #[error("Service unavailable ({0})")]
    UpstreamUnavailable(#[from] NetworkError),

    #[error("Failed to decode upstream response: {0}")]
    Decode(String),

    #[error("Temperature and wind-speed sequences diverged at index {index}")]
    AlignmentMismatch { index: usize },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl WeatherError {
    /// Whether the failure was caused by the request or by an upstream
    /// provider's answer to it, as opposed to a fault in this service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter
                | Self::InvalidDateFormat(_)
                | Self::InvalidRange(_)
                | Self::UpstreamRejected(_)
                | Self::UpstreamUnavailable(_)
        )
    }
}
