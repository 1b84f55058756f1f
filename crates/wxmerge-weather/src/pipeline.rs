//! Per-date fan-out to the upstream providers and the index-aligned merge
//! of their answers.

use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use std::pin::pin;
use std::sync::Arc;
use wxmerge_core::Config;

use crate::parse::DateParser;
use crate::provider::UpstreamClient;
use crate::range::{DailySequence, RangeGenerator};
use crate::types::{merge_records, Facet, MergedRecord, UpstreamRecord, WeatherError};

/// Drives range validation and upstream calls for one request at a time.
///
/// Holds no per-request state; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct WeatherAggregator {
    config: Arc<Config>,
    client: UpstreamClient,
    ranges: RangeGenerator,
}

impl WeatherAggregator {
    pub fn new(config: Arc<Config>) -> Result<Self, WeatherError> {
        Ok(Self::with_client(config, UpstreamClient::new()?))
    }

    pub fn with_client(config: Arc<Config>, client: UpstreamClient) -> Self {
        let ranges = RangeGenerator::new(DateParser::new(config.dates.naive_zone));
        Self {
            config,
            client,
            ranges,
        }
    }

    /// Temperature records for every day in `[start, end]`, in date order.
    pub async fn fetch_temperatures(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Vec<UpstreamRecord>, WeatherError> {
        self.fetch_facet(Facet::Temperature, start, end).await
    }

    /// Wind-speed records for every day in `[start, end]`, in date order.
    pub async fn fetch_speeds(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Vec<UpstreamRecord>, WeatherError> {
        self.fetch_facet(Facet::WindSpeed, start, end).await
    }

    /// Temperature and wind-speed fields merged per day, in date order.
    ///
    /// The range is validated once and both facet streams walk sequences
    /// derived from it, so entry `i` of one stream belongs with entry `i`
    /// of the other.
    pub async fn fetch_weather(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Vec<MergedRecord>, WeatherError> {
        let range = self.ranges.validate(start, end)?;
        tracing::debug!("Fetching weather for {} days", range.day_count());

        merge_aligned(
            self.facet_stream(Facet::Temperature, range.days()),
            self.facet_stream(Facet::WindSpeed, range.days()),
            range.day_count(),
        )
        .await
    }

    async fn fetch_facet(
        &self,
        facet: Facet,
        start: &str,
        end: &str,
    ) -> Result<Vec<UpstreamRecord>, WeatherError> {
        let days = self.ranges.build_range(start, end)?;
        tracing::debug!("Fetching {} records for {} days", facet, days.len());

        self.facet_stream(facet, days).try_collect().await
    }

    /// Lazily fetch one record per day, one request at a time, in order.
    ///
    /// The next request is only sent once the previous record is pulled, so
    /// a consumer that stops at the first error stops the calls too.
    pub fn facet_stream(
        &self,
        facet: Facet,
        days: DailySequence,
    ) -> impl Stream<Item = Result<UpstreamRecord, WeatherError>> + '_ {
        let url = facet.provider_url(&self.config.providers);
        let client = &self.client;

        stream::iter(days).then(move |date| async move { client.fetch(&date, url).await })
    }
}

/// Pair two record streams strictly by position and merge each pair.
///
/// Both streams are polled together so the two calls for one day overlap.
/// The first error from either side aborts the merge, and a stream ending
/// before the other is an [`WeatherError::AlignmentMismatch`].
pub async fn merge_aligned<T, S>(
    temperatures: T,
    speeds: S,
    capacity: usize,
) -> Result<Vec<MergedRecord>, WeatherError>
where
    T: Stream<Item = Result<UpstreamRecord, WeatherError>>,
    S: Stream<Item = Result<UpstreamRecord, WeatherError>>,
{
    let mut temperatures = pin!(temperatures);
    let mut speeds = pin!(speeds);
    let mut merged = Vec::with_capacity(capacity);

    loop {
        match tokio::join!(temperatures.next(), speeds.next()) {
            (None, None) => return Ok(merged),
            (Some(temperature), Some(speed)) => merged.push(merge_records(temperature?, speed?)),
            (temperature, speed) => {
                let index = merged.len();
                tracing::error!(
                    "Facet streams diverged at index {} (temperature: {}, speed: {})",
                    index,
                    temperature.is_some(),
                    speed.is_some()
                );
                return Err(WeatherError::AlignmentMismatch { index });
            }
        }
    }
}
