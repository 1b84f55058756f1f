//! Weather aggregation for wxmerge
//!
//! Validates request date ranges, queries the temperature and wind-speed
//! providers once per day, and merges their answers in date order.

pub mod types;
pub mod parse;
pub mod range;
pub mod provider;
pub mod pipeline;

pub use types::*;
pub use parse::{format_instant, DateParser};
pub use range::{DailySequence, DateRange, RangeGenerator, FLOOR_DATE};
pub use provider::UpstreamClient;
pub use pipeline::{merge_aligned, WeatherAggregator};
