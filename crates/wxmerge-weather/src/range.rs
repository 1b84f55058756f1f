//! Date range validation and the daily sequence derived from it.

use chrono::{Days, Offset, SubsecRound, Utc};
use std::iter::FusedIterator;

use crate::parse::{format_instant, DateParser};
use crate::types::{Instant, RangeViolation, WeatherError};

/// Earliest accepted start, parsed with the same zone rules as request dates.
pub const FLOOR_DATE: &str = "1900";

/// A validated, inclusive `[start, end]` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: Instant,
    end: Instant,
}

impl DateRange {
    /// A fresh daily sequence over this range.
    ///
    /// Every call re-derives the sequence from the bounds; nothing is cached.
    pub fn days(&self) -> DailySequence {
        DailySequence {
            next: Some(self.start.trunc_subsecs(0)),
            end: self.end,
        }
    }

    /// Number of entries [`DateRange::days`] yields
    pub fn day_count(&self) -> usize {
        self.days().len()
    }
}

/// One ISO8601 string per day from start to end inclusive.
///
/// Single pass: once exhausted it stays exhausted. Use [`DateRange::days`]
/// to walk the range again.
#[derive(Debug)]
pub struct DailySequence {
    next: Option<Instant>,
    end: Instant,
}

impl DailySequence {
    fn remaining(&self) -> usize {
        match self.next {
            Some(next) if next <= self.end => usize::try_from((self.end - next).num_days())
                .map_or(0, |days| days.saturating_add(1)),
            _ => 0,
        }
    }
}

impl Iterator for DailySequence {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let current = self.next.take().filter(|current| *current <= self.end)?;
        self.next = current.checked_add_days(Days::new(1));
        Some(format_instant(&current))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for DailySequence {}

impl FusedIterator for DailySequence {}

/// Validates `start`/`end` request parameters and produces daily sequences.
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeGenerator {
    parser: DateParser,
}

impl RangeGenerator {
    pub fn new(parser: DateParser) -> Self {
        Self { parser }
    }

    /// Validate the bounds and return the daily sequence between them.
    pub fn build_range(&self, start: &str, end: &str) -> Result<DailySequence, WeatherError> {
        Ok(self.validate(start, end)?.days())
    }

    /// Validate the bounds against the current time.
    pub fn validate(&self, start: &str, end: &str) -> Result<DateRange, WeatherError> {
        self.validate_at(start, end, Utc::now().with_timezone(&Utc.fix()))
    }

    /// Validate the bounds against an explicit `now`.
    ///
    /// Checks run in a fixed order: presence, format, ordering, then the
    /// floor/now window.
    pub fn validate_at(
        &self,
        start: &str,
        end: &str,
        now: Instant,
    ) -> Result<DateRange, WeatherError> {
        if start.is_empty() || end.is_empty() {
            return Err(WeatherError::MissingParameter);
        }

        let start = self.parser.parse(start)?;
        let end = self.parser.parse(end)?;

        if start > end {
            return Err(WeatherError::InvalidRange(RangeViolation::StartAfterEnd));
        }

        let floor = self.parser.parse(FLOOR_DATE)?;
        if start < floor || end > now {
            return Err(WeatherError::InvalidRange(RangeViolation::OutOfBounds));
        }

        Ok(DateRange { start, end })
    }
}
