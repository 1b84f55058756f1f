//! ISO8601 parsing and formatting for request dates.
//!
//! Accepted dates: calendar (`YYYY`, `YYYY-MM`, `YYYY-MM-DD`, `YYYYMMDD`),
//! week (`YYYY-Www[-D]`, `YYYYWww[D]`) and ordinal (`YYYY-DDD`, `YYYYDDD`),
//! optionally followed by `T` (or a space) and a clock time `HH[:MM[:SS[.f]]]` or
//! `HH[MM[SS[.f]]]`, optionally followed by `Z`, `±HH`, `±HHMM` or `±HH:MM`.

use chrono::{
    Days, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc, Weekday,
};
use wxmerge_core::NaiveZone;

use crate::types::{Instant, WeatherError};

/// Parses request dates into offset-aware instants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateParser {
    naive_zone: NaiveZone,
}

impl DateParser {
    pub fn new(naive_zone: NaiveZone) -> Self {
        Self { naive_zone }
    }

    /// Parse an ISO8601 date or date-time.
    ///
    /// An explicit offset is kept as written. Input without one is anchored
    /// to the parser's [`NaiveZone`].
    pub fn parse(&self, input: &str) -> Result<Instant, WeatherError> {
        parse_components(input)
            .and_then(|(naive, offset)| self.anchor(naive, offset))
            .ok_or_else(|| WeatherError::InvalidDateFormat(input.to_string()))
    }

    fn anchor(&self, naive: NaiveDateTime, offset: Option<FixedOffset>) -> Option<Instant> {
        if let Some(offset) = offset {
            return offset.from_local_datetime(&naive).single();
        }

        match self.naive_zone {
            NaiveZone::Utc => Some(Utc.from_utc_datetime(&naive).with_timezone(&Utc.fix())),
            NaiveZone::Local => {
                let offset = match Local.from_local_datetime(&naive).earliest() {
                    Some(local) => local.offset().fix(),
                    // Wall-clock time skipped by a DST transition
                    None => Local.offset_from_utc_datetime(&naive).fix(),
                };
                offset.from_local_datetime(&naive).single()
            }
        }
    }
}

/// Render an instant as `YYYY-MM-DDTHH:MM:SS[.ffffff]±HH:MM`.
///
/// The fraction is printed only when the instant has sub-second precision.
pub fn format_instant(instant: &Instant) -> String {
    if instant.timestamp_subsec_micros() == 0 {
        instant.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
    } else {
        instant.format("%Y-%m-%dT%H:%M:%S%.6f%:z").to_string()
    }
}

fn parse_components(input: &str) -> Option<(NaiveDateTime, Option<FixedOffset>)> {
    if !input.is_ascii() {
        return None;
    }

    let (date_part, time_part) = match input.find(|c: char| matches!(c, 'T' | 't' | ' ')) {
        Some(i) => (&input[..i], Some(&input[i + 1..])),
        None => (input, None),
    };

    let date = parse_date(date_part)?;
    let Some(time_part) = time_part else {
        return Some((date.and_hms_opt(0, 0, 0)?, None));
    };

    let (clock, offset) = split_offset(time_part)?;
    let (time, next_day) = parse_time(clock)?;
    let date = if next_day {
        date.checked_add_days(Days::new(1))?
    } else {
        date
    };

    Some((date.and_time(time), offset))
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let bytes = s.as_bytes();
    let year = i32::try_from(digits(s.get(..4)?)?).ok()?;

    match (bytes.len(), bytes.get(4), bytes.get(5), bytes.get(7)) {
        (4, _, _, _) => NaiveDate::from_ymd_opt(year, 1, 1),
        (_, Some(b'W'), _, _) => parse_week_date(year, &s[5..], false),
        (_, Some(b'-'), Some(b'W'), _) => parse_week_date(year, &s[6..], true),
        (7, Some(b'-'), _, _) => NaiveDate::from_ymd_opt(year, digits(&s[5..7])?, 1),
        (7, _, _, _) => NaiveDate::from_yo_opt(year, digits(&s[4..])?),
        (8, Some(b'-'), _, _) => NaiveDate::from_yo_opt(year, digits(&s[5..])?),
        (8, _, _, _) => NaiveDate::from_ymd_opt(year, digits(&s[4..6])?, digits(&s[6..])?),
        (10, Some(b'-'), _, Some(b'-')) => {
            NaiveDate::from_ymd_opt(year, digits(&s[5..7])?, digits(&s[8..])?)
        }
        _ => None,
    }
}

/// `ww`, `wwD` or `ww-D` after the `W` marker. A missing weekday is Monday.
fn parse_week_date(year: i32, rest: &str, extended: bool) -> Option<NaiveDate> {
    let (week, weekday) = match (rest.len(), extended) {
        (2, _) => (rest, None),
        (3, false) => (&rest[..2], Some(&rest[2..])),
        (4, true) if rest.as_bytes().get(2) == Some(&b'-') => (&rest[..2], Some(&rest[3..])),
        _ => return None,
    };

    let weekday = match weekday {
        Some(d) => {
            let index = usize::try_from(digits(d)?.checked_sub(1)?).ok()?;
            *WEEKDAYS.get(index)?
        }
        None => Weekday::Mon,
    };

    NaiveDate::from_isoywd_opt(year, digits(week)?, weekday)
}

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn split_offset(s: &str) -> Option<(&str, Option<FixedOffset>)> {
    if let Some(clock) = s.strip_suffix(|c: char| c == 'Z' || c == 'z') {
        return Some((clock, Some(Utc.fix())));
    }

    match s.find(|c: char| c == '+' || c == '-') {
        Some(i) => Some((&s[..i], Some(parse_offset(&s[i..])?))),
        None => Some((s, None)),
    }
}

fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, body) = match s.split_at(1) {
        ("+", body) => (1, body),
        ("-", body) => (-1, body),
        _ => return None,
    };

    let (hours, minutes) = match body.len() {
        2 => (digits(body)?, 0),
        4 => (digits(&body[..2])?, digits(&body[2..])?),
        5 if body.as_bytes().get(2) == Some(&b':') => (digits(&body[..2])?, digits(&body[3..])?),
        _ => return None,
    };
    if hours > 23 || minutes > 59 {
        return None;
    }

    FixedOffset::east_opt(sign * i32::try_from(hours * 3600 + minutes * 60).ok()?)
}

/// Returns the time of day and whether it rolled over to the next day
/// (`24:00`).
fn parse_time(s: &str) -> Option<(NaiveTime, bool)> {
    let (clock, fraction) = match s.find(|c: char| c == '.' || c == ',') {
        Some(i) => (&s[..i], Some(&s[i + 1..])),
        None => (s, None),
    };

    let fields: Vec<&str> = if clock.contains(':') {
        clock.split(':').collect()
    } else {
        (0..clock.len())
            .step_by(2)
            .map(|i| clock.get(i..i + 2))
            .collect::<Option<_>>()?
    };
    if fields.is_empty() || fields.len() > 3 || fields.iter().any(|f| f.len() != 2) {
        return None;
    }

    let hour = digits(fields[0])?;
    let minute = fields.get(1).map_or(Some(0), |f| digits(f))?;
    let second = fields.get(2).map_or(Some(0), |f| digits(f))?;
    let nanos = match fraction {
        Some(f) if fields.len() == 3 => parse_fraction(f)?,
        Some(_) => return None,
        None => 0,
    };

    if hour == 24 && minute == 0 && second == 0 && nanos == 0 {
        return Some((NaiveTime::from_hms_opt(0, 0, 0)?, true));
    }

    Some((NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)?, false))
}

/// Digits after the decimal mark, as nanoseconds. Anything past the ninth
/// digit is dropped.
fn parse_fraction(s: &str) -> Option<u32> {
    let significant = &s[..s.len().min(9)];
    let value = digits(significant)?;
    Some(value * 10u32.pow(9 - significant.len() as u32))
}

fn digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
