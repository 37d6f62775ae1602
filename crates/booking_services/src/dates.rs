use chrono::{DateTime, FixedOffset, NaiveDate, TimeDelta};
use serde::Serialize;

use crate::types::BookingError;

/// A date sent by a client: a plain calendar day or an RFC 3339 timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientDate {
    /// `YYYY-MM-DD`
    Day(NaiveDate),
    /// Timestamp, kept in the offset it was sent with
    Instant(DateTime<FixedOffset>),
}

impl ClientDate {
    /// Parses `YYYY-MM-DD` or an RFC 3339 timestamp.
    pub fn parse(raw: &str) -> Result<Self, BookingError> {
        let raw = raw.trim();

        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Ok(ClientDate::Day(date));
        }

        DateTime::parse_from_rfc3339(raw)
            .map(ClientDate::Instant)
            .map_err(|_| BookingError::Validation(format!("Invalid date: {}", raw)))
    }

    /// Calendar day in the client's own offset.
    pub fn day(self) -> NaiveDate {
        match self {
            ClientDate::Day(date) => date,
            ClientDate::Instant(timestamp) => timestamp.date_naive(),
        }
    }

    /// Midnight of a plain day, read in `offset`.
    fn at_midnight(self, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
        match self {
            ClientDate::Instant(timestamp) => Some(timestamp),
            ClientDate::Day(date) => date
                .and_hms_opt(0, 0, 0)?
                .and_local_timezone(offset)
                .single(),
        }
    }
}

/// Whole nights between two client dates, rounding any part day up.
fn ceil_nights(start: ClientDate, end: ClientDate) -> Option<i64> {
    let offset = match (start, end) {
        (ClientDate::Instant(t), _) | (_, ClientDate::Instant(t)) => *t.offset(),
        (ClientDate::Day(s), ClientDate::Day(e)) => return Some((e - s).num_days()),
    };
    let elapsed = end.at_midnight(offset)? - start.at_midnight(offset)?;
    let whole = elapsed.num_days();
    let rest = elapsed - TimeDelta::days(whole);
    Some(whole + i64::from(rest > TimeDelta::zero()))
}

/// A stay expressed in calendar days: check-in `start`, check-out `end`.
///
/// A range always holds at least one night (`start < end`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Builds a range, rejecting empty or inverted stays.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, BookingError> {
        if end <= start {
            return Err(BookingError::InvalidRange);
        }
        Ok(Self { start, end })
    }

    /// Parses both ends of a stay as sent by a client.
    ///
    /// Check-in is the start's calendar day in its own offset. The stay lasts
    /// the elapsed time rounded up to whole nights.
    pub fn parse(start: &str, end: &str) -> Result<Self, BookingError> {
        let start = ClientDate::parse(start)?;
        let end = ClientDate::parse(end)?;

        let nights = ceil_nights(start, end).ok_or(BookingError::InvalidRange)?;
        if nights <= 0 {
            return Err(BookingError::InvalidRange);
        }

        let check_in = start.day();
        let check_out = check_in
            .checked_add_signed(TimeDelta::days(nights))
            .ok_or(BookingError::InvalidRange)?;
        Self::new(check_in, check_out)
    }

    /// Check-in day.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Check-out day.
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of nights in the stay.
    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Half-open overlap with another `[start, end)` stay.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        start < self.end && end > self.start
    }

    /// Whether a blocked day falls in `[start, end]`, both ends included.
    pub fn touches_day(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}
