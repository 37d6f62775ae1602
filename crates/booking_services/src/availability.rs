use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::dates::DateRange;
use crate::store::{BookingStore, StoreError};
use crate::types::Booking;

/// The dates of an active booking that conflicts with a requested stay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingSpan {
    /// Conflicting booking
    #[serde(skip)]
    pub booking_id: Uuid,
    /// Check-in day
    pub start: NaiveDate,
    /// Check-out day
    pub end: NaiveDate,
}

impl From<&Booking> for BookingSpan {
    fn from(booking: &Booking) -> Self {
        Self {
            booking_id: booking.id,
            start: booking.start_date,
            end: booking.end_date,
        }
    }
}

/// Outcome of an availability check. Conflicts are reported whether or not the
/// range is available so callers can explain a refusal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityReport {
    /// True when there are no blocked dates and no conflicting bookings
    pub available: bool,
    /// Blocked days inside `[start, end]`
    pub blocked_dates: Vec<NaiveDate>,
    /// Active bookings overlapping `[start, end)`
    pub existing_bookings: Vec<BookingSpan>,
}

impl AvailabilityReport {
    /// Builds a report from the conflicts found.
    pub fn new(mut blocked_dates: Vec<NaiveDate>, mut existing_bookings: Vec<BookingSpan>) -> Self {
        blocked_dates.sort_unstable();
        blocked_dates.dedup();
        existing_bookings.sort_by_key(|span| (span.start, span.end));

        Self {
            available: blocked_dates.is_empty() && existing_bookings.is_empty(),
            blocked_dates,
            existing_bookings,
        }
    }

    /// A refusal whose conflicting rows are not known, e.g. when the storage
    /// constraint rejected an insert.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            blocked_dates: Vec::new(),
            existing_bookings: Vec::new(),
        }
    }
}

/// Checks whether `range` is free for a camper. Read-only.
pub async fn resolve_availability(
    store: &dyn BookingStore,
    camper_id: &Uuid,
    range: &DateRange,
) -> Result<AvailabilityReport, StoreError> {
    let blocked_dates = store.blocked_dates_in(camper_id, range).await?;
    let bookings = store.active_bookings_overlapping(camper_id, range).await?;

    let spans = bookings.iter().map(BookingSpan::from).collect();
    let report = AvailabilityReport::new(blocked_dates, spans);

    log::debug!(
        "🔎 Availability for camper {} {}..{}: available={} blocked={} bookings={}",
        camper_id,
        range.start(),
        range.end(),
        report.available,
        report.blocked_dates.len(),
        report.existing_bookings.len()
    );

    Ok(report)
}
