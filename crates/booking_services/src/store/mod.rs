use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::availability::AvailabilityReport;
use crate::dates::DateRange;
use crate::types::{Booking, BookingListing, BookingStatus, Camper, Customer, NewBooking, StatusChange};

mod memory;
mod postgres;

pub use memory::InMemoryBookingStore;
pub use postgres::PgBookingStore;

/// Postgres SQLSTATE raised by an exclusion constraint.
const EXCLUSION_VIOLATION: &str = "23P01";

/// Errors raised by a booking store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// The stay conflicts with blocked dates or another active booking
    #[error("Dates are no longer available")]
    Unavailable(AvailabilityReport),

    /// The camper does not exist
    #[error("Camper not found: {0}")]
    CamperNotFound(Uuid),

    /// The booking does not exist
    #[error("Booking not found: {0}")]
    BookingNotFound(Uuid),

    /// The status change is not allowed
    #[error("Booking cannot transition from {from} to {to}")]
    InvalidTransition {
        /// Current status
        from: BookingStatus,
        /// Requested status
        to: BookingStatus,
    },

    /// A stored value could not be decoded
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e
            && db.code().as_deref() == Some(EXCLUSION_VIOLATION)
        {
            return StoreError::Unavailable(AvailabilityReport::unavailable());
        }
        StoreError::Database(e)
    }
}

/// Persistence of campers, blocked dates, customers and bookings.
///
/// Implementations must make `insert_booking` and `transition_status` atomic:
/// two concurrent inserts for overlapping stays of the same camper can never
/// both succeed, and two concurrent first bookings by one email create a single customer.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Looks up a camper.
    async fn find_camper(&self, camper_id: &Uuid) -> Result<Option<Camper>, StoreError>;

    /// Blocked days of a camper inside `[start, end]`, both ends included.
    async fn blocked_dates_in(
        &self,
        camper_id: &Uuid,
        range: &DateRange,
    ) -> Result<Vec<NaiveDate>, StoreError>;

    /// Active bookings of a camper overlapping `[start, end)`.
    async fn active_bookings_overlapping(
        &self,
        camper_id: &Uuid,
        range: &DateRange,
    ) -> Result<Vec<Booking>, StoreError>;

    /// Looks up a customer by normalised email.
    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>, StoreError>;

    /// Re-checks availability, finds or creates the customer and inserts a
    /// `PENDING` booking, all as one atomic step.
    async fn insert_booking(&self, booking: NewBooking) -> Result<Booking, StoreError>;

    /// All bookings, optionally of one camper, newest check-in first.
    async fn list_bookings(&self, camper_id: Option<&Uuid>)
    -> Result<Vec<BookingListing>, StoreError>;

    /// A single booking with its display fields.
    async fn get_booking(&self, booking_id: &Uuid) -> Result<Option<BookingListing>, StoreError>;

    /// Moves a booking to `next`, validated against its current status.
    async fn transition_status(
        &self,
        booking_id: &Uuid,
        next: BookingStatus,
    ) -> Result<StatusChange, StoreError>;
}
