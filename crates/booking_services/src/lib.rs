//! # Booking Services
//!
//! This crate provides the booking core of the camper rental site.
//! It includes tiered pricing, date-range availability resolution, the booking
//! command and query handlers, the booking status lifecycle and the checkout wizard model.

/// Availability resolution over blocked dates and active bookings.
pub mod availability;
/// Client-side checkout wizard state machine and calendar rules.
pub mod checkout;
/// Calendar date ranges and API date parsing.
pub mod dates;
/// Tiered day/week/month pricing.
pub mod pricing;
/// Booking command and query handlers.
pub mod service;
/// Persistence abstraction with Postgres and in-memory implementations.
pub mod store;
/// Types and structures used by the booking core.
pub mod types;

pub use availability::{AvailabilityReport, BookingSpan};
pub use dates::{ClientDate, DateRange};
pub use pricing::{PriceQuote, PriceTier, PriceTierKind, PricingError, PricingTable};
pub use service::BookingService;
pub use store::{BookingStore, InMemoryBookingStore, PgBookingStore, StoreError};
pub use types::*;
