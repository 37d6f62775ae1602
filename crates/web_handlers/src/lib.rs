//! # Web Handlers for the Camper Booking Backend
//!
//! This crate provides the HTTP handlers and route table of the booking API.

/// Request, response and error types of the API
mod api_types;
pub use api_types::*;

/// Availability lookups
mod availability_handlers;
pub use availability_handlers::*;

/// Booking creation, listing and status follow-ups
mod booking_handlers;
pub use booking_handlers::*;

/// Health checks
mod health_handlers;
pub use health_handlers::*;

/// Price quotes
mod pricing_handlers;
pub use pricing_handlers::*;

/// Route registration
mod routes;
pub use routes::*;
