use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse};
use booking_services::{
    AvailabilityReport, Booking, BookingError, BookingListing, BookingStatus,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Query string of `GET /api/availability`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    /// Camper to check
    pub camper_id: Option<String>,
    /// Check-in day
    pub start_date: Option<String>,
    /// Check-out day
    pub end_date: Option<String>,
}

/// Query string of `GET /api/bookings`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBookingsQuery {
    /// Optional camper filter
    pub camper_id: Option<String>,
}

/// Query string of `GET /api/pricing`
#[derive(Debug, Deserialize)]
pub struct PricingQuery {
    /// Nights to price
    pub nights: Option<i64>,
}

/// Booking fields returned after creation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBooking {
    /// Booking reference
    pub id: Uuid,
    /// Check-in day
    pub start_date: NaiveDate,
    /// Check-out day
    pub end_date: NaiveDate,
    /// Total price in cents
    pub total_price: i64,
    /// Current status
    pub status: BookingStatus,
}

impl From<Booking> for CreatedBooking {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id,
            start_date: booking.start_date,
            end_date: booking.end_date,
            total_price: booking.total_price,
            status: booking.status,
        }
    }
}

/// Response of `POST /api/bookings`
#[derive(Debug, Serialize)]
pub struct CreateBookingResponse {
    /// Always true
    pub success: bool,
    /// The created booking
    pub booking: CreatedBooking,
}

/// Response of `GET /api/bookings`
#[derive(Debug, Serialize)]
pub struct ListBookingsResponse {
    /// Bookings, newest check-in first
    pub bookings: Vec<BookingListing>,
}

/// Response of the booking lookup and status follow-up routes.
#[derive(Debug, Serialize)]
pub struct BookingResponse {
    /// Whether a status change was applied; absent on plain lookups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed: Option<bool>,
    /// The booking
    pub booking: BookingListing,
}

/// Errors returned by the HTTP API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Query parameters are absent
    #[error("Missing required parameters")]
    MissingParameters(Vec<String>),

    /// Body fields are absent
    #[error("Missing required fields")]
    MissingFields(Vec<String>),

    /// Malformed input
    #[error("{0}")]
    BadRequest(String),

    /// The stay conflicts with blocked dates or another booking
    #[error("Dates are no longer available")]
    Unavailable(AvailabilityReport),

    /// Unknown camper or booking
    #[error("{0}")]
    NotFound(&'static str),

    /// A status change that is not allowed
    #[error("{0}")]
    Conflict(String),

    /// Infrastructure failure; the cause is logged, never returned
    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    /// Maps a booking error to its HTTP form. `failure` is the message returned
    /// to the client if the error is an infrastructure failure.
    pub fn from_booking(error: BookingError, failure: &'static str) -> Self {
        match error {
            BookingError::MissingFields(fields) => ApiError::MissingFields(fields),
            BookingError::Validation(msg) => ApiError::BadRequest(msg),
            BookingError::InvalidRange => ApiError::BadRequest(error.to_string()),
            BookingError::Pricing(e) => ApiError::BadRequest(e.to_string()),
            BookingError::Unavailable(report) => ApiError::Unavailable(report),
            BookingError::CamperNotFound(_) => ApiError::NotFound("Camper not found"),
            BookingError::BookingNotFound(_) => ApiError::NotFound("Booking not found"),
            BookingError::InvalidTransition { .. } => ApiError::Conflict(error.to_string()),
            BookingError::Store(e) => {
                log::error!("❌ {}: {}", failure, e);
                ApiError::Internal(failure)
            }
        }
    }
}

impl actix_web::ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingParameters(_)
            | ApiError::MissingFields(_)
            | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unavailable(_) | ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::MissingParameters(fields) | ApiError::MissingFields(fields) => {
                serde_json::json!({
                    "error": self.to_string(),
                    "fields": fields
                })
            }
            ApiError::Unavailable(report) => serde_json::json!({
                "error": self.to_string(),
                "blockedDates": report.blocked_dates,
                "existingBookings": report.existing_bookings
            }),
            _ => serde_json::json!({ "error": self.to_string() }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

/// Turns body parsing failures into JSON errors.
pub fn json_error_handler(
    err: actix_web::error::JsonPayloadError,
    _req: &HttpRequest,
) -> actix_web::Error {
    log::info!("Rejected JSON payload: {}", err);
    ApiError::BadRequest("Invalid request body".to_string()).into()
}

/// Turns query string parsing failures into JSON errors.
pub fn query_error_handler(
    err: actix_web::error::QueryPayloadError,
    _req: &HttpRequest,
) -> actix_web::Error {
    log::info!("Rejected query string: {}", err);
    ApiError::BadRequest("Invalid query parameters".to_string()).into()
}

/// Parses an id supplied by the client.
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::BadRequest(format!("Invalid {}", what)))
}
