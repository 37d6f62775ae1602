use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::availability::AvailabilityReport;
use crate::dates::DateRange;
use crate::pricing::PricingError;
use crate::store::StoreError;

/// A rentable camper van. Owned by the inventory side, read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Camper {
    /// Unique identifier for the camper
    pub id: Uuid,
    /// URL slug of the camper page
    pub slug: String,
    /// Display name
    pub name: String,
}

/// Lifecycle state of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Created, awaiting payment
    Pending,
    /// Paid and confirmed
    Confirmed,
    /// Cancelled; never blocks availability
    Cancelled,
}

impl BookingStatus {
    /// Statuses that occupy the camper's calendar.
    pub const ACTIVE: [BookingStatus; 2] = [BookingStatus::Pending, BookingStatus::Confirmed];

    /// Database and wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    /// Whether a booking in this status blocks its dates.
    pub fn is_active(self) -> bool {
        Self::ACTIVE.contains(&self)
    }

    /// Checks a move to `next`. Returns `Ok(false)` when already in `next`.
    pub fn transition_to(self, next: BookingStatus) -> Result<bool, BookingError> {
        use BookingStatus::*;

        match (self, next) {
            (current, next) if current == next => Ok(false),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Cancelled) => Ok(true),
            (from, to) => Err(BookingError::InvalidTransition { from, to }),
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(BookingStatus::Pending),
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            other => Err(format!("Unknown booking status: {}", other)),
        }
    }
}

/// How the customer intends to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Card payment
    Card,
    /// PayPal
    Paypal,
}

impl PaymentMethod {
    /// Database and wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Paypal => "paypal",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "card" => Ok(PaymentMethod::Card),
            "paypal" => Ok(PaymentMethod::Paypal),
            other => Err(format!("Unsupported payment method: {}", other)),
        }
    }
}

/// Customer record, created on a first booking and reused by email afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    /// Unique identifier for the customer
    pub id: Uuid,
    /// Email address, unique across customers
    pub email: String,
    /// Full name
    pub name: String,
    /// Phone number
    pub phone: String,
    /// National identity document
    pub dni: String,
    /// Driving license number
    pub license: String,
}

/// Customer details submitted with a booking.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct NewCustomer {
    /// Email address of the customer
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    /// Name of the customer
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    /// Phone number of the customer
    #[validate(length(min = 6, max = 32, message = "Phone number must be between 6-32 characters"))]
    pub phone: String,
    /// National identity document
    #[validate(length(min = 1, max = 32, message = "DNI is required"))]
    pub dni: String,
    /// Driving license number
    #[validate(length(min = 1, max = 64, message = "License is required"))]
    pub license: String,
}

/// A booking row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Unique identifier for the booking
    pub id: Uuid,
    /// Booked camper
    pub camper_id: Uuid,
    /// Customer who booked
    pub customer_id: Uuid,
    /// Check-in day
    pub start_date: NaiveDate,
    /// Check-out day
    pub end_date: NaiveDate,
    /// Total price in cents
    pub total_price: i64,
    /// Requested payment method
    pub payment_method: PaymentMethod,
    /// Current status
    pub status: BookingStatus,
    /// When the booking was created
    pub created_at: DateTime<Utc>,
}

/// Camper fields shown next to a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CamperSummary {
    /// Display name
    pub name: String,
    /// URL slug
    pub slug: String,
}

/// Customer fields shown next to a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerSummary {
    /// Full name
    pub name: String,
    /// Email address
    pub email: String,
}

/// A booking with its camper and customer display fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingListing {
    /// The booking itself
    #[serde(flatten)]
    pub booking: Booking,
    /// Booked camper
    pub camper: CamperSummary,
    /// Customer who booked
    pub customer: CustomerSummary,
}

/// Everything the store needs to persist a new booking.
#[derive(Debug, Clone)]
pub struct NewBooking {
    /// Camper to book
    pub camper_id: Uuid,
    /// Stay
    pub range: DateRange,
    /// Customer to find or create by email
    pub customer: NewCustomer,
    /// Total price in cents
    pub total_price: i64,
    /// Requested payment method
    pub payment_method: PaymentMethod,
}

/// Result of a status transition.
#[derive(Debug, Clone, Serialize)]
pub struct StatusChange {
    /// Booking after the transition
    pub booking: BookingListing,
    /// Status before the transition
    pub previous: BookingStatus,
    /// Whether the status actually changed
    pub changed: bool,
}

/// Validated booking command.
#[derive(Debug, Clone)]
pub struct CreateBooking {
    /// Camper to book
    pub camper_id: Uuid,
    /// Stay
    pub range: DateRange,
    /// Customer details
    pub customer: NewCustomer,
    /// Requested payment method
    pub payment_method: PaymentMethod,
}

/// Customer section of a booking request, as sent by the client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerData {
    /// Email address
    pub email: Option<String>,
    /// Full name
    pub name: Option<String>,
    /// Phone number
    pub phone: Option<String>,
    /// National identity document
    pub dni: Option<String>,
    /// Driving license number
    pub license: Option<String>,
}

/// Booking request as sent by the client. Every field is optional so that
/// missing ones can be reported together.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    /// Camper to book
    pub camper_id: Option<String>,
    /// Check-in day
    pub start_date: Option<String>,
    /// Check-out day
    pub end_date: Option<String>,
    /// Customer details
    pub customer_data: Option<CustomerData>,
    /// Requested payment method
    pub payment_method: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl CreateBookingRequest {
    /// Names of the required fields that are absent or blank.
    pub fn missing_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();

        for (name, value) in [
            ("camperId", &self.camper_id),
            ("startDate", &self.start_date),
            ("endDate", &self.end_date),
        ] {
            if present(value).is_none() {
                missing.push(name.to_string());
            }
        }

        match &self.customer_data {
            None => missing.push("customerData".to_string()),
            Some(customer) => {
                for (name, value) in [
                    ("customerData.email", &customer.email),
                    ("customerData.name", &customer.name),
                    ("customerData.phone", &customer.phone),
                    ("customerData.dni", &customer.dni),
                    ("customerData.license", &customer.license),
                ] {
                    if present(value).is_none() {
                        missing.push(name.to_string());
                    }
                }
            }
        }

        if present(&self.payment_method).is_none() {
            missing.push("paymentMethod".to_string());
        }

        missing
    }

    /// Validates the request and turns it into a booking command.
    /// Nothing is persisted before this succeeds.
    pub fn into_command(self) -> Result<CreateBooking, BookingError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(BookingError::MissingFields(missing));
        }

        let field = |value: &Option<String>| present(value).unwrap_or_default().to_string();

        let camper_id = Uuid::parse_str(&field(&self.camper_id))
            .map_err(|_| BookingError::Validation("Invalid camper id".to_string()))?;
        let range = DateRange::parse(&field(&self.start_date), &field(&self.end_date))?;
        let payment_method = field(&self.payment_method)
            .parse::<PaymentMethod>()
            .map_err(BookingError::Validation)?;

        let data = self.customer_data.unwrap_or_default();
        let customer = NewCustomer {
            email: field(&data.email).to_lowercase(),
            name: field(&data.name),
            phone: field(&data.phone),
            dni: field(&data.dni),
            license: field(&data.license),
        };
        customer
            .validate()
            .map_err(|e| BookingError::Validation(format!("Validation error: {}", e)))?;

        Ok(CreateBooking {
            camper_id,
            range,
            customer,
            payment_method,
        })
    }
}

/// Custom error type for booking operations
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    /// Required fields are absent
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// A field is present but malformed
    #[error("{0}")]
    Validation(String),

    /// The check-out day is not after the check-in day
    #[error("End date must be after start date")]
    InvalidRange,

    /// The stay cannot be priced
    #[error("Pricing error: {0}")]
    Pricing(#[from] PricingError),

    /// The dates are blocked or taken by another active booking
    #[error("Dates are no longer available")]
    Unavailable(AvailabilityReport),

    /// The camper does not exist
    #[error("Camper not found: {0}")]
    CamperNotFound(Uuid),

    /// The booking does not exist
    #[error("Booking not found: {0}")]
    BookingNotFound(Uuid),

    /// The requested status change is not allowed
    #[error("Booking cannot transition from {from} to {to}")]
    InvalidTransition {
        /// Current status
        from: BookingStatus,
        /// Requested status
        to: BookingStatus,
    },

    /// The storage layer failed
    #[error("Storage error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for BookingError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(report) => BookingError::Unavailable(report),
            StoreError::CamperNotFound(id) => BookingError::CamperNotFound(id),
            StoreError::BookingNotFound(id) => BookingError::BookingNotFound(id),
            StoreError::InvalidTransition { from, to } => {
                BookingError::InvalidTransition { from, to }
            }
            other => BookingError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_request() -> CreateBookingRequest {
        CreateBookingRequest {
            camper_id: Some("6f1c2a54-8f0e-4d36-9a53-3f6f3f1f7a01".to_string()),
            start_date: Some("2026-03-01".to_string()),
            end_date: Some("2026-03-08".to_string()),
            customer_data: Some(CustomerData {
                email: Some("  Ana@Example.com ".to_string()),
                name: Some("Ana García".to_string()),
                phone: Some("+34 600 000 000".to_string()),
                dni: Some("12345678Z".to_string()),
                license: Some("B-998877".to_string()),
            }),
            payment_method: Some("card".to_string()),
        }
    }

    #[test]
    fn test_status_transitions() {
        use BookingStatus::*;

        assert!(Pending.transition_to(Confirmed).unwrap());
        assert!(Pending.transition_to(Cancelled).unwrap());
        assert!(Confirmed.transition_to(Cancelled).unwrap());
        assert!(!Confirmed.transition_to(Confirmed).unwrap());
        assert!(!Cancelled.transition_to(Cancelled).unwrap());
        assert!(matches!(
            Cancelled.transition_to(Confirmed),
            Err(BookingError::InvalidTransition {
                from: Cancelled,
                to: Confirmed
            })
        ));
        assert!(Confirmed.transition_to(Pending).is_err());
    }

    #[test]
    fn test_listing_serializes_flat_with_relations() {
        let listing = BookingListing {
            booking: Booking {
                id: Uuid::nil(),
                camper_id: Uuid::nil(),
                customer_id: Uuid::nil(),
                start_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2026, 3, 3).unwrap(),
                total_price: 17_800,
                payment_method: PaymentMethod::Paypal,
                status: BookingStatus::Pending,
                created_at: Utc::now(),
            },
            camper: CamperSummary {
                name: "Yabadabadoo Camper".to_string(),
                slug: "the-camper".to_string(),
            },
            customer: CustomerSummary {
                name: "Ana".to_string(),
                email: "ana@example.com".to_string(),
            },
        };

        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["startDate"], "2026-03-01");
        assert_eq!(json["totalPrice"], 17_800);
        assert_eq!(json["paymentMethod"], "paypal");
        assert_eq!(json["status"], "PENDING");
        assert_eq!(json["camper"]["slug"], "the-camper");
        assert_eq!(json["customer"]["email"], "ana@example.com");
    }

    #[test]
    fn test_only_pending_and_confirmed_are_active() {
        assert!(BookingStatus::Pending.is_active());
        assert!(BookingStatus::Confirmed.is_active());
        assert!(!BookingStatus::Cancelled.is_active());
    }

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<BookingStatus>().unwrap(), status);
        }
        assert!("pending".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn test_complete_request_becomes_command() {
        let command = complete_request().into_command().unwrap();
        assert_eq!(command.range.nights(), 7);
        assert_eq!(command.customer.email, "ana@example.com");
        assert_eq!(command.payment_method, PaymentMethod::Card);
    }

    #[test]
    fn test_missing_fields_are_all_listed() {
        let mut request = complete_request();
        request.start_date = None;
        request.payment_method = Some("   ".to_string());
        if let Some(customer) = request.customer_data.as_mut() {
            customer.dni = None;
        }

        match request.into_command() {
            Err(BookingError::MissingFields(fields)) => assert_eq!(
                fields,
                vec!["startDate", "customerData.dni", "paymentMethod"]
            ),
            other => panic!("expected missing fields, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_customer_data() {
        let request = CreateBookingRequest {
            customer_data: None,
            ..complete_request()
        };
        assert!(matches!(
            request.into_command(),
            Err(BookingError::MissingFields(fields)) if fields == vec!["customerData"]
        ));
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let request = CreateBookingRequest {
            start_date: Some("2026-03-08".to_string()),
            end_date: Some("2026-03-01".to_string()),
            ..complete_request()
        };
        assert!(matches!(
            request.into_command(),
            Err(BookingError::InvalidRange)
        ));
    }

    #[test]
    fn test_malformed_fields() {
        let bad_camper = CreateBookingRequest {
            camper_id: Some("not-a-uuid".to_string()),
            ..complete_request()
        };
        assert!(matches!(
            bad_camper.into_command(),
            Err(BookingError::Validation(_))
        ));

        let bad_payment = CreateBookingRequest {
            payment_method: Some("cash".to_string()),
            ..complete_request()
        };
        assert!(matches!(
            bad_payment.into_command(),
            Err(BookingError::Validation(msg)) if msg.contains("cash")
        ));

        let mut bad_email = complete_request();
        if let Some(customer) = bad_email.customer_data.as_mut() {
            customer.email = Some("not-an-email".to_string());
        }
        assert!(matches!(
            bad_email.into_command(),
            Err(BookingError::Validation(_))
        ));
    }
}
