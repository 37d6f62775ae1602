use actix_web::{HttpResponse, web};
use booking_services::{BookingListing, BookingService, CreateBookingRequest};
use notification_services::{BookingConfirmation, BookingNotifier};
use uuid::Uuid;

use crate::api_types::*;

/// Creates a `PENDING` booking after re-checking availability.
///
/// `POST /api/bookings`
pub async fn create_booking(
    service: web::Data<BookingService>,
    req: web::Json<CreateBookingRequest>,
) -> Result<HttpResponse, ApiError> {
    const FAILURE: &str = "Failed to create booking";

    let command = req
        .into_inner()
        .into_command()
        .map_err(|e| ApiError::from_booking(e, FAILURE))?;

    log::info!(
        "📝 Booking request for camper {} {}..{}",
        command.camper_id,
        command.range.start(),
        command.range.end()
    );

    let booking = service
        .create_booking(command)
        .await
        .map_err(|e| ApiError::from_booking(e, FAILURE))?;

    Ok(HttpResponse::Ok().json(CreateBookingResponse {
        success: true,
        booking: booking.into(),
    }))
}

/// Lists bookings with their camper and customer, newest check-in first.
///
/// `GET /api/bookings[?camperId=..]`
pub async fn list_bookings(
    service: web::Data<BookingService>,
    query: web::Query<ListBookingsQuery>,
) -> Result<HttpResponse, ApiError> {
    let camper_id = match query.camper_id.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(parse_id(raw, "camper id")?),
        _ => None,
    };

    let bookings = service
        .list_bookings(camper_id.as_ref())
        .await
        .map_err(|e| ApiError::from_booking(e, "Failed to fetch bookings"))?;

    Ok(HttpResponse::Ok().json(ListBookingsResponse { bookings }))
}

/// `GET /api/bookings/{booking_id}`
pub async fn get_booking(
    service: web::Data<BookingService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let booking = service
        .get_booking(&path.into_inner())
        .await
        .map_err(|e| ApiError::from_booking(e, "Failed to fetch bookings"))?;

    Ok(HttpResponse::Ok().json(BookingResponse {
        changed: None,
        booking,
    }))
}

/// Marks a booking as paid and emails the customer.
///
/// The email goes out only when the status actually changed, so a retried
/// payment callback does not notify twice. A failed email is logged and the
/// confirmation stands.
///
/// `POST /api/bookings/{booking_id}/confirm`
pub async fn confirm_booking(
    service: web::Data<BookingService>,
    notifier: web::Data<dyn BookingNotifier>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let change = service
        .confirm_booking(&path.into_inner())
        .await
        .map_err(|e| ApiError::from_booking(e, "Failed to update booking"))?;

    if change.changed {
        let confirmation = confirmation_for(&change.booking);
        if let Err(e) = notifier.send_booking_confirmation(&confirmation).await {
            log::error!(
                "❌ Failed to send confirmation for booking {}: {}",
                confirmation.booking_id,
                e
            );
        }
    }

    Ok(HttpResponse::Ok().json(BookingResponse {
        changed: Some(change.changed),
        booking: change.booking,
    }))
}

/// `POST /api/bookings/{booking_id}/cancel`
pub async fn cancel_booking(
    service: web::Data<BookingService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let change = service
        .cancel_booking(&path.into_inner())
        .await
        .map_err(|e| ApiError::from_booking(e, "Failed to update booking"))?;

    Ok(HttpResponse::Ok().json(BookingResponse {
        changed: Some(change.changed),
        booking: change.booking,
    }))
}

fn confirmation_for(listing: &BookingListing) -> BookingConfirmation {
    BookingConfirmation {
        booking_id: listing.booking.id,
        email: listing.customer.email.clone(),
        name: listing.customer.name.clone(),
        camper_name: listing.camper.name.clone(),
        start_date: listing.booking.start_date,
        end_date: listing.booking.end_date,
        total_price: listing.booking.total_price,
    }
}
