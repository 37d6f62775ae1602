use actix_web::{HttpResponse, web};
use booking_services::BookingService;

use crate::api_types::*;

/// Prices a stay with the configured tariff.
///
/// `GET /api/pricing?nights=..`
pub async fn quote_price(
    service: web::Data<BookingService>,
    query: web::Query<PricingQuery>,
) -> Result<HttpResponse, ApiError> {
    let nights = query
        .nights
        .ok_or_else(|| ApiError::MissingParameters(vec!["nights".to_string()]))?;

    let quote = service
        .quote(nights)
        .map_err(|e| ApiError::from_booking(e, "Failed to price stay"))?;

    Ok(HttpResponse::Ok().json(quote))
}
