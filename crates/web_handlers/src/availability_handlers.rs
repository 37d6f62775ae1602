use actix_web::{HttpResponse, web};
use booking_services::{BookingService, DateRange};

use crate::api_types::*;

const FAILURE: &str = "Failed to check availability";

/// Reports whether a camper is free between two dates.
///
/// `GET /api/availability?camperId=..&startDate=..&endDate=..`
pub async fn check_availability(
    service: web::Data<BookingService>,
    query: web::Query<AvailabilityQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();

    let (camper_id, start_date, end_date) =
        match (query.camper_id, query.start_date, query.end_date) {
            (Some(c), Some(s), Some(e))
                if !c.trim().is_empty() && !s.trim().is_empty() && !e.trim().is_empty() =>
            {
                (c, s, e)
            }
            (c, s, e) => {
                let missing = [("camperId", c), ("startDate", s), ("endDate", e)]
                    .into_iter()
                    .filter(|(_, v)| v.as_deref().is_none_or(|v| v.trim().is_empty()))
                    .map(|(name, _)| name.to_string())
                    .collect();
                return Err(ApiError::MissingParameters(missing));
            }
        };

    let camper_id = parse_id(&camper_id, "camper id")?;
    let range =
        DateRange::parse(&start_date, &end_date).map_err(|e| ApiError::from_booking(e, FAILURE))?;

    let report = service
        .check_availability(&camper_id, &range)
        .await
        .map_err(|e| ApiError::from_booking(e, FAILURE))?;

    Ok(HttpResponse::Ok().json(report))
}
