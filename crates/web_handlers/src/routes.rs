use actix_web::web;

use crate::api_types::{json_error_handler, query_error_handler};
use crate::availability_handlers::*;
use crate::booking_handlers::*;
use crate::health_handlers::*;
use crate::pricing_handlers::*;

/// Registers the `/api` routes.
///
/// Expects `web::Data<BookingService>` and `web::Data<dyn BookingNotifier>` in
/// the app data.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .service(
            web::scope("/api")
                .route("/health", web::get().to(api_health))
                .route("/availability", web::get().to(check_availability))
                .route("/pricing", web::get().to(quote_price))
                .service(
                    web::scope("/bookings")
                        .route("", web::get().to(list_bookings))
                        .route("", web::post().to(create_booking))
                        .route("/{booking_id}", web::get().to(get_booking))
                        .route("/{booking_id}/confirm", web::post().to(confirm_booking))
                        .route("/{booking_id}/cancel", web::post().to(cancel_booking)),
                ),
        )
        .route("/health", web::get().to(health));
}
