use actix_web::{HttpResponse, Result};

/// Health check endpoint for the booking API
pub async fn api_health() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "service": "bookings",
        "status": "healthy",
        "timestamp": chrono::Utc::now()
    })))
}

/// Plain liveness probe used by the load balancer.
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}
