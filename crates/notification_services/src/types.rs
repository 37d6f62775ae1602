use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

/// Errors raised while sending notifications.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// Simple email service (SES) errors.
    #[error("AWS SES error: {0}")]
    SesError(String),

    /// Invalid email format.
    #[error("Invalid email format")]
    InvalidEmail,
}

/// Everything needed to tell a customer their booking is confirmed.
#[derive(Debug, Clone, Serialize)]
pub struct BookingConfirmation {
    /// Booking reference
    pub booking_id: Uuid,
    /// Customer email address
    pub email: String,
    /// Customer name
    pub name: String,
    /// Booked camper name
    pub camper_name: String,
    /// Check-in day
    pub start_date: NaiveDate,
    /// Check-out day
    pub end_date: NaiveDate,
    /// Total price in cents
    pub total_price: i64,
}

impl BookingConfirmation {
    /// Email subject line.
    pub fn subject(&self) -> String {
        format!("Your {} booking is confirmed", self.camper_name)
    }

    /// Total formatted as euros, e.g. `549.00 €`.
    pub fn formatted_total(&self) -> String {
        format!(
            "{}.{:02} €",
            self.total_price / 100,
            (self.total_price % 100).abs()
        )
    }

    /// Plain text body.
    pub fn text_body(&self) -> String {
        format!(
            "Hi {}!\n\nYour booking of {} from {} to {} is confirmed.\n\nTotal paid: {}\nBooking reference: {}\n\nSee you on the road!\nYabadabadoo Campers",
            self.name,
            self.camper_name,
            self.start_date,
            self.end_date,
            self.formatted_total(),
            self.booking_id
        )
    }

    /// HTML body.
    pub fn html_body(&self) -> String {
        format!(
            r#"
            <html>
            <body style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
                <div style="padding: 30px; background: white;">
                    <h2>Hi {}!</h2>
                    <p>Your booking of <strong>{}</strong> from <strong>{}</strong> to <strong>{}</strong> is confirmed.</p>
                    <p>Total paid: <strong>{}</strong></p>
                    <p style="font-size: 14px; color: #6b7280;">Booking reference: {}</p>
                </div>
            </body>
            </html>
            "#,
            self.name,
            self.camper_name,
            self.start_date,
            self.end_date,
            self.formatted_total(),
            self.booking_id
        )
    }
}
