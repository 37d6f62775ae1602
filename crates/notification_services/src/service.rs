use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_ses::Client as SesClient;

use crate::types::*;

/// Sends booking follow-up messages.
#[async_trait]
pub trait BookingNotifier: Send + Sync {
    /// Tells the customer their booking is confirmed.
    async fn send_booking_confirmation(
        &self,
        confirmation: &BookingConfirmation,
    ) -> Result<(), NotificationError>;
}

/// Notifier sending emails through AWS SES.
#[derive(Debug, Clone)]
pub struct SesNotifier {
    ses_client: SesClient,
    from_email: String,
}

impl SesNotifier {
    /// Creates a new instance of the SesNotifier with the AWS client initialized.
    pub async fn new(from_email: String) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;

        Self {
            ses_client: SesClient::new(&config),
            from_email,
        }
    }
}

#[async_trait]
impl BookingNotifier for SesNotifier {
    async fn send_booking_confirmation(
        &self,
        confirmation: &BookingConfirmation,
    ) -> Result<(), NotificationError> {
        if !confirmation.email.contains('@') {
            return Err(NotificationError::InvalidEmail);
        }

        log::info!(
            "📧 Sending confirmation of booking {} to {}",
            confirmation.booking_id,
            confirmation.email
        );

        let subject_content = aws_sdk_ses::types::Content::builder()
            .data(confirmation.subject())
            .build()
            .map_err(|e| {
                log::error!("❌ Failed to build subject content: {}", e);
                NotificationError::SesError(format!("Failed to build subject: {}", e))
            })?;

        let html_content = aws_sdk_ses::types::Content::builder()
            .data(confirmation.html_body())
            .build()
            .map_err(|e| {
                log::error!("❌ Failed to build HTML content: {}", e);
                NotificationError::SesError(format!("Failed to build HTML body: {}", e))
            })?;

        let text_content = aws_sdk_ses::types::Content::builder()
            .data(confirmation.text_body())
            .build()
            .map_err(|e| {
                log::error!("❌ Failed to build text content: {}", e);
                NotificationError::SesError(format!("Failed to build text body: {}", e))
            })?;

        let body = aws_sdk_ses::types::Body::builder()
            .html(html_content)
            .text(text_content)
            .build();

        let message = aws_sdk_ses::types::Message::builder()
            .subject(subject_content)
            .body(body)
            .build();

        let destination = aws_sdk_ses::types::Destination::builder()
            .to_addresses(&confirmation.email)
            .build();

        let result = self
            .ses_client
            .send_email()
            .source(&self.from_email)
            .destination(destination)
            .message(message)
            .send()
            .await;

        match result {
            Ok(output) => {
                log::info!(
                    "✅ Confirmation sent for booking {} (SES Message ID: {})",
                    confirmation.booking_id,
                    output.message_id()
                );
                Ok(())
            }
            Err(e) => {
                log::error!("❌ AWS SES error: {:#?}", e);
                let error_msg = if let Some(service_error) = e.as_service_error() {
                    format!("AWS SES service error: {:?}", service_error)
                } else {
                    format!("AWS SES error: {}", e)
                };
                Err(NotificationError::SesError(error_msg))
            }
        }
    }
}

/// Notifier that only writes the message to the log. Used when no mail
/// provider is configured.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl BookingNotifier for LogNotifier {
    async fn send_booking_confirmation(
        &self,
        confirmation: &BookingConfirmation,
    ) -> Result<(), NotificationError> {
        log::info!(
            "📨 [log notifier] To: {} | Subject: {}\n{}",
            confirmation.email,
            confirmation.subject(),
            confirmation.text_body()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_log_notifier_always_succeeds() {
        let confirmation = BookingConfirmation {
            booking_id: Uuid::new_v4(),
            email: "ana@example.com".to_string(),
            name: "Ana".to_string(),
            camper_name: "La Camper".to_string(),
            start_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 3, 3).unwrap(),
            total_price: 17_800,
        };

        LogNotifier
            .send_booking_confirmation(&confirmation)
            .await
            .unwrap();
    }
}
