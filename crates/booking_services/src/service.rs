use std::sync::Arc;

use uuid::Uuid;

use crate::availability::{AvailabilityReport, resolve_availability};
use crate::dates::DateRange;
use crate::pricing::{PriceQuote, PricingTable};
use crate::store::BookingStore;
use crate::types::{
    Booking, BookingError, BookingListing, BookingStatus, CreateBooking, NewBooking, StatusChange,
};

/// A service for booking operations: availability checks, booking creation,
/// listing and status follow-ups.
#[derive(Clone)]
pub struct BookingService {
    store: Arc<dyn BookingStore>,
    pricing: PricingTable,
}

impl BookingService {
    /// Creates a new instance of `BookingService` over the given store and prices.
    pub fn new(store: Arc<dyn BookingStore>, pricing: PricingTable) -> Self {
        Self { store, pricing }
    }

    /// Prices a stay of `nights` nights.
    pub fn quote(&self, nights: i64) -> Result<PriceQuote, BookingError> {
        Ok(self.pricing.quote(nights)?)
    }

    /// Reports whether a camper is free over `range`, with the conflicts found.
    pub async fn check_availability(
        &self,
        camper_id: &Uuid,
        range: &DateRange,
    ) -> Result<AvailabilityReport, BookingError> {
        Ok(resolve_availability(self.store.as_ref(), camper_id, range).await?)
    }

    /// Creates a `PENDING` booking.
    ///
    /// Availability is checked here and again by the store inside the insert,
    /// so a stay taken between the two checks still fails with `Unavailable`.
    pub async fn create_booking(&self, command: CreateBooking) -> Result<Booking, BookingError> {
        if self.store.find_camper(&command.camper_id).await?.is_none() {
            return Err(BookingError::CamperNotFound(command.camper_id));
        }

        let report = self
            .check_availability(&command.camper_id, &command.range)
            .await?;
        if !report.available {
            log::info!(
                "⛔ Camper {} unavailable {}..{}",
                command.camper_id,
                command.range.start(),
                command.range.end()
            );
            return Err(BookingError::Unavailable(report));
        }

        let quote = self.pricing.quote(command.range.nights())?;

        let booking = self
            .store
            .insert_booking(NewBooking {
                camper_id: command.camper_id,
                range: command.range,
                customer: command.customer,
                total_price: quote.total_price,
                payment_method: command.payment_method,
            })
            .await?;

        log::info!(
            "✅ Booking {} created for camper {} ({} nights, {} cents)",
            booking.id,
            booking.camper_id,
            quote.nights,
            booking.total_price
        );

        Ok(booking)
    }

    /// Lists bookings, optionally for one camper, newest check-in first.
    pub async fn list_bookings(
        &self,
        camper_id: Option<&Uuid>,
    ) -> Result<Vec<BookingListing>, BookingError> {
        Ok(self.store.list_bookings(camper_id).await?)
    }

    /// Gets a booking by id.
    pub async fn get_booking(&self, booking_id: &Uuid) -> Result<BookingListing, BookingError> {
        self.store
            .get_booking(booking_id)
            .await?
            .ok_or(BookingError::BookingNotFound(*booking_id))
    }

    /// Marks a booking as paid. Repeating the call on a confirmed booking is a no-op.
    pub async fn confirm_booking(&self, booking_id: &Uuid) -> Result<StatusChange, BookingError> {
        self.transition(booking_id, BookingStatus::Confirmed).await
    }

    /// Cancels a booking, releasing its dates. Repeating the call is a no-op.
    pub async fn cancel_booking(&self, booking_id: &Uuid) -> Result<StatusChange, BookingError> {
        self.transition(booking_id, BookingStatus::Cancelled).await
    }

    async fn transition(
        &self,
        booking_id: &Uuid,
        next: BookingStatus,
    ) -> Result<StatusChange, BookingError> {
        let change = self.store.transition_status(booking_id, next).await?;

        if change.changed {
            log::info!(
                "🔁 Booking {} moved {} -> {}",
                booking_id,
                change.previous,
                next
            );
        }

        Ok(change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryBookingStore;
    use crate::types::{Camper, NewCustomer, PaymentMethod};
    use chrono::NaiveDate;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn customer(email: &str, name: &str) -> NewCustomer {
        NewCustomer {
            email: email.to_string(),
            name: name.to_string(),
            phone: "600000000".to_string(),
            dni: "12345678Z".to_string(),
            license: "B-1".to_string(),
        }
    }

    fn command(camper_id: Uuid, start: &str, end: &str, email: &str) -> CreateBooking {
        CreateBooking {
            camper_id,
            range: DateRange::new(day(start), day(end)).unwrap(),
            customer: customer(email, "Ana"),
            payment_method: PaymentMethod::Card,
        }
    }

    async fn setup() -> (BookingService, Arc<InMemoryBookingStore>, Uuid) {
        let store = Arc::new(InMemoryBookingStore::new());
        let camper_id = Uuid::new_v4();
        store
            .add_camper(Camper {
                id: camper_id,
                slug: "la-camper".to_string(),
                name: "La Camper".to_string(),
            })
            .await;

        let service = BookingService::new(store.clone(), PricingTable::default());
        (service, store, camper_id)
    }

    #[tokio::test]
    async fn test_create_booking_is_pending_and_priced_by_tiers() {
        let (service, _, camper_id) = setup().await;

        let booking = service
            .create_booking(command(camper_id, "2026-03-01", "2026-03-09", "ana@example.com"))
            .await
            .unwrap();

        let table = PricingTable::default();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.total_price, table.per_week + table.per_day);
        assert_eq!(booking.start_date, day("2026-03-01"));
        assert_eq!(booking.end_date, day("2026-03-09"));
    }

    #[tokio::test]
    async fn test_overlapping_booking_is_rejected() {
        let (service, _, camper_id) = setup().await;

        service
            .create_booking(command(camper_id, "2026-02-10", "2026-02-15", "ana@example.com"))
            .await
            .unwrap();

        let err = service
            .create_booking(command(camper_id, "2026-02-12", "2026-02-14", "luis@example.com"))
            .await
            .unwrap_err();

        match err {
            BookingError::Unavailable(report) => {
                assert_eq!(report.existing_bookings.len(), 1);
                assert_eq!(report.existing_bookings[0].start, day("2026-02-10"));
            }
            other => panic!("expected Unavailable, got {:?}", other),
        }

        // Back-to-back stays share the check-out day
        service
            .create_booking(command(camper_id, "2026-02-15", "2026-02-20", "luis@example.com"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_blocked_date_rejects_booking() {
        let (service, store, camper_id) = setup().await;
        store.block_date(camper_id, day("2026-02-21")).await;

        let err = service
            .create_booking(command(camper_id, "2026-02-19", "2026-02-23", "ana@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BookingError::Unavailable(ref report) if report.blocked_dates == vec![day("2026-02-21")]
        ));
    }

    #[tokio::test]
    async fn test_unknown_camper() {
        let (service, _, _) = setup().await;
        let unknown = Uuid::new_v4();

        let err = service
            .create_booking(command(unknown, "2026-02-10", "2026-02-12", "ana@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, BookingError::CamperNotFound(id) if id == unknown));
    }

    #[tokio::test]
    async fn test_repeat_customer_is_reused_without_merging() {
        let (service, store, camper_id) = setup().await;

        let first = service
            .create_booking(command(camper_id, "2026-04-01", "2026-04-03", "ana@example.com"))
            .await
            .unwrap();

        let mut second = command(camper_id, "2026-05-01", "2026-05-03", "ana@example.com");
        second.customer.name = "Ana María".to_string();
        let second = service.create_booking(second).await.unwrap();

        assert_eq!(first.customer_id, second.customer_id);
        assert_eq!(store.customer_count().await, 1);

        let stored = store
            .find_customer_by_email("ana@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.name, "Ana");
    }

    #[tokio::test]
    async fn test_cancelled_booking_frees_dates() {
        let (service, _, camper_id) = setup().await;

        let booking = service
            .create_booking(command(camper_id, "2026-02-10", "2026-02-15", "ana@example.com"))
            .await
            .unwrap();
        service.cancel_booking(&booking.id).await.unwrap();

        let rebooked = service
            .create_booking(command(camper_id, "2026-02-10", "2026-02-15", "luis@example.com"))
            .await
            .unwrap();
        assert_eq!(rebooked.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn test_confirm_is_idempotent() {
        let (service, _, camper_id) = setup().await;
        let booking = service
            .create_booking(command(camper_id, "2026-06-01", "2026-06-05", "ana@example.com"))
            .await
            .unwrap();

        let first = service.confirm_booking(&booking.id).await.unwrap();
        assert!(first.changed);
        assert_eq!(first.previous, BookingStatus::Pending);
        assert_eq!(first.booking.booking.status, BookingStatus::Confirmed);

        let again = service.confirm_booking(&booking.id).await.unwrap();
        assert!(!again.changed);
        assert_eq!(again.booking.booking.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_cancelled_booking_cannot_be_confirmed() {
        let (service, _, camper_id) = setup().await;
        let booking = service
            .create_booking(command(camper_id, "2026-06-01", "2026-06-05", "ana@example.com"))
            .await
            .unwrap();
        service.cancel_booking(&booking.id).await.unwrap();

        let err = service.confirm_booking(&booking.id).await.unwrap_err();
        assert!(matches!(
            err,
            BookingError::InvalidTransition {
                from: BookingStatus::Cancelled,
                to: BookingStatus::Confirmed
            }
        ));

        let missing = service.cancel_booking(&Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(missing, BookingError::BookingNotFound(_)));
    }

    #[tokio::test]
    async fn test_list_bookings_newest_first_and_filtered() {
        let (service, store, camper_id) = setup().await;
        let other_camper = Uuid::new_v4();
        store
            .add_camper(Camper {
                id: other_camper,
                slug: "otra".to_string(),
                name: "Otra".to_string(),
            })
            .await;

        for (start, end) in [("2026-01-05", "2026-01-08"), ("2026-03-01", "2026-03-04")] {
            service
                .create_booking(command(camper_id, start, end, "ana@example.com"))
                .await
                .unwrap();
        }
        service
            .create_booking(command(other_camper, "2026-02-01", "2026-02-04", "luis@example.com"))
            .await
            .unwrap();

        let all = service.list_bookings(None).await.unwrap();
        let starts: Vec<_> = all.iter().map(|l| l.booking.start_date).collect();
        assert_eq!(
            starts,
            vec![day("2026-03-01"), day("2026-02-01"), day("2026-01-05")]
        );

        let filtered = service.list_bookings(Some(&camper_id)).await.unwrap();
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|l| l.camper.slug == "la-camper"));
        assert_eq!(filtered[0].customer.email, "ana@example.com");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_overlapping_bookings_only_one_wins() {
        let (service, store, camper_id) = setup().await;

        let attempts = (0..16).map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .create_booking(command(
                        camper_id,
                        "2026-07-01",
                        "2026-07-10",
                        &format!("racer{}@example.com", i),
                    ))
                    .await
            })
        });

        let results = futures_util::future::join_all(attempts).await;

        let mut created = 0;
        let mut refused = 0;
        for result in results {
            match result.unwrap() {
                Ok(_) => created += 1,
                Err(BookingError::Unavailable(_)) => refused += 1,
                Err(other) => panic!("unexpected error {:?}", other),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(refused, 15);

        let active = store
            .active_bookings_overlapping(
                &camper_id,
                &DateRange::new(day("2026-07-01"), day("2026-07-10")).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_bookings_by_same_email_share_customer() {
        let (service, store, camper_id) = setup().await;

        let attempts = (0..8).map(|i| {
            let service = service.clone();
            let start = format!("2026-08-{:02}", i * 3 + 1);
            let end = format!("2026-08-{:02}", i * 3 + 3);
            tokio::spawn(async move {
                service
                    .create_booking(command(camper_id, &start, &end, "same@example.com"))
                    .await
            })
        });

        for result in futures_util::future::join_all(attempts).await {
            result.unwrap().unwrap();
        }

        assert_eq!(store.customer_count().await, 1);
    }
}
