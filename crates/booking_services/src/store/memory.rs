use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{BookingStore, StoreError};
use crate::availability::{AvailabilityReport, BookingSpan};
use crate::dates::DateRange;
use crate::types::{
    Booking, BookingListing, BookingStatus, Camper, CamperSummary, Customer, CustomerSummary,
    NewBooking, NewCustomer, StatusChange,
};

#[derive(Default)]
struct Tables {
    campers: HashMap<Uuid, Camper>,
    blocked_dates: Vec<(Uuid, NaiveDate)>,
    customers: Vec<Customer>,
    bookings: Vec<Booking>,
}

impl Tables {
    fn blocked_dates_in(&self, camper_id: &Uuid, range: &DateRange) -> Vec<NaiveDate> {
        self.blocked_dates
            .iter()
            .filter(|(camper, day)| camper == camper_id && range.touches_day(*day))
            .map(|(_, day)| *day)
            .collect()
    }

    fn active_bookings_overlapping(&self, camper_id: &Uuid, range: &DateRange) -> Vec<Booking> {
        self.bookings
            .iter()
            .filter(|b| {
                b.camper_id == *camper_id
                    && b.status.is_active()
                    && range.overlaps(b.start_date, b.end_date)
            })
            .cloned()
            .collect()
    }

    fn find_or_create_customer(&mut self, customer: &NewCustomer) -> Uuid {
        if let Some(existing) = self.customers.iter().find(|c| c.email == customer.email) {
            return existing.id;
        }

        let id = Uuid::new_v4();
        self.customers.push(Customer {
            id,
            email: customer.email.clone(),
            name: customer.name.clone(),
            phone: customer.phone.clone(),
            dni: customer.dni.clone(),
            license: customer.license.clone(),
        });
        id
    }

    fn listing(&self, booking: &Booking) -> Result<BookingListing, StoreError> {
        let camper = self
            .campers
            .get(&booking.camper_id)
            .ok_or_else(|| StoreError::Corrupt(format!("camper {} missing", booking.camper_id)))?;
        let customer = self
            .customers
            .iter()
            .find(|c| c.id == booking.customer_id)
            .ok_or_else(|| {
                StoreError::Corrupt(format!("customer {} missing", booking.customer_id))
            })?;

        Ok(BookingListing {
            booking: booking.clone(),
            camper: CamperSummary {
                name: camper.name.clone(),
                slug: camper.slug.clone(),
            },
            customer: CustomerSummary {
                name: customer.name.clone(),
                email: customer.email.clone(),
            },
        })
    }
}

/// Booking store kept in process memory. Every operation runs under a single
/// lock, which gives the same guarantees as the Postgres transaction.
#[derive(Default)]
pub struct InMemoryBookingStore {
    tables: Mutex<Tables>,
}

impl InMemoryBookingStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a camper.
    pub async fn add_camper(&self, camper: Camper) {
        self.tables.lock().await.campers.insert(camper.id, camper);
    }

    /// Marks a day as unavailable for a camper.
    pub async fn block_date(&self, camper_id: Uuid, date: NaiveDate) {
        let mut tables = self.tables.lock().await;
        if !tables.blocked_dates.contains(&(camper_id, date)) {
            tables.blocked_dates.push((camper_id, date));
        }
    }

    /// Number of stored customers.
    pub async fn customer_count(&self) -> usize {
        self.tables.lock().await.customers.len()
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn find_camper(&self, camper_id: &Uuid) -> Result<Option<Camper>, StoreError> {
        Ok(self.tables.lock().await.campers.get(camper_id).cloned())
    }

    async fn blocked_dates_in(
        &self,
        camper_id: &Uuid,
        range: &DateRange,
    ) -> Result<Vec<NaiveDate>, StoreError> {
        Ok(self.tables.lock().await.blocked_dates_in(camper_id, range))
    }

    async fn active_bookings_overlapping(
        &self,
        camper_id: &Uuid,
        range: &DateRange,
    ) -> Result<Vec<Booking>, StoreError> {
        Ok(self
            .tables
            .lock()
            .await
            .active_bookings_overlapping(camper_id, range))
    }

    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>, StoreError> {
        Ok(self
            .tables
            .lock()
            .await
            .customers
            .iter()
            .find(|c| c.email == email)
            .cloned())
    }

    async fn insert_booking(&self, booking: NewBooking) -> Result<Booking, StoreError> {
        let mut tables = self.tables.lock().await;

        if !tables.campers.contains_key(&booking.camper_id) {
            return Err(StoreError::CamperNotFound(booking.camper_id));
        }

        let blocked = tables.blocked_dates_in(&booking.camper_id, &booking.range);
        let conflicts = tables.active_bookings_overlapping(&booking.camper_id, &booking.range);
        let report = AvailabilityReport::new(
            blocked,
            conflicts.iter().map(BookingSpan::from).collect(),
        );
        if !report.available {
            return Err(StoreError::Unavailable(report));
        }

        let customer_id = tables.find_or_create_customer(&booking.customer);
        let created = Booking {
            id: Uuid::new_v4(),
            camper_id: booking.camper_id,
            customer_id,
            start_date: booking.range.start(),
            end_date: booking.range.end(),
            total_price: booking.total_price,
            payment_method: booking.payment_method,
            status: BookingStatus::Pending,
            created_at: Utc::now(),
        };
        tables.bookings.push(created.clone());

        Ok(created)
    }

    async fn list_bookings(
        &self,
        camper_id: Option<&Uuid>,
    ) -> Result<Vec<BookingListing>, StoreError> {
        let tables = self.tables.lock().await;

        let mut bookings: Vec<&Booking> = tables
            .bookings
            .iter()
            .filter(|b| camper_id.is_none_or(|id| b.camper_id == *id))
            .collect();
        bookings.sort_by(|a, b| {
            b.start_date
                .cmp(&a.start_date)
                .then(b.created_at.cmp(&a.created_at))
        });

        bookings.into_iter().map(|b| tables.listing(b)).collect()
    }

    async fn get_booking(&self, booking_id: &Uuid) -> Result<Option<BookingListing>, StoreError> {
        let tables = self.tables.lock().await;
        tables
            .bookings
            .iter()
            .find(|b| b.id == *booking_id)
            .map(|b| tables.listing(b))
            .transpose()
    }

    async fn transition_status(
        &self,
        booking_id: &Uuid,
        next: BookingStatus,
    ) -> Result<StatusChange, StoreError> {
        let mut tables = self.tables.lock().await;

        let booking = tables
            .bookings
            .iter_mut()
            .find(|b| b.id == *booking_id)
            .ok_or(StoreError::BookingNotFound(*booking_id))?;

        let previous = booking.status;
        let changed = previous
            .transition_to(next)
            .map_err(|_| StoreError::InvalidTransition {
                from: previous,
                to: next,
            })?;
        booking.status = next;
        let booking = booking.clone();

        Ok(StatusChange {
            booking: tables.listing(&booking)?,
            previous,
            changed,
        })
    }
}
