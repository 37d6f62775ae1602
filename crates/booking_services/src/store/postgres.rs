use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use uuid::Uuid;

use super::{BookingStore, StoreError};
use crate::availability::{AvailabilityReport, BookingSpan};
use crate::dates::DateRange;
use crate::types::{
    Booking, BookingListing, BookingStatus, Camper, CamperSummary, Customer, CustomerSummary,
    NewBooking, NewCustomer, PaymentMethod, StatusChange,
};

const BOOKING_COLUMNS: &str = r#"
    b.id, b.camper_id, b.customer_id, b.start_date, b.end_date,
    b.total_price, b.payment_method, b.status, b.created_at
"#;

const LISTING_JOIN: &str = r#"
    FROM bookings b
    JOIN campers c ON c.id = b.camper_id
    JOIN customers cu ON cu.id = b.customer_id
"#;

/// Booking store backed by PostgreSQL.
///
/// Double bookings are prevented twice: booking inserts lock the camper row and
/// re-check availability inside a transaction, and the `bookings_no_overlap`
/// exclusion constraint rejects any overlapping active row that slips through.
#[derive(Debug, Clone)]
pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    /// Creates a new instance of `PgBookingStore` with the provided database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn blocked_dates_on(
        conn: &mut PgConnection,
        camper_id: &Uuid,
        range: &DateRange,
    ) -> Result<Vec<NaiveDate>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT date
            FROM blocked_dates
            WHERE camper_id = $1 AND date >= $2 AND date <= $3
            ORDER BY date
            "#,
        )
        .bind(camper_id)
        .bind(range.start())
        .bind(range.end())
        .fetch_all(conn)
        .await?;

        rows.iter()
            .map(|row| row.try_get("date").map_err(StoreError::from))
            .collect()
    }

    async fn active_overlaps_on(
        conn: &mut PgConnection,
        camper_id: &Uuid,
        range: &DateRange,
    ) -> Result<Vec<Booking>, StoreError> {
        let query = format!(
            r#"
            SELECT {BOOKING_COLUMNS}
            FROM bookings b
            WHERE b.camper_id = $1
              AND b.status IN ('PENDING', 'CONFIRMED')
              AND b.start_date < $3
              AND b.end_date > $2
            ORDER BY b.start_date
            "#
        );

        let rows = sqlx::query(&query)
            .bind(camper_id)
            .bind(range.start())
            .bind(range.end())
            .fetch_all(conn)
            .await?;

        rows.iter().map(booking_from_row).collect()
    }

    /// Finds the customer by email or creates it. Existing records are kept as stored.
    async fn find_or_create_customer(
        conn: &mut PgConnection,
        customer: &NewCustomer,
    ) -> Result<Uuid, StoreError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO customers (email, name, phone, dni, license)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&customer.email)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.dni)
        .bind(&customer.license)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(row) = inserted {
            return Ok(row.try_get("id")?);
        }

        let row = sqlx::query("SELECT id FROM customers WHERE email = $1")
            .bind(&customer.email)
            .fetch_one(&mut *conn)
            .await?;

        Ok(row.try_get("id")?)
    }

    async fn listing_on(
        conn: &mut PgConnection,
        booking_id: &Uuid,
    ) -> Result<Option<BookingListing>, StoreError> {
        let query = format!(
            r#"
            SELECT {BOOKING_COLUMNS},
                c.name AS camper_name, c.slug AS camper_slug,
                cu.name AS customer_name, cu.email AS customer_email
            {LISTING_JOIN}
            WHERE b.id = $1
            "#
        );

        let row = sqlx::query(&query)
            .bind(booking_id)
            .fetch_optional(conn)
            .await?;

        row.as_ref().map(listing_from_row).transpose()
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn find_camper(&self, camper_id: &Uuid) -> Result<Option<Camper>, StoreError> {
        let row = sqlx::query("SELECT id, slug, name FROM campers WHERE id = $1")
            .bind(camper_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(Camper {
                id: row.try_get("id")?,
                slug: row.try_get("slug")?,
                name: row.try_get("name")?,
            })),
            None => Ok(None),
        }
    }

    async fn blocked_dates_in(
        &self,
        camper_id: &Uuid,
        range: &DateRange,
    ) -> Result<Vec<NaiveDate>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Self::blocked_dates_on(&mut conn, camper_id, range).await
    }

    async fn active_bookings_overlapping(
        &self,
        camper_id: &Uuid,
        range: &DateRange,
    ) -> Result<Vec<Booking>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Self::active_overlaps_on(&mut conn, camper_id, range).await
    }

    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>, StoreError> {
        let row = sqlx::query(
            "SELECT id, email, name, phone, dni, license FROM customers WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Customer {
                id: row.try_get("id")?,
                email: row.try_get("email")?,
                name: row.try_get("name")?,
                phone: row.try_get("phone")?,
                dni: row.try_get("dni")?,
                license: row.try_get("license")?,
            })),
            None => Ok(None),
        }
    }

    async fn insert_booking(&self, booking: NewBooking) -> Result<Booking, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Serialises bookings of the same camper until commit
        let camper = sqlx::query("SELECT id FROM campers WHERE id = $1 FOR UPDATE")
            .bind(booking.camper_id)
            .fetch_optional(&mut *tx)
            .await?;
        if camper.is_none() {
            return Err(StoreError::CamperNotFound(booking.camper_id));
        }

        let blocked = Self::blocked_dates_on(&mut tx, &booking.camper_id, &booking.range).await?;
        let conflicts = Self::active_overlaps_on(&mut tx, &booking.camper_id, &booking.range).await?;
        let report = AvailabilityReport::new(
            blocked,
            conflicts.iter().map(BookingSpan::from).collect(),
        );
        if !report.available {
            return Err(StoreError::Unavailable(report));
        }

        let customer_id = Self::find_or_create_customer(&mut tx, &booking.customer).await?;

        let query = format!(
            r#"
            INSERT INTO bookings AS b (
                camper_id, customer_id, start_date, end_date, total_price, payment_method, status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {BOOKING_COLUMNS}
            "#
        );
        let row = sqlx::query(&query)
            .bind(booking.camper_id)
            .bind(customer_id)
            .bind(booking.range.start())
            .bind(booking.range.end())
            .bind(booking.total_price)
            .bind(booking.payment_method.as_str())
            .bind(BookingStatus::Pending.as_str())
            .fetch_one(&mut *tx)
            .await?;
        let created = booking_from_row(&row)?;

        tx.commit().await?;

        Ok(created)
    }

    async fn list_bookings(
        &self,
        camper_id: Option<&Uuid>,
    ) -> Result<Vec<BookingListing>, StoreError> {
        let query = format!(
            r#"
            SELECT {BOOKING_COLUMNS},
                c.name AS camper_name, c.slug AS camper_slug,
                cu.name AS customer_name, cu.email AS customer_email
            {LISTING_JOIN}
            WHERE ($1::uuid IS NULL OR b.camper_id = $1)
            ORDER BY b.start_date DESC, b.created_at DESC
            "#
        );

        let rows = sqlx::query(&query)
            .bind(camper_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(listing_from_row).collect()
    }

    async fn get_booking(&self, booking_id: &Uuid) -> Result<Option<BookingListing>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Self::listing_on(&mut conn, booking_id).await
    }

    async fn transition_status(
        &self,
        booking_id: &Uuid,
        next: BookingStatus,
    ) -> Result<StatusChange, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT status FROM bookings WHERE id = $1 FOR UPDATE")
            .bind(booking_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::BookingNotFound(*booking_id))?;
        let previous = parse_status(&row)?;

        let changed = previous
            .transition_to(next)
            .map_err(|_| StoreError::InvalidTransition {
                from: previous,
                to: next,
            })?;

        if changed {
            sqlx::query("UPDATE bookings SET status = $1, updated_at = NOW() WHERE id = $2")
                .bind(next.as_str())
                .bind(booking_id)
                .execute(&mut *tx)
                .await?;
        }

        let booking = Self::listing_on(&mut tx, booking_id)
            .await?
            .ok_or(StoreError::BookingNotFound(*booking_id))?;

        tx.commit().await?;

        Ok(StatusChange {
            booking,
            previous,
            changed,
        })
    }
}

fn parse_status(row: &PgRow) -> Result<BookingStatus, StoreError> {
    row.try_get::<String, _>("status")?
        .parse()
        .map_err(StoreError::Corrupt)
}

fn booking_from_row(row: &PgRow) -> Result<Booking, StoreError> {
    let payment_method: PaymentMethod = row
        .try_get::<String, _>("payment_method")?
        .parse()
        .map_err(StoreError::Corrupt)?;

    Ok(Booking {
        id: row.try_get("id")?,
        camper_id: row.try_get("camper_id")?,
        customer_id: row.try_get("customer_id")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        total_price: row.try_get("total_price")?,
        payment_method,
        status: parse_status(row)?,
        created_at: row.try_get("created_at")?,
    })
}

fn listing_from_row(row: &PgRow) -> Result<BookingListing, StoreError> {
    Ok(BookingListing {
        booking: booking_from_row(row)?,
        camper: CamperSummary {
            name: row.try_get("camper_name")?,
            slug: row.try_get("camper_slug")?,
        },
        customer: CustomerSummary {
            name: row.try_get("customer_name")?,
            email: row.try_get("customer_email")?,
        },
    })
}
