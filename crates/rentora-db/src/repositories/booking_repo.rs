//! Booking repository implementation
//!
//! Provides PostgreSQL-backed storage for bookings. The insert path is
//! where the double-booking guarantee lives: the `bookings_no_overlap`
//! exclusion constraint rejects concurrent overlapping inserts, and the
//! violation is translated into the same conflict error the application
//! pre-check produces.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rentora_core::{
    models::{Booking, BookingStatus, NewBooking},
    traits::BookingRepository,
    AppError, AppResult,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, instrument, warn};

/// Constraint backing invariant 4 (no overlapping active bookings)
const OVERLAP_CONSTRAINT: &str = "bookings_no_overlap";

/// Constraint backing invariant 1 (end strictly after start)
const DATE_ORDER_CONSTRAINT: &str = "bookings_end_after_start";

const BOOKING_COLUMNS: &str = r#"
    id, vehicle_id, customer_id, agency_id,
    pickup_location_id, dropoff_location_id,
    start_time, end_time, total_cost, status,
    created_at, updated_at
"#;

/// PostgreSQL implementation of BookingRepository
pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    /// Create a new booking repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Row struct for database queries
#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    id: i64,
    vehicle_id: i64,
    customer_id: i64,
    agency_id: i64,
    pickup_location_id: i64,
    dropoff_location_id: i64,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    total_cost: Decimal,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = AppError;

    /// A stored status outside the known set is data corruption, not a
    /// default; coercing it would silently re-enter the overlap set.
    fn try_from(row: BookingRow) -> Result<Self, AppError> {
        let status = BookingStatus::from_str(&row.status).ok_or_else(|| {
            AppError::Database(format!(
                "Unknown booking status '{}' on booking {}",
                row.status, row.id
            ))
        })?;

        Ok(Self {
            id: row.id,
            vehicle_id: row.vehicle_id,
            customer_id: row.customer_id,
            agency_id: row.agency_id,
            pickup_location_id: row.pickup_location_id,
            dropoff_location_id: row.dropoff_location_id,
            start_time: row.start_time,
            end_time: row.end_time,
            total_cost: row.total_cost,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Map an insert error, translating named constraint violations
fn map_insert_error(e: sqlx::Error) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        match db_err.constraint() {
            Some(OVERLAP_CONSTRAINT) => {
                warn!("Overlap constraint rejected booking insert");
                return AppError::vehicle_unavailable();
            }
            Some(DATE_ORDER_CONSTRAINT) => {
                return AppError::Validation("End time must be after start time".to_string());
            }
            _ => {}
        }
    }
    error!("Failed to insert booking: {}", e);
    AppError::Database(format!("Failed to insert booking: {}", e))
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Booking>> {
        debug!("Finding booking by id: {}", id);

        let row = sqlx::query_as::<sqlx::Postgres, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE id = $1",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding booking {}: {}", id, e);
            AppError::Database(format!("Failed to find booking: {}", e))
        })?;

        row.map(Booking::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn has_active_overlap(
        &self,
        vehicle_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: Option<i64>,
    ) -> AppResult<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM bookings
                WHERE vehicle_id = $1
                  AND status IN ('pending', 'confirmed')
                  AND start_time < $3
                  AND end_time > $2
                  AND ($4::BIGINT IS NULL OR id <> $4)
            )
            "#,
        )
        .bind(vehicle_id)
        .bind(start)
        .bind(end)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Overlap check failed for vehicle {}: {}", vehicle_id, e);
            AppError::Database(format!("Failed to check overlap: {}", e))
        })?;

        Ok(exists)
    }

    #[instrument(skip(self, booking))]
    async fn insert(&self, booking: &NewBooking) -> AppResult<Booking> {
        debug!(
            "Inserting booking for vehicle {} [{} .. {})",
            booking.vehicle_id, booking.start_time, booking.end_time
        );

        let row = sqlx::query_as::<sqlx::Postgres, BookingRow>(&format!(
            r#"
            INSERT INTO bookings (
                vehicle_id, customer_id, agency_id,
                pickup_location_id, dropoff_location_id,
                start_time, end_time, total_cost, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending')
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(booking.vehicle_id)
        .bind(booking.customer_id)
        .bind(booking.agency_id)
        .bind(booking.pickup_location_id)
        .bind(booking.dropoff_location_id)
        .bind(booking.start_time)
        .bind(booking.end_time)
        .bind(booking.total_cost)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)?;

        row.try_into()
    }

    #[instrument(skip(self))]
    async fn update_status(&self, id: i64, status: BookingStatus) -> AppResult<Booking> {
        let row = sqlx::query_as::<sqlx::Postgres, BookingRow>(&format!(
            r#"
            UPDATE bookings
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(id)
        .bind(status.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to update booking {} status: {}", id, e);
            AppError::Database(format!("Failed to update booking status: {}", e))
        })?
        .ok_or(AppError::BookingNotFound(id))?;

        row.try_into()
    }

    #[instrument(skip(self))]
    async fn list_for_customer(&self, customer_id: i64) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query_as::<sqlx::Postgres, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE customer_id = $1 ORDER BY start_time DESC",
            BOOKING_COLUMNS
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to list bookings for customer {}: {}", customer_id, e);
            AppError::Database(format!("Failed to list bookings: {}", e))
        })?;

        rows.into_iter().map(Booking::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn list_for_agency(&self, agency_id: i64) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query_as::<sqlx::Postgres, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE agency_id = $1 ORDER BY start_time DESC",
            BOOKING_COLUMNS
        ))
        .bind(agency_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to list bookings for agency {}: {}", agency_id, e);
            AppError::Database(format!("Failed to list bookings: {}", e))
        })?;

        rows.into_iter().map(Booking::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn list_all(&self, limit: i64, offset: i64) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query_as::<sqlx::Postgres, BookingRow>(&format!(
            "SELECT {} FROM bookings ORDER BY start_time DESC LIMIT $1 OFFSET $2",
            BOOKING_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to list bookings: {}", e);
            AppError::Database(format!("Failed to list bookings: {}", e))
        })?;

        rows.into_iter().map(Booking::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn row_with_status(status: &str) -> BookingRow {
        let now = Utc::now();
        BookingRow {
            id: 1,
            vehicle_id: 10,
            customer_id: 20,
            agency_id: 30,
            pickup_location_id: 1,
            dropoff_location_id: 2,
            start_time: now,
            end_time: now + Duration::days(3),
            total_cost: dec!(150.00),
            status: status.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_row_conversion_parses_status() {
        let booking = Booking::try_from(row_with_status("confirmed")).unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
    }

    #[test]
    fn test_row_conversion_rejects_unknown_status() {
        let err = Booking::try_from(row_with_status("no_show")).unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
        assert!(err.to_string().contains("no_show"));
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_exclusion_constraint_rejects_concurrent_overlap() {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/rentora".to_string());
        let pool = crate::pool::create_pool(&database_url, Some(5)).await.unwrap();
        crate::pool::run_migrations(&pool).await.unwrap();

        let repo = PgBookingRepository::new(pool);

        // Fresh vehicle id so reruns never collide with earlier rows
        let vehicle_id = Utc::now().timestamp_micros();
        let start = Utc::now() + chrono::Duration::days(30);
        let first = NewBooking {
            vehicle_id,
            customer_id: 1,
            agency_id: 1,
            pickup_location_id: 1,
            dropoff_location_id: 1,
            start_time: start,
            end_time: start + Duration::days(3),
            total_cost: dec!(150.00),
        };

        repo.insert(&first).await.unwrap();

        // Bypasses the application pre-check entirely; the constraint
        // alone must reject the overlap and surface the shared
        // conflict error.
        let overlapping = NewBooking {
            customer_id: 2,
            start_time: start + Duration::days(1),
            end_time: start + Duration::days(2),
            ..first.clone()
        };
        let err = repo.insert(&overlapping).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(err.to_string(), AppError::vehicle_unavailable().to_string());

        // Adjacent half-open window still inserts
        let adjacent = NewBooking {
            customer_id: 3,
            start_time: start + Duration::days(3),
            end_time: start + Duration::days(5),
            ..first
        };
        repo.insert(&adjacent).await.unwrap();
    }
}
