//! Vehicle snapshot repository
//!
//! Read-only access to the catalog-owned vehicles table. The booking
//! core never writes vehicles; it reads an instant snapshot of the
//! owner agency and the daily rate when a booking is created.

use async_trait::async_trait;
use rentora_core::{
    models::{VehicleSnapshot, VehicleStatus},
    traits::VehicleRepository,
    AppError, AppResult,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, instrument};

/// PostgreSQL implementation of VehicleRepository
pub struct PgVehicleRepository {
    pool: PgPool,
}

impl PgVehicleRepository {
    /// Create a new vehicle repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct VehicleRow {
    id: i64,
    owner_agency_id: i64,
    daily_rate: Decimal,
    status: String,
}

impl TryFrom<VehicleRow> for VehicleSnapshot {
    type Error = AppError;

    fn try_from(row: VehicleRow) -> Result<Self, AppError> {
        let status = VehicleStatus::from_str(&row.status).ok_or_else(|| {
            AppError::Database(format!(
                "Unknown vehicle status '{}' on vehicle {}",
                row.status, row.id
            ))
        })?;

        Ok(Self {
            id: row.id,
            owner_agency_id: row.owner_agency_id,
            daily_rate: row.daily_rate,
            status,
        })
    }
}

#[async_trait]
impl VehicleRepository for PgVehicleRepository {
    #[instrument(skip(self))]
    async fn find_snapshot(&self, id: i64) -> AppResult<Option<VehicleSnapshot>> {
        debug!("Fetching vehicle snapshot: {}", id);

        let row = sqlx::query_as::<sqlx::Postgres, VehicleRow>(
            "SELECT id, owner_agency_id, daily_rate, status FROM vehicles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error fetching vehicle {}: {}", id, e);
            AppError::Database(format!("Failed to fetch vehicle: {}", e))
        })?;

        row.map(VehicleSnapshot::try_from).transpose()
    }
}
