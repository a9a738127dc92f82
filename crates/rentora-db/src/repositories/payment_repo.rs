//! Payment repository implementation
//!
//! PostgreSQL-backed storage for payments. Lookups by public reference
//! and by provider transaction id drive the webhook reconciliation path;
//! the `(booking, type, pending)` lookup backs idempotent initiation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rentora_core::{
    models::{Payment, PaymentStatus, PaymentType},
    traits::PaymentRepository,
    AppError, AppResult,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, instrument};
use uuid::Uuid;

const PAYMENT_COLUMNS: &str = r#"
    id, reference, booking_id, amount, currency,
    payment_type, status, provider,
    provider_transaction_id, provider_payload,
    created_at, updated_at
"#;

/// PostgreSQL implementation of PaymentRepository
pub struct PgPaymentRepository {
    pool: PgPool,
}

impl PgPaymentRepository {
    /// Create a new payment repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Row struct for database queries
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: i64,
    reference: Uuid,
    booking_id: i64,
    amount: Decimal,
    currency: String,
    payment_type: String,
    status: String,
    provider: String,
    provider_transaction_id: Option<String>,
    provider_payload: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = AppError;

    /// Unknown stored type/status values surface as database errors
    /// instead of silently coercing to the default variants.
    fn try_from(row: PaymentRow) -> Result<Self, AppError> {
        let payment_type = PaymentType::from_str(&row.payment_type).ok_or_else(|| {
            AppError::Database(format!(
                "Unknown payment type '{}' on payment {}",
                row.payment_type, row.reference
            ))
        })?;
        let status = PaymentStatus::from_str(&row.status).ok_or_else(|| {
            AppError::Database(format!(
                "Unknown payment status '{}' on payment {}",
                row.status, row.reference
            ))
        })?;

        Ok(Self {
            id: row.id,
            reference: row.reference,
            booking_id: row.booking_id,
            amount: row.amount,
            currency: row.currency.trim_end().to_string(),
            payment_type,
            status,
            provider: row.provider,
            provider_transaction_id: row.provider_transaction_id,
            provider_payload: row.provider_payload,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl PaymentRepository for PgPaymentRepository {
    #[instrument(skip(self))]
    async fn find_by_reference(&self, reference: Uuid) -> AppResult<Option<Payment>> {
        debug!("Finding payment by reference: {}", reference);

        let row = sqlx::query_as::<sqlx::Postgres, PaymentRow>(&format!(
            "SELECT {} FROM payments WHERE reference = $1",
            PAYMENT_COLUMNS
        ))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding payment {}: {}", reference, e);
            AppError::Database(format!("Failed to find payment: {}", e))
        })?;

        row.map(Payment::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_pending(
        &self,
        booking_id: i64,
        payment_type: PaymentType,
    ) -> AppResult<Option<Payment>> {
        let row = sqlx::query_as::<sqlx::Postgres, PaymentRow>(&format!(
            r#"
            SELECT {} FROM payments
            WHERE booking_id = $1 AND payment_type = $2 AND status = 'pending'
            ORDER BY created_at DESC
            LIMIT 1
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(booking_id)
        .bind(payment_type.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Failed to find pending {} payment for booking {}: {}",
                payment_type, booking_id, e
            );
            AppError::Database(format!("Failed to find pending payment: {}", e))
        })?;

        row.map(Payment::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_authorized_deposit(&self, booking_id: i64) -> AppResult<Option<Payment>> {
        let row = sqlx::query_as::<sqlx::Postgres, PaymentRow>(&format!(
            r#"
            SELECT {} FROM payments
            WHERE booking_id = $1
              AND payment_type = 'security_deposit'
              AND status = 'authorized'
            ORDER BY created_at DESC
            LIMIT 1
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Failed to find authorized deposit for booking {}: {}",
                booking_id, e
            );
            AppError::Database(format!("Failed to find deposit: {}", e))
        })?;

        row.map(Payment::try_from).transpose()
    }

    #[instrument(skip(self, payment))]
    async fn create(&self, payment: &Payment) -> AppResult<Payment> {
        debug!(
            "Creating {} payment {} for booking {}",
            payment.payment_type, payment.reference, payment.booking_id
        );

        let row = sqlx::query_as::<sqlx::Postgres, PaymentRow>(&format!(
            r#"
            INSERT INTO payments (
                reference, booking_id, amount, currency,
                payment_type, status, provider,
                provider_transaction_id, provider_payload
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(payment.reference)
        .bind(payment.booking_id)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(payment.payment_type.to_string())
        .bind(payment.status.to_string())
        .bind(&payment.provider)
        .bind(&payment.provider_transaction_id)
        .bind(&payment.provider_payload)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create payment: {}", e);
            AppError::Database(format!("Failed to create payment: {}", e))
        })?;

        row.try_into()
    }

    #[instrument(skip(self, provider_payload))]
    async fn update_status(
        &self,
        reference: Uuid,
        status: PaymentStatus,
        provider_transaction_id: Option<&str>,
        provider_payload: Option<&serde_json::Value>,
    ) -> AppResult<Payment> {
        let row = sqlx::query_as::<sqlx::Postgres, PaymentRow>(&format!(
            r#"
            UPDATE payments
            SET status = $2,
                provider_transaction_id = COALESCE($3, provider_transaction_id),
                provider_payload = COALESCE($4, provider_payload),
                updated_at = NOW()
            WHERE reference = $1
            RETURNING {}
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(reference)
        .bind(status.to_string())
        .bind(provider_transaction_id)
        .bind(provider_payload)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to update payment {} status: {}", reference, e);
            AppError::Database(format!("Failed to update payment: {}", e))
        })?
        .ok_or_else(|| AppError::PaymentNotFound(reference.to_string()))?;

        row.try_into()
    }

    #[instrument(skip(self))]
    async fn mark_refunded_by_transaction(
        &self,
        provider_transaction_id: &str,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'refunded', updated_at = NOW()
            WHERE provider_transaction_id = $1
            "#,
        )
        .bind(provider_transaction_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Failed to mark refunds for transaction {}: {}",
                provider_transaction_id, e
            );
            AppError::Database(format!("Failed to mark refunds: {}", e))
        })?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn list_for_booking(&self, booking_id: i64) -> AppResult<Vec<Payment>> {
        let rows = sqlx::query_as::<sqlx::Postgres, PaymentRow>(&format!(
            "SELECT {} FROM payments WHERE booking_id = $1 ORDER BY created_at DESC",
            PAYMENT_COLUMNS
        ))
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to list payments for booking {}: {}", booking_id, e);
            AppError::Database(format!("Failed to list payments: {}", e))
        })?;

        rows.into_iter().map(Payment::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(payment_type: &str, status: &str) -> PaymentRow {
        let now = Utc::now();
        PaymentRow {
            id: 1,
            reference: Uuid::new_v4(),
            booking_id: 7,
            amount: dec!(150.00),
            currency: "USD".to_string(),
            payment_type: payment_type.to_string(),
            status: status.to_string(),
            provider: "stripe".to_string(),
            provider_transaction_id: None,
            provider_payload: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_row_conversion_parses_type_and_status() {
        let payment = Payment::try_from(row("security_deposit", "authorized")).unwrap();
        assert_eq!(payment.payment_type, PaymentType::SecurityDeposit);
        assert_eq!(payment.status, PaymentStatus::Authorized);
    }

    #[test]
    fn test_row_conversion_rejects_unknown_values() {
        let err = Payment::try_from(row("chargeback", "pending")).unwrap_err();
        assert!(matches!(err, AppError::Database(_)));

        let err = Payment::try_from(row("rental_fee", "disputed")).unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
        assert!(err.to_string().contains("disputed"));
    }

    #[test]
    fn test_row_conversion_trims_char_currency_padding() {
        let mut padded = row("rental_fee", "pending");
        padded.currency = "USD ".to_string();
        let payment = Payment::try_from(padded).unwrap();
        assert_eq!(payment.currency, "USD");
    }
}
