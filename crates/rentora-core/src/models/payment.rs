//! Payment model
//!
//! Tracks charges against bookings: rental fees, security deposits and
//! incident fees. Payments carry a public UUID reference so internal
//! ordinal ids never leak to the provider or to API clients.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Created locally, provider charge not settled yet
    #[default]
    Pending,
    /// Provider holds the funds without capture (security deposits)
    Authorized,
    /// Funds captured
    Completed,
    /// Provider reported a failure; retry allowed
    Failed,
    /// Fully refunded or hold released
    Refunded,
    /// Partially refunded
    PartiallyRefunded,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Authorized => write!(f, "authorized"),
            PaymentStatus::Completed => write!(f, "completed"),
            PaymentStatus::Failed => write!(f, "failed"),
            PaymentStatus::Refunded => write!(f, "refunded"),
            PaymentStatus::PartiallyRefunded => write!(f, "partially_refunded"),
        }
    }
}

impl PaymentStatus {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(PaymentStatus::Pending),
            "authorized" => Some(PaymentStatus::Authorized),
            "completed" => Some(PaymentStatus::Completed),
            "failed" => Some(PaymentStatus::Failed),
            "refunded" => Some(PaymentStatus::Refunded),
            "partially_refunded" => Some(PaymentStatus::PartiallyRefunded),
            _ => None,
        }
    }

    /// Whether the provider settled this payment (capture or hold)
    pub fn is_settled(&self) -> bool {
        matches!(self, PaymentStatus::Completed | PaymentStatus::Authorized)
    }
}

/// Payment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// The rental fee; settling it confirms the booking
    #[default]
    RentalFee,
    /// Card hold released after the rental
    SecurityDeposit,
    /// Late return fee
    LateFee,
    /// Damage charge
    DamageCharge,
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentType::RentalFee => write!(f, "rental_fee"),
            PaymentType::SecurityDeposit => write!(f, "security_deposit"),
            PaymentType::LateFee => write!(f, "late_fee"),
            PaymentType::DamageCharge => write!(f, "damage_charge"),
        }
    }
}

impl PaymentType {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "rental_fee" => Some(PaymentType::RentalFee),
            "security_deposit" => Some(PaymentType::SecurityDeposit),
            "late_fee" => Some(PaymentType::LateFee),
            "damage_charge" => Some(PaymentType::DamageCharge),
            _ => None,
        }
    }

    /// Security deposits are held (manual capture), everything else is
    /// captured immediately.
    pub fn uses_hold(&self) -> bool {
        matches!(self, PaymentType::SecurityDeposit)
    }
}

/// Payment entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Internal identifier
    pub id: i64,

    /// Public reference exposed to API clients and provider metadata
    pub reference: Uuid,

    /// Booking this payment settles
    pub booking_id: i64,

    /// Charged amount
    pub amount: Decimal,

    /// ISO 4217 currency code
    pub currency: String,

    /// Type of payment
    pub payment_type: PaymentType,

    /// Current status
    pub status: PaymentStatus,

    /// Provider name ("stripe", "paypal", ...)
    pub provider: String,

    /// Provider-side transaction id, unique once assigned
    pub provider_transaction_id: Option<String>,

    /// Raw provider payload, stored verbatim for audit; never parsed
    pub provider_payload: Option<serde_json::Value>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Create a new pending payment for a booking
    pub fn new(
        booking_id: i64,
        amount: Decimal,
        currency: impl Into<String>,
        payment_type: PaymentType,
        provider: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            reference: Uuid::new_v4(),
            booking_id,
            amount,
            currency: currency.into(),
            payment_type,
            status: PaymentStatus::Pending,
            provider: provider.into(),
            provider_transaction_id: None,
            provider_payload: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_payment_defaults() {
        let p = Payment::new(7, dec!(150.00), "USD", PaymentType::RentalFee, "stripe");
        assert_eq!(p.status, PaymentStatus::Pending);
        assert_eq!(p.booking_id, 7);
        assert!(p.provider_transaction_id.is_none());
        assert!(p.provider_payload.is_none());
    }

    #[test]
    fn test_hold_semantics() {
        assert!(PaymentType::SecurityDeposit.uses_hold());
        assert!(!PaymentType::RentalFee.uses_hold());
        assert!(!PaymentType::LateFee.uses_hold());
    }

    #[test]
    fn test_settled_statuses() {
        assert!(PaymentStatus::Completed.is_settled());
        assert!(PaymentStatus::Authorized.is_settled());
        assert!(!PaymentStatus::Pending.is_settled());
        assert!(!PaymentStatus::Failed.is_settled());
    }

    #[test]
    fn test_status_roundtrip() {
        for s in [
            PaymentStatus::Pending,
            PaymentStatus::Authorized,
            PaymentStatus::Completed,
            PaymentStatus::Failed,
            PaymentStatus::Refunded,
            PaymentStatus::PartiallyRefunded,
        ] {
            assert_eq!(PaymentStatus::from_str(&s.to_string()), Some(s));
        }
    }
}
