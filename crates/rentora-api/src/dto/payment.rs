//! Payment DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use rentora_core::models::Payment;
use rentora_services::PaymentInitiation;

/// Request body for initiating a payment
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct InitiatePaymentRequest {
    #[validate(range(min = 1))]
    pub booking_id: i64,

    /// "rental_fee" or "security_deposit"
    pub payment_type: String,
}

/// Payment response DTO
///
/// Internal ordinal ids never leave the service; clients identify
/// payments by the UUID reference.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentResponse {
    pub reference: Uuid,
    pub booking_id: i64,
    pub amount: Decimal,
    pub currency: String,
    pub payment_type: String,
    pub status: String,
    pub provider: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(p: Payment) -> Self {
        Self {
            reference: p.reference,
            booking_id: p.booking_id,
            amount: p.amount,
            currency: p.currency,
            payment_type: p.payment_type.to_string(),
            status: p.status.to_string(),
            provider: p.provider,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Response for a payment initiation
#[derive(Debug, Clone, Serialize)]
pub struct PaymentInitiationResponse {
    #[serde(flatten)]
    pub payment: PaymentResponse,

    /// Checkout URL for the client when a new provider session was
    /// opened
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_url: Option<String>,

    /// False when an existing pending payment was returned
    pub created: bool,
}

impl From<PaymentInitiation> for PaymentInitiationResponse {
    fn from(init: PaymentInitiation) -> Self {
        Self {
            payment: PaymentResponse::from(init.payment),
            checkout_url: init.checkout_url,
            created: init.created,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rentora_core::models::PaymentType;
    use rust_decimal_macros::dec;

    #[test]
    fn test_payment_response_hides_internal_id() {
        let payment = Payment::new(7, dec!(150.00), "USD", PaymentType::RentalFee, "stripe");
        let response = PaymentResponse::from(payment.clone());

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["reference"], payment.reference.to_string());
        assert_eq!(json["payment_type"], "rental_fee");
        assert_eq!(json["status"], "pending");
    }

    #[test]
    fn test_initiation_response_flattens_payment() {
        let payment = Payment::new(7, dec!(250.00), "USD", PaymentType::SecurityDeposit, "stripe");
        let response = PaymentInitiationResponse {
            payment: PaymentResponse::from(payment),
            checkout_url: Some("https://checkout.test/s1".to_string()),
            created: true,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["payment_type"], "security_deposit");
        assert_eq!(json["checkout_url"], "https://checkout.test/s1");
        assert_eq!(json["created"], true);
    }
}
