//! Booking DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use rentora_core::models::Booking;

/// Request body for creating a booking
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBookingRequest {
    #[validate(range(min = 1))]
    pub vehicle_id: i64,

    #[validate(range(min = 1))]
    pub pickup_location_id: i64,

    #[validate(range(min = 1))]
    pub dropoff_location_id: i64,

    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Request body for a booking status change (PATCH)
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBookingRequest {
    /// Target status; only "cancelled" may be requested by clients
    pub status: String,
}

/// Booking response DTO
#[derive(Debug, Clone, Serialize)]
pub struct BookingResponse {
    pub id: i64,
    pub vehicle_id: i64,
    pub customer_id: i64,
    pub agency_id: i64,
    pub pickup_location_id: i64,
    pub dropoff_location_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub total_cost: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            vehicle_id: b.vehicle_id,
            customer_id: b.customer_id,
            agency_id: b.agency_id,
            pickup_location_id: b.pickup_location_id,
            dropoff_location_id: b.dropoff_location_id,
            start_time: b.start_time,
            end_time: b.end_time,
            total_cost: b.total_cost,
            status: b.status.to_string(),
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rentora_core::models::BookingStatus;
    use rust_decimal_macros::dec;

    #[test]
    fn test_create_request_validation() {
        let now = Utc::now();
        let request = CreateBookingRequest {
            vehicle_id: 0,
            pickup_location_id: 1,
            dropoff_location_id: 1,
            start_time: now,
            end_time: now,
        };
        assert!(request.validate().is_err());

        let request = CreateBookingRequest {
            vehicle_id: 10,
            ..request
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_booking_response_conversion() {
        let now = Utc::now();
        let booking = Booking {
            id: 7,
            vehicle_id: 10,
            customer_id: 1,
            agency_id: 30,
            pickup_location_id: 1,
            dropoff_location_id: 2,
            start_time: now,
            end_time: now + chrono::Duration::days(3),
            total_cost: dec!(150.00),
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let response = BookingResponse::from(booking);
        assert_eq!(response.id, 7);
        assert_eq!(response.status, "pending");
        assert_eq!(response.total_cost, dec!(150.00));
    }
}
