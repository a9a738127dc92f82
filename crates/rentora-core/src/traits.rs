//! Common traits for repositories
//!
//! Defines the storage abstractions the services are written against,
//! so business logic stays testable without a live database.

use crate::error::AppError;
use crate::models::{Booking, BookingStatus, NewBooking, Payment, PaymentStatus, PaymentType, VehicleSnapshot};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Booking storage
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Find a booking by id
    async fn find_by_id(&self, id: i64) -> Result<Option<Booking>, AppError>;

    /// Application-level overlap pre-check.
    ///
    /// True if any booking on `vehicle_id` with a status that still
    /// holds its interval satisfies `start < end AND end > start`
    /// against the proposed range, excluding `exclude_id` when given.
    async fn has_active_overlap(
        &self,
        vehicle_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: Option<i64>,
    ) -> Result<bool, AppError>;

    /// Insert a new pending booking.
    ///
    /// Implementations must translate a storage-level exclusion
    /// constraint violation into `AppError::Conflict`, indistinguishable
    /// from the pre-check failure.
    async fn insert(&self, booking: &NewBooking) -> Result<Booking, AppError>;

    /// Update the status of a booking
    async fn update_status(&self, id: i64, status: BookingStatus) -> Result<Booking, AppError>;

    /// Bookings made by a customer, most recent rental first
    async fn list_for_customer(&self, customer_id: i64) -> Result<Vec<Booking>, AppError>;

    /// Bookings owned by an agency, most recent rental first
    async fn list_for_agency(&self, agency_id: i64) -> Result<Vec<Booking>, AppError>;

    /// All bookings (platform admin scope)
    async fn list_all(&self, limit: i64, offset: i64) -> Result<Vec<Booking>, AppError>;
}

/// Payment storage
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Find a payment by its public reference
    async fn find_by_reference(&self, reference: Uuid) -> Result<Option<Payment>, AppError>;

    /// Find an existing pending payment of the given type for a booking
    /// (idempotent initiation)
    async fn find_pending(
        &self,
        booking_id: i64,
        payment_type: PaymentType,
    ) -> Result<Option<Payment>, AppError>;

    /// Find the authorized security deposit for a booking
    async fn find_authorized_deposit(&self, booking_id: i64) -> Result<Option<Payment>, AppError>;

    /// Persist a new payment
    async fn create(&self, payment: &Payment) -> Result<Payment, AppError>;

    /// Update status, provider transaction id and raw payload of a payment
    async fn update_status(
        &self,
        reference: Uuid,
        status: PaymentStatus,
        provider_transaction_id: Option<&str>,
        provider_payload: Option<&serde_json::Value>,
    ) -> Result<Payment, AppError>;

    /// Mark every payment carrying the provider transaction id as
    /// refunded; returns the number of rows touched
    async fn mark_refunded_by_transaction(
        &self,
        provider_transaction_id: &str,
    ) -> Result<u64, AppError>;

    /// Payments attached to a booking, newest first
    async fn list_for_booking(&self, booking_id: i64) -> Result<Vec<Payment>, AppError>;
}

/// Read-only access to the vehicle catalog
#[async_trait]
pub trait VehicleRepository: Send + Sync {
    /// Instant snapshot of owner agency, daily rate and availability
    async fn find_snapshot(&self, id: i64) -> Result<Option<VehicleSnapshot>, AppError>;
}
