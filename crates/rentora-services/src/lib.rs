//! Business logic services for Rentora
//!
//! This crate contains the booking core: conflict-safe booking creation,
//! the booking lifecycle state machine, deterministic rental pricing,
//! the access policy, and reconciliation of asynchronous payment events.
//!
//! # Architecture
//!
//! Services are designed to be composable and testable:
//! - Each service owns its dependencies (repositories, gateway) behind
//!   trait objects or generics, wrapped in Arc for sharing across tasks
//! - All operations are instrumented with tracing
//! - Errors are typed `AppError` values; nothing fails silently
//!
//! # Services
//!
//! - `pricing` - Pure rental cost computation with the grace-period rule
//! - `AccessPolicy` - Per-operation permission tables over tagged roles
//! - `BookingService` - Booking lifecycle (create, cancel, confirm, read)
//! - `ReconciliationService` - Payment initiation and provider events
//! - `HttpPaymentGateway` - HTTP client for the external payment provider

pub mod access;
pub mod booking;
pub mod pricing;
pub mod provider;
pub mod reconciliation;

pub use access::AccessPolicy;
pub use booking::{BookingRequest, BookingService};
pub use provider::{
    ChargeRequest, HttpPaymentGateway, PaymentGateway, ProviderEvent, ProviderEventType,
    ProviderSession,
};
pub use reconciliation::{PaymentInitiation, ReconciliationService};

/// Business logic constants
pub mod constants {
    /// Minutes of overrun tolerated before an extra rental day is charged
    pub const GRACE_PERIOD_MINUTES: i64 = 60;

    /// Minimum charge in rental days
    pub const MIN_RENTAL_DAYS: i64 = 1;

    /// Provider status value indicating a hold awaiting capture
    pub const PROVIDER_STATUS_HOLD: &str = "requires_capture";
}
