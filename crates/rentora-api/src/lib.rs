//! HTTP API layer for Rentora
//!
//! Actix-web handlers, request/response DTOs, and the gateway identity
//! extractor. Routes are versioned under `/api/v1`.

pub mod dto;
pub mod handlers;
pub mod identity;

pub use dto::ApiResponse;
pub use handlers::{configure_bookings, configure_payments};
pub use identity::Identity;

use rentora_db::repositories::{PgBookingRepository, PgPaymentRepository, PgVehicleRepository};
use rentora_services::{BookingService, HttpPaymentGateway, ReconciliationService};

/// Booking service over the Postgres repositories
pub type AppBookingService = BookingService<PgVehicleRepository, PgBookingRepository>;

/// Reconciliation service over the Postgres repositories and the HTTP
/// payment gateway
pub type AppReconciliationService =
    ReconciliationService<PgPaymentRepository, HttpPaymentGateway, PgVehicleRepository, PgBookingRepository>;
