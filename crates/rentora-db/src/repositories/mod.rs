//! Repository implementations
//!
//! PostgreSQL-backed implementations of the storage traits defined in
//! `rentora-core`.

pub mod booking_repo;
pub mod payment_repo;
pub mod vehicle_repo;

pub use booking_repo::PgBookingRepository;
pub use payment_repo::PgPaymentRepository;
pub use vehicle_repo::PgVehicleRepository;
