//! Rentora Database Layer
//!
//! This crate provides PostgreSQL database access and repository
//! implementations for the Rentora booking core. It includes:
//!
//! - Connection pool management with sqlx
//! - Repository implementations for bookings, payments and vehicle snapshots
//! - Translation of the range-overlap exclusion constraint into the
//!   application conflict error

pub mod pool;
pub mod repositories;

pub use pool::create_pool;
pub use repositories::*;

// Re-export commonly used types
pub use rentora_core::{AppError, AppResult};
pub use sqlx::{PgPool, Postgres, Transaction};
