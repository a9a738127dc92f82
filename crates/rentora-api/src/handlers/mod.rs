//! HTTP request handlers

pub mod booking;
pub mod payment;

pub use booking::configure as configure_bookings;
pub use payment::configure as configure_payments;
