//! Data transfer objects

pub mod booking;
pub mod common;
pub mod payment;

pub use booking::{BookingResponse, CreateBookingRequest, UpdateBookingRequest};
pub use common::ApiResponse;
pub use payment::{InitiatePaymentRequest, PaymentInitiationResponse, PaymentResponse};
