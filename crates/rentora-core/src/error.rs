//! Unified error handling for Rentora
//!
//! This module provides a comprehensive error type that covers all possible
//! failure scenarios in the application, with automatic HTTP response mapping.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Main application error type
///
/// All errors in the application should be converted to this type.
/// It implements `ResponseError` for automatic HTTP response generation.
#[derive(Error, Debug)]
pub enum AppError {
    // ==================== Database Errors ====================
    #[error("Database error: {0}")]
    Database(String),

    #[error("Database pool error: {0}")]
    Pool(String),

    #[error("Transaction failed: {0}")]
    Transaction(String),

    // ==================== Booking Errors ====================
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Booking conflict: {0}")]
    Conflict(String),

    #[error("Invalid booking transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Booking not found: {0}")]
    BookingNotFound(i64),

    #[error("Vehicle not found: {0}")]
    VehicleNotFound(i64),

    // ==================== Payment Errors ====================
    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    #[error("Payment provider error: {0}")]
    Provider(String),

    #[error("Payment provider timed out after {0}ms")]
    ProviderTimeout(u64),

    // ==================== Access Errors ====================
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    // ==================== Resource Errors ====================
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    // ==================== Internal Errors ====================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation(_) => StatusCode::BAD_REQUEST,

            // 401 Unauthorized
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,

            // 404 Not Found
            // Booking reads denied by the access policy also surface as
            // NotFound so callers cannot probe other customers' bookings.
            AppError::BookingNotFound(_)
            | AppError::VehicleNotFound(_)
            | AppError::PaymentNotFound(_)
            | AppError::NotFound(_) => StatusCode::NOT_FOUND,

            // 409 Conflict
            AppError::Conflict(_)
            | AppError::InvalidTransition { .. }
            | AppError::AlreadyExists(_) => StatusCode::CONFLICT,

            // 502 / 504 provider failures
            AppError::Provider(_) => StatusCode::BAD_GATEWAY,
            AppError::ProviderTimeout(_) => StatusCode::GATEWAY_TIMEOUT,

            // 500 Internal Server Error
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "database_error",
            AppError::Pool(_) => "pool_error",
            AppError::Transaction(_) => "transaction_error",
            AppError::Validation(_) => "validation_error",
            AppError::Conflict(_) => "booking_conflict",
            AppError::InvalidTransition { .. } => "invalid_transition",
            AppError::BookingNotFound(_) => "booking_not_found",
            AppError::VehicleNotFound(_) => "vehicle_not_found",
            AppError::PaymentNotFound(_) => "payment_not_found",
            AppError::Provider(_) => "provider_error",
            AppError::ProviderTimeout(_) => "provider_timeout",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::PermissionDenied(_) => "permission_denied",
            AppError::NotFound(_) => "not_found",
            AppError::AlreadyExists(_) => "already_exists",
            AppError::Internal(_) => "internal_error",
            AppError::Config(_) => "config_error",
            AppError::Serialization(_) => "serialization_error",
        }
    }

    /// Conflict error reported for an overlapping booking.
    ///
    /// Shared by the application pre-check and the translation of the
    /// storage-level exclusion constraint, so callers cannot tell early
    /// from late detection.
    pub fn vehicle_unavailable() -> Self {
        AppError::Conflict("This vehicle is not available for the selected dates".to_string())
    }

    /// Whether a retry of the same request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::ProviderTimeout(_) | AppError::Pool(_) | AppError::Transaction(_)
        )
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        AppError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = json!({
            "error": self.error_code(),
            "message": self.to_string(),
            "status": status.as_u16(),
        });

        HttpResponse::build(status).json(body)
    }
}

// ==================== From implementations ====================

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            AppError::Validation("end before start".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Conflict("vehicle already booked".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::BookingNotFound(42).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::InvalidTransition {
                from: "cancelled".into(),
                to: "confirmed".into()
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::ProviderTimeout(5000).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::Conflict("overlap".into()).error_code(),
            "booking_conflict"
        );
        assert_eq!(
            AppError::PermissionDenied("customers can only cancel".into()).error_code(),
            "permission_denied"
        );
    }

    #[test]
    fn test_transient_classification() {
        assert!(AppError::ProviderTimeout(100).is_transient());
        assert!(!AppError::Provider("card declined".into()).is_transient());
        assert!(!AppError::Conflict("overlap".into()).is_transient());
    }
}
