//! Payment handlers
//!
//! Payment initiation, the provider webhook, and deposit release.
//! The webhook endpoint carries no user identity; it is reached by the
//! provider and always acknowledges deliveries it cannot apply.

use actix_web::{web, HttpResponse};
use rentora_core::{models::PaymentType, AppError};
use rentora_services::ProviderEvent;
use serde_json::json;
use tracing::{info, instrument};
use validator::Validate;

use crate::dto::{ApiResponse, InitiatePaymentRequest, PaymentInitiationResponse, PaymentResponse};
use crate::identity::Identity;
use crate::AppReconciliationService;

/// Initiate a payment for a booking
///
/// POST /api/v1/payments
#[instrument(skip(service, identity, body))]
pub async fn initiate_payment(
    service: web::Data<AppReconciliationService>,
    identity: Identity,
    body: web::Json<InitiatePaymentRequest>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;

    let payment_type = PaymentType::from_str(&body.payment_type).ok_or_else(|| {
        AppError::Validation(format!("Unknown payment type '{}'", body.payment_type))
    })?;

    let initiation = service
        .initiate_payment(identity.actor(), body.booking_id, payment_type)
        .await?;

    let mut status = if initiation.created {
        HttpResponse::Created()
    } else {
        HttpResponse::Ok()
    };

    Ok(status.json(ApiResponse::success(PaymentInitiationResponse::from(
        initiation,
    ))))
}

/// Provider webhook
///
/// POST /api/v1/payments/webhook
#[instrument(skip(service, event), fields(event_type = ?event.event_type))]
pub async fn provider_webhook(
    service: web::Data<AppReconciliationService>,
    event: web::Json<ProviderEvent>,
) -> Result<HttpResponse, AppError> {
    info!("Provider event received");
    service.handle_event(&event).await?;

    Ok(HttpResponse::Ok().json(json!({ "received": true })))
}

/// List payments of a booking
///
/// GET /api/v1/bookings/{id}/payments
#[instrument(skip(service, identity))]
pub async fn list_booking_payments(
    service: web::Data<AppReconciliationService>,
    identity: Identity,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let payments = service
        .list_payments(identity.actor(), path.into_inner())
        .await?;
    let responses: Vec<PaymentResponse> = payments.into_iter().map(Into::into).collect();

    Ok(HttpResponse::Ok().json(ApiResponse::success(responses)))
}

/// Release the held security deposit of a booking
///
/// POST /api/v1/bookings/{id}/deposit/release
#[instrument(skip(service, identity))]
pub async fn release_security_deposit(
    service: web::Data<AppReconciliationService>,
    identity: Identity,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let released = service
        .release_security_deposit(identity.actor(), path.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        PaymentResponse::from(released),
        "Security deposit released",
    )))
}

/// Configure payment routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payments")
            .route("", web::post().to(initiate_payment))
            .route("/webhook", web::post().to(provider_webhook)),
    );
}
