//! Booking handlers
//!
//! HTTP handlers for the booking lifecycle. Status changes go through
//! PATCH with a target status; cancellation is the only transition
//! clients may request directly.

use actix_web::{web, HttpResponse};
use rentora_core::{models::BookingStatus, AppError};
use rentora_services::BookingRequest;
use tracing::instrument;
use validator::Validate;

use crate::dto::{ApiResponse, BookingResponse, CreateBookingRequest, UpdateBookingRequest};
use crate::handlers::payment;
use crate::identity::Identity;
use crate::AppBookingService;

/// Create a booking
///
/// POST /api/v1/bookings
#[instrument(skip(service, identity, body))]
pub async fn create_booking(
    service: web::Data<AppBookingService>,
    identity: Identity,
    body: web::Json<CreateBookingRequest>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;

    let request = BookingRequest {
        vehicle_id: body.vehicle_id,
        pickup_location_id: body.pickup_location_id,
        dropoff_location_id: body.dropoff_location_id,
        start_time: body.start_time,
        end_time: body.end_time,
    };

    let booking = service.create_booking(identity.actor(), &request).await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(BookingResponse::from(booking))))
}

/// List bookings visible to the actor
///
/// GET /api/v1/bookings
#[instrument(skip(service, identity))]
pub async fn list_bookings(
    service: web::Data<AppBookingService>,
    identity: Identity,
) -> Result<HttpResponse, AppError> {
    let bookings = service.list_bookings(identity.actor()).await?;
    let responses: Vec<BookingResponse> = bookings.into_iter().map(Into::into).collect();

    Ok(HttpResponse::Ok().json(ApiResponse::success(responses)))
}

/// Fetch a single booking
///
/// GET /api/v1/bookings/{id}
#[instrument(skip(service, identity))]
pub async fn get_booking(
    service: web::Data<AppBookingService>,
    identity: Identity,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let booking = service
        .get_booking(identity.actor(), path.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(BookingResponse::from(booking))))
}

/// Request a booking status change
///
/// PATCH /api/v1/bookings/{id}
#[instrument(skip(service, identity, body))]
pub async fn update_booking(
    service: web::Data<AppBookingService>,
    identity: Identity,
    path: web::Path<i64>,
    body: web::Json<UpdateBookingRequest>,
) -> Result<HttpResponse, AppError> {
    let target = BookingStatus::from_str(&body.status)
        .ok_or_else(|| AppError::Validation(format!("Unknown booking status '{}'", body.status)))?;

    let booking = service
        .request_status_change(identity.actor(), path.into_inner(), target)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(BookingResponse::from(booking))))
}

/// Configure booking routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/bookings")
            .route("", web::post().to(create_booking))
            .route("", web::get().to(list_bookings))
            .route("/{id}", web::get().to(get_booking))
            .route("/{id}", web::patch().to(update_booking))
            .route("/{id}/payments", web::get().to(payment::list_booking_payments))
            .route(
                "/{id}/deposit/release",
                web::post().to(payment::release_security_deposit),
            ),
    );
}
