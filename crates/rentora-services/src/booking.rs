//! Booking lifecycle service
//!
//! Owns the booking state machine and the conflict-safe creation path.
//! Creation is an explicit pipeline: validate -> compute cost -> persist.
//! The persistence step relies on the storage-level exclusion constraint
//! as the source of truth for overlap; the application pre-check only
//! reports the conflict earlier in the common case.

use chrono::{DateTime, Duration, Utc};
use rentora_core::{
    models::{Actor, Booking, BookingStatus, NewBooking, VehicleStatus},
    traits::{BookingRepository, VehicleRepository},
    AppError, AppResult,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::access::{AccessPolicy, ListScope};
use crate::pricing;

/// Bookings returned for the platform-wide list scope
const ADMIN_LIST_LIMIT: i64 = 200;

/// Parameters for a booking creation request
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub vehicle_id: i64,
    pub pickup_location_id: i64,
    pub dropoff_location_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Booking lifecycle service
pub struct BookingService<V: VehicleRepository, B: BookingRepository> {
    vehicles: Arc<V>,
    bookings: Arc<B>,
    policy: AccessPolicy,
    max_advance_days: i64,
}

impl<V: VehicleRepository, B: BookingRepository> BookingService<V, B> {
    /// Create a new booking service
    pub fn new(vehicles: Arc<V>, bookings: Arc<B>, max_advance_days: i64) -> Self {
        Self {
            vehicles,
            bookings,
            policy: AccessPolicy,
            max_advance_days,
        }
    }

    /// Validate the requested rental window against booking policy
    fn validate_window(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<()> {
        if end <= start {
            return Err(AppError::Validation(
                "End time must be after start time".to_string(),
            ));
        }

        let now = Utc::now();
        if start < now {
            return Err(AppError::Validation(
                "Start time cannot be in the past".to_string(),
            ));
        }

        if start > now + Duration::days(self.max_advance_days) {
            return Err(AppError::Validation(format!(
                "Bookings cannot be made more than {} days in advance",
                self.max_advance_days
            )));
        }

        Ok(())
    }

    /// Fetch a booking enforcing read visibility; non-participants see
    /// the same not-found as for an id that does not exist.
    async fn find_visible(&self, actor: &Actor, id: i64) -> AppResult<Booking> {
        let booking = self
            .bookings
            .find_by_id(id)
            .await?
            .ok_or(AppError::BookingNotFound(id))?;

        self.policy.authorize_view(actor, &booking)?;
        Ok(booking)
    }

    /// Create a booking for the acting customer.
    ///
    /// Validates invariants, snapshots the vehicle's owner agency and
    /// daily rate, computes the locked total cost, and inserts. A
    /// concurrent overlapping insert that slips past the pre-check is
    /// rejected by the exclusion constraint and surfaces as the same
    /// `Conflict` error.
    #[instrument(skip(self, actor, request), fields(vehicle_id = request.vehicle_id))]
    pub async fn create_booking(
        &self,
        actor: &Actor,
        request: &BookingRequest,
    ) -> AppResult<Booking> {
        self.policy.authorize_create(actor)?;
        self.validate_window(request.start_time, request.end_time)?;

        let vehicle = self
            .vehicles
            .find_snapshot(request.vehicle_id)
            .await?
            .ok_or(AppError::VehicleNotFound(request.vehicle_id))?;

        if vehicle.status == VehicleStatus::Maintenance {
            return Err(AppError::Validation(
                "Vehicle is currently under maintenance".to_string(),
            ));
        }

        // Friendly early overlap report; the constraint remains the
        // source of truth under concurrency.
        if self
            .bookings
            .has_active_overlap(request.vehicle_id, request.start_time, request.end_time, None)
            .await?
        {
            warn!(
                "Overlap pre-check rejected booking for vehicle {}",
                request.vehicle_id
            );
            return Err(AppError::vehicle_unavailable());
        }

        let total_cost =
            pricing::rental_cost(request.start_time, request.end_time, vehicle.daily_rate);

        let new_booking = NewBooking {
            vehicle_id: vehicle.id,
            customer_id: actor.user_id,
            agency_id: vehicle.owner_agency_id,
            pickup_location_id: request.pickup_location_id,
            dropoff_location_id: request.dropoff_location_id,
            start_time: request.start_time,
            end_time: request.end_time,
            total_cost,
        };

        let booking = self.bookings.insert(&new_booking).await?;

        info!(
            "Created booking {} for customer {} on vehicle {}: {} ({} .. {})",
            booking.id,
            booking.customer_id,
            booking.vehicle_id,
            booking.total_cost,
            booking.start_time,
            booking.end_time
        );

        Ok(booking)
    }

    /// Request a status change on behalf of an external actor.
    ///
    /// Cancellation is the only transition users may request directly;
    /// confirmation belongs to payment reconciliation and completion to
    /// external housekeeping.
    #[instrument(skip(self, actor))]
    pub async fn request_status_change(
        &self,
        actor: &Actor,
        id: i64,
        target: BookingStatus,
    ) -> AppResult<Booking> {
        let booking = self.find_visible(actor, id).await?;

        if target != BookingStatus::Cancelled {
            return Err(if actor.is_customer() {
                AppError::PermissionDenied("Customers can only cancel bookings".to_string())
            } else {
                AppError::PermissionDenied(format!(
                    "Booking status '{}' cannot be set directly",
                    target
                ))
            });
        }

        self.policy.authorize_cancel(actor, &booking)?;

        if !booking.status.can_transition_to(BookingStatus::Cancelled) {
            return Err(AppError::InvalidTransition {
                from: booking.status.to_string(),
                to: BookingStatus::Cancelled.to_string(),
            });
        }

        let cancelled = self
            .bookings
            .update_status(id, BookingStatus::Cancelled)
            .await?;

        info!(
            "Booking {} cancelled by user {} ({})",
            id, actor.user_id, actor.role
        );

        Ok(cancelled)
    }

    /// Cancel a booking (customer or owning-agency action)
    pub async fn cancel_booking(&self, actor: &Actor, id: i64) -> AppResult<Booking> {
        self.request_status_change(actor, id, BookingStatus::Cancelled)
            .await
    }

    /// Confirm a booking after its rental fee settled.
    ///
    /// Called by payment reconciliation only, never by a user action.
    /// Confirming an already confirmed booking is a no-op so duplicate
    /// provider events cause no error.
    #[instrument(skip(self))]
    pub async fn confirm_booking(&self, id: i64) -> AppResult<Booking> {
        let booking = self
            .bookings
            .find_by_id(id)
            .await?
            .ok_or(AppError::BookingNotFound(id))?;

        if booking.status == BookingStatus::Confirmed {
            debug!("Booking {} already confirmed, skipping", id);
            return Ok(booking);
        }

        if !booking.status.can_transition_to(BookingStatus::Confirmed) {
            return Err(AppError::InvalidTransition {
                from: booking.status.to_string(),
                to: BookingStatus::Confirmed.to_string(),
            });
        }

        let confirmed = self
            .bookings
            .update_status(id, BookingStatus::Confirmed)
            .await?;

        info!("Booking {} confirmed", id);

        Ok(confirmed)
    }

    /// Fetch a booking visible to the actor
    pub async fn get_booking(&self, actor: &Actor, id: i64) -> AppResult<Booking> {
        self.find_visible(actor, id).await
    }

    /// List bookings in the actor's visibility scope, most recent
    /// rental first
    #[instrument(skip(self, actor))]
    pub async fn list_bookings(&self, actor: &Actor) -> AppResult<Vec<Booking>> {
        match self.policy.list_scope(actor) {
            ListScope::Customer(customer_id) => self.bookings.list_for_customer(customer_id).await,
            ListScope::Agency(agency_id) => self.bookings.list_for_agency(agency_id).await,
            ListScope::All => self.bookings.list_all(ADMIN_LIST_LIMIT, 0).await,
            ListScope::None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rentora_core::models::{Role, VehicleSnapshot};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Mutex;

    struct MockVehicleRepository {
        snapshot: Mutex<Option<VehicleSnapshot>>,
    }

    impl MockVehicleRepository {
        fn with_vehicle(id: i64, agency_id: i64, rate: Decimal) -> Self {
            Self {
                snapshot: Mutex::new(Some(VehicleSnapshot {
                    id,
                    owner_agency_id: agency_id,
                    daily_rate: rate,
                    status: VehicleStatus::Available,
                })),
            }
        }

        fn set_rate(&self, rate: Decimal) {
            if let Some(s) = self.snapshot.lock().unwrap().as_mut() {
                s.daily_rate = rate;
            }
        }
    }

    #[async_trait]
    impl VehicleRepository for MockVehicleRepository {
        async fn find_snapshot(&self, id: i64) -> AppResult<Option<VehicleSnapshot>> {
            Ok(self
                .snapshot
                .lock()
                .unwrap()
                .clone()
                .filter(|s| s.id == id))
        }
    }

    /// In-memory booking store that enforces the overlap rule on insert,
    /// mirroring the behavior of the database exclusion constraint.
    struct MockBookingRepository {
        bookings: Mutex<Vec<Booking>>,
        next_id: AtomicI64,
    }

    impl MockBookingRepository {
        fn new() -> Self {
            Self {
                bookings: Mutex::new(Vec::new()),
                next_id: AtomicI64::new(1),
            }
        }
    }

    #[async_trait]
    impl BookingRepository for MockBookingRepository {
        async fn find_by_id(&self, id: i64) -> AppResult<Option<Booking>> {
            Ok(self
                .bookings
                .lock()
                .unwrap()
                .iter()
                .find(|b| b.id == id)
                .cloned())
        }

        async fn has_active_overlap(
            &self,
            vehicle_id: i64,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
            exclude_id: Option<i64>,
        ) -> AppResult<bool> {
            Ok(self.bookings.lock().unwrap().iter().any(|b| {
                b.vehicle_id == vehicle_id
                    && b.status.holds_interval()
                    && b.overlaps(start, end)
                    && Some(b.id) != exclude_id
            }))
        }

        async fn insert(&self, new: &NewBooking) -> AppResult<Booking> {
            let mut bookings = self.bookings.lock().unwrap();

            // Simulates the exclusion constraint
            let conflict = bookings.iter().any(|b| {
                b.vehicle_id == new.vehicle_id
                    && b.status.holds_interval()
                    && b.overlaps(new.start_time, new.end_time)
            });
            if conflict {
                return Err(AppError::vehicle_unavailable());
            }

            let now = Utc::now();
            let booking = Booking {
                id: self.next_id.fetch_add(1, Ordering::SeqCst),
                vehicle_id: new.vehicle_id,
                customer_id: new.customer_id,
                agency_id: new.agency_id,
                pickup_location_id: new.pickup_location_id,
                dropoff_location_id: new.dropoff_location_id,
                start_time: new.start_time,
                end_time: new.end_time,
                total_cost: new.total_cost,
                status: BookingStatus::Pending,
                created_at: now,
                updated_at: now,
            };
            bookings.push(booking.clone());
            Ok(booking)
        }

        async fn update_status(&self, id: i64, status: BookingStatus) -> AppResult<Booking> {
            let mut bookings = self.bookings.lock().unwrap();
            let booking = bookings
                .iter_mut()
                .find(|b| b.id == id)
                .ok_or(AppError::BookingNotFound(id))?;
            booking.status = status;
            booking.updated_at = Utc::now();
            Ok(booking.clone())
        }

        async fn list_for_customer(&self, customer_id: i64) -> AppResult<Vec<Booking>> {
            let mut out: Vec<Booking> = self
                .bookings
                .lock()
                .unwrap()
                .iter()
                .filter(|b| b.customer_id == customer_id)
                .cloned()
                .collect();
            out.sort_by(|a, b| b.start_time.cmp(&a.start_time));
            Ok(out)
        }

        async fn list_for_agency(&self, agency_id: i64) -> AppResult<Vec<Booking>> {
            let mut out: Vec<Booking> = self
                .bookings
                .lock()
                .unwrap()
                .iter()
                .filter(|b| b.agency_id == agency_id)
                .cloned()
                .collect();
            out.sort_by(|a, b| b.start_time.cmp(&a.start_time));
            Ok(out)
        }

        async fn list_all(&self, limit: i64, _offset: i64) -> AppResult<Vec<Booking>> {
            let out: Vec<Booking> = self
                .bookings
                .lock()
                .unwrap()
                .iter()
                .take(limit as usize)
                .cloned()
                .collect();
            Ok(out)
        }
    }

    const VEHICLE: i64 = 10;
    const AGENCY: i64 = 30;

    fn service() -> BookingService<MockVehicleRepository, MockBookingRepository> {
        BookingService::new(
            Arc::new(MockVehicleRepository::with_vehicle(
                VEHICLE,
                AGENCY,
                dec!(50.00),
            )),
            Arc::new(MockBookingRepository::new()),
            365,
        )
    }

    fn request(start_days: i64, end_days: i64) -> BookingRequest {
        let now = Utc::now();
        BookingRequest {
            vehicle_id: VEHICLE,
            pickup_location_id: 1,
            dropoff_location_id: 2,
            start_time: now + Duration::days(start_days),
            end_time: now + Duration::days(end_days),
        }
    }

    #[tokio::test]
    async fn test_create_booking_snapshots_cost_and_agency() {
        let svc = service();
        let booking = svc
            .create_booking(&Actor::customer(1), &request(10, 13))
            .await
            .unwrap();

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.agency_id, AGENCY);
        assert_eq!(booking.customer_id, 1);
        assert_eq!(booking.total_cost, dec!(150.00));
    }

    #[tokio::test]
    async fn test_rate_change_never_touches_existing_cost() {
        let vehicles = Arc::new(MockVehicleRepository::with_vehicle(
            VEHICLE,
            AGENCY,
            dec!(50.00),
        ));
        let svc = BookingService::new(vehicles.clone(), Arc::new(MockBookingRepository::new()), 365);

        let actor = Actor::customer(1);
        let booking = svc.create_booking(&actor, &request(10, 12)).await.unwrap();
        assert_eq!(booking.total_cost, dec!(100.00));

        vehicles.set_rate(dec!(999.00));

        let reloaded = svc.get_booking(&actor, booking.id).await.unwrap();
        assert_eq!(reloaded.total_cost, dec!(100.00));
    }

    #[tokio::test]
    async fn test_create_rejects_inverted_window() {
        let svc = service();
        let err = svc
            .create_booking(&Actor::customer(1), &request(13, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_past_start() {
        let svc = service();
        let err = svc
            .create_booking(&Actor::customer(1), &request(-1, 3))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_too_far_in_advance() {
        let svc = service();
        let err = svc
            .create_booking(&Actor::customer(1), &request(400, 403))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_non_customer() {
        let svc = service();
        let err = svc
            .create_booking(
                &Actor::agency_member(9, Role::AgencyAdmin, AGENCY),
                &request(10, 12),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn test_overlapping_create_conflicts_adjacent_succeeds() {
        let svc = service();
        let actor = Actor::customer(1);

        // [10, 15)
        svc.create_booking(&actor, &request(10, 15)).await.unwrap();

        // [12, 14) overlaps
        let err = svc
            .create_booking(&Actor::customer(2), &request(12, 14))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // [15, 18) is adjacent on the half-open boundary
        svc.create_booking(&Actor::customer(2), &request(15, 18))
            .await
            .unwrap();
    }

    /// Booking store standing in for the race where a concurrent insert
    /// lands between the overlap pre-check and this request's insert:
    /// the pre-check sees a clean window, but the storage-level
    /// constraint rejects the row.
    struct RacingBookingRepository;

    #[async_trait]
    impl BookingRepository for RacingBookingRepository {
        async fn find_by_id(&self, _id: i64) -> AppResult<Option<Booking>> {
            Ok(None)
        }

        async fn has_active_overlap(
            &self,
            _vehicle_id: i64,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
            _exclude_id: Option<i64>,
        ) -> AppResult<bool> {
            Ok(false)
        }

        async fn insert(&self, _new: &NewBooking) -> AppResult<Booking> {
            Err(AppError::vehicle_unavailable())
        }

        async fn update_status(&self, id: i64, _status: BookingStatus) -> AppResult<Booking> {
            Err(AppError::BookingNotFound(id))
        }

        async fn list_for_customer(&self, _customer_id: i64) -> AppResult<Vec<Booking>> {
            Ok(Vec::new())
        }

        async fn list_for_agency(&self, _agency_id: i64) -> AppResult<Vec<Booking>> {
            Ok(Vec::new())
        }

        async fn list_all(&self, _limit: i64, _offset: i64) -> AppResult<Vec<Booking>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_late_constraint_conflict_matches_precheck_error() {
        let svc = BookingService::new(
            Arc::new(MockVehicleRepository::with_vehicle(
                VEHICLE,
                AGENCY,
                dec!(50.00),
            )),
            Arc::new(RacingBookingRepository),
            365,
        );

        let err = svc
            .create_booking(&Actor::customer(1), &request(10, 13))
            .await
            .unwrap_err();

        // The losing writer of the race gets the exact same conflict
        // the pre-check produces, so callers cannot tell early from
        // late detection.
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(
            err.to_string(),
            AppError::vehicle_unavailable().to_string()
        );
    }

    #[tokio::test]
    async fn test_cancel_frees_interval_for_rebooking() {
        let svc = service();
        let actor = Actor::customer(1);

        let booking = svc.create_booking(&actor, &request(10, 15)).await.unwrap();
        svc.cancel_booking(&actor, booking.id).await.unwrap();

        // Same window books again immediately
        let rebooked = svc
            .create_booking(&Actor::customer(2), &request(10, 15))
            .await
            .unwrap();
        assert_eq!(rebooked.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn test_foreign_customer_cancel_masked_as_not_found() {
        let svc = service();
        let booking = svc
            .create_booking(&Actor::customer(1), &request(10, 12))
            .await
            .unwrap();

        let err = svc
            .cancel_booking(&Actor::customer(2), booking.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BookingNotFound(_)));

        let err = svc
            .get_booking(&Actor::customer(2), booking.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BookingNotFound(_)));
    }

    #[tokio::test]
    async fn test_customer_cannot_request_other_transitions() {
        let svc = service();
        let actor = Actor::customer(1);
        let booking = svc.create_booking(&actor, &request(10, 12)).await.unwrap();

        let err = svc
            .request_status_change(&actor, booking.id, BookingStatus::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn test_agency_member_can_cancel() {
        let svc = service();
        let booking = svc
            .create_booking(&Actor::customer(1), &request(10, 12))
            .await
            .unwrap();

        let cancelled = svc
            .cancel_booking(&Actor::agency_member(9, Role::AgencyStaff, AGENCY), booking.id)
            .await
            .unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_cancelled_is_invalid_transition() {
        let svc = service();
        let actor = Actor::customer(1);
        let booking = svc.create_booking(&actor, &request(10, 12)).await.unwrap();

        svc.cancel_booking(&actor, booking.id).await.unwrap();
        let err = svc.cancel_booking(&actor, booking.id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_confirm_is_idempotent() {
        let svc = service();
        let booking = svc
            .create_booking(&Actor::customer(1), &request(10, 12))
            .await
            .unwrap();

        let first = svc.confirm_booking(booking.id).await.unwrap();
        assert_eq!(first.status, BookingStatus::Confirmed);

        let second = svc.confirm_booking(booking.id).await.unwrap();
        assert_eq!(second.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_confirm_cancelled_fails() {
        let svc = service();
        let actor = Actor::customer(1);
        let booking = svc.create_booking(&actor, &request(10, 12)).await.unwrap();
        svc.cancel_booking(&actor, booking.id).await.unwrap();

        let err = svc.confirm_booking(booking.id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_list_scoping() {
        let svc = service();
        svc.create_booking(&Actor::customer(1), &request(10, 12))
            .await
            .unwrap();
        svc.create_booking(&Actor::customer(2), &request(20, 22))
            .await
            .unwrap();

        let own = svc.list_bookings(&Actor::customer(1)).await.unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].customer_id, 1);

        let agency = svc
            .list_bookings(&Actor::agency_member(9, Role::AgencyAdmin, AGENCY))
            .await
            .unwrap();
        assert_eq!(agency.len(), 2);

        let other_agency = svc
            .list_bookings(&Actor::agency_member(9, Role::AgencyAdmin, 777))
            .await
            .unwrap();
        assert!(other_agency.is_empty());
    }
}
