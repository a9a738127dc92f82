//! Access policy
//!
//! Decides which actors may read or mutate a booking. Roles are tagged
//! variants with explicit per-operation tables; object-level checks
//! compare the actor against the booking's participants.
//!
//! Denied reads are reported as `NotFound` so the existence of other
//! customers' bookings never leaks through the API.

use rentora_core::{
    models::{Actor, Booking, Role},
    AppError, AppResult,
};

/// Operations guarded by the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateBooking,
    ViewBooking,
    CancelBooking,
    InitiatePayment,
    ReleaseDeposit,
}

/// Scope of a booking list query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    /// Only bookings made by this customer
    Customer(i64),
    /// All bookings owned by this agency
    Agency(i64),
    /// Every booking (platform operator)
    All,
    /// Nothing visible
    None,
}

/// Stateless access policy
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessPolicy;

impl AccessPolicy {
    /// Role-level permission table.
    ///
    /// Object-level participation is checked separately; this table only
    /// answers "may this role ever perform this operation".
    fn role_allows(role: Role, op: Operation) -> bool {
        match op {
            Operation::CreateBooking => matches!(role, Role::Customer),
            Operation::ViewBooking | Operation::CancelBooking | Operation::InitiatePayment => {
                matches!(
                    role,
                    Role::Customer | Role::AgencyAdmin | Role::AgencyStaff | Role::PlatformAdmin
                )
            }
            Operation::ReleaseDeposit => {
                matches!(role, Role::AgencyAdmin | Role::AgencyStaff | Role::PlatformAdmin)
            }
        }
    }

    /// Whether the actor participates in the booking: the customer who
    /// made it, or a member of the owning agency.
    fn is_participant(actor: &Actor, booking: &Booking) -> bool {
        if actor.is_platform_admin() {
            return true;
        }
        if actor.is_customer() {
            return booking.customer_id == actor.user_id;
        }
        actor.is_member_of(booking.agency_id)
    }

    /// Authorize booking creation (customers only, for themselves)
    pub fn authorize_create(&self, actor: &Actor) -> AppResult<()> {
        if Self::role_allows(actor.role, Operation::CreateBooking) {
            Ok(())
        } else {
            Err(AppError::PermissionDenied(
                "Only customers can create bookings".to_string(),
            ))
        }
    }

    /// Authorize reading a booking; denial is masked as not-found
    pub fn authorize_view(&self, actor: &Actor, booking: &Booking) -> AppResult<()> {
        if Self::role_allows(actor.role, Operation::ViewBooking)
            && Self::is_participant(actor, booking)
        {
            Ok(())
        } else {
            Err(AppError::BookingNotFound(booking.id))
        }
    }

    /// Authorize cancelling a booking; a non-participant gets the same
    /// not-found as for reads
    pub fn authorize_cancel(&self, actor: &Actor, booking: &Booking) -> AppResult<()> {
        if Self::role_allows(actor.role, Operation::CancelBooking)
            && Self::is_participant(actor, booking)
        {
            Ok(())
        } else {
            Err(AppError::BookingNotFound(booking.id))
        }
    }

    /// Authorize releasing a security deposit (agency side only)
    pub fn authorize_release_deposit(&self, actor: &Actor, booking: &Booking) -> AppResult<()> {
        if !Self::is_participant(actor, booking) {
            return Err(AppError::BookingNotFound(booking.id));
        }
        if Self::role_allows(actor.role, Operation::ReleaseDeposit) {
            Ok(())
        } else {
            Err(AppError::PermissionDenied(
                "Only the owning agency can release a security deposit".to_string(),
            ))
        }
    }

    /// Visibility scope for list queries
    pub fn list_scope(&self, actor: &Actor) -> ListScope {
        match actor.role {
            Role::Customer => ListScope::Customer(actor.user_id),
            Role::AgencyAdmin | Role::AgencyStaff => match actor.agency_id {
                Some(agency_id) => ListScope::Agency(agency_id),
                None => ListScope::None,
            },
            Role::PlatformAdmin => ListScope::All,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rentora_core::models::BookingStatus;
    use rust_decimal_macros::dec;

    fn booking(customer_id: i64, agency_id: i64) -> Booking {
        Booking {
            id: 1,
            vehicle_id: 10,
            customer_id,
            agency_id,
            pickup_location_id: 1,
            dropoff_location_id: 1,
            start_time: Utc::now(),
            end_time: Utc::now() + chrono::Duration::days(2),
            total_cost: dec!(100.00),
            status: BookingStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_only_customers_create() {
        let policy = AccessPolicy;
        assert!(policy.authorize_create(&Actor::customer(1)).is_ok());
        assert!(policy
            .authorize_create(&Actor::agency_member(2, Role::AgencyAdmin, 5))
            .is_err());
    }

    #[test]
    fn test_foreign_customer_masked_as_not_found() {
        let policy = AccessPolicy;
        let b = booking(1, 5);

        let err = policy
            .authorize_view(&Actor::customer(2), &b)
            .unwrap_err();
        assert!(matches!(err, AppError::BookingNotFound(1)));

        let err = policy
            .authorize_cancel(&Actor::customer(2), &b)
            .unwrap_err();
        assert!(matches!(err, AppError::BookingNotFound(1)));
    }

    #[test]
    fn test_participants_can_view() {
        let policy = AccessPolicy;
        let b = booking(1, 5);

        assert!(policy.authorize_view(&Actor::customer(1), &b).is_ok());
        assert!(policy
            .authorize_view(&Actor::agency_member(9, Role::AgencyStaff, 5), &b)
            .is_ok());
        assert!(policy
            .authorize_view(
                &Actor {
                    user_id: 99,
                    role: Role::PlatformAdmin,
                    agency_id: None
                },
                &b
            )
            .is_ok());
    }

    #[test]
    fn test_other_agency_masked() {
        let policy = AccessPolicy;
        let b = booking(1, 5);
        assert!(policy
            .authorize_view(&Actor::agency_member(9, Role::AgencyAdmin, 6), &b)
            .is_err());
    }

    #[test]
    fn test_customer_cannot_release_deposit() {
        let policy = AccessPolicy;
        let b = booking(1, 5);
        let err = policy
            .authorize_release_deposit(&Actor::customer(1), &b)
            .unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied(_)));

        assert!(policy
            .authorize_release_deposit(&Actor::agency_member(9, Role::AgencyAdmin, 5), &b)
            .is_ok());
    }

    #[test]
    fn test_list_scopes() {
        let policy = AccessPolicy;
        assert_eq!(
            policy.list_scope(&Actor::customer(3)),
            ListScope::Customer(3)
        );
        assert_eq!(
            policy.list_scope(&Actor::agency_member(4, Role::AgencyStaff, 8)),
            ListScope::Agency(8)
        );
        assert_eq!(
            policy.list_scope(&Actor {
                user_id: 1,
                role: Role::PlatformAdmin,
                agency_id: None
            }),
            ListScope::All
        );
    }
}
