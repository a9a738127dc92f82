//! Acting-user types
//!
//! Authentication lives upstream; the core only sees a verified actor
//! with a tagged role. Roles are explicit variants rather than duck-typed
//! checks so the access policy can be written as per-operation tables.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of the acting user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Books vehicles for themselves
    Customer,
    /// Manages an agency and its bookings
    AgencyAdmin,
    /// Works for an agency, same booking visibility as the admin
    AgencyStaff,
    /// Platform operator, sees everything
    PlatformAdmin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Customer => write!(f, "customer"),
            Role::AgencyAdmin => write!(f, "agency_admin"),
            Role::AgencyStaff => write!(f, "agency_staff"),
            Role::PlatformAdmin => write!(f, "platform_admin"),
        }
    }
}

impl Role {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "customer" => Some(Role::Customer),
            "agency_admin" => Some(Role::AgencyAdmin),
            "agency_staff" => Some(Role::AgencyStaff),
            "platform_admin" => Some(Role::PlatformAdmin),
            _ => None,
        }
    }
}

/// Verified acting user attached to every request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    /// User id from the identity provider
    pub user_id: i64,

    /// Tagged role
    pub role: Role,

    /// Agency membership for agency roles
    pub agency_id: Option<i64>,
}

impl Actor {
    /// Construct a customer actor
    pub fn customer(user_id: i64) -> Self {
        Self {
            user_id,
            role: Role::Customer,
            agency_id: None,
        }
    }

    /// Construct an agency-member actor
    pub fn agency_member(user_id: i64, role: Role, agency_id: i64) -> Self {
        Self {
            user_id,
            role,
            agency_id: Some(agency_id),
        }
    }

    /// Whether this actor is a customer
    pub fn is_customer(&self) -> bool {
        self.role == Role::Customer
    }

    /// Whether this actor belongs to any agency
    pub fn is_agency_member(&self) -> bool {
        matches!(self.role, Role::AgencyAdmin | Role::AgencyStaff)
    }

    /// Whether this actor is a member of the given agency
    pub fn is_member_of(&self, agency_id: i64) -> bool {
        self.is_agency_member() && self.agency_id == Some(agency_id)
    }

    /// Whether this actor operates the platform
    pub fn is_platform_admin(&self) -> bool {
        self.role == Role::PlatformAdmin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip() {
        for r in [
            Role::Customer,
            Role::AgencyAdmin,
            Role::AgencyStaff,
            Role::PlatformAdmin,
        ] {
            assert_eq!(Role::from_str(&r.to_string()), Some(r));
        }
        assert_eq!(Role::from_str("superuser"), None);
    }

    #[test]
    fn test_agency_membership() {
        let staff = Actor::agency_member(5, Role::AgencyStaff, 9);
        assert!(staff.is_member_of(9));
        assert!(!staff.is_member_of(10));

        let customer = Actor::customer(5);
        assert!(!customer.is_member_of(9));
    }
}
