//! Booking model
//!
//! The booking is the source of truth for every reservation in the
//! system. It connects the customer, the owning agency, the vehicle and
//! the rental period, and carries the cost snapshot computed at creation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Booking status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Created, awaiting rental-fee payment
    #[default]
    Pending,
    /// Rental fee paid
    Confirmed,
    /// Cancelled by the customer or the agency; interval freed
    Cancelled,
    /// Rental period over (driven by external housekeeping)
    Completed,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStatus::Pending => write!(f, "pending"),
            BookingStatus::Confirmed => write!(f, "confirmed"),
            BookingStatus::Cancelled => write!(f, "cancelled"),
            BookingStatus::Completed => write!(f, "completed"),
        }
    }
}

impl BookingStatus {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "cancelled" => Some(BookingStatus::Cancelled),
            "completed" => Some(BookingStatus::Completed),
            _ => None,
        }
    }

    /// Whether this booking still occupies its time interval.
    ///
    /// Only pending and confirmed bookings participate in the overlap
    /// set; cancelled bookings free their interval permanently.
    pub fn holds_interval(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    /// Check whether a transition to `target` is legal.
    ///
    /// Allowed: pending -> confirmed, pending -> cancelled,
    /// confirmed -> cancelled, confirmed -> completed.
    pub fn can_transition_to(&self, target: BookingStatus) -> bool {
        matches!(
            (self, target),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Completed)
        )
    }
}

/// Booking entity
///
/// `total_cost` is locked at creation time; later changes to the
/// vehicle's daily rate never affect existing bookings. Bookings are
/// never deleted: cancellation is a status change that preserves the
/// audit trail while freeing the interval for rebooking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    /// Unique identifier
    pub id: i64,

    /// Rented vehicle
    pub vehicle_id: i64,

    /// Customer who made the booking
    pub customer_id: i64,

    /// Owning agency of the vehicle, denormalized at booking time
    pub agency_id: i64,

    /// Pickup branch
    pub pickup_location_id: i64,

    /// Dropoff branch
    pub dropoff_location_id: i64,

    /// Start of the rental period (inclusive)
    pub start_time: DateTime<Utc>,

    /// End of the rental period (exclusive)
    pub end_time: DateTime<Utc>,

    /// Total rental cost, computed once at creation
    pub total_cost: Decimal,

    /// Current status
    pub status: BookingStatus,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Half-open interval overlap test against another time range.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_time < end && self.end_time > start
    }
}

/// Parameters for inserting a new booking
///
/// Built by the booking service after validation and cost computation;
/// the status is always pending at insert time.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub vehicle_id: i64,
    pub customer_id: i64,
    pub agency_id: i64,
    pub pickup_location_id: i64,
    pub dropoff_location_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub total_cost: Decimal,
}
