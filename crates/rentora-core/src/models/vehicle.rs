//! Vehicle snapshot
//!
//! The vehicle catalog is owned by a separate service; the booking core
//! only reads an instant snapshot of the fields it needs. The daily rate
//! is treated as an input captured at booking time, not a live
//! dependency.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog availability flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    #[default]
    Available,
    Rented,
    Maintenance,
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleStatus::Available => write!(f, "available"),
            VehicleStatus::Rented => write!(f, "rented"),
            VehicleStatus::Maintenance => write!(f, "maintenance"),
        }
    }
}

impl VehicleStatus {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "available" => Some(VehicleStatus::Available),
            "rented" => Some(VehicleStatus::Rented),
            "maintenance" => Some(VehicleStatus::Maintenance),
            _ => None,
        }
    }
}

/// Read-only view of a catalog vehicle at booking time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    pub id: i64,

    /// Agency that owns the vehicle; denormalized onto the booking
    pub owner_agency_id: i64,

    /// Daily rental rate at this instant
    pub daily_rate: Decimal,

    /// Catalog availability flag
    pub status: VehicleStatus,
}
