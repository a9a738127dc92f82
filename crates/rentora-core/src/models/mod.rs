//! Domain models for Rentora
//!
//! Contains the booking and payment entities, the read-only vehicle
//! snapshot consumed from the catalog, and the acting-user types used
//! by the access policy.

pub mod actor;
pub mod booking;
pub mod payment;
pub mod vehicle;

pub use actor::{Actor, Role};
pub use booking::{Booking, BookingStatus, NewBooking};
pub use payment::{Payment, PaymentStatus, PaymentType};
pub use vehicle::{VehicleSnapshot, VehicleStatus};
