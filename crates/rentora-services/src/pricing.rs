//! Rental pricing
//!
//! Pure cost computation: same inputs always produce the same output,
//! with no hidden state. The cost is computed exactly once at booking
//! creation and locked; later rate changes on the vehicle never affect
//! existing bookings.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::constants::{GRACE_PERIOD_MINUTES, MIN_RENTAL_DAYS};

/// Number of rental days charged for a period.
///
/// Whole days are counted first; a remainder over the grace period
/// (60 minutes, inclusive) adds one more day. Anything under a day
/// charges the one-day minimum.
pub fn days_charged(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let duration = end - start;
    let whole_days = duration.num_days();
    let remainder = duration - Duration::days(whole_days);

    if whole_days == 0 {
        MIN_RENTAL_DAYS
    } else if remainder > Duration::minutes(GRACE_PERIOD_MINUTES) {
        whole_days + 1
    } else {
        whole_days
    }
}

/// Total rental cost for a period at a daily rate, rounded to 2 decimal
/// places with decimal arithmetic.
pub fn rental_cost(start: DateTime<Utc>, end: DateTime<Utc>, daily_rate: Decimal) -> Decimal {
    (Decimal::from(days_charged(start, end)) * daily_rate).round_dp(2)
}
