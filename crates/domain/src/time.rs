//! Time and timestamp helpers.

use chrono::{DateTime, TimeDelta, Utc};

/// UTC timestamp used for relay expiries and poll times.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// The instant `seconds` after `from`.
#[must_use]
pub fn after_seconds(from: Timestamp, seconds: u32) -> Timestamp {
    from + TimeDelta::seconds(i64::from(seconds))
}

/// Whole seconds from `now` until `deadline`, floored, never negative.
#[must_use]
pub fn whole_seconds_until(deadline: Timestamp, now: Timestamp) -> u32 {
    let millis = (deadline - now).num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    u32::try_from(millis / 1000).unwrap_or(u32::MAX)
}
