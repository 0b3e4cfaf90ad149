//! Signal encoding and 90 kHz time conversion.
//!
//! Pure functions: the input instant's UTC offset has already been applied
//! by the time it reaches here, so conversion is epoch milliseconds × 90.

use std::time::Duration;

use chrono::{DateTime, TimeZone};

use crate::model::{Signal, Time90k};

/// 90 kHz ticks per millisecond.
pub const UNITS_PER_MILLI: i64 = 90;

/// State id reported for a motion activation.
pub const MOTION_STATE: u32 = 1;

/// Epoch milliseconds of `time`, scaled to 90 kHz units.
///
/// Sub-millisecond precision is truncated before scaling.
pub fn to_domain_units<Tz: TimeZone>(time: &DateTime<Tz>) -> i64 {
    time.timestamp_millis().saturating_mul(UNITS_PER_MILLI)
}

/// Whole milliseconds of `duration`, scaled to 90 kHz units.
pub fn duration_to_domain_units(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis())
        .unwrap_or(i64::MAX)
        .saturating_mul(UNITS_PER_MILLI)
}

/// Build the signal reporting `event_id` on `device_id` for `duration` from `start`.
pub fn encode<Tz: TimeZone>(
    device_id: u32,
    event_id: u32,
    start: &DateTime<Tz>,
    duration: Duration,
) -> Signal {
    let start = to_domain_units(start);
    let end = start.saturating_add(duration_to_domain_units(duration));
    Signal {
        signal_ids: vec![device_id],
        states: vec![event_id],
        start: Time90k::epoch(start),
        end: Time90k::epoch(end),
    }
}
