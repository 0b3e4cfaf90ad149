// ── Motion event domain type ──

use std::fmt;

use chrono::{DateTime, FixedOffset};

use crate::error::CoreError;

/// `eventType` of video motion detection.
pub const MOTION_EVENT_TYPE: &str = "VMD";

/// `eventState` of an event that has just started.
pub const ACTIVE_STATE: &str = "active";

/// `dateTime` layout: optional fractional seconds, numeric UTC offset.
///
/// `%:z` alone would also take `+0800`; [`MotionEvent::timestamp`] insists
/// on the colon form. `Z` is rejected.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%:z";

/// A decoded event notification.
///
/// Every field mirrors one child element of the notification and is `None`
/// when the camera omitted it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MotionEvent {
    pub device_address: Option<String>,
    pub port: Option<u16>,
    pub protocol: Option<String>,
    pub mac_address: Option<String>,
    pub channel_id: Option<String>,
    pub channel_name: Option<String>,
    pub event_type: Option<String>,
    pub event_state: Option<String>,
    pub event_description: Option<String>,
    /// Raw `dateTime`; see [`timestamp`](Self::timestamp).
    pub date_time: Option<String>,
    pub active_post_count: Option<u32>,
}

impl MotionEvent {
    /// `true` for a motion detection that just became active.
    pub fn is_motion_activation(&self) -> bool {
        self.event_type.as_deref() == Some(MOTION_EVENT_TYPE)
            && self.event_state.as_deref() == Some(ACTIVE_STATE)
    }

    /// Parse `dateTime` against [`TIMESTAMP_FORMAT`].
    pub fn timestamp(&self) -> Result<DateTime<FixedOffset>, CoreError> {
        let value = self.date_time.as_deref().unwrap_or_default();
        let invalid = |reason: String| CoreError::Timestamp {
            value: value.to_owned(),
            reason,
        };

        if !has_colon_offset(value) {
            return Err(invalid("UTC offset must be written as +hh:mm".into()));
        }
        DateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|e| invalid(e.to_string()))
    }
}

fn has_colon_offset(value: &str) -> bool {
    let tail = value
        .len()
        .checked_sub(6)
        .and_then(|start| value.as_bytes().get(start..));
    match tail {
        Some([sign, h1, h2, b':', m1, m2]) => {
            matches!(sign, b'+' | b'-') && [h1, h2, m1, m2].iter().all(|b| b.is_ascii_digit())
        }
        _ => false,
    }
}

impl fmt::Display for MotionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Event(type={}, state={}, time={}, count={} on channel {})",
            self.event_type.as_deref().unwrap_or("-"),
            self.event_state.as_deref().unwrap_or("-"),
            self.date_time.as_deref().unwrap_or("-"),
            self.active_post_count.unwrap_or_default(),
            self.channel_name
                .as_deref()
                .or(self.channel_id.as_deref())
                .unwrap_or("-"),
        )
    }
}
