// ── API-to-domain type conversions ──
//
// Bridges raw `alertrelay_api` wire types into canonical domain types
// and back. Decoding never judges reportability; that is the worker's call.

use alertrelay_api::collector::models as wire;
use alertrelay_api::{EventNotificationAlert, SignalRequest};

use crate::error::CoreError;
use crate::model::{MotionEvent, Signal, Time90k};

/// Decode one multipart part body into a [`MotionEvent`].
///
/// Fails only when the body is not a well-formed `EventNotificationAlert`
/// document; missing elements decode as `None`.
pub fn decode(payload: &[u8]) -> Result<MotionEvent, CoreError> {
    Ok(EventNotificationAlert::from_xml(payload)?.into())
}

impl From<EventNotificationAlert> for MotionEvent {
    fn from(alert: EventNotificationAlert) -> Self {
        Self {
            device_address: alert.ip_address,
            port: alert.port_no,
            protocol: alert.protocol,
            mac_address: alert.mac_address,
            channel_id: alert.channel_id,
            channel_name: alert.channel_name,
            event_type: alert.event_type,
            event_state: alert.event_state,
            event_description: alert.event_description,
            date_time: alert.date_time,
            active_post_count: alert.active_post_count,
        }
    }
}

impl From<Time90k> for wire::Time90k {
    fn from(time: Time90k) -> Self {
        Self {
            base: time.base.to_string(),
            rel_90k: time.rel_90k,
        }
    }
}

impl From<&Signal> for SignalRequest {
    fn from(signal: &Signal) -> Self {
        Self {
            signal_ids: signal.signal_ids.clone(),
            states: signal.states.clone(),
            start: signal.start.into(),
            end: signal.end.into(),
        }
    }
}
