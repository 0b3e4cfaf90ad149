// ── Signal domain type ──

use strum::Display;

/// Reference point a 90 kHz timestamp is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum TimeBase {
    /// Unix epoch.
    Epoch,
}

/// A timestamp in 90 kHz units (milliseconds × 90).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Time90k {
    pub base: TimeBase,
    pub rel_90k: i64,
}

impl Time90k {
    pub fn epoch(rel_90k: i64) -> Self {
        Self {
            base: TimeBase::Epoch,
            rel_90k,
        }
    }
}

/// A state interval on one collector signal, ready to be forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    pub signal_ids: Vec<u32>,
    pub states: Vec<u32>,
    pub start: Time90k,
    pub end: Time90k,
}
