use serde::{Deserialize, Serialize};

/// Time base tag the collector expects on every timestamp.
pub const EPOCH_BASE: &str = "epoch";

/// A point in time in 90 kHz units relative to `base`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Time90k {
    pub base: String,
    #[serde(rename = "rel90k")]
    pub rel_90k: i64,
}

impl Time90k {
    pub fn epoch(rel_90k: i64) -> Self {
        Self {
            base: EPOCH_BASE.into(),
            rel_90k,
        }
    }
}

/// Body of `POST /api/signals`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalRequest {
    pub signal_ids: Vec<u32>,
    pub states: Vec<u32>,
    pub start: Time90k,
    pub end: Time90k,
}
