// ── Runtime relay configuration ──
//
// These types describe *what* to relay and *how* to connect.
// They carry credential data and connection tuning, but never touch disk.
// The binary builds a `RelayConfig` (via alertrelay-config) and hands it in.

use std::collections::HashSet;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::Display;
use url::Url;

use alertrelay_api::{Credentials, TransportConfig};

use crate::error::CoreError;
use crate::model::Device;

/// Length of the interval reported for each motion activation.
pub const DEFAULT_REPORT_DURATION: Duration = Duration::from_secs(10);

/// What a worker does when a signal cannot be delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ForwardErrorPolicy {
    /// End the device's run.
    #[default]
    Terminate,
    /// Log the failure and keep reading the stream.
    Continue,
}

/// Exponential backoff for re-opening a device stream after it ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay before the first reconnection attempt.
    pub initial_delay: Duration,
    /// Upper bound on backoff delay.
    pub max_delay: Duration,
    /// Reconnection attempts before giving up. `Some(0)` never reconnects;
    /// `None` retries forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: Some(0),
        }
    }
}

/// Downstream collector endpoint.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Full URL of the signals endpoint.
    pub url: Url,
    /// Session token, sent as cookie `s`.
    pub token: SecretString,
    /// Deadline for each POST.
    pub timeout: Duration,
}

/// Everything a relay run needs.
///
/// Built by the binary, passed to the `Supervisor` -- core never reads config files.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub devices: Vec<Device>,
    /// Credentials for devices without their own.
    pub credentials: Credentials,
    pub collector: CollectorConfig,
    pub report_duration: Duration,
    pub connect_timeout: Duration,
    /// Per-read bound on the alert stream. `None` waits forever.
    pub read_timeout: Option<Duration>,
    pub on_forward_error: ForwardErrorPolicy,
    pub reconnect: ReconnectPolicy,
}

impl RelayConfig {
    /// A config with default tuning for the given roster.
    pub fn new(devices: Vec<Device>, credentials: Credentials, collector: CollectorConfig) -> Self {
        Self {
            devices,
            credentials,
            collector,
            report_duration: DEFAULT_REPORT_DURATION,
            connect_timeout: Duration::from_secs(10),
            read_timeout: None,
            on_forward_error: ForwardErrorPolicy::default(),
            reconnect: ReconnectPolicy::default(),
        }
    }

    /// Credentials to present to `device`.
    pub fn credentials_for<'a>(&'a self, device: &'a Device) -> &'a Credentials {
        device.credentials.as_ref().unwrap_or(&self.credentials)
    }

    /// Transport settings for a device alert stream.
    pub fn stream_transport(&self) -> TransportConfig {
        TransportConfig::streaming(self.connect_timeout, self.read_timeout)
    }

    /// Transport settings for collector POSTs.
    pub fn collector_transport(&self) -> TransportConfig {
        TransportConfig::request(self.collector.timeout)
    }

    /// Reject rosters that cannot be relayed unambiguously.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.devices.is_empty() {
            return Err(CoreError::Config {
                message: "no devices configured".into(),
            });
        }

        let mut ids = HashSet::new();
        let mut addresses = HashSet::new();
        for device in &self.devices {
            if device.address.trim().is_empty() {
                return Err(CoreError::Config {
                    message: format!("device #{} has an empty address", device.id),
                });
            }
            if !ids.insert(device.id) {
                return Err(CoreError::Config {
                    message: format!("device id {} is used more than once", device.id),
                });
            }
            if !addresses.insert(device.address.as_str()) {
                return Err(CoreError::Config {
                    message: format!("device address {} is listed more than once", device.address),
                });
            }
        }

        if self.report_duration.is_zero() {
            return Err(CoreError::Config {
                message: "report duration must be greater than zero".into(),
            });
        }
        if self.reconnect.initial_delay > self.reconnect.max_delay {
            return Err(CoreError::Config {
                message: "reconnect initial delay exceeds max delay".into(),
            });
        }

        Ok(())
    }
}
