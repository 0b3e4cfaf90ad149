// ── Device domain type ──

use std::fmt;

use alertrelay_api::Credentials;

/// One configured camera and the signal channel it reports on.
///
/// Immutable for the lifetime of the relay.
#[derive(Debug, Clone)]
pub struct Device {
    /// `host` or `host:port` of the camera's HTTP interface.
    pub address: String,
    /// Collector signal id this camera's motion events are reported as.
    pub id: u32,
    /// Optional display name for logs and listings.
    pub name: Option<String>,
    /// Per-device credentials, overriding the relay-wide defaults.
    pub credentials: Option<Credentials>,
}

impl Device {
    pub fn new(address: impl Into<String>, id: u32) -> Self {
        Self {
            address: address.into(),
            id,
            name: None,
            credentials: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Name if configured, otherwise the address.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.address)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.label(), self.id)
    }
}
