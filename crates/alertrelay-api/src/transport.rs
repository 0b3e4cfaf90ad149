// Shared transport configuration for building reqwest::Client instances.
//
// The ISAPI and collector clients share timeout and header settings
// through this module. Alert streams are long-lived, so the stream client
// never sets a total request timeout: only the connect and per-read phases
// are bounded.

use std::time::Duration;

use reqwest::header::HeaderMap;

use crate::error::Error;

const USER_AGENT: &str = concat!("alertrelay/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Bound on TCP connect.
    pub connect_timeout: Duration,
    /// Bound on each individual read from the socket. `None` waits forever.
    pub read_timeout: Option<Duration>,
    /// Bound on the whole request/response exchange. Must stay `None` for
    /// the alert stream, whose body never ends on its own.
    pub timeout: Option<Duration>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: None,
            timeout: None,
        }
    }
}

impl TransportConfig {
    /// Config for a long-lived alert stream: connect bound plus optional read bound.
    pub fn streaming(connect_timeout: Duration, read_timeout: Option<Duration>) -> Self {
        Self {
            connect_timeout,
            read_timeout,
            timeout: None,
        }
    }

    /// Config for short request/response exchanges with a total deadline.
    pub fn request(timeout: Duration) -> Self {
        Self {
            connect_timeout: timeout,
            read_timeout: None,
            timeout: Some(timeout),
        }
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        self.build_client_with_headers(HeaderMap::new())
    }

    /// Build a `reqwest::Client` with additional default headers.
    ///
    /// Used by the collector client to inject the session cookie.
    pub fn build_client_with_headers(&self, headers: HeaderMap) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers);

        if let Some(read_timeout) = self.read_timeout {
            builder = builder.read_timeout(read_timeout);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        builder
            .build()
            .map_err(|e| Error::ClientBuild(e.to_string()))
    }
}
