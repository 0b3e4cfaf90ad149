// Signal collector HTTP client
//
// Posts one signal per request to the collector's signals endpoint.
// The collector authenticates by session cookie `s`; the token is
// injected as a sensitive default header on the underlying client.

use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use crate::collector::models::SignalRequest;
use crate::error::Error;
use crate::transport::TransportConfig;

/// Name of the collector's session cookie.
pub const SESSION_COOKIE: &str = "s";

/// HTTP client for the downstream signal collector.
pub struct CollectorClient {
    http: reqwest::Client,
    url: Url,
}

impl CollectorClient {
    /// Create a client posting to `url` and authenticating with `token`.
    pub fn new(url: Url, token: &SecretString, transport: &TransportConfig) -> Result<Self, Error> {
        let mut cookie = HeaderValue::from_str(&format!(
            "{SESSION_COOKIE}={}",
            token.expose_secret()
        ))
        .map_err(|e| Error::ClientBuild(format!("invalid collector token: {e}")))?;
        cookie.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, cookie);

        let http = transport.build_client_with_headers(headers)?;
        Ok(Self { http, url })
    }

    /// Send a single signal.
    ///
    /// Only the status line is observed; the response body is discarded.
    pub async fn post_signal(&self, signal: &SignalRequest) -> Result<(), Error> {
        debug!("POST {}", self.url);

        let resp = self.http.post(self.url.clone()).json(signal).send().await?;

        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Error::Rejected {
                status: status.as_u16(),
            })
        }
    }
}
