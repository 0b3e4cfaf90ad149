// ISAPI HTTP client
//
// Opens the alertStream endpoint of a single camera. Authentication is
// negotiated per connection: digest challenge/response first, then one
// retry of the same request with basic credentials.

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use tracing::{debug, warn};
use url::Url;

use crate::auth::{AuthScheme, Credentials, find_digest_challenge};
use crate::error::Error;
use crate::isapi::ALERT_STREAM_PATH;
use crate::isapi::stream::AlertStream;
use crate::transport::TransportConfig;

/// HTTP client for one camera's ISAPI surface.
///
/// Owns its own `reqwest::Client`; nothing is shared between devices.
pub struct IsapiClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
}

impl IsapiClient {
    /// Create a client for the camera at `address` (`host` or `host:port`).
    pub fn new(
        address: &str,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let base_url = Url::parse(&format!("http://{address}"))?;
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    /// Full URL of the alert stream endpoint.
    pub fn alert_stream_url(&self) -> Result<Url, Error> {
        Ok(self.base_url.join(ALERT_STREAM_PATH)?)
    }

    /// Open the alert stream, negotiating authentication.
    ///
    /// Digest is tried first. If it fails for any reason (transport error,
    /// no usable challenge, challenge answer refused) the request is sent
    /// once more with basic credentials. If that also fails the result is
    /// [`Error::Authentication`] carrying both causes.
    pub async fn open_alert_stream(&self) -> Result<AlertStream, Error> {
        let url = self.alert_stream_url()?;

        let (resp, scheme) = match self.get_with_digest(&url).await {
            Ok(ok) => ok,
            Err(digest_err) => {
                warn!(url = %url, error = %digest_err, "digest negotiation failed, falling back to basic auth");
                let resp = self.get_with_basic(&url).await.map_err(|basic_err| {
                    Error::Authentication {
                        message: format!("digest: {digest_err}; basic: {basic_err}"),
                    }
                })?;
                (resp, AuthScheme::Basic)
            }
        };

        debug!(url = %url, %scheme, "alert stream authenticated");
        AlertStream::from_response(resp, scheme)
    }

    /// Unauthenticated probe, then answer the digest challenge.
    async fn get_with_digest(&self, url: &Url) -> Result<(reqwest::Response, AuthScheme), Error> {
        debug!("GET {} (probing for digest challenge)", url);
        let probe = self.http.get(url.clone()).send().await?;

        let status = probe.status();
        if status.is_success() {
            return Ok((probe, AuthScheme::None));
        }
        if status != StatusCode::UNAUTHORIZED {
            return Err(Error::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let challenge = find_digest_challenge(
            probe
                .headers()
                .get_all(WWW_AUTHENTICATE)
                .iter()
                .filter_map(|v| v.to_str().ok()),
        )
        .ok_or_else(|| Error::Digest("no digest challenge offered".into()))?
        .to_owned();

        let authorization = self
            .credentials
            .digest_authorization(&challenge, &request_target(url))?;

        debug!("GET {} (digest)", url);
        let resp = self
            .http
            .get(url.clone())
            .header(AUTHORIZATION, authorization)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            Ok((resp, AuthScheme::Digest))
        } else {
            Err(Error::Authentication {
                message: format!("digest answer refused (HTTP {status})"),
            })
        }
    }

    async fn get_with_basic(&self, url: &Url) -> Result<reqwest::Response, Error> {
        use secrecy::ExposeSecret;

        debug!("GET {} (basic)", url);
        let resp = self
            .http
            .get(url.clone())
            .basic_auth(
                &self.credentials.username,
                Some(self.credentials.password.expose_secret()),
            )
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else {
            Err(Error::Authentication {
                message: format!("basic credentials refused (HTTP {status})"),
            })
        }
    }
}

/// The origin-form request target (`/path?query`) digest hashes over.
fn request_target(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_owned(),
    }
}
