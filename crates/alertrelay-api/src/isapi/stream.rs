// Multipart alert stream
//
// Splits the never-ending `multipart/mixed` body of an alertStream
// response into parts. Parts are yielded strictly in arrival order and
// each body is buffered in full before it is handed out.

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, trace};

use crate::auth::AuthScheme;
use crate::error::Error;

/// Extract the boundary token from a `Content-Type` value.
///
/// The token is exactly the text after the first `boundary=`, with no
/// unquoting or trimming. An empty token counts as missing.
pub fn extract_boundary(content_type: &str) -> Option<&str> {
    content_type
        .split_once("boundary=")
        .map(|(_, token)| token)
        .filter(|token| !token.is_empty())
}

/// One multipart part, read to completion but not yet decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEventFrame {
    /// Boundary the part was delimited by.
    pub boundary: String,
    /// The part's own `Content-Type` header, if it declared one.
    pub content_type: Option<String>,
    pub payload: Bytes,
}

/// An established alert stream, positioned before its first part.
pub struct AlertStream {
    boundary: String,
    scheme: AuthScheme,
    multipart: multer::Multipart<'static>,
}

impl std::fmt::Debug for AlertStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertStream")
            .field("boundary", &self.boundary)
            .field("scheme", &self.scheme)
            .finish_non_exhaustive()
    }
}

impl AlertStream {
    /// Wrap an authenticated stream response.
    ///
    /// Fails with [`Error::BoundaryMissing`] if the response does not
    /// declare a boundary; no body bytes are read in that case.
    pub fn from_response(resp: reqwest::Response, scheme: AuthScheme) -> Result<Self, Error> {
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();

        let boundary = extract_boundary(&content_type)
            .ok_or_else(|| Error::BoundaryMissing {
                content_type: content_type.clone(),
            })?
            .to_owned();

        debug!(%content_type, %boundary, "alert stream established");

        let multipart = multer::Multipart::new(resp.bytes_stream(), boundary.clone());
        Ok(Self {
            boundary,
            scheme,
            multipart,
        })
    }

    /// The boundary token in use.
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Which authentication scheme the device accepted.
    pub fn scheme(&self) -> AuthScheme {
        self.scheme
    }

    /// Read the next part in full.
    ///
    /// Returns `Ok(None)` once the closing delimiter has been read. Any
    /// connection or framing failure is returned as [`Error::StreamRead`];
    /// the stream is unusable afterwards.
    pub async fn next_frame(&mut self) -> Result<Option<RawEventFrame>, Error> {
        let Some(field) = self.multipart.next_field().await? else {
            return Ok(None);
        };

        let content_type = field.content_type().map(ToString::to_string);
        let payload = field.bytes().await?;
        trace!(len = payload.len(), ?content_type, "part received");

        Ok(Some(RawEventFrame {
            boundary: self.boundary.clone(),
            content_type,
            payload,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_is_text_after_first_marker() {
        assert_eq!(
            extract_boundary("multipart/mixed; boundary=boundary"),
            Some("boundary")
        );
        assert_eq!(
            extract_boundary("multipart/mixed;boundary=MIME_boundary"),
            Some("MIME_boundary")
        );
    }

    #[test]
    fn boundary_keeps_everything_after_first_marker() {
        assert_eq!(
            extract_boundary("multipart/mixed; boundary=a; boundary=b"),
            Some("a; boundary=b")
        );
        assert_eq!(
            extract_boundary(r#"multipart/mixed; boundary="quoted""#),
            Some(r#""quoted""#)
        );
    }

    #[test]
    fn boundary_absent_or_empty() {
        assert_eq!(extract_boundary("application/xml"), None);
        assert_eq!(extract_boundary(""), None);
        assert_eq!(extract_boundary("multipart/mixed; boundary="), None);
    }
}
