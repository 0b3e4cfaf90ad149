use thiserror::Error;

/// Top-level error type for the `alertrelay-api` crate.
///
/// Covers every failure mode of both API surfaces: the camera's ISAPI
/// alert stream and the downstream signal collector.
/// `alertrelay-core` maps these into domain-level errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The device rejected every authentication scheme we tried.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The `WWW-Authenticate` digest challenge could not be parsed or answered.
    #[error("Digest negotiation failed: {0}")]
    Digest(String),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// A non-success status where the protocol expected success.
    #[error("Unexpected HTTP status {status}")]
    UnexpectedStatus { status: u16 },

    // ── Alert stream ────────────────────────────────────────────────
    /// The stream response did not declare a multipart boundary.
    #[error("No multipart boundary in Content-Type {content_type:?}")]
    BoundaryMissing { content_type: String },

    /// Reading the multipart body (or one of its parts) failed.
    #[error("Alert stream read failed: {0}")]
    StreamRead(#[from] multer::Error),

    // ── Data ────────────────────────────────────────────────────────
    /// A part body was not a well-formed `EventNotificationAlert` document.
    #[error("Malformed event notification: {message}")]
    Deserialization { message: String },

    // ── Collector ───────────────────────────────────────────────────
    /// The collector answered a signal POST with a non-2xx status.
    #[error("Collector rejected signal (HTTP {status})")]
    Rejected { status: u16 },
}

impl From<quick_xml::DeError> for Error {
    fn from(err: quick_xml::DeError) -> Self {
        Self::Deserialization {
            message: err.to_string(),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Self::Deserialization {
            message: err.to_string(),
        }
    }
}
