// ── Core error types ──
//
// Domain errors from alertrelay-core. The `From<alertrelay_api::Error>`
// impl translates transport-layer failures into the relay's error
// taxonomy; part-level variants (`Decode`, `Timestamp`) never end a
// worker, connection-level ones do.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Stream response has no multipart boundary (Content-Type {content_type:?})")]
    BoundaryMissing { content_type: String },

    #[error("Cannot connect to device: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Alert stream read failed: {reason}")]
    StreamRead { reason: String },

    // ── Part errors ──────────────────────────────────────────────────
    #[error("Malformed event notification: {message}")]
    Decode { message: String },

    #[error("Unparseable event timestamp {value:?}: {reason}")]
    Timestamp { value: String, reason: String },

    // ── Collector errors ─────────────────────────────────────────────
    #[error("Signal forward failed: {message}")]
    Forward {
        message: String,
        /// HTTP status if the collector answered at all.
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Wrap a collector failure, whatever its transport-level shape.
    pub fn forward(err: alertrelay_api::Error) -> Self {
        let status = if let alertrelay_api::Error::Rejected { status } = err {
            Some(status)
        } else {
            None
        };
        Self::Forward {
            message: err.to_string(),
            status,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<alertrelay_api::Error> for CoreError {
    fn from(err: alertrelay_api::Error) -> Self {
        use alertrelay_api::Error as Api;

        match err {
            Api::Authentication { message } => Self::AuthenticationFailed { message },
            Api::Digest(message) => Self::AuthenticationFailed {
                message: format!("digest: {message}"),
            },
            Api::Transport(ref e) => Self::ConnectionFailed {
                reason: e.to_string(),
            },
            Api::UnexpectedStatus { status } => Self::ConnectionFailed {
                reason: format!("unexpected HTTP status {status}"),
            },
            Api::InvalidUrl(e) => Self::Config {
                message: format!("invalid URL: {e}"),
            },
            Api::ClientBuild(message) => Self::Config { message },
            Api::BoundaryMissing { content_type } => Self::BoundaryMissing { content_type },
            Api::StreamRead(e) => Self::StreamRead {
                reason: e.to_string(),
            },
            Api::Deserialization { message } => Self::Decode { message },
            Api::Rejected { status } => Self::Forward {
                message: format!("collector rejected signal (HTTP {status})"),
                status: Some(status),
            },
        }
    }
}
