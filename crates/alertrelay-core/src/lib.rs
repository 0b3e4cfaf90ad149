//! Relay logic between `alertrelay-api` and the `alertrelay` binary.
//!
//! This crate turns raw alert-stream parts into collector signals:
//!
//! - **[`Supervisor`]**: spawns one [`StreamWorker`] per configured
//!   [`Device`], optionally reconnects them with exponential backoff, and
//!   returns a [`WorkerReport`] per device once every worker has finished.
//!
//! - **[`StreamWorker`]**: drives a single camera through
//!   `Connecting → Authenticated → Streaming → Terminated`, decoding each
//!   part, keeping only active `VMD` events, and forwarding them in order
//!   through a [`SignalSink`].
//!
//! - **Encoding** ([`encoder`]): wall-clock instants to 90 kHz units since
//!   the Unix epoch, and the fixed-length interval each activation reports.
//!
//! - **Domain model** ([`model`]): [`MotionEvent`], [`Signal`] and the
//!   device roster, independent of the XML and JSON wire shapes.

pub mod config;
pub mod convert;
pub mod encoder;
pub mod error;
pub mod forward;
pub mod model;
pub mod supervisor;
pub mod worker;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{CollectorConfig, ForwardErrorPolicy, ReconnectPolicy, RelayConfig};
pub use error::CoreError;
pub use forward::{CollectorForwarder, SignalSink};
pub use supervisor::{Supervisor, WorkerReport};
pub use worker::{
    RunSummary, StreamWorker, Termination, TerminationKind, WorkerEvent, WorkerState, signal_for,
};

pub use model::{Device, MotionEvent, Signal, Time90k, TimeBase};

// The binary needs these without a direct alertrelay-api dependency.
pub use alertrelay_api::{AuthScheme, Credentials};
