// ── Per-device stream worker ──
//
// One worker drives one camera connection through
// Connecting → Authenticated → Streaming → Terminated(reason).
// Parts are handled strictly one at a time: read in full, decode,
// filter, forward, then read the next.

use std::time::Duration;

use strum::Display;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use alertrelay_api::{AuthScheme, IsapiClient, RawEventFrame};

use crate::config::{ForwardErrorPolicy, RelayConfig};
use crate::convert::decode;
use crate::encoder::{MOTION_STATE, encode};
use crate::error::CoreError;
use crate::forward::SignalSink;
use crate::model::{Device, MotionEvent, Signal};

// ── States and outcomes ─────────────────────────────────────────────

/// Why a worker run ended, without the error payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum TerminationKind {
    /// The device closed the multipart body.
    StreamEnded,
    /// Shutdown was requested.
    Cancelled,
    AuthFailure,
    BoundaryMissing,
    StreamReadError,
    ForwardError,
    /// The worker could not be set up (bad address, client build failure).
    SetupError,
}

/// Lifecycle state of a worker, observable while it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum WorkerState {
    Idle,
    Connecting,
    Authenticated,
    Streaming,
    #[strum(to_string = "terminated ({0})")]
    Terminated(TerminationKind),
}

/// How a run ended.
#[derive(Debug)]
pub enum Termination {
    StreamEnded,
    Cancelled,
    Failed(CoreError),
}

impl Termination {
    pub fn kind(&self) -> TerminationKind {
        match self {
            Self::StreamEnded => TerminationKind::StreamEnded,
            Self::Cancelled => TerminationKind::Cancelled,
            Self::Failed(err) => match err {
                CoreError::AuthenticationFailed { .. } | CoreError::ConnectionFailed { .. } => {
                    TerminationKind::AuthFailure
                }
                CoreError::BoundaryMissing { .. } => TerminationKind::BoundaryMissing,
                CoreError::StreamRead { .. } => TerminationKind::StreamReadError,
                CoreError::Forward { .. } => TerminationKind::ForwardError,
                CoreError::Config { .. } | CoreError::Decode { .. } | CoreError::Timestamp { .. } => {
                    TerminationKind::SetupError
                }
            },
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn error(&self) -> Option<&CoreError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Outcome of one [`StreamWorker::run`].
#[derive(Debug)]
pub struct RunSummary {
    pub termination: Termination,
    /// Scheme the device accepted, if the stream was established.
    pub scheme: Option<AuthScheme>,
    /// Parts read from the stream.
    pub parts: u64,
    /// Signals successfully forwarded.
    pub signals: u64,
}

/// A state transition, as broadcast to supervisor subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerEvent {
    pub device_id: u32,
    pub label: String,
    pub state: WorkerState,
}

// ── Filtering ───────────────────────────────────────────────────────

/// The signal a decoded event should produce, if any.
///
/// Only active motion detections with a parseable timestamp qualify;
/// everything else is dropped without error.
pub fn signal_for(device_id: u32, event: &MotionEvent, duration: Duration) -> Option<Signal> {
    if !event.is_motion_activation() {
        return None;
    }
    match event.timestamp() {
        Ok(start) => Some(encode(device_id, MOTION_STATE, &start, duration)),
        Err(err) => {
            debug!(error = %err, "dropping motion event");
            None
        }
    }
}

// ── StreamWorker ────────────────────────────────────────────────────

/// Streams one device's alerts into a [`SignalSink`].
pub struct StreamWorker<S> {
    device: Device,
    client: IsapiClient,
    sink: S,
    report_duration: Duration,
    on_forward_error: ForwardErrorPolicy,
    state: watch::Sender<WorkerState>,
    events: Option<broadcast::Sender<WorkerEvent>>,
    cancel: CancellationToken,
}

#[derive(Default)]
struct Progress {
    scheme: Option<AuthScheme>,
    parts: u64,
    signals: u64,
}

impl<S: SignalSink> StreamWorker<S> {
    /// Build a worker for `device` with its own HTTP client.
    pub fn new(
        device: Device,
        config: &RelayConfig,
        sink: S,
        cancel: CancellationToken,
    ) -> Result<Self, CoreError> {
        let client = IsapiClient::new(
            &device.address,
            config.credentials_for(&device).clone(),
            &config.stream_transport(),
        )?;
        let (state, _) = watch::channel(WorkerState::Idle);

        Ok(Self {
            device,
            client,
            sink,
            report_duration: config.report_duration,
            on_forward_error: config.on_forward_error,
            state,
            events: None,
            cancel,
        })
    }

    /// Also publish state transitions on `events`.
    pub fn with_events(mut self, events: broadcast::Sender<WorkerEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Watch the worker's lifecycle state.
    pub fn state(&self) -> watch::Receiver<WorkerState> {
        self.state.subscribe()
    }

    /// Stream until the device closes the body, a connection-level error
    /// occurs, a forward fails under [`ForwardErrorPolicy::Terminate`], or
    /// the worker is cancelled.
    pub async fn run(&self) -> RunSummary {
        let mut progress = Progress::default();

        let termination = tokio::select! {
            biased;
            () = self.cancel.cancelled() => Termination::Cancelled,
            termination = self.stream(&mut progress) => termination,
        };

        match termination.error() {
            Some(err) => warn!(
                device = %self.device,
                reason = %termination.kind(),
                error = %err,
                parts = progress.parts,
                signals = progress.signals,
                "alert stream terminated"
            ),
            None => info!(
                device = %self.device,
                reason = %termination.kind(),
                parts = progress.parts,
                signals = progress.signals,
                "alert stream terminated"
            ),
        }
        self.set_state(WorkerState::Terminated(termination.kind()));

        RunSummary {
            termination,
            scheme: progress.scheme,
            parts: progress.parts,
            signals: progress.signals,
        }
    }

    async fn stream(&self, progress: &mut Progress) -> Termination {
        self.set_state(WorkerState::Connecting);
        info!(device = %self.device, address = %self.device.address, "connecting to alert stream");

        let mut alerts = match self.client.open_alert_stream().await {
            Ok(alerts) => alerts,
            Err(err) => return Termination::Failed(err.into()),
        };
        progress.scheme = Some(alerts.scheme());
        self.set_state(WorkerState::Authenticated);
        info!(device = %self.device, scheme = %alerts.scheme(), boundary = alerts.boundary(), "authenticated");

        self.set_state(WorkerState::Streaming);
        loop {
            let frame = match alerts.next_frame().await {
                Ok(Some(frame)) => frame,
                Ok(None) => return Termination::StreamEnded,
                Err(err) => return Termination::Failed(err.into()),
            };
            progress.parts += 1;

            match self.handle_frame(&frame).await {
                Ok(true) => progress.signals += 1,
                Ok(false) => {}
                Err(err) => match self.on_forward_error {
                    ForwardErrorPolicy::Terminate => return Termination::Failed(err),
                    ForwardErrorPolicy::Continue => {
                        warn!(device = %self.device, error = %err, "signal lost, continuing");
                    }
                },
            }
        }
    }

    /// Decode, filter and forward one part. `Ok(true)` if a signal was sent.
    async fn handle_frame(&self, frame: &RawEventFrame) -> Result<bool, CoreError> {
        let event = match decode(&frame.payload) {
            Ok(event) => event,
            Err(err) => {
                warn!(device = %self.device, error = %err, "discarding malformed part");
                return Ok(false);
            }
        };
        trace!(device = %self.device, %event, "event decoded");

        let Some(signal) = signal_for(self.device.id, &event, self.report_duration) else {
            return Ok(false);
        };

        info!(device = %self.device, %event, "motion detected");
        self.sink.forward(&signal).await?;
        Ok(true)
    }

    fn set_state(&self, state: WorkerState) {
        self.state.send_replace(state);
        if let Some(ref events) = self.events {
            // No subscribers is fine.
            let _ = events.send(WorkerEvent {
                device_id: self.device.id,
                label: self.device.label().to_owned(),
                state,
            });
        }
    }
}
