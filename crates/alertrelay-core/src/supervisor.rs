// ── Relay supervisor ──
//
// Spawns one independent worker task per configured device and waits
// for all of them. A device that fails never affects the others.
// Optional reconnection wraps each worker in an exponential backoff loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::{ReconnectPolicy, RelayConfig};
use crate::error::CoreError;
use crate::forward::CollectorForwarder;
use crate::model::Device;
use crate::worker::{StreamWorker, Termination, TerminationKind, WorkerEvent};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Final outcome for one device.
#[derive(Debug, Clone)]
pub struct WorkerReport {
    pub device: Device,
    /// How the last connection ended.
    pub termination: TerminationKind,
    /// Number of times the alert stream was opened (or attempted).
    pub connections: u32,
    /// Signals forwarded across all connections.
    pub signals: u64,
    pub error: Option<String>,
}

impl WorkerReport {
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Owns the device roster and the shared shutdown token.
pub struct Supervisor {
    config: Arc<RelayConfig>,
    cancel: CancellationToken,
    event_tx: broadcast::Sender<WorkerEvent>,
}

impl Supervisor {
    /// Validate `config` and prepare a supervisor for it.
    pub fn new(config: RelayConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            config: Arc::new(config),
            cancel: CancellationToken::new(),
            event_tx,
        })
    }

    /// Token that stops every worker when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Subscribe to worker state transitions.
    pub fn subscribe(&self) -> broadcast::Receiver<WorkerEvent> {
        self.event_tx.subscribe()
    }

    /// Run every device to completion and return one report per device,
    /// in roster order.
    pub async fn run(self) -> Vec<WorkerReport> {
        info!(devices = self.config.devices.len(), "starting relay");

        let mut tasks = JoinSet::new();
        for (index, device) in self.config.devices.iter().cloned().enumerate() {
            let config = Arc::clone(&self.config);
            let cancel = self.cancel.clone();
            let events = self.event_tx.clone();
            tasks.spawn(async move { (index, run_device(device, &config, cancel, events).await) });
        }

        let mut reports = Vec::with_capacity(self.config.devices.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(e) => error!(error = %e, "device task aborted"),
            }
        }
        reports.sort_by_key(|(index, _)| *index);

        info!("all device workers finished");
        reports.into_iter().map(|(_, report)| report).collect()
    }
}

// ── Device task ──────────────────────────────────────────────────────

async fn run_device(
    device: Device,
    config: &RelayConfig,
    cancel: CancellationToken,
    events: broadcast::Sender<WorkerEvent>,
) -> WorkerReport {
    let mut report = WorkerReport {
        device: device.clone(),
        termination: TerminationKind::SetupError,
        connections: 0,
        signals: 0,
        error: None,
    };

    let worker = match CollectorForwarder::new(config)
        .and_then(|sink| StreamWorker::new(device, config, sink, cancel.clone()))
    {
        Ok(worker) => worker.with_events(events),
        Err(e) => {
            error!(device = %report.device, error = %e, "cannot start worker");
            report.error = Some(e.to_string());
            return report;
        }
    };

    let mut attempt: u32 = 0;
    loop {
        report.connections += 1;
        let summary = worker.run().await;
        report.signals += summary.signals;
        report.termination = summary.termination.kind();
        report.error = summary.termination.error().map(ToString::to_string);

        if matches!(summary.termination, Termination::Cancelled) {
            break;
        }
        // A connection that delivered parts counts as healthy.
        if summary.parts > 0 {
            attempt = 0;
        }
        if retries_exhausted(attempt, &config.reconnect) {
            break;
        }

        let delay = calculate_backoff(attempt, &config.reconnect);
        attempt += 1;
        warn!(
            device = %report.device,
            attempt,
            delay_ms = delay.as_millis(),
            "reconnecting alert stream"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                report.termination = TerminationKind::Cancelled;
                report.error = None;
                break;
            }
            () = tokio::time::sleep(delay) => {}
        }
    }

    report
}

fn retries_exhausted(attempt: u32, policy: &ReconnectPolicy) -> bool {
    policy.max_retries.is_some_and(|max| attempt >= max)
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) * (1 ± 0.25)`
fn calculate_backoff(attempt: u32, policy: &ReconnectPolicy) -> Duration {
    let capped = policy
        .initial_delay
        .saturating_mul(2_u32.saturating_pow(attempt))
        .min(policy.max_delay);

    // Deterministic jitter seeded from the attempt number.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    capped.mul_f64(jitter_factor)
}
