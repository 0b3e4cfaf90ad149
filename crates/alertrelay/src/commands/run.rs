//! `run`: stream every configured camera until all workers finish.

use std::time::Duration;

use serde::Serialize;
use tabled::Tabled;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};

use alertrelay_config as config;
use alertrelay_core::{ForwardErrorPolicy, RelayConfig, Supervisor, WorkerReport};

use crate::cli::{GlobalOpts, RunArgs};
use crate::error::CliError;
use crate::output;

// ── Summary rows ────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ReportView {
    id: u32,
    name: String,
    address: String,
    termination: String,
    connections: u32,
    signals: u64,
    error: Option<String>,
}

impl From<&WorkerReport> for ReportView {
    fn from(r: &WorkerReport) -> Self {
        Self {
            id: r.device.id,
            name: r.device.label().to_owned(),
            address: r.device.address.clone(),
            termination: r.termination.to_string(),
            connections: r.connections,
            signals: r.signals,
            error: r.error.clone(),
        }
    }
}

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "ID")]
    id: u32,
    #[tabled(rename = "Device")]
    name: String,
    #[tabled(rename = "Ended")]
    termination: String,
    #[tabled(rename = "Connections")]
    connections: u32,
    #[tabled(rename = "Signals")]
    signals: u64,
    #[tabled(rename = "Error")]
    error: String,
}

fn row(r: &ReportView) -> ReportRow {
    ReportRow {
        id: r.id,
        name: r.name.clone(),
        termination: r.termination.clone(),
        connections: r.connections,
        signals: r.signals,
        error: r.error.clone().unwrap_or_default(),
    }
}

// ── Overrides ───────────────────────────────────────────────────────

fn apply_overrides(
    relay: &mut RelayConfig,
    args: &RunArgs,
    reconnect_retries: Option<u32>,
) -> Result<(), CliError> {
    if !args.devices.is_empty() {
        relay.devices.retain(|d| args.devices.contains(&d.id));
        if relay.devices.is_empty() {
            return Err(CliError::Validation {
                field: "--device".into(),
                reason: "no configured device has that id".into(),
            });
        }
    }
    if args.reconnect {
        relay.reconnect.max_retries = reconnect_retries;
    }
    if let Some(secs) = args.report_duration {
        relay.report_duration = Duration::from_secs(secs);
    }
    if args.keep_going {
        relay.on_forward_error = ForwardErrorPolicy::Continue;
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: &RunArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = super::load_roster(global)?;
    let mut relay = config::to_relay_config(&cfg)?;
    apply_overrides(&mut relay, args, cfg.reconnect.max_retries)?;

    let supervisor = Supervisor::new(relay)?;
    let cancel = supervisor.cancel_token();

    let status = (!global.quiet).then(|| {
        let mut events = supervisor.subscribe();
        let color = output::should_color(global.color);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => eprintln!("{}", output::status_line(&event, color)),
                    Err(RecvError::Lagged(skipped)) => debug!(skipped, "status lines dropped"),
                    Err(RecvError::Closed) => break,
                }
            }
        })
    });

    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping workers");
            cancel.cancel();
        }
    });

    let reports = supervisor.run().await;
    interrupt.abort();
    if let Some(status) = status {
        let _ = status.await;
    }

    let views: Vec<ReportView> = reports.iter().map(ReportView::from).collect();
    let rendered = output::render_list(global.output, &views, row)?;
    output::print_output(&rendered, global.quiet);

    let failed: Vec<&WorkerReport> = reports.iter().filter(|r| r.is_failure()).collect();
    match failed.first() {
        None => Ok(()),
        Some(first) => Err(CliError::DevicesFailed {
            failed: failed.len(),
            total: reports.len(),
            first: format!(
                "{}: {}",
                first.device,
                first.error.as_deref().unwrap_or("unknown error")
            ),
            kind: first.termination,
        }),
    }
}
