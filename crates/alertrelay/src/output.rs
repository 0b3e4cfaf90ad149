//! Output formatting: table or JSON, plus live status lines.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde. Status lines go to stderr so stdout stays
//! machine-readable.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use alertrelay_core::{TerminationKind, WorkerEvent, WorkerState};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stderr().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(data)?),
        OutputFormat::JsonCompact => Ok(serde_json::to_string(data)?),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

// ── Live status ──────────────────────────────────────────────────────

/// One stderr line for a worker state transition.
pub fn status_line(event: &WorkerEvent, color: bool) -> String {
    let device = format!("{} (#{})", event.label, event.device_id);
    let state = event.state.to_string();

    if !color {
        return format!("{device}: {state}");
    }

    let state = match event.state {
        WorkerState::Streaming => state.green().to_string(),
        WorkerState::Terminated(TerminationKind::StreamEnded | TerminationKind::Cancelled) => {
            state.dimmed().to_string()
        }
        WorkerState::Terminated(_) => state.red().bold().to_string(),
        WorkerState::Idle | WorkerState::Connecting | WorkerState::Authenticated => {
            state.yellow().to_string()
        }
    };
    format!("{}: {state}", device.bold())
}
