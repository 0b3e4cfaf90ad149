//! CLI error types with miette diagnostics.
//!
//! Maps `ConfigError` and `CoreError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use alertrelay_config::ConfigError;
use alertrelay_core::{CoreError, TerminationKind};

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration file not found")]
    #[diagnostic(
        code(alertrelay::no_config),
        help(
            "Create one with: alertrelay config init\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Config file already exists at {path}")]
    #[diagnostic(
        code(alertrelay::config_exists),
        help("Use --force to overwrite it.")
    )]
    ConfigExists { path: String },

    #[error("No {what} configured for {scope}")]
    #[diagnostic(
        code(alertrelay::no_credentials),
        help(
            "Set `{what}` in the config file, or name an environment\n\
             variable holding it with `{what}_env`."
        )
    )]
    NoCredentials { scope: String, what: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(alertrelay::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(alertrelay::config))]
    Config(Box<ConfigError>),

    // ── Relay outcome ────────────────────────────────────────────────
    #[error("{failed} of {total} device(s) stopped with an error")]
    #[diagnostic(
        code(alertrelay::devices_failed),
        help("First failure: {first}\nRe-run with -v for per-device logs.")
    )]
    DevicesFailed {
        failed: usize,
        total: usize,
        first: String,
        kind: TerminationKind,
    },

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(alertrelay::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render config: {0}")]
    #[diagnostic(code(alertrelay::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoConfig { .. }
            | Self::ConfigExists { .. }
            | Self::Validation { .. }
            | Self::Config(_) => exit_code::USAGE,
            Self::NoCredentials { .. } => exit_code::AUTH,
            Self::DevicesFailed { kind, .. } => match kind {
                TerminationKind::AuthFailure => exit_code::AUTH,
                TerminationKind::BoundaryMissing
                | TerminationKind::StreamReadError
                | TerminationKind::ForwardError => exit_code::CONNECTION,
                TerminationKind::SetupError => exit_code::USAGE,
                TerminationKind::StreamEnded | TerminationKind::Cancelled => exit_code::GENERAL,
            },
            Self::Io(_) | Self::Json(_) | Self::Toml(_) => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { scope, what } => Self::NoCredentials {
                scope,
                what: what.into(),
            },
            ConfigError::AlreadyExists { path } => Self::ConfigExists {
                path: path.display().to_string(),
            },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config(Box::new(other)),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        Self::Validation {
            field: "relay".into(),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_are_usage_errors() {
        let err = CliError::from(ConfigError::Validation {
            field: "devices".into(),
            reason: "empty".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }

    #[test]
    fn missing_secret_is_auth_error() {
        let err = CliError::from(ConfigError::NoCredentials {
            scope: "[collector]".into(),
            what: "token",
        });
        assert_eq!(err.exit_code(), exit_code::AUTH);
        assert_eq!(err.to_string(), "No token configured for [collector]");
    }

    #[test]
    fn device_failures_map_by_kind() {
        let failed = |kind| CliError::DevicesFailed {
            failed: 1,
            total: 2,
            first: "cam".into(),
            kind,
        };
        assert_eq!(failed(TerminationKind::AuthFailure).exit_code(), exit_code::AUTH);
        assert_eq!(
            failed(TerminationKind::StreamReadError).exit_code(),
            exit_code::CONNECTION
        );
    }
}
