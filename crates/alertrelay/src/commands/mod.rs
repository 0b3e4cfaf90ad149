//! Command handlers and the config plumbing they share.

pub mod config_cmd;
pub mod devices;
pub mod run;

use std::path::PathBuf;

use alertrelay_config::{self as config, Config};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Config file path: `--config` / `ALERTRELAY_CONFIG`, else the platform default.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config::config_path)
}

/// Load the config file plus environment overrides.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(config::load_config_from(&config_path(global))?)
}

/// Load a config that must describe at least one device.
///
/// A missing file with no env-provided roster is reported as
/// [`CliError::NoConfig`] rather than a validation failure.
pub fn load_roster(global: &GlobalOpts) -> Result<Config, CliError> {
    let path = config_path(global);
    let cfg = config::load_config_from(&path)?;
    if cfg.devices.is_empty() && !path.exists() {
        return Err(CliError::NoConfig {
            path: path.display().to_string(),
        });
    }
    Ok(cfg)
}
