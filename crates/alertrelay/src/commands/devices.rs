//! `devices`: list the configured roster without contacting any camera.

use serde::Serialize;
use tabled::Tabled;

use alertrelay_config::{Config, DeviceEntry};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct DeviceView<'a> {
    id: u32,
    name: Option<&'a str>,
    address: &'a str,
    username: &'a str,
    own_credentials: bool,
}

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: u32,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "User")]
    username: String,
}

fn row(d: &DeviceView<'_>) -> DeviceRow {
    DeviceRow {
        id: d.id,
        name: d.name.unwrap_or("-").to_owned(),
        address: d.address.to_owned(),
        username: if d.own_credentials {
            d.username.to_owned()
        } else {
            format!("{} (default)", d.username)
        },
    }
}

fn view<'a>(entry: &'a DeviceEntry, cfg: &'a Config) -> DeviceView<'a> {
    DeviceView {
        id: entry.id,
        name: entry.name.as_deref(),
        address: &entry.address,
        username: entry.username.as_deref().unwrap_or(&cfg.credentials.username),
        own_credentials: entry.has_own_credentials(),
    }
}

pub fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = super::load_roster(global)?;
    let views: Vec<DeviceView<'_>> = cfg.devices.iter().map(|e| view(e, &cfg)).collect();

    let rendered = output::render_list(global.output, &views, row)?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}
