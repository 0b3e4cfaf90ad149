//! Configuration for the alertrelay binary.
//!
//! TOML file layered under `ALERTRELAY_*` environment overrides, secret
//! resolution (env var or plaintext), and translation to
//! `alertrelay_core::RelayConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use alertrelay_core::{
    CollectorConfig, Credentials, Device, ForwardErrorPolicy, ReconnectPolicy, RelayConfig,
};

/// Prefix for environment overrides. Nested keys use `__`,
/// e.g. `ALERTRELAY_COLLECTOR__TOKEN`.
pub const ENV_PREFIX: &str = "ALERTRELAY_";

const REDACTED: &str = "********";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no {what} configured for {scope}")]
    NoCredentials { scope: String, what: &'static str },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("config file already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Credentials for devices that don't carry their own.
    #[serde(default)]
    pub credentials: CredentialsSection,

    #[serde(default)]
    pub collector: CollectorSection,

    #[serde(default)]
    pub relay: RelaySection,

    #[serde(default)]
    pub reconnect: ReconnectSection,

    /// Camera roster.
    #[serde(default)]
    pub devices: Vec<DeviceEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CredentialsSection {
    #[serde(default = "default_username")]
    pub username: String,

    /// Plaintext password. Prefer `password_env`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Environment variable name containing the password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,
}

impl Default for CredentialsSection {
    fn default() -> Self {
        Self {
            username: default_username(),
            password: None,
            password_env: None,
        }
    }
}

fn default_username() -> String {
    "admin".into()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CollectorSection {
    /// Full URL of the signals endpoint.
    #[serde(default = "default_collector_url")]
    pub url: String,

    /// Session token (plaintext). Prefer `token_env`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Environment variable name containing the session token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,

    /// Seconds per POST.
    #[serde(default = "default_collector_timeout")]
    pub timeout: u64,
}

impl Default for CollectorSection {
    fn default() -> Self {
        Self {
            url: default_collector_url(),
            token: None,
            token_env: None,
            timeout: default_collector_timeout(),
        }
    }
}

fn default_collector_url() -> String {
    "http://localhost:8080/api/signals".into()
}
fn default_collector_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelaySection {
    /// Seconds each motion activation is reported to last.
    #[serde(default = "default_report_duration")]
    pub report_duration: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Seconds without stream data before giving up; 0 waits forever.
    #[serde(default)]
    pub read_timeout: u64,

    #[serde(default)]
    pub on_forward_error: ForwardErrorPolicy,
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            report_duration: default_report_duration(),
            connect_timeout: default_connect_timeout(),
            read_timeout: 0,
            on_forward_error: ForwardErrorPolicy::default(),
        }
    }
}

fn default_report_duration() -> u64 {
    10
}
fn default_connect_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReconnectSection {
    /// Re-open a device stream after it ends.
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_initial_delay")]
    pub initial_delay: u64,

    #[serde(default = "default_max_delay")]
    pub max_delay: u64,

    /// Attempts without a healthy connection before giving up.
    /// Unlimited when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
}

impl Default for ReconnectSection {
    fn default() -> Self {
        Self {
            enabled: false,
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            max_retries: None,
        }
    }
}

fn default_initial_delay() -> u64 {
    1
}
fn default_max_delay() -> u64 {
    30
}

/// One camera.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceEntry {
    /// Host or `host:port`.
    pub address: String,

    /// Signal id reported to the collector.
    pub id: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Override `[credentials].username` for this device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,
}

impl DeviceEntry {
    /// Whether this entry overrides the default credentials.
    pub fn has_own_credentials(&self) -> bool {
        self.username.is_some() || self.password.is_some() || self.password_env.is_some()
    }
}

impl Config {
    /// A starter config for `config init`.
    pub fn example() -> Self {
        Self {
            credentials: CredentialsSection {
                password_env: Some("ALERTRELAY_CAMERA_PASSWORD".into()),
                ..CredentialsSection::default()
            },
            collector: CollectorSection {
                token_env: Some("ALERTRELAY_COLLECTOR_TOKEN".into()),
                ..CollectorSection::default()
            },
            devices: vec![DeviceEntry {
                address: "192.168.1.25".into(),
                id: 1,
                name: Some("front door".into()),
                username: None,
                password: None,
                password_env: None,
            }],
            ..Self::default()
        }
    }

    /// Copy with plaintext secrets masked, for display.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mask = |s: Option<&String>| s.map(|_| REDACTED.to_string());

        let mut cfg = self.clone();
        cfg.credentials.password = mask(self.credentials.password.as_ref());
        cfg.collector.token = mask(self.collector.token.as_ref());
        for device in &mut cfg.devices {
            device.password = mask(device.password.as_ref());
        }
        cfg
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "alertrelay", "alertrelay").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("alertrelay");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load config from the default path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path` + environment. A missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Write the starter config to `path`, refusing to clobber unless `force`.
pub fn init_config(path: &Path, force: bool) -> Result<(), ConfigError> {
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists {
            path: path.to_path_buf(),
        });
    }
    save_config(&Config::example(), path)
}

// ── Secret resolution ───────────────────────────────────────────────

/// Resolve a secret: named env var first, then plaintext.
fn resolve_secret(
    plaintext: Option<&String>,
    env_name: Option<&String>,
    scope: &str,
    what: &'static str,
) -> Result<SecretString, ConfigError> {
    if let Some(val) = env_name.and_then(|name| std::env::var(name).ok()) {
        return Ok(SecretString::from(val));
    }
    if let Some(val) = plaintext {
        return Ok(SecretString::from(val.clone()));
    }
    Err(ConfigError::NoCredentials {
        scope: scope.into(),
        what,
    })
}

/// Default device credentials.
pub fn resolve_credentials(section: &CredentialsSection) -> Result<Credentials, ConfigError> {
    let password = resolve_secret(
        section.password.as_ref(),
        section.password_env.as_ref(),
        "[credentials]",
        "password",
    )?;
    Ok(Credentials::new(section.username.clone(), password))
}

/// Collector session token.
pub fn resolve_token(section: &CollectorSection) -> Result<SecretString, ConfigError> {
    resolve_secret(
        section.token.as_ref(),
        section.token_env.as_ref(),
        "[collector]",
        "token",
    )
}

fn resolve_device(entry: &DeviceEntry, defaults: &Credentials) -> Result<Device, ConfigError> {
    let mut device = Device::new(entry.address.clone(), entry.id);
    if let Some(ref name) = entry.name {
        device = device.with_name(name.clone());
    }
    if entry.has_own_credentials() {
        let password = if entry.password.is_some() || entry.password_env.is_some() {
            resolve_secret(
                entry.password.as_ref(),
                entry.password_env.as_ref(),
                &format!("device #{}", entry.id),
                "password",
            )?
        } else {
            defaults.password.clone()
        };
        let username = entry.username.clone().unwrap_or_else(|| defaults.username.clone());
        device = device.with_credentials(Credentials::new(username, password));
    }
    Ok(device)
}

fn seconds(value: u64) -> Duration {
    Duration::from_secs(value)
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a validated `RelayConfig`.
pub fn to_relay_config(cfg: &Config) -> Result<RelayConfig, ConfigError> {
    if cfg.devices.is_empty() {
        return Err(ConfigError::Validation {
            field: "devices".into(),
            reason: "at least one [[devices]] entry is required".into(),
        });
    }

    let url: url::Url = cfg.collector.url.parse().map_err(|_| ConfigError::Validation {
        field: "collector.url".into(),
        reason: format!("invalid URL: {}", cfg.collector.url),
    })?;

    let credentials = resolve_credentials(&cfg.credentials)?;
    let devices = cfg
        .devices
        .iter()
        .map(|entry| resolve_device(entry, &credentials))
        .collect::<Result<Vec<_>, _>>()?;

    let collector = CollectorConfig {
        url,
        token: resolve_token(&cfg.collector)?,
        timeout: seconds(cfg.collector.timeout),
    };

    let mut relay = RelayConfig::new(devices, credentials, collector);
    relay.report_duration = seconds(cfg.relay.report_duration);
    relay.connect_timeout = seconds(cfg.relay.connect_timeout);
    relay.read_timeout = (cfg.relay.read_timeout > 0).then(|| seconds(cfg.relay.read_timeout));
    relay.on_forward_error = cfg.relay.on_forward_error;
    relay.reconnect = ReconnectPolicy {
        initial_delay: seconds(cfg.reconnect.initial_delay),
        max_delay: seconds(cfg.reconnect.max_delay),
        max_retries: if cfg.reconnect.enabled {
            cfg.reconnect.max_retries
        } else {
            Some(0)
        },
    };

    relay.validate().map_err(|e| ConfigError::Validation {
        field: "relay".into(),
        reason: e.to_string(),
    })?;
    Ok(relay)
}
