//! Profile configuration for routerctl.
//!
//! TOML profiles, password resolution (env + keyring + plaintext), and
//! translation to the `routerctl_core::SessionSettings` snapshot a session
//! runs with.

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use routerctl_core::connectivity::DEFAULT_PROBE_TARGET;
use routerctl_core::{NetworkInterfaces, SessionSettings, TcpProbe};

/// Keyring service name; entries are `<profile>/password`.
pub const KEYRING_SERVICE: &str = "routerctl";

/// Environment variable consulted for the password after `password_env`.
pub const PASSWORD_ENV: &str = "ROUTERCTL_PASSWORD";

/// Router API port used when neither profile nor defaults set one.
pub const DEFAULT_PORT: u16 = 8728;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

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
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named router profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up `name`, or the default profile when `name` is `None`.
    pub fn profile<'a>(&'a self, name: Option<&'a str>) -> Result<(&'a str, &'a Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .ok_or_else(|| ConfigError::Validation {
                field: "default_profile".into(),
                reason: "no profile named and no default profile set".into(),
            })?;

        self.profiles
            .get(name)
            .map(|profile| (name, profile))
            .ok_or_else(|| ConfigError::Validation {
                field: "profile".into(),
                reason: format!("profile '{name}' not found"),
            })
    }

    /// Session settings for the named (or default) profile, falling back
    /// to `[defaults]` for the port.
    pub fn settings(&self, name: Option<&str>) -> Result<SessionSettings, ConfigError> {
        let (name, profile) = self.profile(name)?;
        let password = resolve_password(profile, name).ok();
        Ok(settings_from_parts(profile, password.as_ref(), self.defaults.port))
    }

    /// Notification poll interval for `profile`.
    pub fn poll_interval(&self, profile: &Profile) -> Duration {
        Duration::from_millis(profile.poll_interval_ms.unwrap_or(self.defaults.poll_interval_ms))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.defaults.timeout)
    }

    /// Reachability probe against the public resolver, bounded by `timeout`.
    pub fn reachability_probe(&self) -> TcpProbe {
        TcpProbe::new(DEFAULT_PROBE_TARGET, self.timeout())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Network connect timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            port: default_port(),
            poll_interval_ms: default_poll_interval_ms(),
            timeout: default_timeout(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_poll_interval_ms() -> u64 {
    1_000
}
fn default_timeout() -> u64 {
    10
}

/// A named router profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Router IPv4 address (e.g., "192.168.88.1").
    pub router: String,

    /// Override the API port.
    pub port: Option<u16>,

    pub username: Option<String>,

    /// Password (plaintext — prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// PPPoE client interface name.
    pub pppoe_interface: Option<String>,

    /// Ethernet interface carrying the PPPoE session.
    pub ether_interface: Option<String>,

    /// Override the notification poll interval.
    pub poll_interval_ms: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "routerctl", "routerctl").map_or_else(
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
    p.push("routerctl");
    p
}

// ── Config loading ──────────────────────────────────────────────────

fn figment_for(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("ROUTERCTL_").split("__"))
}

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the Config from `path` + environment. A missing file yields the
/// defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = figment_for(path).extract()?;
    debug!(path = %path.display(), profiles = config.profiles.len(), "config loaded");
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    debug!(path = %path.display(), "config saved");
    Ok(())
}

// ── Password resolution ─────────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
}

/// Resolve the router password through the credential chain:
/// `password_env` → `ROUTERCTL_PASSWORD` → keyring → plaintext.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_password_with(
        profile,
        profile_name,
        |name| std::env::var(name).ok(),
        |profile_name| keyring_entry(profile_name).and_then(|e| e.get_password()).ok(),
    )
}

fn resolve_password_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env → env var lookup
    if let Some(pw) = profile.password_env.as_deref().and_then(&env) {
        return Ok(SecretString::from(pw));
    }

    // 2. Shared env var
    if let Some(pw) = env(PASSWORD_ENV) {
        return Ok(SecretString::from(pw));
    }

    // 3. System keyring
    if let Some(pw) = keyring(profile_name) {
        return Ok(SecretString::from(pw));
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store the password for `profile_name` in the system keyring.
pub fn store_password(profile_name: &str, password: &SecretString) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(password.expose_secret())?;
    debug!(profile = profile_name, "password stored in keyring");
    Ok(())
}

// ── Session settings ────────────────────────────────────────────────

/// Build the session settings snapshot for a profile.
///
/// Nothing is validated here: an unparsable router address or a missing
/// password or interface name leaves the field empty, and session
/// validation then reports every such field at once.
pub fn profile_to_settings(profile: &Profile, profile_name: &str) -> SessionSettings {
    let password = resolve_password(profile, profile_name).ok();
    settings_from_parts(profile, password.as_ref(), DEFAULT_PORT)
}

fn settings_from_parts(
    profile: &Profile,
    password: Option<&SecretString>,
    default_port: u16,
) -> SessionSettings {
    SessionSettings {
        username: profile.username.clone().unwrap_or_default(),
        password_cipher: password
            .map(|pw| pw.expose_secret().as_bytes().to_vec())
            .unwrap_or_default(),
        router_address: profile.router.trim().parse::<IpAddr>().ok(),
        router_port: profile.port.unwrap_or(default_port),
        interfaces: NetworkInterfaces::new(
            profile.pppoe_interface.clone().unwrap_or_default(),
            profile.ether_interface.clone().unwrap_or_default(),
        ),
    }
}
