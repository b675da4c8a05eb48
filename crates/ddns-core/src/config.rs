//! Configuration types for the DDNS updater
//!
//! All configuration comes from environment variables. [`UpdaterConfig::from_lookup`]
//! takes the variable source as a closure so the parsing rules can be exercised
//! without touching the process environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `OVH_HOST`, `OVH_USER`, `OVH_PASS` | required |
//! | `MAX_RETRIES_PER_UPDATE` | 1 |
//! | `CHECK_INTERVAL_SECONDS` | 60 |
//! | `MIN_SECONDS_BETWEEN_UPDATES` | 120 (advisory, not enforced) |
//! | `FORCE_UPDATE_HOURS` | 24 |
//! | `RETRY_INTERVAL_SECONDS` | 10 |
//! | `STATE_DIR` | `/data` |
//! | `OVH_ENDPOINT` | `https://dns.eu.ovhapis.com/nic/update` |
//! | `IP_SERVICES` | [`DEFAULT_IP_SERVICES`] |
//! | `DDNS_MODE` | `live` |
//! | `DDNS_LOG_LEVEL` | `info` |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

/// Public "what is my IP" services, tried in rotation
pub const DEFAULT_IP_SERVICES: &[&str] = &[
    "https://api.ipify.org",
    "https://ipv4.icanhazip.com",
    "https://v4.ident.me",
    "https://checkip.amazonaws.com",
    "https://ipinfo.io/ip",
];

/// OVH DynHost update endpoint
pub const DEFAULT_OVH_ENDPOINT: &str = "https://dns.eu.ovhapis.com/nic/update";

/// Directory the per-host state file lives in
pub const DEFAULT_STATE_DIR: &str = "/data";

/// Provider password
///
/// Never printed: `Debug` shows `<REDACTED>` and [`Password::masked`] yields one
/// `*` per character so the operator can still spot an empty or truncated value.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw value, for the provider's basic-auth header only
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Masked form of equal length
    pub fn masked(&self) -> String {
        "*".repeat(self.0.chars().count())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<REDACTED>")
    }
}

/// Whether provider calls actually go out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateMode {
    #[default]
    Live,
    /// Log the request that would be made and answer as the provider would for a no-op
    DryRun,
}

/// Main updater configuration
#[derive(Debug, Clone)]
pub struct UpdaterConfig {
    /// DynHost hostname to keep updated
    pub hostname: String,

    /// Provider login
    pub username: String,

    /// Provider password
    pub password: Password,

    /// Provider update endpoint
    pub endpoint: String,

    /// IP discovery services, in rotation order
    pub ip_services: Vec<String>,

    /// Directory holding `<hostname>.json`
    pub state_dir: PathBuf,

    /// Live or dry-run
    pub mode: UpdateMode,

    /// tracing max level name
    pub log_level: String,

    /// Polling loop settings
    pub engine: EngineConfig,
}

impl UpdaterConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let required = |key: &str| {
            var(key).ok_or_else(|| {
                Error::config(format!("{key} is required. Set it via: export {key}=..."))
            })
        };

        let number = |key: &str, default: u64| -> Result<u64> {
            match var(key) {
                Some(raw) => raw.parse::<u64>().map_err(|_| {
                    Error::config(format!("{key} must be a non-negative integer. Got: {raw}"))
                }),
                None => Ok(default),
            }
        };

        let engine = EngineConfig {
            max_attempts: u32::try_from(number("MAX_RETRIES_PER_UPDATE", 1)?)
                .map_err(|_| Error::config("MAX_RETRIES_PER_UPDATE is too large"))?,
            check_interval_secs: number("CHECK_INTERVAL_SECONDS", 60)?,
            min_seconds_between_updates: number("MIN_SECONDS_BETWEEN_UPDATES", 120)?,
            force_update_hours: number("FORCE_UPDATE_HOURS", 24)?,
            retry_interval_secs: number("RETRY_INTERVAL_SECONDS", 10)?,
            ..EngineConfig::default()
        };

        let mode = match var("DDNS_MODE").map(|m| m.to_lowercase()).as_deref() {
            None | Some("live") => UpdateMode::Live,
            Some("dry-run") => UpdateMode::DryRun,
            Some(other) => {
                return Err(Error::config(format!(
                    "DDNS_MODE '{other}' is not valid. Valid modes: live, dry-run"
                )));
            }
        };

        let ip_services = match var("IP_SERVICES") {
            Some(list) => list
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => DEFAULT_IP_SERVICES.iter().map(|s| s.to_string()).collect(),
        };

        Ok(Self {
            hostname: required("OVH_HOST")?,
            username: required("OVH_USER")?,
            password: Password::new(required("OVH_PASS")?),
            endpoint: var("OVH_ENDPOINT").unwrap_or_else(|| DEFAULT_OVH_ENDPOINT.to_string()),
            ip_services,
            state_dir: var("STATE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR)),
            mode,
            log_level: var("DDNS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            engine,
        })
    }

    /// Path of the persisted state file, derived from the hostname
    pub fn state_file_path(&self) -> PathBuf {
        self.state_dir.join(format!("{}.json", self.hostname))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validate_hostname(&self.hostname)?;

        if self.username.is_empty() {
            return Err(Error::config("OVH_USER cannot be empty"));
        }
        if self.password.is_empty() {
            return Err(Error::config("OVH_PASS cannot be empty"));
        }

        validate_url("OVH_ENDPOINT", &self.endpoint)?;

        if self.ip_services.is_empty() {
            return Err(Error::config("IP_SERVICES must list at least one URL"));
        }
        for service in &self.ip_services {
            validate_url("IP_SERVICES", service)?;
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(Error::config(format!(
                    "DDNS_LOG_LEVEL '{}' is not valid. \
                    Valid levels: trace, debug, info, warn, error",
                    self.log_level
                )));
            }
        }

        self.engine.validate()
    }

    /// Human-readable configuration dump, password masked
    pub fn summary_lines(&self) -> Vec<String> {
        vec![
            "Configuration:".to_string(),
            format!("  OVH_HOST: {}", self.hostname),
            format!("  OVH_USER: {}", self.username),
            format!("  OVH_PASS: {}", self.password.masked()),
            format!("  OVH_ENDPOINT: {}", self.endpoint),
            format!("  CHECK_INTERVAL_SECONDS: {}", self.engine.check_interval_secs),
            format!(
                "  MIN_SECONDS_BETWEEN_UPDATES: {} (advisory, not enforced)",
                self.engine.min_seconds_between_updates
            ),
            format!("  MAX_RETRIES_PER_UPDATE: {}", self.engine.attempts()),
            format!("  RETRY_INTERVAL_SECONDS: {}", self.engine.retry_interval_secs),
            format!("  FORCE_UPDATE_HOURS: {}", self.engine.force_update_hours),
            format!("  STATE_FILE: {}", self.state_file_path().display()),
            format!("  IP_SERVICES: {}", self.ip_services.join(", ")),
            format!(
                "  DDNS_MODE: {}",
                match self.mode {
                    UpdateMode::Live => "live",
                    UpdateMode::DryRun => "dry-run",
                }
            ),
        ]
    }
}

/// Polling loop configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Provider attempts per update (the first try counts, 0 is read as 1)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Seconds between poll cycles
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,

    /// Accepted and reported, but the decision logic does not consult it
    #[serde(default = "default_min_seconds_between_updates")]
    pub min_seconds_between_updates: u64,

    /// Hours after which an unchanged IP is pushed again
    #[serde(default = "default_force_update_hours")]
    pub force_update_hours: u64,

    /// Seconds between provider attempts within one update
    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: u64,

    /// Capacity of the engine event channel
    ///
    /// When full, events are dropped with a warning.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Force-update threshold as a signed duration for timestamp arithmetic
    pub fn force_update_threshold(&self) -> chrono::Duration {
        i64::try_from(self.force_update_hours.saturating_mul(3600))
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }

    /// Provider attempts per update; a configured 0 counts as 1
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }

    /// Validate the engine settings
    pub fn validate(&self) -> Result<()> {
        if self.check_interval_secs == 0 {
            return Err(Error::config("CHECK_INTERVAL_SECONDS must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(Error::config("event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            check_interval_secs: default_check_interval_secs(),
            min_seconds_between_updates: default_min_seconds_between_updates(),
            force_update_hours: default_force_update_hours(),
            retry_interval_secs: default_retry_interval_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_max_attempts() -> u32 {
    1
}

fn default_check_interval_secs() -> u64 {
    60
}

fn default_min_seconds_between_updates() -> u64 {
    120
}

fn default_force_update_hours() -> u64 {
    24
}

fn default_retry_interval_secs() -> u64 {
    10
}

fn default_event_channel_capacity() -> usize {
    256
}

fn validate_url(key: &str, url: &str) -> Result<()> {
    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(Error::config(format!(
            "{key} must use HTTP or HTTPS scheme. Got: {url}"
        )));
    }
    Ok(())
}

/// Basic RFC 1035 hostname check; catches common typos, not every invalid name
fn validate_hostname(domain: &str) -> Result<()> {
    if domain.is_empty() {
        return Err(Error::config("OVH_HOST cannot be empty"));
    }

    if domain.len() > 253 {
        return Err(Error::config(format!(
            "OVH_HOST too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(Error::config(format!("OVH_HOST has empty label: '{domain}'")));
        }

        if label.len() > 63 {
            return Err(Error::config(format!(
                "OVH_HOST label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(Error::config(format!(
                "OVH_HOST label contains invalid characters. Label: '{label}'. \
                Valid: alphanumeric and hyphen only."
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::config(format!(
                "OVH_HOST label cannot start or end with hyphen. Label: '{label}'"
            )));
        }
    }

    Ok(())
}
