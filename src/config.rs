//! Client configuration.
//!
//! A `key = value` file (blank lines and `#` comments ignored), optionally
//! overridden per option by `FLEET_CERTS_<KEY>` environment variables.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{FleetError, Result};

// Default timing constants (seconds)
const API_TIMEOUT:       u64 = 120;
const POLL_INTERVAL:     u64 = 10;
const OPERATION_TIMEOUT: u64 = 3600;

const ENV_PREFIX: &str = "FLEET_CERTS_";

/// Full client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // ── Control plane ─────────────────────────────────────────────────────────
    /// Base URL (`https://sddc.example.com`) or bare hostname.
    pub host:     String,
    pub username: String,
    pub password: String,
    // ── TLS ───────────────────────────────────────────────────────────────────
    /// PEM bundle of CAs trusted for the control plane.
    pub ca_file:              Option<PathBuf>,
    /// Accept any server certificate (self-signed appliances).
    pub allow_unverified_tls: bool,
    // ── Timing (seconds) ──────────────────────────────────────────────────────
    pub api_timeout:       u64,
    pub poll_interval:     u64,
    pub operation_timeout: u64,
    // ── Logging ───────────────────────────────────────────────────────────────
    pub log_syslog: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host:                 String::new(),
            username:             String::new(),
            password:             String::new(),
            ca_file:              None,
            allow_unverified_tls: false,
            api_timeout:          API_TIMEOUT,
            poll_interval:        POLL_INTERVAL,
            operation_timeout:    OPERATION_TIMEOUT,
            log_syslog:           false,
        }
    }
}

impl ClientConfig {
    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout)
    }

    /// Apply one option. Unknown keys are ignored; unparsable numbers keep
    /// the built-in default.
    fn set(&mut self, key: &str, val: String) {
        match key {
            "host"                 => self.host                 = val,
            "username"             => self.username             = val,
            "password"             => self.password             = val,
            "ca_file"              => self.ca_file              = Some(PathBuf::from(&val)),
            "allow_unverified_tls" => self.allow_unverified_tls = truthy(&val),
            "api_timeout"          => self.api_timeout          = val.parse().unwrap_or(API_TIMEOUT),
            "poll_interval"        => self.poll_interval        = val.parse().unwrap_or(POLL_INTERVAL),
            "operation_timeout"    => self.operation_timeout    = val.parse().unwrap_or(OPERATION_TIMEOUT),
            "log_syslog"           => self.log_syslog           = truthy(&val),
            _ => {}
        }
    }
}

const KEYS: &[&str] = &[
    "host",
    "username",
    "password",
    "ca_file",
    "allow_unverified_tls",
    "api_timeout",
    "poll_interval",
    "operation_timeout",
    "log_syslog",
];

fn truthy(val: &str) -> bool {
    matches!(val, "true" | "1" | "yes")
}

/// Parse configuration text.
pub fn parse_config(content: &str) -> ClientConfig {
    let mut cfg = ClientConfig::default();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.splitn(2, '=');
        let key = match parts.next() {
            Some(k) => k.trim().to_ascii_lowercase(),
            None => continue,
        };
        let val = match parts.next() {
            Some(v) => v.trim().to_string(),
            None => continue,
        };
        if val.is_empty() {
            continue;
        }
        cfg.set(&key, val);
    }

    cfg
}

/// Parse `path` as a `fleet-certs.conf` key=value configuration file.
pub fn load_config(path: &Path) -> Result<ClientConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| FleetError::Config(format!("cannot read {}: {e}", path.display())))?;
    Ok(parse_config(&content))
}

/// Override options from the environment (`FLEET_CERTS_HOST`, ...).
///
/// `lookup` is `std::env::var` in production; empty values are ignored.
pub fn apply_env<F>(cfg: &mut ClientConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    for key in KEYS {
        let var = format!("{ENV_PREFIX}{}", key.to_ascii_uppercase());
        if let Some(v) = lookup(&var).filter(|v| !v.trim().is_empty()) {
            cfg.set(key, v.trim().to_string());
        }
    }
}

/// Validate that required fields are populated.
pub fn validate_config(cfg: &ClientConfig) -> Result<()> {
    if cfg.host.is_empty() {
        return Err(FleetError::Config("host is required".into()));
    }
    if cfg.username.is_empty() || cfg.password.is_empty() {
        return Err(FleetError::Config("username and password are required".into()));
    }
    if cfg.api_timeout == 0 {
        return Err(FleetError::Config("api_timeout must be greater than 0".into()));
    }
    if cfg.poll_interval == 0 {
        return Err(FleetError::Config("poll_interval must be greater than 0".into()));
    }
    if cfg.ca_file.is_some() && cfg.allow_unverified_tls {
        return Err(FleetError::Config(
            "ca_file and allow_unverified_tls are mutually exclusive".into()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    const SAMPLE: &str = "\
# fleet manager
host = https://sddc.example.com
username = admin@local
password = s3cret
poll_interval = 5
api_timeout = not-a-number
allow_unverified_tls = yes
unknown_key = ignored
";

    #[test]
    fn parses_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(SAMPLE.as_bytes()).unwrap();
        let cfg = load_config(f.path()).unwrap();
        assert_eq!(cfg.host, "https://sddc.example.com");
        assert_eq!(cfg.username, "admin@local");
        assert_eq!(cfg.poll_interval(), Duration::from_secs(5));
        assert_eq!(cfg.api_timeout, API_TIMEOUT);
        assert_eq!(cfg.operation_timeout, OPERATION_TIMEOUT);
        assert!(cfg.allow_unverified_tls);
        assert!(!cfg.log_syslog);
        assert!(validate_config(&cfg).is_ok());
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = load_config(Path::new("/nonexistent/fleet-certs.conf")).unwrap_err();
        assert!(matches!(err, FleetError::Config(_)));
    }

    #[test]
    fn env_overrides_file() {
        let mut cfg = parse_config(SAMPLE);
        let env: HashMap<&str, &str> = [
            ("FLEET_CERTS_PASSWORD", "from-env"),
            ("FLEET_CERTS_OPERATION_TIMEOUT", "600"),
            ("FLEET_CERTS_USERNAME", "  "),
        ]
        .into_iter()
        .collect();
        apply_env(&mut cfg, |k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.password, "from-env");
        assert_eq!(cfg.operation_timeout, 600);
        assert_eq!(cfg.username, "admin@local");
    }

    #[test]
    fn validation_rules() {
        let mut cfg = parse_config(SAMPLE);
        cfg.host.clear();
        assert!(validate_config(&cfg).is_err());

        let mut cfg = parse_config(SAMPLE);
        cfg.poll_interval = 0;
        assert!(validate_config(&cfg).is_err());

        let mut cfg = parse_config(SAMPLE);
        cfg.ca_file = Some(PathBuf::from("/etc/ssl/ca.pem"));
        assert!(validate_config(&cfg).is_err());
    }
}
