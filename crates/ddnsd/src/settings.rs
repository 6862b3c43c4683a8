//! Daemon settings
//!
//! Sources, lowest to highest precedence:
//!
//! 1. TOML file at `DDNS_CONFIG_PATH`, or `./config.toml` when present
//! 2. `DDNS_*` environment variables
//!
//! Everything is resolved once at startup; the result is immutable.

use anyhow::{Context, Result};
use ddns_core::{DdnsConfig, IpSourceKind};
use serde::Deserialize;
use std::path::Path;

/// Used when `DDNS_CONFIG_PATH` is unset
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Config file layout
///
/// ```toml
/// DomainName = "example.com"
/// RR = "home"
/// AccessKeyId = "..."
/// AccessKeySecret = "..."
/// Endpoint = "https://alidns.aliyuncs.com/"
/// Interval = 10
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FileConfig {
    domain_name: Option<String>,
    #[serde(rename = "RR")]
    rr: Option<String>,
    access_key_id: Option<String>,
    access_key_secret: Option<String>,
    endpoint: Option<String>,
    /// Minutes between cycles
    interval: Option<u64>,
    ip_source: Option<String>,
    ip_source_url: Option<String>,
    /// Seconds per HTTP call
    timeout: Option<u64>,
}

impl FileConfig {
    fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}

/// Resolved daemon settings
#[derive(Debug)]
pub struct Settings {
    pub ddns: DdnsConfig,
    pub log_level: String,
}

impl Settings {
    /// Load settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::load(|key| std::env::var(key).ok(), Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Load settings using `lookup` for environment variables
    ///
    /// `default_path` is only read if it exists; an explicit
    /// `DDNS_CONFIG_PATH` must exist.
    pub fn load<F>(lookup: F, default_path: &Path) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = match lookup("DDNS_CONFIG_PATH") {
            Some(path) => FileConfig::read(Path::new(&path))?,
            None if default_path.exists() => FileConfig::read(default_path)?,
            None => FileConfig::default(),
        };

        Self::merge(file, lookup)
    }

    fn merge<F>(file: FileConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |key: &str, from_file: Option<String>| lookup(key).or(from_file);

        let domain = pick("DDNS_DOMAIN", file.domain_name).unwrap_or_default();
        let access_key_id = pick("DDNS_ACCESS_KEY_ID", file.access_key_id).unwrap_or_default();
        let access_key_secret =
            pick("DDNS_ACCESS_KEY_SECRET", file.access_key_secret).unwrap_or_default();

        let mut ddns = DdnsConfig::new(domain, access_key_id, access_key_secret);

        if let Some(rr) = pick("DDNS_RECORD", file.rr) {
            ddns.record_name = rr;
        }
        if let Some(endpoint) = pick("DDNS_ENDPOINT", file.endpoint) {
            ddns.endpoint = endpoint;
        }
        if let Some(minutes) = parse_number(&lookup, "DDNS_INTERVAL_MINUTES")?.or(file.interval) {
            ddns.interval_minutes = minutes;
        }
        if let Some(secs) = parse_number(&lookup, "DDNS_HTTP_TIMEOUT_SECS")?.or(file.timeout) {
            ddns.http_timeout_secs = secs;
        }
        if let Some(name) = pick("DDNS_IP_SOURCE", file.ip_source) {
            let kind = IpSourceKind::from_name(&name).with_context(|| {
                format!(
                    "IP source '{}' is not supported. Supported sources: ipcn, sohu",
                    name
                )
            })?;
            ddns = ddns.with_ip_source(kind);
        }
        ddns.ip_source_url = pick("DDNS_IP_SOURCE_URL", file.ip_source_url);

        ddns.dry_run = match lookup("DDNS_MODE").as_deref() {
            None | Some("live") => false,
            Some("dry-run") => true,
            Some(other) => anyhow::bail!(
                "DDNS_MODE '{}' is not valid. Valid modes: live, dry-run",
                other
            ),
        };

        Ok(Self {
            ddns,
            log_level: lookup("DDNS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the settings
    ///
    /// Required values missing anywhere end up here as empty strings.
    pub fn validate(&self) -> Result<()> {
        if self.ddns.domain.is_empty() {
            anyhow::bail!(
                "Domain name is required. \
                Set DomainName in the config file or export DDNS_DOMAIN=example.com"
            );
        }
        validate_domain_name(&self.ddns.domain)?;

        if self.ddns.access_key_id.is_empty() || self.ddns.access_key_secret.is_empty() {
            anyhow::bail!(
                "Access key is required. \
                Set AccessKeyId/AccessKeySecret in the config file \
                or export DDNS_ACCESS_KEY_ID and DDNS_ACCESS_KEY_SECRET"
            );
        }

        self.ddns.validate()?;

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "DDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }
}

fn parse_number<F>(lookup: &F, key: &str) -> Result<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{} must be a whole number. Got: {}", key, value))
        })
        .transpose()
}

/// Basic RFC 1035 shape check on the managed domain
fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.len() > 253 {
        anyhow::bail!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        );
    }

    for label in domain.split('.') {
        if label.is_empty() {
            anyhow::bail!("Domain name has empty label: '{}'", domain);
        }
        if label.len() > 63 {
            anyhow::bail!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            );
        }
        if !label.chars().all(|c| c.is_alphanumeric() || c == '-') {
            anyhow::bail!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            );
        }
        if label.starts_with('-') || label.ends_with('-') {
            anyhow::bail!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            );
        }
    }

    Ok(())
}
