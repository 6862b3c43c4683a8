//! Configuration types for the DDNS system
//!
//! Configuration is supplied once at startup and stays immutable for the
//! lifetime of the process. Anything that fails [`DdnsConfig::validate`]
//! prevents the engine from starting.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default Alibaba Cloud DNS API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://alidns.aliyuncs.com/";

/// Longest accepted poll interval (one week)
pub const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

/// Main DDNS configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// Domain whose record is kept up to date (e.g. "example.com")
    pub domain: String,

    /// Resource record name inside the domain ("@" for the bare domain)
    #[serde(default = "default_record_name")]
    pub record_name: String,

    /// API access key id
    pub access_key_id: String,

    /// API access key secret
    /// ⚠️ NEVER log this value
    pub access_key_secret: String,

    /// DNS API endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Poll interval (in minutes)
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,

    /// Which external service reports the public address
    #[serde(default)]
    pub ip_source: IpSourceKind,

    /// Override for the IP source URL (the kind still selects the parser)
    #[serde(default)]
    pub ip_source_url: Option<String>,

    /// Timeout applied to every HTTP call (in seconds)
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Read the provider's records but never mutate them
    #[serde(default)]
    pub dry_run: bool,
}

impl DdnsConfig {
    /// Create a configuration with defaults for everything but the
    /// required fields
    pub fn new(
        domain: impl Into<String>,
        access_key_id: impl Into<String>,
        access_key_secret: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            record_name: default_record_name(),
            access_key_id: access_key_id.into(),
            access_key_secret: access_key_secret.into(),
            endpoint: default_endpoint(),
            interval_minutes: default_interval_minutes(),
            ip_source: IpSourceKind::default(),
            ip_source_url: None,
            http_timeout_secs: default_http_timeout_secs(),
            dry_run: false,
        }
    }

    /// Set the record name
    pub fn with_record_name(mut self, record_name: impl Into<String>) -> Self {
        self.record_name = record_name.into();
        self
    }

    /// Set the IP source kind
    pub fn with_ip_source(mut self, ip_source: IpSourceKind) -> Self {
        self.ip_source = ip_source;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.domain.trim().is_empty() {
            return Err(crate::Error::config("Domain name cannot be empty"));
        }
        if self.record_name.trim().is_empty() {
            return Err(crate::Error::config("Record name cannot be empty"));
        }
        if self.access_key_id.is_empty() {
            return Err(crate::Error::config("Access key id cannot be empty"));
        }
        if self.access_key_secret.is_empty() {
            return Err(crate::Error::config("Access key secret cannot be empty"));
        }
        if !is_http_url(&self.endpoint) {
            return Err(crate::Error::config(format!(
                "Endpoint must use HTTP or HTTPS scheme. Got: {}",
                self.endpoint
            )));
        }
        if let Some(url) = &self.ip_source_url {
            if !is_http_url(url) {
                return Err(crate::Error::config(format!(
                    "IP source URL must use HTTP or HTTPS scheme. Got: {}",
                    url
                )));
            }
        }
        if self.interval_minutes == 0 {
            return Err(crate::Error::config("Poll interval must be > 0 minutes"));
        }
        if self.interval_minutes > MAX_INTERVAL_MINUTES {
            return Err(crate::Error::config(format!(
                "Poll interval must be at most {} minutes. Got: {}",
                MAX_INTERVAL_MINUTES, self.interval_minutes
            )));
        }
        if self.http_timeout_secs == 0 {
            return Err(crate::Error::config("HTTP timeout must be > 0 seconds"));
        }

        Ok(())
    }

    /// Poll period as a [`Duration`]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.saturating_mul(60))
    }

    /// Per-request HTTP timeout as a [`Duration`]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

// Custom Debug implementation that hides the access key secret
impl fmt::Debug for DdnsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DdnsConfig")
            .field("domain", &self.domain)
            .field("record_name", &self.record_name)
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<REDACTED>")
            .field("endpoint", &self.endpoint)
            .field("interval_minutes", &self.interval_minutes)
            .field("ip_source", &self.ip_source)
            .field("ip_source_url", &self.ip_source_url)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

/// External service used to discover the public address
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpSourceKind {
    /// ip.cn, JSON body with an `ip` field
    #[default]
    IpCn,
    /// Sohu cityjson, free text with a quoted IPv4 literal
    Sohu,
}

impl IpSourceKind {
    /// Parse a selector as used in files and environment variables
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "ipcn" | "ip.cn" => Some(IpSourceKind::IpCn),
            "sohu" => Some(IpSourceKind::Sohu),
            _ => None,
        }
    }

    /// Get the selector name
    pub fn name(&self) -> &'static str {
        match self {
            IpSourceKind::IpCn => "ipcn",
            IpSourceKind::Sohu => "sohu",
        }
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

fn default_record_name() -> String {
    "@".to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_interval_minutes() -> u64 {
    10
}

fn default_http_timeout_secs() -> u64 {
    10
}
