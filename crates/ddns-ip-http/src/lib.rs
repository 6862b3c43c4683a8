// # HTTP IP Source
//
// Discovers the caller's public IPv4 address by asking an external
// "what is my IP" service.
//
// Two services are supported, each with its own response format:
//
// - **ip.cn**: JSON object with an `ip` string field
// - **sohu**: JavaScript snippet containing the address as a quoted literal
//
// The source never errors. Any network failure, non-2xx status, timeout or
// unparseable body yields `None` (with a warning), and the engine treats
// that as a resolution failure for the current cycle.

use ddns_core::IpSourceKind;
use ddns_core::traits::{IpSource, ObservedIp};

use std::time::Duration;

/// Default service URL for [`IpSourceKind::IpCn`]
pub const IPCN_URL: &str = "https://ip.cn/api/index?type=0";

/// Default service URL for [`IpSourceKind::Sohu`]
pub const SOHU_URL: &str = "https://pv.sohu.com/cityjson?ie=utf-8";

/// Default service URL for a source kind
pub fn default_url(kind: IpSourceKind) -> &'static str {
    match kind {
        IpSourceKind::IpCn => IPCN_URL,
        IpSourceKind::Sohu => SOHU_URL,
    }
}

/// HTTP-based public IP source
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// Selects the response parser
    kind: IpSourceKind,

    /// URL to fetch the address from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `kind`: which service (and so which response format) to use
    /// - `url_override`: replaces the kind's default URL; the parser is unchanged
    /// - `timeout`: bound on each request
    pub fn new(kind: IpSourceKind, url_override: Option<String>, timeout: Duration) -> Self {
        let url = url_override.unwrap_or_else(|| default_url(kind).to_string());
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self { kind, url, client }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn kind(&self) -> IpSourceKind {
        self.kind
    }

    /// Fetch the response body, or `None` on any transport problem
    async fn fetch_body(&self) -> Option<String> {
        let response = match self.client.get(&self.url).send().await {
            Ok(response) => response,
            Err(e) => {
                let what = if e.is_timeout() { "timed out" } else { "failed" };
                tracing::warn!("IP lookup via {} {}: {}", self.url, what, e.without_url());
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!(
                "IP lookup via {} returned HTTP {}",
                self.url,
                response.status()
            );
            return None;
        }

        match response.text().await {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::warn!("Failed to read IP lookup response: {}", e.without_url());
                None
            }
        }
    }

    /// Apply this source's parser to a response body
    pub fn extract(&self, body: &str) -> Option<ObservedIp> {
        match self.kind {
            IpSourceKind::IpCn => extract_json_ip(body),
            IpSourceKind::Sohu => extract_quoted_ipv4(body),
        }
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn resolve(&self) -> Option<ObservedIp> {
        let body = self.fetch_body().await?;

        let ip = self.extract(&body);
        match &ip {
            Some(ip) => tracing::debug!("Public IP via {}: {}", self.kind.name(), ip),
            None => tracing::warn!(
                "No IPv4 address found in {} response",
                self.kind.name()
            ),
        }
        ip
    }

    fn source_name(&self) -> &'static str {
        self.kind.name()
    }
}

/// Read the `ip` string field of a JSON object
pub fn extract_json_ip(body: &str) -> Option<ObservedIp> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get("ip")?.as_str().and_then(ObservedIp::parse)
}

/// First double-quoted substring that is an IPv4 literal
pub fn extract_quoted_ipv4(body: &str) -> Option<ObservedIp> {
    // Odd-indexed pieces are the quoted contents
    body.split('"')
        .skip(1)
        .step_by(2)
        .find_map(ObservedIp::parse)
}
