// # Alibaba Cloud DNS Provider
//
// DNS record client for the Alibaba Cloud DNS RPC API.
//
// Every call is a single signed GET against the configured endpoint:
//
// - `DescribeDomainRecords` lists the records of a domain
// - `UpdateDomainRecord` rewrites an existing record by id
// - `AddDomainRecord` creates a record when none matches
//
// The provider is stateless and single-shot. It never retries, never caches
// and never decides between update and create on its own; that decision
// belongs to `DdnsEngine`, which passes the existing record id (or none).
//
// ## Security Requirements
//
// - The access key secret NEVER appears in logs or error messages
// - Signed URLs are only logged at trace level, with the signature elided
// - Transport errors are stripped of their URL before being reported

pub mod response;
pub mod signer;

use async_trait::async_trait;
use ddns_core::config::DdnsConfig;
use ddns_core::traits::{DnsProvider, DnsRecord, ObservedIp};
use ddns_core::{Error, Result};
use std::collections::BTreeMap;

pub use signer::RequestSigner;

/// Upper bound on records returned by one describe call
const DESCRIBE_PAGE_SIZE: &str = "500";

/// Action and parameters for the single mutation a cycle may issue
///
/// With an existing record id the record is rewritten in place
/// (`UpdateDomainRecord`); without one a record is created in `domain`
/// (`AddDomainRecord`).
fn mutation_request(
    domain: &str,
    rr: &str,
    ip: &ObservedIp,
    existing_record_id: Option<&str>,
) -> (&'static str, BTreeMap<String, String>) {
    let (action, mut params) = match existing_record_id {
        Some(record_id) => (
            "UpdateDomainRecord",
            BTreeMap::from([("RecordId".to_string(), record_id.to_string())]),
        ),
        None => (
            "AddDomainRecord",
            BTreeMap::from([("DomainName".to_string(), domain.to_string())]),
        ),
    };
    params.insert("RR".to_string(), rr.to_string());
    params.insert("Type".to_string(), "A".to_string());
    params.insert("Value".to_string(), ip.to_string());

    (action, params)
}

/// Alibaba Cloud DNS provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true the provider still describes records, but update
/// and add calls are only logged and reported as successful.
pub struct AliDnsProvider {
    signer: RequestSigner,

    /// HTTP client carrying the per-request timeout
    client: reqwest::Client,

    dry_run: bool,
}

// Custom Debug implementation that hides the secret held by the signer
impl std::fmt::Debug for AliDnsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AliDnsProvider")
            .field("signer", &self.signer)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl AliDnsProvider {
    /// Create a provider from the validated configuration
    ///
    /// Fails with `Error::Config` if the configuration is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: &DdnsConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            signer: RequestSigner::new(
                config.endpoint.clone(),
                config.access_key_id.clone(),
                config.access_key_secret.clone(),
            ),
            client,
            dry_run: config.dry_run,
        })
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Sign and send one action, returning the decoded success body
    async fn call(&self, action: &str, params: BTreeMap<String, String>) -> Result<serde_json::Value> {
        let url = self.signer.sign(action, &params)?;
        tracing::trace!(action, url = %elide_signature(&url), "Sending signed request");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(action, e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(action, e))?;

        tracing::debug!(action, status, "Received response");
        response::check_body(status, &body)
    }
}

#[async_trait]
impl DnsProvider for AliDnsProvider {
    async fn describe_records(&self, domain: &str) -> Result<Vec<DnsRecord>> {
        tracing::debug!("Describing records of {}", domain);

        let params = BTreeMap::from([
            ("DomainName".to_string(), domain.to_string()),
            ("PageSize".to_string(), DESCRIBE_PAGE_SIZE.to_string()),
        ]);
        let value = self.call("DescribeDomainRecords", params).await?;
        let described = response::parse_describe(value)?;

        if described.is_truncated() {
            tracing::warn!(
                "{} holds {} records but only {} were returned; the managed record may be missed",
                domain,
                described.total_count,
                described.records.len()
            );
        }

        tracing::debug!("Found {} records for {}", described.records.len(), domain);
        Ok(described.records)
    }

    async fn upsert_record(
        &self,
        domain: &str,
        rr: &str,
        ip: &ObservedIp,
        existing_record_id: Option<&str>,
    ) -> Result<()> {
        let (action, params) = mutation_request(domain, rr, ip, existing_record_id);

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would call {} for {}.{} -> {}",
                action,
                rr,
                domain,
                ip
            );
            return Ok(());
        }

        tracing::info!("Calling {} for {}.{} -> {}", action, rr, domain, ip);
        let value = self.call(action, params).await?;
        let record_id = response::parse_mutation(value)?;
        tracing::debug!("{} succeeded (record id {})", action, record_id);

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "alidns"
    }
}

/// Classify a reqwest failure without leaking the signed URL
fn transport_error(action: &str, error: reqwest::Error) -> Error {
    let what = if error.is_timeout() {
        "timed out"
    } else if error.is_connect() {
        "could not connect"
    } else {
        "request failed"
    };
    Error::transport(format!("{} {}: {}", action, what, error.without_url()))
}

/// Drop the `Signature` parameter from a signed URL for logging
fn elide_signature(url: &str) -> String {
    match url.find("&Signature=") {
        Some(idx) => format!("{}&Signature=<elided>", &url[..idx]),
        None => url.to_string(),
    }
}
