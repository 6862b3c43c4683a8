// # DNS Provider Trait
//
// Defines the interface for reading and rewriting a domain's records via
// the provider's API.
//
// ## Implementations
//
// - Alibaba Cloud DNS: `ddns-provider-alidns` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> ddns_core::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let records = provider.describe_records("example.com").await?;
//     let existing = records.iter().find(|r| r.rr == "@");
//
//     provider
//         .upsert_record("example.com", "@", &ip, existing.map(|r| r.record_id.as_str()))
//         .await?;
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::traits::ObservedIp;

/// A DNS record as reported by the provider's describe call.
///
/// Owned by the provider; the engine reads it within one cycle and never
/// keeps it beyond that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    /// Provider-assigned record id
    pub record_id: String,
    /// Resource record name (e.g. "@" or "www")
    pub rr: String,
    /// Record value (the address, for A records)
    pub value: String,
    /// Record type (e.g. "A", "CNAME")
    pub record_type: String,
}

impl DnsRecord {
    /// Whether this is an A record
    pub fn is_a_record(&self) -> bool {
        self.record_type.eq_ignore_ascii_case("A")
    }
}

/// Trait for DNS provider implementations
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to their endpoint only
/// - ✅ Parse provider-specific responses
/// - ✅ Return success or failure (the next cycle is the retry)
///
/// ## Forbidden Capabilities
/// - ❌ Implement retry logic or backoff
/// - ❌ Decide whether an update is needed (owned by `DdnsEngine`)
/// - ❌ Cache records beyond a single request
/// - ❌ Log credentials or request signatures
///
/// ## Error Mapping
///
/// - A response carrying a provider error code → [`crate::Error::Provider`]
/// - Network failure, timeout, bad status, undecodable body → [`crate::Error::Transport`]
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List the records of `domain`.
    async fn describe_records(&self, domain: &str) -> Result<Vec<DnsRecord>, crate::Error>;

    /// Point the A record `rr` of `domain` at `ip`.
    ///
    /// With `existing_record_id` the record is updated in place; without it a
    /// new record is created.
    async fn upsert_record(
        &self,
        domain: &str,
        rr: &str,
        ip: &ObservedIp,
        existing_record_id: Option<&str>,
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
