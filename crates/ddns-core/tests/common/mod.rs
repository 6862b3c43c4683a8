//! Test doubles and common utilities for engine contract tests
//!
//! The doubles count every call so tests can assert exactly which remote
//! operations a cycle performed.

#![allow(dead_code)]

use ddns_core::config::DdnsConfig;
use ddns_core::error::{Error, Result};
use ddns_core::traits::{DnsProvider, DnsRecord, IpSource, ObservedIp};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Parse a test address, panicking on typos
pub fn ip(text: &str) -> ObservedIp {
    ObservedIp::parse(text).expect("valid test IPv4")
}

/// Build an A record
pub fn a_record(record_id: &str, rr: &str, value: &str) -> DnsRecord {
    DnsRecord {
        record_id: record_id.to_string(),
        rr: rr.to_string(),
        value: value.to_string(),
        record_type: "A".to_string(),
    }
}

/// An IpSource whose answer the test controls
#[derive(Clone)]
pub struct ControlledIpSource {
    /// Address returned by resolve(); None simulates a resolution failure
    current: Arc<std::sync::Mutex<Option<ObservedIp>>>,
    /// Call counter for resolve()
    resolve_call_count: Arc<AtomicUsize>,
}

impl ControlledIpSource {
    pub fn new(current: Option<&str>) -> Self {
        Self {
            current: Arc::new(std::sync::Mutex::new(current.map(ip))),
            resolve_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Change the address future resolve() calls return
    pub fn set(&self, current: Option<&str>) {
        *self.current.lock().unwrap() = current.map(ip);
    }

    /// Get the number of times resolve() was called
    pub fn resolve_call_count(&self) -> usize {
        self.resolve_call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for ControlledIpSource {
    async fn resolve(&self) -> Option<ObservedIp> {
        self.resolve_call_count.fetch_add(1, Ordering::SeqCst);
        self.current.lock().unwrap().clone()
    }

    fn source_name(&self) -> &'static str {
        "controlled"
    }
}

/// One recorded upsert_record() call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertCall {
    pub domain: String,
    pub rr: String,
    pub ip: String,
    pub record_id: Option<String>,
}

/// How a mocked call should fail
#[derive(Debug, Clone)]
pub enum Failure {
    Provider { code: String, message: String },
    Transport(String),
}

impl Failure {
    pub fn provider(code: &str, message: &str) -> Self {
        Failure::Provider {
            code: code.to_string(),
            message: message.to_string(),
        }
    }

    fn to_error(&self) -> Error {
        match self {
            Failure::Provider { code, message } => Error::provider(code, message),
            Failure::Transport(msg) => Error::transport(msg),
        }
    }
}

/// A mock DnsProvider backed by an in-memory record list
///
/// Successful upserts are applied to the list, so a later describe sees them.
#[derive(Clone)]
pub struct MockDnsProvider {
    records: Arc<std::sync::Mutex<Vec<DnsRecord>>>,
    describe_call_count: Arc<AtomicUsize>,
    upsert_calls: Arc<std::sync::Mutex<Vec<UpsertCall>>>,
    describe_failure: Arc<std::sync::Mutex<Option<Failure>>>,
    upsert_failure: Arc<std::sync::Mutex<Option<Failure>>>,
    /// Artificial latency for describe_records()
    describe_delay: Arc<std::sync::Mutex<Duration>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    next_id: Arc<AtomicUsize>,
}

impl MockDnsProvider {
    pub fn new(records: Vec<DnsRecord>) -> Self {
        Self {
            records: Arc::new(std::sync::Mutex::new(records)),
            describe_call_count: Arc::new(AtomicUsize::new(0)),
            upsert_calls: Arc::new(std::sync::Mutex::new(Vec::new())),
            describe_failure: Arc::new(std::sync::Mutex::new(None)),
            upsert_failure: Arc::new(std::sync::Mutex::new(None)),
            describe_delay: Arc::new(std::sync::Mutex::new(Duration::ZERO)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            next_id: Arc::new(AtomicUsize::new(1000)),
        }
    }

    pub fn fail_describe(&self, failure: Option<Failure>) {
        *self.describe_failure.lock().unwrap() = failure;
    }

    pub fn fail_upsert(&self, failure: Option<Failure>) {
        *self.upsert_failure.lock().unwrap() = failure;
    }

    pub fn set_describe_delay(&self, delay: Duration) {
        *self.describe_delay.lock().unwrap() = delay;
    }

    /// Get the number of times describe_records() was called
    pub fn describe_call_count(&self) -> usize {
        self.describe_call_count.load(Ordering::SeqCst)
    }

    /// Get all upsert_record() calls, in order
    pub fn upsert_calls(&self) -> Vec<UpsertCall> {
        self.upsert_calls.lock().unwrap().clone()
    }

    /// Total number of provider calls of any kind
    pub fn total_calls(&self) -> usize {
        self.describe_call_count() + self.upsert_calls().len()
    }

    /// Highest number of describe calls observed running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn records(&self) -> Vec<DnsRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn describe_records(&self, _domain: &str) -> Result<Vec<DnsRecord>> {
        self.describe_call_count.fetch_add(1, Ordering::SeqCst);

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        let delay = *self.describe_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(failure) = self.describe_failure.lock().unwrap().as_ref() {
            return Err(failure.to_error());
        }
        Ok(self.records())
    }

    async fn upsert_record(
        &self,
        domain: &str,
        rr: &str,
        ip: &ObservedIp,
        existing_record_id: Option<&str>,
    ) -> Result<()> {
        self.upsert_calls.lock().unwrap().push(UpsertCall {
            domain: domain.to_string(),
            rr: rr.to_string(),
            ip: ip.to_string(),
            record_id: existing_record_id.map(str::to_string),
        });

        if let Some(failure) = self.upsert_failure.lock().unwrap().as_ref() {
            return Err(failure.to_error());
        }

        let mut records = self.records.lock().unwrap();
        match existing_record_id {
            Some(id) => {
                if let Some(record) = records.iter_mut().find(|r| r.record_id == id) {
                    record.value = ip.to_string();
                }
            }
            None => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
                records.push(a_record(&id, rr, ip.as_str()));
            }
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Helper to create a minimal DdnsConfig for testing
pub fn minimal_config(record_name: &str) -> DdnsConfig {
    DdnsConfig::new("example.com", "test-key-id", "test-key-secret").with_record_name(record_name)
}
