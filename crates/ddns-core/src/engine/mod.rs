//! Core DDNS engine
//!
//! The DdnsEngine is the reconciler: given a freshly observed address and the
//! cached [`ReconciliationState`], it decides whether to skip, update or
//! create the configured A record, and updates the cache.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Scheduler  │─── tick ───┐
//! └─────────────┘            │
//!                            ▼
//!                   ┌──────────────┐        ┌─────────────┐
//!                   │  DdnsEngine  │◄───────│  IpSource   │
//!                   └──────────────┘        └─────────────┘
//!                            │
//!              ┌─────────────┴─────────────┐
//!              ▼                           ▼
//!     ┌─────────────────┐        ┌──────────────────┐
//!     │ Reconciliation  │        │   DnsProvider    │
//!     │ State (cache)   │        │ describe/upsert  │
//!     └─────────────────┘        └──────────────────┘
//! ```
//!
//! ## Cycle
//!
//! 1. Resolve the public IP. Absent → `Failed(Resolution)`, nothing touched
//! 2. Equal to the last applied IP → `Unchanged`, no remote call
//! 3. Describe the domain's records. Provider error → `Failed`, cache untouched
//! 4. Matching record already holds the IP → `AlreadyCorrect`, cache set
//! 5. Matching record differs → update it; no matching record → create one
//! 6. Upsert error → `Failed`, cache untouched
//! 7. Upsert success → cache set, `Updated` / `Created`

pub mod scheduler;

use std::fmt;

use tracing::debug;

use crate::config::DdnsConfig;
use crate::error::{Error, Result};
use crate::state::ReconciliationState;
use crate::traits::{DnsProvider, DnsRecord, IpSource, ObservedIp};

pub use scheduler::Scheduler;

/// Classification of a failed cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The public IP could not be determined
    Resolution,
    /// The provider returned an explicit error code
    Provider,
    /// Network or decoding failure during an HTTP call
    Transport,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::Resolution => "IP resolution failed",
            FailureKind::Provider => "provider error",
            FailureKind::Transport => "transport failure",
        };
        f.write_str(label)
    }
}

/// The single outcome every reconciliation cycle produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Observed IP equals the last applied IP; no remote call was made
    Unchanged {
        ip: ObservedIp,
    },

    /// The provider's record already held the observed IP; nothing mutated
    AlreadyCorrect {
        ip: ObservedIp,
    },

    /// An existing record was rewritten
    Updated {
        record_id: String,
        previous: String,
        new: ObservedIp,
    },

    /// No matching record existed, so one was created
    Created {
        new: ObservedIp,
    },

    /// The cycle aborted; the cache was left as it was
    Failed {
        kind: FailureKind,
        message: String,
    },
}

impl CycleOutcome {
    /// Build a failed outcome
    pub fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failed {
            kind,
            message: message.into(),
        }
    }

    /// Build a failed outcome from an error
    pub fn from_error(error: &Error) -> Self {
        Self::failed(error.failure_kind(), error.report_message())
    }

    /// Whether the cycle failed
    pub fn is_failure(&self) -> bool {
        matches!(self, CycleOutcome::Failed { .. })
    }

    /// The address that is live in DNS after this cycle, if known
    pub fn applied_ip(&self) -> Option<&ObservedIp> {
        match self {
            CycleOutcome::Unchanged { ip } | CycleOutcome::AlreadyCorrect { ip } => Some(ip),
            CycleOutcome::Updated { new, .. } | CycleOutcome::Created { new } => Some(new),
            CycleOutcome::Failed { .. } => None,
        }
    }

    /// Status line for this outcome
    ///
    /// In dry-run mode nothing is sent for `Updated` and `Created`, so those
    /// are reported as what would have happened.
    pub fn status_line(&self, dry_run: bool) -> String {
        match self {
            CycleOutcome::Updated { previous, new, .. } if dry_run => format!(
                "[DRY-RUN] Would update record {} -> {}, nothing sent",
                previous, new
            ),
            CycleOutcome::Created { new } if dry_run => format!(
                "[DRY-RUN] Would create record with IP {}, nothing sent",
                new
            ),
            _ => self.to_string(),
        }
    }
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleOutcome::Unchanged { ip } => {
                write!(f, "IP {} unchanged since last cycle, no update needed", ip)
            }
            CycleOutcome::AlreadyCorrect { ip } => {
                write!(f, "Record already points at {}, no update needed", ip)
            }
            CycleOutcome::Updated { previous, new, .. } => {
                write!(f, "Updated record {} -> {}", previous, new)
            }
            CycleOutcome::Created { new } => write!(f, "Created record with IP {}", new),
            CycleOutcome::Failed { kind, message } => write!(f, "{}: {}", kind, message),
        }
    }
}

/// Core DDNS engine
///
/// Owns its [`ReconciliationState`] explicitly; tests can seed any starting
/// state with [`DdnsEngine::with_state`].
///
/// ## Threading
///
/// `reconcile` takes `&mut self`, so one engine can never run two cycles at
/// once. The [`Scheduler`] shares it behind a mutex for the same reason.
pub struct DdnsEngine {
    /// IP source for discovering the public address
    ip_source: Box<dyn IpSource>,

    /// DNS provider for reading and rewriting records
    provider: Box<dyn DnsProvider>,

    /// Domain holding the record
    domain: String,

    /// Resource record name to keep pointed at the public address
    record_name: String,

    /// Last applied address
    state: ReconciliationState,

    /// Mutations are skipped by the provider
    dry_run: bool,
}

impl DdnsEngine {
    /// Create a new DDNS engine with unknown state
    ///
    /// # Parameters
    ///
    /// - `ip_source`: IP source implementation
    /// - `provider`: DNS provider implementation
    /// - `config`: DDNS configuration (validated here)
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        config: &DdnsConfig,
    ) -> Result<Self> {
        Self::with_state(ip_source, provider, config, ReconciliationState::new())
    }

    /// Create a new DDNS engine starting from `state`
    pub fn with_state(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        config: &DdnsConfig,
        state: ReconciliationState,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            ip_source,
            provider,
            domain: config.domain.clone(),
            record_name: config.record_name.clone(),
            state,
            dry_run: config.dry_run,
        })
    }

    /// Current reconciliation state
    pub fn state(&self) -> &ReconciliationState {
        &self.state
    }

    /// Domain this engine manages
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Record name this engine manages
    pub fn record_name(&self) -> &str {
        &self.record_name
    }

    /// Whether the engine runs against a dry-run provider
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Run one reconciliation cycle.
    ///
    /// Never fails: every error is folded into [`CycleOutcome::Failed`].
    pub async fn reconcile(&mut self) -> CycleOutcome {
        let Some(ip) = self.ip_source.resolve().await else {
            return CycleOutcome::failed(
                FailureKind::Resolution,
                format!(
                    "could not determine public IP via {}",
                    self.ip_source.source_name()
                ),
            );
        };

        if self.state.is_applied(&ip) {
            debug!("IP {} matches last applied IP, skipping remote calls", ip);
            return CycleOutcome::Unchanged { ip };
        }

        match self.apply(ip).await {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!("Cycle aborted, cache left untouched: {}", e);
                CycleOutcome::from_error(&e)
            }
        }
    }

    /// Bring the provider's record in line with `ip` and update the cache.
    ///
    /// The cache is only written after the provider confirmed the value.
    async fn apply(&mut self, ip: ObservedIp) -> Result<CycleOutcome> {
        debug!(
            "Checking {} records for {}.{} via {}",
            self.provider.provider_name(),
            self.record_name,
            self.domain,
            ip
        );

        let records = self.provider.describe_records(&self.domain).await?;

        let outcome = match self.find_record(records) {
            Some(record) if record.value == ip.as_str() => {
                CycleOutcome::AlreadyCorrect { ip: ip.clone() }
            }
            Some(record) => {
                self.provider
                    .upsert_record(&self.domain, &self.record_name, &ip, Some(&record.record_id))
                    .await?;
                CycleOutcome::Updated {
                    record_id: record.record_id,
                    previous: record.value,
                    new: ip.clone(),
                }
            }
            None => {
                self.provider
                    .upsert_record(&self.domain, &self.record_name, &ip, None)
                    .await?;
                CycleOutcome::Created { new: ip.clone() }
            }
        };

        self.state.record_applied(ip);
        Ok(outcome)
    }

    /// Pick the A record named like the configured record
    fn find_record(&self, records: Vec<DnsRecord>) -> Option<DnsRecord> {
        records
            .into_iter()
            .find(|record| record.is_a_record() && record.rr == self.record_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_messages() {
        let ip = ObservedIp::parse("1.2.3.4").unwrap();

        assert_eq!(
            CycleOutcome::Unchanged { ip: ip.clone() }.to_string(),
            "IP 1.2.3.4 unchanged since last cycle, no update needed"
        );
        assert_eq!(
            CycleOutcome::Updated {
                record_id: "42".to_string(),
                previous: "5.6.7.8".to_string(),
                new: ip.clone(),
            }
            .to_string(),
            "Updated record 5.6.7.8 -> 1.2.3.4"
        );
        assert_eq!(
            CycleOutcome::failed(FailureKind::Provider, "Forbidden").to_string(),
            "provider error: Forbidden"
        );
    }

    #[test]
    fn test_dry_run_status_lines() {
        let ip = ObservedIp::parse("1.2.3.4").unwrap();
        let updated = CycleOutcome::Updated {
            record_id: "42".to_string(),
            previous: "5.6.7.8".to_string(),
            new: ip.clone(),
        };
        let created = CycleOutcome::Created { new: ip.clone() };
        let unchanged = CycleOutcome::Unchanged { ip: ip.clone() };

        assert_eq!(
            updated.status_line(true),
            "[DRY-RUN] Would update record 5.6.7.8 -> 1.2.3.4, nothing sent"
        );
        assert_eq!(
            created.status_line(true),
            "[DRY-RUN] Would create record with IP 1.2.3.4, nothing sent"
        );
        assert!(!updated.status_line(true).contains("Updated"));
        assert!(!created.status_line(true).contains("Created"));

        assert_eq!(updated.status_line(false), updated.to_string());
        assert_eq!(created.status_line(false), "Created record with IP 1.2.3.4");
        assert_eq!(unchanged.status_line(true), unchanged.to_string());
    }

    #[test]
    fn test_applied_ip() {
        let ip = ObservedIp::parse("1.2.3.4").unwrap();

        assert_eq!(CycleOutcome::Created { new: ip.clone() }.applied_ip(), Some(&ip));
        assert!(
            CycleOutcome::failed(FailureKind::Transport, "timeout")
                .applied_ip()
                .is_none()
        );
        assert!(CycleOutcome::failed(FailureKind::Resolution, "none").is_failure());
    }

    #[test]
    fn test_from_error_keeps_kind() {
        let outcome = CycleOutcome::from_error(&Error::transport("connection reset"));
        assert_eq!(
            outcome,
            CycleOutcome::failed(
                FailureKind::Transport,
                "Transport error: connection reset"
            )
        );
    }
}
