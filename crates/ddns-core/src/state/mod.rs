// # Reconciliation State
//
// The single mutable cell the engine carries between cycles: the address it
// most recently believed was live in DNS.
//
// ## Lifetime
//
// - Memory only; starts out unknown on every process start
// - Written only by `DdnsEngine`, and only after the provider confirmed the
//   value (or already held it)
// - Always "last known good or unset" between cycles, never partially written
//
// It is a cache hint, not a guarantee: an out-of-band change to the record
// goes unnoticed until the observed address changes again.

use crate::traits::ObservedIp;

/// Last-applied address cache owned by the engine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationState {
    last_applied_ip: Option<ObservedIp>,
}

impl ReconciliationState {
    /// Fresh state: nothing applied yet
    pub fn new() -> Self {
        Self::default()
    }

    /// State seeded with a previously applied address
    pub fn with_last_applied(ip: ObservedIp) -> Self {
        Self {
            last_applied_ip: Some(ip),
        }
    }

    /// The address most recently confirmed live, if any
    pub fn last_applied_ip(&self) -> Option<&ObservedIp> {
        self.last_applied_ip.as_ref()
    }

    /// Whether `ip` is the address already applied
    pub fn is_applied(&self, ip: &ObservedIp) -> bool {
        self.last_applied_ip.as_ref() == Some(ip)
    }

    /// Record a confirmed address
    pub(crate) fn record_applied(&mut self, ip: ObservedIp) {
        self.last_applied_ip = Some(ip);
    }
}
