// # ddns-core
//
// Core library for the single-record DDNS updater.
//
// ## Architecture Overview
//
// This library provides the reconciliation engine for dynamic DNS updates:
// - **IpSource**: Trait for discovering the current public IPv4 address
// - **DnsProvider**: Trait for describing and upserting records via provider APIs
// - **DdnsEngine**: Reconciler that turns "observed IP" + "record state" into
//   skip / update / create
// - **Scheduler**: Runs the engine once at startup and then periodically
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Decision logic is separate from I/O implementations
// 2. **Explicit State**: The last applied IP is owned by the engine, not global
// 3. **Never Crash a Cycle**: Every failure becomes one reported outcome
// 4. **Library-First**: All core functionality can be used as a library
// 5. **Idempotency**: The same IP twice makes zero provider calls the second time

pub mod traits;
pub mod engine;
pub mod config;
pub mod error;
pub mod state;

// Re-export core types for convenience
pub use traits::{IpSource, DnsProvider, DnsRecord, ObservedIp};
pub use engine::{CycleOutcome, DdnsEngine, FailureKind, Scheduler};
pub use config::{DdnsConfig, IpSourceKind};
pub use error::{Error, Result};
pub use state::ReconciliationState;
