//! Core traits for the DDNS system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpSource`]: Learn the current public IPv4 address
//! - [`DnsProvider`]: Read and rewrite DNS records via provider APIs

pub mod ip_source;
pub mod dns_provider;

pub use ip_source::{IpSource, ObservedIp};
pub use dns_provider::{DnsProvider, DnsRecord};
