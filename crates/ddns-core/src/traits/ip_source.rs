// # IP Source Trait
//
// Defines the interface for learning the caller's current public IPv4 address.
//
// ## Implementations
//
// - HTTP-based: `ddns-ip-http` crate (JSON `ip` field or quoted-literal text)
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::IpSource;
//
// #[tokio::main]
// async fn main() {
//     let source = /* IpSource implementation */;
//
//     match source.resolve().await {
//         Some(ip) => println!("public ip: {}", ip),
//         None => println!("could not determine address this cycle"),
//     }
// }
// ```

use async_trait::async_trait;
use std::fmt;
use std::net::Ipv4Addr;

/// A public IPv4 address as observed by an [`IpSource`].
///
/// Held as its dotted-quad text and compared as an opaque value. The only
/// way to build one is [`ObservedIp::parse`], so every instance is a valid
/// IPv4 literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObservedIp(String);

impl ObservedIp {
    /// Accept `text` if it is an IPv4 literal (surrounding whitespace ignored).
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        text.parse::<Ipv4Addr>().ok()?;
        Some(Self(text.to_string()))
    }

    /// The dotted-quad text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObservedIp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trait for IP source implementations
///
/// # Trust Level: Semi-Trusted
///
/// IP sources are **observers**, not decision-makers.
///
/// ## Allowed Capabilities
/// - ✅ Issue one HTTP request per `resolve()` call
/// - ✅ Parse the response into an [`ObservedIp`]
///
/// ## Forbidden Capabilities
/// - ❌ Retry inside `resolve()` (the next scheduled cycle is the retry)
/// - ❌ Cache addresses between calls (the engine owns the cache)
/// - ❌ Return errors or panic on network failure; absence is reported as `None`
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Determine the current public IPv4 address.
    ///
    /// # Returns
    ///
    /// - `Some(ObservedIp)`: The address reported by the external service
    /// - `None`: The address could not be determined this cycle
    async fn resolve(&self) -> Option<ObservedIp>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_dotted_quad() {
        let ip = ObservedIp::parse(" 1.2.3.4\n").unwrap();
        assert_eq!(ip.as_str(), "1.2.3.4");
        assert_eq!(ip.to_string(), "1.2.3.4");
    }

    #[test]
    fn test_parse_rejects_non_ipv4() {
        assert!(ObservedIp::parse("").is_none());
        assert!(ObservedIp::parse("::1").is_none());
        assert!(ObservedIp::parse("1.2.3").is_none());
        assert!(ObservedIp::parse("256.1.1.1").is_none());
        assert!(ObservedIp::parse("<html>").is_none());
    }
}
