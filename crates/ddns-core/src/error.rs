//! Error types for the DDNS system
//!
//! Every failure a reconciliation cycle can hit falls into one of three
//! recoverable kinds (see [`FailureKind`]). Configuration errors are the only
//! ones that stop the process, and they happen before the first cycle.

use thiserror::Error;

use crate::engine::FailureKind;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS system
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid startup configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The provider answered with an explicit error code
    #[error("Provider error ({code}): {message}")]
    Provider {
        /// Provider error code (e.g. `InvalidAccessKeyId.NotFound`)
        code: String,
        /// Human-readable message returned by the provider
        message: String,
    },

    /// Network, timeout, HTTP status or body decoding failure
    #[error("Transport error: {0}")]
    Transport(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a provider error from a code/message pair
    pub fn provider(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Classify this error for cycle reporting.
    ///
    /// Resolution failures never surface as an `Error`: an `IpSource`
    /// signals them with `None`. Config errors never reach a cycle; if one
    /// does it is reported as a transport failure so the cycle still yields
    /// exactly one outcome.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Error::Provider { .. } => FailureKind::Provider,
            Error::Transport(_) | Error::Config(_) => FailureKind::Transport,
        }
    }

    /// Message suitable for the one-line cycle report.
    ///
    /// Provider errors report the provider's own message, as the operator
    /// acts on that text directly.
    pub fn report_message(&self) -> String {
        match self {
            Error::Provider { code, message } => format!("{} ({})", message, code),
            other => other.to_string(),
        }
    }
}
