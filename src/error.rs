//! Error types for the probing agent.

use thiserror::Error;

use crate::status::IpStatus;

/// A produced status code that the classification table cannot resolve.
///
/// This is a defect in the embedded table, not a network condition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassificationError {
    #[error("unrecognised status code {code} (ipv4: {ipv4})")]
    UnknownCode { code: i32, ipv4: bool },

    #[error("status {0:?} has no classification entry")]
    MissingEntry(IpStatus),
}

/// Failure of the probe transport itself, as opposed to a non-success status.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to resolve {target}: {source}")]
    Resolve {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create ICMP client: {0}")]
    Socket(#[from] std::io::Error),

    #[error("probe transport failed: {0}")]
    Transport(#[from] surge_ping::SurgeError),

    #[error("probe cancelled")]
    Cancelled,
}

/// Errors that end a probe group abnormally.
#[derive(Debug, Error)]
pub enum GroupError {
    #[error(transparent)]
    Classification(#[from] ClassificationError),

    #[error(transparent)]
    Probe(#[from] ProbeError),
}

/// Failure to hand a summary to persistent storage.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("summary I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize summary: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors raised while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not find config directory")]
    NoConfigDir,

    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}
