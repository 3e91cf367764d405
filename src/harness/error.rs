//! Harness error taxonomy

use std::time::Duration;
use thiserror::Error;

/// Errors raised by the orchestration layer
///
/// Every variant aborts the current scenario; nothing is retried.
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Failed to deploy contract '{name}': {reason}")]
    Deployment { name: String, reason: String },

    #[error("Channel handshake {local_port} <-> {remote_port} failed: {reason}")]
    Handshake {
        local_port: String,
        remote_port: String,
        reason: String,
    },

    #[error("Channel handshake timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to decode acknowledgement at level {level}: {reason}")]
    Decode { level: usize, reason: String },

    #[error("Assertion failed: {0}")]
    Assertion(String),
}

impl HarnessError {
    pub fn deployment(name: impl Into<String>, reason: impl ToString) -> Self {
        HarnessError::Deployment {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn decode(level: usize, reason: impl ToString) -> Self {
        HarnessError::Decode {
            level,
            reason: reason.to_string(),
        }
    }

    pub fn assertion(message: impl Into<String>) -> Self {
        HarnessError::Assertion(message.into())
    }

    /// Short kind label used in reports
    pub fn kind(&self) -> &'static str {
        match self {
            HarnessError::Deployment { .. } => "deployment",
            HarnessError::Handshake { .. } => "handshake",
            HarnessError::Timeout(_) => "timeout",
            HarnessError::Decode { .. } => "decode",
            HarnessError::Assertion(_) => "assertion",
        }
    }
}
