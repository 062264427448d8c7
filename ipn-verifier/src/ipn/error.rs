//! Verification failures.

use std::io;

use thiserror::Error;

use crate::transport::ConnectError;

/// A notification that claimed to be an IPN but could not be trusted.
#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("sandbox notifications are not allowed but one was received")]
    SandboxDisallowed,

    #[error("unable to establish a connection to {host}")]
    Unreachable {
        host: String,
        #[source]
        source: ConnectError,
    },

    #[error("validation exchange with {host} failed")]
    Exchange {
        host: String,
        #[source]
        source: io::Error,
    },

    #[error("PayPal validation returned INVALID, possible attack")]
    Rejected,

    #[error("PayPal validation returned an unexpected response")]
    MalformedResponse,
}

/// Coarse category of a `SecurityError`, for alerting and status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Sandbox notification while test notifications are disabled.
    PolicyViolation,
    /// PayPal could not be reached or the exchange broke off.
    Transport,
    /// PayPal denied sending this notification.
    Rejected,
    Malformed,
}

impl SecurityError {
    pub fn kind(&self) -> FailureKind {
        match self {
            SecurityError::SandboxDisallowed => FailureKind::PolicyViolation,
            SecurityError::Unreachable { .. } | SecurityError::Exchange { .. } => {
                FailureKind::Transport
            }
            SecurityError::Rejected => FailureKind::Rejected,
            SecurityError::MalformedResponse => FailureKind::Malformed,
        }
    }
}
