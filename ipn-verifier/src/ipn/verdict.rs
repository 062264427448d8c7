//! PayPal's answer to a validation request.

use super::SecurityError;

/// Outcome of the echo handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Verified,
    /// PayPal explicitly rejected the payload.
    Invalid,
    /// The response contained neither token.
    Malformed,
}

impl Verdict {
    /// Scan the raw response, headers included, for the verdict tokens.
    ///
    /// PayPal's reply format has varied over time, so this is a plain
    /// substring search rather than a parse of the body line.
    pub fn from_response(response: &str) -> Self {
        if response.contains("VERIFIED") {
            Verdict::Verified
        } else if response.contains("INVALID") {
            Verdict::Invalid
        } else {
            Verdict::Malformed
        }
    }

    pub fn into_result(self) -> Result<(), SecurityError> {
        match self {
            Verdict::Verified => Ok(()),
            Verdict::Invalid => Err(SecurityError::Rejected),
            Verdict::Malformed => Err(SecurityError::MalformedResponse),
        }
    }
}
