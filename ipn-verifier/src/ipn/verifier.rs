//! The IPN verifier.
//!
//! Every notification gets its own end-to-end check against PayPal:
//! 1. Classify the request locally (method, user agent, `txn_id`)
//! 2. Pick the production or sandbox host, enforcing the test-notification policy
//! 3. Echo the fields back over a fresh TLS stream with `cmd=_notify-validate`
//! 4. Read the whole response and look for `VERIFIED` / `INVALID`
//! 5. Hand the original fields to the caller only on `VERIFIED`

use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{error, info, warn};

use super::{
    IpnFields, IpnNotification, SecurityError, Verdict, PRODUCTION_HOST, SANDBOX_HOST,
    TRANSACTION_ID_FIELD, VALIDATE_PATH,
};
use crate::config::{Config, DEFAULT_CONNECTION_TIMEOUT_SECONDS};
use crate::transport::{Connector, HTTPS_PORT};

/// Verifies PayPal IPNs through a `Connector`.
///
/// Settings are read-only once the verifier is shared; concurrent calls each
/// open their own stream.
#[derive(Debug, Clone)]
pub struct IpnVerifier<C> {
    connector: C,
    allow_test_notifications: bool,
    connection_timeout_seconds: u64,
}

impl<C: Connector> IpnVerifier<C> {
    /// Create a verifier that rejects sandbox notifications and waits up to
    /// 120 seconds for PayPal.
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            allow_test_notifications: false,
            connection_timeout_seconds: DEFAULT_CONNECTION_TIMEOUT_SECONDS,
        }
    }

    pub fn from_config(connector: C, config: &Config) -> Self {
        Self::new(connector)
            .enable_test_notifications(config.allow_test_notifications)
            .with_connection_timeout(config.connection_timeout_seconds)
    }

    /// Accept notifications from the PayPal sandbox and IPN simulator.
    pub fn enable_test_notifications(mut self, enable: bool) -> Self {
        self.allow_test_notifications = enable;
        self
    }

    pub fn with_connection_timeout(mut self, seconds: u64) -> Self {
        self.connection_timeout_seconds = seconds;
        self
    }

    pub fn allows_test_notifications(&self) -> bool {
        self.allow_test_notifications
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_seconds)
    }

    /// Verify `notification` and, if PayPal confirms it, call `handler` with
    /// the original fields.
    ///
    /// Returns `Ok(false)` when the request does not look like an IPN at all,
    /// `Ok(true)` once the handler has run. Every verification failure is a
    /// `SecurityError`; nothing is retried.
    pub async fn process<F, R>(
        &self,
        notification: &IpnNotification,
        handler: F,
    ) -> Result<bool, SecurityError>
    where
        F: FnOnce(&IpnFields) -> R,
    {
        if let Err(reason) = notification.classify() {
            info!(
                method = %notification.method,
                user_agent = %notification.user_agent,
                reason = %reason,
                "ipn_not_recognized"
            );
            return Ok(false);
        }

        let txn_id = notification
            .fields
            .get(TRANSACTION_ID_FIELD)
            .unwrap_or_default();

        info!(
            txn_id = txn_id,
            field_count = notification.fields.len(),
            is_test = notification.fields.is_test(),
            "ipn_received"
        );

        self.validate_request(&notification.fields).await?;

        info!(txn_id = txn_id, "ipn_verified");

        handler(&notification.fields);

        Ok(true)
    }

    /// Run the echo handshake with PayPal for `fields`.
    async fn validate_request(&self, fields: &IpnFields) -> Result<(), SecurityError> {
        let host = self.target_host(fields)?;
        let timeout = self.connection_timeout();

        info!(
            host = host,
            timeout_seconds = self.connection_timeout_seconds,
            "ipn_provider_connecting"
        );

        let stream = self
            .connector
            .open(host, HTTPS_PORT, timeout)
            .await
            .map_err(|e| {
                error!(host = host, error = %e, "ipn_provider_unreachable");
                SecurityError::Unreachable {
                    host: host.to_string(),
                    source: e,
                }
            })?;

        let query = fields.validation_query();

        // The stream moves into the exchange and is dropped when it finishes,
        // times out, or fails.
        let response = match tokio::time::timeout(timeout, exchange(stream, host, &query)).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "timed out waiting for validation response",
            )),
        }
        .map_err(|e| {
            error!(host = host, error = %e, "ipn_provider_exchange_failed");
            SecurityError::Exchange {
                host: host.to_string(),
                source: e,
            }
        })?;

        let verdict = Verdict::from_response(&response);
        match verdict {
            Verdict::Verified => {}
            Verdict::Invalid => warn!(host = host, "ipn_rejected"),
            Verdict::Malformed => warn!(
                host = host,
                response_length = response.len(),
                response_preview = &response[..floor_char_boundary(&response, 200)],
                "ipn_malformed_response"
            ),
        }

        verdict.into_result()
    }

    /// Production unless the notification is flagged as a test; test
    /// notifications must be explicitly allowed.
    fn target_host(&self, fields: &IpnFields) -> Result<&'static str, SecurityError> {
        if !fields.is_test() {
            return Ok(PRODUCTION_HOST);
        }

        if !self.allow_test_notifications {
            warn!(
                txn_id = fields.get(TRANSACTION_ID_FIELD).unwrap_or_default(),
                "ipn_sandbox_disallowed"
            );
            return Err(SecurityError::SandboxDisallowed);
        }

        Ok(SANDBOX_HOST)
    }
}

/// Write the validation request and read the reply until end-of-stream.
async fn exchange<S>(mut stream: S, host: &str, query: &str) -> io::Result<String>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = format!(
        "POST {VALIDATE_PATH} HTTP/1.1\n\
         Host: {host}\n\
         Content-type: application/x-www-form-urlencoded\n\
         Content-length: {}\n\
         \n\
         {query}",
        query.len()
    );

    // No newline after the body: exactly Content-length bytes follow the headers.
    stream.write_all(request.as_bytes()).await?;
    stream.flush().await?;

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await?;

    info!(host = host, response_length = response.len(), "ipn_provider_responded");

    Ok(String::from_utf8_lossy(&response).into_owned())
}

/// Largest index <= `max` that falls on a char boundary of `s`.
fn floor_char_boundary(s: &str, max: usize) -> usize {
    if max >= s.len() {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}
