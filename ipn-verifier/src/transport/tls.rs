//! TLS connector backed by tokio-rustls.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tracing::{info, warn};

use super::{ConnectError, Connector};

/// Production connector: TCP connect followed by a rustls client handshake.
///
/// Cheap to clone; the rustls configuration is shared.
#[derive(Clone)]
pub struct TlsConnector {
    inner: tokio_rustls::TlsConnector,
}

impl TlsConnector {
    /// Create a connector trusting the bundled Mozilla root certificates.
    pub fn new() -> Self {
        let roots = RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        };

        let config = ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();

        Self {
            inner: tokio_rustls::TlsConnector::from(Arc::new(config)),
        }
    }
}

impl Default for TlsConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for TlsConnector {
    type Stream = TlsStream<TcpStream>;

    async fn open(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<Self::Stream, ConnectError> {
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|_| ConnectError::InvalidHostname(host.to_string()))?;

        info!(
            host = host,
            port = port,
            timeout_seconds = timeout.as_secs_f64(),
            "tls_connect_starting"
        );

        let connect = async {
            let tcp = TcpStream::connect((host, port)).await?;
            tcp.set_nodelay(true)?;
            self.inner.connect(server_name, tcp).await
        };

        match tokio::time::timeout(timeout, connect).await {
            Ok(Ok(stream)) => {
                info!(host = host, "tls_connect_complete");
                Ok(stream)
            }
            Ok(Err(e)) => {
                warn!(host = host, error = %e, "tls_connect_failed");
                Err(ConnectError::Io(e))
            }
            Err(_) => {
                warn!(
                    host = host,
                    timeout_seconds = timeout.as_secs_f64(),
                    "tls_connect_timeout"
                );
                Err(ConnectError::TimedOut(timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_rejects_invalid_hostname() {
        let connector = TlsConnector::new();

        let result = connector
            .open("not a host name", 443, Duration::from_secs(1))
            .await;

        assert!(matches!(result, Err(ConnectError::InvalidHostname(_))));
    }

    #[tokio::test]
    async fn test_open_refused_port_fails() {
        // Bind then drop to get a local port with nothing listening on it.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let connector = TlsConnector::new();
        let result = connector
            .open("localhost", port, Duration::from_secs(5))
            .await;

        assert!(result.is_err());
    }
}
