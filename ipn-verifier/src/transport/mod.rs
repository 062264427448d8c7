//! Transport module for reaching PayPal.
//!
//! The verifier only needs an encrypted byte stream to a named host. This module
//! defines that seam and provides the production TLS implementation:
//! - `Connector`: opens one stream per verification call
//! - `TlsConnector`: TCP + rustls with the Mozilla root set
//!
//! There is no pooling and no retry; every stream is dropped after one exchange.

pub mod tls;

#[cfg(test)]
pub mod mock;

use std::future::Future;
use std::io;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};

pub use tls::TlsConnector;

/// Port PayPal accepts validation requests on.
pub const HTTPS_PORT: u16 = 443;

/// Failure to establish a stream to the remote host.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("invalid server name: {0}")]
    InvalidHostname(String),

    #[error("connection timed out after {0:?}")]
    TimedOut(Duration),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Opens encrypted streams to a host.
///
/// The returned stream is owned by a single verification call and released
/// when it is dropped.
pub trait Connector: Send + Sync {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;

    /// Connect to `host:port`, completing any handshake within `timeout`.
    fn open(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> impl Future<Output = Result<Self::Stream, ConnectError>> + Send;
}
