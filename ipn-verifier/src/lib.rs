//! PayPal IPN - verification of Instant Payment Notifications.
//!
//! PayPal posts transaction data to a merchant endpoint. Anyone can forge such a
//! POST, so each notification is echoed back to PayPal over TLS and only trusted
//! if PayPal answers `VERIFIED`.
//!
//! - `ipn`: classification, the echo handshake and verdict parsing
//! - `transport`: the `Connector` seam and its rustls implementation
//! - `web`: axum adapter used by the `paypal-ipn-web` binary
//!
//! ## Flow
//!
//! ```text
//! PayPal POST → web → IpnVerifier::process → Connector (TLS :443) → VERIFIED → handler
//! ```

pub mod config;
pub mod ipn;
pub mod transport;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use ipn::{
    FailureKind, IpnFields, IpnNotification, IpnVerifier, NotIpnReason, SecurityError, Verdict,
};
pub use transport::{ConnectError, Connector, TlsConnector};
pub use web::AppState;
