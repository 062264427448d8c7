//! PayPal IPN receiver.
//!
//! Accepts Instant Payment Notifications on `POST /webhooks/paypal/ipn`, has
//! PayPal confirm each one over TLS, and logs the transactions it vouches for.

use std::future::pending;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use paypal_ipn::web::{router, AppState};
use paypal_ipn::{Config, IpnVerifier, TlsConnector};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::from_env();
    info!(
        port = config.port,
        allow_test_notifications = config.allow_test_notifications,
        connection_timeout_seconds = config.connection_timeout_seconds,
        "ipn_receiver_config_loaded"
    );

    let verifier = IpnVerifier::from_config(TlsConnector::new(), &config);
    let app = router(AppState::new(verifier));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind IPN receiver to {addr}"))?;

    info!(address = %addr, "ipn_receiver_listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown())
        .await
        .context("IPN receiver stopped with an error")?;

    info!("ipn_receiver_stopped");
    Ok(())
}

/// JSON logs, filtered by `RUST_LOG` (default `info`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();
}

/// Resolves on SIGINT or, on unix, SIGTERM.
///
/// A signal that cannot be hooked is logged and never fires.
async fn wait_for_shutdown() {
    let interrupt = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "sigint_handler_unavailable");
            pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "sigterm_handler_unavailable");
                pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = pending::<()>();

    let signal_name = tokio::select! {
        _ = interrupt => "SIGINT",
        _ = terminate => "SIGTERM",
    };

    info!(signal = signal_name, "ipn_receiver_shutting_down");
}
