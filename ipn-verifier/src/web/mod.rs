//! Web server module for receiving PayPal IPNs.
//!
//! This module provides a thin HTTP adapter that:
//! - Receives IPN posts from PayPal
//! - Hands method, user agent and form fields to the verifier
//! - Maps the verification outcome to a status code
//!
//! All protocol logic lives in `crate::ipn`.

pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::transport::Connector;

pub use handlers::{health, paypal_ipn, AppState, HealthResponse, IpnResponse};

/// Build the router serving the health check and the IPN endpoint.
pub fn router<C: Connector + 'static>(state: AppState<C>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhooks/paypal/ipn", post(paypal_ipn::<C>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
