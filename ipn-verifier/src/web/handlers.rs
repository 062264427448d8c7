//! IPN endpoint handlers.
//!
//! The handler only adapts the HTTP request into an `IpnNotification`, runs the
//! verifier, and maps the outcome to a status code. PayPal redelivers on any
//! non-2xx answer, so transport failures return 503 while forgeries return 4xx.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::ipn::{FailureKind, IpnFields, IpnNotification, IpnVerifier, SecurityError};
use crate::transport::Connector;

/// Shared application state.
pub struct AppState<C> {
    pub verifier: Arc<IpnVerifier<C>>,
}

impl<C> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            verifier: Arc::clone(&self.verifier),
        }
    }
}

impl<C: Connector> AppState<C> {
    pub fn new(verifier: IpnVerifier<C>) -> Self {
        Self {
            verifier: Arc::new(verifier),
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// PayPal IPN
// =============================================================================

/// IPN endpoint response.
#[derive(Debug, Serialize)]
pub struct IpnResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub txn_id: Option<String>,
}

/// PayPal IPN endpoint.
///
/// This endpoint:
/// 1. Decodes the form body, keeping PayPal's field order
/// 2. Verifies the notification with PayPal
/// 3. Logs the verified transaction
pub async fn paypal_ipn<C: Connector + 'static>(
    State(state): State<AppState<C>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let notification =
        IpnNotification::new(method.as_str(), user_agent, IpnFields::from_urlencoded(&body));
    let txn_id = notification.fields.get("txn_id").map(str::to_string);

    let result = state
        .verifier
        .process(&notification, log_verified_transaction)
        .await;

    let (status, body_status) = match result {
        Ok(true) => (StatusCode::OK, "verified"),
        Ok(false) => (StatusCode::BAD_REQUEST, "not_ipn"),
        Err(e) => failure_response(&e, txn_id.as_deref()),
    };

    (
        status,
        Json(IpnResponse {
            status: body_status,
            txn_id,
        }),
    )
}

/// Record a verified transaction.
fn log_verified_transaction(fields: &IpnFields) {
    info!(
        txn_id = fields.get("txn_id").unwrap_or_default(),
        txn_type = fields.get("txn_type").unwrap_or_default(),
        payment_status = fields.get("payment_status").unwrap_or_default(),
        receiver_email = fields.get("receiver_email").unwrap_or_default(),
        mc_gross = fields.get("mc_gross").unwrap_or_default(),
        mc_currency = fields.get("mc_currency").unwrap_or_default(),
        "ipn_transaction_verified"
    );
}

fn failure_response(err: &SecurityError, txn_id: Option<&str>) -> (StatusCode, &'static str) {
    match err.kind() {
        FailureKind::PolicyViolation => {
            warn!(txn_id = ?txn_id, error = %err, "ipn_policy_violation");
            (StatusCode::FORBIDDEN, "sandbox_disallowed")
        }
        FailureKind::Transport => {
            error!(txn_id = ?txn_id, error = %err, "ipn_verification_unavailable");
            (StatusCode::SERVICE_UNAVAILABLE, "verification_unavailable")
        }
        FailureKind::Rejected => {
            error!(txn_id = ?txn_id, error = %err, "ipn_forgery_suspected");
            (StatusCode::BAD_REQUEST, "rejected")
        }
        FailureKind::Malformed => {
            error!(txn_id = ?txn_id, error = %err, "ipn_verification_inconclusive");
            (StatusCode::BAD_REQUEST, "malformed_response")
        }
    }
}
