//! PayPal Instant Payment Notification verification.
//!
//! A notification is only trusted after PayPal itself confirms it:
//!
//! ```text
//! request → classify → connect (prod | sandbox) → echo payload → VERIFIED? → handler
//! ```
//!
//! Anything that fails classification is ignored (`Ok(false)`); anything that
//! fails after that is a `SecurityError`.

pub mod error;
pub mod notification;
pub mod verdict;
pub mod verifier;

pub use error::{FailureKind, SecurityError};
pub use notification::{IpnFields, IpnNotification, NotIpnReason};
pub use verdict::Verdict;
pub use verifier::IpnVerifier;

/// Substring every genuine IPN user agent contains.
pub const PROVIDER_NAME: &str = "PayPal";

/// Field every IPN we act on carries.
pub const TRANSACTION_ID_FIELD: &str = "txn_id";

/// Field PayPal sets on notifications from the sandbox or IPN simulator.
pub const TEST_IPN_FIELD: &str = "test_ipn";

pub const PRODUCTION_HOST: &str = "www.paypal.com";
pub const SANDBOX_HOST: &str = "www.sandbox.paypal.com";

/// Path of the validation endpoint on either host.
pub const VALIDATE_PATH: &str = "/cgi-bin/webscr";

/// Appended to the echoed payload to ask PayPal for a verdict.
pub const VALIDATE_COMMAND: &str = "cmd=_notify-validate";
