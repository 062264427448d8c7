//! Inbound notification data and the cheap local checks run before any network I/O.

use std::fmt;

use percent_encoding::percent_decode;
use url::form_urlencoded;

use super::{PROVIDER_NAME, TEST_IPN_FIELD, TRANSACTION_ID_FIELD, VALIDATE_COMMAND};

/// Posted form fields, in the order PayPal sent them.
///
/// Names and values are kept as decoded bytes: PayPal posts in the merchant's
/// account charset (often windows-1252), and the validation query has to echo
/// those bytes back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IpnFields(Vec<(Vec<u8>, Vec<u8>)>);

impl IpnFields {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self::from_iter(pairs)
    }

    /// Decode an `application/x-www-form-urlencoded` body without any
    /// charset conversion.
    pub fn from_urlencoded(body: &[u8]) -> Self {
        let pairs = body
            .split(|&b| b == b'&')
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                let mut parts = segment.splitn(2, |&b| b == b'=');
                let name = parts.next().unwrap_or_default();
                let value = parts.next().unwrap_or_default();
                (decode_component(name), decode_component(value))
            })
            .collect();

        Self(pairs)
    }

    /// First value posted under `name`, if it is valid UTF-8.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_bytes(name)
            .and_then(|value| std::str::from_utf8(value).ok())
    }

    /// First value posted under `name`, as received.
    pub fn get_bytes(&self, name: &str) -> Option<&[u8]> {
        self.0
            .iter()
            .find(|(key, _)| key.as_slice() == name.as_bytes())
            .map(|(_, value)| value.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get_bytes(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.0.iter().map(|(k, v)| (k.as_slice(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether PayPal flagged this as a sandbox/simulator notification.
    ///
    /// Empty and `"0"` count as not set.
    pub fn is_test(&self) -> bool {
        matches!(self.get_bytes(TEST_IPN_FIELD), Some(v) if !v.is_empty() && v != b"0")
    }

    /// Encode the fields followed by `cmd=_notify-validate`.
    pub fn validation_query(&self) -> String {
        let mut query = String::new();

        for (name, value) in self.iter() {
            query.extend(form_urlencoded::byte_serialize(name));
            query.push('=');
            query.extend(form_urlencoded::byte_serialize(value));
            query.push('&');
        }

        query.push_str(VALIDATE_COMMAND);
        query
    }
}

/// `+` is a space; everything else is plain percent-decoding.
fn decode_component(raw: &[u8]) -> Vec<u8> {
    let unplussed: Vec<u8> = raw
        .iter()
        .map(|&b| if b == b'+' { b' ' } else { b })
        .collect();

    percent_decode(&unplussed).collect()
}

impl<K: Into<Vec<u8>>, V: Into<Vec<u8>>> FromIterator<(K, V)> for IpnFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// One webhook delivery as handed over by the HTTP layer.
#[derive(Debug, Clone)]
pub struct IpnNotification {
    pub method: String,
    pub user_agent: String,
    pub fields: IpnFields,
}

/// Why a request was not treated as an IPN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotIpnReason {
    NotPost,
    UnknownUserAgent,
    MissingTransactionId,
}

impl fmt::Display for NotIpnReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            NotIpnReason::NotPost => "not_post",
            NotIpnReason::UnknownUserAgent => "unknown_user_agent",
            NotIpnReason::MissingTransactionId => "missing_txn_id",
        };
        f.write_str(reason)
    }
}

impl IpnNotification {
    pub fn new(
        method: impl Into<String>,
        user_agent: impl Into<String>,
        fields: IpnFields,
    ) -> Self {
        Self {
            method: method.into(),
            user_agent: user_agent.into(),
            fields,
        }
    }

    /// Heuristics that discard unrelated traffic without a round trip to PayPal.
    pub fn classify(&self) -> Result<(), NotIpnReason> {
        if self.method != "POST" {
            return Err(NotIpnReason::NotPost);
        }

        if !self.user_agent.contains(PROVIDER_NAME) {
            return Err(NotIpnReason::UnknownUserAgent);
        }

        if !self.fields.contains(TRANSACTION_ID_FIELD) {
            return Err(NotIpnReason::MissingTransactionId);
        }

        Ok(())
    }
}
