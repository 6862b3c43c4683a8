//! Request signing for the Alibaba Cloud DNS RPC API
//!
//! Every call is a signed GET. The signature covers the sorted,
//! percent-encoded query string:
//!
//! ```text
//! StringToSign = "GET" & encode("/") & encode(canonical query)
//! Signature    = base64(HMAC-SHA1(secret + "&", StringToSign))
//! ```
//!
//! The format must match the provider bit for bit; any deviation yields
//! `SignatureDoesNotMatch`.

use std::collections::BTreeMap;
use std::fmt;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use ddns_core::{Error, Result};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha1::Sha1;

/// DNS API version
pub const API_VERSION: &str = "2015-01-09";

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const SIGNATURE_VERSION: &str = "1.0";

/// Bytes left unescaped by the general-purpose encoder.
///
/// `*` is deliberately in this set; the string-to-sign escapes it in a
/// second pass.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'*');

type HmacSha1 = Hmac<Sha1>;

fn encode(value: &str) -> String {
    utf8_percent_encode(value, QUERY_ENCODE_SET).to_string()
}

fn encode_for_signing(value: &str) -> String {
    encode(value).replace('*', "%2A")
}

/// Builds fully authenticated request URLs
///
/// # Security
///
/// The Debug implementation does NOT expose the secret, and nothing here
/// logs the secret or a computed signature.
#[derive(Clone)]
pub struct RequestSigner {
    endpoint: String,
    access_key_id: String,
    /// ⚠️ NEVER log this value
    secret: String,
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field("secret", &"<REDACTED>")
            .finish()
    }
}

impl RequestSigner {
    pub fn new(
        endpoint: impl Into<String>,
        access_key_id: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            access_key_id: access_key_id.into(),
            secret: secret.into(),
        }
    }

    /// Sign `action` with `params` using the current time and a fresh nonce.
    ///
    /// Returns `endpoint?query&Signature=...`.
    pub fn sign(&self, action: &str, params: &BTreeMap<String, String>) -> Result<String> {
        let timestamp = chrono::Utc::now()
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string();
        let nonce = rand::random::<u64>().to_string();

        self.sign_with(action, params, &timestamp, &nonce)
    }

    /// Deterministic core of [`RequestSigner::sign`].
    pub fn sign_with(
        &self,
        action: &str,
        params: &BTreeMap<String, String>,
        timestamp: &str,
        nonce: &str,
    ) -> Result<String> {
        let query = self.canonical_query(action, params, timestamp, nonce);
        let signature = self.signature(&string_to_sign(&query))?;

        Ok(format!(
            "{}?{}&Signature={}",
            self.endpoint,
            query,
            encode(&signature)
        ))
    }

    /// Sorted, percent-encoded query string covering protocol and caller
    /// parameters.
    ///
    /// Caller parameters take precedence over protocol parameters of the
    /// same name.
    pub fn canonical_query(
        &self,
        action: &str,
        params: &BTreeMap<String, String>,
        timestamp: &str,
        nonce: &str,
    ) -> String {
        let mut merged: BTreeMap<&str, &str> = BTreeMap::from([
            ("Action", action),
            ("Format", "JSON"),
            ("Version", API_VERSION),
            ("AccessKeyId", self.access_key_id.as_str()),
            ("SignatureMethod", SIGNATURE_METHOD),
            ("Timestamp", timestamp),
            ("SignatureVersion", SIGNATURE_VERSION),
            ("SignatureNonce", nonce),
        ]);
        for (key, value) in params {
            merged.insert(key.as_str(), value.as_str());
        }

        merged
            .into_iter()
            .map(|(key, value)| format!("{}={}", encode(key), encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Base64 HMAC-SHA1 of `message`, keyed with `secret + "&"`
    fn signature(&self, message: &str) -> Result<String> {
        let key = format!("{}&", self.secret);
        let mut mac = HmacSha1::new_from_slice(key.as_bytes())
            .map_err(|e| Error::config(format!("Invalid signing key: {}", e)))?;
        mac.update(message.as_bytes());

        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }
}

/// The string the signature is computed over
pub fn string_to_sign(canonical_query: &str) -> String {
    format!(
        "GET&{}&{}",
        encode_for_signing("/"),
        encode_for_signing(canonical_query)
    )
}
