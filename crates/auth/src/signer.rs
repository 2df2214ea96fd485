//! HMAC-SHA256 request signing.

use crate::credentials::ApiCredentials;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Request signer for authenticated venue calls.
pub struct RequestSigner<'a> {
    credentials: &'a ApiCredentials,
}

impl<'a> RequestSigner<'a> {
    /// Create a new request signer with the given credentials.
    pub fn new(credentials: &'a ApiCredentials) -> Self {
        Self { credentials }
    }

    /// HMAC-SHA256 of `message` with the secret key, lowercase hex.
    pub fn sign(&self, message: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.credentials.expose_secret().as_bytes())
            .expect("HMAC can take key of any size");

        mac.update(message.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Build a signed Binance query string, preserving parameter order.
    ///
    /// `timestamp` is appended last, then `signature` over everything before it.
    pub fn sign_params_ordered(&self, params: &[(&str, &str)], timestamp_ms: i64) -> String {
        let mut query_parts: Vec<String> =
            params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();

        query_parts.push(format!("timestamp={}", timestamp_ms));

        let query_string = query_parts.join("&");
        let signature = self.sign(&query_string);
        format!("{}&signature={}", query_string, signature)
    }

    /// BitMEX request signature.
    ///
    /// `path` must include the `/api/v1` prefix and the query string, exactly
    /// as sent on the wire. `body` is the raw request body (empty for GET).
    pub fn sign_bitmex(&self, verb: &str, path: &str, expires: i64, body: &str) -> String {
        self.sign(&format!("{}{}{}{}", verb, path, expires, body))
    }
}
