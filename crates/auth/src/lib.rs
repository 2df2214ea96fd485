//! Authentication and signing for exchange APIs.
//!
//! - **Secure Credentials**: API secrets are wrapped in `SecretString` so they
//!   never show up in `Debug` output and are zeroed on drop.
//! - **HMAC-SHA256 Signing**: Binance signs the query string, BitMEX signs
//!   `verb + path + expires + body`. Both are hex encoded.
//! - **Environment Loading**: Credentials come from `<VENUE>_API_KEY` and
//!   `<VENUE>_SECRET_KEY`, optionally via a `.env` file.
//!
//! # Example
//!
//! ```rust,ignore
//! use auth::{ApiCredentials, RequestSigner};
//! use common::Venue;
//!
//! let credentials = ApiCredentials::from_env(Venue::Bitmex)?;
//! let signer = RequestSigner::new(&credentials);
//! let signature = signer.sign_bitmex("GET", "/api/v1/position", expires, "");
//! ```

mod credentials;
mod error;
mod signer;

pub use credentials::ApiCredentials;
pub use error::AuthError;
pub use signer::RequestSigner;
