//! Generic REST client infrastructure.
//!
//! A thin wrapper around `reqwest` shared by every venue crate:
//!
//! - One request path for all verbs, with optional query, body and headers
//! - JSON response deserialization
//! - Rate limit detection (HTTP 429)
//! - Error bodies preserved verbatim so venue crates can classify them
//!
//! # Example
//!
//! ```rust,ignore
//! use rest_client::RestClient;
//!
//! let client = RestClient::with_default_timeout("https://www.bitmex.com")?;
//! let instruments: Vec<serde_json::Value> =
//!     client.get("/api/v1/instrument", Some("symbol=XBTUSD"), None).await?;
//! ```

mod client;
mod error;

pub use client::RestClient;
pub use error::RestError;
pub use reqwest::Method;
