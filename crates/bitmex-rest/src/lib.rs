//! BitMEX REST API client and execution adapter.
//!
//! This crate provides:
//!
//! - **Signing**: `api-expires` / `api-key` / `api-signature` headers on
//!   every request
//! - **Order management**: place, amend (native PUT), bulk cancel and
//!   cancel-all with a filter
//! - **Account and market data**: margin, position, execution history,
//!   instrument and last index trade
//! - **Adapter**: [`BitmexAdapter`] implements `ExchangeAdapter`
//!
//! # Example
//!
//! ```rust,ignore
//! use auth::ApiCredentials;
//! use bitmex_rest::{BitmexAdapter, BitmexRestClient, BitmexSettings};
//! use common::{Environment, Venue};
//!
//! let settings = BitmexSettings::from_env();
//! let credentials = ApiCredentials::from_env(Venue::Bitmex)?;
//! let client = BitmexRestClient::new(credentials, Environment::Testnet, settings.timeout)?;
//! let adapter = BitmexAdapter::new(client, "XBTUSD", settings);
//! ```

mod adapter;
mod client;
mod error;
mod responses;
mod settings;

pub use adapter::{settlement_index, BitmexAdapter, POST_ONLY_INSTRUCTION};
pub use client::BitmexRestClient;
pub use error::BitmexRestError;
pub use responses::{
    AmendOrder, BitmexInstrument, BitmexOrder, BitmexPosition, ErrorDetail, ErrorResponse, Margin,
    NewOrder, TradePrice,
};
pub use settings::BitmexSettings;
