//! Binance REST API client and execution adapter.
//!
//! This crate provides:
//!
//! - **Time synchronization**: Adjusts for clock skew between local and server time
//! - **Order management**: Place, query, and cancel orders with proper signing
//! - **Symbol filters**: Lot size, tick size and min notional from exchange info
//! - **Adapter**: [`BinanceAdapter`] implements `ExchangeAdapter`, quantizing
//!   every order and emulating amend with cancel then place
//!
//! # Example
//!
//! ```rust,ignore
//! use auth::ApiCredentials;
//! use binance_rest::{BinanceAdapter, BinanceRestClient};
//! use common::{Environment, Venue};
//!
//! let credentials = ApiCredentials::from_env(Venue::Binance)?;
//! let client = BinanceRestClient::new(credentials, Environment::Testnet)?;
//! let adapter = BinanceAdapter::connect(client, "BTCUSDT").await?;
//!
//! let ack = adapter
//!     .place_order(&OrderRequest::limit(Side::Buy, dec!(0.001), dec!(50000)))
//!     .await?;
//! ```

mod adapter;
mod client;
mod error;
mod responses;

pub use adapter::BinanceAdapter;
pub use client::BinanceRestClient;
pub use error::BinanceRestError;
pub use responses::{
    AccountResponse, AssetBalance, BookTickerResponse, CancelOrderResponse, ExchangeInfoResponse,
    NewOrderResponse, OrderFill, OrderQueryResponse, ServerTimeResponse, SymbolInfo,
};
