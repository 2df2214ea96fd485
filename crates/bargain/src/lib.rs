//! Position and order lifecycle manager.
//!
//! [`Bargain`] sits between the caller and one `ExchangeAdapter`:
//!
//! - **Close**: flatten the position with one market order, or do nothing
//!   when there is nothing to close
//! - **Cancel**: bulk-cancel every open order, idempotently
//! - **Status**: latest and historical status of a client order id, read
//!   from the reconciled execution ledger
//! - **Correlation**: client order ids of a source key, optionally inside a
//!   recent window
//! - **Portfolio**: exposure at fair and mark price over the configured
//!   contracts
//! - **Views**: named prices (with a jittered reference price cache) and
//!   balances in several units
//!
//! # Example
//!
//! ```rust,ignore
//! use bargain::{Bargain, BargainConfig, PriceKind};
//!
//! let bargain = Bargain::new(adapter, BargainConfig::from_env());
//!
//! if bargain.cancel_all_orders().await? {
//!     tracing::info!("Orders cancelled");
//! }
//! let index = bargain.price(&PriceKind::Index { force_live: false }).await?;
//! ```

mod config;
mod manager;
mod views;

#[cfg(test)]
mod mock;

pub use config::BargainConfig;
pub use manager::{Bargain, CloseOutcome, CLOSE_INSTRUCTION};
pub use views::{BalanceUnit, ParsePriceKindError, PriceKind};
