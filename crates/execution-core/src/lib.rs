//! Order tracking and execution-state reconciliation.
//!
//! This crate holds everything the lifecycle manager needs that does not
//! touch the wire:
//!
//! - **Domain types**: `OrderRequest`, `OrderAck`, `OrderStatus`, `Position`,
//!   `Instrument`, `PriceSnapshot`
//! - **Adapter boundary**: the `ExchangeAdapter` trait every venue implements
//! - **Client order ids**: `ClientOrderIdCodec` composes ids and derives the
//!   `SourceKey` that groups orders issued for one logical trading action
//! - **Execution ledger**: `ExecutionLedger` turns a venue's execution
//!   history (which may mix record shapes) into a time-ordered table
//! - **Correlation**: `OrderCorrelator` finds which client order ids of a
//!   source key have executed, optionally inside a recent time window
//! - **Quantization**: `SymbolFilters` rounds quantity/price to venue steps
//! - **Reference price cache**: `RefPriceCache` with jittered refresh
//!
//! # Client order id layout
//!
//! ```text
//! mlk_EntryLong-S_C
//! └─┬┘└───┬───┘ │ └── target status marker (C = Canceled)
//!   │     │     └──── source type marker (S = primary, P = secondary)
//!   │     └────────── source name
//!   └──────────────── prefix
//!
//! SourceKey = "EntryLong-S"
//! ```

mod adapter;
mod client_order_id;
mod correlator;
mod error;
mod execution;
mod ledger;
mod market;
mod order;
mod portfolio;
mod price_cache;
mod quantize;

pub use adapter::ExchangeAdapter;
pub use client_order_id::{
    generate_client_order_id, status_for_marker, ClientOrderId, ClientOrderIdCodec, SourceKey,
};
pub use correlator::{OrderCorrelator, TimeWindow, DEFAULT_RECENT_WINDOW};
pub use error::{BatchReport, DiscardReason, DiscardedRecord, ExecutionError};
pub use execution::{ExecutionRecord, RawExecution, TRIGGERED_MARKER};
pub use ledger::{ExecutionLedger, Reconciled};
pub use market::{Balance, FutureType, Instrument, Position, PriceSnapshot};
pub use order::{CancelTarget, OpenOrder, OrderAck, OrderAmend, OrderRequest, OrderStatus, OrderType, Side};
pub use portfolio::{portfolio_delta, PortfolioDelta, PortfolioEntry};
pub use price_cache::{should_refresh, JitterRange, RefPriceCache};
pub use quantize::{round_to_tick, SymbolFilters};

pub use common::Venue;
