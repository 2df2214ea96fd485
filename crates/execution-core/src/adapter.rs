//! The capability surface every venue implements.

use crate::error::ExecutionError;
use crate::execution::RawExecution;
use crate::market::{Balance, Instrument, Position, PriceSnapshot};
use crate::order::{CancelTarget, OpenOrder, OrderAck, OrderAmend, OrderRequest};
use async_trait::async_trait;
use common::Venue;
use rust_decimal::Decimal;

/// Uniform order and account operations over one venue.
///
/// A venue that cannot offer a capability returns
/// [`ExecutionError::Unsupported`]; it never succeeds silently.
/// Venue failures come back as [`ExecutionError::Venue`] and are not retried.
#[async_trait]
pub trait ExchangeAdapter: Send + Sync {
    /// Venue this adapter talks to.
    fn venue(&self) -> Venue;

    /// Symbol orders are placed on.
    fn symbol(&self) -> &str;

    /// Submit a new order. Validation failures are returned before any
    /// request is sent.
    async fn place_order(&self, request: &OrderRequest) -> Result<OrderAck, ExecutionError>;

    /// Cancel one order, several orders, or everything matching a filter.
    async fn cancel_order(&self, target: &CancelTarget) -> Result<Vec<OrderAck>, ExecutionError>;

    /// Change a resting order. Venues without native amend cancel first and
    /// only place the replacement once the cancel has succeeded.
    async fn amend_order(
        &self,
        order_id: &str,
        amend: &OrderAmend,
    ) -> Result<OrderAck, ExecutionError>;

    /// Available funds in the settlement currency.
    async fn get_balance(&self) -> Result<Balance, ExecutionError>;

    async fn get_position(&self, symbol: &str) -> Result<Position, ExecutionError>;

    async fn get_prices(&self, symbol: &str) -> Result<PriceSnapshot, ExecutionError>;

    async fn get_open_orders(&self) -> Result<Vec<OpenOrder>, ExecutionError>;

    /// Execution history for the account, rows exactly as received.
    async fn get_executions(&self) -> Result<Vec<RawExecution>, ExecutionError>;

    async fn get_instrument(&self, symbol: &str) -> Result<Instrument, ExecutionError>;

    /// Price the index view is built from. Defaults to the mid price.
    async fn get_reference_price(&self, symbol: &str) -> Result<Decimal, ExecutionError> {
        self.get_prices(symbol).await?.mid()
    }
}
