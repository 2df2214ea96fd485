//! Kraken adapter placeholder.
//!
//! [`KrakenAdapter`] declares the full `ExchangeAdapter` surface with no live
//! integration behind it: every capability returns
//! `ExecutionError::Unsupported`.

use async_trait::async_trait;
use execution_core::{
    Balance, CancelTarget, ExchangeAdapter, ExecutionError, Instrument, OpenOrder, OrderAck,
    OrderAmend, OrderRequest, Position, PriceSnapshot, RawExecution, Venue,
};
use rust_decimal::Decimal;
use tracing::warn;

/// Adapter for Kraken with no capability implemented.
#[derive(Debug, Clone)]
pub struct KrakenAdapter {
    symbol: String,
}

impl KrakenAdapter {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
        }
    }

    fn unsupported(&self, operation: &'static str) -> ExecutionError {
        warn!(venue = %Venue::Kraken, symbol = %self.symbol, operation, "Unsupported operation");
        ExecutionError::unsupported(Venue::Kraken, operation)
    }
}

#[async_trait]
impl ExchangeAdapter for KrakenAdapter {
    fn venue(&self) -> Venue {
        Venue::Kraken
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }

    async fn place_order(&self, _request: &OrderRequest) -> Result<OrderAck, ExecutionError> {
        Err(self.unsupported("place_order"))
    }

    async fn cancel_order(&self, _target: &CancelTarget) -> Result<Vec<OrderAck>, ExecutionError> {
        Err(self.unsupported("cancel_order"))
    }

    async fn amend_order(
        &self,
        _order_id: &str,
        _amend: &OrderAmend,
    ) -> Result<OrderAck, ExecutionError> {
        Err(self.unsupported("amend_order"))
    }

    async fn get_balance(&self) -> Result<Balance, ExecutionError> {
        Err(self.unsupported("get_balance"))
    }

    async fn get_position(&self, _symbol: &str) -> Result<Position, ExecutionError> {
        Err(self.unsupported("get_position"))
    }

    async fn get_prices(&self, _symbol: &str) -> Result<PriceSnapshot, ExecutionError> {
        Err(self.unsupported("get_prices"))
    }

    async fn get_open_orders(&self) -> Result<Vec<OpenOrder>, ExecutionError> {
        Err(self.unsupported("get_open_orders"))
    }

    async fn get_executions(&self) -> Result<Vec<RawExecution>, ExecutionError> {
        Err(self.unsupported("get_executions"))
    }

    async fn get_instrument(&self, _symbol: &str) -> Result<Instrument, ExecutionError> {
        Err(self.unsupported("get_instrument"))
    }

    async fn get_reference_price(&self, _symbol: &str) -> Result<Decimal, ExecutionError> {
        Err(self.unsupported("get_reference_price"))
    }
}
