//! In-memory `ExchangeAdapter` for lifecycle tests.

use async_trait::async_trait;
use execution_core::{
    Balance, CancelTarget, ExchangeAdapter, ExecutionError, Instrument, OpenOrder, OrderAck,
    OrderAmend, OrderRequest, OrderStatus, Position, PriceSnapshot, RawExecution, Venue,
};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct MockAdapter {
    pub positions: Mutex<BTreeMap<String, Position>>,
    pub instruments: BTreeMap<String, Instrument>,
    pub open_orders: Mutex<Vec<OpenOrder>>,
    pub executions: Vec<RawExecution>,
    pub prices: PriceSnapshot,
    pub balance: Option<Balance>,
    pub reference_price: Mutex<Decimal>,
    pub fail_amend: bool,

    pub placed: Mutex<Vec<OrderRequest>>,
    pub cancels: Mutex<Vec<CancelTarget>>,
    pub reference_calls: AtomicUsize,
}

impl MockAdapter {
    pub fn with_position(self, position: Position) -> Self {
        self.positions.lock().insert(position.symbol.clone(), position);
        self
    }

    pub fn with_instrument(mut self, instrument: Instrument) -> Self {
        self.instruments.insert(instrument.symbol.clone(), instrument);
        self
    }

    pub fn with_open_orders(self, orders: Vec<OpenOrder>) -> Self {
        *self.open_orders.lock() = orders;
        self
    }

    pub fn with_executions(mut self, executions: Vec<RawExecution>) -> Self {
        self.executions = executions;
        self
    }

    pub fn with_prices(mut self, prices: PriceSnapshot) -> Self {
        self.prices = prices;
        self
    }

    pub fn with_balance(mut self, balance: Balance) -> Self {
        self.balance = Some(balance);
        self
    }

    pub fn with_reference_price(self, price: Decimal) -> Self {
        *self.reference_price.lock() = price;
        self
    }

    pub fn failing_amend(mut self) -> Self {
        self.fail_amend = true;
        self
    }

    pub fn placed(&self) -> Vec<OrderRequest> {
        self.placed.lock().clone()
    }

    pub fn cancels(&self) -> Vec<CancelTarget> {
        self.cancels.lock().clone()
    }

    pub fn reference_calls(&self) -> usize {
        self.reference_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExchangeAdapter for MockAdapter {
    fn venue(&self) -> Venue {
        Venue::Bitmex
    }

    fn symbol(&self) -> &str {
        "XBTUSD"
    }

    async fn place_order(&self, request: &OrderRequest) -> Result<OrderAck, ExecutionError> {
        request.validate()?;
        let mut placed = self.placed.lock();
        placed.push(request.clone());
        Ok(OrderAck::bare(format!("order-{}", placed.len()), OrderStatus::New))
    }

    async fn cancel_order(&self, target: &CancelTarget) -> Result<Vec<OrderAck>, ExecutionError> {
        self.cancels.lock().push(target.clone());

        let ids = target.order_ids();
        self.open_orders.lock().retain(|o| !ids.contains(&o.order_id));
        Ok(ids
            .iter()
            .map(|id| OrderAck::bare(id.clone(), OrderStatus::Canceled))
            .collect())
    }

    async fn amend_order(
        &self,
        order_id: &str,
        _amend: &OrderAmend,
    ) -> Result<OrderAck, ExecutionError> {
        if self.fail_amend {
            return Err(ExecutionError::venue(Venue::Bitmex, "cancel rejected"));
        }
        Ok(OrderAck::bare(order_id, OrderStatus::New))
    }

    async fn get_balance(&self) -> Result<Balance, ExecutionError> {
        self.balance
            .clone()
            .ok_or_else(|| ExecutionError::InvalidVenueData("no balance".into()))
    }

    async fn get_position(&self, symbol: &str) -> Result<Position, ExecutionError> {
        Ok(self
            .positions
            .lock()
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| Position::flat(symbol)))
    }

    async fn get_prices(&self, _symbol: &str) -> Result<PriceSnapshot, ExecutionError> {
        Ok(self.prices.clone())
    }

    async fn get_open_orders(&self) -> Result<Vec<OpenOrder>, ExecutionError> {
        Ok(self.open_orders.lock().clone())
    }

    async fn get_executions(&self) -> Result<Vec<RawExecution>, ExecutionError> {
        Ok(self.executions.clone())
    }

    async fn get_instrument(&self, symbol: &str) -> Result<Instrument, ExecutionError> {
        self.instruments
            .get(symbol)
            .cloned()
            .ok_or_else(|| ExecutionError::InvalidVenueData(format!("no instrument {}", symbol)))
    }

    async fn get_reference_price(&self, _symbol: &str) -> Result<Decimal, ExecutionError> {
        self.reference_calls.fetch_add(1, Ordering::SeqCst);
        Ok(*self.reference_price.lock())
    }
}
