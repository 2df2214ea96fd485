//! Order lifecycle manager over one exchange adapter.

use crate::config::BargainConfig;
use crate::views::{BalanceUnit, PriceKind};
use chrono::Utc;
use execution_core::{
    portfolio_delta, round_to_tick, CancelTarget, ClientOrderIdCodec, ExchangeAdapter,
    ExecutionError, ExecutionLedger, ExecutionRecord, Instrument, OpenOrder, OrderAck, OrderAmend,
    OrderCorrelator, OrderRequest, OrderStatus, PortfolioDelta, PortfolioEntry, PriceSnapshot,
    RefPriceCache, Side, SourceKey,
};
use metrics::{create_metrics, SharedMetrics};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Execution instruction of a position-closing order.
pub const CLOSE_INSTRUCTION: &str = "Close";

/// Satoshi per XBT.
const SATOSHI: Decimal = Decimal::from_parts(1, 0, 0, false, 8);

/// Balance currency reported in satoshi (BitMEX margin).
const SATOSHI_CURRENCY: &str = "XBt";

/// Balance currencies already valued in USD.
const USD_CURRENCIES: [&str; 5] = ["USD", "USDT", "USDC", "BUSD", "FDUSD"];

/// What a close request did.
#[derive(Debug, Clone, PartialEq)]
pub enum CloseOutcome {
    /// An offsetting market order was sent.
    Placed(OrderAck),
    /// Nothing to close.
    NoOp,
}

impl CloseOutcome {
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::NoOp)
    }
}

/// Position and order lifecycle manager for one symbol on one venue.
///
/// Holds no order state of its own: every decision is made from a fresh
/// venue query. The only cached value is the reference price.
pub struct Bargain {
    adapter: Arc<dyn ExchangeAdapter>,
    config: BargainConfig,
    codec: ClientOrderIdCodec,
    ref_price: Mutex<RefPriceCache>,
    metrics: SharedMetrics,
}

impl Bargain {
    pub fn new(adapter: Arc<dyn ExchangeAdapter>, config: BargainConfig) -> Self {
        Self {
            codec: ClientOrderIdCodec::new(config.order_id_prefix.clone()),
            ref_price: Mutex::new(RefPriceCache::new(config.ref_price_jitter)),
            metrics: create_metrics(),
            adapter,
            config,
        }
    }

    /// Builder method to share a metrics handle.
    pub fn with_metrics(mut self, metrics: SharedMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn adapter(&self) -> &Arc<dyn ExchangeAdapter> {
        &self.adapter
    }

    pub fn config(&self) -> &BargainConfig {
        &self.config
    }

    pub fn codec(&self) -> &ClientOrderIdCodec {
        &self.codec
    }

    pub fn metrics(&self) -> &SharedMetrics {
        &self.metrics
    }

    // ========================================================================
    // Orders
    // ========================================================================

    /// Flatten the position with one market order.
    ///
    /// `quantity` is taken off the close: the order covers
    /// `|currentQty| - |quantity|`. A quantity above `|currentQty|` counts as
    /// zero, so the whole position is closed. A zero offset sends nothing.
    pub async fn close_position(
        &self,
        quantity: Option<Decimal>,
    ) -> Result<CloseOutcome, ExecutionError> {
        let symbol = &self.config.symbol;
        let position = self.adapter.get_position(symbol).await?;

        let mut remaining = position.current_qty;
        let keep = match quantity {
            Some(q) if q.abs() <= remaining.abs() => q.abs(),
            _ => Decimal::ZERO,
        };
        if remaining < Decimal::ZERO {
            remaining += keep;
        } else if remaining > Decimal::ZERO {
            remaining -= keep;
        }

        let Some((side, size)) = Side::from_signed(-remaining) else {
            warn!(
                symbol = %symbol,
                current_qty = %position.current_qty,
                quantity = ?quantity,
                "No position to close"
            );
            self.metrics.inc_noop_closes();
            return Ok(CloseOutcome::NoOp);
        };

        info!(
            symbol = %symbol,
            current_qty = %position.current_qty,
            side = ?side,
            size = %size,
            "Closing position"
        );

        let request = OrderRequest::market(side, size).with_execution_instruction(CLOSE_INSTRUCTION);
        let ack = self.adapter.place_order(&request).await?;
        self.metrics.inc_orders_placed();

        Ok(CloseOutcome::Placed(ack))
    }

    /// Close the position; with a quantity, cancel every open order first.
    pub async fn cancel_and_close(
        &self,
        quantity: Option<Decimal>,
    ) -> Result<CloseOutcome, ExecutionError> {
        if quantity.is_some() {
            self.cancel_all_orders().await?;
        }
        self.close_position(quantity).await
    }

    /// Cancel every open order in one bulk call.
    ///
    /// Returns `false`, without a cancel call, when nothing is open.
    pub async fn cancel_all_orders(&self) -> Result<bool, ExecutionError> {
        let ids: Vec<String> = self
            .adapter
            .get_open_orders()
            .await?
            .into_iter()
            .map(|o| o.order_id)
            .collect();

        if ids.is_empty() {
            debug!(symbol = %self.config.symbol, "No open orders to cancel");
            return Ok(false);
        }

        info!(symbol = %self.config.symbol, count = ids.len(), "Canceling all orders");
        let acks = self.adapter.cancel_order(&CancelTarget::Many(ids)).await?;
        self.metrics.add_cancels(acks.len() as u64);

        Ok(true)
    }

    /// Amend a resting order through the adapter.
    pub async fn amend_order(
        &self,
        order_id: &str,
        amend: &OrderAmend,
    ) -> Result<OrderAck, ExecutionError> {
        match self.adapter.amend_order(order_id, amend).await {
            Ok(ack) => Ok(ack),
            Err(e) => {
                warn!(order_id = %order_id, error = %e, "Amend failed");
                self.metrics.inc_amend_failures();
                Err(e)
            }
        }
    }

    // ========================================================================
    // Executions
    // ========================================================================

    /// Fetch and reconcile the execution history.
    async fn ledger(&self) -> Result<ExecutionLedger, ExecutionError> {
        let reconciled = ExecutionLedger::reconcile(self.adapter.get_executions().await?);

        if let Some(report) = &reconciled.report {
            self.metrics
                .add_discarded_executions(report.discarded_count() as u64);
        }

        if self.config.strict_execution_batches {
            reconciled.strict()
        } else {
            Ok(reconciled.into_ledger())
        }
    }

    /// Executions oldest first, for one client order id or all of them.
    pub async fn execution(
        &self,
        client_order_id: Option<&str>,
    ) -> Result<Vec<ExecutionRecord>, ExecutionError> {
        let ledger = self.ledger().await?;
        Ok(ledger.select(client_order_id).into_iter().cloned().collect())
    }

    /// Source key of a client order id.
    pub fn source_key(&self, client_order_id: &str) -> SourceKey {
        self.codec.parse(client_order_id)
    }

    /// Every client order id of `key` in the execution history.
    pub async fn exec_client_ids_with(
        &self,
        key: &SourceKey,
    ) -> Result<Vec<String>, ExecutionError> {
        let ledger = self.ledger().await?;
        Ok(OrderCorrelator::new(&self.codec).correlate(&ledger, key, None))
    }

    /// Client order ids of `key` executed inside the recent window
    /// (`recent_window` from the config unless given).
    pub async fn find_recent_by_key(
        &self,
        key: &SourceKey,
        window: Option<Duration>,
    ) -> Result<Vec<String>, ExecutionError> {
        let ledger = self.ledger().await?;
        let window = window.unwrap_or(self.config.recent_window);

        let ids = OrderCorrelator::new(&self.codec).find_recent_by_key(
            &ledger,
            key,
            Utc::now(),
            Some(window),
        );
        debug!(key = %key, window_secs = window.as_secs(), found = ids.len(), "Recent executions");
        Ok(ids)
    }

    /// Whether the latest execution of an order shows `status`.
    pub async fn order_reached_status(
        &self,
        client_order_id: &str,
        status: OrderStatus,
    ) -> Result<bool, ExecutionError> {
        self.ledger()
            .await?
            .has_reached_status(client_order_id, status)
    }

    /// Whether any execution of an order showed `status`.
    pub async fn order_had_status(
        &self,
        client_order_id: &str,
        status: OrderStatus,
    ) -> Result<bool, ExecutionError> {
        Ok(self
            .ledger()
            .await?
            .has_ever_had_status(client_order_id, status))
    }

    // ========================================================================
    // Open orders
    // ========================================================================

    pub async fn open_orders(&self) -> Result<Vec<OpenOrder>, ExecutionError> {
        self.adapter.get_open_orders().await
    }

    pub async fn has_open_orders(&self) -> Result<bool, ExecutionError> {
        Ok(!self.open_orders().await?.is_empty())
    }

    /// Whether an order, by venue or client order id, is still open.
    pub async fn order_is_open(&self, id: &str) -> Result<bool, ExecutionError> {
        Ok(self
            .open_orders()
            .await?
            .iter()
            .any(|o| o.order_id == id || o.client_order_id == id))
    }

    // ========================================================================
    // Portfolio and account
    // ========================================================================

    /// Exposure over every configured contract at fair and mark price.
    pub async fn portfolio_delta(&self) -> Result<PortfolioDelta, ExecutionError> {
        let mut entries = Vec::with_capacity(self.config.contracts.len());

        for symbol in &self.config.contracts {
            let instrument = self.adapter.get_instrument(symbol).await?;
            let position = self.adapter.get_position(symbol).await?;
            entries.push(PortfolioEntry::new(instrument, position.current_qty));
        }

        let delta = portfolio_delta(&entries)?;
        debug!(
            contracts = entries.len(),
            fair = %delta.fair_price,
            mark = %delta.mark_price,
            basis = %delta.basis,
            "Portfolio delta"
        );
        Ok(delta)
    }

    /// Position leverage; 1 when the venue reports none.
    pub async fn leverage(&self) -> Result<Decimal, ExecutionError> {
        let position = self.adapter.get_position(&self.config.symbol).await?;
        Ok(position.leverage.unwrap_or(Decimal::ONE))
    }

    /// Contract multiplier in settlement units.
    pub async fn multiplier(&self) -> Result<Decimal, ExecutionError> {
        Ok(self
            .adapter
            .get_instrument(&self.config.symbol)
            .await?
            .multiplier)
    }

    /// Available balance in the requested unit.
    ///
    /// Satoshi balances convert to XBT. USD-valued balances have no XBT
    /// view and are their own USD value.
    pub async fn balance(&self, unit: &BalanceUnit) -> Result<Decimal, ExecutionError> {
        let balance = self.adapter.get_balance().await?;
        let native = balance.available * self.leverage().await?;

        let xbt = match balance.currency.as_str() {
            SATOSHI_CURRENCY => Some(native * SATOSHI),
            "XBT" => Some(native),
            _ => None,
        };

        match unit {
            BalanceUnit::Native => Ok(native),
            BalanceUnit::Xbt => {
                xbt.ok_or_else(|| ExecutionError::unsupported(self.adapter.venue(), "xbt balance"))
            }
            BalanceUnit::Usd(kind) => match xbt {
                Some(xbt) => Ok(xbt * self.price(kind).await?),
                None if USD_CURRENCIES.contains(&balance.currency.as_str()) => Ok(native),
                None => Ok(native * self.price(kind).await?),
            },
        }
    }

    // ========================================================================
    // Prices
    // ========================================================================

    /// A price view, rounded to the symbol's tick.
    pub async fn price(&self, kind: &PriceKind) -> Result<Decimal, ExecutionError> {
        let value = match kind {
            PriceKind::Index { force_live } => self.index_price(*force_live).await?,
            PriceKind::RefDelta => self.prices().await?.mid()? - self.index_price(false).await?,
            PriceKind::Spread => {
                let prices = self.prices().await?;
                prices.ask()? - prices.bid()?
            }
            PriceKind::Last(Side::Buy) | PriceKind::MarketMaker(Side::Sell) => {
                self.prices().await?.ask()?
            }
            PriceKind::Last(Side::Sell) | PriceKind::MarketMaker(Side::Buy) => {
                self.prices().await?.bid()?
            }
            PriceKind::Mark => self.prices().await?.mark()?,
            PriceKind::Mid => self.prices().await?.mid()?,
            PriceKind::Named(name) => self.prices().await?.get(name)?,
        };

        Ok(round_to_tick(value, self.tick_size().await))
    }

    /// Venue tick of the traded symbol, else the configured tick.
    async fn tick_size(&self) -> Decimal {
        match self.adapter.get_instrument(&self.config.symbol).await {
            Ok(Instrument {
                tick_size: Some(tick),
                ..
            }) if tick > Decimal::ZERO => tick,
            Ok(_) => self.config.tick_size,
            Err(e) => {
                debug!(symbol = %self.config.symbol, error = %e, "No venue tick, using configured tick");
                self.config.tick_size
            }
        }
    }

    async fn prices(&self) -> Result<PriceSnapshot, ExecutionError> {
        self.adapter.get_prices(&self.config.symbol).await
    }

    /// Reference price, fetched again once the jittered interval has passed.
    ///
    /// The cache lock is held across the fetch so concurrent callers share
    /// one venue call.
    async fn index_price(&self, force_live: bool) -> Result<Decimal, ExecutionError> {
        let mut cache = self.ref_price.lock().await;
        let now = Utc::now();

        let stale = force_live || cache.needs_refresh(now, &mut rand::thread_rng());
        if stale {
            let value = self
                .adapter
                .get_reference_price(&self.config.symbol)
                .await?;
            cache.store(value, now);
            self.metrics.inc_ref_price_refreshes();
            debug!(symbol = %self.config.symbol, price = %value, force_live, "Reference price refreshed");
        }

        cache.get().ok_or_else(|| {
            ExecutionError::InvalidVenueData(format!(
                "no reference price for {}",
                self.config.symbol
            ))
        })
    }
}

impl std::fmt::Debug for Bargain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bargain")
            .field("venue", &self.adapter.venue())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockAdapter;
    use execution_core::{Balance, FutureType, Instrument, OrderType, Position, RawExecution};
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};

    fn row(value: Value) -> RawExecution {
        match value {
            Value::Object(map) => map,
            _ => RawExecution::new(),
        }
    }

    fn position(qty: Decimal) -> Position {
        Position {
            current_qty: qty,
            leverage: Some(dec!(2)),
            ..Position::flat("XBTUSD")
        }
    }

    fn open_order(order_id: &str, client_order_id: &str) -> OpenOrder {
        OpenOrder {
            order_id: order_id.into(),
            client_order_id: client_order_id.into(),
            side: Some(Side::Buy),
            order_type: Some(OrderType::Limit),
            quantity: dec!(10),
            price: Some(dec!(7000)),
            stop_price: None,
            display_qty: None,
        }
    }

    fn linear(symbol: &str) -> Instrument {
        Instrument {
            symbol: symbol.into(),
            future_type: FutureType::Linear,
            multiplier: dec!(1),
            mark_price: dec!(101),
            fair_price: dec!(100),
            tick_size: Some(dec!(0.5)),
        }
    }

    fn bargain(adapter: MockAdapter) -> (Bargain, Arc<MockAdapter>) {
        let adapter = Arc::new(adapter);
        let bargain = Bargain::new(adapter.clone(), BargainConfig::default());
        (bargain, adapter)
    }

    #[tokio::test]
    async fn test_close_long_position() {
        let (bargain, adapter) = bargain(MockAdapter::default().with_position(position(dec!(100))));

        let outcome = bargain.close_position(None).await.unwrap();
        assert!(!outcome.is_noop());

        let placed = adapter.placed();
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].side, Side::Sell);
        assert_eq!(placed[0].quantity, dec!(100));
        assert_eq!(placed[0].order_type, OrderType::Market);
        assert_eq!(placed[0].execution_instruction.as_deref(), Some(CLOSE_INSTRUCTION));
        assert_eq!(bargain.metrics().orders_placed(), 1);
    }

    #[tokio::test]
    async fn test_close_short_position() {
        let (bargain, adapter) = bargain(MockAdapter::default().with_position(position(dec!(-50))));

        bargain.close_position(None).await.unwrap();

        let placed = adapter.placed();
        assert_eq!(placed[0].side, Side::Buy);
        assert_eq!(placed[0].quantity, dec!(50));
    }

    #[tokio::test]
    async fn test_close_flat_is_noop() {
        let (bargain, adapter) = bargain(MockAdapter::default());

        let outcome = bargain.close_position(None).await.unwrap();

        assert_eq!(outcome, CloseOutcome::NoOp);
        assert!(adapter.placed().is_empty());
        assert_eq!(bargain.metrics().noop_closes(), 1);
    }

    #[tokio::test]
    async fn test_close_oversized_quantity_closes_everything() {
        let (full, full_adapter) =
            bargain(MockAdapter::default().with_position(position(dec!(-40))));
        let (oversized, oversized_adapter) =
            bargain(MockAdapter::default().with_position(position(dec!(-40))));

        full.close_position(None).await.unwrap();
        oversized.close_position(Some(dec!(500))).await.unwrap();

        assert_eq!(full_adapter.placed(), oversized_adapter.placed());
    }

    #[tokio::test]
    async fn test_close_partial_quantity_is_kept() {
        let (bargain, adapter) = bargain(MockAdapter::default().with_position(position(dec!(100))));

        bargain.close_position(Some(dec!(30))).await.unwrap();

        let placed = adapter.placed();
        assert_eq!(placed[0].side, Side::Sell);
        assert_eq!(placed[0].quantity, dec!(70));
    }

    #[tokio::test]
    async fn test_close_quantity_equal_to_position_is_noop() {
        let (bargain, adapter) = bargain(MockAdapter::default().with_position(position(dec!(-25))));

        let outcome = bargain.close_position(Some(dec!(-25))).await.unwrap();

        assert!(outcome.is_noop());
        assert!(adapter.placed().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_and_close_without_quantity_keeps_orders() {
        let (bargain, adapter) = bargain(
            MockAdapter::default()
                .with_position(position(dec!(10)))
                .with_open_orders(vec![open_order("o1", "mlk_A-S_N")]),
        );

        bargain.cancel_and_close(None).await.unwrap();

        assert!(adapter.cancels().is_empty());
        assert_eq!(adapter.placed().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_and_close_with_quantity_cancels_first() {
        let (bargain, adapter) = bargain(
            MockAdapter::default()
                .with_position(position(dec!(10)))
                .with_open_orders(vec![open_order("o1", "mlk_A-S_N")]),
        );

        bargain.cancel_and_close(Some(dec!(4))).await.unwrap();

        assert_eq!(adapter.cancels(), vec![CancelTarget::Many(vec!["o1".into()])]);
        assert_eq!(adapter.placed()[0].quantity, dec!(6));
    }

    #[tokio::test]
    async fn test_cancel_all_is_idempotent() {
        let (bargain, adapter) = bargain(MockAdapter::default().with_open_orders(vec![
            open_order("o1", "mlk_A-S_N"),
            open_order("o2", "mlk_B-P_N"),
        ]));

        assert!(bargain.cancel_all_orders().await.unwrap());
        assert!(!bargain.cancel_all_orders().await.unwrap());
        assert!(!bargain.cancel_all_orders().await.unwrap());

        assert_eq!(
            adapter.cancels(),
            vec![CancelTarget::Many(vec!["o1".into(), "o2".into()])]
        );
        assert_eq!(bargain.metrics().cancels(), 2);
    }

    #[tokio::test]
    async fn test_amend_failure_is_counted() {
        let (bargain, _) = bargain(MockAdapter::default().failing_amend());

        let err = bargain
            .amend_order("o1", &OrderAmend::default().with_price(dec!(7001)))
            .await
            .unwrap_err();

        assert!(err.is_venue_error());
        assert_eq!(bargain.metrics().amend_failures(), 1);
    }

    #[tokio::test]
    async fn test_portfolio_delta_linear() {
        let (bargain, _) = bargain(
            MockAdapter::default()
                .with_instrument(linear("XBTUSD"))
                .with_position(position(dec!(10))),
        );

        let delta = bargain.portfolio_delta().await.unwrap();

        assert_eq!(delta.fair_price, dec!(10));
        assert_eq!(delta.mark_price, dec!(10));
        assert_eq!(delta.basis, dec!(0));
    }

    #[tokio::test]
    async fn test_portfolio_delta_unknown_type_is_fatal() {
        let mut odd = linear("ODD");
        odd.future_type = FutureType::Other("Perpetual".into());

        let adapter = Arc::new(
            MockAdapter::default()
                .with_instrument(linear("XBTUSD"))
                .with_instrument(odd),
        );
        let config = BargainConfig::default().with_contracts(vec!["XBTUSD".into(), "ODD".into()]);
        let bargain = Bargain::new(adapter, config);

        let err = bargain.portfolio_delta().await.unwrap_err();
        assert!(matches!(err, ExecutionError::UnknownInstrumentType { .. }));
    }

    fn status_history() -> Vec<RawExecution> {
        vec![
            row(json!({"clOrdID": "mlk_A-S_C", "ordStatus": "Filled", "transactTime": 2000})),
            row(json!({"clOrdID": "mlk_A-S_C", "ordStatus": "New", "transactTime": 1000})),
        ]
    }

    #[tokio::test]
    async fn test_order_status_checks() {
        let (bargain, _) = bargain(MockAdapter::default().with_executions(status_history()));

        assert!(bargain
            .order_reached_status("mlk_A-S_C", OrderStatus::Filled)
            .await
            .unwrap());
        assert!(!bargain
            .order_reached_status("mlk_A-S_C", OrderStatus::New)
            .await
            .unwrap());
        assert!(bargain
            .order_had_status("mlk_A-S_C", OrderStatus::New)
            .await
            .unwrap());

        let rows = bargain.execution(Some("mlk_A-S_C")).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].ord_status, "New");
    }

    #[tokio::test]
    async fn test_status_of_unknown_order_is_empty_history() {
        let (bargain, _) = bargain(MockAdapter::default());

        let err = bargain
            .order_reached_status("mlk_A-S_C", OrderStatus::Filled)
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::EmptyHistory { .. }));
        assert!(bargain.execution(None).await.unwrap().is_empty());
    }

    fn malformed_batch() -> Vec<RawExecution> {
        let mut batch = Vec::new();
        for i in 0..5 {
            batch.push(row(json!({
                "clOrdID": format!("mlk_A-S_{}", i),
                "orderID": format!("o{}", i),
                "ordStatus": "Filled",
                "transactTime": 1000 + i,
                "side": "Buy",
                "lastQty": 10,
                "lastPx": 7000
            })));
        }
        for i in 0..2 {
            batch.push(row(json!({"clOrdID": "x", "ordStatus": "New", "transactTime": i})));
        }
        batch
    }

    #[tokio::test]
    async fn test_malformed_batch_keeps_largest_shape() {
        let (bargain, _) = bargain(MockAdapter::default().with_executions(malformed_batch()));

        let rows = bargain.execution(None).await.unwrap();

        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|r| r.field_count() == 7));
        assert_eq!(bargain.metrics().discarded_executions(), 2);
    }

    #[tokio::test]
    async fn test_malformed_batch_strict() {
        let adapter = Arc::new(MockAdapter::default().with_executions(malformed_batch()));
        let config = BargainConfig::default().with_strict_execution_batches(true);
        let bargain = Bargain::new(adapter, config);

        match bargain.execution(None).await.unwrap_err() {
            ExecutionError::MalformedExecutionBatch(report) => {
                assert_eq!(report.kept, 5);
                assert_eq!(report.discarded_count(), 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_recent_window_correlation() {
        let now = Utc::now().timestamp_millis();
        let history = vec![
            row(json!({"clOrdID": "mlk_Entry-S_F", "ordStatus": "Filled", "transactTime": now - 120_000})),
            row(json!({"clOrdID": "mlk_Entry-S_C", "ordStatus": "Filled", "transactTime": now - 5_000})),
            row(json!({"clOrdID": "mlk_Entry-S_C", "ordStatus": "Filled", "transactTime": now - 4_000})),
            row(json!({"clOrdID": "mlk_Entry-P_C", "ordStatus": "Filled", "transactTime": now - 3_000})),
        ];
        let (bargain, _) = bargain(MockAdapter::default().with_executions(history));

        let key = bargain.source_key("mlk_Entry-S_C");
        assert_eq!(key.as_str(), "Entry-S");

        assert_eq!(
            bargain.find_recent_by_key(&key, None).await.unwrap(),
            vec!["mlk_Entry-S_C".to_string()]
        );
        assert_eq!(
            bargain.exec_client_ids_with(&key).await.unwrap(),
            vec!["mlk_Entry-S_F".to_string(), "mlk_Entry-S_C".to_string()]
        );
        assert_eq!(
            bargain
                .find_recent_by_key(&key, Some(Duration::from_secs(300)))
                .await
                .unwrap()
                .len(),
            2
        );
    }

    fn quoted() -> MockAdapter {
        MockAdapter::default().with_prices(
            PriceSnapshot::new("XBTUSD")
                .with(PriceSnapshot::BID, dec!(7000))
                .with(PriceSnapshot::ASK, dec!(7001))
                .with(PriceSnapshot::MARK, dec!(7000.37))
                .with("lastPrice", dec!(6999.5)),
        )
    }

    #[tokio::test]
    async fn test_price_views() {
        let (bargain, _) = bargain(quoted());

        assert_eq!(bargain.price(&PriceKind::Spread).await.unwrap(), dec!(1));
        assert_eq!(bargain.price(&PriceKind::Last(Side::Buy)).await.unwrap(), dec!(7001));
        assert_eq!(bargain.price(&PriceKind::Last(Side::Sell)).await.unwrap(), dec!(7000));
        assert_eq!(
            bargain.price(&PriceKind::MarketMaker(Side::Buy)).await.unwrap(),
            dec!(7000)
        );
        assert_eq!(
            bargain.price(&PriceKind::MarketMaker(Side::Sell)).await.unwrap(),
            dec!(7001)
        );
        assert_eq!(bargain.price(&PriceKind::Mid).await.unwrap(), dec!(7000.5));
        assert_eq!(bargain.price(&PriceKind::Mark).await.unwrap(), dec!(7000.5));
        assert_eq!(
            bargain.price(&PriceKind::Named("lastPrice".into())).await.unwrap(),
            dec!(6999.5)
        );
        assert!(bargain
            .price(&PriceKind::Named("fairPrice".into()))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_index_price_is_cached() {
        let (bargain, adapter) = bargain(quoted().with_reference_price(dec!(6990)));

        let index = PriceKind::Index { force_live: false };
        assert_eq!(bargain.price(&index).await.unwrap(), dec!(6990));
        assert_eq!(bargain.price(&index).await.unwrap(), dec!(6990));
        assert_eq!(adapter.reference_calls(), 1);

        *adapter.reference_price.lock() = dec!(6995);
        assert_eq!(
            bargain.price(&PriceKind::Index { force_live: true }).await.unwrap(),
            dec!(6995)
        );
        assert_eq!(adapter.reference_calls(), 2);
        assert_eq!(bargain.metrics().ref_price_refreshes(), 2);

        assert_eq!(bargain.price(&PriceKind::RefDelta).await.unwrap(), dec!(5.5));
        assert_eq!(adapter.reference_calls(), 2);
    }

    #[tokio::test]
    async fn test_balance_units() {
        let (bargain, _) = bargain(
            quoted()
                .with_position(position(dec!(0)))
                .with_balance(Balance {
                    currency: "XBt".into(),
                    available: dec!(200000000),
                }),
        );

        assert_eq!(bargain.leverage().await.unwrap(), dec!(2));
        assert_eq!(
            bargain.balance(&BalanceUnit::Native).await.unwrap(),
            dec!(400000000)
        );
        assert_eq!(bargain.balance(&BalanceUnit::Xbt).await.unwrap(), dec!(4));
        assert_eq!(
            bargain
                .balance(&BalanceUnit::Usd(PriceKind::Mid))
                .await
                .unwrap(),
            dec!(28002)
        );
    }

    #[tokio::test]
    async fn test_price_views_use_venue_tick() {
        let adapter = MockAdapter::default()
            .with_instrument(Instrument {
                tick_size: Some(dec!(0.01)),
                ..linear("ETHUSDT")
            })
            .with_prices(
                PriceSnapshot::new("ETHUSDT")
                    .with(PriceSnapshot::BID, dec!(2500.10))
                    .with(PriceSnapshot::ASK, dec!(2500.14)),
            );
        let bargain = Bargain::new(
            Arc::new(adapter),
            BargainConfig::default().with_symbol("ETHUSDT"),
        );

        assert_eq!(bargain.price(&PriceKind::Spread).await.unwrap(), dec!(0.04));
        assert_eq!(bargain.price(&PriceKind::Mid).await.unwrap(), dec!(2500.12));
    }

    #[tokio::test]
    async fn test_price_views_fall_back_to_configured_tick() {
        let adapter = MockAdapter::default().with_prices(
            PriceSnapshot::new("ETHUSDT")
                .with(PriceSnapshot::BID, dec!(2500.10))
                .with(PriceSnapshot::ASK, dec!(2500.14)),
        );
        let bargain = Bargain::new(
            Arc::new(adapter),
            BargainConfig::default()
                .with_symbol("ETHUSDT")
                .with_tick_size(dec!(0.05)),
        );

        assert_eq!(bargain.price(&PriceKind::Mid).await.unwrap(), dec!(2500.1));
    }

    #[tokio::test]
    async fn test_balance_units_stablecoin() {
        let (bargain, _) = bargain(quoted().with_balance(Balance {
            currency: "USDT".into(),
            available: dec!(500),
        }));

        assert_eq!(bargain.balance(&BalanceUnit::Native).await.unwrap(), dec!(500));
        assert!(matches!(
            bargain.balance(&BalanceUnit::Xbt).await,
            Err(ExecutionError::Unsupported { .. })
        ));
        assert_eq!(
            bargain
                .balance(&BalanceUnit::Usd(PriceKind::Mid))
                .await
                .unwrap(),
            dec!(500)
        );
    }

    #[tokio::test]
    async fn test_balance_units_quote_asset() {
        let (bargain, _) = bargain(quoted().with_balance(Balance {
            currency: "ETH".into(),
            available: dec!(2),
        }));

        assert_eq!(
            bargain
                .balance(&BalanceUnit::Usd(PriceKind::Last(Side::Sell)))
                .await
                .unwrap(),
            dec!(14000)
        );
    }

    #[tokio::test]
    async fn test_open_order_helpers() {
        let (bargain, _) = bargain(
            MockAdapter::default().with_open_orders(vec![open_order("o1", "mlk_A-S_N")]),
        );

        assert!(bargain.has_open_orders().await.unwrap());
        assert!(bargain.order_is_open("o1").await.unwrap());
        assert!(bargain.order_is_open("mlk_A-S_N").await.unwrap());
        assert!(!bargain.order_is_open("o2").await.unwrap());
    }

    #[tokio::test]
    async fn test_multiplier() {
        let (bargain, _) = bargain(MockAdapter::default().with_instrument(linear("XBTUSD")));
        assert_eq!(bargain.multiplier().await.unwrap(), dec!(1));
    }
}
