//! [`ExchangeAdapter`] over the Binance spot REST API.

use crate::client::BinanceRestClient;
use crate::error::BinanceRestError;
use crate::responses::{CancelOrderResponse, OrderQueryResponse};
use async_trait::async_trait;
use execution_core::{
    Balance, CancelTarget, ExchangeAdapter, ExecutionError, FutureType, Instrument, OpenOrder,
    OrderAck, OrderAmend, OrderRequest, OrderStatus, OrderType, Position, PriceSnapshot,
    RawExecution, Side, SymbolFilters, Venue,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tracing::{info, warn};

/// Binance spot adapter for one symbol.
///
/// Binance has no native amend, so amends are emulated with cancel then
/// place. The position is the free balance of the base asset.
#[derive(Debug)]
pub struct BinanceAdapter {
    client: BinanceRestClient,
    symbol: String,
    base_asset: String,
    quote_asset: String,
    filters: SymbolFilters,
}

impl BinanceAdapter {
    /// Sync the clock and load the symbol's trading filters.
    pub async fn connect(
        client: BinanceRestClient,
        symbol: impl Into<String>,
    ) -> Result<Self, BinanceRestError> {
        let symbol = symbol.into();
        client.sync_time().await?;

        let info = client.get_symbol_info(&symbol).await?;
        let filters = SymbolFilters {
            step_size: info.filter_value("LOT_SIZE", "stepSize").unwrap_or_default(),
            min_qty: info.filter_value("LOT_SIZE", "minQty").unwrap_or_default(),
            tick_size: info.filter_value("PRICE_FILTER", "tickSize").unwrap_or_default(),
            min_notional: info
                .filter_value("MIN_NOTIONAL", "minNotional")
                .or_else(|| info.filter_value("NOTIONAL", "minNotional"))
                .unwrap_or_default(),
        };

        let base_asset = info
            .base_asset
            .unwrap_or_else(|| symbol.trim_end_matches("USDT").to_string());
        let quote_asset = info.quote_asset.unwrap_or_else(|| "USDT".to_string());

        info!(
            symbol = %symbol,
            step_size = %filters.step_size,
            tick_size = %filters.tick_size,
            min_notional = %filters.min_notional,
            "Loaded symbol filters"
        );

        Ok(Self {
            client,
            symbol,
            base_asset,
            quote_asset,
            filters,
        })
    }

    /// Trading filters of the symbol.
    pub fn filters(&self) -> &SymbolFilters {
        &self.filters
    }

    /// Quantize a request and check min notional.
    fn prepare(&self, request: &OrderRequest) -> Result<OrderRequest, ExecutionError> {
        request.validate()?;

        let (quantity, price) = self.filters.validate(request.quantity, request.price)?;
        let mut prepared = request.clone();
        prepared.quantity = quantity;
        prepared.price = price;
        prepared.stop_price = request.stop_price.map(|p| self.filters.quantize_price(p));
        Ok(prepared)
    }

    /// Fill the amend's gaps from the live order.
    fn replacement(
        amend: &OrderAmend,
        live: Option<&OrderQueryResponse>,
    ) -> Result<OrderRequest, ExecutionError> {
        let missing = |field: &str| {
            ExecutionError::InvalidOrder(format!("amend has no {} and the live order is unknown", field))
        };

        let side = match (amend.side, live) {
            (Some(side), _) => side,
            (None, Some(l)) => Side::from_venue_str(&l.side)
                .ok_or_else(|| ExecutionError::InvalidVenueData(format!("side {}", l.side)))?,
            (None, None) => return Err(missing("side")),
        };
        let quantity = match (amend.quantity, live) {
            (Some(q), _) => q,
            (None, Some(l)) => l.orig_qty - l.executed_qty,
            (None, None) => return Err(missing("quantity")),
        };
        let order_type = match (amend.order_type, live) {
            (Some(t), _) => t,
            (None, Some(l)) => OrderType::from_venue_str(&l.order_type).unwrap_or(OrderType::Limit),
            (None, None) => OrderType::Limit,
        };
        let price = amend
            .price
            .or_else(|| live.map(|l| l.price).filter(|p| !p.is_zero()));
        let stop_price = amend.stop_price.or_else(|| live.and_then(|l| l.stop_price).filter(|p| !p.is_zero()));

        Ok(OrderRequest {
            side,
            quantity,
            price: if order_type == OrderType::Market { None } else { price },
            stop_price,
            order_type,
            execution_instruction: None,
            client_order_id: None,
        })
    }

    fn needs_live_order(amend: &OrderAmend) -> bool {
        amend.side.is_none()
            || amend.quantity.is_none()
            || amend.order_type.is_none()
            || (amend.price.is_none() && amend.stop_price.is_none())
    }

    async fn place_prepared(&self, request: &OrderRequest) -> Result<OrderAck, ExecutionError> {
        let response = self.client.place_order(&self.symbol, request).await?;

        Ok(OrderAck {
            order_id: response.order_id.to_string(),
            status: OrderStatus::from_venue_str(&response.status),
            price: Some(response.price),
            original_qty: Some(response.orig_qty),
            executed_qty: Some(response.executed_qty),
            side: Some(response.side),
        })
    }
}

fn cancel_ack(response: CancelOrderResponse) -> OrderAck {
    OrderAck {
        order_id: response.order_id.to_string(),
        status: response
            .status
            .as_deref()
            .map(OrderStatus::from_venue_str)
            .unwrap_or(OrderStatus::Canceled),
        price: response.price,
        original_qty: response.orig_qty,
        executed_qty: response.executed_qty,
        side: response.side,
    }
}

/// Order row in the shared execution layout.
fn execution_row(order: &OrderQueryResponse) -> RawExecution {
    let status = match OrderStatus::from_venue_str(&order.status) {
        OrderStatus::Unknown => order.status.clone(),
        known => known.as_str().to_string(),
    };

    let row = json!({
        "clOrdID": order.client_order_id,
        "orderID": order.order_id.to_string(),
        "ordStatus": status,
        "transactTime": order.update_time,
        "symbol": order.symbol,
        "side": order.side,
        "ordType": order.order_type,
        "orderQty": order.orig_qty.to_string(),
        "cumQty": order.executed_qty.to_string(),
        "price": order.price.to_string(),
    });

    match row {
        Value::Object(map) => map,
        _ => RawExecution::new(),
    }
}

#[async_trait]
impl ExchangeAdapter for BinanceAdapter {
    fn venue(&self) -> Venue {
        Venue::Binance
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }

    async fn place_order(&self, request: &OrderRequest) -> Result<OrderAck, ExecutionError> {
        let prepared = self.prepare(request)?;
        self.place_prepared(&prepared).await
    }

    async fn cancel_order(&self, target: &CancelTarget) -> Result<Vec<OrderAck>, ExecutionError> {
        match target {
            CancelTarget::One(id) => {
                let response = self
                    .client
                    .cancel_order(&self.symbol, &[("orderId", id.as_str())])
                    .await?;
                Ok(vec![cancel_ack(response)])
            }
            CancelTarget::Many(ids) => {
                // No bulk endpoint by id; cancel in order and stop at the first failure.
                let mut acks = Vec::with_capacity(ids.len());
                for id in ids {
                    let response = self
                        .client
                        .cancel_order(&self.symbol, &[("orderId", id.as_str())])
                        .await?;
                    acks.push(cancel_ack(response));
                }
                Ok(acks)
            }
            CancelTarget::Filter(filter) if filter.is_empty() => {
                let responses = self.client.cancel_open_orders(&self.symbol).await?;
                Ok(responses.into_iter().map(cancel_ack).collect())
            }
            CancelTarget::Filter(filter) => {
                if let Some(key) = filter
                    .keys()
                    .find(|k| !matches!(k.as_str(), "orderId" | "origClientOrderId"))
                {
                    return Err(ExecutionError::InvalidOrder(format!(
                        "unsupported cancel filter '{}'",
                        key
                    )));
                }
                let params: Vec<(&str, &str)> = filter
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect();
                let response = self.client.cancel_order(&self.symbol, &params).await?;
                Ok(vec![cancel_ack(response)])
            }
        }
    }

    async fn amend_order(
        &self,
        order_id: &str,
        amend: &OrderAmend,
    ) -> Result<OrderAck, ExecutionError> {
        let live = if Self::needs_live_order(amend) {
            Some(self.client.query_order(&self.symbol, order_id).await?)
        } else {
            None
        };

        // A replacement the venue would reject must not cost the original order.
        let replacement = self.prepare(&Self::replacement(amend, live.as_ref())?)?;

        if let Err(e) = self
            .client
            .cancel_order(&self.symbol, &[("orderId", order_id)])
            .await
        {
            warn!(order_id = %order_id, error = %e, "Amend aborted, cancel failed");
            return Err(e.into());
        }

        info!(order_id = %order_id, "Original canceled, placing replacement");
        self.place_prepared(&replacement).await
    }

    async fn get_balance(&self) -> Result<Balance, ExecutionError> {
        let account = self.client.get_account().await?;
        Ok(Balance {
            currency: self.quote_asset.clone(),
            available: account.free(&self.quote_asset),
        })
    }

    async fn get_position(&self, symbol: &str) -> Result<Position, ExecutionError> {
        let account = self.client.get_account().await?;
        let mut position = Position::flat(symbol);
        position.current_qty = account.free(&self.base_asset);
        Ok(position)
    }

    async fn get_prices(&self, symbol: &str) -> Result<PriceSnapshot, ExecutionError> {
        let ticker = self.client.get_book_ticker(symbol).await?;
        let mid = (ticker.bid_price + ticker.ask_price) / Decimal::TWO;

        Ok(PriceSnapshot::new(symbol)
            .with(PriceSnapshot::BID, ticker.bid_price)
            .with(PriceSnapshot::ASK, ticker.ask_price)
            .with(PriceSnapshot::MID, mid))
    }

    async fn get_open_orders(&self) -> Result<Vec<OpenOrder>, ExecutionError> {
        let orders = self.client.get_open_orders(&self.symbol).await?;

        Ok(orders
            .into_iter()
            .map(|o| OpenOrder {
                order_id: o.order_id.to_string(),
                client_order_id: o.client_order_id,
                side: Side::from_venue_str(&o.side),
                order_type: OrderType::from_venue_str(&o.order_type),
                quantity: o.orig_qty - o.executed_qty,
                price: Some(o.price).filter(|p| !p.is_zero()),
                stop_price: o.stop_price.filter(|p| !p.is_zero()),
                display_qty: o.iceberg_qty.filter(|q| !q.is_zero()),
            })
            .collect())
    }

    async fn get_executions(&self) -> Result<Vec<RawExecution>, ExecutionError> {
        let orders = self.client.get_all_orders(&self.symbol).await?;
        Ok(orders.iter().map(execution_row).collect())
    }

    async fn get_instrument(&self, symbol: &str) -> Result<Instrument, ExecutionError> {
        let mid = self.get_prices(symbol).await?.mid()?;

        Ok(Instrument {
            symbol: symbol.to_string(),
            future_type: FutureType::Linear,
            multiplier: Decimal::ONE,
            mark_price: mid,
            fair_price: mid,
            tick_size: Some(self.filters.tick_size),
        })
    }
}
