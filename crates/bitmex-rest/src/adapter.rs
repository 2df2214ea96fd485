//! [`ExchangeAdapter`] over the BitMEX REST API.

use crate::client::BitmexRestClient;
use crate::responses::{AmendOrder, BitmexInstrument, BitmexOrder, NewOrder};
use crate::settings::BitmexSettings;
use async_trait::async_trait;
use execution_core::{
    generate_client_order_id, Balance, CancelTarget, ExchangeAdapter, ExecutionError, FutureType,
    Instrument, OpenOrder, OrderAck, OrderAmend, OrderRequest, OrderStatus, OrderType, Position,
    PriceSnapshot, RawExecution, Side, Venue,
};
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

/// Execution instruction that makes a limit order maker-only.
pub const POST_ONLY_INSTRUCTION: &str = "ParticipateDoNotInitiate";

/// Index whose last trade is the reference price of a contract.
pub fn settlement_index(symbol: &str) -> &str {
    match symbol {
        "XBTUSD" => ".BXBT",
        other => other,
    }
}

/// BitMEX adapter for one contract.
#[derive(Debug)]
pub struct BitmexAdapter {
    client: BitmexRestClient,
    symbol: String,
    settings: BitmexSettings,
}

impl BitmexAdapter {
    pub fn new(client: BitmexRestClient, symbol: impl Into<String>, settings: BitmexSettings) -> Self {
        Self {
            client,
            symbol: symbol.into(),
            settings,
        }
    }

    pub fn settings(&self) -> &BitmexSettings {
        &self.settings
    }

    fn new_order(&self, request: &OrderRequest) -> NewOrder {
        let mut instructions: Vec<&str> = request
            .execution_instruction
            .as_deref()
            .map(|s| s.split(',').collect())
            .unwrap_or_default();
        if self.settings.post_only
            && request.order_type == OrderType::Limit
            && !instructions.contains(&POST_ONLY_INSTRUCTION)
        {
            instructions.push(POST_ONLY_INSTRUCTION);
        }

        let cl_ord_id = request
            .client_order_id
            .clone()
            .unwrap_or_else(|| generate_client_order_id(&self.settings.order_id_prefix));

        NewOrder {
            symbol: self.symbol.clone(),
            side: request.side.as_bitmex_str(),
            order_qty: request.quantity,
            price: request.price,
            stop_px: request.stop_price,
            ord_type: request.order_type.as_bitmex_str(),
            exec_inst: (!instructions.is_empty()).then(|| instructions.join(",")),
            cl_ord_id: Some(cl_ord_id),
        }
    }
}

fn ack(order: BitmexOrder) -> OrderAck {
    OrderAck {
        status: order
            .ord_status
            .as_deref()
            .map(OrderStatus::from_venue_str)
            .unwrap_or(OrderStatus::Unknown),
        order_id: order.order_id,
        price: order.price,
        original_qty: order.order_qty,
        executed_qty: order.cum_qty,
        side: order.side,
    }
}

/// Multiplier per contract in settlement units.
fn contract_multiplier(inst: &BitmexInstrument) -> Result<Decimal, ExecutionError> {
    let missing = |field: &str| {
        ExecutionError::InvalidVenueData(format!("{} has no {}", inst.symbol, field))
    };

    let multiplier = inst.multiplier.ok_or_else(|| missing("multiplier"))?;
    let divisor = inst
        .underlying_to_settle_multiplier
        .or(inst.quote_to_settle_multiplier)
        .ok_or_else(|| missing("settle multiplier"))?;

    if divisor.is_zero() {
        return Err(missing("non-zero settle multiplier"));
    }
    Ok(multiplier / divisor)
}

#[async_trait]
impl ExchangeAdapter for BitmexAdapter {
    fn venue(&self) -> Venue {
        Venue::Bitmex
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }

    async fn place_order(&self, request: &OrderRequest) -> Result<OrderAck, ExecutionError> {
        request.validate()?;
        let order = self.client.place_order(&self.new_order(request)).await?;
        Ok(ack(order))
    }

    async fn cancel_order(&self, target: &CancelTarget) -> Result<Vec<OrderAck>, ExecutionError> {
        let orders = match target {
            CancelTarget::One(id) => self.client.cancel_orders(std::slice::from_ref(id)).await?,
            CancelTarget::Many(ids) => self.client.cancel_orders(ids).await?,
            CancelTarget::Filter(filter) => match filter.get("clOrdID") {
                Some(cl_ord_id) if filter.len() == 1 => {
                    self.client.cancel_by_client_id(cl_ord_id).await?
                }
                _ => {
                    let filter: serde_json::Map<String, Value> = filter
                        .iter()
                        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                        .collect();
                    let filter = (!filter.is_empty()).then_some(Value::Object(filter));
                    self.client.cancel_all(&self.symbol, filter.as_ref()).await?
                }
            },
        };

        if let Some(failed) = orders.iter().find(|o| o.error.is_some()) {
            return Err(ExecutionError::venue(
                Venue::Bitmex,
                format!(
                    "cancel of {} rejected: {}",
                    failed.order_id,
                    failed.error.as_deref().unwrap_or_default()
                ),
            ));
        }

        Ok(orders.into_iter().map(ack).collect())
    }

    async fn amend_order(
        &self,
        order_id: &str,
        amend: &OrderAmend,
    ) -> Result<OrderAck, ExecutionError> {
        if amend.side.is_some() || amend.order_type.is_some() {
            return Err(ExecutionError::InvalidOrder(
                "bitmex cannot change the side or type of a resting order".into(),
            ));
        }
        if amend.is_empty() {
            return Err(ExecutionError::InvalidOrder("amend changes nothing".into()));
        }
        if amend.quantity.is_some_and(|q| q <= Decimal::ZERO) {
            return Err(ExecutionError::InvalidOrder("quantity must be positive".into()));
        }

        let order = self
            .client
            .amend_order(&AmendOrder {
                order_id: order_id.to_string(),
                order_qty: amend.quantity,
                price: amend.price,
                stop_px: amend.stop_price,
            })
            .await?;
        Ok(ack(order))
    }

    async fn get_balance(&self) -> Result<Balance, ExecutionError> {
        let margin = self.client.margin().await?;
        Ok(Balance {
            currency: margin.currency,
            available: margin.available_margin.unwrap_or_default(),
        })
    }

    async fn get_position(&self, symbol: &str) -> Result<Position, ExecutionError> {
        let position = match self.client.position(symbol).await? {
            Some(p) => Position {
                symbol: p.symbol,
                current_qty: p.current_qty.unwrap_or_default(),
                leverage: p.leverage,
                avg_entry_price: p.avg_entry_price,
                liquidation_price: p.liquidation_price,
            },
            None => Position::flat(symbol),
        };
        Ok(position)
    }

    async fn get_prices(&self, symbol: &str) -> Result<PriceSnapshot, ExecutionError> {
        let inst = self.client.instrument(symbol).await?;
        Ok(PriceSnapshot {
            symbol: symbol.to_string(),
            prices: inst.prices(),
        })
    }

    async fn get_open_orders(&self) -> Result<Vec<OpenOrder>, ExecutionError> {
        let orders = self.client.open_orders(&self.symbol).await?;

        Ok(orders
            .into_iter()
            .map(|o| OpenOrder {
                quantity: o.leaves_qty.or(o.order_qty).unwrap_or_default(),
                order_id: o.order_id,
                client_order_id: o.cl_ord_id.unwrap_or_default(),
                side: o.side.as_deref().and_then(Side::from_venue_str),
                order_type: o.ord_type.as_deref().and_then(OrderType::from_venue_str),
                price: o.price,
                stop_price: o.stop_px,
                display_qty: o.display_qty,
            })
            .collect())
    }

    async fn get_executions(&self) -> Result<Vec<RawExecution>, ExecutionError> {
        Ok(self.client.executions(&self.symbol).await?)
    }

    async fn get_instrument(&self, symbol: &str) -> Result<Instrument, ExecutionError> {
        let inst = self.client.instrument(symbol).await?;

        let future_type = FutureType::from_flags(inst.is_quanto, inst.is_inverse);
        let multiplier = contract_multiplier(&inst)?;
        let mark_price = inst.price("markPrice").ok_or_else(|| {
            ExecutionError::InvalidVenueData(format!("{} has no markPrice", symbol))
        })?;
        let fair_price = inst
            .price("indicativeSettlePrice")
            .or_else(|| inst.price("fairPrice"))
            .ok_or_else(|| {
                ExecutionError::InvalidVenueData(format!("{} has no fair price", symbol))
            })?;

        Ok(Instrument {
            symbol: inst.symbol,
            future_type,
            multiplier,
            mark_price,
            fair_price,
            tick_size: inst.tick_size,
        })
    }

    /// Last trade of the settlement index (`.BXBT` for `XBTUSD`).
    async fn get_reference_price(&self, symbol: &str) -> Result<Decimal, ExecutionError> {
        let index = settlement_index(symbol);
        let price = self.client.last_trade_price(index).await?.ok_or_else(|| {
            ExecutionError::InvalidVenueData(format!("no trade for {}", index))
        })?;

        debug!(symbol = %symbol, index = %index, price = %price, "Reference price");
        Ok(price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth::ApiCredentials;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::time::Duration;
    use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter(server: &MockServer, settings: BitmexSettings) -> BitmexAdapter {
        let client = BitmexRestClient::with_base_url(
            ApiCredentials::new("key".into(), "secret".into()),
            &server.uri(),
            Duration::from_secs(5),
        )
        .unwrap();
        BitmexAdapter::new(client, "XBTUSD", settings)
    }

    fn order_json(order_id: &str, status: &str) -> Value {
        json!({
            "orderID": order_id,
            "clOrdID": "mlk_x",
            "side": "Buy",
            "orderQty": 100,
            "price": 7000.5,
            "ordStatus": status,
            "cumQty": 0
        })
    }

    #[tokio::test]
    async fn test_post_only_limit_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/order"))
            .and(body_partial_json(json!({
                "symbol": "XBTUSD",
                "side": "Buy",
                "orderQty": 100.0,
                "price": 7000.5,
                "ordType": "Limit",
                "execInst": "ParticipateDoNotInitiate"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(order_json("o1", "New")))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = adapter(&server, BitmexSettings::default().with_post_only(true));
        let ack = adapter
            .place_order(&OrderRequest::limit(Side::Buy, dec!(100), dec!(7000.5)))
            .await
            .unwrap();

        assert_eq!(ack.order_id, "o1");
        assert_eq!(ack.status, OrderStatus::New);
        assert_eq!(ack.price, Some(dec!(7000.5)));
    }

    #[tokio::test]
    async fn test_close_order_keeps_instruction() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/order"))
            .and(body_partial_json(json!({
                "side": "Sell",
                "ordType": "Market",
                "execInst": "Close"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(order_json("o2", "Filled")))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = adapter(&server, BitmexSettings::default().with_post_only(true));
        let request = OrderRequest::market(Side::Sell, dec!(10)).with_execution_instruction("Close");
        let ack = adapter.place_order(&request).await.unwrap();
        assert_eq!(ack.status, OrderStatus::Filled);
    }

    #[tokio::test]
    async fn test_bulk_cancel_is_one_request() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/order"))
            .and(body_json(json!({"orderID": ["a", "b"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                order_json("a", "Canceled"),
                order_json("b", "Canceled")
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = adapter(&server, BitmexSettings::default());
        let acks = adapter
            .cancel_order(&CancelTarget::Many(vec!["a".into(), "b".into()]))
            .await
            .unwrap();

        assert_eq!(acks.len(), 2);
        assert!(acks.iter().all(|a| a.status == OrderStatus::Canceled));
    }

    #[tokio::test]
    async fn test_cancel_by_filter() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/order/all"))
            .and(body_json(json!({"symbol": "XBTUSD", "filter": {"side": "Buy"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = adapter(&server, BitmexSettings::default());
        let mut filter = BTreeMap::new();
        filter.insert("side".to_string(), "Buy".to_string());
        let acks = adapter.cancel_order(&CancelTarget::Filter(filter)).await.unwrap();
        assert!(acks.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_error_row_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/order"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"orderID": "a", "ordStatus": "Filled", "error": "Unable to cancel order"}
            ])))
            .mount(&server)
            .await;

        let adapter = adapter(&server, BitmexSettings::default());
        let err = adapter
            .cancel_order(&CancelTarget::One("a".into()))
            .await
            .unwrap_err();
        assert!(err.is_venue_error());
        assert!(err.to_string().contains("rejected"));
    }

    #[tokio::test]
    async fn test_native_amend() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/v1/order"))
            .and(body_json(json!({"orderID": "o1", "price": 7001.0})))
            .respond_with(ResponseTemplate::new(200).set_body_json(order_json("o1", "New")))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = adapter(&server, BitmexSettings::default());
        let ack = adapter
            .amend_order("o1", &OrderAmend::default().with_price(dec!(7001)))
            .await
            .unwrap();
        assert_eq!(ack.order_id, "o1");

        let err = adapter
            .amend_order("o1", &OrderAmend::default().with_side(Side::Sell))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::InvalidOrder(_)));
    }

    #[tokio::test]
    async fn test_instrument_multiplier_and_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/instrument"))
            .and(query_param("symbol", "XBTUSD"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "symbol": "XBTUSD",
                "isQuanto": false,
                "isInverse": true,
                "multiplier": -100000000,
                "underlyingToSettleMultiplier": null,
                "quoteToSettleMultiplier": -100000000,
                "tickSize": 0.5,
                "markPrice": 7000,
                "indicativeSettlePrice": 6990,
                "bidPrice": 6999.5,
                "askPrice": 7000
            }])))
            .mount(&server)
            .await;

        let adapter = adapter(&server, BitmexSettings::default());
        let inst = adapter.get_instrument("XBTUSD").await.unwrap();

        assert_eq!(inst.future_type, FutureType::Inverse);
        assert_eq!(inst.multiplier, dec!(1));
        assert_eq!(inst.mark_price, dec!(7000));
        assert_eq!(inst.fair_price, dec!(6990));

        let prices = adapter.get_prices("XBTUSD").await.unwrap();
        assert_eq!(prices.mid().unwrap(), dec!(6999.75));
    }

    #[tokio::test]
    async fn test_reference_price_reads_index() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/trade"))
            .and(query_param("symbol", ".BXBT"))
            .and(query_param("reverse", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"price": 7012.34}])))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = adapter(&server, BitmexSettings::default());
        assert_eq!(
            adapter.get_reference_price("XBTUSD").await.unwrap(),
            dec!(7012.34)
        );
    }

    #[tokio::test]
    async fn test_missing_position_is_flat() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/position"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let adapter = adapter(&server, BitmexSettings::default());
        assert!(adapter.get_position("XBTUSD").await.unwrap().is_flat());
    }

    #[tokio::test]
    async fn test_open_orders_summary() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/order"))
            .and(query_param("filter", r#"{"open":true}"#))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "orderID": "o9",
                "clOrdID": "mlk_A-S_F",
                "side": "Sell",
                "ordType": "Limit",
                "orderQty": 100,
                "leavesQty": 60,
                "price": 7100,
                "displayQty": null
            }])))
            .mount(&server)
            .await;

        let adapter = adapter(&server, BitmexSettings::default());
        let orders = adapter.get_open_orders().await.unwrap();

        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_id, "o9");
        assert_eq!(orders[0].quantity, dec!(60));
        assert_eq!(orders[0].side, Some(Side::Sell));
        assert_eq!(orders[0].display_qty, None);
    }

    #[test]
    fn test_settlement_index() {
        assert_eq!(settlement_index("XBTUSD"), ".BXBT");
        assert_eq!(settlement_index("ETHUSD"), "ETHUSD");
    }
}
