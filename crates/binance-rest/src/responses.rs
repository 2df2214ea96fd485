//! Binance API response types.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

/// Response from GET /api/v3/time.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerTimeResponse {
    #[serde(rename = "serverTime")]
    pub server_time: i64,
}

/// Response from GET /api/v3/exchangeInfo.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeInfoResponse {
    pub symbols: Vec<SymbolInfo>,
}

/// One symbol of the exchange info.
#[derive(Debug, Clone, Deserialize)]
pub struct SymbolInfo {
    pub symbol: String,
    #[serde(rename = "baseAsset", default)]
    pub base_asset: Option<String>,
    #[serde(rename = "quoteAsset", default)]
    pub quote_asset: Option<String>,
    /// Filters are kept loosely typed; each filter type has its own fields.
    #[serde(default)]
    pub filters: Vec<Value>,
}

impl SymbolInfo {
    /// Decimal field of the first filter of `filter_type`.
    pub fn filter_value(&self, filter_type: &str, field: &str) -> Option<Decimal> {
        self.filters
            .iter()
            .find(|f| f.get("filterType").and_then(Value::as_str) == Some(filter_type))
            .and_then(|f| f.get(field))
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }
}

/// Response from POST /api/v3/order.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrderResponse {
    pub symbol: String,
    #[serde(rename = "orderId")]
    pub order_id: u64,
    #[serde(rename = "clientOrderId", default)]
    pub client_order_id: String,
    #[serde(rename = "transactTime", default)]
    pub transact_time: i64,
    #[serde(deserialize_with = "deserialize_decimal_from_str")]
    pub price: Decimal,
    #[serde(rename = "origQty", deserialize_with = "deserialize_decimal_from_str")]
    pub orig_qty: Decimal,
    #[serde(
        rename = "executedQty",
        deserialize_with = "deserialize_decimal_from_str"
    )]
    pub executed_qty: Decimal,
    pub status: String,
    #[serde(rename = "type", default)]
    pub order_type: String,
    pub side: String,
    /// Fills included when using newOrderRespType=FULL
    #[serde(default)]
    pub fills: Vec<OrderFill>,
}

/// A fill from an order response.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderFill {
    #[serde(deserialize_with = "deserialize_decimal_from_str")]
    pub price: Decimal,
    #[serde(deserialize_with = "deserialize_decimal_from_str")]
    pub qty: Decimal,
    #[serde(deserialize_with = "deserialize_decimal_from_str")]
    pub commission: Decimal,
    #[serde(rename = "commissionAsset")]
    pub commission_asset: String,
    #[serde(rename = "tradeId")]
    pub trade_id: u64,
}

/// Response from DELETE /api/v3/order.
///
/// Only the order id is guaranteed; the rest depends on the order's state.
#[derive(Debug, Clone, Deserialize)]
pub struct CancelOrderResponse {
    #[serde(rename = "orderId")]
    pub order_id: u64,
    #[serde(rename = "clientOrderId", default)]
    pub client_order_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_decimal_from_str")]
    pub price: Option<Decimal>,
    #[serde(
        rename = "origQty",
        default,
        deserialize_with = "deserialize_opt_decimal_from_str"
    )]
    pub orig_qty: Option<Decimal>,
    #[serde(
        rename = "executedQty",
        default,
        deserialize_with = "deserialize_opt_decimal_from_str"
    )]
    pub executed_qty: Option<Decimal>,
    #[serde(default)]
    pub side: Option<String>,
}

/// Response from GET /api/v3/order, and rows of openOrders / allOrders.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderQueryResponse {
    pub symbol: String,
    #[serde(rename = "orderId")]
    pub order_id: u64,
    #[serde(rename = "clientOrderId")]
    pub client_order_id: String,
    #[serde(deserialize_with = "deserialize_decimal_from_str")]
    pub price: Decimal,
    #[serde(rename = "origQty", deserialize_with = "deserialize_decimal_from_str")]
    pub orig_qty: Decimal,
    #[serde(
        rename = "executedQty",
        deserialize_with = "deserialize_decimal_from_str"
    )]
    pub executed_qty: Decimal,
    pub status: String,
    #[serde(rename = "type")]
    pub order_type: String,
    pub side: String,
    #[serde(
        rename = "stopPrice",
        default,
        deserialize_with = "deserialize_opt_decimal_from_str"
    )]
    pub stop_price: Option<Decimal>,
    #[serde(
        rename = "icebergQty",
        default,
        deserialize_with = "deserialize_opt_decimal_from_str"
    )]
    pub iceberg_qty: Option<Decimal>,
    pub time: i64,
    #[serde(rename = "updateTime")]
    pub update_time: i64,
}

/// Response from GET /api/v3/account.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountResponse {
    pub balances: Vec<AssetBalance>,
}

impl AccountResponse {
    /// Free balance of an asset, zero if the account holds none.
    pub fn free(&self, asset: &str) -> Decimal {
        self.balances
            .iter()
            .find(|b| b.asset == asset)
            .map(|b| b.free)
            .unwrap_or(Decimal::ZERO)
    }
}

/// One asset of the account.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetBalance {
    pub asset: String,
    #[serde(deserialize_with = "deserialize_decimal_from_str")]
    pub free: Decimal,
    #[serde(deserialize_with = "deserialize_decimal_from_str")]
    pub locked: Decimal,
}

/// Response from GET /api/v3/ticker/bookTicker.
#[derive(Debug, Clone, Deserialize)]
pub struct BookTickerResponse {
    pub symbol: String,
    #[serde(rename = "bidPrice", deserialize_with = "deserialize_decimal_from_str")]
    pub bid_price: Decimal,
    #[serde(rename = "askPrice", deserialize_with = "deserialize_decimal_from_str")]
    pub ask_price: Decimal,
}

/// Deserialize a Decimal from a string.
fn deserialize_decimal_from_str<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: &str = Deserialize::deserialize(deserializer)?;
    s.parse::<Decimal>().map_err(serde::de::Error::custom)
}

/// Deserialize an optional Decimal from a string.
fn deserialize_opt_decimal_from_str<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<&str> = Deserialize::deserialize(deserializer)?;
    s.map(|s| s.parse::<Decimal>().map_err(serde::de::Error::custom))
        .transpose()
}
