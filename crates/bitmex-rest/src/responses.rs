//! BitMEX API request and response types.
//!
//! BitMEX sends numbers as JSON floats (and occasionally `null`), so every
//! decimal goes through [`deserialize_opt_decimal`], which reads the number's
//! textual form rather than an `f64`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Body of POST /api/v1/order.
#[derive(Debug, Clone, Serialize)]
pub struct NewOrder {
    pub symbol: String,
    pub side: &'static str,
    #[serde(rename = "orderQty", with = "rust_decimal::serde::float")]
    pub order_qty: Decimal,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub price: Option<Decimal>,
    #[serde(
        rename = "stopPx",
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub stop_px: Option<Decimal>,
    #[serde(rename = "ordType")]
    pub ord_type: &'static str,
    #[serde(rename = "execInst", skip_serializing_if = "Option::is_none")]
    pub exec_inst: Option<String>,
    #[serde(rename = "clOrdID", skip_serializing_if = "Option::is_none")]
    pub cl_ord_id: Option<String>,
}

/// Body of PUT /api/v1/order.
#[derive(Debug, Clone, Serialize)]
pub struct AmendOrder {
    #[serde(rename = "orderID")]
    pub order_id: String,
    #[serde(
        rename = "orderQty",
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub order_qty: Option<Decimal>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub price: Option<Decimal>,
    #[serde(
        rename = "stopPx",
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub stop_px: Option<Decimal>,
}

/// An order as returned by every /order endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct BitmexOrder {
    #[serde(rename = "orderID")]
    pub order_id: String,
    #[serde(rename = "clOrdID", default)]
    pub cl_ord_id: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(rename = "ordType", default)]
    pub ord_type: Option<String>,
    #[serde(rename = "ordStatus", default)]
    pub ord_status: Option<String>,
    #[serde(rename = "orderQty", default, deserialize_with = "deserialize_opt_decimal")]
    pub order_qty: Option<Decimal>,
    #[serde(rename = "leavesQty", default, deserialize_with = "deserialize_opt_decimal")]
    pub leaves_qty: Option<Decimal>,
    #[serde(rename = "cumQty", default, deserialize_with = "deserialize_opt_decimal")]
    pub cum_qty: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_opt_decimal")]
    pub price: Option<Decimal>,
    #[serde(rename = "stopPx", default, deserialize_with = "deserialize_opt_decimal")]
    pub stop_px: Option<Decimal>,
    #[serde(rename = "displayQty", default, deserialize_with = "deserialize_opt_decimal")]
    pub display_qty: Option<Decimal>,
    /// Set on cancel failures inside a bulk cancel.
    #[serde(default)]
    pub error: Option<String>,
}

/// Response from GET /api/v1/user/margin.
#[derive(Debug, Clone, Deserialize)]
pub struct Margin {
    pub currency: String,
    #[serde(rename = "availableMargin", default, deserialize_with = "deserialize_opt_decimal")]
    pub available_margin: Option<Decimal>,
    #[serde(rename = "walletBalance", default, deserialize_with = "deserialize_opt_decimal")]
    pub wallet_balance: Option<Decimal>,
}

/// Row of GET /api/v1/position.
#[derive(Debug, Clone, Deserialize)]
pub struct BitmexPosition {
    pub symbol: String,
    #[serde(rename = "currentQty", default, deserialize_with = "deserialize_opt_decimal")]
    pub current_qty: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_opt_decimal")]
    pub leverage: Option<Decimal>,
    #[serde(rename = "avgEntryPrice", default, deserialize_with = "deserialize_opt_decimal")]
    pub avg_entry_price: Option<Decimal>,
    #[serde(
        rename = "liquidationPrice",
        default,
        deserialize_with = "deserialize_opt_decimal"
    )]
    pub liquidation_price: Option<Decimal>,
}

/// Row of GET /api/v1/instrument.
///
/// Fields the adapter does not read by name stay in `other`, which is where
/// the named price views come from.
#[derive(Debug, Clone, Deserialize)]
pub struct BitmexInstrument {
    pub symbol: String,
    #[serde(rename = "isQuanto", default)]
    pub is_quanto: bool,
    #[serde(rename = "isInverse", default)]
    pub is_inverse: bool,
    #[serde(default, deserialize_with = "deserialize_opt_decimal")]
    pub multiplier: Option<Decimal>,
    #[serde(
        rename = "underlyingToSettleMultiplier",
        default,
        deserialize_with = "deserialize_opt_decimal"
    )]
    pub underlying_to_settle_multiplier: Option<Decimal>,
    #[serde(
        rename = "quoteToSettleMultiplier",
        default,
        deserialize_with = "deserialize_opt_decimal"
    )]
    pub quote_to_settle_multiplier: Option<Decimal>,
    #[serde(rename = "tickSize", default, deserialize_with = "deserialize_opt_decimal")]
    pub tick_size: Option<Decimal>,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

impl BitmexInstrument {
    /// Every numeric `*Price` field (`bidPrice`, `markPrice`, ...).
    pub fn prices(&self) -> BTreeMap<String, Decimal> {
        self.other
            .iter()
            .filter(|(k, _)| k.contains("rice"))
            .filter_map(|(k, v)| decimal_from_value(v).map(|d| (k.clone(), d)))
            .collect()
    }

    /// A named price field.
    pub fn price(&self, name: &str) -> Option<Decimal> {
        self.other.get(name).and_then(decimal_from_value)
    }
}

/// Row of GET /api/v1/trade with `columns=price`.
#[derive(Debug, Clone, Deserialize)]
pub struct TradePrice {
    #[serde(default, deserialize_with = "deserialize_opt_decimal")]
    pub price: Option<Decimal>,
}

/// Error body: `{"error": {"message": "...", "name": "..."}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(default)]
    pub name: String,
}

/// Read a decimal from a JSON number or string.
pub(crate) fn decimal_from_value(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        _ => return None,
    };
    text.parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(&text).ok())
}

fn deserialize_opt_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<Value> = Deserialize::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => decimal_from_value(&v)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("not a decimal: {}", v))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_new_order_body() {
        let order = NewOrder {
            symbol: "XBTUSD".into(),
            side: "Buy",
            order_qty: dec!(100),
            price: Some(dec!(7000.5)),
            stop_px: None,
            ord_type: "Limit",
            exec_inst: Some("ParticipateDoNotInitiate".into()),
            cl_ord_id: None,
        };

        let body = serde_json::to_value(&order).unwrap();
        assert_eq!(
            body,
            json!({
                "symbol": "XBTUSD",
                "side": "Buy",
                "orderQty": 100.0,
                "price": 7000.5,
                "ordType": "Limit",
                "execInst": "ParticipateDoNotInitiate"
            })
        );
    }

    #[test]
    fn test_order_with_nulls() {
        let order: BitmexOrder = serde_json::from_value(json!({
            "orderID": "abc",
            "clOrdID": "mlk_A-S_C",
            "side": "Sell",
            "orderQty": 30,
            "price": null,
            "stopPx": 6900.5,
            "ordStatus": "New"
        }))
        .unwrap();

        assert_eq!(order.order_qty, Some(dec!(30)));
        assert_eq!(order.price, None);
        assert_eq!(order.stop_px, Some(dec!(6900.5)));
        assert_eq!(order.leaves_qty, None);
    }

    #[test]
    fn test_instrument_prices() {
        let inst: BitmexInstrument = serde_json::from_value(json!({
            "symbol": "XBTUSD",
            "isQuanto": false,
            "isInverse": true,
            "multiplier": -100000000,
            "underlyingToSettleMultiplier": -100000000,
            "quoteToSettleMultiplier": null,
            "tickSize": 0.5,
            "bidPrice": 7000,
            "askPrice": 7000.5,
            "markPrice": 7000.12,
            "indicativeSettlePrice": 6999.87,
            "lastPriceProtected": 7000,
            "state": "Open"
        }))
        .unwrap();

        assert!(inst.is_inverse);
        assert_eq!(inst.tick_size, Some(dec!(0.5)));
        assert_eq!(inst.price("markPrice"), Some(dec!(7000.12)));

        let prices = inst.prices();
        assert_eq!(prices.len(), 5);
        assert!(!prices.contains_key("state"));
    }

    #[test]
    fn test_scientific_numbers() {
        assert_eq!(decimal_from_value(&json!(1e-8)), Some(dec!(0.00000001)));
        assert_eq!(decimal_from_value(&json!("12.5")), Some(dec!(12.5)));
        assert_eq!(decimal_from_value(&json!(true)), None);
    }

    #[test]
    fn test_error_body() {
        let err: ErrorResponse = serde_json::from_str(
            r#"{"error": {"message": "Invalid orderID", "name": "HTTPError"}}"#,
        )
        .unwrap();
        assert_eq!(err.error.message, "Invalid orderID");
    }
}
