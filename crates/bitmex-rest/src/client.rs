//! BitMEX REST API client.

use crate::error::BitmexRestError;
use crate::responses::{
    AmendOrder, BitmexInstrument, BitmexOrder, BitmexPosition, Margin, NewOrder, TradePrice,
};
use auth::{ApiCredentials, RequestSigner};
use common::{Environment, Venue};
use rest_client::{Method, RestClient};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;

/// Every endpoint lives under this prefix; it is part of the signed path.
const API_PREFIX: &str = "/api/v1";

/// Lifetime of a request signature.
const EXPIRES_AFTER_SECS: i64 = 60;

/// Maximum rows BitMEX returns per query.
const MAX_COUNT: &str = "500";

/// BitMEX REST API client with API-key signing.
pub struct BitmexRestClient {
    client: RestClient,
    credentials: ApiCredentials,
}

impl BitmexRestClient {
    /// Create a client for an environment.
    pub fn new(
        credentials: ApiCredentials,
        environment: Environment,
        timeout: Duration,
    ) -> Result<Self, BitmexRestError> {
        Self::with_base_url(credentials, Venue::Bitmex.rest_base_url(environment), timeout)
    }

    /// Create a client against an explicit base URL.
    pub fn with_base_url(
        credentials: ApiCredentials,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, BitmexRestError> {
        Ok(Self {
            client: RestClient::new(base_url, timeout)?,
            credentials,
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    // ========================================================================
    // Orders
    // ========================================================================

    /// POST /api/v1/order
    pub async fn place_order(&self, order: &NewOrder) -> Result<BitmexOrder, BitmexRestError> {
        tracing::info!(
            symbol = %order.symbol,
            side = order.side,
            ord_type = order.ord_type,
            order_qty = %order.order_qty,
            price = ?order.price,
            stop_px = ?order.stop_px,
            exec_inst = ?order.exec_inst,
            cl_ord_id = ?order.cl_ord_id,
            "Placing order"
        );

        let placed: BitmexOrder = self
            .signed(Method::POST, "/order", &[], Some(to_body(order)?))
            .await?;

        tracing::info!(
            order_id = %placed.order_id,
            status = ?placed.ord_status,
            "Order placed"
        );
        Ok(placed)
    }

    /// PUT /api/v1/order
    pub async fn amend_order(&self, amend: &AmendOrder) -> Result<BitmexOrder, BitmexRestError> {
        tracing::info!(
            order_id = %amend.order_id,
            order_qty = ?amend.order_qty,
            price = ?amend.price,
            stop_px = ?amend.stop_px,
            "Amending order"
        );

        self.signed(Method::PUT, "/order", &[], Some(to_body(amend)?))
            .await
    }

    /// Cancel by order ids, in one request.
    ///
    /// DELETE /api/v1/order
    pub async fn cancel_orders(&self, order_ids: &[String]) -> Result<Vec<BitmexOrder>, BitmexRestError> {
        tracing::info!(order_ids = ?order_ids, "Canceling orders");
        self.signed(
            Method::DELETE,
            "/order",
            &[],
            Some(json!({ "orderID": order_ids }).to_string()),
        )
        .await
    }

    /// Cancel by client order id.
    ///
    /// DELETE /api/v1/order
    pub async fn cancel_by_client_id(&self, cl_ord_id: &str) -> Result<Vec<BitmexOrder>, BitmexRestError> {
        tracing::info!(cl_ord_id = %cl_ord_id, "Canceling order");
        self.signed(
            Method::DELETE,
            "/order",
            &[],
            Some(json!({ "clOrdID": cl_ord_id }).to_string()),
        )
        .await
    }

    /// Cancel every order of the symbol matching `filter` (e.g. `{"side": "Buy"}`).
    ///
    /// DELETE /api/v1/order/all
    pub async fn cancel_all(
        &self,
        symbol: &str,
        filter: Option<&Value>,
    ) -> Result<Vec<BitmexOrder>, BitmexRestError> {
        let mut body = json!({ "symbol": symbol });
        if let Some(f) = filter {
            body["filter"] = f.clone();
        }

        tracing::info!(symbol = %symbol, filter = ?filter, "Canceling all orders");
        self.signed(Method::DELETE, "/order/all", &[], Some(body.to_string()))
            .await
    }

    /// Open orders of the symbol.
    ///
    /// GET /api/v1/order
    pub async fn open_orders(&self, symbol: &str) -> Result<Vec<BitmexOrder>, BitmexRestError> {
        let filter = json!({ "open": true }).to_string();
        self.signed(
            Method::GET,
            "/order",
            &[("symbol", symbol), ("filter", &filter), ("count", MAX_COUNT)],
            None,
        )
        .await
    }

    // ========================================================================
    // Account
    // ========================================================================

    /// GET /api/v1/user/margin
    pub async fn margin(&self) -> Result<Margin, BitmexRestError> {
        self.signed(Method::GET, "/user/margin", &[("currency", "XBt")], None)
            .await
    }

    /// GET /api/v1/position
    ///
    /// `None` when the account never traded the symbol.
    pub async fn position(&self, symbol: &str) -> Result<Option<BitmexPosition>, BitmexRestError> {
        let filter = json!({ "symbol": symbol }).to_string();
        let rows: Vec<BitmexPosition> = self
            .signed(Method::GET, "/position", &[("filter", &filter)], None)
            .await?;
        Ok(rows.into_iter().find(|p| p.symbol == symbol))
    }

    /// Execution history of the symbol, most recent first.
    ///
    /// GET /api/v1/execution
    pub async fn executions(
        &self,
        symbol: &str,
    ) -> Result<Vec<serde_json::Map<String, Value>>, BitmexRestError> {
        let rows: Vec<serde_json::Map<String, Value>> = self
            .signed(
                Method::GET,
                "/execution",
                &[("symbol", symbol), ("count", MAX_COUNT), ("reverse", "true")],
                None,
            )
            .await?;

        tracing::debug!(symbol = %symbol, rows = rows.len(), "Executions fetched");
        Ok(rows)
    }

    // ========================================================================
    // Market Data
    // ========================================================================

    /// GET /api/v1/instrument
    pub async fn instrument(&self, symbol: &str) -> Result<BitmexInstrument, BitmexRestError> {
        let rows: Vec<BitmexInstrument> = self
            .signed(Method::GET, "/instrument", &[("symbol", symbol)], None)
            .await?;

        rows.into_iter()
            .find(|i| i.symbol == symbol)
            .ok_or_else(|| BitmexRestError::NotFound {
                what: "instrument",
                symbol: symbol.to_string(),
            })
    }

    /// Price of the most recent trade.
    ///
    /// GET /api/v1/trade
    pub async fn last_trade_price(
        &self,
        symbol: &str,
    ) -> Result<Option<rust_decimal::Decimal>, BitmexRestError> {
        let rows: Vec<TradePrice> = self
            .signed(
                Method::GET,
                "/trade",
                &[
                    ("symbol", symbol),
                    ("count", "1"),
                    ("columns", "price"),
                    ("reverse", "true"),
                ],
                None,
            )
            .await?;

        Ok(rows.into_iter().next().and_then(|t| t.price))
    }

    // ========================================================================
    // Signing
    // ========================================================================

    async fn signed<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        params: &[(&str, &str)],
        body: Option<String>,
    ) -> Result<T, BitmexRestError> {
        let path = format!("{}{}", API_PREFIX, endpoint);
        let query = encode_query(params);
        let signed_path = if query.is_empty() {
            path.clone()
        } else {
            format!("{}?{}", path, query)
        };

        let expires = chrono::Utc::now().timestamp() + EXPIRES_AFTER_SECS;
        let signature = RequestSigner::new(&self.credentials).sign_bitmex(
            method.as_str(),
            &signed_path,
            expires,
            body.as_deref().unwrap_or(""),
        );
        let expires = expires.to_string();

        let headers = [
            ("api-expires", expires.as_str()),
            ("api-key", self.credentials.api_key()),
            ("api-signature", signature.as_str()),
        ];

        let response = self
            .client
            .request(method, &path, Some(&query), body.as_deref(), Some(&headers))
            .await?;
        Ok(response)
    }
}

impl std::fmt::Debug for BitmexRestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitmexRestClient")
            .field("base_url", &self.client.base_url())
            .field("api_key", &self.credentials.api_key())
            .finish()
    }
}

/// URL-encode query parameters in order.
fn encode_query(params: &[(&str, &str)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish()
}

fn to_body<T: Serialize>(value: &T) -> Result<String, BitmexRestError> {
    serde_json::to_string(value).map_err(|e| BitmexRestError::Encode(e.to_string()))
}
