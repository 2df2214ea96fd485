//! Binance REST API client.

use crate::error::BinanceRestError;
use crate::responses::{
    AccountResponse, BookTickerResponse, CancelOrderResponse, ExchangeInfoResponse,
    NewOrderResponse, OrderQueryResponse, ServerTimeResponse, SymbolInfo,
};
use auth::{ApiCredentials, RequestSigner};
use common::{Environment, Venue};
use execution_core::OrderRequest;
use rest_client::RestClient;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

/// Request timeout for Binance API calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Binance REST API client with authentication support.
pub struct BinanceRestClient {
    client: RestClient,
    credentials: ApiCredentials,
    /// Time offset between local clock and Binance server (local - server).
    time_offset_ms: AtomicI64,
}

impl BinanceRestClient {
    /// Create a client for an environment.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        credentials: ApiCredentials,
        environment: Environment,
    ) -> Result<Self, BinanceRestError> {
        Self::with_base_url(credentials, Venue::Binance.rest_base_url(environment))
    }

    /// Create a client against an explicit base URL.
    pub fn with_base_url(
        credentials: ApiCredentials,
        base_url: &str,
    ) -> Result<Self, BinanceRestError> {
        let client = RestClient::new(base_url, REQUEST_TIMEOUT)?;

        Ok(Self {
            client,
            credentials,
            time_offset_ms: AtomicI64::new(0),
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    /// Get the current server timestamp adjusted for time offset.
    pub fn server_timestamp_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis() - self.time_offset_ms.load(Ordering::Relaxed)
    }

    // ========================================================================
    // Time Synchronization
    // ========================================================================

    /// Synchronize with Binance server time.
    ///
    /// Signed requests are rejected when the timestamp drifts outside the
    /// receive window, so this runs before the first signed call.
    pub async fn sync_time(&self) -> Result<(), BinanceRestError> {
        let before = std::time::Instant::now();
        let response: ServerTimeResponse = self.client.get("/api/v3/time", None, None).await?;
        let rtt = before.elapsed().as_millis() as i64;

        let local_time = chrono::Utc::now().timestamp_millis();

        // Estimate server time at midpoint of request
        let estimated_server_time = response.server_time + (rtt / 2);
        let offset = local_time - estimated_server_time;

        self.time_offset_ms.store(offset, Ordering::Relaxed);

        tracing::info!(
            server_time = response.server_time,
            local_time = local_time,
            offset_ms = offset,
            rtt_ms = rtt,
            "Time synchronized with Binance server"
        );

        Ok(())
    }

    // ========================================================================
    // Market Data
    // ========================================================================

    /// Symbol metadata and trading filters.
    ///
    /// GET /api/v3/exchangeInfo
    pub async fn get_symbol_info(&self, symbol: &str) -> Result<SymbolInfo, BinanceRestError> {
        let query = format!("symbol={}", symbol);
        let response: ExchangeInfoResponse = self
            .client
            .get("/api/v3/exchangeInfo", Some(&query), None)
            .await?;

        response
            .symbols
            .into_iter()
            .find(|s| s.symbol == symbol)
            .ok_or_else(|| BinanceRestError::UnknownSymbol(symbol.to_string()))
    }

    /// Best bid and ask.
    ///
    /// GET /api/v3/ticker/bookTicker
    pub async fn get_book_ticker(
        &self,
        symbol: &str,
    ) -> Result<BookTickerResponse, BinanceRestError> {
        let query = format!("symbol={}", symbol);
        let response = self
            .client
            .get("/api/v3/ticker/bookTicker", Some(&query), None)
            .await?;
        Ok(response)
    }

    // ========================================================================
    // Account
    // ========================================================================

    /// Account balances.
    ///
    /// GET /api/v3/account
    pub async fn get_account(&self) -> Result<AccountResponse, BinanceRestError> {
        self.signed_get("/api/v3/account", &[]).await
    }

    // ========================================================================
    // Order Management
    // ========================================================================

    /// Place a new order. The request must already be quantized.
    ///
    /// POST /api/v3/order
    pub async fn place_order(
        &self,
        symbol: &str,
        request: &OrderRequest,
    ) -> Result<NewOrderResponse, BinanceRestError> {
        let mut params: Vec<(&str, String)> = vec![
            ("symbol", symbol.to_string()),
            ("side", request.side.as_binance_str().to_string()),
            ("type", request.order_type.as_binance_str().to_string()),
            ("quantity", request.quantity.to_string()),
            ("newOrderRespType", "FULL".to_string()),
        ];

        if let Some(p) = request.price {
            params.push(("price", p.to_string()));
            params.push(("timeInForce", "GTC".to_string()));
        }

        if let Some(sp) = request.stop_price {
            params.push(("stopPrice", sp.to_string()));
        }

        if let Some(id) = &request.client_order_id {
            params.push(("newClientOrderId", id.clone()));
        }

        let param_refs: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let signed_query = self.sign(&param_refs);
        let headers = [("X-MBX-APIKEY", self.credentials.api_key())];

        tracing::info!(
            symbol = %symbol,
            side = ?request.side,
            order_type = ?request.order_type,
            quantity = %request.quantity,
            price = ?request.price,
            client_order_id = ?request.client_order_id,
            "Placing order"
        );

        let response: NewOrderResponse = self
            .client
            .post("/api/v3/order", Some(&signed_query), None, Some(&headers))
            .await?;

        tracing::info!(
            order_id = response.order_id,
            status = %response.status,
            "Order placed"
        );

        Ok(response)
    }

    /// Query an order by exchange order ID.
    ///
    /// GET /api/v3/order
    pub async fn query_order(
        &self,
        symbol: &str,
        order_id: &str,
    ) -> Result<OrderQueryResponse, BinanceRestError> {
        self.signed_get("/api/v3/order", &[("symbol", symbol), ("orderId", order_id)])
            .await
    }

    /// Orders resting on the book.
    ///
    /// GET /api/v3/openOrders
    pub async fn get_open_orders(
        &self,
        symbol: &str,
    ) -> Result<Vec<OrderQueryResponse>, BinanceRestError> {
        self.signed_get("/api/v3/openOrders", &[("symbol", symbol)])
            .await
    }

    /// Every order of the symbol, any state.
    ///
    /// GET /api/v3/allOrders
    pub async fn get_all_orders(
        &self,
        symbol: &str,
    ) -> Result<Vec<OrderQueryResponse>, BinanceRestError> {
        self.signed_get("/api/v3/allOrders", &[("symbol", symbol)])
            .await
    }

    /// Cancel one order. `params` selects it (`orderId` or `origClientOrderId`).
    ///
    /// DELETE /api/v3/order
    pub async fn cancel_order(
        &self,
        symbol: &str,
        params: &[(&str, &str)],
    ) -> Result<CancelOrderResponse, BinanceRestError> {
        let mut all = vec![("symbol", symbol)];
        all.extend_from_slice(params);
        let signed_query = self.sign(&all);
        let headers = [("X-MBX-APIKEY", self.credentials.api_key())];

        tracing::info!(symbol = %symbol, params = ?params, "Canceling order");

        let response: CancelOrderResponse = self
            .client
            .delete("/api/v3/order", Some(&signed_query), None, Some(&headers))
            .await?;

        tracing::info!(
            order_id = response.order_id,
            status = ?response.status,
            "Order canceled"
        );

        Ok(response)
    }

    /// Cancel every open order of the symbol.
    ///
    /// DELETE /api/v3/openOrders
    pub async fn cancel_open_orders(
        &self,
        symbol: &str,
    ) -> Result<Vec<CancelOrderResponse>, BinanceRestError> {
        let signed_query = self.sign(&[("symbol", symbol)]);
        let headers = [("X-MBX-APIKEY", self.credentials.api_key())];

        tracing::info!(symbol = %symbol, "Canceling all open orders");

        let response: Vec<CancelOrderResponse> = self
            .client
            .delete("/api/v3/openOrders", Some(&signed_query), None, Some(&headers))
            .await?;

        tracing::info!(canceled = response.len(), "Open orders canceled");
        Ok(response)
    }

    fn sign(&self, params: &[(&str, &str)]) -> String {
        RequestSigner::new(&self.credentials).sign_params_ordered(params, self.server_timestamp_ms())
    }

    async fn signed_get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, BinanceRestError> {
        let signed_query = self.sign(params);
        let headers = [("X-MBX-APIKEY", self.credentials.api_key())];

        let response = self
            .client
            .get(path, Some(&signed_query), Some(&headers))
            .await?;
        Ok(response)
    }
}

impl std::fmt::Debug for BinanceRestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinanceRestClient")
            .field("base_url", &self.client.base_url())
            .field("api_key", &self.credentials.api_key())
            .field(
                "time_offset_ms",
                &self.time_offset_ms.load(Ordering::Relaxed),
            )
            .finish()
    }
}
