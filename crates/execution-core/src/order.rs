//! Order requests, acknowledgements and status enums.

use crate::error::ExecutionError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Side and absolute size of a signed quantity (negative = sell).
    ///
    /// Returns `None` for zero.
    pub fn from_signed(quantity: Decimal) -> Option<(Self, Decimal)> {
        if quantity > Decimal::ZERO {
            Some((Self::Buy, quantity))
        } else if quantity < Decimal::ZERO {
            Some((Self::Sell, -quantity))
        } else {
            None
        }
    }

    /// Parse any venue spelling (`BUY`, `Buy`, `buy`).
    pub fn from_venue_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "buy" => Some(Self::Buy),
            "sell" => Some(Self::Sell),
            _ => None,
        }
    }

    /// Binance spelling.
    pub fn as_binance_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }

    /// BitMEX spelling.
    pub fn as_bitmex_str(&self) -> &'static str {
        match self {
            Self::Buy => "Buy",
            Self::Sell => "Sell",
        }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Limit,
    Market,
    Stop,
}

impl OrderType {
    /// Parse any venue spelling.
    pub fn from_venue_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "LIMIT" => Some(Self::Limit),
            "MARKET" => Some(Self::Market),
            "STOP" | "STOP_LOSS" => Some(Self::Stop),
            _ => None,
        }
    }

    /// Binance spelling.
    pub fn as_binance_str(&self) -> &'static str {
        match self {
            Self::Limit => "LIMIT",
            Self::Market => "MARKET",
            Self::Stop => "STOP_LOSS",
        }
    }

    /// BitMEX spelling.
    pub fn as_bitmex_str(&self) -> &'static str {
        match self {
            Self::Limit => "Limit",
            Self::Market => "Market",
            Self::Stop => "Stop",
        }
    }
}

/// Order lifecycle status as reported by a venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    Triggered,
    Unknown,
}

impl OrderStatus {
    /// Canonical spelling, as found in execution rows.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::PartiallyFilled => "PartiallyFilled",
            Self::Filled => "Filled",
            Self::Canceled => "Canceled",
            Self::Triggered => "Triggered",
            Self::Unknown => "Unknown",
        }
    }

    /// Map a venue status string. Unrecognised values become `Unknown`.
    pub fn from_venue_str(s: &str) -> Self {
        match s {
            "New" | "NEW" => Self::New,
            "PartiallyFilled" | "PARTIALLY_FILLED" => Self::PartiallyFilled,
            "Filled" | "FILLED" => Self::Filled,
            "Canceled" | "CANCELED" | "Cancelled" => Self::Canceled,
            "Triggered" | "TRIGGERED" => Self::Triggered,
            _ => Self::Unknown,
        }
    }

    /// Check if the order can no longer change.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Filled | Self::Canceled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A new order, immutable once submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub side: Side,
    /// Absolute quantity, always positive.
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub order_type: OrderType,
    /// Venue execution instruction (e.g. `Close`, `ParticipateDoNotInitiate`).
    pub execution_instruction: Option<String>,
    /// Client order id sent to the venue, if any.
    pub client_order_id: Option<String>,
}

impl OrderRequest {
    /// Limit order.
    pub fn limit(side: Side, quantity: Decimal, price: Decimal) -> Self {
        Self::new(side, quantity, Some(price), None, OrderType::Limit)
    }

    /// Market order.
    pub fn market(side: Side, quantity: Decimal) -> Self {
        Self::new(side, quantity, None, None, OrderType::Market)
    }

    /// Stop-market order.
    pub fn stop(side: Side, quantity: Decimal, stop_price: Decimal) -> Self {
        Self::new(side, quantity, None, Some(stop_price), OrderType::Stop)
    }

    fn new(
        side: Side,
        quantity: Decimal,
        price: Option<Decimal>,
        stop_price: Option<Decimal>,
        order_type: OrderType,
    ) -> Self {
        Self {
            side,
            quantity,
            price,
            stop_price,
            order_type,
            execution_instruction: None,
            client_order_id: None,
        }
    }

    /// Builder method to set the execution instruction.
    pub fn with_execution_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.execution_instruction = Some(instruction.into());
        self
    }

    /// Builder method to set the client order id.
    pub fn with_client_order_id(mut self, client_order_id: impl Into<String>) -> Self {
        self.client_order_id = Some(client_order_id.into());
        self
    }

    /// Check the fields every venue requires, before any network call.
    pub fn validate(&self) -> Result<(), ExecutionError> {
        if self.quantity <= Decimal::ZERO {
            return Err(ExecutionError::InvalidOrder(format!(
                "quantity must be positive, got {}",
                self.quantity
            )));
        }

        match self.order_type {
            OrderType::Limit if self.price.is_none() => Err(ExecutionError::InvalidOrder(
                "limit order requires a price".into(),
            )),
            OrderType::Stop if self.stop_price.is_none() => Err(ExecutionError::InvalidOrder(
                "stop order requires a stop price".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Price times quantity, when a price is known.
    pub fn notional(&self) -> Option<Decimal> {
        self.price.map(|p| p * self.quantity)
    }
}

/// Fields to change on a resting order. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderAmend {
    pub side: Option<Side>,
    pub quantity: Option<Decimal>,
    pub price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub order_type: Option<OrderType>,
}

impl OrderAmend {
    /// Builder method to set the quantity.
    pub fn with_quantity(mut self, quantity: Decimal) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// Builder method to set the price.
    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    /// Builder method to set the stop price.
    pub fn with_stop_price(mut self, stop_price: Decimal) -> Self {
        self.stop_price = Some(stop_price);
        self
    }

    /// Builder method to set the side.
    pub fn with_side(mut self, side: Side) -> Self {
        self.side = Some(side);
        self
    }

    /// True if nothing would change.
    pub fn is_empty(&self) -> bool {
        self.side.is_none()
            && self.quantity.is_none()
            && self.price.is_none()
            && self.stop_price.is_none()
            && self.order_type.is_none()
    }
}

/// Venue acknowledgement of an order mutation.
///
/// Never mutated; an amend produces a new ack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAck {
    pub order_id: String,
    pub status: OrderStatus,
    pub price: Option<Decimal>,
    pub original_qty: Option<Decimal>,
    pub executed_qty: Option<Decimal>,
    pub side: Option<String>,
}

impl OrderAck {
    /// Ack carrying only an id and a status.
    pub fn bare(order_id: impl Into<String>, status: OrderStatus) -> Self {
        Self {
            order_id: order_id.into(),
            status,
            price: None,
            original_qty: None,
            executed_qty: None,
            side: None,
        }
    }
}

/// Summary of a resting order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenOrder {
    pub order_id: String,
    pub client_order_id: String,
    pub side: Option<Side>,
    pub order_type: Option<OrderType>,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub display_qty: Option<Decimal>,
}

/// What to cancel.
#[derive(Debug, Clone, PartialEq)]
pub enum CancelTarget {
    /// A single venue order id.
    One(String),
    /// Several venue order ids in one bulk call.
    Many(Vec<String>),
    /// Venue-specific filter (e.g. `{"side": "Buy"}` or `{"origClientOrderId": ...}`).
    Filter(BTreeMap<String, String>),
}

impl CancelTarget {
    /// Order ids named explicitly by this target.
    pub fn order_ids(&self) -> &[String] {
        match self {
            Self::One(id) => std::slice::from_ref(id),
            Self::Many(ids) => ids,
            Self::Filter(_) => &[],
        }
    }
}
