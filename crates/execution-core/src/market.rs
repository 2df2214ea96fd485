//! Read-only market and account snapshots fetched from a venue.

use crate::error::ExecutionError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// How a contract's multiplier and price combine into exposure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FutureType {
    Quanto,
    Inverse,
    Linear,
    /// Anything a venue reports that is none of the above.
    Other(String),
}

impl FutureType {
    /// Derive from BitMEX instrument flags.
    pub fn from_flags(is_quanto: bool, is_inverse: bool) -> Self {
        match (is_quanto, is_inverse) {
            (true, false) => Self::Quanto,
            (false, true) => Self::Inverse,
            (false, false) => Self::Linear,
            (true, true) => Self::Other("Quanto+Inverse".into()),
        }
    }
}

impl fmt::Display for FutureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quanto => f.write_str("Quanto"),
            Self::Inverse => f.write_str("Inverse"),
            Self::Linear => f.write_str("Linear"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// Contract specification and current reference prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    pub future_type: FutureType,
    /// Contract multiplier, already divided by the settlement multiplier.
    pub multiplier: Decimal,
    pub mark_price: Decimal,
    pub fair_price: Decimal,
    pub tick_size: Option<Decimal>,
}

/// Account position in one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    /// Signed size: positive long, negative short.
    pub current_qty: Decimal,
    pub leverage: Option<Decimal>,
    pub avg_entry_price: Option<Decimal>,
    pub liquidation_price: Option<Decimal>,
}

impl Position {
    /// A flat position.
    pub fn flat(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            current_qty: Decimal::ZERO,
            leverage: None,
            avg_entry_price: None,
            liquidation_price: None,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.current_qty.is_zero()
    }
}

/// Named prices for one symbol (`bidPrice`, `askPrice`, `markPrice`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub symbol: String,
    pub prices: BTreeMap<String, Decimal>,
}

impl PriceSnapshot {
    pub const BID: &'static str = "bidPrice";
    pub const ASK: &'static str = "askPrice";
    pub const MID: &'static str = "midPrice";
    pub const MARK: &'static str = "markPrice";
    pub const LAST: &'static str = "lastPrice";

    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            prices: BTreeMap::new(),
        }
    }

    /// Builder method to add a named price.
    pub fn with(mut self, name: &str, price: Decimal) -> Self {
        self.prices.insert(name.to_string(), price);
        self
    }

    /// A named price, or `InvalidVenueData` if the venue did not send it.
    pub fn get(&self, name: &str) -> Result<Decimal, ExecutionError> {
        self.prices.get(name).copied().ok_or_else(|| {
            ExecutionError::InvalidVenueData(format!("{} has no {}", self.symbol, name))
        })
    }

    pub fn bid(&self) -> Result<Decimal, ExecutionError> {
        self.get(Self::BID)
    }

    pub fn ask(&self) -> Result<Decimal, ExecutionError> {
        self.get(Self::ASK)
    }

    pub fn mark(&self) -> Result<Decimal, ExecutionError> {
        self.get(Self::MARK)
    }

    /// The venue's mid price, or the bid/ask midpoint when it sends none.
    pub fn mid(&self) -> Result<Decimal, ExecutionError> {
        match self.prices.get(Self::MID) {
            Some(mid) => Ok(*mid),
            None => Ok((self.bid()? + self.ask()?) / Decimal::TWO),
        }
    }
}

/// Available funds in one currency, in venue units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub currency: String,
    pub available: Decimal,
}
