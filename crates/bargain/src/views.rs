//! Named price and balance views.

use execution_core::Side;
use std::fmt;
use std::str::FromStr;

/// Which price [`Bargain::price`](crate::Bargain::price) returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceKind {
    /// Ask minus bid.
    Spread,
    /// Cached reference (index) price. `force_live` skips the cache.
    Index { force_live: bool },
    /// Price that takes liquidity: ask for a buy, bid for a sell.
    Last(Side),
    /// Price that provides liquidity: bid for a buy, ask for a sell.
    MarketMaker(Side),
    /// Venue mark price.
    Mark,
    /// Bid/ask midpoint.
    Mid,
    /// Mid minus the index price.
    RefDelta,
    /// Any price field the venue reports, by name (e.g. `lastPrice`).
    Named(String),
}

impl fmt::Display for PriceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spread => write!(f, "spread"),
            Self::Index { force_live: false } => write!(f, "index"),
            Self::Index { force_live: true } => write!(f, "index-live"),
            Self::Last(Side::Buy) => write!(f, "last-buy"),
            Self::Last(Side::Sell) => write!(f, "last-sell"),
            Self::MarketMaker(Side::Buy) => write!(f, "maker-buy"),
            Self::MarketMaker(Side::Sell) => write!(f, "maker-sell"),
            Self::Mark => write!(f, "mark"),
            Self::Mid => write!(f, "mid"),
            Self::RefDelta => write!(f, "ref-delta"),
            Self::Named(name) => write!(f, "{}", name),
        }
    }
}

impl FromStr for PriceKind {
    type Err = ParsePriceKindError;

    /// Short names are matched case-insensitively; anything else is taken
    /// as a venue field name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParsePriceKindError(s.to_string()));
        }

        Ok(match s.to_ascii_lowercase().as_str() {
            "spread" | "delta" => Self::Spread,
            "index" | "indexprice" => Self::Index { force_live: false },
            "index-live" => Self::Index { force_live: true },
            "last-buy" | "last" => Self::Last(Side::Buy),
            "last-sell" => Self::Last(Side::Sell),
            "maker-buy" | "maker" => Self::MarketMaker(Side::Buy),
            "maker-sell" => Self::MarketMaker(Side::Sell),
            "mark" | "market" | "markprice" => Self::Mark,
            "mid" | "lastmidprice" => Self::Mid,
            "ref-delta" => Self::RefDelta,
            _ => Self::Named(s.to_string()),
        })
    }
}

/// Error parsing a price kind.
#[derive(Debug, Clone)]
pub struct ParsePriceKindError(String);

impl fmt::Display for ParsePriceKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid price kind '{}'", self.0)
    }
}

impl std::error::Error for ParsePriceKindError {}

/// Unit of [`Bargain::balance`](crate::Bargain::balance).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceUnit {
    /// Venue units (satoshi on BitMEX) times position leverage.
    Native,
    /// Native balance converted from satoshi to XBT.
    Xbt,
    /// XBT balance valued at the given price.
    Usd(PriceKind),
}
