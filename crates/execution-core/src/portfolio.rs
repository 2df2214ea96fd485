//! Portfolio exposure across contracts.

use crate::error::ExecutionError;
use crate::market::{FutureType, Instrument};
use rust_decimal::Decimal;
use serde::Serialize;

/// One contract's position together with its specification.
#[derive(Debug, Clone)]
pub struct PortfolioEntry {
    pub instrument: Instrument,
    pub current_qty: Decimal,
}

impl PortfolioEntry {
    pub fn new(instrument: Instrument, current_qty: Decimal) -> Self {
        Self {
            instrument,
            current_qty,
        }
    }

    /// Exposure of this position valued at `price`.
    pub fn exposure(&self, price: Decimal) -> Result<Decimal, ExecutionError> {
        let qty = self.current_qty;
        let multiplier = self.instrument.multiplier;

        match &self.instrument.future_type {
            FutureType::Quanto => Ok(qty * multiplier * price),
            FutureType::Inverse => {
                if price.is_zero() {
                    return Err(ExecutionError::InvalidVenueData(format!(
                        "{} has a zero price",
                        self.instrument.symbol
                    )));
                }
                Ok(multiplier / price * qty)
            }
            FutureType::Linear => Ok(multiplier * qty),
            FutureType::Other(kind) => Err(ExecutionError::UnknownInstrumentType {
                symbol: self.instrument.symbol.clone(),
                future_type: kind.clone(),
            }),
        }
    }
}

/// Total exposure at fair and mark price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PortfolioDelta {
    pub fair_price: Decimal,
    pub mark_price: Decimal,
    /// `mark_price - fair_price`.
    pub basis: Decimal,
}

/// Sum exposure over every entry. Any unknown instrument type aborts the
/// whole computation.
pub fn portfolio_delta(entries: &[PortfolioEntry]) -> Result<PortfolioDelta, ExecutionError> {
    let mut delta = PortfolioDelta::default();

    for entry in entries {
        delta.fair_price += entry.exposure(entry.instrument.fair_price)?;
        delta.mark_price += entry.exposure(entry.instrument.mark_price)?;
    }
    delta.basis = delta.mark_price - delta.fair_price;

    Ok(delta)
}
