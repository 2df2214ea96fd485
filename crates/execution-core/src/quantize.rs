//! Venue precision rules for quantity and price.

use crate::error::ExecutionError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lot, price and notional filters of one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolFilters {
    pub step_size: Decimal,
    pub min_qty: Decimal,
    pub tick_size: Decimal,
    pub min_notional: Decimal,
}

impl SymbolFilters {
    /// Floor to the step size, then raise to the minimum quantity if below it.
    ///
    /// A zero step leaves the quantity unrounded.
    pub fn quantize_quantity(&self, quantity: Decimal) -> Decimal {
        let floored = if self.step_size.is_zero() {
            quantity
        } else {
            (quantity / self.step_size).floor() * self.step_size
        };
        floored.max(self.min_qty).normalize()
    }

    /// Round to the nearest tick (banker's rounding on exact halves).
    pub fn quantize_price(&self, price: Decimal) -> Decimal {
        round_to_tick(price, self.tick_size)
    }

    /// Quantize both values and enforce the minimum notional.
    ///
    /// The notional check only applies when a price is known.
    pub fn validate(
        &self,
        quantity: Decimal,
        price: Option<Decimal>,
    ) -> Result<(Decimal, Option<Decimal>), ExecutionError> {
        let quantity = self.quantize_quantity(quantity);
        let price = price.map(|p| self.quantize_price(p));

        if let Some(p) = price {
            let notional = quantity * p;
            if notional < self.min_notional {
                return Err(ExecutionError::InvalidOrder(format!(
                    "notional {} below minimum {}",
                    notional, self.min_notional
                )));
            }
        }

        Ok((quantity, price))
    }
}

/// Round `price` to the nearest multiple of `tick`. A zero tick is a no-op.
pub fn round_to_tick(price: Decimal, tick: Decimal) -> Decimal {
    if tick.is_zero() {
        return price;
    }
    ((price / tick).round() * tick).normalize()
}
