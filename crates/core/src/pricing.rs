use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub price: Decimal,
    pub percentage: Decimal,
    pub exchange_rate: Decimal,
    /// Full precision; round only when rendering.
    pub offer: Decimal,
}

pub trait PricingEngine: Send + Sync {
    fn calculate(&self, price: Decimal, percentage: Decimal, exchange_rate: Decimal)
        -> CalculationResult;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DeterministicPricingEngine;

impl PricingEngine for DeterministicPricingEngine {
    fn calculate(
        &self,
        price: Decimal,
        percentage: Decimal,
        exchange_rate: Decimal,
    ) -> CalculationResult {
        CalculationResult {
            price,
            percentage,
            exchange_rate,
            offer: offer(price, percentage, exchange_rate),
        }
    }
}

/// `(price * percentage) / exchange_rate`.
///
/// Inputs are not validated here: callers pass `price > 0`,
/// `0 < percentage <= 1` and `exchange_rate > 0`. Results beyond the decimal
/// range saturate at `Decimal::MAX`.
pub fn offer(price: Decimal, percentage: Decimal, exchange_rate: Decimal) -> Decimal {
    price.saturating_mul(percentage).checked_div(exchange_rate).unwrap_or(Decimal::MAX)
}
