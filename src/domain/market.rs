use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-attendee market rate band for one (category, location) pair.
///
/// Rates are currency per attendee. Read-mostly reference data; providers may
/// cache bands on a bounded TTL, so a stale band degrades quality, not
/// validity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketRateBand {
    pub min_rate: Decimal,
    pub avg_rate: Decimal,
    pub max_rate: Decimal,
    /// 0..=1, scales supply/demand pressure for this category.
    pub volatility: Decimal,
}

impl MarketRateBand {
    /// Band scaled by a location cost multiplier. Volatility is a property of
    /// the category, not the city, and stays untouched.
    pub fn scaled(&self, multiplier: Decimal) -> Self {
        Self {
            min_rate: self.min_rate * multiplier,
            avg_rate: self.avg_rate * multiplier,
            max_rate: self.max_rate * multiplier,
            volatility: self.volatility,
        }
    }
}
