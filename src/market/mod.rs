//! Market Intelligence Provider
//!
//! Location cost multipliers, seasonal demand, supply/demand pressure, and
//! per-category market rate bands. Everything here is derived from fixed
//! reference tables; the injected cache only short-circuits recomputation and
//! its absence must not change any output.

pub mod cache;

pub use cache::{MarketCache, MemoryCache, NoopCache};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::catalog::normalize_event_type;
use crate::config::CacheConfig;
use crate::domain::{CategoryId, MarketRateBand};
use crate::error::Result;

/// Market data seam the allocation engine consumes. The default
/// implementation is table-backed and infallible; fallible implementations
/// surface `MarketDataUnavailable`, which the engine treats as "skip the
/// market-dependent adjustments", never as a hard failure.
#[cfg_attr(test, mockall::automock)]
pub trait MarketData: Send + Sync {
    /// Location cost multiplier. Unknown locations get the tier-3 default.
    fn location_multiplier(&self, location: &str) -> Decimal;

    /// Demand multiplier for (event type, month). 1.0 when the pair is absent.
    fn seasonal_multiplier(&self, event_type: &str, month: u32) -> Decimal;

    /// Supply/demand pressure factor centered near 1.0.
    fn supply_demand_factor(
        &self,
        category: CategoryId,
        location: &str,
        attendee_count: u32,
    ) -> Result<Decimal>;

    /// Per-attendee rate band for (category, location).
    fn market_rate_band(&self, category: CategoryId, location: &str) -> Result<MarketRateBand>;
}

// City cost multipliers. Tier-1 metros 1.5-1.8x, tier-2 1.1-1.3x, everything
// else the tier-3 default.
const LOCATION_MULTIPLIERS: &[(&str, Decimal)] = &[
    ("mumbai", dec!(1.8)),
    ("delhi", dec!(1.7)),
    ("bangalore", dec!(1.6)),
    ("bengaluru", dec!(1.6)),
    ("gurgaon", dec!(1.5)),
    ("hyderabad", dec!(1.3)),
    ("goa", dec!(1.3)),
    ("chennai", dec!(1.25)),
    ("pune", dec!(1.2)),
    ("kolkata", dec!(1.15)),
    ("ahmedabad", dec!(1.1)),
    ("jaipur", dec!(1.1)),
    ("lucknow", dec!(0.95)),
    ("indore", dec!(0.9)),
    ("nagpur", dec!(0.9)),
];

const TIER3_DEFAULT: Decimal = dec!(0.9);

// (event type, month, multiplier). Pairs not listed are 1.0.
const SEASONAL_MULTIPLIERS: &[(&str, u32, Decimal)] = &[
    ("wedding", 1, dec!(1.3)),
    ("wedding", 2, dec!(1.35)),
    ("wedding", 6, dec!(0.9)),
    ("wedding", 7, dec!(0.85)),
    ("wedding", 11, dec!(1.25)),
    ("wedding", 12, dec!(1.4)),
    ("corporate", 1, dec!(1.1)),
    ("corporate", 3, dec!(1.15)),
    ("corporate", 9, dec!(1.2)),
    ("corporate", 10, dec!(1.25)),
    ("corporate", 12, dec!(0.9)),
    ("conference", 2, dec!(1.1)),
    ("conference", 9, dec!(1.15)),
    ("conference", 10, dec!(1.2)),
    ("concert", 10, dec!(1.3)),
    ("concert", 11, dec!(1.35)),
    ("concert", 12, dec!(1.25)),
    ("festival", 3, dec!(1.2)),
    ("festival", 10, dec!(1.4)),
    ("festival", 11, dec!(1.3)),
];

/// Base per-attendee rate band, before location scaling.
fn base_rate_band(category: CategoryId) -> MarketRateBand {
    let (min_rate, avg_rate, max_rate, volatility) = match category {
        CategoryId::Catering => (dec!(220), dec!(530), dec!(750), dec!(0.30)),
        CategoryId::Venue => (dec!(180), dec!(450), dec!(700), dec!(0.40)),
        CategoryId::Decorations => (dec!(80), dec!(220), dec!(450), dec!(0.30)),
        CategoryId::Photography => (dec!(150), dec!(350), dec!(800), dec!(0.35)),
        CategoryId::Entertainment => (dec!(60), dec!(250), dec!(700), dec!(0.50)),
        CategoryId::AudioVisual => (dec!(50), dec!(160), dec!(400), dec!(0.25)),
        CategoryId::Lighting => (dec!(30), dec!(100), dec!(260), dec!(0.25)),
        CategoryId::Transportation => (dec!(40), dec!(140), dec!(350), dec!(0.20)),
        CategoryId::Security => (dec!(25), dec!(80), dec!(200), dec!(0.15)),
        // Generic low-cost band for categories without their own rate sheet
        CategoryId::Contingency => (dec!(30), dec!(100), dec!(300), dec!(0.20)),
    };
    MarketRateBand {
        min_rate,
        avg_rate,
        max_rate,
        volatility,
    }
}

/// Table-backed market data provider with an injected read-through cache.
pub struct StaticMarketData {
    cache: Arc<dyn MarketCache>,
    band_ttl: Duration,
    pressure_ttl: Duration,
}

impl StaticMarketData {
    pub fn new() -> Self {
        Self::with_cache(Arc::new(MemoryCache::new()))
    }

    pub fn with_cache(cache: Arc<dyn MarketCache>) -> Self {
        let defaults = CacheConfig::default();
        Self {
            cache,
            band_ttl: Duration::from_secs(defaults.band_ttl_secs),
            pressure_ttl: Duration::from_secs(defaults.pressure_ttl_secs),
        }
    }

    pub fn with_cache_config(cache: Arc<dyn MarketCache>, config: &CacheConfig) -> Self {
        Self {
            cache,
            band_ttl: Duration::from_secs(config.band_ttl_secs),
            pressure_ttl: Duration::from_secs(config.pressure_ttl_secs),
        }
    }

    /// Attendee bracket used for pressure cache keys.
    fn attendee_bucket(attendee_count: u32) -> &'static str {
        if attendee_count > 500 {
            "xl"
        } else if attendee_count > 200 {
            "lg"
        } else if attendee_count < 50 {
            "sm"
        } else {
            "md"
        }
    }

    fn compute_supply_demand(
        &self,
        category: CategoryId,
        location: &str,
        attendee_count: u32,
    ) -> Decimal {
        let mut base = dec!(1.0);
        if attendee_count > 500 {
            base += dec!(0.30);
        } else if attendee_count > 200 {
            base += dec!(0.15);
        } else if attendee_count < 50 {
            base -= dec!(0.05);
        }
        // Scarce supply: venues and photographers book out first
        base += match category {
            CategoryId::Venue | CategoryId::Photography => dec!(0.10),
            CategoryId::Catering | CategoryId::Decorations => dec!(0.05),
            _ => Decimal::ZERO,
        };
        // 0.5 renormalizes the stacked adjustments into a pressure factor
        // centered near 1.0
        base * self.location_multiplier(location) * dec!(0.5)
    }
}

impl Default for StaticMarketData {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketData for StaticMarketData {
    fn location_multiplier(&self, location: &str) -> Decimal {
        let city = location.trim().to_lowercase();
        LOCATION_MULTIPLIERS
            .iter()
            .find(|(name, _)| *name == city)
            .map(|&(_, multiplier)| multiplier)
            .unwrap_or(TIER3_DEFAULT)
    }

    fn seasonal_multiplier(&self, event_type: &str, month: u32) -> Decimal {
        let event_type = normalize_event_type(event_type);
        SEASONAL_MULTIPLIERS
            .iter()
            .find(|(entry_type, entry_month, _)| *entry_type == event_type && *entry_month == month)
            .map(|&(_, _, multiplier)| multiplier)
            .unwrap_or(Decimal::ONE)
    }

    fn supply_demand_factor(
        &self,
        category: CategoryId,
        location: &str,
        attendee_count: u32,
    ) -> Result<Decimal> {
        let key = format!(
            "sdf:{}:{}:{}",
            category,
            location.trim().to_lowercase(),
            Self::attendee_bucket(attendee_count)
        );
        if let Some(cached) = self.cache.get(&key) {
            if let Ok(factor) = serde_json::from_str::<Decimal>(&cached) {
                return Ok(factor);
            }
            debug!(%key, "discarding unparseable cached pressure factor");
        }

        let factor = self.compute_supply_demand(category, location, attendee_count);
        if let Ok(encoded) = serde_json::to_string(&factor) {
            self.cache.set(&key, encoded, self.pressure_ttl);
        }
        Ok(factor)
    }

    fn market_rate_band(&self, category: CategoryId, location: &str) -> Result<MarketRateBand> {
        let key = format!("band:{}:{}", category, location.trim().to_lowercase());
        if let Some(cached) = self.cache.get(&key) {
            if let Ok(band) = serde_json::from_str::<MarketRateBand>(&cached) {
                return Ok(band);
            }
            debug!(%key, "discarding unparseable cached rate band");
        }

        let band = base_rate_band(category).scaled(self.location_multiplier(location));
        if let Ok(encoded) = serde_json::to_string(&band) {
            self.cache.set(&key, encoded, self.band_ttl);
        }
        Ok(band)
    }
}
