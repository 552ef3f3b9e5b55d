//! Allocation Engine
//!
//! The compute pipeline: preset weights -> service classification -> staged
//! multiplicative adjustments -> bounds-aware normalization -> market band
//! correction -> emitted breakdown. One call, no internal state; concurrent
//! calls share nothing but the immutable catalogue/preset tables and the
//! provider's cache.

use chrono::Datelike;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::catalog::{self, category_rule, DEFAULT_BASE_WEIGHT};
use crate::classifier::classify;
use crate::config::EngineConfig;
use crate::domain::{AllocationRequest, AllocationResult, AnswerValue, CategoryId};
use crate::error::{BudgetError, Result};
use crate::market::MarketData;

/// Categories and weights used when classification resolves nothing. A budget
/// above zero always gets a non-empty breakdown.
const MINIMAL_DEFAULT_WEIGHTS: &[(CategoryId, Decimal)] = &[
    (CategoryId::Catering, dec!(30)),
    (CategoryId::Venue, dec!(25)),
    (CategoryId::Decorations, dec!(15)),
    (CategoryId::Photography, dec!(10)),
    (CategoryId::Entertainment, dec!(10)),
    (CategoryId::Contingency, dec!(10)),
];

/// Breakdown returned when the pipeline itself fails. Exempt from per-category
/// bound enforcement but still sums to 100.
const FALLBACK_PERCENTS: &[(CategoryId, Decimal)] = &[
    (CategoryId::Catering, dec!(35.0)),
    (CategoryId::Venue, dec!(25.0)),
    (CategoryId::Decorations, dec!(15.0)),
    (CategoryId::Entertainment, dec!(10.0)),
    (CategoryId::Photography, dec!(8.0)),
    (CategoryId::Contingency, dec!(7.0)),
];

/// Budget allocation engine.
///
/// Built once and shared; `compute` is a pure function of the request plus
/// the static reference tables. Without a market data provider the engine
/// still produces valid allocations from preset, requirement, and scale
/// adjustments alone.
pub struct AllocationEngine {
    market: Option<Arc<dyn MarketData>>,
    config: EngineConfig,
}

impl AllocationEngine {
    pub fn new(market: Arc<dyn MarketData>) -> Self {
        Self {
            market: Some(market),
            config: EngineConfig::default(),
        }
    }

    /// Engine with no market intelligence. Location, pressure, and band
    /// stages are skipped; all invariants still hold.
    pub fn without_market_data() -> Self {
        Self {
            market: None,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(market: Option<Arc<dyn MarketData>>, config: EngineConfig) -> Self {
        Self { market, config }
    }

    /// Compute a full allocation breakdown.
    ///
    /// Never fails for a positive budget: an unexpected pipeline error is
    /// logged and replaced by the fixed fallback breakdown. A non-positive
    /// budget is rejected with `InvalidInput` before any work happens.
    pub fn compute(&self, request: &AllocationRequest) -> Result<AllocationResult> {
        if request.total_budget <= Decimal::ZERO {
            return Err(BudgetError::InvalidInput(format!(
                "total_budget must be positive: {}",
                request.total_budget
            )));
        }

        match self.compute_inner(request) {
            Ok(result) => Ok(result),
            Err(e) => {
                error!(error = %e, event_type = %request.event_type, "allocation pipeline failed, returning fallback breakdown");
                Ok(self.fallback_allocation(request))
            }
        }
    }

    fn compute_inner(&self, request: &AllocationRequest) -> Result<AllocationResult> {
        let mut weights = self.resolve_weights(request);
        self.apply_location_seasonal(&mut weights, request);
        apply_requirement_adjustments(&mut weights, request);
        apply_scale_adjustments(&mut weights, request);
        self.apply_market_pressure(&mut weights, request);
        let mut percents = normalize(&weights)?;
        self.apply_market_band_correction(&mut percents, request);
        Ok(AllocationResult::from_percents(
            request.total_budget,
            request.attendee_count,
            request.duration_hours,
            &percents,
        ))
    }

    // -----------------------------------------------------------------------
    // Steps 1-3: preset weights, active categories, contingency
    // -----------------------------------------------------------------------

    fn resolve_weights(&self, request: &AllocationRequest) -> BTreeMap<CategoryId, Decimal> {
        let preset = catalog::preset_weights(&request.event_type);

        let mut active: BTreeSet<CategoryId> = BTreeSet::new();
        for service in &request.selected_services {
            if let Some(category) = classify(service) {
                active.insert(category);
            }
        }
        for (requirement_id, selection) in &request.special_requirements {
            if selection.selected {
                if let Some(category) = classify(requirement_id) {
                    active.insert(category);
                }
            }
        }

        let mut weights: BTreeMap<CategoryId, Decimal> = if active.is_empty() {
            debug!(event_type = %request.event_type, "nothing classified, using minimal default set");
            MINIMAL_DEFAULT_WEIGHTS.iter().copied().collect()
        } else {
            // Preset categories outside the active set are dropped; active
            // categories the preset doesn't know get a modest base weight so
            // an explicitly requested service never vanishes.
            active
                .iter()
                .map(|&category| {
                    (
                        category,
                        preset.get(&category).copied().unwrap_or(DEFAULT_BASE_WEIGHT),
                    )
                })
                .collect()
        };

        if category_rule(CategoryId::Contingency).required
            && !weights.contains_key(&CategoryId::Contingency)
        {
            let weight = self.contingency_weight(request);
            debug!(%weight, "force-including contingency");
            weights.insert(CategoryId::Contingency, weight);
        }

        weights
    }

    /// Contingency share sized from event risk factors.
    fn contingency_weight(&self, request: &AllocationRequest) -> Decimal {
        let mut weight = dec!(7);
        if request.attendee_count > 500 {
            weight += dec!(3);
        } else if request.attendee_count > 200 {
            weight += dec!(1);
        }
        if request.duration_hours > 8 {
            weight += dec!(2);
        }
        if let (Some(market), Some(location)) = (self.market.as_ref(), request.location.as_deref())
        {
            if market.location_multiplier(location) > dec!(1.5) {
                weight += dec!(2);
            }
        }
        weight += match catalog::normalize_event_type(&request.event_type) {
            "wedding" => dec!(2),
            "corporate" => dec!(1),
            _ => Decimal::ZERO,
        };
        weight.min(self.config.limits.contingency_cap)
    }

    // -----------------------------------------------------------------------
    // Step 4: location and seasonal bumps
    // -----------------------------------------------------------------------

    fn apply_location_seasonal(
        &self,
        weights: &mut BTreeMap<CategoryId, Decimal>,
        request: &AllocationRequest,
    ) {
        let Some(market) = self.market.as_ref() else {
            return;
        };
        if let Some(location) = request.location.as_deref() {
            let multiplier = market.location_multiplier(location);
            if multiplier > dec!(1.3) {
                scale_weight(weights, CategoryId::Venue, dec!(1.10));
                scale_weight(weights, CategoryId::Catering, dec!(1.05));
                debug!(%location, %multiplier, "high-cost location bump applied");
            }
        }
        if let Some(date) = request.event_date {
            let seasonal = market.seasonal_multiplier(&request.event_type, date.month());
            if seasonal > dec!(1.2) {
                scale_weight(weights, CategoryId::Contingency, dec!(1.3));
                debug!(%seasonal, "peak-season contingency bump applied");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Step 7: market pressure
    // -----------------------------------------------------------------------

    fn apply_market_pressure(
        &self,
        weights: &mut BTreeMap<CategoryId, Decimal>,
        request: &AllocationRequest,
    ) {
        let Some(market) = self.market.as_ref() else {
            return;
        };
        let location = request.location.as_deref().unwrap_or("");
        let clamp = self.config.limits.pressure_clamp;
        for (&category, weight) in weights.iter_mut() {
            if category == CategoryId::Contingency {
                continue;
            }
            let factor = market.supply_demand_factor(category, location, request.attendee_count);
            let band = market.market_rate_band(category, location);
            match (factor, band) {
                (Ok(factor), Ok(band)) => {
                    let pressure = factor * band.volatility;
                    let delta = (pressure - Decimal::ONE).clamp(-clamp, clamp);
                    *weight *= Decimal::ONE + delta;
                }
                _ => {
                    debug!(%category, "market data unavailable, skipping pressure adjustment");
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Step 9: market band correction (single pass)
    // -----------------------------------------------------------------------

    fn apply_market_band_correction(
        &self,
        percents: &mut BTreeMap<CategoryId, Decimal>,
        request: &AllocationRequest,
    ) {
        let Some(market) = self.market.as_ref() else {
            return;
        };
        if request.attendee_count == 0 {
            return;
        }
        let attendees = Decimal::from(request.attendee_count);
        let location = request.location.as_deref().unwrap_or("");

        let mut corrected: BTreeSet<CategoryId> = BTreeSet::new();
        for (&category, percent) in percents.iter_mut() {
            if category == CategoryId::Contingency {
                continue;
            }
            let Ok(band) = market.market_rate_band(category, location) else {
                debug!(%category, "market data unavailable, skipping band correction");
                continue;
            };
            let rule = category_rule(category);
            let per_attendee = request.total_budget * *percent / dec!(100) / attendees;
            if per_attendee < band.min_rate {
                let implied = (band.min_rate * attendees * dec!(100) / request.total_budget)
                    .min(rule.max_percent)
                    .round_dp(1);
                if implied > *percent {
                    debug!(%category, %per_attendee, min_rate = %band.min_rate, "raising under-market share");
                    *percent = implied;
                    corrected.insert(category);
                }
            } else if per_attendee > band.max_rate * dec!(1.2) {
                let implied = (band.avg_rate * attendees * dec!(100) / request.total_budget)
                    .max(rule.min_percent)
                    .round_dp(1);
                if implied < *percent {
                    debug!(%category, %per_attendee, max_rate = %band.max_rate, "lowering over-market share");
                    *percent = implied;
                    corrected.insert(category);
                }
            }
        }

        if corrected.is_empty() {
            return;
        }

        // Single re-normalization: corrected categories hold their share, the
        // rest re-split the remainder. One pass is the contract; no fixed
        // point iteration.
        let locked_sum: Decimal = corrected
            .iter()
            .filter_map(|category| percents.get(category))
            .copied()
            .sum();
        let remaining = dec!(100) - locked_sum;
        let unpinned: BTreeMap<CategoryId, Decimal> = percents
            .iter()
            .filter(|(category, _)| !corrected.contains(category))
            .map(|(&category, &percent)| (category, percent))
            .collect();

        if unpinned.is_empty() || remaining <= Decimal::ZERO {
            // Corrections consumed the whole budget; the 100% invariant wins
            // over holding them fixed
            if let Ok(rescaled) = normalize(percents) {
                *percents = rescaled;
            }
            return;
        }

        match distribute_bounded(&unpinned, remaining) {
            Ok(shares) => {
                for (category, share) in round_and_settle(shares, remaining) {
                    percents.insert(category, share);
                }
            }
            Err(e) => {
                warn!(error = %e, "band correction re-normalization failed, keeping normalized shares");
            }
        }
    }

    fn fallback_allocation(&self, request: &AllocationRequest) -> AllocationResult {
        let percents: BTreeMap<CategoryId, Decimal> = FALLBACK_PERCENTS.iter().copied().collect();
        AllocationResult::from_percents(
            request.total_budget,
            request.attendee_count,
            request.duration_hours,
            &percents,
        )
    }
}

// ---------------------------------------------------------------------------
// Step 5: requirement-answer adjustment
// ---------------------------------------------------------------------------

/// Apply per-requirement answer multipliers to the weights of their
/// classified categories. Requirements classifying outside the active weight
/// set contribute nothing.
pub fn apply_requirement_adjustments(
    weights: &mut BTreeMap<CategoryId, Decimal>,
    request: &AllocationRequest,
) {
    for (requirement_id, selection) in &request.special_requirements {
        if !selection.selected {
            continue;
        }
        let Some(category) = classify(requirement_id) else {
            continue;
        };
        let Some(weight) = weights.get_mut(&category) else {
            continue;
        };
        let multiplier = requirement_multiplier(&selection.answers);
        if multiplier != Decimal::ONE {
            debug!(%requirement_id, %category, %multiplier, "requirement adjustment");
            *weight *= multiplier;
        }
    }
}

/// Compounded multiplier over every answer string of one requirement.
pub fn requirement_multiplier(answers: &BTreeMap<String, AnswerValue>) -> Decimal {
    answers
        .values()
        .flat_map(AnswerValue::texts)
        .map(answer_multiplier)
        .product()
}

/// Keyword factors for a single answer string. "basic" and "standard" are
/// the 1.0 baseline and need no branch.
fn answer_multiplier(answer: &str) -> Decimal {
    let answer = answer.to_lowercase();
    let mut multiplier = Decimal::ONE;
    if answer.contains("premium") || answer.contains("professional") {
        multiplier *= dec!(1.4);
    }
    if answer.contains("luxury") || answer.contains("high-end") {
        multiplier *= dec!(1.8);
    }
    if answer.contains("small scope") {
        multiplier *= dec!(0.8);
    }
    if answer.contains("large scope") || answer.contains("comprehensive") {
        multiplier *= dec!(1.3);
    }
    if answer.contains("half day") {
        multiplier *= dec!(0.7);
    }
    if answer.contains("full day") {
        multiplier *= dec!(1.2);
    }
    if answer.contains("multi-day") {
        multiplier *= dec!(1.8);
    }
    for feature in ["led", "effects", "advanced"] {
        if answer.contains(feature) {
            multiplier *= dec!(1.2);
        }
    }
    multiplier
}

// ---------------------------------------------------------------------------
// Step 6: scale adjustment
// ---------------------------------------------------------------------------

fn apply_scale_adjustments(weights: &mut BTreeMap<CategoryId, Decimal>, request: &AllocationRequest) {
    if request.attendee_count > 200 {
        scale_weight(weights, CategoryId::Catering, dec!(1.1));
        scale_weight(weights, CategoryId::Security, dec!(1.3));
    } else if request.attendee_count < 25 {
        scale_weight(weights, CategoryId::Venue, dec!(0.9));
    }
    if request.duration_hours > 8 {
        scale_weight(weights, CategoryId::Entertainment, dec!(1.2));
        scale_weight(weights, CategoryId::Catering, dec!(1.1));
    } else if request.duration_hours < 3 {
        scale_weight(weights, CategoryId::Entertainment, dec!(0.8));
    }
}

fn scale_weight(weights: &mut BTreeMap<CategoryId, Decimal>, category: CategoryId, factor: Decimal) {
    if let Some(weight) = weights.get_mut(&category) {
        *weight *= factor;
    }
}

// ---------------------------------------------------------------------------
// Step 8: normalization
// ---------------------------------------------------------------------------

/// Normalize weights to percents summing to exactly 100.0 at one decimal,
/// respecting catalogue bounds where the active set allows it.
pub fn normalize(weights: &BTreeMap<CategoryId, Decimal>) -> Result<BTreeMap<CategoryId, Decimal>> {
    let shares = distribute_bounded(weights, dec!(100))?;
    Ok(round_and_settle(shares, dec!(100)))
}

/// Proportional shares of `target` percent with bound clamping.
///
/// Violating categories are clamped and pinned; the remainder re-splits
/// proportionally among the rest, repeating until stable. When the active
/// set's bounds cannot jointly reach `target`, the sum invariant wins and
/// shares stay purely proportional.
fn distribute_bounded(
    weights: &BTreeMap<CategoryId, Decimal>,
    target: Decimal,
) -> Result<BTreeMap<CategoryId, Decimal>> {
    let total: Decimal = weights.values().copied().sum();
    if total <= Decimal::ZERO {
        return Err(BudgetError::Internal(format!(
            "cannot distribute {target}% over non-positive weight sum {total}"
        )));
    }

    let mut shares: BTreeMap<CategoryId, Decimal> = weights
        .iter()
        .map(|(&category, &weight)| (category, weight * target / total))
        .collect();

    let min_sum: Decimal = shares.keys().map(|&c| category_rule(c).min_percent).sum();
    let max_sum: Decimal = shares.keys().map(|&c| category_rule(c).max_percent).sum();
    if min_sum > target || max_sum < target {
        warn!(%min_sum, %max_sum, %target, "category bounds infeasible for active set, keeping proportional shares");
        return Ok(shares);
    }

    let mut pinned: BTreeSet<CategoryId> = BTreeSet::new();
    for _ in 0..shares.len() {
        let mut moved = false;
        for (&category, share) in shares.iter_mut() {
            if pinned.contains(&category) {
                continue;
            }
            let rule = category_rule(category);
            if *share > rule.max_percent {
                *share = rule.max_percent;
                pinned.insert(category);
                moved = true;
            } else if *share < rule.min_percent {
                *share = rule.min_percent;
                pinned.insert(category);
                moved = true;
            }
        }
        if !moved {
            break;
        }

        let pinned_sum: Decimal = pinned
            .iter()
            .filter_map(|category| shares.get(category))
            .copied()
            .sum();
        let remaining = target - pinned_sum;
        let unpinned: Vec<CategoryId> = shares
            .keys()
            .copied()
            .filter(|category| !pinned.contains(category))
            .collect();
        if unpinned.is_empty() {
            break;
        }
        let unpinned_sum: Decimal = unpinned
            .iter()
            .filter_map(|category| shares.get(category))
            .copied()
            .sum();
        if unpinned_sum <= Decimal::ZERO {
            let equal = remaining / Decimal::from(unpinned.len() as u64);
            for category in &unpinned {
                if let Some(share) = shares.get_mut(category) {
                    *share = equal;
                }
            }
        } else {
            for category in &unpinned {
                if let Some(share) = shares.get_mut(category) {
                    *share = *share * remaining / unpinned_sum;
                }
            }
        }
    }

    Ok(shares)
}

/// Round shares to one decimal and push any residual beyond the 0.01
/// tolerance onto the largest share (first in catalogue order on ties).
fn round_and_settle(
    mut shares: BTreeMap<CategoryId, Decimal>,
    target: Decimal,
) -> BTreeMap<CategoryId, Decimal> {
    for share in shares.values_mut() {
        *share = share.round_dp(1);
    }
    let sum: Decimal = shares.values().copied().sum();
    let residual = target - sum;
    if residual.abs() > dec!(0.01) {
        let mut largest: Option<(CategoryId, Decimal)> = None;
        for (&category, &share) in shares.iter() {
            if largest.map_or(true, |(_, best)| share > best) {
                largest = Some((category, share));
            }
        }
        if let Some((category, _)) = largest {
            if let Some(share) = shares.get_mut(&category) {
                *share += residual;
            }
        }
    }
    shares
}
