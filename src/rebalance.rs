//! Rebalancing after manual edits
//!
//! An organizer pins some categories and edits others; the remaining share is
//! re-split among the unlocked categories proportional to their current
//! shares. Locked categories are never modified, and rebalancing an already
//! balanced allocation with no locks returns it unchanged.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

use crate::domain::CategoryId;
use crate::error::{BudgetError, Result};

/// Redistribute `100 - sum(locked)` among unlocked categories.
///
/// Unlocked shares scale proportionally to their current values; when every
/// unlocked share is zero the remainder splits equally. Rounding residue
/// lands on the largest unlocked category, first in catalogue order on ties.
/// When every category is locked and the sum is off, the input comes back
/// unchanged for the caller to resolve via validation.
pub fn rebalance(
    allocation: &BTreeMap<CategoryId, Decimal>,
    locked: &BTreeSet<CategoryId>,
) -> Result<BTreeMap<CategoryId, Decimal>> {
    if let Some((&category, &percent)) = allocation.iter().find(|(_, &p)| p < Decimal::ZERO) {
        return Err(BudgetError::InvalidInput(format!(
            "{category} has a negative share: {percent}%"
        )));
    }

    let unlocked: Vec<CategoryId> = allocation
        .keys()
        .copied()
        .filter(|category| !locked.contains(category))
        .collect();

    if unlocked.is_empty() {
        // Nothing to move; a bad sum is the caller's problem now
        let sum: Decimal = allocation.values().copied().sum();
        if (sum - dec!(100)).abs() > dec!(0.01) {
            warn!(%sum, "every category locked with an unbalanced sum, returning input unchanged");
        }
        return Ok(allocation.clone());
    }

    let locked_sum: Decimal = allocation
        .iter()
        .filter(|(category, _)| locked.contains(category))
        .map(|(_, &percent)| percent)
        .sum();
    let remaining = (dec!(100) - locked_sum).max(Decimal::ZERO);
    if remaining.is_zero() {
        // Locked categories already consume the full budget; unlocked shares
        // drop to zero and the structural excess is left for validation
        warn!(%locked_sum, "locked categories consume the full budget, zeroing unlocked shares");
        let mut result = allocation.clone();
        for category in &unlocked {
            result.insert(*category, Decimal::ZERO);
        }
        return Ok(result);
    }

    let unlocked_sum: Decimal = unlocked
        .iter()
        .filter_map(|category| allocation.get(category))
        .copied()
        .sum();

    let mut result = allocation.clone();
    for category in &unlocked {
        let share = if unlocked_sum.is_zero() {
            remaining / Decimal::from(unlocked.len() as u64)
        } else {
            allocation[category] * remaining / unlocked_sum
        };
        result.insert(*category, share.round_dp(1));
    }

    // Nudge the largest unlocked category to absorb rounding residue
    let sum: Decimal = result.values().copied().sum();
    let residual = dec!(100) - sum;
    if residual.abs() > dec!(0.01) {
        let mut largest: Option<(CategoryId, Decimal)> = None;
        for category in &unlocked {
            let share = result[category];
            if largest.map_or(true, |(_, best)| share > best) {
                largest = Some((*category, share));
            }
        }
        if let Some((category, _)) = largest {
            if let Some(share) = result.get_mut(&category) {
                *share += residual;
            }
        }
    }

    Ok(result)
}
