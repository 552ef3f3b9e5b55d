use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::CategoryId;

/// One row of an allocation breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationItem {
    pub category: CategoryId,
    /// Share of the total budget, 1 fractional digit.
    pub percent: Decimal,
    /// `total_budget * percent / 100`, 2 fractional digits.
    pub amount: Decimal,
    /// `amount / attendee_count`, 0 when attendee count is 0.
    pub per_attendee: Decimal,
    /// `amount / duration_hours`, 0 when duration is 0.
    pub per_hour: Decimal,
    /// Manual-edit pin, consumed by rebalance. Always false on a fresh compute.
    #[serde(default)]
    pub locked: bool,
}

/// Full allocation breakdown for one event, ordered by catalogue order.
///
/// Produced fresh by each `compute` call; the caller owns persistence and
/// replaces the previous result wholesale rather than mutating it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationResult {
    pub total_budget: Decimal,
    pub attendee_count: u32,
    pub duration_hours: u32,
    items: BTreeMap<CategoryId, AllocationItem>,
}

impl AllocationResult {
    /// Build a result from final percents, computing amounts and unit rates.
    pub fn from_percents(
        total_budget: Decimal,
        attendee_count: u32,
        duration_hours: u32,
        percents: &BTreeMap<CategoryId, Decimal>,
    ) -> Self {
        let items = percents
            .iter()
            .map(|(&category, &percent)| {
                let amount = (total_budget * percent / dec!(100)).round_dp(2);
                let per_attendee = if attendee_count > 0 {
                    (amount / Decimal::from(attendee_count)).round_dp(2)
                } else {
                    Decimal::ZERO
                };
                let per_hour = if duration_hours > 0 {
                    (amount / Decimal::from(duration_hours)).round_dp(2)
                } else {
                    Decimal::ZERO
                };
                (
                    category,
                    AllocationItem {
                        category,
                        percent,
                        amount,
                        per_attendee,
                        per_hour,
                        locked: false,
                    },
                )
            })
            .collect();
        Self {
            total_budget,
            attendee_count,
            duration_hours,
            items,
        }
    }

    /// Re-emit this result with new percents (e.g. after a rebalance),
    /// recomputing amounts and unit rates. Locked flags carry over for
    /// categories that survive.
    pub fn with_percents(&self, percents: &BTreeMap<CategoryId, Decimal>) -> Self {
        let mut next = Self::from_percents(
            self.total_budget,
            self.attendee_count,
            self.duration_hours,
            percents,
        );
        for (category, item) in next.items.iter_mut() {
            if let Some(previous) = self.items.get(category) {
                item.locked = previous.locked;
            }
        }
        next
    }

    pub fn get(&self, category: CategoryId) -> Option<&AllocationItem> {
        self.items.get(&category)
    }

    pub fn get_mut(&mut self, category: CategoryId) -> Option<&mut AllocationItem> {
        self.items.get_mut(&category)
    }

    /// Items in catalogue order.
    pub fn items(&self) -> impl Iterator<Item = &AllocationItem> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn percent_sum(&self) -> Decimal {
        self.items.values().map(|item| item.percent).sum()
    }

    pub fn amount_sum(&self) -> Decimal {
        self.items.values().map(|item| item.amount).sum()
    }

    /// Plain percent map, the shape `validate` and `rebalance` work on.
    pub fn percents(&self) -> BTreeMap<CategoryId, Decimal> {
        self.items
            .iter()
            .map(|(&category, item)| (category, item.percent))
            .collect()
    }

    /// Categories the caller has pinned, for handing to `rebalance`.
    pub fn locked_set(&self) -> BTreeSet<CategoryId> {
        self.items
            .values()
            .filter(|item| item.locked)
            .map(|item| item.category)
            .collect()
    }

    pub fn summary(&self) -> AllocationSummary {
        let top = self
            .items
            .values()
            .max_by_key(|item| item.percent)
            .map(|item| (item.category, item.percent));
        AllocationSummary {
            total_budget: self.total_budget,
            category_count: self.items.len(),
            top_category: top.map(|(category, _)| category),
            top_percent: top.map(|(_, percent)| percent).unwrap_or(Decimal::ZERO),
            contingency_percent: self
                .items
                .get(&CategoryId::Contingency)
                .map(|item| item.percent)
                .unwrap_or(Decimal::ZERO),
            per_attendee_total: if self.attendee_count > 0 {
                (self.total_budget / Decimal::from(self.attendee_count)).round_dp(2)
            } else {
                Decimal::ZERO
            },
        }
    }
}

/// Compact view of a result for caller-side display and logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationSummary {
    pub total_budget: Decimal,
    pub category_count: usize,
    pub top_category: Option<CategoryId>,
    pub top_percent: Decimal,
    pub contingency_percent: Decimal,
    pub per_attendee_total: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_percents() -> BTreeMap<CategoryId, Decimal> {
        BTreeMap::from([
            (CategoryId::Catering, dec!(40.0)),
            (CategoryId::Venue, dec!(35.0)),
            (CategoryId::Contingency, dec!(25.0)),
        ])
    }

    #[test]
    fn test_from_percents_amounts() {
        let result =
            AllocationResult::from_percents(dec!(100000), 100, 5, &sample_percents());
        let catering = result.get(CategoryId::Catering).unwrap();
        assert_eq!(catering.amount, dec!(40000.00));
        assert_eq!(catering.per_attendee, dec!(400.00));
        assert_eq!(catering.per_hour, dec!(8000.00));
        assert_eq!(result.percent_sum(), dec!(100.0));
        assert_eq!(result.amount_sum(), dec!(100000.00));
    }

    #[test]
    fn test_zero_attendees_and_hours_give_zero_rates() {
        let result = AllocationResult::from_percents(dec!(50000), 0, 0, &sample_percents());
        let venue = result.get(CategoryId::Venue).unwrap();
        assert_eq!(venue.per_attendee, Decimal::ZERO);
        assert_eq!(venue.per_hour, Decimal::ZERO);
    }

    #[test]
    fn test_with_percents_preserves_locks() {
        let mut result =
            AllocationResult::from_percents(dec!(100000), 100, 5, &sample_percents());
        result.get_mut(CategoryId::Venue).unwrap().locked = true;

        let mut edited = sample_percents();
        edited.insert(CategoryId::Catering, dec!(45.0));
        edited.insert(CategoryId::Contingency, dec!(20.0));
        let next = result.with_percents(&edited);

        assert!(next.get(CategoryId::Venue).unwrap().locked);
        assert!(!next.get(CategoryId::Catering).unwrap().locked);
        assert_eq!(next.get(CategoryId::Catering).unwrap().amount, dec!(45000.00));
        assert_eq!(next.locked_set(), BTreeSet::from([CategoryId::Venue]));
    }

    #[test]
    fn test_summary_top_category() {
        let result =
            AllocationResult::from_percents(dec!(100000), 200, 0, &sample_percents());
        let summary = result.summary();
        assert_eq!(summary.top_category, Some(CategoryId::Catering));
        assert_eq!(summary.top_percent, dec!(40.0));
        assert_eq!(summary.contingency_percent, dec!(25.0));
        assert_eq!(summary.per_attendee_total, dec!(500.00));
    }
}
