//! Allocation validation
//!
//! Checks a percent breakdown against the catalogue rules and the 100%
//! invariant. Violations are collected, never thrown; the caller decides
//! whether a violated allocation may still be saved.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

use crate::catalog::{catalogue, category_rule};
use crate::domain::CategoryId;

/// Outcome of validating one allocation.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub is_valid: bool,
    /// Human-readable messages, one per violated rule, in check order.
    pub violations: Vec<String>,
}

impl ValidationReport {
    fn from_violations(violations: Vec<String>) -> Self {
        Self {
            is_valid: violations.is_empty(),
            violations,
        }
    }
}

/// Validate a percent map against the catalogue.
///
/// All checks run; nothing short-circuits. The input is never mutated.
pub fn validate(
    allocation: &BTreeMap<CategoryId, Decimal>,
    total_budget: Decimal,
) -> ValidationReport {
    let mut violations = Vec::new();

    if total_budget <= Decimal::ZERO {
        violations.push(format!(
            "total_budget must be positive: {total_budget}"
        ));
    }

    let sum: Decimal = allocation.values().copied().sum();
    if (sum - dec!(100)).abs() > dec!(0.01) {
        violations.push(format!("allocation sums to {sum}%, expected 100%"));
    }

    for (&category, &percent) in allocation {
        let rule = category_rule(category);
        if percent < rule.min_percent {
            violations.push(format!(
                "{} is {}% but the minimum is {}%",
                category, percent, rule.min_percent
            ));
        } else if percent > rule.max_percent {
            violations.push(format!(
                "{} is {}% but the maximum is {}%",
                category, percent, rule.max_percent
            ));
        }
    }

    for rule in catalogue().iter().filter(|rule| rule.required) {
        match allocation.get(&rule.id) {
            None => violations.push(format!("required category {} is missing", rule.id)),
            Some(&percent) if percent <= Decimal::ZERO => violations.push(format!(
                "required category {} must have a share greater than 0%",
                rule.id
            )),
            Some(_) => {}
        }
    }

    ValidationReport::from_violations(violations)
}
