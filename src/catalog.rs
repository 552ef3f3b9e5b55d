//! Category Catalogue and Event Preset tables
//!
//! Process-wide immutable reference data. Every category an allocation can
//! reference lives here, with its share bounds; every supported event type
//! has a base weight table. Compute calls clone what they need and never
//! write back.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

use crate::domain::CategoryId;

/// Share rule for one catalogue category.
#[derive(Debug, Clone, Copy)]
pub struct CategoryRule {
    pub id: CategoryId,
    pub display_name: &'static str,
    /// Lower share bound, percent of total budget.
    pub min_percent: Decimal,
    /// Upper share bound, percent of total budget. Always >= min_percent.
    pub max_percent: Decimal,
    /// Required categories must appear in every allocation with percent > 0.
    pub required: bool,
}

const CATALOGUE: [CategoryRule; 10] = [
    CategoryRule {
        id: CategoryId::Catering,
        display_name: "Catering",
        min_percent: dec!(20),
        max_percent: dec!(50),
        required: false,
    },
    CategoryRule {
        id: CategoryId::Venue,
        display_name: "Venue",
        min_percent: dec!(10),
        max_percent: dec!(40),
        required: false,
    },
    CategoryRule {
        id: CategoryId::Decorations,
        display_name: "Decorations",
        min_percent: dec!(3),
        max_percent: dec!(25),
        required: false,
    },
    CategoryRule {
        id: CategoryId::Photography,
        display_name: "Photography & Video",
        min_percent: dec!(3),
        max_percent: dec!(45),
        required: false,
    },
    CategoryRule {
        id: CategoryId::Entertainment,
        display_name: "Entertainment",
        min_percent: dec!(3),
        max_percent: dec!(35),
        required: false,
    },
    CategoryRule {
        id: CategoryId::AudioVisual,
        display_name: "Audio Visual",
        min_percent: dec!(2),
        max_percent: dec!(20),
        required: false,
    },
    CategoryRule {
        id: CategoryId::Lighting,
        display_name: "Lighting",
        min_percent: dec!(1),
        max_percent: dec!(15),
        required: false,
    },
    CategoryRule {
        id: CategoryId::Transportation,
        display_name: "Transportation",
        min_percent: dec!(1),
        max_percent: dec!(15),
        required: false,
    },
    CategoryRule {
        id: CategoryId::Security,
        display_name: "Security",
        min_percent: dec!(1),
        max_percent: dec!(15),
        required: false,
    },
    CategoryRule {
        id: CategoryId::Contingency,
        display_name: "Contingency",
        min_percent: dec!(5),
        max_percent: dec!(35),
        required: true,
    },
];

/// The full catalogue in catalogue order.
pub fn catalogue() -> &'static [CategoryRule] {
    &CATALOGUE
}

/// Rule lookup. Every `CategoryId` has a rule, so this never misses.
pub fn category_rule(id: CategoryId) -> &'static CategoryRule {
    // CATALOGUE is declared in CategoryId::ALL order
    &CATALOGUE[id as usize]
}

/// Base weight a classified category gets when the event preset has no entry
/// for it. Keeps an explicitly requested service from vanishing.
pub const DEFAULT_BASE_WEIGHT: Decimal = dec!(5);

type PresetWeights = &'static [(CategoryId, Decimal)];

const WEDDING: PresetWeights = &[
    (CategoryId::Catering, dec!(30)),
    (CategoryId::Venue, dec!(22)),
    (CategoryId::Decorations, dec!(15)),
    (CategoryId::Photography, dec!(12)),
    (CategoryId::Entertainment, dec!(8)),
    (CategoryId::AudioVisual, dec!(4)),
    (CategoryId::Lighting, dec!(3)),
    (CategoryId::Transportation, dec!(3)),
    (CategoryId::Security, dec!(2)),
    (CategoryId::Contingency, dec!(7)),
];

const CORPORATE: PresetWeights = &[
    (CategoryId::Catering, dec!(25)),
    (CategoryId::Venue, dec!(25)),
    (CategoryId::Decorations, dec!(6)),
    (CategoryId::Photography, dec!(6)),
    (CategoryId::Entertainment, dec!(8)),
    (CategoryId::AudioVisual, dec!(12)),
    (CategoryId::Transportation, dec!(5)),
    (CategoryId::Security, dec!(5)),
    (CategoryId::Contingency, dec!(8)),
];

const BIRTHDAY: PresetWeights = &[
    (CategoryId::Catering, dec!(32)),
    (CategoryId::Venue, dec!(18)),
    (CategoryId::Decorations, dec!(18)),
    (CategoryId::Photography, dec!(8)),
    (CategoryId::Entertainment, dec!(12)),
    (CategoryId::AudioVisual, dec!(3)),
    (CategoryId::Contingency, dec!(6)),
];

const CONFERENCE: PresetWeights = &[
    (CategoryId::Catering, dec!(22)),
    (CategoryId::Venue, dec!(28)),
    (CategoryId::Photography, dec!(5)),
    (CategoryId::AudioVisual, dec!(15)),
    (CategoryId::Lighting, dec!(2)),
    (CategoryId::Transportation, dec!(6)),
    (CategoryId::Security, dec!(6)),
    (CategoryId::Contingency, dec!(8)),
];

const CONCERT: PresetWeights = &[
    (CategoryId::Venue, dec!(22)),
    (CategoryId::Entertainment, dec!(22)),
    (CategoryId::AudioVisual, dec!(15)),
    (CategoryId::Lighting, dec!(10)),
    (CategoryId::Transportation, dec!(6)),
    (CategoryId::Security, dec!(10)),
    (CategoryId::Contingency, dec!(8)),
];

const FESTIVAL: PresetWeights = &[
    (CategoryId::Catering, dec!(15)),
    (CategoryId::Venue, dec!(20)),
    (CategoryId::Decorations, dec!(10)),
    (CategoryId::Entertainment, dec!(18)),
    (CategoryId::Lighting, dec!(8)),
    (CategoryId::Transportation, dec!(6)),
    (CategoryId::Security, dec!(8)),
    (CategoryId::Contingency, dec!(8)),
];

/// Base weights for an event type. Weights are pre-normalization and need not
/// sum to 100. Unrecognized event types get the corporate preset.
pub fn preset_for(event_type: &str) -> PresetWeights {
    match normalize_event_type(event_type) {
        "wedding" => WEDDING,
        "birthday" => BIRTHDAY,
        "conference" => CONFERENCE,
        "concert" => CONCERT,
        "festival" => FESTIVAL,
        _ => CORPORATE,
    }
}

/// Canonical event-type slug: trimmed, lowercased, with the common aliases
/// callers send from persisted events folded in.
pub fn normalize_event_type(event_type: &str) -> &'static str {
    let slug = event_type.trim().to_lowercase();
    match slug.as_str() {
        "wedding" | "engagement" | "reception" => "wedding",
        "birthday" | "anniversary" => "birthday",
        "conference" | "seminar" | "summit" => "conference",
        "concert" | "gig" => "concert",
        "festival" | "fair" => "festival",
        _ => "corporate",
    }
}

/// Working copy of a preset as a mutable weight map.
pub fn preset_weights(event_type: &str) -> BTreeMap<CategoryId, Decimal> {
    preset_for(event_type).iter().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_lookup_matches_catalogue_order() {
        for (index, rule) in catalogue().iter().enumerate() {
            assert_eq!(rule.id, CategoryId::ALL[index]);
            assert_eq!(category_rule(rule.id).id, rule.id);
            assert!(rule.min_percent <= rule.max_percent);
        }
    }

    #[test]
    fn test_only_contingency_is_required() {
        let required: Vec<_> = catalogue()
            .iter()
            .filter(|rule| rule.required)
            .map(|rule| rule.id)
            .collect();
        assert_eq!(required, vec![CategoryId::Contingency]);
    }

    #[test]
    fn test_unknown_event_type_falls_back_to_corporate() {
        assert_eq!(preset_for("quinceanera"), CORPORATE);
        assert_eq!(preset_for(""), CORPORATE);
        assert_eq!(preset_for("  Wedding "), WEDDING);
    }

    #[test]
    fn test_wedding_base_catering_weight() {
        let weights = preset_weights("wedding");
        assert_eq!(weights[&CategoryId::Catering], dec!(30));
    }

    #[test]
    fn test_every_preset_carries_contingency() {
        for event_type in ["wedding", "corporate", "birthday", "conference", "concert", "festival"] {
            let weights = preset_weights(event_type);
            assert!(weights.contains_key(&CategoryId::Contingency), "{event_type}");
        }
    }
}
