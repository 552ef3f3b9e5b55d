//! Service Classifier
//!
//! Maps free-text service names and requirement ids onto the category
//! taxonomy by keyword matching. The table is ordered and the first category
//! with a substring hit wins, so table order is part of the contract: callers
//! relying on tie-breaks (e.g. "banquet hall" classifying as catering) depend
//! on it staying stable.

use crate::domain::CategoryId;

const KEYWORDS: &[(CategoryId, &[&str])] = &[
    (
        CategoryId::Catering,
        &["cater", "buffet", "food", "cuisine", "menu", "beverage", "bar service", "banquet"],
    ),
    (
        CategoryId::Venue,
        &["venue", "hall", "ballroom", "lawn", "resort", "auditorium"],
    ),
    (
        CategoryId::Decorations,
        &["decor", "floral", "flower", "styling", "drap", "theme"],
    ),
    (
        CategoryId::Photography,
        &["photo", "videograph", "video", "cinemat", "drone"],
    ),
    (
        CategoryId::Entertainment,
        &["entertain", "dj", "band", "music", "dance", "artist", "performer", "anchor", "emcee"],
    ),
    (
        CategoryId::AudioVisual,
        &["audio", "visual", "sound", "projector", "screen", "mic"],
    ),
    (CategoryId::Lighting, &["light", "illuminat"]),
    (
        CategoryId::Transportation,
        &["transport", "shuttle", "logistic", "valet", "cab"],
    ),
    (
        CategoryId::Security,
        &["security", "guard", "bouncer", "crowd control"],
    ),
    (
        CategoryId::Contingency,
        &["contingency", "buffer", "misc"],
    ),
];

/// Classify a free-text service name or requirement id.
///
/// Returns the first category whose keyword set has a substring match in the
/// lowercased input, or `None` when nothing matches. A miss is not an error;
/// unclassifiable strings are simply excluded from the active category set.
pub fn classify(text: &str) -> Option<CategoryId> {
    let text = text.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| text.contains(keyword)))
        .map(|&(category, _)| category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_catering() {
        assert_eq!(classify("catering buffet service"), Some(CategoryId::Catering));
        assert_eq!(classify("Live Food Counters"), Some(CategoryId::Catering));
    }

    #[test]
    fn test_classify_miss_returns_none() {
        assert_eq!(classify("xyz123"), None);
        assert_eq!(classify(""), None);
    }

    #[test]
    fn test_first_match_wins_on_overlap() {
        // "banquet hall" contains both a catering keyword ("banquet") and a
        // venue keyword ("hall"); catering sits earlier in the table.
        assert_eq!(classify("banquet hall"), Some(CategoryId::Catering));
        assert_eq!(classify("wedding hall"), Some(CategoryId::Venue));
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(classify("DJ Night"), Some(CategoryId::Entertainment));
        assert_eq!(classify("STAGE LIGHTING"), Some(CategoryId::Lighting));
    }

    #[test]
    fn test_requirement_ids_classify() {
        assert_eq!(classify("photography"), Some(CategoryId::Photography));
        assert_eq!(classify("security"), Some(CategoryId::Security));
        assert_eq!(classify("transport_logistics"), Some(CategoryId::Transportation));
    }

    #[test]
    fn test_deterministic() {
        for _ in 0..3 {
            assert_eq!(classify("stage lighting rig"), Some(CategoryId::Lighting));
        }
    }
}
