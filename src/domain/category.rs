use serde::{Deserialize, Serialize};

/// One spend category of the fixed catalogue.
///
/// Declaration order is the catalogue iteration order; residual rounding and
/// tie-breaks depend on it, so new categories go at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryId {
    Catering,
    Venue,
    Decorations,
    Photography,
    Entertainment,
    AudioVisual,
    Lighting,
    Transportation,
    Security,
    Contingency,
}

impl CategoryId {
    /// All categories in catalogue order.
    pub const ALL: [CategoryId; 10] = [
        CategoryId::Catering,
        CategoryId::Venue,
        CategoryId::Decorations,
        CategoryId::Photography,
        CategoryId::Entertainment,
        CategoryId::AudioVisual,
        CategoryId::Lighting,
        CategoryId::Transportation,
        CategoryId::Security,
        CategoryId::Contingency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryId::Catering => "catering",
            CategoryId::Venue => "venue",
            CategoryId::Decorations => "decorations",
            CategoryId::Photography => "photography",
            CategoryId::Entertainment => "entertainment",
            CategoryId::AudioVisual => "audio_visual",
            CategoryId::Lighting => "lighting",
            CategoryId::Transportation => "transportation",
            CategoryId::Security => "security",
            CategoryId::Contingency => "contingency",
        }
    }
}

impl std::fmt::Display for CategoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_order_is_declaration_order() {
        assert_eq!(CategoryId::ALL[0], CategoryId::Catering);
        assert_eq!(CategoryId::ALL[9], CategoryId::Contingency);
        // Ord follows declaration order, so BTreeMap iteration matches ALL
        assert!(CategoryId::Catering < CategoryId::Venue);
        assert!(CategoryId::Security < CategoryId::Contingency);
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&CategoryId::AudioVisual).unwrap();
        assert_eq!(json, "\"audio_visual\"");
    }
}
