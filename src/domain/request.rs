use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One allocation request, constructed per call from the caller's event record.
///
/// The engine never fetches event data itself; everything it needs arrives
/// here and the request is consumed within a single `compute` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationRequest {
    /// Event type slug (e.g. "wedding"). Unrecognized types fall back to the
    /// corporate preset.
    pub event_type: String,
    /// Free-text service names as selected by the organizer. Duplicates allowed.
    #[serde(default)]
    pub selected_services: Vec<String>,
    /// Total budget in currency units. Must be positive.
    pub total_budget: Decimal,
    #[serde(default)]
    pub attendee_count: u32,
    #[serde(default)]
    pub duration_hours: u32,
    /// Requirement id -> selection with free-form answers.
    #[serde(default)]
    pub special_requirements: BTreeMap<String, RequirementSelection>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub event_date: Option<NaiveDate>,
}

impl AllocationRequest {
    pub fn new(event_type: impl Into<String>, total_budget: Decimal) -> Self {
        Self {
            event_type: event_type.into(),
            selected_services: Vec::new(),
            total_budget,
            attendee_count: 0,
            duration_hours: 0,
            special_requirements: BTreeMap::new(),
            location: None,
            event_date: None,
        }
    }
}

/// One answered special requirement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementSelection {
    pub selected: bool,
    /// Question id -> answer. Answers are free text from the organizer's form.
    #[serde(default)]
    pub answers: BTreeMap<String, AnswerValue>,
}

impl RequirementSelection {
    pub fn selected_with(answers: BTreeMap<String, AnswerValue>) -> Self {
        Self {
            selected: true,
            answers,
        }
    }
}

/// A requirement answer: a single string or a list of strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    List(Vec<String>),
}

impl AnswerValue {
    /// All answer strings, regardless of shape.
    pub fn texts(&self) -> Vec<&str> {
        match self {
            AnswerValue::Text(s) => vec![s.as_str()],
            AnswerValue::List(items) => items.iter().map(String::as_str).collect(),
        }
    }
}
