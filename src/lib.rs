pub mod catalog;
pub mod classifier;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod market;
pub mod rebalance;
pub mod validation;

pub use catalog::{catalogue, category_rule, normalize_event_type, preset_weights, CategoryRule};
pub use classifier::classify;
pub use config::{CacheConfig, EngineConfig, LimitsConfig};
pub use domain::{
    AllocationItem, AllocationRequest, AllocationResult, AllocationSummary, AnswerValue,
    CategoryId, MarketRateBand, RequirementSelection,
};
pub use engine::AllocationEngine;
pub use error::{BudgetError, Result};
pub use market::{MarketCache, MarketData, MemoryCache, NoopCache, StaticMarketData};
pub use rebalance::rebalance;
pub use validation::{validate, ValidationReport};
