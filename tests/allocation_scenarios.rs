//! End-to-end allocation scenarios through the public API.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use std::sync::Arc;

use soiree::{
    category_rule, AllocationEngine, AllocationRequest, AnswerValue, BudgetError, CategoryId,
    MemoryCache, NoopCache, RequirementSelection, StaticMarketData,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn engine() -> AllocationEngine {
    AllocationEngine::new(Arc::new(StaticMarketData::with_cache(Arc::new(NoopCache))))
}

fn mumbai_wedding() -> AllocationRequest {
    let mut request = AllocationRequest::new("wedding", dec!(500000));
    request.attendee_count = 150;
    request.duration_hours = 6;
    request.selected_services = vec!["catering".to_string(), "photography".to_string()];
    request.location = Some("mumbai".to_string());
    request
}

#[test]
fn mumbai_wedding_breakdown() {
    init_tracing();
    let result = engine().compute(&mumbai_wedding()).unwrap();

    for category in [
        CategoryId::Catering,
        CategoryId::Photography,
        CategoryId::Contingency,
    ] {
        assert!(result.get(category).is_some(), "{category} missing");
    }

    assert!((result.percent_sum() - dec!(100.0)).abs() <= dec!(0.01));
    assert!((result.amount_sum() - dec!(500000)).abs() <= dec!(1));

    // Catering lands between a quarter and a third of the budget, inside the
    // 20-50% catalogue rule
    let catering = result.get(CategoryId::Catering).unwrap();
    assert!(catering.amount >= dec!(125000) && catering.amount <= dec!(175000));
    let rule = category_rule(CategoryId::Catering);
    assert!(catering.percent >= rule.min_percent && catering.percent <= rule.max_percent);
}

#[test]
fn zero_budget_is_rejected() {
    let mut request = mumbai_wedding();
    request.total_budget = Decimal::ZERO;
    assert!(matches!(
        engine().compute(&request),
        Err(BudgetError::InvalidInput(_))
    ));
}

#[test]
fn pune_conference_respects_bounds() {
    init_tracing();
    let mut request = AllocationRequest::new("conference", dec!(800000));
    request.attendee_count = 250;
    request.duration_hours = 8;
    request.location = Some("pune".to_string());
    request.selected_services = vec![
        "conference hall".to_string(),
        "catering".to_string(),
        "projector and sound".to_string(),
        "shuttle transport".to_string(),
    ];

    let result = engine().compute(&request).unwrap();
    assert!((result.percent_sum() - dec!(100.0)).abs() <= dec!(0.01));
    assert_eq!(result.len(), 5); // venue, catering, av, transport, contingency

    for item in result.items() {
        let rule = category_rule(item.category);
        assert!(
            item.percent >= rule.min_percent && item.percent <= rule.max_percent,
            "{} = {}%",
            item.category,
            item.percent
        );
    }

    // Venue outprices its market band at this budget and gets corrected down
    let venue = result.get(CategoryId::Venue).unwrap();
    assert!(venue.percent < dec!(20.0), "venue = {}%", venue.percent);
}

#[test]
fn luxury_answers_raise_the_category_share() {
    init_tracing();
    let request_with = |answer: &str| {
        let mut request = AllocationRequest::new("wedding", dec!(150000));
        request.attendee_count = 100;
        request.duration_hours = 5;
        request.selected_services = vec![
            "decor".to_string(),
            "dj music".to_string(),
            "photo".to_string(),
        ];
        request.special_requirements.insert(
            "catering".to_string(),
            RequirementSelection::selected_with(BTreeMap::from([(
                "quality".to_string(),
                AnswerValue::Text(answer.to_string()),
            )])),
        );
        request
    };

    let standard = engine().compute(&request_with("standard")).unwrap();
    let luxury = engine().compute(&request_with("luxury")).unwrap();

    let standard_catering = standard.get(CategoryId::Catering).unwrap().percent;
    let luxury_catering = luxury.get(CategoryId::Catering).unwrap().percent;
    assert!(
        luxury_catering > standard_catering,
        "luxury {luxury_catering}% should exceed standard {standard_catering}%"
    );
    assert!((luxury.percent_sum() - dec!(100.0)).abs() <= dec!(0.01));
}

#[test]
fn unclassifiable_services_fall_back_to_minimal_set() {
    let mut request = AllocationRequest::new("birthday", dec!(80000));
    request.selected_services = vec!["qqqq".to_string(), "zzzz".to_string()];
    let result = engine().compute(&request).unwrap();
    assert_eq!(result.len(), 6);
    assert!((result.percent_sum() - dec!(100.0)).abs() <= dec!(0.01));
    assert!(result.get(CategoryId::Contingency).unwrap().percent > Decimal::ZERO);
}

#[test]
fn engine_without_market_data_matches_invariants() {
    let engine = AllocationEngine::without_market_data();
    let result = engine.compute(&mumbai_wedding()).unwrap();
    assert!((result.percent_sum() - dec!(100.0)).abs() <= dec!(0.01));
    assert!((result.amount_sum() - dec!(500000)).abs() <= dec!(1));
}

#[test]
fn cache_backend_never_changes_output() {
    let cached = AllocationEngine::new(Arc::new(StaticMarketData::with_cache(Arc::new(
        MemoryCache::new(),
    ))));
    let uncached = engine();

    let request = mumbai_wedding();
    // Two runs against the same provider: the second hits warm cache entries
    let first = cached.compute(&request).unwrap();
    let second = cached.compute(&request).unwrap();
    let direct = uncached.compute(&request).unwrap();

    assert_eq!(first.percents(), second.percents());
    assert_eq!(first.percents(), direct.percents());
}

#[test]
fn per_attendee_and_per_hour_rates() {
    let result = engine().compute(&mumbai_wedding()).unwrap();
    for item in result.items() {
        let expected_attendee = (item.amount / dec!(150)).round_dp(2);
        let expected_hour = (item.amount / dec!(6)).round_dp(2);
        assert_eq!(item.per_attendee, expected_attendee);
        assert_eq!(item.per_hour, expected_hour);
        assert!(!item.locked);
    }
}

#[test]
fn percents_have_one_fractional_digit() {
    let result = engine().compute(&mumbai_wedding()).unwrap();
    for item in result.items() {
        assert_eq!(item.percent, item.percent.round_dp(1), "{}", item.category);
    }
}
