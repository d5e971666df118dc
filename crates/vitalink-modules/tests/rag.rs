//! Threshold evaluation: ordered first-match-wins walk, change types,
//! and per-field flag counting.

use uuid::Uuid;

use vitalink_core::models::flags::RagColor;
use vitalink_core::models::module_config::{EnableStatus, ModuleConfig};
use vitalink_core::models::primitive::{MeasurementValue, Primitive, PrimitiveValue};
use vitalink_core::models::threshold::{
    ChangeDirection, RagThreshold, ThresholdDirection, ThresholdType,
};
use vitalink_modules::rag;

fn weight(value: f64) -> Primitive {
    Primitive {
        id: None,
        user_id: Uuid::new_v4(),
        submitter_id: None,
        deployment_id: Uuid::new_v4(),
        module_id: "Weight".to_string(),
        module_config_id: None,
        module_result_id: None,
        device_name: None,
        start_date_time: None,
        create_date_time: None,
        flags: None,
        rag_threshold: None,
        value: PrimitiveValue::Weight(MeasurementValue { value }),
    }
}

fn entry(color: RagColor, boundary: f64, direction: ThresholdDirection) -> RagThreshold {
    RagThreshold {
        field_name: "value".to_string(),
        color,
        threshold_type: ThresholdType::Value,
        boundary,
        direction,
        enabled: true,
    }
}

fn config(thresholds: Vec<RagThreshold>) -> ModuleConfig {
    ModuleConfig {
        id: Uuid::new_v4(),
        module_id: "Weight".to_string(),
        module_name: None,
        status: EnableStatus::Enabled,
        config_body: None,
        rag_thresholds: thresholds,
        is_custom: false,
    }
}

/// The first boundary the value satisfies wins, in table order.
#[test]
fn first_matching_entry_wins() {
    let table = vec![
        entry(RagColor::Red, 120.0, ThresholdDirection::Descending),
        entry(RagColor::Amber, 100.0, ThresholdDirection::Descending),
        entry(RagColor::Green, 0.0, ThresholdDirection::Descending),
    ];

    let outcome = rag::evaluate(&table, "value", 130.0, &[], false)
        .expect("130 should match the red entry");
    assert_eq!(outcome.color, RagColor::Red);

    let outcome = rag::evaluate(&table, "value", 110.0, &[], false)
        .expect("110 should match the amber entry");
    assert_eq!(outcome.color, RagColor::Amber);

    let outcome = rag::evaluate(&table, "value", 50.0, &[], false)
        .expect("50 should match the green entry");
    assert_eq!(outcome.color, RagColor::Green);
}

/// Ascending entries match when the value is at or below the boundary.
#[test]
fn ascending_matches_at_or_below_boundary() {
    let table = vec![entry(RagColor::Amber, 60.0, ThresholdDirection::Ascending)];

    assert!(rag::evaluate(&table, "value", 60.0, &[], false).is_some());
    assert!(rag::evaluate(&table, "value", 59.9, &[], false).is_some());
    assert!(rag::evaluate(&table, "value", 60.1, &[], false).is_none());
}

/// The evaluation is a pure function of value and table: repeated calls
/// agree regardless of order.
#[test]
fn evaluation_is_deterministic() {
    let table = vec![
        entry(RagColor::Amber, 90.0, ThresholdDirection::Descending),
        entry(RagColor::Red, 120.0, ThresholdDirection::Descending),
    ];

    let first = rag::evaluate(&table, "value", 125.0, &[], false);
    let second = rag::evaluate(&table, "value", 300.0, &[], false);
    let third = rag::evaluate(&table, "value", 125.0, &[], false);

    // table order, not severity, decides: amber sits first and 125 >= 90
    assert_eq!(first.as_ref().map(|o| o.color), Some(RagColor::Amber));
    assert_eq!(second.map(|o| o.color), Some(RagColor::Amber));
    assert_eq!(first.map(|o| o.color), third.map(|o| o.color));
}

/// Disabled entries and entries for other fields are invisible.
#[test]
fn disabled_and_foreign_entries_are_skipped() {
    let mut disabled = entry(RagColor::Red, 100.0, ThresholdDirection::Descending);
    disabled.enabled = false;
    let mut foreign = entry(RagColor::Red, 100.0, ThresholdDirection::Descending);
    foreign.field_name = "other".to_string();

    assert!(rag::evaluate(&[disabled, foreign], "value", 150.0, &[], false).is_none());
}

/// Change-number entries compare against the mean of recent values and are
/// skipped entirely without history.
#[test]
fn change_number_needs_history() {
    let mut change = entry(RagColor::Red, 10.0, ThresholdDirection::Descending);
    change.threshold_type = ThresholdType::ChangeNumber;
    let table = vec![change];

    assert!(rag::evaluate(&table, "value", 95.0, &[], false).is_none());

    // mean of history is 80; 95 - 80 = 15 >= 10
    let outcome = rag::evaluate(&table, "value", 95.0, &[75.0, 85.0], false)
        .expect("delta of 15 should match");
    assert_eq!(outcome.color, RagColor::Red);
    assert_eq!(outcome.direction, Some(ChangeDirection::Increased));
}

/// Change-percent entries compare the delta as a percentage of the mean.
#[test]
fn change_percent_uses_relative_delta() {
    let mut change = entry(RagColor::Amber, 20.0, ThresholdDirection::Descending);
    change.threshold_type = ThresholdType::ChangePercent;
    let table = vec![change];

    // (120 - 100) * 100 / 100 = 20% >= 20%
    let outcome = rag::evaluate(&table, "value", 120.0, &[100.0], false)
        .expect("20% increase should match");
    assert_eq!(outcome.color, RagColor::Amber);

    assert!(
        rag::evaluate(&table, "value", 110.0, &[100.0], false).is_none(),
        "10% increase should not match a 20% boundary"
    );
}

/// Green outcomes and unmatched fields contribute no flag units.
#[test]
fn counting_ignores_green_and_unmatched() {
    let cfg = config(vec![
        entry(RagColor::Red, 120.0, ThresholdDirection::Descending),
        entry(RagColor::Green, 0.0, ThresholdDirection::Descending),
    ]);

    let (red_case, green_case, unmatched_case) = (weight(130.0), weight(50.0), weight(-5.0));

    let data = rag::evaluate_fields(&red_case, &cfg, &[]);
    let flags = rag::count_field_flags(&data);
    assert_eq!((flags.red, flags.amber, flags.gray), (1, 0, 0));

    let data = rag::evaluate_fields(&green_case, &cfg, &[]);
    let flags = rag::count_field_flags(&data);
    assert!(flags.is_empty(), "green should contribute nothing: {flags:?}");

    let mut no_match = config(vec![entry(
        RagColor::Red,
        120.0,
        ThresholdDirection::Descending,
    )]);
    no_match.rag_thresholds[0].field_name = "value".to_string();
    let data = rag::evaluate_fields(&unmatched_case, &no_match, &[]);
    let flags = rag::count_field_flags(&data);
    assert!(flags.is_empty(), "no match should contribute nothing");
}

/// The custom-config marker is carried onto the outcome.
#[test]
fn custom_config_marks_outcome() {
    let mut cfg = config(vec![entry(
        RagColor::Amber,
        100.0,
        ThresholdDirection::Descending,
    )]);
    cfg.is_custom = true;

    let data = rag::evaluate_fields(&weight(110.0), &cfg, &[]);
    let outcome = data.fields.get("value").expect("value field should match");
    assert!(outcome.is_custom);
}
