//! Flag-cascade: collapsing field counts into one canonical flag with
//! red > amber > gray precedence, per primitive and across a batch.

use uuid::Uuid;

use vitalink_core::models::flags::Flags;
use vitalink_core::models::primitive::{MeasurementValue, Primitive, PrimitiveValue};
use vitalink_modules::flags::{apply_overall_flags_logic, collapse};

fn flagged(red: i64, amber: i64, gray: i64) -> Primitive {
    Primitive {
        id: None,
        user_id: Uuid::new_v4(),
        submitter_id: None,
        deployment_id: Uuid::new_v4(),
        module_id: "HeartRate".to_string(),
        module_config_id: None,
        module_result_id: None,
        device_name: None,
        start_date_time: None,
        create_date_time: None,
        flags: Some(Flags { red, amber, gray }),
        rag_threshold: None,
        value: PrimitiveValue::HeartRate(MeasurementValue { value: 60.0 }),
    }
}

fn total(primitives: &[Primitive]) -> Flags {
    let mut sum = Flags::default();
    for p in primitives {
        if let Some(f) = &p.flags {
            sum.add(f);
        }
    }
    sum
}

/// Any non-zero red collapses to exactly one red unit.
#[test]
fn red_wins_regardless_of_other_counts() {
    assert_eq!(
        collapse(Flags { red: 3, amber: 2, gray: 11 }),
        Flags { red: 1, amber: 0, gray: 0 }
    );
}

/// Amber wins only when red is absent; gray only when both are.
#[test]
fn precedence_is_strict() {
    assert_eq!(
        collapse(Flags { red: 0, amber: 5, gray: 2 }),
        Flags { red: 0, amber: 1, gray: 0 }
    );
    assert_eq!(
        collapse(Flags { red: 0, amber: 0, gray: 7 }),
        Flags { red: 0, amber: 0, gray: 1 }
    );
}

/// A single gray unit is a fixed point.
#[test]
fn single_gray_is_unchanged() {
    let gray = Flags { red: 0, amber: 0, gray: 1 };
    assert_eq!(collapse(gray), gray);
}

#[test]
fn all_zero_stays_zero() {
    assert_eq!(collapse(Flags::default()), Flags::default());
}

/// Collapsing is idempotent: applying it to its own output changes nothing.
#[test]
fn collapse_is_idempotent() {
    for counts in [
        Flags { red: 4, amber: 0, gray: 9 },
        Flags { red: 0, amber: 2, gray: 1 },
        Flags { red: 0, amber: 0, gray: 3 },
        Flags::default(),
    ] {
        let once = collapse(counts);
        assert_eq!(collapse(once), once, "not idempotent for {counts:?}");
    }
}

/// Two gray siblings contribute one gray unit between them.
#[test]
fn sibling_grays_count_once() {
    let mut batch = vec![flagged(0, 0, 1), flagged(0, 0, 3)];
    apply_overall_flags_logic(&mut batch);

    assert_eq!(
        total(&batch),
        Flags { red: 0, amber: 0, gray: 1 },
        "a submission contributes exactly one flag unit"
    );
}

/// The most severe color across the batch wins and lands on the first
/// primitive that carried it.
#[test]
fn batch_collapse_prefers_most_severe_carrier() {
    let mut batch = vec![flagged(0, 0, 2), flagged(0, 3, 0), flagged(2, 0, 0)];
    apply_overall_flags_logic(&mut batch);

    assert_eq!(total(&batch), Flags { red: 1, amber: 0, gray: 0 });
    assert_eq!(
        batch[2].flags,
        Some(Flags { red: 1, amber: 0, gray: 0 }),
        "the unit should land on the primitive that carried red"
    );
    assert_eq!(batch[0].flags, Some(Flags::default()));
    assert_eq!(batch[1].flags, Some(Flags::default()));
}

/// A one-element slice behaves exactly like collapsing that primitive.
#[test]
fn single_primitive_slice_matches_collapse() {
    let mut batch = vec![flagged(2, 5, 1)];
    apply_overall_flags_logic(&mut batch);
    assert_eq!(batch[0].flags, Some(Flags { red: 1, amber: 0, gray: 0 }));
}

/// Primitives without flags (manager notes) are left untouched.
#[test]
fn unflagged_primitives_are_ignored() {
    let mut note = flagged(0, 0, 0);
    note.flags = None;
    let mut batch = vec![note, flagged(0, 1, 0)];
    apply_overall_flags_logic(&mut batch);

    assert_eq!(batch[0].flags, None);
    assert_eq!(batch[1].flags, Some(Flags { red: 0, amber: 1, gray: 0 }));
}
