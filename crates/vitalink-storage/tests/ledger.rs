//! Unseen-ledger semantics: companion writes, bulk flush, flag resets and
//! the grouped badge queries.

use std::collections::BTreeMap;

use jiff::Timestamp;
use uuid::Uuid;

use vitalink_core::models::flags::Flags;
use vitalink_core::models::primitive::{
    MeasurementValue, Primitive, PrimitiveKind, PrimitiveValue,
};
use vitalink_storage::error::StorageError;
use vitalink_storage::{InMemoryRepository, ModuleResultRepository, PrimitiveQuery};

fn ts(text: &str) -> Timestamp {
    text.parse().expect("test timestamp should parse")
}

struct Fixture {
    user_id: Uuid,
    deployment_id: Uuid,
}

impl Fixture {
    fn new() -> Self {
        Self {
            user_id: Uuid::new_v4(),
            deployment_id: Uuid::new_v4(),
        }
    }

    fn primitive(
        &self,
        module_id: &str,
        value: PrimitiveValue,
        config_id: Uuid,
        start: &str,
        flags: Flags,
    ) -> Primitive {
        Primitive {
            id: None,
            user_id: self.user_id,
            submitter_id: None,
            deployment_id: self.deployment_id,
            module_id: module_id.to_string(),
            module_config_id: Some(config_id),
            module_result_id: None,
            device_name: None,
            start_date_time: Some(ts(start)),
            create_date_time: None,
            flags: Some(flags),
            rag_threshold: None,
            value,
        }
    }

    fn weight(&self, config_id: Uuid, start: &str, flags: Flags) -> Primitive {
        self.primitive(
            "Weight",
            PrimitiveValue::Weight(MeasurementValue { value: 80.0 }),
            config_id,
            start,
            flags,
        )
    }
}

const RED: Flags = Flags { red: 1, amber: 0, gray: 0 };
const AMBER: Flags = Flags { red: 0, amber: 1, gray: 0 };
const GRAY: Flags = Flags { red: 0, amber: 0, gray: 1 };

/// Persisting stamps the defaults: submitter falls back to the user and
/// `start_date_time` to `create_date_time`.
#[tokio::test]
async fn create_applies_envelope_defaults() {
    let repo = InMemoryRepository::new();
    let fixture = Fixture::new();
    let mut primitive = fixture.weight(Uuid::new_v4(), "2026-08-05T10:00:00Z", GRAY);
    primitive.start_date_time = None;

    let id = repo
        .create_primitive(&mut primitive, true)
        .await
        .expect("create should succeed");

    assert_eq!(primitive.id, Some(id));
    assert_eq!(primitive.submitter_id, Some(fixture.user_id));
    assert!(primitive.create_date_time.is_some());
    assert_eq!(
        primitive.start_date_time, primitive.create_date_time,
        "start should default to the create timestamp"
    );
}

/// Flushing removes every ledger entry before the cut and nothing else,
/// while the primary records stay untouched.
#[tokio::test]
async fn flush_deletes_ledger_but_not_primaries() {
    let repo = InMemoryRepository::new();
    let fixture = Fixture::new();
    let config_id = Uuid::new_v4();
    for start in ["2026-08-01T10:00:00Z", "2026-08-02T10:00:00Z", "2026-08-03T10:00:00Z"] {
        let mut primitive = fixture.weight(config_id, start, RED);
        repo.create_primitive(&mut primitive, true)
            .await
            .expect("create should succeed");
    }

    let deleted = repo
        .flush_unseen_results(fixture.user_id, Some(ts("2026-08-03T00:00:00Z")), None)
        .await
        .expect("flush should succeed");
    assert_eq!(deleted, 2);

    let totals = repo
        .calculate_unseen_flags(fixture.user_id, &[config_id], &[])
        .await
        .expect("totals");
    assert_eq!(totals, RED, "only the entry after the cut remains");

    let primaries = repo
        .retrieve_primitives(&PrimitiveQuery::new(PrimitiveKind::Weight))
        .await
        .expect("primaries");
    assert_eq!(primaries.len(), 3, "primary records must survive a flush");
}

/// A module-scoped flush leaves other modules' entries alone.
#[tokio::test]
async fn flush_honors_module_filter() {
    let repo = InMemoryRepository::new();
    let fixture = Fixture::new();
    let weight_config = Uuid::new_v4();
    let rate_config = Uuid::new_v4();

    let mut weight = fixture.weight(weight_config, "2026-08-01T10:00:00Z", RED);
    repo.create_primitive(&mut weight, true).await.expect("create");
    let mut rate = fixture.primitive(
        "HeartRate",
        PrimitiveValue::HeartRate(MeasurementValue { value: 72.0 }),
        rate_config,
        "2026-08-01T11:00:00Z",
        AMBER,
    );
    repo.create_primitive(&mut rate, true).await.expect("create");

    let deleted = repo
        .flush_unseen_results(fixture.user_id, None, Some("Weight"))
        .await
        .expect("flush");
    assert_eq!(deleted, 1);

    let totals = repo
        .calculate_unseen_flags(fixture.user_id, &[weight_config, rate_config], &[])
        .await
        .expect("totals");
    assert_eq!(totals, AMBER);
}

/// Resetting zeroes flags inside the window without deleting entries.
#[tokio::test]
async fn reset_flags_zeroes_range() {
    let repo = InMemoryRepository::new();
    let fixture = Fixture::new();
    let config_id = Uuid::new_v4();
    for start in ["2026-08-01T10:00:00Z", "2026-08-02T10:00:00Z"] {
        let mut primitive = fixture.weight(config_id, start, RED);
        repo.create_primitive(&mut primitive, true)
            .await
            .expect("create should succeed");
    }

    let reset = repo
        .reset_flags(
            fixture.user_id,
            "Weight",
            ts("2026-08-01T00:00:00Z"),
            ts("2026-08-02T00:00:00Z"),
        )
        .await
        .expect("reset");
    assert_eq!(reset, 1);

    let totals = repo
        .calculate_unseen_flags(fixture.user_id, &[config_id], &[])
        .await
        .expect("totals");
    assert_eq!(totals, RED, "the entry outside the window keeps its flag");

    let rows = repo
        .retrieve_unseen_results(fixture.deployment_id, fixture.user_id, &[], &[config_id])
        .await
        .expect("rows");
    assert_eq!(rows.len(), 1, "reset entries remain in the ledger");
}

/// Grouped rows sum per (module, config), drop badge-excluded modules,
/// collapse non-hybrid questionnaires into the module-level group and
/// sort by (red, amber, gray) descending.
#[tokio::test]
async fn unseen_results_group_and_sort() {
    let repo = InMemoryRepository::new();
    let fixture = Fixture::new();
    let weight_config = Uuid::new_v4();
    let questionnaire_config = Uuid::new_v4();
    let risk_config = Uuid::new_v4();
    let enabled = [weight_config, questionnaire_config, risk_config];

    for flags in [AMBER, AMBER] {
        let mut primitive = fixture.weight(weight_config, "2026-08-01T10:00:00Z", flags);
        repo.create_primitive(&mut primitive, true).await.expect("create");
    }
    let mut questionnaire = fixture.primitive(
        "Questionnaire",
        PrimitiveValue::Questionnaire(vitalink_core::models::primitive::QuestionnaireValue {
            questionnaire_id: None,
            questionnaire_name: None,
            is_for_manager: false,
            answers: Vec::new(),
            value: None,
        }),
        questionnaire_config,
        "2026-08-01T11:00:00Z",
        RED,
    );
    repo.create_primitive(&mut questionnaire, true).await.expect("create");
    let mut risk = fixture.primitive(
        "RiskScore",
        PrimitiveValue::RiskScore(MeasurementValue { value: 0.4 }),
        risk_config,
        "2026-08-01T12:00:00Z",
        RED,
    );
    repo.create_primitive(&mut risk, true).await.expect("create");

    let rows = repo
        .retrieve_unseen_results(fixture.deployment_id, fixture.user_id, &[], &enabled)
        .await
        .expect("rows");

    assert_eq!(rows.len(), 2, "risk scores never make badge rows: {rows:?}");
    assert_eq!(rows[0].module_id, "Questionnaire");
    assert_eq!(
        rows[0].module_config_id, None,
        "non-hybrid questionnaires collapse into the module-level group"
    );
    assert_eq!(rows[0].flags, RED);
    assert_eq!(rows[1].module_id, "Weight");
    assert_eq!(rows[1].flags, Flags { red: 0, amber: 2, gray: 0 });
}

/// Hybrid questionnaire configs keep their own badge row.
#[tokio::test]
async fn hybrid_questionnaires_keep_their_config_row() {
    let repo = InMemoryRepository::new();
    let fixture = Fixture::new();
    let hybrid_config = Uuid::new_v4();

    let mut questionnaire = fixture.primitive(
        "Questionnaire",
        PrimitiveValue::Questionnaire(vitalink_core::models::primitive::QuestionnaireValue {
            questionnaire_id: Some("qn-hybrid".to_string()),
            questionnaire_name: None,
            is_for_manager: false,
            answers: Vec::new(),
            value: None,
        }),
        hybrid_config,
        "2026-08-01T11:00:00Z",
        GRAY,
    );
    repo.create_primitive(&mut questionnaire, true).await.expect("create");

    let rows = repo
        .retrieve_unseen_results(
            fixture.deployment_id,
            fixture.user_id,
            &[hybrid_config],
            &[hybrid_config],
        )
        .await
        .expect("rows");
    assert_eq!(rows[0].module_config_id, Some(hybrid_config));
}

/// The profile badge total sums enabled configs minus excluded modules.
#[tokio::test]
async fn calculate_unseen_flags_excludes_modules() {
    let repo = InMemoryRepository::new();
    let fixture = Fixture::new();
    let weight_config = Uuid::new_v4();
    let rate_config = Uuid::new_v4();

    let mut weight = fixture.weight(weight_config, "2026-08-01T10:00:00Z", RED);
    repo.create_primitive(&mut weight, true).await.expect("create");
    let mut rate = fixture.primitive(
        "HeartRate",
        PrimitiveValue::HeartRate(MeasurementValue { value: 72.0 }),
        rate_config,
        "2026-08-01T11:00:00Z",
        AMBER,
    );
    repo.create_primitive(&mut rate, true).await.expect("create");

    let totals = repo
        .calculate_unseen_flags(fixture.user_id, &[weight_config, rate_config], &["HeartRate"])
        .await
        .expect("totals");
    assert_eq!(totals, RED);

    let totals = repo
        .calculate_unseen_flags(fixture.user_id, &[rate_config], &[])
        .await
        .expect("totals");
    assert_eq!(totals, AMBER, "configs outside the enabled set are ignored");
}

/// The earliest unseen start marks the last manager note boundary.
#[tokio::test]
async fn first_unseen_result_is_the_earliest_start() {
    let repo = InMemoryRepository::new();
    let fixture = Fixture::new();
    let config_id = Uuid::new_v4();

    assert_eq!(
        repo.retrieve_first_unseen_result(fixture.deployment_id, fixture.user_id)
            .await
            .expect("empty ledger"),
        None
    );

    for start in ["2026-08-03T10:00:00Z", "2026-08-01T10:00:00Z"] {
        let mut primitive = fixture.weight(config_id, start, GRAY);
        repo.create_primitive(&mut primitive, true).await.expect("create");
    }

    let first = repo
        .retrieve_first_unseen_result(fixture.deployment_id, fixture.user_id)
        .await
        .expect("first");
    assert_eq!(first, Some(ts("2026-08-01T10:00:00Z")));
}

/// Lookup by kind and field filter, used for duplicate-trigger detection.
#[tokio::test]
async fn retrieve_primitive_by_name_filters_fields() {
    let repo = InMemoryRepository::new();
    let fixture = Fixture::new();
    let mut trigger = fixture.primitive(
        "FurtherPregnancyKeyActionTrigger",
        PrimitiveValue::FurtherPregnancyKeyActionTrigger(
            vitalink_core::models::primitive::FurtherPregnancyTriggerValue {
                current_group_category:
                    vitalink_core::models::primitive::CurrentGroupCategory::NotPregnant,
            },
        ),
        Uuid::new_v4(),
        "2026-08-01T10:00:00Z",
        Flags::default(),
    );
    repo.create_primitive(&mut trigger, false).await.expect("create");

    let mut filter = BTreeMap::new();
    filter.insert(
        "current_group_category".to_string(),
        serde_json::Value::String("PREGNANT".to_string()),
    );
    let missing = repo
        .retrieve_primitive_by_name(
            fixture.user_id,
            PrimitiveKind::FurtherPregnancyKeyActionTrigger,
            &filter,
        )
        .await;
    assert!(matches!(missing, Err(StorageError::NotFound { .. })));

    let found = repo
        .retrieve_primitive_by_name(
            fixture.user_id,
            PrimitiveKind::FurtherPregnancyKeyActionTrigger,
            &BTreeMap::new(),
        )
        .await;
    assert!(found.is_ok(), "unfiltered lookup should find the record");
}
