//! Time-bucketed aggregation over the in-memory store: bucket keys,
//! function application, ordering and bucket-level pagination.

use jiff::Timestamp;
use uuid::Uuid;

use vitalink_core::models::aggregate::{AggregateFunc, AggregateMode, TimePeriod};
use vitalink_core::models::primitive::{
    BloodPressureValue, MeasurementValue, Primitive, PrimitiveKind, PrimitiveValue,
};
use vitalink_storage::aggregate::{bucket_key, AggregationQuery};
use vitalink_storage::{InMemoryRepository, ModuleResultRepository};

fn ts(text: &str) -> Timestamp {
    text.parse().expect("test timestamp should parse")
}

fn measurement(
    user_id: Uuid,
    module_id: &str,
    value: PrimitiveValue,
    start: &str,
) -> Primitive {
    Primitive {
        id: None,
        user_id,
        submitter_id: None,
        deployment_id: Uuid::new_v4(),
        module_id: module_id.to_string(),
        module_config_id: None,
        module_result_id: None,
        device_name: None,
        start_date_time: Some(ts(start)),
        create_date_time: None,
        flags: None,
        rag_threshold: None,
        value,
    }
}

fn weight(user_id: Uuid, value: f64, start: &str) -> Primitive {
    measurement(
        user_id,
        "Weight",
        PrimitiveValue::Weight(MeasurementValue { value }),
        start,
    )
}

fn query(kind: PrimitiveKind, func: AggregateFunc, mode: AggregateMode) -> AggregationQuery {
    AggregationQuery {
        kind,
        func,
        mode,
        start_date: None,
        end_date: None,
        skip: None,
        limit: None,
        user_id: None,
        module_config_id: None,
    }
}

/// Two values in one bucket: AVG 125, MAX 150, MIN 100.
#[tokio::test]
async fn avg_max_min_round_trip() {
    let repo = InMemoryRepository::new();
    let user = Uuid::new_v4();
    for value in [100.0, 150.0] {
        let mut primitive = weight(user, value, "2026-08-05T10:15:00Z");
        repo.create_primitive(&mut primitive, false)
            .await
            .expect("create should succeed");
    }

    let mut q = query(PrimitiveKind::Weight, AggregateFunc::Avg, AggregateMode::Daily);
    q.user_id = Some(user);

    let buckets = repo.retrieve_aggregated_results(&q).await.expect("avg");
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].values.get("value"), Some(&125.0));

    q.func = AggregateFunc::Max;
    let buckets = repo.retrieve_aggregated_results(&q).await.expect("max");
    assert_eq!(buckets[0].values.get("value"), Some(&150.0));

    q.func = AggregateFunc::Min;
    let buckets = repo.retrieve_aggregated_results(&q).await.expect("min");
    assert_eq!(buckets[0].values.get("value"), Some(&100.0));
}

/// Step counts sum within a bucket.
#[tokio::test]
async fn sum_accumulates_within_bucket() {
    let repo = InMemoryRepository::new();
    let user = Uuid::new_v4();
    for value in [1200.0, 3400.0, 400.0] {
        let mut primitive = measurement(
            user,
            "Step",
            PrimitiveValue::Step(MeasurementValue { value }),
            "2026-08-05T09:05:00Z",
        );
        repo.create_primitive(&mut primitive, false)
            .await
            .expect("create should succeed");
    }

    let q = query(PrimitiveKind::Step, AggregateFunc::Sum, AggregateMode::Daily);
    let buckets = repo.retrieve_aggregated_results(&q).await.expect("sum");
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].values.get("value"), Some(&5000.0));
}

/// Daily buckets key on year/month/day/hour, so different hours split.
#[tokio::test]
async fn daily_buckets_split_by_hour() {
    let repo = InMemoryRepository::new();
    let user = Uuid::new_v4();
    for start in ["2026-08-05T10:00:00Z", "2026-08-05T11:00:00Z"] {
        let mut primitive = weight(user, 80.0, start);
        repo.create_primitive(&mut primitive, false)
            .await
            .expect("create should succeed");
    }

    let q = query(PrimitiveKind::Weight, AggregateFunc::Avg, AggregateMode::Daily);
    let buckets = repo.retrieve_aggregated_results(&q).await.expect("daily");
    assert_eq!(buckets.len(), 2);
    assert_eq!(
        buckets[0].time_period,
        TimePeriod {
            year: Some(2026),
            month: Some(8),
            day: Some(5),
            hour: Some(11),
            week: None,
        },
        "most recent bucket first"
    );
}

/// Weekly keys carry year/month/day; monthly keys carry year/month/week;
/// the no-bucket mode folds everything into one empty key.
#[tokio::test]
async fn mode_selects_bucket_key_parts() {
    let repo = InMemoryRepository::new();
    let user = Uuid::new_v4();
    let start = "2026-08-05T10:00:00Z";
    let mut primitive = weight(user, 80.0, start);
    repo.create_primitive(&mut primitive, false)
        .await
        .expect("create should succeed");

    let weekly = query(PrimitiveKind::Weight, AggregateFunc::Avg, AggregateMode::Weekly);
    let buckets = repo.retrieve_aggregated_results(&weekly).await.expect("weekly");
    assert_eq!(buckets[0].time_period, bucket_key(AggregateMode::Weekly, ts(start)));
    assert_eq!(buckets[0].time_period.hour, None);
    assert_eq!(buckets[0].time_period.day, Some(5));

    let monthly = query(PrimitiveKind::Weight, AggregateFunc::Avg, AggregateMode::Monthly);
    let buckets = repo
        .retrieve_aggregated_results(&monthly)
        .await
        .expect("monthly");
    assert_eq!(buckets[0].time_period, bucket_key(AggregateMode::Monthly, ts(start)));
    assert!(buckets[0].time_period.week.is_some());
    assert_eq!(buckets[0].time_period.day, None);

    let global = query(PrimitiveKind::Weight, AggregateFunc::Avg, AggregateMode::None);
    let buckets = repo.retrieve_aggregated_results(&global).await.expect("none");
    assert_eq!(buckets[0].time_period, TimePeriod::default());
}

/// Skip and limit slice the bucket list, not the primitives inside.
#[tokio::test]
async fn pagination_applies_to_buckets() {
    let repo = InMemoryRepository::new();
    let user = Uuid::new_v4();
    // three days, two samples each
    for day in ["03", "04", "05"] {
        for minute in ["00", "30"] {
            let start = format!("2026-08-{day}T10:{minute}:00Z");
            let mut primitive = weight(user, 80.0, &start);
            repo.create_primitive(&mut primitive, false)
                .await
                .expect("create should succeed");
        }
    }

    let mut q = query(PrimitiveKind::Weight, AggregateFunc::Sum, AggregateMode::Daily);
    q.skip = Some(1);
    q.limit = Some(1);

    let buckets = repo.retrieve_aggregated_results(&q).await.expect("page");
    assert_eq!(buckets.len(), 1);
    // newest-first bucket order: skipping one lands on August 4th
    assert_eq!(buckets[0].time_period.day, Some(4));
    assert_eq!(
        buckets[0].values.get("value"),
        Some(&160.0),
        "both samples of the bucket aggregate despite the limit"
    );
}

/// Every declared aggregation field is aggregated independently.
#[tokio::test]
async fn blood_pressure_aggregates_both_fields() {
    let repo = InMemoryRepository::new();
    let user = Uuid::new_v4();
    for (sys, dia) in [(120.0, 80.0), (140.0, 90.0)] {
        let mut primitive = measurement(
            user,
            "BloodPressure",
            PrimitiveValue::BloodPressure(BloodPressureValue {
                systolic_value: sys,
                diastolic_value: dia,
            }),
            "2026-08-05T08:00:00Z",
        );
        repo.create_primitive(&mut primitive, false)
            .await
            .expect("create should succeed");
    }

    let q = query(
        PrimitiveKind::BloodPressure,
        AggregateFunc::Avg,
        AggregateMode::Daily,
    );
    let buckets = repo.retrieve_aggregated_results(&q).await.expect("avg");
    assert_eq!(buckets[0].values.get("systolic_value"), Some(&130.0));
    assert_eq!(buckets[0].values.get("diastolic_value"), Some(&85.0));
}

/// The date window filters primitives before bucketing.
#[tokio::test]
async fn date_window_bounds_the_scan() {
    let repo = InMemoryRepository::new();
    let user = Uuid::new_v4();
    for start in [
        "2026-07-01T10:00:00Z",
        "2026-08-05T10:00:00Z",
        "2026-09-01T10:00:00Z",
    ] {
        let mut primitive = weight(user, 80.0, start);
        repo.create_primitive(&mut primitive, false)
            .await
            .expect("create should succeed");
    }

    let mut q = query(PrimitiveKind::Weight, AggregateFunc::Avg, AggregateMode::Daily);
    q.start_date = Some(ts("2026-08-01T00:00:00Z"));
    q.end_date = Some(ts("2026-09-01T00:00:00Z"));

    let buckets = repo.retrieve_aggregated_results(&q).await.expect("window");
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].time_period.month, Some(8));
}
