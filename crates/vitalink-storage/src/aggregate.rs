//! Time-bucketed aggregation over historical primitives.
//!
//! The query is an explicit value; bucket-key construction and the
//! fold are plain functions so any store backend reproduces the same
//! grouping and ordering semantics.

use std::collections::BTreeMap;

use jiff::Timestamp;
use uuid::Uuid;

use vitalink_core::models::aggregate::{
    AggregateFunc, AggregateMode, AggregationBucket, TimePeriod,
};
use vitalink_core::models::primitive::{Primitive, PrimitiveKind};

/// One aggregation request.
#[derive(Debug, Clone)]
pub struct AggregationQuery {
    pub kind: PrimitiveKind,
    pub func: AggregateFunc,
    pub mode: AggregateMode,
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
    /// Applied to the bucket list, not to individual primitives.
    pub skip: Option<usize>,
    pub limit: Option<usize>,
    pub user_id: Option<Uuid>,
    pub module_config_id: Option<Uuid>,
}

/// Bucket key for one primitive's `start_date_time`, in UTC.
pub fn bucket_key(mode: AggregateMode, start: Timestamp) -> TimePeriod {
    let zoned = start.to_zoned(jiff::tz::TimeZone::UTC);
    match mode {
        AggregateMode::None => TimePeriod::default(),
        AggregateMode::Daily => TimePeriod {
            year: Some(zoned.year()),
            month: Some(zoned.month()),
            day: Some(zoned.day()),
            hour: Some(zoned.hour()),
            week: None,
        },
        AggregateMode::Weekly => TimePeriod {
            year: Some(zoned.year()),
            month: Some(zoned.month()),
            day: Some(zoned.day()),
            hour: None,
            week: None,
        },
        AggregateMode::Monthly => TimePeriod {
            year: Some(zoned.year()),
            month: Some(zoned.month()),
            day: None,
            hour: None,
            week: Some(zoned.date().iso_week_date().week()),
        },
    }
}

/// Fold already-filtered primitives into buckets.
///
/// The input must be ordered most-recent-first; buckets keep that
/// first-seen order, and skip/limit slice the bucket list.
pub fn aggregate(primitives: &[Primitive], query: &AggregationQuery) -> Vec<AggregationBucket> {
    let fields = query.kind.aggregation_fields();

    let mut order: Vec<TimePeriod> = Vec::new();
    let mut groups: BTreeMap<TimePeriod, BTreeMap<String, Vec<f64>>> = BTreeMap::new();
    for primitive in primitives {
        let Some(start) = primitive.start_date_time else {
            continue;
        };
        let key = bucket_key(query.mode, start);
        if !groups.contains_key(&key) {
            order.push(key);
        }
        let bucket = groups.entry(key).or_default();
        for field in fields {
            if let Some(value) = primitive.numeric_field(field) {
                bucket.entry((*field).to_string()).or_default().push(value);
            }
        }
    }

    let skip = query.skip.unwrap_or(0);
    let limit = query.limit.unwrap_or(usize::MAX);
    order
        .into_iter()
        .skip(skip)
        .take(limit)
        .map(|key| {
            let values = groups
                .remove(&key)
                .unwrap_or_default()
                .into_iter()
                .map(|(field, samples)| (field, apply(query.func, &samples)))
                .collect();
            AggregationBucket {
                time_period: key,
                values,
            }
        })
        .collect()
}

fn apply(func: AggregateFunc, samples: &[f64]) -> f64 {
    match func {
        AggregateFunc::Sum => samples.iter().sum(),
        AggregateFunc::Avg => samples.iter().sum::<f64>() / samples.len() as f64,
        AggregateFunc::Min => samples.iter().copied().fold(f64::INFINITY, f64::min),
        AggregateFunc::Max => samples.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    }
}
