use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum AggregateFunc {
    Sum,
    Avg,
    Min,
    Max,
}

/// Calendar granularity of aggregation buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum AggregateMode {
    None,
    Daily,
    Weekly,
    Monthly,
}

/// Bucket key derived from a primitive's `start_date_time` (UTC).
///
/// Which parts are populated depends on the mode: `Daily` fills
/// year/month/day/hour, `Weekly` year/month/day, `Monthly` year/month/week,
/// and `None` leaves every part empty (one global bucket).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct TimePeriod {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<i8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<i8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hour: Option<i8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week: Option<i8>,
}

/// Ephemeral read model produced by an aggregation query; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AggregationBucket {
    pub time_period: TimePeriod,
    /// Aggregated value per declared aggregation field.
    pub values: BTreeMap<String, f64>,
}
