use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::flags::RagColor;

/// How a scored value is compared against a threshold boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ThresholdType {
    /// Compare the value itself.
    Value,
    /// Compare the difference between the value and the average of recent results.
    ChangeNumber,
    /// Compare that difference as a percentage of the recent average.
    ChangePercent,
}

/// Which side of the boundary a value must fall on to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ThresholdDirection {
    /// Matches when value <= boundary.
    Ascending,
    /// Matches when value >= boundary.
    Descending,
}

/// One entry of a module config's RAG threshold table.
///
/// Entries are evaluated in the order given; the first boundary the value
/// satisfies determines the color.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RagThreshold {
    /// Name of the scored value field this entry applies to, e.g. "value"
    /// for Weight or "systolic_value" for BloodPressure.
    pub field_name: String,
    pub color: RagColor,
    pub threshold_type: ThresholdType,
    pub boundary: f64,
    pub direction: ThresholdDirection,
    pub enabled: bool,
}

/// Direction a scored value has moved relative to recent results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ChangeDirection {
    Increased,
    Decreased,
    NoChange,
}

/// Evaluated threshold metadata for one scored field, stored on the primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ThresholdOutcome {
    pub color: RagColor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<ChangeDirection>,
    /// True when the matched table came from a clinician-personalized config.
    pub is_custom: bool,
}

/// The full threshold evaluation of one primitive.
///
/// `fields` carries the per-field outcomes; `severities` is only populated
/// by composite modules that fold several partial scores (e.g. the two
/// sides of a joint score) into one list of colors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ThresholdData {
    pub fields: BTreeMap<String, ThresholdOutcome>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub severities: Vec<RagColor>,
}

impl ThresholdData {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.severities.is_empty()
    }
}
