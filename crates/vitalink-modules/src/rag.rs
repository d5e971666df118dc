//! RAG threshold evaluation.
//!
//! Pure functions over a config's ordered threshold table. The table is
//! walked in the order given; the first entry whose boundary condition the
//! value satisfies determines the color.

use vitalink_core::models::flags::Flags;
use vitalink_core::models::module_config::ModuleConfig;
use vitalink_core::models::primitive::Primitive;
use vitalink_core::models::threshold::{
    ChangeDirection, RagThreshold, ThresholdData, ThresholdDirection, ThresholdOutcome,
    ThresholdType,
};

/// Evaluate one scored value against the table entries for `field_name`.
///
/// `history_values` are the same field's values from recent results; they
/// feed the Change* threshold types and the direction metadata. Entries
/// whose type needs history are skipped when none is available.
pub fn evaluate(
    table: &[RagThreshold],
    field_name: &str,
    value: f64,
    history_values: &[f64],
    is_custom: bool,
) -> Option<ThresholdOutcome> {
    for entry in table {
        if !entry.enabled || entry.field_name != field_name {
            continue;
        }

        let calc_value = match entry.threshold_type {
            ThresholdType::Value => value,
            ThresholdType::ChangeNumber => match mean(history_values) {
                Some(avg) => value - avg,
                None => continue,
            },
            ThresholdType::ChangePercent => match mean(history_values) {
                Some(avg) if avg != 0.0 => ((value - avg) * 100.0) / avg,
                _ => continue,
            },
        };

        let matched = match entry.direction {
            ThresholdDirection::Ascending => calc_value <= entry.boundary,
            ThresholdDirection::Descending => calc_value >= entry.boundary,
        };
        if matched {
            return Some(ThresholdOutcome {
                color: entry.color,
                direction: change_direction(value, history_values),
                is_custom,
            });
        }
    }
    None
}

/// Default per-field evaluation: every distinct field the table mentions is
/// evaluated independently against the target primitive.
pub fn evaluate_fields(
    target: &Primitive,
    config: &ModuleConfig,
    history: &[Primitive],
) -> ThresholdData {
    let mut data = ThresholdData::default();
    for entry in &config.rag_thresholds {
        if data.fields.contains_key(&entry.field_name) {
            continue;
        }
        let Some(value) = target.numeric_field(&entry.field_name) else {
            continue;
        };
        let history_values: Vec<f64> = history
            .iter()
            .filter_map(|p| p.numeric_field(&entry.field_name))
            .collect();
        if let Some(outcome) = evaluate(
            &config.rag_thresholds,
            &entry.field_name,
            value,
            &history_values,
            config.is_custom,
        ) {
            data.fields.insert(entry.field_name.clone(), outcome);
        }
    }
    data
}

/// Direction the value has moved relative to the mean of recent results.
pub fn change_direction(new_value: f64, history_values: &[f64]) -> Option<ChangeDirection> {
    let previous = mean(history_values)?;
    Some(if new_value < previous {
        ChangeDirection::Decreased
    } else if new_value > previous {
        ChangeDirection::Increased
    } else {
        ChangeDirection::NoChange
    })
}

/// Count one flag unit per Red/Amber/Gray outcome. Green and unmatched
/// fields contribute nothing. Composite modules that fill `severities`
/// are counted from that list instead of the per-field map.
pub fn count_field_flags(threshold: &ThresholdData) -> Flags {
    let mut flags = Flags::default();
    if threshold.severities.is_empty() {
        for outcome in threshold.fields.values() {
            flags.increment(outcome.color);
        }
    } else {
        for color in &threshold.severities {
            flags.increment(*color);
        }
    }
    flags
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
