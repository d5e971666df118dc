use std::fmt;
use std::str::FromStr;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::CoreError;

use super::aggregate::AggregateFunc;
use super::flags::Flags;
use super::threshold::ThresholdData;

/// Discriminant for every primitive type the system can persist.
///
/// The wire discriminator is the `type` key on a raw submission item; its
/// value must match a variant name exactly.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub enum PrimitiveKind {
    Questionnaire,
    KneeScore,
    HeartFailureScore,
    HipScore,
    Step,
    HighFrequencyStep,
    HeartRate,
    BloodPressure,
    Weight,
    OxygenSaturation,
    RiskScore,
    GroupKeyActionTrigger,
    FurtherPregnancyKeyActionTrigger,
}

impl PrimitiveKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveKind::Questionnaire => "Questionnaire",
            PrimitiveKind::KneeScore => "KneeScore",
            PrimitiveKind::HeartFailureScore => "HeartFailureScore",
            PrimitiveKind::HipScore => "HipScore",
            PrimitiveKind::Step => "Step",
            PrimitiveKind::HighFrequencyStep => "HighFrequencyStep",
            PrimitiveKind::HeartRate => "HeartRate",
            PrimitiveKind::BloodPressure => "BloodPressure",
            PrimitiveKind::Weight => "Weight",
            PrimitiveKind::OxygenSaturation => "OxygenSaturation",
            PrimitiveKind::RiskScore => "RiskScore",
            PrimitiveKind::GroupKeyActionTrigger => "GroupKeyActionTrigger",
            PrimitiveKind::FurtherPregnancyKeyActionTrigger => {
                "FurtherPregnancyKeyActionTrigger"
            }
        }
    }

    /// Field names a RAG threshold table may target for this kind.
    pub fn scored_fields(self) -> &'static [&'static str] {
        match self {
            PrimitiveKind::Questionnaire => &["value"],
            PrimitiveKind::KneeScore => {
                &["value", "symptoms", "sports_activity", "knee_function"]
            }
            PrimitiveKind::HeartFailureScore => &[
                "physical_limitation",
                "symptom_frequency",
                "quality_of_life",
                "social_limitation",
                "overall_summary",
            ],
            PrimitiveKind::HipScore => &["left_score", "right_score", "side_score"],
            PrimitiveKind::Step
            | PrimitiveKind::HighFrequencyStep
            | PrimitiveKind::HeartRate
            | PrimitiveKind::Weight
            | PrimitiveKind::OxygenSaturation
            | PrimitiveKind::RiskScore => &["value"],
            PrimitiveKind::BloodPressure => &["systolic_value", "diastolic_value"],
            PrimitiveKind::GroupKeyActionTrigger
            | PrimitiveKind::FurtherPregnancyKeyActionTrigger => &[],
        }
    }

    /// Value fields this kind exposes to time-bucketed aggregation.
    pub fn aggregation_fields(self) -> &'static [&'static str] {
        match self {
            PrimitiveKind::Step | PrimitiveKind::HighFrequencyStep => &["value"],
            PrimitiveKind::HeartRate
            | PrimitiveKind::Weight
            | PrimitiveKind::OxygenSaturation => &["value"],
            PrimitiveKind::BloodPressure => &["systolic_value", "diastolic_value"],
            _ => &[],
        }
    }

    /// Aggregation functions this kind supports. Empty means the kind is
    /// not aggregatable at all.
    pub fn allowed_aggregate_funcs(self) -> &'static [AggregateFunc] {
        match self {
            PrimitiveKind::Step | PrimitiveKind::HighFrequencyStep => &[
                AggregateFunc::Sum,
                AggregateFunc::Avg,
                AggregateFunc::Min,
                AggregateFunc::Max,
            ],
            PrimitiveKind::HeartRate
            | PrimitiveKind::BloodPressure
            | PrimitiveKind::Weight
            | PrimitiveKind::OxygenSaturation => {
                &[AggregateFunc::Avg, AggregateFunc::Min, AggregateFunc::Max]
            }
            _ => &[],
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrimitiveKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Questionnaire" => Ok(PrimitiveKind::Questionnaire),
            "KneeScore" => Ok(PrimitiveKind::KneeScore),
            "HeartFailureScore" => Ok(PrimitiveKind::HeartFailureScore),
            "HipScore" => Ok(PrimitiveKind::HipScore),
            "Step" => Ok(PrimitiveKind::Step),
            "HighFrequencyStep" => Ok(PrimitiveKind::HighFrequencyStep),
            "HeartRate" => Ok(PrimitiveKind::HeartRate),
            "BloodPressure" => Ok(PrimitiveKind::BloodPressure),
            "Weight" => Ok(PrimitiveKind::Weight),
            "OxygenSaturation" => Ok(PrimitiveKind::OxygenSaturation),
            "RiskScore" => Ok(PrimitiveKind::RiskScore),
            "GroupKeyActionTrigger" => Ok(PrimitiveKind::GroupKeyActionTrigger),
            "FurtherPregnancyKeyActionTrigger" => {
                Ok(PrimitiveKind::FurtherPregnancyKeyActionTrigger)
            }
            other => Err(CoreError::UnknownPrimitiveKind(other.to_string())),
        }
    }
}

/// Answer input widget the question was presented with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum AnswerFormat {
    TextChoice,
    Scale,
    Boolean,
    Numeric,
    Text,
}

/// One submitted answer of a questionnaire.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuestionnaireAnswer {
    pub question_id: String,
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    pub format: AnswerFormat,
    /// Weighted score attached during derivation; never submitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_score: Option<f64>,
}

/// Cohort assignment recorded by the group trigger instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum GroupCategory {
    Pregnant,
    Postpartum,
    General,
}

/// Self-reported pregnancy status carried by the follow-up trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum CurrentGroupCategory {
    Pregnant,
    NotPregnant,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuestionnaireValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questionnaire_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questionnaire_name: Option<String>,
    /// Manager-authored observation notes skip flagging and flush the
    /// subject's unseen ledger instead.
    #[serde(default)]
    pub is_for_manager: bool,
    pub answers: Vec<QuestionnaireAnswer>,
    /// Overall weighted score, computed when the config enables scoring.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct KneeScoreValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sports_activity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knee_function: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HeartFailureScoreValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physical_limitation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symptom_frequency: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_of_life: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social_limitation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_summary: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HipScoreValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MeasurementValue {
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BloodPressureValue {
    pub systolic_value: f64,
    pub diastolic_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GroupTriggerValue {
    pub group_category: GroupCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_treatment_date: Option<Timestamp>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FurtherPregnancyTriggerValue {
    pub current_group_category: CurrentGroupCategory,
}

/// Typed union of every primitive kind's value fields.
///
/// The `type` tag on a raw submission item selects the variant, so adding
/// a kind means adding a variant here — there is no runtime registry to
/// keep in sync.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type")]
#[ts(export)]
pub enum PrimitiveValue {
    Questionnaire(QuestionnaireValue),
    KneeScore(KneeScoreValue),
    HeartFailureScore(HeartFailureScoreValue),
    HipScore(HipScoreValue),
    Step(MeasurementValue),
    HighFrequencyStep(MeasurementValue),
    HeartRate(MeasurementValue),
    BloodPressure(BloodPressureValue),
    Weight(MeasurementValue),
    OxygenSaturation(MeasurementValue),
    RiskScore(MeasurementValue),
    GroupKeyActionTrigger(GroupTriggerValue),
    FurtherPregnancyKeyActionTrigger(FurtherPregnancyTriggerValue),
}

impl PrimitiveValue {
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            PrimitiveValue::Questionnaire(_) => PrimitiveKind::Questionnaire,
            PrimitiveValue::KneeScore(_) => PrimitiveKind::KneeScore,
            PrimitiveValue::HeartFailureScore(_) => PrimitiveKind::HeartFailureScore,
            PrimitiveValue::HipScore(_) => PrimitiveKind::HipScore,
            PrimitiveValue::Step(_) => PrimitiveKind::Step,
            PrimitiveValue::HighFrequencyStep(_) => PrimitiveKind::HighFrequencyStep,
            PrimitiveValue::HeartRate(_) => PrimitiveKind::HeartRate,
            PrimitiveValue::BloodPressure(_) => PrimitiveKind::BloodPressure,
            PrimitiveValue::Weight(_) => PrimitiveKind::Weight,
            PrimitiveValue::OxygenSaturation(_) => PrimitiveKind::OxygenSaturation,
            PrimitiveValue::RiskScore(_) => PrimitiveKind::RiskScore,
            PrimitiveValue::GroupKeyActionTrigger(_) => PrimitiveKind::GroupKeyActionTrigger,
            PrimitiveValue::FurtherPregnancyKeyActionTrigger(_) => {
                PrimitiveKind::FurtherPregnancyKeyActionTrigger
            }
        }
    }

    /// Numeric field access by threshold field name.
    pub fn numeric_field(&self, name: &str) -> Option<f64> {
        match (self, name) {
            (PrimitiveValue::Questionnaire(q), "value") => q.value,
            (PrimitiveValue::KneeScore(k), "value") => k.value,
            (PrimitiveValue::KneeScore(k), "symptoms") => k.symptoms,
            (PrimitiveValue::KneeScore(k), "sports_activity") => k.sports_activity,
            (PrimitiveValue::KneeScore(k), "knee_function") => k.knee_function,
            (PrimitiveValue::HeartFailureScore(h), "physical_limitation") => {
                h.physical_limitation
            }
            (PrimitiveValue::HeartFailureScore(h), "symptom_frequency") => h.symptom_frequency,
            (PrimitiveValue::HeartFailureScore(h), "quality_of_life") => h.quality_of_life,
            (PrimitiveValue::HeartFailureScore(h), "social_limitation") => h.social_limitation,
            (PrimitiveValue::HeartFailureScore(h), "overall_summary") => h.overall_summary,
            (PrimitiveValue::HipScore(h), "left_score") => h.left_score,
            (PrimitiveValue::HipScore(h), "right_score") => h.right_score,
            (PrimitiveValue::Step(m), "value")
            | (PrimitiveValue::HighFrequencyStep(m), "value")
            | (PrimitiveValue::HeartRate(m), "value")
            | (PrimitiveValue::Weight(m), "value")
            | (PrimitiveValue::OxygenSaturation(m), "value")
            | (PrimitiveValue::RiskScore(m), "value") => Some(m.value),
            (PrimitiveValue::BloodPressure(b), "systolic_value") => Some(b.systolic_value),
            (PrimitiveValue::BloodPressure(b), "diastolic_value") => Some(b.diastolic_value),
            _ => None,
        }
    }
}

/// One measurement instance.
///
/// Identity fields are stamped by the ingestion pipeline; `id`,
/// `create_date_time` and the `submitter_id`/`start_date_time` defaults
/// are applied by the repository at persist time.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Primitive {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitter_id: Option<Uuid>,
    pub deployment_id: Uuid,
    pub module_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_config_id: Option<Uuid>,
    /// Groups every primitive derived from one submission.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_result_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date_time: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_date_time: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<Flags>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rag_threshold: Option<ThresholdData>,
    #[serde(flatten)]
    pub value: PrimitiveValue,
}

impl Primitive {
    pub fn kind(&self) -> PrimitiveKind {
        self.value.kind()
    }

    /// Whether this primitive is a manager-authored observation note.
    pub fn is_manager_note(&self) -> bool {
        matches!(&self.value, PrimitiveValue::Questionnaire(q) if q.is_for_manager)
    }

    pub fn numeric_field(&self, name: &str) -> Option<f64> {
        self.value.numeric_field(name)
    }
}
