use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::CoreError;

use super::threshold::RagThreshold;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum EnableStatus {
    Enabled,
    Disabled,
}

/// A deployment's configuration instance of a Module.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ModuleConfig {
    pub id: Uuid,
    pub module_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,
    pub status: EnableStatus,
    /// Instrument-specific body; questionnaire modules parse this into
    /// [`QuestionnaireConfig`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_body: Option<serde_json::Value>,
    /// Ordered threshold table; first satisfied boundary wins.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rag_thresholds: Vec<RagThreshold>,
    /// True when the thresholds were personalized for a single patient by
    /// a clinician.
    #[serde(default)]
    pub is_custom: bool,
}

impl ModuleConfig {
    pub fn is_enabled(&self) -> bool {
        self.status == EnableStatus::Enabled
    }
}

/// One selectable option of a text-choice question.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AnswerOption {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuestionConfig {
    pub id: String,
    pub text: String,
    pub format: super::primitive::AnswerFormat,
    /// Subscale this question contributes to, for instruments scored per
    /// subscale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscale: Option<String>,
    /// Excluded from score derivation when set.
    #[serde(default)]
    pub skip_calculation: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<AnswerOption>,
}

/// Typed questionnaire config body.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuestionnaireConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Enables the generic weighted score derivation.
    #[serde(default)]
    pub score_available: bool,
    /// Maximum possible weighted score, the normalization denominator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_score: Option<f64>,
    /// Upper bound of the per-answer rating scale, for subscale-mean
    /// instruments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_max: Option<f64>,
    #[serde(default)]
    pub is_for_manager: bool,
    pub questions: Vec<QuestionConfig>,
}

impl QuestionnaireConfig {
    /// Parse the typed body out of a module config.
    pub fn from_module_config(config: &ModuleConfig) -> Result<Self, CoreError> {
        let body = config
            .config_body
            .as_ref()
            .ok_or_else(|| CoreError::MissingField("config_body".to_string()))?;
        serde_json::from_value(body.clone()).map_err(CoreError::Serialization)
    }

    pub fn question_map(&self) -> BTreeMap<&str, &QuestionConfig> {
        self.questions.iter().map(|q| (q.id.as_str(), q)).collect()
    }
}

/// Key action to schedule when a trigger module fires.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct KeyActionConfig {
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_id: Option<String>,
    /// ISO-8601 duration between the trigger and the scheduled action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta_from_trigger: Option<String>,
}

/// The deployment slice the pipeline consumes: configured module
/// instances and schedulable key actions. Resolution of the full
/// deployment document is an external collaborator concern.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Deployment {
    pub id: Uuid,
    pub module_configs: Vec<ModuleConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_actions: Vec<KeyActionConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Role {
    Patient,
    Manager,
}

/// The authenticated actor a submission runs on behalf of.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn is_manager(&self) -> bool {
        self.role == Role::Manager
    }
}
