//! Registered instrument definitions.

pub mod heart_failure;
pub mod hip_health;
pub mod key_action_trigger;
pub mod knee_health;
pub mod measurements;
pub mod questionnaire;

use vitalink_core::models::primitive::PrimitiveKind;

use crate::Module;

static QUESTIONNAIRE: questionnaire::QuestionnaireScoring = questionnaire::QuestionnaireScoring;
static KNEE_HEALTH: knee_health::KneeHealthScoring = knee_health::KneeHealthScoring;
static HEART_FAILURE: heart_failure::HeartFailureScoring = heart_failure::HeartFailureScoring;
static HIP_HEALTH: hip_health::HipHealthScoring = hip_health::HipHealthScoring;
static PASSTHROUGH: measurements::PassthroughScoring = measurements::PassthroughScoring;
static TRIGGER: key_action_trigger::TriggerScoring = key_action_trigger::TriggerScoring;

pub(crate) fn module_defs() -> Vec<Module> {
    vec![
        Module {
            module_id: "Questionnaire",
            primitive_kinds: &[PrimitiveKind::Questionnaire],
            rag_enabled: true,
            minimum_answered: None,
            trigger_kind: None,
            recent_results_number: 2,
            scoring: &QUESTIONNAIRE,
        },
        Module {
            module_id: "KneeHealth",
            primitive_kinds: &[PrimitiveKind::Questionnaire, PrimitiveKind::KneeScore],
            rag_enabled: true,
            minimum_answered: Some(knee_health::MINIMUM_ANSWERED),
            trigger_kind: None,
            recent_results_number: 2,
            scoring: &KNEE_HEALTH,
        },
        Module {
            module_id: "HeartFailure",
            primitive_kinds: &[
                PrimitiveKind::Questionnaire,
                PrimitiveKind::HeartFailureScore,
            ],
            rag_enabled: true,
            minimum_answered: Some(heart_failure::MINIMUM_ANSWERED),
            trigger_kind: None,
            recent_results_number: 2,
            scoring: &HEART_FAILURE,
        },
        Module {
            module_id: "HipHealth",
            primitive_kinds: &[PrimitiveKind::Questionnaire, PrimitiveKind::HipScore],
            rag_enabled: true,
            minimum_answered: None,
            trigger_kind: None,
            recent_results_number: 2,
            scoring: &HIP_HEALTH,
        },
        Module {
            module_id: "Step",
            primitive_kinds: &[PrimitiveKind::Step],
            rag_enabled: true,
            minimum_answered: None,
            trigger_kind: None,
            recent_results_number: 2,
            scoring: &PASSTHROUGH,
        },
        Module {
            module_id: "HighFrequencyStep",
            primitive_kinds: &[PrimitiveKind::HighFrequencyStep],
            rag_enabled: false,
            minimum_answered: None,
            trigger_kind: None,
            recent_results_number: 2,
            scoring: &PASSTHROUGH,
        },
        Module {
            module_id: "HeartRate",
            primitive_kinds: &[PrimitiveKind::HeartRate],
            rag_enabled: true,
            minimum_answered: None,
            trigger_kind: None,
            recent_results_number: 2,
            scoring: &PASSTHROUGH,
        },
        Module {
            module_id: "BloodPressure",
            primitive_kinds: &[PrimitiveKind::BloodPressure],
            rag_enabled: true,
            minimum_answered: None,
            trigger_kind: None,
            recent_results_number: 2,
            scoring: &PASSTHROUGH,
        },
        Module {
            module_id: "Weight",
            primitive_kinds: &[PrimitiveKind::Weight],
            rag_enabled: true,
            minimum_answered: None,
            trigger_kind: None,
            recent_results_number: 2,
            scoring: &PASSTHROUGH,
        },
        Module {
            module_id: "OxygenSaturation",
            primitive_kinds: &[PrimitiveKind::OxygenSaturation],
            rag_enabled: true,
            minimum_answered: None,
            trigger_kind: None,
            recent_results_number: 2,
            scoring: &PASSTHROUGH,
        },
        Module {
            module_id: "RiskScore",
            primitive_kinds: &[PrimitiveKind::RiskScore],
            rag_enabled: false,
            minimum_answered: None,
            trigger_kind: None,
            recent_results_number: 2,
            scoring: &PASSTHROUGH,
        },
        Module {
            module_id: "GroupKeyActionTrigger",
            primitive_kinds: &[PrimitiveKind::GroupKeyActionTrigger],
            rag_enabled: false,
            minimum_answered: None,
            trigger_kind: Some(PrimitiveKind::GroupKeyActionTrigger),
            recent_results_number: 2,
            scoring: &TRIGGER,
        },
        Module {
            module_id: "FurtherPregnancyKeyActionTrigger",
            primitive_kinds: &[PrimitiveKind::FurtherPregnancyKeyActionTrigger],
            rag_enabled: false,
            minimum_answered: None,
            trigger_kind: Some(PrimitiveKind::FurtherPregnancyKeyActionTrigger),
            recent_results_number: 2,
            scoring: &TRIGGER,
        },
    ]
}
