use vitalink_core::models::module_config::{Actor, ModuleConfig};
use vitalink_core::models::primitive::{AnswerFormat, Primitive, PrimitiveValue};

use crate::answers;
use crate::error::ModuleError;
use crate::ScoringStrategy;

const MODULE_ID: &str = "Questionnaire";

/// Generic questionnaire instrument.
///
/// Derives an overall weighted score when the deployment's config enables
/// scoring: each answer scores its configured option weight and the total
/// is normalized to the maximum possible score. Manager-authored
/// observation notes pass through unscored.
pub struct QuestionnaireScoring;

impl ScoringStrategy for QuestionnaireScoring {
    fn validate_config_body(&self, config: &ModuleConfig) -> Result<(), ModuleError> {
        let parsed = answers::parse_config(MODULE_ID, config)?;
        if parsed.score_available && !parsed.max_score.is_some_and(|m| m > 0.0) {
            return Err(ModuleError::InvalidConfigBody {
                field: "max_score".to_string(),
                reason: "a positive max_score is required when score_available is set"
                    .to_string(),
            });
        }
        for question in &parsed.questions {
            if question.format == AnswerFormat::TextChoice && question.options.is_empty() {
                return Err(ModuleError::InvalidConfigBody {
                    field: format!("questions.{}.options", question.id),
                    reason: "options must be provided for text-choice questions".to_string(),
                });
            }
        }
        Ok(())
    }

    fn preprocess(
        &self,
        batch: &mut Vec<Primitive>,
        _actor: &Actor,
        config: &ModuleConfig,
    ) -> Result<(), ModuleError> {
        for primitive in batch.iter_mut() {
            let PrimitiveValue::Questionnaire(questionnaire) = &mut primitive.value else {
                continue;
            };
            answers::check_duplicate_answers(questionnaire, MODULE_ID)?;
            if questionnaire.is_for_manager || config.config_body.is_none() {
                continue;
            }
            let parsed = answers::parse_config(MODULE_ID, config)?;
            if parsed.score_available {
                answers::attach_answer_scores(questionnaire, &parsed)?;
            }
        }
        Ok(())
    }

    fn calculate(
        &self,
        primitive: &mut Primitive,
        config: &ModuleConfig,
    ) -> Result<(), ModuleError> {
        if primitive.is_manager_note() || config.config_body.is_none() {
            return Ok(());
        }
        let parsed = answers::parse_config(MODULE_ID, config)?;
        let PrimitiveValue::Questionnaire(questionnaire) = &mut primitive.value else {
            return Ok(());
        };
        if !parsed.score_available {
            return Ok(());
        }

        let max_score = parsed.max_score.ok_or_else(|| ModuleError::InvalidConfigBody {
            field: "max_score".to_string(),
            reason: "required when score_available is set".to_string(),
        })?;
        let eligible = answers::scoring_answers(questionnaire, &parsed)?;
        let total: f64 = eligible.iter().filter_map(|a| a.answer_score).sum();
        questionnaire.value = Some(total / max_score * 100.0);
        Ok(())
    }

    /// A questionnaire submission matches the config instance whose body id
    /// equals the submitted questionnaire id.
    fn matches_config(&self, config: &ModuleConfig, primitive: Option<&Primitive>) -> bool {
        let Some(Primitive {
            value: PrimitiveValue::Questionnaire(questionnaire),
            ..
        }) = primitive
        else {
            return true;
        };
        let config_questionnaire_id = config
            .config_body
            .as_ref()
            .and_then(|b| b.get("id"))
            .and_then(|v| v.as_str());
        config_questionnaire_id == questionnaire.questionnaire_id.as_deref()
    }
}
