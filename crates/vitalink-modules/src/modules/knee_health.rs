use vitalink_core::models::module_config::{Actor, ModuleConfig};
use vitalink_core::models::primitive::{KneeScoreValue, Primitive, PrimitiveValue};

use crate::answers;
use crate::error::ModuleError;
use crate::{derive_primitive, ScoringStrategy};

const MODULE_ID: &str = "KneeHealth";

pub const MINIMUM_ANSWERED: usize = 16;

pub const SUBSCALE_SYMPTOMS: &str = "symptoms";
pub const SUBSCALE_SPORTS_ACTIVITY: &str = "sports_activity";
pub const SUBSCALE_KNEE_FUNCTION: &str = "knee_function";

/// Licensed knee-health questionnaire.
///
/// Exactly one questionnaire per submission. Derivation attaches option
/// weights, enforces the minimum answered count and appends a KneeScore
/// record with per-subscale sums; scoring normalizes the total to the
/// maximum possible score.
pub struct KneeHealthScoring;

impl ScoringStrategy for KneeHealthScoring {
    fn validate_config_body(&self, config: &ModuleConfig) -> Result<(), ModuleError> {
        let parsed = answers::parse_config(MODULE_ID, config)?;
        if !parsed.max_score.is_some_and(|m| m > 0.0) {
            return Err(ModuleError::InvalidConfigBody {
                field: "max_score".to_string(),
                reason: "a positive max_score is required".to_string(),
            });
        }
        for question in &parsed.questions {
            if !question.skip_calculation && question.subscale.is_none() {
                return Err(ModuleError::InvalidConfigBody {
                    field: format!("questions.{}.subscale", question.id),
                    reason: "scoring questions must declare a subscale".to_string(),
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
        answers::expect_single_questionnaire(batch)?;
        let parsed = answers::parse_config(MODULE_ID, config)?;

        let score = {
            let PrimitiveValue::Questionnaire(questionnaire) = &mut batch[0].value else {
                return Err(ModuleError::InvalidModuleResult(
                    "only a questionnaire can be submitted".to_string(),
                ));
            };
            answers::check_duplicate_answers(questionnaire, MODULE_ID)?;
            answers::attach_answer_scores(questionnaire, &parsed)?;
            let eligible = answers::scoring_answers(questionnaire, &parsed)?;
            answers::require_minimum_answered(eligible.len(), MINIMUM_ANSWERED)?;
            KneeScoreValue {
                value: None,
                symptoms: answers::subscale_sum(&eligible, &parsed, SUBSCALE_SYMPTOMS),
                sports_activity: answers::subscale_sum(
                    &eligible,
                    &parsed,
                    SUBSCALE_SPORTS_ACTIVITY,
                ),
                knee_function: answers::subscale_sum(&eligible, &parsed, SUBSCALE_KNEE_FUNCTION),
            }
        };

        let derived = derive_primitive(&batch[0], PrimitiveValue::KneeScore(score));
        batch.push(derived);
        Ok(())
    }

    fn calculate(
        &self,
        primitive: &mut Primitive,
        config: &ModuleConfig,
    ) -> Result<(), ModuleError> {
        let parsed = answers::parse_config(MODULE_ID, config)?;
        let PrimitiveValue::KneeScore(score) = &mut primitive.value else {
            return Ok(());
        };
        let max_score = parsed.max_score.ok_or_else(|| ModuleError::InvalidConfigBody {
            field: "max_score".to_string(),
            reason: "a positive max_score is required".to_string(),
        })?;

        let total = score.symptoms.unwrap_or(0.0)
            + score.sports_activity.unwrap_or(0.0)
            + score.knee_function.unwrap_or(0.0);
        score.value = Some(total / max_score * 100.0);
        Ok(())
    }
}
