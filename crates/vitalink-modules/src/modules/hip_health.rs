use vitalink_core::models::module_config::{Actor, ModuleConfig};
use vitalink_core::models::primitive::{HipScoreValue, Primitive, PrimitiveValue};
use vitalink_core::models::threshold::ThresholdData;

use crate::answers;
use crate::error::ModuleError;
use crate::{derive_primitive, rag, ScoringStrategy};

const MODULE_ID: &str = "HipHealth";

pub const SUBSCALE_LEFT: &str = "left";
pub const SUBSCALE_RIGHT: &str = "right";

/// Virtual field name the two-sided threshold table targets; both sides
/// are evaluated against the same entries.
pub const SIDE_SCORE_FIELD: &str = "side_score";

/// Two-sided hip questionnaire: one summed score per side, each evaluated
/// against a shared threshold table into a per-result severities list.
pub struct HipHealthScoring;

impl ScoringStrategy for HipHealthScoring {
    fn validate_config_body(&self, config: &ModuleConfig) -> Result<(), ModuleError> {
        let parsed = answers::parse_config(MODULE_ID, config)?;
        for question in &parsed.questions {
            if question.skip_calculation {
                continue;
            }
            let subscale = question.subscale.as_deref();
            if subscale != Some(SUBSCALE_LEFT) && subscale != Some(SUBSCALE_RIGHT) {
                return Err(ModuleError::InvalidConfigBody {
                    field: format!("questions.{}.subscale", question.id),
                    reason: format!("must be {SUBSCALE_LEFT} or {SUBSCALE_RIGHT}"),
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
            HipScoreValue {
                left_score: answers::subscale_sum(&eligible, &parsed, SUBSCALE_LEFT),
                right_score: answers::subscale_sum(&eligible, &parsed, SUBSCALE_RIGHT),
            }
        };

        let derived = derive_primitive(&batch[0], PrimitiveValue::HipScore(score));
        batch.push(derived);
        Ok(())
    }

    /// Both sides share the `side_score` threshold entries; each side's
    /// outcome lands in the per-field map and its color in the severities
    /// list, so one submission counts one unit per flagged side before the
    /// cascade collapses them.
    fn threshold_data(
        &self,
        target: &Primitive,
        config: &ModuleConfig,
        _history: &[Primitive],
    ) -> ThresholdData {
        let PrimitiveValue::HipScore(score) = &target.value else {
            return ThresholdData::default();
        };

        let mut data = ThresholdData::default();
        let sides = [("left_score", score.left_score), ("right_score", score.right_score)];
        for (field, side_score) in sides {
            let Some(value) = side_score else { continue };
            if let Some(outcome) = rag::evaluate(
                &config.rag_thresholds,
                SIDE_SCORE_FIELD,
                value,
                &[],
                config.is_custom,
            ) {
                data.severities.push(outcome.color);
                data.fields.insert(field.to_string(), outcome);
            }
        }
        data
    }
}
