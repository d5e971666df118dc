use vitalink_core::models::module_config::{Actor, ModuleConfig};
use vitalink_core::models::primitive::{HeartFailureScoreValue, Primitive, PrimitiveValue};

use crate::answers;
use crate::error::ModuleError;
use crate::{derive_primitive, ScoringStrategy};

const MODULE_ID: &str = "HeartFailure";

pub const MINIMUM_ANSWERED: usize = 12;

/// Upper bound of the per-answer rating scale when the config omits one.
const DEFAULT_SCALE_MAX: f64 = 5.0;

pub const SUBSCALE_PHYSICAL_LIMITATION: &str = "physical_limitation";
pub const SUBSCALE_SYMPTOM_FREQUENCY: &str = "symptom_frequency";
pub const SUBSCALE_QUALITY_OF_LIFE: &str = "quality_of_life";
pub const SUBSCALE_SOCIAL_LIMITATION: &str = "social_limitation";

const SUBSCALES: &[&str] = &[
    SUBSCALE_PHYSICAL_LIMITATION,
    SUBSCALE_SYMPTOM_FREQUENCY,
    SUBSCALE_QUALITY_OF_LIFE,
    SUBSCALE_SOCIAL_LIMITATION,
];

/// Heart-failure quality-of-life questionnaire, scored per subscale.
///
/// Derivation partitions the answers by subscale and records each
/// subscale's mean answer weight; scoring rescales every mean onto a
/// 0–100 range with `100 * (mean - 1) / (scale_max - 1)` and averages the
/// rescaled subscales into the overall summary.
pub struct HeartFailureScoring;

impl ScoringStrategy for HeartFailureScoring {
    fn validate_config_body(&self, config: &ModuleConfig) -> Result<(), ModuleError> {
        let parsed = answers::parse_config(MODULE_ID, config)?;
        if let Some(scale_max) = parsed.scale_max {
            if scale_max <= 1.0 {
                return Err(ModuleError::InvalidConfigBody {
                    field: "scale_max".to_string(),
                    reason: "must be greater than 1".to_string(),
                });
            }
        }
        for question in &parsed.questions {
            if question.skip_calculation {
                continue;
            }
            let subscale = question.subscale.as_deref();
            if !subscale.is_some_and(|s| SUBSCALES.contains(&s)) {
                return Err(ModuleError::InvalidConfigBody {
                    field: format!("questions.{}.subscale", question.id),
                    reason: format!("must be one of [{}]", SUBSCALES.join(", ")),
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
            HeartFailureScoreValue {
                physical_limitation: answers::subscale_mean(
                    &eligible,
                    &parsed,
                    SUBSCALE_PHYSICAL_LIMITATION,
                ),
                symptom_frequency: answers::subscale_mean(
                    &eligible,
                    &parsed,
                    SUBSCALE_SYMPTOM_FREQUENCY,
                ),
                quality_of_life: answers::subscale_mean(
                    &eligible,
                    &parsed,
                    SUBSCALE_QUALITY_OF_LIFE,
                ),
                social_limitation: answers::subscale_mean(
                    &eligible,
                    &parsed,
                    SUBSCALE_SOCIAL_LIMITATION,
                ),
                overall_summary: None,
            }
        };

        let derived = derive_primitive(&batch[0], PrimitiveValue::HeartFailureScore(score));
        batch.push(derived);
        Ok(())
    }

    fn calculate(
        &self,
        primitive: &mut Primitive,
        config: &ModuleConfig,
    ) -> Result<(), ModuleError> {
        let parsed = answers::parse_config(MODULE_ID, config)?;
        let PrimitiveValue::HeartFailureScore(score) = &mut primitive.value else {
            return Ok(());
        };

        let scale_max = parsed.scale_max.unwrap_or(DEFAULT_SCALE_MAX);
        let rescale = |mean: f64| 100.0 * (mean - 1.0) / (scale_max - 1.0);

        score.physical_limitation = score.physical_limitation.map(rescale);
        score.symptom_frequency = score.symptom_frequency.map(rescale);
        score.quality_of_life = score.quality_of_life.map(rescale);
        score.social_limitation = score.social_limitation.map(rescale);

        let rescaled: Vec<f64> = [
            score.physical_limitation,
            score.symptom_frequency,
            score.quality_of_life,
            score.social_limitation,
        ]
        .into_iter()
        .flatten()
        .collect();
        if !rescaled.is_empty() {
            score.overall_summary = Some(rescaled.iter().sum::<f64>() / rescaled.len() as f64);
        }
        Ok(())
    }
}
