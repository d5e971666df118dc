//! Shared answer-scoring helpers for questionnaire-style modules.

use std::collections::HashSet;

use vitalink_core::error::CoreError;
use vitalink_core::models::module_config::{ModuleConfig, QuestionConfig, QuestionnaireConfig};
use vitalink_core::models::primitive::{
    AnswerFormat, Primitive, PrimitiveKind, QuestionnaireAnswer, QuestionnaireValue,
};

use crate::error::ModuleError;

/// Parse the typed questionnaire body of a module config, mapping parse
/// failures onto the module error taxonomy.
pub fn parse_config(
    module_id: &str,
    config: &ModuleConfig,
) -> Result<QuestionnaireConfig, ModuleError> {
    QuestionnaireConfig::from_module_config(config).map_err(|e| match e {
        CoreError::MissingField(_) => ModuleError::MissingConfigBody(module_id.to_string()),
        other => ModuleError::InvalidConfigBody {
            field: "config_body".to_string(),
            reason: other.to_string(),
        },
    })
}

/// Score of one answer, looked up from the question's configuration.
///
/// Text-choice answers score their configured option weight; scale and
/// numeric answers score their raw value; boolean answers score 1 or 0.
pub fn answer_score(
    question: &QuestionConfig,
    answer: &QuestionnaireAnswer,
) -> Result<f64, ModuleError> {
    match question.format {
        AnswerFormat::TextChoice => {
            let label = answer.answer_text.as_deref().unwrap_or_default();
            let option = question
                .options
                .iter()
                .find(|o| o.label == label)
                .ok_or_else(|| ModuleError::AnswerNotAnOption(label.to_string()))?;
            option
                .weight
                .ok_or_else(|| ModuleError::MissingOptionWeight(answer.question_id.clone()))
        }
        AnswerFormat::Scale | AnswerFormat::Numeric => answer
            .value
            .as_ref()
            .and_then(numeric_answer_value)
            .ok_or_else(|| ModuleError::InvalidAnswer(answer.question_id.clone())),
        AnswerFormat::Boolean => match answer.value.as_ref().and_then(|v| v.as_bool()) {
            Some(true) => Ok(1.0),
            Some(false) => Ok(0.0),
            None => Err(ModuleError::InvalidAnswer(answer.question_id.clone())),
        },
        AnswerFormat::Text => Err(ModuleError::InvalidAnswer(answer.question_id.clone())),
    }
}

fn numeric_answer_value(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Attach a weighted score to every scoring-eligible answer.
pub fn attach_answer_scores(
    questionnaire: &mut QuestionnaireValue,
    config: &QuestionnaireConfig,
) -> Result<(), ModuleError> {
    let question_map = config.question_map();
    for answer in &mut questionnaire.answers {
        let question = question_map
            .get(answer.question_id.as_str())
            .ok_or_else(|| ModuleError::UnknownQuestion(answer.question_id.clone()))?;
        if question.skip_calculation {
            continue;
        }
        answer.answer_score = Some(answer_score(question, answer)?);
    }
    Ok(())
}

/// Answers whose question is configured for score derivation.
pub fn scoring_answers<'a>(
    questionnaire: &'a QuestionnaireValue,
    config: &QuestionnaireConfig,
) -> Result<Vec<&'a QuestionnaireAnswer>, ModuleError> {
    let question_map = config.question_map();
    let mut eligible = Vec::new();
    for answer in &questionnaire.answers {
        let question = question_map
            .get(answer.question_id.as_str())
            .ok_or_else(|| ModuleError::UnknownQuestion(answer.question_id.clone()))?;
        if !question.skip_calculation {
            eligible.push(answer);
        }
    }
    Ok(eligible)
}

pub fn check_duplicate_answers(
    questionnaire: &QuestionnaireValue,
    module_id: &str,
) -> Result<(), ModuleError> {
    let mut seen = HashSet::new();
    for answer in &questionnaire.answers {
        if !seen.insert(answer.question_id.as_str()) {
            return Err(ModuleError::DuplicateAnswers(module_id.to_string()));
        }
    }
    Ok(())
}

pub fn require_minimum_answered(answered: usize, minimum: usize) -> Result<(), ModuleError> {
    if answered < minimum {
        Err(ModuleError::NotAllRequiredQuestionsAnswered)
    } else {
        Ok(())
    }
}

/// Single-questionnaire submission check for instruments that derive their
/// score record themselves.
pub fn expect_single_questionnaire(batch: &[Primitive]) -> Result<(), ModuleError> {
    if batch.len() != 1 {
        return Err(ModuleError::InvalidModuleResult(
            "only one questionnaire can be submitted".to_string(),
        ));
    }
    if batch[0].kind() != PrimitiveKind::Questionnaire {
        return Err(ModuleError::InvalidModuleResult(
            "only a questionnaire can be submitted".to_string(),
        ));
    }
    Ok(())
}

/// Mean of the attached scores of the answers in one subscale.
pub fn subscale_mean(
    answers: &[&QuestionnaireAnswer],
    config: &QuestionnaireConfig,
    subscale: &str,
) -> Option<f64> {
    let question_map = config.question_map();
    let scores: Vec<f64> = answers
        .iter()
        .filter(|a| {
            question_map
                .get(a.question_id.as_str())
                .and_then(|q| q.subscale.as_deref())
                == Some(subscale)
        })
        .filter_map(|a| a.answer_score)
        .collect();
    if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    }
}

/// Sum of the attached scores of the answers in one subscale.
pub fn subscale_sum(
    answers: &[&QuestionnaireAnswer],
    config: &QuestionnaireConfig,
    subscale: &str,
) -> Option<f64> {
    let question_map = config.question_map();
    let scores: Vec<f64> = answers
        .iter()
        .filter(|a| {
            question_map
                .get(a.question_id.as_str())
                .and_then(|q| q.subscale.as_deref())
                == Some(subscale)
        })
        .filter_map(|a| a.answer_score)
        .collect();
    if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum())
    }
}
