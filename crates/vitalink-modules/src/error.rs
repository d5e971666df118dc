use thiserror::Error;

use vitalink_core::error::CoreError;

#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("module {0} is not registered")]
    UnknownModule(String),

    #[error("{module_id} with module config id {config_id} is not configured in module configs")]
    InvalidModuleConfiguration { module_id: String, config_id: String },

    #[error("config body is required for {0}")]
    MissingConfigBody(String),

    #[error("config body field {field} is invalid: {reason}")]
    InvalidConfigBody { field: String, reason: String },

    #[error("number of questions answered below the minimum required")]
    NotAllRequiredQuestionsAnswered,

    #[error("answer {0} is not an option")]
    AnswerNotAnOption(String),

    #[error("question {0} does not have answer options configured with a weight")]
    MissingOptionWeight(String),

    #[error("answer for question {0} has an invalid format")]
    InvalidAnswer(String),

    #[error("config body does not configure question {0}")]
    UnknownQuestion(String),

    #[error("duplicate answers found for {0} module")]
    DuplicateAnswers(String),

    #[error("invalid module result: {0}")]
    InvalidModuleResult(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}
