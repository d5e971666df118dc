use vitalink_core::models::module_config::ModuleConfig;

use crate::error::ModuleError;
use crate::ScoringStrategy;

/// Strategy for key-action trigger instruments.
///
/// Trigger primitives carry no scored values; the config body is required
/// because it names the key actions to schedule per cohort. Duplicate
/// detection and scheduling are pipeline concerns.
pub struct TriggerScoring;

impl ScoringStrategy for TriggerScoring {
    fn validate_config_body(&self, config: &ModuleConfig) -> Result<(), ModuleError> {
        if config.config_body.is_none() {
            return Err(ModuleError::MissingConfigBody(config.module_id.clone()));
        }
        Ok(())
    }
}
