use jiff::Timestamp;
use uuid::Uuid;

use vitalink_core::models::module_config::KeyActionConfig;
use vitalink_core::models::primitive::{GroupCategory, Primitive};

/// Extra scheduling context a trigger variant may need; the follow-up
/// pregnancy trigger fills it from the user's cohort primitive.
#[derive(Debug, Clone, Default)]
pub struct TriggerContext {
    pub start_date: Option<Timestamp>,
    pub group_category: Option<GroupCategory>,
}

/// External scheduler invoked when a trigger module fires for a user with
/// no prior trigger primitive of the same kind.
pub trait KeyActionScheduler: Send + Sync {
    fn schedule(
        &self,
        user_id: Uuid,
        key_actions: &[KeyActionConfig],
        primitive: &Primitive,
        config_body: Option<&serde_json::Value>,
        deployment_id: Uuid,
        context: &TriggerContext,
    ) -> Result<(), String>;
}

/// Scheduler that accepts everything and schedules nothing.
pub struct NullScheduler;

impl KeyActionScheduler for NullScheduler {
    fn schedule(
        &self,
        _user_id: Uuid,
        _key_actions: &[KeyActionConfig],
        _primitive: &Primitive,
        _config_body: Option<&serde_json::Value>,
        _deployment_id: Uuid,
        _context: &TriggerContext,
    ) -> Result<(), String> {
        Ok(())
    }
}
