//! Answer-text localization hook.
//!
//! Translation itself is an external collaborator; the pipeline only
//! guarantees which keys are never handed to it.

/// Keys the translator must leave untouched: the identity envelope and
/// the `type` discriminator.
pub const IGNORED_TRANSLATION_KEYS: &[&str] = &[
    "type",
    "id",
    "user_id",
    "submitter_id",
    "deployment_id",
    "module_id",
    "module_config_id",
    "module_result_id",
    "device_name",
    "start_date_time",
    "create_date_time",
    "flags",
    "rag_threshold",
];

pub trait Translator: Send + Sync {
    /// Localize displayable answer text of one raw item, in place. Keys
    /// listed in `ignored` are out of bounds.
    fn translate_item(&self, item: &mut serde_json::Value, ignored: &[&str]);
}

/// Translator that leaves every item untouched.
pub struct NoopTranslator;

impl Translator for NoopTranslator {
    fn translate_item(&self, _item: &mut serde_json::Value, _ignored: &[&str]) {}
}
