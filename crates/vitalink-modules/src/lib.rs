//! vitalink-modules
//!
//! The per-instrument scoring contract and its registry. Each clinical
//! instrument ("module") is a [`Module`] descriptor composed with a
//! [`ScoringStrategy`]; the registry is built once at process start and
//! never mutated. The RAG threshold evaluator and the flag-cascade live
//! here too, since modules delegate their threshold lookups to them.

pub mod answers;
pub mod error;
pub mod flags;
pub mod modules;
pub mod rag;

use std::collections::BTreeMap;
use std::sync::LazyLock;

use uuid::Uuid;

use vitalink_core::models::flags::Flags;
use vitalink_core::models::module_config::{Actor, ModuleConfig};
use vitalink_core::models::primitive::{Primitive, PrimitiveKind, PrimitiveValue};
use vitalink_core::models::threshold::ThresholdData;

use error::ModuleError;

/// Per-instrument scoring logic, injected into a [`Module`] descriptor.
///
/// Every method has a do-nothing default so simple measurement modules can
/// share one passthrough implementation.
pub trait ScoringStrategy: Send + Sync {
    /// Structural validation of the deployment-specific config body.
    fn validate_config_body(&self, _config: &ModuleConfig) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Derivation stage: validate the raw batch and append derived
    /// primitives (e.g. a computed score record built from a raw
    /// questionnaire).
    fn preprocess(
        &self,
        _batch: &mut Vec<Primitive>,
        _actor: &Actor,
        _config: &ModuleConfig,
    ) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Scoring stage: fill the primitive's computed value fields.
    fn calculate(
        &self,
        _primitive: &mut Primitive,
        _config: &ModuleConfig,
    ) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Threshold lookup per scored field. The default walks the config's
    /// table for every field it mentions; composite modules override this.
    fn threshold_data(
        &self,
        target: &Primitive,
        config: &ModuleConfig,
        history: &[Primitive],
    ) -> ThresholdData {
        rag::evaluate_fields(target, config, history)
    }

    /// Extra config-matching rule applied when resolving a deployment's
    /// config instance without an explicit config id.
    fn matches_config(&self, _config: &ModuleConfig, _primitive: Option<&Primitive>) -> bool {
        true
    }
}

/// Business-logic definition of one clinical instrument.
pub struct Module {
    pub module_id: &'static str,
    /// Primitive kinds this module emits, in derivation order.
    pub primitive_kinds: &'static [PrimitiveKind],
    pub rag_enabled: bool,
    /// Minimum scoring-eligible answers a submission must carry.
    pub minimum_answered: Option<usize>,
    /// Set for key-action trigger modules: the kind checked for duplicates.
    pub trigger_kind: Option<PrimitiveKind>,
    /// How many recent results feed change thresholds and direction
    /// metadata.
    pub recent_results_number: usize,
    pub scoring: &'static dyn ScoringStrategy,
}

impl Module {
    pub fn is_trigger_module(&self) -> bool {
        self.trigger_kind.is_some()
    }

    /// Resolve the deployment's config instance for this module.
    ///
    /// With an explicit `module_config_id` (or one already stamped on the
    /// primitive) only that instance matches; otherwise the first enabled
    /// instance accepted by the strategy's matching rule wins.
    pub fn extract_module_config<'a>(
        &self,
        module_configs: &'a [ModuleConfig],
        primitive: Option<&Primitive>,
        module_config_id: Option<Uuid>,
    ) -> Result<&'a ModuleConfig, ModuleError> {
        let wanted = module_config_id.or_else(|| primitive.and_then(|p| p.module_config_id));

        let found = match wanted {
            Some(id) => module_configs
                .iter()
                .find(|mc| mc.module_id == self.module_id && mc.id == id && mc.is_enabled()),
            None => module_configs
                .iter()
                .filter(|mc| mc.module_id == self.module_id && mc.is_enabled())
                .find(|mc| self.scoring.matches_config(mc, primitive)),
        };

        found.ok_or_else(|| ModuleError::InvalidModuleConfiguration {
            module_id: self.module_id.to_string(),
            config_id: wanted.map(|id| id.to_string()).unwrap_or_else(|| "none".to_string()),
        })
    }

    /// Every derived primitive must be a kind this module declares; a
    /// multi-kind module expects at least two primitives and at most one
    /// per declared kind.
    pub fn validate_module_result(&self, batch: &[Primitive]) -> Result<(), ModuleError> {
        let invalid: Vec<String> = batch
            .iter()
            .filter(|p| !self.primitive_kinds.contains(&p.kind()))
            .map(|p| p.kind().to_string())
            .collect();
        if !invalid.is_empty() {
            return Err(ModuleError::InvalidModuleResult(format!(
                "invalid primitives [{}]",
                invalid.join(", ")
            )));
        }

        if self.primitive_kinds.len() <= 1 {
            return Ok(());
        }

        if batch.len() < 2 {
            return Err(ModuleError::InvalidModuleResult(format!(
                "not enough primitives for {} module",
                self.module_id
            )));
        }

        for kind in self.primitive_kinds {
            if batch.iter().filter(|p| p.kind() == *kind).count() > 1 {
                return Err(ModuleError::InvalidModuleResult(format!(
                    "too many {} primitives for {} module",
                    kind, self.module_id
                )));
            }
        }
        Ok(())
    }

    /// Evaluate thresholds and count per-field flags for one primitive.
    pub fn calculate_rag_flags(
        &self,
        primitive: &Primitive,
        config: &ModuleConfig,
        history: &[Primitive],
    ) -> (ThresholdData, Flags) {
        let threshold = self.scoring.threshold_data(primitive, config, history);
        let flags = rag::count_field_flags(&threshold);
        (threshold, flags)
    }

    pub fn validate_module_config(&self, config: &ModuleConfig) -> Result<(), ModuleError> {
        self.scoring.validate_config_body(config)?;
        for threshold in &config.rag_thresholds {
            let supported = self
                .primitive_kinds
                .iter()
                .any(|kind| kind.scored_fields().contains(&threshold.field_name.as_str()));
            if !supported {
                return Err(ModuleError::InvalidConfigBody {
                    field: "rag_thresholds".to_string(),
                    reason: format!(
                        "{} field is not supported by {} module",
                        threshold.field_name, self.module_id
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Build a derived primitive that shares the source's identity envelope.
pub fn derive_primitive(source: &Primitive, value: PrimitiveValue) -> Primitive {
    Primitive {
        id: None,
        user_id: source.user_id,
        submitter_id: source.submitter_id,
        deployment_id: source.deployment_id,
        module_id: source.module_id.clone(),
        module_config_id: source.module_config_id,
        module_result_id: source.module_result_id,
        device_name: source.device_name.clone(),
        start_date_time: source.start_date_time,
        create_date_time: None,
        flags: None,
        rag_threshold: None,
        value,
    }
}

static REGISTRY: LazyLock<BTreeMap<&'static str, Module>> = LazyLock::new(|| {
    modules::module_defs()
        .into_iter()
        .map(|m| (m.module_id, m))
        .collect()
});

/// All registered modules, keyed by module id.
pub fn all_modules() -> impl Iterator<Item = &'static Module> {
    REGISTRY.values()
}

/// Look up a module by id.
pub fn get_module(module_id: &str) -> Result<&'static Module, ModuleError> {
    REGISTRY
        .get(module_id)
        .ok_or_else(|| ModuleError::UnknownModule(module_id.to_string()))
}
