use std::collections::{BTreeMap, HashSet};

use jiff::Timestamp;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use vitalink_core::models::aggregate::AggregationBucket;
use vitalink_core::models::flags::Flags;
use vitalink_core::models::ledger::{UnseenModuleFlags, BADGE_EXCLUDED_MODULE_IDS};
use vitalink_core::models::module_config::{Actor, Deployment, ModuleConfig};
use vitalink_core::models::primitive::{Primitive, PrimitiveKind, PrimitiveValue};
use vitalink_modules::{flags, get_module, Module, ScoringStrategy};
use vitalink_storage::aggregate::AggregationQuery;
use vitalink_storage::error::StorageError;
use vitalink_storage::{ModuleResultRepository, PrimitiveQuery, SortDirection};

use crate::error::EngineError;
use crate::events::{Notifier, PrimitivesCreatedEvent};
use crate::key_actions::{KeyActionScheduler, TriggerContext};
use crate::translation::{Translator, IGNORED_TRANSLATION_KEYS};

/// One submission batch.
pub struct SubmitRequest {
    pub module_id: String,
    /// Raw items as submitted; each must declare a `type`.
    pub raw_items: Vec<serde_json::Value>,
    /// The patient the results belong to.
    pub subject_user_id: Uuid,
    /// Who submitted them (the subject, or a clinician authoring a note).
    pub actor: Actor,
    pub deployment: Deployment,
    pub module_config_id: Option<Uuid>,
}

/// Outcome of one batch. Partial success is success: per-item failures
/// land in `errors` without suppressing the persisted `ids`.
#[derive(Debug, Default, Serialize)]
pub struct SubmitOutcome {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<Uuid>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Badge response for one user: grouped per-module flag rows plus the
/// "last manager note" marker.
#[derive(Debug, Serialize)]
pub struct UnseenModulesResponse {
    pub flags: Vec<UnseenModuleFlags>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_manager_note: Option<Timestamp>,
}

/// Filter for the per-kind history read path.
#[derive(Debug, Clone)]
pub struct ModuleResultsRequest {
    pub user_id: Uuid,
    pub module_id: String,
    pub module_config_id: Option<Uuid>,
    pub from_date_time: Option<Timestamp>,
    pub to_date_time: Option<Timestamp>,
    pub direction: SortDirection,
    pub skip: Option<usize>,
    pub limit: Option<usize>,
    pub only_unseen: bool,
}

/// The module-result processing service.
///
/// Generic over the repository; the notifier, key-action scheduler and
/// answer translator are injected as trait objects so the pipeline owns
/// no global state.
pub struct ModuleResultService<R> {
    repo: R,
    notifier: Box<dyn Notifier>,
    scheduler: Box<dyn KeyActionScheduler>,
    translator: Box<dyn Translator>,
}

impl<R: ModuleResultRepository> ModuleResultService<R> {
    pub fn new(
        repo: R,
        notifier: Box<dyn Notifier>,
        scheduler: Box<dyn KeyActionScheduler>,
        translator: Box<dyn Translator>,
    ) -> Self {
        Self {
            repo,
            notifier,
            scheduler,
            translator,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Ingest one submission batch: parse, resolve, derive, score, flag,
    /// collapse, persist, update the ledger and notify.
    ///
    /// A failure in one derived primitive never aborts its siblings; only
    /// parse failure of every item, an unconfigured module/instance or a
    /// domain validation error fails the whole request.
    pub async fn submit(&self, request: SubmitRequest) -> Result<SubmitOutcome, EngineError> {
        let SubmitRequest {
            module_id,
            raw_items,
            subject_user_id,
            actor,
            deployment,
            module_config_id,
        } = request;

        if raw_items.is_empty() {
            return Err(EngineError::InvalidRequest("no items submitted".to_string()));
        }
        let module = get_module(&module_id)?;

        let module_result_id = Uuid::new_v4();
        let mut errors: Vec<String> = Vec::new();
        let mut primitives: Vec<Primitive> = Vec::new();

        for mut item in raw_items {
            let type_name = {
                let Some(object) = item.as_object() else {
                    return Err(EngineError::InvalidRequest(
                        "submission items must be objects".to_string(),
                    ));
                };
                match object.get("type").and_then(|t| t.as_str()) {
                    Some(name) => name.to_string(),
                    None => {
                        return Err(EngineError::InvalidRequest(
                            "every submission item must declare a type".to_string(),
                        ));
                    }
                }
            };

            self.translator
                .translate_item(&mut item, IGNORED_TRANSLATION_KEYS);

            if let Some(object) = item.as_object_mut() {
                object.insert(
                    "user_id".to_string(),
                    serde_json::Value::String(subject_user_id.to_string()),
                );
                object.insert(
                    "submitter_id".to_string(),
                    serde_json::Value::String(actor.user_id.to_string()),
                );
                object.insert(
                    "deployment_id".to_string(),
                    serde_json::Value::String(deployment.id.to_string()),
                );
                object.insert(
                    "module_id".to_string(),
                    serde_json::Value::String(module_id.clone()),
                );
                object.insert(
                    "module_result_id".to_string(),
                    serde_json::Value::String(module_result_id.to_string()),
                );
            }

            match serde_json::from_value::<Primitive>(item) {
                Ok(primitive) => primitives.push(primitive),
                Err(error) => {
                    warn!(%type_name, %error, "submission item failed to parse");
                    errors.push(format!("error creating primitive {type_name}: {error}"));
                }
            }
        }
        if primitives.is_empty() {
            return Err(EngineError::InvalidRequest(errors.join("; ")));
        }

        let config = module.extract_module_config(
            &deployment.module_configs,
            primitives.first(),
            module_config_id,
        )?;
        for primitive in &mut primitives {
            primitive.module_config_id = Some(config.id);
        }

        module.scoring.preprocess(&mut primitives, &actor, config)?;

        let mut discard: HashSet<usize> = HashSet::new();
        let mut save_unseen: Vec<bool> = Vec::with_capacity(primitives.len());
        let mut batch_has_manager_note = false;

        for (index, primitive) in primitives.iter_mut().enumerate() {
            let is_note = primitive.is_manager_note();
            save_unseen.push(!is_note);

            if is_note {
                batch_has_manager_note = true;
                // reviewing notes marks earlier results as seen
                if let Err(error) = self
                    .repo
                    .flush_unseen_results(primitive.user_id, primitive.start_date_time, None)
                    .await
                {
                    warn!(%error, "flush of unseen results failed for manager note");
                }
            }

            if let Err(error) = module.scoring.calculate(primitive, config) {
                warn!(kind = %primitive.kind(), %error, "scoring failed");
                errors.push(format!(
                    "error creating primitive {}: {error}",
                    primitive.kind()
                ));
                discard.insert(index);
                continue;
            }

            if is_note {
                continue;
            }
            if module.rag_enabled {
                let history = match self.recent_results(module, primitive, config).await {
                    Ok(history) => history,
                    Err(error) => {
                        warn!(kind = %primitive.kind(), %error, "history lookup failed");
                        errors.push(format!(
                            "error creating primitive {}: {error}",
                            primitive.kind()
                        ));
                        discard.insert(index);
                        continue;
                    }
                };
                let (threshold, flag_counts) =
                    module.calculate_rag_flags(primitive, config, &history);
                primitive.rag_threshold = Some(threshold);
                primitive.flags = Some(flag_counts);
            } else {
                primitive.flags = Some(Flags::default());
            }
        }

        if !batch_has_manager_note {
            module.validate_module_result(&primitives)?;
            if primitives.len() > module.primitive_kinds.len() {
                // ad-hoc extra derived records flag independently
                for primitive in primitives.iter_mut() {
                    flags::apply_overall_flags_logic(std::slice::from_mut(primitive));
                }
            } else {
                flags::apply_overall_flags_logic(&mut primitives);
            }
        }

        let mut ids: Vec<Uuid> = Vec::new();
        let mut persisted: Vec<Primitive> = Vec::new();
        for (index, primitive) in primitives.iter_mut().enumerate() {
            if discard.contains(&index) {
                continue;
            }
            if let Err(reason) = self.notifier.pre_create(primitive) {
                errors.push(format!(
                    "error creating primitive {}: {reason}",
                    primitive.kind()
                ));
                continue;
            }

            let trigger_required = if module.is_trigger_module() {
                match self.existing_trigger_primitive(module, primitive).await {
                    Ok(exists) => !exists,
                    Err(error) => {
                        errors.push(format!(
                            "error creating primitive {}: {error}",
                            primitive.kind()
                        ));
                        continue;
                    }
                }
            } else {
                false
            };

            match self.repo.create_primitive(primitive, save_unseen[index]).await {
                Ok(id) => {
                    ids.push(id);
                    self.notifier.post_create(primitive);
                    persisted.push(primitive.clone());

                    if trigger_required {
                        if let Err(error) = self
                            .trigger_key_actions(primitive, config, &actor, &deployment)
                            .await
                        {
                            warn!(%error, "key action trigger failed");
                            errors.push(format!(
                                "error creating primitive {}: {error}",
                                primitive.kind()
                            ));
                        }
                    }
                }
                Err(error) => {
                    warn!(kind = %primitive.kind(), %error, "persist failed");
                    errors.push(format!(
                        "error creating primitive {}: {error}",
                        primitive.kind()
                    ));
                }
            }
        }

        if !ids.is_empty() {
            if let Some(event) = PrimitivesCreatedEvent::from_batch(&persisted) {
                event.emit();
                self.notifier.primitives_created(&event);
            }
            self.notifier.stats_update_requested(subject_user_id);
            if let Err(error) = self.update_unseen_flags(subject_user_id, &deployment).await {
                warn!(%error, "badge refresh failed after submit");
            }
        }

        Ok(SubmitOutcome { ids, errors })
    }

    /// Recent results of the same kind and config instance, newest first,
    /// feeding change thresholds and direction metadata.
    async fn recent_results(
        &self,
        module: &Module,
        primitive: &Primitive,
        config: &ModuleConfig,
    ) -> Result<Vec<Primitive>, StorageError> {
        let mut query = PrimitiveQuery::new(primitive.kind());
        query.user_id = Some(primitive.user_id);
        query.module_config_id = Some(config.id);
        query.direction = SortDirection::Desc;
        query.limit = Some(module.recent_results_number);
        self.repo.retrieve_primitives(&query).await
    }

    /// Duplicate-trigger detection, keyed by user and trigger kind.
    ///
    /// The follow-up pregnancy trigger is a deliberate special case: only
    /// a record submitted while pregnant counts as a duplicate.
    async fn existing_trigger_primitive(
        &self,
        module: &Module,
        primitive: &Primitive,
    ) -> Result<bool, StorageError> {
        let Some(kind) = module.trigger_kind else {
            return Ok(false);
        };
        let mut filter = BTreeMap::new();
        if kind == PrimitiveKind::FurtherPregnancyKeyActionTrigger {
            filter.insert(
                "current_group_category".to_string(),
                serde_json::Value::String("PREGNANT".to_string()),
            );
        }
        match self
            .repo
            .retrieve_primitive_by_name(primitive.user_id, kind, &filter)
            .await
        {
            Ok(_) => {
                warn!(
                    module_id = %module.module_id,
                    user_id = %primitive.user_id,
                    "duplicate trigger primitive detected"
                );
                Ok(true)
            }
            Err(StorageError::NotFound { .. }) => Ok(false),
            Err(error) => Err(error),
        }
    }

    async fn trigger_key_actions(
        &self,
        primitive: &Primitive,
        config: &ModuleConfig,
        actor: &Actor,
        deployment: &Deployment,
    ) -> Result<(), EngineError> {
        // notes and other manager submissions never schedule patient actions
        if actor.is_manager() {
            return Ok(());
        }

        let mut context = TriggerContext::default();
        if primitive.kind() == PrimitiveKind::FurtherPregnancyKeyActionTrigger {
            let group = match self
                .repo
                .retrieve_primitive_by_name(
                    primitive.user_id,
                    PrimitiveKind::GroupKeyActionTrigger,
                    &BTreeMap::new(),
                )
                .await
            {
                Ok(group) => group,
                Err(StorageError::NotFound { .. }) => {
                    return Err(EngineError::PrimitiveNotFound(
                        "group information primitive not found for this user".to_string(),
                    ));
                }
                Err(error) => return Err(error.into()),
            };
            if let PrimitiveValue::GroupKeyActionTrigger(value) = &group.value {
                context.start_date = value.first_treatment_date;
                context.group_category = Some(value.group_category);
            }
        }

        self.scheduler
            .schedule(
                primitive.user_id,
                &deployment.key_actions,
                primitive,
                config.config_body.as_ref(),
                deployment.id,
                &context,
            )
            .map_err(EngineError::InvalidRequest)
    }

    /// Historical results per declared kind, restricted to the
    /// deployment's configured instances of the module.
    pub async fn retrieve_module_results(
        &self,
        deployment: &Deployment,
        request: &ModuleResultsRequest,
    ) -> Result<BTreeMap<PrimitiveKind, Vec<Primitive>>, EngineError> {
        let module = get_module(&request.module_id)?;

        let configured_ids: HashSet<Uuid> = match request.module_config_id {
            Some(id) => {
                let config =
                    module.extract_module_config(&deployment.module_configs, None, Some(id))?;
                HashSet::from([config.id])
            }
            None => deployment
                .module_configs
                .iter()
                .filter(|mc| mc.module_id == module.module_id && mc.is_enabled())
                .map(|mc| mc.id)
                .collect(),
        };

        let mut results = BTreeMap::new();
        for kind in module.primitive_kinds {
            let mut query = PrimitiveQuery::new(*kind);
            query.user_id = Some(request.user_id);
            query.module_id = Some(request.module_id.clone());
            query.module_config_id = request.module_config_id;
            query.from_date_time = request.from_date_time;
            query.to_date_time = request.to_date_time;
            query.direction = request.direction;
            query.skip = request.skip;
            query.limit = request.limit;
            query.only_unseen = request.only_unseen;

            let records = self.repo.retrieve_primitives(&query).await?;
            let records = records
                .into_iter()
                .filter(|p| p.module_config_id.is_some_and(|id| configured_ids.contains(&id)))
                .collect();
            results.insert(*kind, records);
        }
        Ok(results)
    }

    /// Time-bucketed aggregation, rejected up front when the kind does not
    /// declare the requested function.
    pub async fn retrieve_aggregated_results(
        &self,
        query: &AggregationQuery,
    ) -> Result<Vec<AggregationBucket>, EngineError> {
        if !query.kind.allowed_aggregate_funcs().contains(&query.func) {
            return Err(EngineError::InvalidAggregation {
                kind: query.kind,
                func: query.func,
            });
        }
        Ok(self.repo.retrieve_aggregated_results(query).await?)
    }

    /// Badge rows for one user, dropping groups whose flags summed to zero.
    pub async fn retrieve_unseen_module_results(
        &self,
        deployment_id: Uuid,
        user_id: Uuid,
        hybrid_questionnaire_config_ids: &[Uuid],
        enabled_module_config_ids: &[Uuid],
    ) -> Result<UnseenModulesResponse, EngineError> {
        let rows = self
            .repo
            .retrieve_unseen_results(
                deployment_id,
                user_id,
                hybrid_questionnaire_config_ids,
                enabled_module_config_ids,
            )
            .await?;
        let flags = rows.into_iter().filter(|r| !r.flags.is_empty()).collect();
        let last_manager_note = self
            .repo
            .retrieve_first_unseen_result(deployment_id, user_id)
            .await?;
        Ok(UnseenModulesResponse {
            flags,
            last_manager_note,
        })
    }

    /// Recompute the profile-level badge total and hand it to the
    /// notifier.
    pub async fn update_unseen_flags(
        &self,
        user_id: Uuid,
        deployment: &Deployment,
    ) -> Result<Flags, EngineError> {
        let enabled_ids: Vec<Uuid> = deployment.module_configs.iter().map(|mc| mc.id).collect();
        let totals = self
            .repo
            .calculate_unseen_flags(user_id, &enabled_ids, BADGE_EXCLUDED_MODULE_IDS)
            .await?;
        self.notifier.unseen_flags_updated(user_id, &totals);
        Ok(totals)
    }

    /// Explicit flush of a user's unseen results up to a timestamp.
    pub async fn flush_unseen_results(
        &self,
        user_id: Uuid,
        before: Option<Timestamp>,
        module_id: Option<&str>,
    ) -> Result<u64, EngineError> {
        Ok(self
            .repo
            .flush_unseen_results(user_id, before, module_id)
            .await?)
    }

    /// Zero ledger flags invalidated by a threshold reconfiguration.
    pub async fn reset_flags(
        &self,
        user_id: Uuid,
        module_id: &str,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<u64, EngineError> {
        Ok(self.repo.reset_flags(user_id, module_id, start, end).await?)
    }

    /// Structural validation of a new or updated module config.
    pub fn validate_module_config(&self, config: &ModuleConfig) -> Result<(), EngineError> {
        let module = get_module(&config.module_id)?;
        module.validate_module_config(config)?;
        Ok(())
    }

    /// Full-erasure delegation.
    pub async fn delete_user_results(&self, user_id: Uuid) -> Result<u64, EngineError> {
        Ok(self.repo.delete_user_primitives(user_id).await?)
    }
}
