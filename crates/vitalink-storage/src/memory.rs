//! In-memory reference implementation of the repository contract.

use std::collections::{BTreeMap, HashSet};

use jiff::Timestamp;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use vitalink_core::models::aggregate::AggregationBucket;
use vitalink_core::models::flags::Flags;
use vitalink_core::models::ledger::{
    UnseenLedgerEntry, UnseenModuleFlags, BADGE_EXCLUDED_MODULE_IDS,
};
use vitalink_core::models::primitive::{Primitive, PrimitiveKind};

use crate::aggregate::{self, AggregationQuery};
use crate::error::StorageError;
use crate::repository::{ModuleResultRepository, PrimitiveQuery, SortDirection};

#[derive(Default)]
struct Store {
    primitives: BTreeMap<PrimitiveKind, Vec<Primitive>>,
    ledger: Vec<UnseenLedgerEntry>,
}

/// Reference store backing the engine's tests: every record lives in one
/// process-local map behind an async lock.
#[derive(Default)]
pub struct InMemoryRepository {
    inner: RwLock<Store>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModuleResultRepository for InMemoryRepository {
    async fn create_primitive(
        &self,
        primitive: &mut Primitive,
        save_unseen: bool,
    ) -> Result<Uuid, StorageError> {
        let now = Timestamp::now();
        primitive.create_date_time = Some(now);
        if primitive.start_date_time.is_none() {
            primitive.start_date_time = Some(now);
        }
        if primitive.submitter_id.is_none() {
            primitive.submitter_id = Some(primitive.user_id);
        }
        let id = Uuid::new_v4();
        primitive.id = Some(id);

        let mut store = self.inner.write().await;
        store
            .primitives
            .entry(primitive.kind())
            .or_default()
            .push(primitive.clone());

        if save_unseen {
            store.ledger.push(UnseenLedgerEntry {
                id,
                user_id: primitive.user_id,
                deployment_id: primitive.deployment_id,
                module_id: primitive.module_id.clone(),
                module_config_id: primitive.module_config_id,
                primitive_kind: primitive.kind(),
                flags: primitive.flags.unwrap_or_default(),
                // set above when absent
                start_date_time: primitive.start_date_time.unwrap_or(now),
            });
        }
        debug!(kind = %primitive.kind(), %id, save_unseen, "created primitive");
        Ok(id)
    }

    async fn retrieve_primitives(
        &self,
        query: &PrimitiveQuery,
    ) -> Result<Vec<Primitive>, StorageError> {
        let store = self.inner.read().await;
        let unseen_ids: HashSet<Uuid> = if query.only_unseen {
            store.ledger.iter().map(|e| e.id).collect()
        } else {
            HashSet::new()
        };

        let mut results: Vec<Primitive> = store
            .primitives
            .get(&query.kind)
            .into_iter()
            .flatten()
            .filter(|p| query.user_id.is_none_or(|u| p.user_id == u))
            .filter(|p| {
                query
                    .module_id
                    .as_deref()
                    .is_none_or(|m| p.module_id == m)
            })
            .filter(|p| {
                query
                    .module_config_id
                    .is_none_or(|mc| p.module_config_id == Some(mc))
            })
            .filter(|p| {
                p.module_config_id.is_none_or(|mc| {
                    !query.exclude_module_config_ids.contains(&mc)
                })
            })
            .filter(|p| {
                query
                    .from_date_time
                    .is_none_or(|from| p.start_date_time.is_some_and(|s| s >= from))
            })
            .filter(|p| {
                query
                    .to_date_time
                    .is_none_or(|to| p.start_date_time.is_some_and(|s| s < to))
            })
            .filter(|p| !query.only_unseen || p.id.is_some_and(|id| unseen_ids.contains(&id)))
            .cloned()
            .collect();

        results.sort_by_key(|p| p.start_date_time);
        if query.direction == SortDirection::Desc {
            results.reverse();
        }

        let skip = query.skip.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(results.into_iter().skip(skip).take(limit).collect())
    }

    async fn retrieve_primitive(
        &self,
        user_id: Uuid,
        kind: PrimitiveKind,
        id: Uuid,
    ) -> Result<Primitive, StorageError> {
        let store = self.inner.read().await;
        store
            .primitives
            .get(&kind)
            .into_iter()
            .flatten()
            .find(|p| p.user_id == user_id && p.id == Some(id))
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                kind: kind.to_string(),
            })
    }

    async fn retrieve_primitive_by_name(
        &self,
        user_id: Uuid,
        kind: PrimitiveKind,
        filter: &BTreeMap<String, serde_json::Value>,
    ) -> Result<Primitive, StorageError> {
        let store = self.inner.read().await;
        for primitive in store.primitives.get(&kind).into_iter().flatten() {
            if primitive.user_id != user_id {
                continue;
            }
            let serialized = serde_json::to_value(primitive)?;
            let matches = filter
                .iter()
                .all(|(key, expected)| serialized.get(key) == Some(expected));
            if matches {
                return Ok(primitive.clone());
            }
        }
        Err(StorageError::NotFound {
            kind: kind.to_string(),
        })
    }

    async fn delete_user_primitives(&self, user_id: Uuid) -> Result<u64, StorageError> {
        let mut store = self.inner.write().await;
        let mut deleted = 0;
        for records in store.primitives.values_mut() {
            let before = records.len();
            records.retain(|p| p.user_id != user_id);
            deleted += (before - records.len()) as u64;
        }
        store.ledger.retain(|e| e.user_id != user_id);
        info!(user_id = %user_id, deleted, "deleted user primitives");
        Ok(deleted)
    }

    async fn flush_unseen_results(
        &self,
        user_id: Uuid,
        before: Option<Timestamp>,
        module_id: Option<&str>,
    ) -> Result<u64, StorageError> {
        let cut = before.unwrap_or_else(Timestamp::now);
        let mut store = self.inner.write().await;
        let len_before = store.ledger.len();
        store.ledger.retain(|e| {
            !(e.user_id == user_id
                && e.start_date_time < cut
                && module_id.is_none_or(|m| e.module_id == m))
        });
        let deleted = (len_before - store.ledger.len()) as u64;
        info!(user_id = %user_id, deleted, "flushed unseen results");
        Ok(deleted)
    }

    async fn reset_flags(
        &self,
        user_id: Uuid,
        module_id: &str,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<u64, StorageError> {
        let mut store = self.inner.write().await;
        let mut reset = 0;
        for entry in store.ledger.iter_mut() {
            if entry.user_id == user_id
                && entry.module_id == module_id
                && entry.start_date_time >= start
                && entry.start_date_time < end
            {
                entry.flags = Flags::default();
                reset += 1;
            }
        }
        Ok(reset)
    }

    async fn retrieve_unseen_results(
        &self,
        deployment_id: Uuid,
        user_id: Uuid,
        hybrid_questionnaire_config_ids: &[Uuid],
        enabled_module_config_ids: &[Uuid],
    ) -> Result<Vec<UnseenModuleFlags>, StorageError> {
        let store = self.inner.read().await;
        let mut groups: BTreeMap<(String, Option<Uuid>), Flags> = BTreeMap::new();
        for entry in &store.ledger {
            if entry.user_id != user_id || entry.deployment_id != deployment_id {
                continue;
            }
            let Some(config_id) = entry.module_config_id else {
                continue;
            };
            if !enabled_module_config_ids.contains(&config_id) {
                continue;
            }
            if BADGE_EXCLUDED_MODULE_IDS.contains(&entry.module_id.as_str()) {
                continue;
            }
            // questionnaires without their own badge slot collapse into
            // the module-level group
            let effective = if entry.module_id == "Questionnaire"
                && !hybrid_questionnaire_config_ids.contains(&config_id)
            {
                None
            } else {
                Some(config_id)
            };
            groups
                .entry((entry.module_id.clone(), effective))
                .or_default()
                .add(&entry.flags);
        }

        let mut rows: Vec<UnseenModuleFlags> = groups
            .into_iter()
            .map(|((module_id, module_config_id), flags)| UnseenModuleFlags {
                module_id,
                module_config_id,
                flags,
            })
            .collect();
        rows.sort_by(|a, b| {
            (b.flags.red, b.flags.amber, b.flags.gray)
                .cmp(&(a.flags.red, a.flags.amber, a.flags.gray))
        });
        Ok(rows)
    }

    async fn calculate_unseen_flags(
        &self,
        user_id: Uuid,
        enabled_module_config_ids: &[Uuid],
        excluded_module_ids: &[&str],
    ) -> Result<Flags, StorageError> {
        let store = self.inner.read().await;
        let mut total = Flags::default();
        for entry in &store.ledger {
            if entry.user_id != user_id {
                continue;
            }
            let Some(config_id) = entry.module_config_id else {
                continue;
            };
            if !enabled_module_config_ids.contains(&config_id) {
                continue;
            }
            if excluded_module_ids.contains(&entry.module_id.as_str()) {
                continue;
            }
            total.add(&entry.flags);
        }
        Ok(total)
    }

    async fn retrieve_first_unseen_result(
        &self,
        deployment_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Timestamp>, StorageError> {
        let store = self.inner.read().await;
        Ok(store
            .ledger
            .iter()
            .filter(|e| e.user_id == user_id && e.deployment_id == deployment_id)
            .map(|e| e.start_date_time)
            .min())
    }

    async fn retrieve_aggregated_results(
        &self,
        query: &AggregationQuery,
    ) -> Result<Vec<AggregationBucket>, StorageError> {
        let store = self.inner.read().await;
        let mut candidates: Vec<Primitive> = store
            .primitives
            .get(&query.kind)
            .into_iter()
            .flatten()
            .filter(|p| query.user_id.is_none_or(|u| p.user_id == u))
            .filter(|p| {
                query
                    .module_config_id
                    .is_none_or(|mc| p.module_config_id == Some(mc))
            })
            .filter(|p| {
                query
                    .start_date
                    .is_none_or(|from| p.start_date_time.is_some_and(|s| s >= from))
            })
            .filter(|p| {
                query
                    .end_date
                    .is_none_or(|to| p.start_date_time.is_some_and(|s| s < to))
            })
            .cloned()
            .collect();

        // most-recent-first before bucketing
        candidates.sort_by_key(|p| p.start_date_time);
        candidates.reverse();

        Ok(aggregate::aggregate(&candidates, query))
    }
}
