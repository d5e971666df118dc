use std::collections::BTreeMap;

use jiff::Timestamp;
use uuid::Uuid;

use vitalink_core::models::aggregate::AggregationBucket;
use vitalink_core::models::flags::Flags;
use vitalink_core::models::ledger::UnseenModuleFlags;
use vitalink_core::models::primitive::{Primitive, PrimitiveKind};

use crate::aggregate::AggregationQuery;
use crate::error::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Filter/sort/pagination over one primitive kind's records.
#[derive(Debug, Clone)]
pub struct PrimitiveQuery {
    pub kind: PrimitiveKind,
    pub user_id: Option<Uuid>,
    pub module_id: Option<String>,
    pub module_config_id: Option<Uuid>,
    pub exclude_module_config_ids: Vec<Uuid>,
    pub from_date_time: Option<Timestamp>,
    pub to_date_time: Option<Timestamp>,
    pub direction: SortDirection,
    pub skip: Option<usize>,
    pub limit: Option<usize>,
    /// Restrict to primitives that still have an unseen-ledger entry.
    pub only_unseen: bool,
}

impl PrimitiveQuery {
    pub fn new(kind: PrimitiveKind) -> Self {
        Self {
            kind,
            user_id: None,
            module_id: None,
            module_config_id: None,
            exclude_module_config_ids: Vec::new(),
            from_date_time: None,
            to_date_time: None,
            direction: SortDirection::Desc,
            skip: None,
            limit: None,
            only_unseen: false,
        }
    }
}

/// Query contract between the processing engine and the primitive store.
///
/// `create_primitive` may also write the unseen-ledger companion record;
/// the two writes are not transactional. The ledger is a best-effort
/// cache: a primitive's existence is only ever proven by the primary
/// records, and the ledger can be rebuilt from them.
#[allow(async_fn_in_trait)]
pub trait ModuleResultRepository {
    /// Persist one primitive, stamping `create_date_time`, the
    /// `start_date_time` default and the `submitter_id` default, and
    /// assigning its id. When `save_unseen` is set, an unseen-ledger entry
    /// is written alongside.
    async fn create_primitive(
        &self,
        primitive: &mut Primitive,
        save_unseen: bool,
    ) -> Result<Uuid, StorageError>;

    async fn retrieve_primitives(
        &self,
        query: &PrimitiveQuery,
    ) -> Result<Vec<Primitive>, StorageError>;

    async fn retrieve_primitive(
        &self,
        user_id: Uuid,
        kind: PrimitiveKind,
        id: Uuid,
    ) -> Result<Primitive, StorageError>;

    /// First primitive of the kind matching every top-level field in
    /// `filter`, compared against the record's serialized form. Used for
    /// duplicate-trigger detection.
    async fn retrieve_primitive_by_name(
        &self,
        user_id: Uuid,
        kind: PrimitiveKind,
        filter: &BTreeMap<String, serde_json::Value>,
    ) -> Result<Primitive, StorageError>;

    /// Full-erasure path: drop every primitive of every kind for the user.
    async fn delete_user_primitives(&self, user_id: Uuid) -> Result<u64, StorageError>;

    /// Bulk-delete ledger entries with `start_date_time` before the cut
    /// (now when absent), optionally limited to one module.
    async fn flush_unseen_results(
        &self,
        user_id: Uuid,
        before: Option<Timestamp>,
        module_id: Option<&str>,
    ) -> Result<u64, StorageError>;

    /// Zero the flags of ledger entries in `[start, end)` after a
    /// threshold reconfiguration invalidated them.
    async fn reset_flags(
        &self,
        user_id: Uuid,
        module_id: &str,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<u64, StorageError>;

    /// Grouped badge rows, summed per `(module_id, effective config id)`
    /// and sorted descending by (red, amber, gray). Questionnaire entries
    /// whose config is not in `hybrid_questionnaire_config_ids` collapse
    /// into the module-level group.
    async fn retrieve_unseen_results(
        &self,
        deployment_id: Uuid,
        user_id: Uuid,
        hybrid_questionnaire_config_ids: &[Uuid],
        enabled_module_config_ids: &[Uuid],
    ) -> Result<Vec<UnseenModuleFlags>, StorageError>;

    /// Single flag total across all enabled configs for the user.
    async fn calculate_unseen_flags(
        &self,
        user_id: Uuid,
        enabled_module_config_ids: &[Uuid],
        excluded_module_ids: &[&str],
    ) -> Result<Flags, StorageError>;

    /// Earliest unseen `start_date_time`, the "last manager note" marker.
    async fn retrieve_first_unseen_result(
        &self,
        deployment_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Timestamp>, StorageError>;

    async fn retrieve_aggregated_results(
        &self,
        query: &AggregationQuery,
    ) -> Result<Vec<AggregationBucket>, StorageError>;
}
