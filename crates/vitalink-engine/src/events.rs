use std::collections::BTreeMap;

use jiff::Timestamp;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use vitalink_core::models::flags::Flags;
use vitalink_core::models::primitive::{Primitive, PrimitiveKind};

/// Event emitted once per successfully persisted submission batch,
/// carrying one representative primitive per derived kind — the first of
/// each kind that reached the store — plus the batch's identity fields.
#[derive(Debug, Clone, Serialize)]
pub struct PrimitivesCreatedEvent {
    pub primitives: BTreeMap<PrimitiveKind, Primitive>,
    pub user_id: Uuid,
    pub module_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_config_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_result_id: Option<Uuid>,
    pub deployment_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date_time: Option<Timestamp>,
}

impl PrimitivesCreatedEvent {
    /// Build from the persisted primitives, in persist order. Returns None
    /// for an empty batch.
    pub fn from_batch(persisted: &[Primitive]) -> Option<Self> {
        let reference = persisted.first()?;
        let mut primitives = BTreeMap::new();
        for primitive in persisted {
            primitives
                .entry(primitive.kind())
                .or_insert_with(|| primitive.clone());
        }
        Some(Self {
            user_id: reference.user_id,
            module_id: reference.module_id.clone(),
            module_config_id: reference.module_config_id,
            module_result_id: reference.module_result_id,
            deployment_id: reference.deployment_id,
            device_name: reference.device_name.clone(),
            start_date_time: reference.start_date_time,
            primitives,
        })
    }

    /// Emit this event via tracing.
    pub fn emit(&self) {
        info!(
            event.user_id = %self.user_id,
            event.module_id = %self.module_id,
            event.primitive_count = self.primitives.len(),
            "module result batch created"
        );
    }
}

/// Observer of pipeline side effects. `pre_create` may veto a primitive's
/// persistence; everything else is notify-only and must not fail.
pub trait Notifier: Send + Sync {
    fn pre_create(&self, _primitive: &Primitive) -> Result<(), String> {
        Ok(())
    }

    fn post_create(&self, _primitive: &Primitive) {}

    fn primitives_created(&self, _event: &PrimitivesCreatedEvent) {}

    /// Downstream user-stats recalculation request.
    fn stats_update_requested(&self, _user_id: Uuid) {}

    /// Refreshed profile-level badge total.
    fn unseen_flags_updated(&self, _user_id: Uuid, _flags: &Flags) {}
}

/// Notifier that reacts to nothing.
pub struct NullNotifier;

impl Notifier for NullNotifier {}
