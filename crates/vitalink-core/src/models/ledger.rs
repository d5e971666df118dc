use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::flags::Flags;
use super::primitive::PrimitiveKind;

/// Module ids never counted toward unseen badges: derived risk scores and
/// high-frequency sensor streams would otherwise swamp the counts.
pub const BADGE_EXCLUDED_MODULE_IDS: &[&str] = &["RiskScore", "HighFrequencyStep"];

/// Shadow record of one flagged primitive, used to compute unseen badge
/// counts without re-scanning primary data.
///
/// Shares its `id` with the primitive it mirrors. Written best-effort
/// alongside the primary record; the ledger is a cache, never the source
/// of truth for a primitive's existence.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UnseenLedgerEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub deployment_id: Uuid,
    pub module_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_config_id: Option<Uuid>,
    pub primitive_kind: PrimitiveKind,
    pub flags: Flags,
    pub start_date_time: Timestamp,
}

/// One grouped row of the unseen-results badge query.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UnseenModuleFlags {
    pub module_id: String,
    /// None when questionnaire entries collapse into the module-level
    /// group instead of their own config instance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_config_id: Option<Uuid>,
    pub flags: Flags,
}
