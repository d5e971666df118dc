use thiserror::Error;

use vitalink_core::models::aggregate::AggregateFunc;
use vitalink_core::models::primitive::PrimitiveKind;
use vitalink_modules::error::ModuleError;
use vitalink_storage::error::StorageError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("{func:?} aggregation is not supported for {kind}")]
    InvalidAggregation {
        kind: PrimitiveKind,
        func: AggregateFunc,
    },

    #[error("primitive not found: {0}")]
    PrimitiveNotFound(String),

    #[error(transparent)]
    Module(#[from] ModuleError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
