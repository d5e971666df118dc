//! vitalink-core
//!
//! Pure domain types for module results: primitives, module configs,
//! RAG thresholds, flags, and the unseen-ledger/aggregation read models.
//! No I/O dependency — this is the shared vocabulary of the vitalink system.

pub mod error;
pub mod models;
