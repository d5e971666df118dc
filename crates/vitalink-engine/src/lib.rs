//! vitalink-engine
//!
//! The module-result ingestion pipeline: parse, resolve, derive, score,
//! flag, persist, ledger upkeep and notification — with per-item failure
//! isolation. Collaborators (event notifier, key-action scheduler, answer
//! translator) are explicit interfaces passed to the service constructor.

pub mod error;
pub mod events;
pub mod key_actions;
pub mod service;
pub mod translation;

pub use service::{ModuleResultService, SubmitOutcome, SubmitRequest};
