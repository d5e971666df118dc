//! vitalink-storage
//!
//! The query contracts the processing engine consumes: the
//! [`ModuleResultRepository`] trait, the primitive/aggregation query
//! models, and an in-memory reference store. The physical store behind a
//! production deployment implements the same trait; nothing above this
//! crate sees its query language.

pub mod aggregate;
pub mod error;
pub mod memory;
pub mod repository;

pub use memory::InMemoryRepository;
pub use repository::{ModuleResultRepository, PrimitiveQuery, SortDirection};
