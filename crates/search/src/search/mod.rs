//! Criteria compilation and dispatch.
//!
//! - [`parser`] - textual values to typed scalars
//! - [`predicate`] - the backend-neutral predicate tree
//! - [`compiler`] - the operator contract, criteria to predicate
//! - [`registry`] - per-entity registration records
//! - [`service`] - the search entry points
//! - [`bootstrap`] - one-shot registration guard
//!
//! # Request Lifecycle
//!
//! ```text
//! SearchService::search::<T>(criteria)
//!    └── registry lookup (NotRegistered if absent)
//!    └── unset field types resolved from descriptors
//!    └── EntityRepository::find_by_criteria
//!            └── CriteriaCompiler::compile → Predicate
//!            └── backend lowering, execution, result mapping
//! ```

pub mod bootstrap;
pub mod compiler;
pub mod parser;
pub mod predicate;
pub mod registry;
pub mod service;

pub use bootstrap::RegistrationLatch;
pub use compiler::{CompiledCriteria, CompiledSort, CriteriaCompiler, DroppedFilter};
pub use parser::FieldTypeParser;
pub use predicate::{CompareOp, Predicate, TextMode};
pub use registry::{EntityRegistration, EntityRegistry, EntityType, RegistryUpdate};
pub use service::SearchService;
