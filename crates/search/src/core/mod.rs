//! Core repository abstractions.
//!
//! - [`EntityRepository`] - the single-method adapter the search service calls
//! - [`BackendCompiler`] - compile / execute / map stages shared by all backends
//!
//! ```text
//! SearchCriteria
//!     └── CriteriaCompiler      (operator contract, backend-neutral Predicate)
//!             └── BackendCompiler::lower    (SQL, BSON, Query DSL, ...)
//!                     └── BackendCompiler::execute
//!                             └── BackendCompiler::map_result → SearchResult<T>
//! ```

mod repository;

pub use repository::{BackendCompiler, BackendKind, EntityRepository, RawPage, execute_search};
