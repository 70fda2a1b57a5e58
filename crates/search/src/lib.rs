//! Dynamic Search Engine
//!
//! This crate turns a single, storage-independent search request into queries
//! against relational, document and search-index stores. Entity types declare
//! their searchable fields once; clients discover the available filters and
//! submit criteria (filters, sorts, full-text, paging) which are compiled into
//! the native query language of the store the entity is registered with.
//!
//! # Backend Features
//!
//! - `sqlite` (default) - pooled SQLite adapter
//! - `mongodb` - MongoDB driver for the document adapter
//! - `elasticsearch` - Elasticsearch client for the search-index adapter
//!
//! The query builders of every backend and the in-memory adapter are always
//! available.
//!
//! # Architecture
//!
//! - [`types`] - criteria, descriptors, results and typed values
//! - [`metadata`] - entity schemas and filter descriptor extraction
//! - [`search`] - parser, predicate compiler, registry and the [`SearchService`]
//! - [`core`] - repository adapter traits
//! - [`backends`] - per-store lowering and adapters
//! - [`error`] - error types for all operations
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use dynamic_search::backends::memory::MemoryRepository;
//! use dynamic_search::metadata::{EntitySchema, SearchableEntity};
//! use dynamic_search::types::{FilterCriteria, FilterOperator, SearchCriteria, SortCriteria};
//! use dynamic_search::SearchService;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct OperatingSystem {
//!     name: String,
//!     usages: i32,
//! }
//!
//! impl SearchableEntity for OperatingSystem {
//!     fn schema() -> EntitySchema {
//!         EntitySchema::new("OperatingSystem")
//!             .field::<String>("name")
//!             .field::<i32>("usages")
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let repository = MemoryRepository::with_rows([
//!     OperatingSystem { name: "Ubuntu".into(), usages: 120 },
//!     OperatingSystem { name: "Debian".into(), usages: 80 },
//!     OperatingSystem { name: "Windows".into(), usages: 300 },
//! ])?;
//!
//! let service = SearchService::new();
//! service.register_entity::<OperatingSystem>(Arc::new(repository))?;
//! assert_eq!(service.available_filters::<OperatingSystem>().len(), 2);
//!
//! let criteria = SearchCriteria::default()
//!     .with_filter(FilterCriteria::with_value("usages", FilterOperator::LessThan, "200"))
//!     .with_sort(SortCriteria::asc("name"));
//! let page = service.search::<OperatingSystem>(&criteria).await?;
//!
//! let names: Vec<_> = page.content.iter().map(|os| os.name.as_str()).collect();
//! assert_eq!(names, ["Debian", "Ubuntu"]);
//! assert_eq!(page.total_elements, 2);
//! # Ok::<(), dynamic_search::EngineError>(())
//! # }).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod core;
pub mod error;
pub mod metadata;
pub mod search;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{BackendError, EngineError, EngineResult, ParseError, ValidationError};
pub use metadata::{EntitySchema, SearchableEntity};
pub use types::{
    FieldType, FilterCriteria, FilterDescriptor, FilterOperator, SearchCriteria, SearchResult,
};

// Re-export core traits
pub use core::{BackendCompiler, BackendKind, EntityRepository};

pub use search::{RegistrationLatch, SearchService};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
