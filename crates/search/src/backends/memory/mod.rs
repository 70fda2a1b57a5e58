//! In-memory backend.
//!
//! Rows are kept in their serde JSON form and the [`Predicate`] tree is
//! evaluated directly with SQL three-valued logic: any test against a null
//! or missing field is unknown, and only rows whose predicate is definitely
//! true are returned. Useful for tests and as the reference semantics the
//! other backends are checked against.
//!
//! # Example
//!
//! ```
//! use dynamic_search::backends::memory::MemoryRepository;
//! use dynamic_search::core::EntityRepository;
//! use dynamic_search::metadata::{EntitySchema, SearchableEntity};
//! use dynamic_search::types::{FilterCriteria, FilterOperator, SearchCriteria};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Clone, Serialize, Deserialize)]
//! struct City {
//!     name: String,
//!     population: u32,
//! }
//!
//! impl SearchableEntity for City {
//!     fn schema() -> EntitySchema {
//!         EntitySchema::new("City")
//!             .field::<String>("name")
//!             .field::<u32>("population")
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let repo = MemoryRepository::with_rows([
//!     City { name: "Lyon".into(), population: 522_000 },
//!     City { name: "Paris".into(), population: 2_100_000 },
//! ])?;
//!
//! let criteria = SearchCriteria::default()
//!     .with_filter(FilterCriteria::with_value("population", FilterOperator::GreaterThan, "1000000"));
//! let result = repo.find_by_criteria(&criteria).await?;
//! assert_eq!(result.content.len(), 1);
//! assert_eq!(result.content[0].name, "Paris");
//! # Ok::<(), dynamic_search::EngineError>(())
//! # }).unwrap();
//! ```

mod evaluator;

use std::marker::PhantomData;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::{BackendCompiler, BackendKind, EntityRepository, RawPage, execute_search};
use crate::error::{BackendError, EngineResult};
use crate::metadata::{FilterMetadataExtractor, SearchableEntity};
use crate::search::{CompiledCriteria, CompiledSort, Predicate};
use crate::types::{FilterDescriptor, PageCriteria, SearchCriteria, SearchResult};

pub use evaluator::{compare_json, evaluate, matches};

const BACKEND_NAME: &str = "memory";

/// A compiled in-memory query.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryQuery {
    /// Row filter; `None` keeps every row.
    pub predicate: Option<Predicate>,
    /// Sort keys in order.
    pub sorts: Vec<CompiledSort>,
    /// Page window.
    pub page: PageCriteria,
}

/// Repository over rows held in process memory.
pub struct MemoryRepository<T> {
    descriptors: Vec<FilterDescriptor>,
    rows: RwLock<Vec<Value>>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> MemoryRepository<T>
where
    T: SearchableEntity + Serialize + DeserializeOwned,
{
    /// Creates an empty repository for `T`.
    pub fn new() -> EngineResult<Self> {
        Ok(Self {
            descriptors: FilterMetadataExtractor::extract::<T>()?,
            rows: RwLock::new(Vec::new()),
            _entity: PhantomData,
        })
    }

    /// Creates a repository holding the given rows.
    pub fn with_rows(rows: impl IntoIterator<Item = T>) -> EngineResult<Self> {
        let repo = Self::new()?;
        for row in rows {
            repo.insert(&row)?;
        }
        Ok(repo)
    }

    /// Appends a row.
    pub fn insert(&self, row: &T) -> EngineResult<()> {
        let value = serde_json::to_value(row)
            .map_err(|e| BackendError::mapping(BACKEND_NAME, e.to_string()))?;
        self.rows.write().push(value);
        Ok(())
    }

    /// Returns the number of stored rows.
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// Returns true if no rows are stored.
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

#[async_trait]
impl<T> BackendCompiler<T> for MemoryRepository<T>
where
    T: SearchableEntity + Serialize + DeserializeOwned,
{
    type Query = MemoryQuery;
    type Row = Value;

    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    fn descriptors(&self) -> &[FilterDescriptor] {
        &self.descriptors
    }

    fn lower(&self, compiled: &CompiledCriteria) -> EngineResult<MemoryQuery> {
        Ok(MemoryQuery {
            predicate: compiled.predicate.clone(),
            sorts: compiled.sorts.clone(),
            page: compiled.page,
        })
    }

    async fn execute(&self, query: &MemoryQuery) -> EngineResult<RawPage<Value>> {
        let mut matched: Vec<Value> = {
            let rows = self.rows.read();
            rows.iter()
                .filter(|row| {
                    query
                        .predicate
                        .as_ref()
                        .is_none_or(|predicate| matches(predicate, row))
                })
                .cloned()
                .collect()
        };

        if !query.sorts.is_empty() {
            matched.sort_by(|a, b| {
                query
                    .sorts
                    .iter()
                    .map(|sort| {
                        let ordering = compare_json(a.get(&sort.key), b.get(&sort.key));
                        match sort.direction {
                            crate::types::SortDirection::Asc => ordering,
                            crate::types::SortDirection::Desc => ordering.reverse(),
                        }
                    })
                    .find(|ordering| ordering.is_ne())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }

        let total = matched.len() as u64;
        let offset = usize::try_from(query.page.offset()).unwrap_or(usize::MAX);
        let rows = matched
            .into_iter()
            .skip(offset)
            .take(query.page.size as usize)
            .collect();

        Ok(RawPage { rows, total })
    }

    fn map_row(&self, row: Value) -> EngineResult<T> {
        serde_json::from_value(row)
            .map_err(|e| BackendError::mapping(BACKEND_NAME, e.to_string()).into())
    }
}

#[async_trait]
impl<T> EntityRepository<T> for MemoryRepository<T>
where
    T: SearchableEntity + Serialize + DeserializeOwned,
{
    async fn find_by_criteria(&self, criteria: &SearchCriteria) -> EngineResult<SearchResult<T>> {
        execute_search(self, criteria).await
    }
}
