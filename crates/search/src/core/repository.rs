//! Repository adapter traits.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::search::{CompiledCriteria, CriteriaCompiler};
use crate::types::{FilterDescriptor, SearchCriteria, SearchResult};

/// The storage technology behind a repository adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Relational store (SQLite).
    Sqlite,
    /// Document store (MongoDB).
    MongoDb,
    /// Search index (Elasticsearch).
    Elasticsearch,
    /// In-process rows.
    Memory,
}

impl BackendKind {
    /// Returns the name used in logs and errors.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Sqlite => "sqlite",
            BackendKind::MongoDb => "mongodb",
            BackendKind::Elasticsearch => "elasticsearch",
            BackendKind::Memory => "memory",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The one operation a repository adapter exposes to the search service.
///
/// Implementations compile the criteria, execute the native query and map
/// the native page back into a [`SearchResult`].
#[async_trait]
pub trait EntityRepository<T>: Send + Sync {
    /// Runs a search and returns one page of results.
    async fn find_by_criteria(&self, criteria: &SearchCriteria) -> EngineResult<SearchResult<T>>;
}

/// Native rows of one page plus the total match count.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPage<R> {
    /// The rows of the requested page.
    pub rows: Vec<R>,
    /// Total matches ignoring paging.
    pub total: u64,
}

/// A backend that lowers compiled criteria into its own query language.
///
/// [`execute_search`] drives the three stages; repository adapters implement
/// [`EntityRepository`] by delegating to it.
#[async_trait]
pub trait BackendCompiler<T>: Send + Sync {
    /// The native query, including its page window.
    type Query: Send + Sync + fmt::Debug;
    /// The native row type.
    type Row: Send;

    /// Returns the backend kind.
    fn kind(&self) -> BackendKind;

    /// Returns the descriptors of the entity served by this backend.
    fn descriptors(&self) -> &[FilterDescriptor];

    /// Lowers compiled criteria into a native query.
    fn lower(&self, compiled: &CompiledCriteria) -> EngineResult<Self::Query>;

    /// Executes the native query.
    async fn execute(&self, query: &Self::Query) -> EngineResult<RawPage<Self::Row>>;

    /// Maps native rows into entities.
    fn map_row(&self, row: Self::Row) -> EngineResult<T>;

    /// Compiles criteria into a native query.
    fn compile(&self, criteria: &SearchCriteria) -> EngineResult<Self::Query> {
        let compiled = CriteriaCompiler::new(self.descriptors()).compile(criteria)?;
        self.lower(&compiled)
    }

    /// Maps a native page into a [`SearchResult`].
    fn map_result(
        &self,
        page: RawPage<Self::Row>,
        criteria: &SearchCriteria,
    ) -> EngineResult<SearchResult<T>> {
        let content = page
            .rows
            .into_iter()
            .map(|row| self.map_row(row))
            .collect::<EngineResult<Vec<_>>>()?;
        Ok(SearchResult::from_page(
            content,
            criteria.page(),
            page.total,
            criteria.sorts().to_vec(),
        ))
    }
}

/// Compiles, executes and maps one search through a backend.
pub async fn execute_search<T, B>(
    backend: &B,
    criteria: &SearchCriteria,
) -> EngineResult<SearchResult<T>>
where
    B: BackendCompiler<T> + ?Sized,
{
    let query = backend.compile(criteria)?;
    tracing::debug!(backend = %backend.kind(), query = ?query, "Executing search");
    let page = backend.execute(&query).await?;
    backend.map_result(page, criteria)
}
