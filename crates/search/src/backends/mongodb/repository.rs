//! MongoDB repository adapter.

use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use bson::Document;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::{BackendCompiler, BackendKind, EntityRepository, RawPage, execute_search};
use crate::error::{BackendError, EngineResult};
use crate::metadata::{FilterMetadataExtractor, SearchableEntity};
use crate::search::CompiledCriteria;
use crate::types::{FilterDescriptor, SearchCriteria, SearchResult};

use super::query_builder::{MongoQuery, MongoQueryBuilder};

pub(crate) const BACKEND_NAME: &str = "mongodb";

/// Connection settings for a MongoDB collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConfig {
    /// Connection string.
    #[serde(default = "default_uri")]
    pub uri: String,

    /// Database name.
    pub database: String,

    /// Collection name.
    pub collection: String,
}

fn default_uri() -> String {
    "mongodb://localhost:27017".to_string()
}

impl MongoConfig {
    /// Creates a configuration for the default local server.
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            uri: default_uri(),
            database: database.into(),
            collection: collection.into(),
        }
    }
}

/// The two collection operations a search needs.
///
/// Implemented for `mongodb::Collection<Document>` with the `mongodb`
/// feature; tests substitute an in-process fake.
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    /// Returns the documents of one page.
    async fn find(&self, query: &MongoQuery) -> EngineResult<Vec<Document>>;

    /// Counts the documents matching a filter.
    async fn count(&self, filter: &Document) -> EngineResult<u64>;
}

/// Searches one MongoDB collection.
pub struct MongoRepository<T> {
    collection: Arc<dyn DocumentCollection>,
    builder: MongoQueryBuilder,
    descriptors: Vec<FilterDescriptor>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Debug for MongoRepository<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoRepository")
            .field("filters", &self.descriptors.len())
            .finish_non_exhaustive()
    }
}

impl<T> MongoRepository<T>
where
    T: SearchableEntity + DeserializeOwned,
{
    /// Creates an adapter over a collection.
    pub fn new(collection: Arc<dyn DocumentCollection>) -> EngineResult<Self> {
        Ok(Self {
            collection,
            builder: MongoQueryBuilder::new(),
            descriptors: FilterMetadataExtractor::extract::<T>()?,
            _entity: PhantomData,
        })
    }

    /// Connects to the configured collection.
    #[cfg(feature = "mongodb")]
    pub async fn connect(config: &MongoConfig) -> EngineResult<Self> {
        let client = mongodb::Client::with_uri_str(&config.uri)
            .await
            .map_err(|e| BackendError::ConnectionFailed {
                backend_name: BACKEND_NAME.to_string(),
                message: e.to_string(),
            })?;
        let collection = client
            .database(&config.database)
            .collection::<Document>(&config.collection);

        tracing::info!(
            database = %config.database,
            collection = %config.collection,
            "Connected to MongoDB collection"
        );
        Self::new(Arc::new(collection))
    }
}

#[async_trait]
impl<T> BackendCompiler<T> for MongoRepository<T>
where
    T: SearchableEntity + DeserializeOwned,
{
    type Query = MongoQuery;
    type Row = Document;

    fn kind(&self) -> BackendKind {
        BackendKind::MongoDb
    }

    fn descriptors(&self) -> &[FilterDescriptor] {
        &self.descriptors
    }

    fn lower(&self, compiled: &CompiledCriteria) -> EngineResult<MongoQuery> {
        Ok(self.builder.build(compiled))
    }

    async fn execute(&self, query: &MongoQuery) -> EngineResult<RawPage<Document>> {
        let total = self.collection.count(&query.filter).await?;
        let rows = self.collection.find(query).await?;
        Ok(RawPage { rows, total })
    }

    fn map_row(&self, row: Document) -> EngineResult<T> {
        bson::from_document(row)
            .map_err(|e| BackendError::mapping(BACKEND_NAME, e.to_string()).into())
    }
}

#[async_trait]
impl<T> EntityRepository<T> for MongoRepository<T>
where
    T: SearchableEntity + DeserializeOwned,
{
    async fn find_by_criteria(&self, criteria: &SearchCriteria) -> EngineResult<SearchResult<T>> {
        execute_search(self, criteria).await
    }
}

#[cfg(feature = "mongodb")]
#[async_trait]
impl DocumentCollection for mongodb::Collection<Document> {
    async fn find(&self, query: &MongoQuery) -> EngineResult<Vec<Document>> {
        use futures::stream::TryStreamExt;

        let cursor = mongodb::Collection::find(self, query.filter.clone())
            .sort(query.sort.clone())
            .skip(query.skip)
            .limit(query.limit)
            .await
            .map_err(|e| BackendError::query(BACKEND_NAME, e.to_string()))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| BackendError::query(BACKEND_NAME, e.to_string()).into())
    }

    async fn count(&self, filter: &Document) -> EngineResult<u64> {
        self.count_documents(filter.clone())
            .await
            .map_err(|e| BackendError::query(BACKEND_NAME, e.to_string()).into())
    }
}
