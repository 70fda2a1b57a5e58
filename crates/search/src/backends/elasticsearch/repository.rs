//! Elasticsearch repository adapter.

use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{BackendCompiler, BackendKind, EntityRepository, RawPage, execute_search};
use crate::error::{BackendError, EngineResult};
use crate::metadata::{FilterMetadataExtractor, SearchableEntity};
use crate::search::CompiledCriteria;
use crate::types::{FilterDescriptor, SearchCriteria, SearchResult};

use super::query_builder::{EsQuery, EsQueryBuilder};

const BACKEND_NAME: &str = "elasticsearch";

/// Authentication configuration for Elasticsearch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ElasticsearchAuth {
    /// Basic username/password authentication.
    Basic {
        /// The username for basic auth.
        username: String,
        /// The password for basic auth.
        password: String,
    },
    /// Bearer token authentication.
    Bearer {
        /// The bearer token.
        token: String,
    },
}

/// Configuration for the Elasticsearch adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    /// Node URLs; the first one is used.
    #[serde(default = "default_nodes")]
    pub nodes: Vec<String>,

    /// Index to search.
    pub index: String,

    /// Request timeout in milliseconds (default: 30000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Optional authentication.
    #[serde(default)]
    pub auth: Option<ElasticsearchAuth>,

    /// Suffix of the keyword sub-field of text fields (default: `.keyword`).
    #[serde(default = "default_keyword_suffix")]
    pub keyword_suffix: String,

    /// Whether to request exact totals (default: true).
    #[serde(default = "default_true")]
    pub track_total_hits: bool,
}

fn default_nodes() -> Vec<String> {
    vec!["http://localhost:9200".to_string()]
}

fn default_request_timeout_ms() -> u64 {
    30000
}

fn default_keyword_suffix() -> String {
    ".keyword".to_string()
}

fn default_true() -> bool {
    true
}

impl ElasticsearchConfig {
    /// Creates a configuration for an index on the default local node.
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            nodes: default_nodes(),
            index: index.into(),
            request_timeout_ms: default_request_timeout_ms(),
            auth: None,
            keyword_suffix: default_keyword_suffix(),
            track_total_hits: true,
        }
    }

    fn query_builder(&self) -> EsQueryBuilder {
        EsQueryBuilder::new(self.index.clone())
            .keyword_suffix(self.keyword_suffix.clone())
            .track_total_hits(self.track_total_hits)
    }
}

/// The search call a repository needs from the index.
///
/// Returns the raw response body. Implemented for the `elasticsearch`
/// client with the `elasticsearch` feature.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Runs a search request.
    async fn search(&self, query: &EsQuery) -> EngineResult<Value>;
}

/// Searches one Elasticsearch index.
pub struct ElasticsearchRepository<T> {
    index: Arc<dyn SearchIndex>,
    builder: EsQueryBuilder,
    descriptors: Vec<FilterDescriptor>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Debug for ElasticsearchRepository<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticsearchRepository")
            .field("builder", &self.builder)
            .field("filters", &self.descriptors.len())
            .finish_non_exhaustive()
    }
}

impl<T> ElasticsearchRepository<T>
where
    T: SearchableEntity + DeserializeOwned,
{
    /// Creates an adapter over a search index.
    pub fn new(index: Arc<dyn SearchIndex>, config: &ElasticsearchConfig) -> EngineResult<Self> {
        Ok(Self {
            index,
            builder: config.query_builder(),
            descriptors: FilterMetadataExtractor::extract::<T>()?,
            _entity: PhantomData,
        })
    }

    /// Builds a client from the configuration and creates an adapter over it.
    #[cfg(feature = "elasticsearch")]
    pub fn connect(config: &ElasticsearchConfig) -> EngineResult<Self> {
        let client = client::build_client(config)?;
        Self::new(Arc::new(client), config)
    }
}

#[async_trait]
impl<T> BackendCompiler<T> for ElasticsearchRepository<T>
where
    T: SearchableEntity + DeserializeOwned,
{
    type Query = EsQuery;
    type Row = Value;

    fn kind(&self) -> BackendKind {
        BackendKind::Elasticsearch
    }

    fn descriptors(&self) -> &[FilterDescriptor] {
        &self.descriptors
    }

    fn lower(&self, compiled: &CompiledCriteria) -> EngineResult<EsQuery> {
        Ok(self.builder.build(compiled))
    }

    async fn execute(&self, query: &EsQuery) -> EngineResult<RawPage<Value>> {
        let body = self.index.search(query).await?;
        parse_hits(&body)
    }

    fn map_row(&self, row: Value) -> EngineResult<T> {
        serde_json::from_value(row)
            .map_err(|e| BackendError::mapping(BACKEND_NAME, e.to_string()).into())
    }
}

#[async_trait]
impl<T> EntityRepository<T> for ElasticsearchRepository<T>
where
    T: SearchableEntity + DeserializeOwned,
{
    async fn find_by_criteria(&self, criteria: &SearchCriteria) -> EngineResult<SearchResult<T>> {
        execute_search(self, criteria).await
    }
}

/// Extracts `_source` documents and the total from a search response.
pub fn parse_hits(body: &Value) -> EngineResult<RawPage<Value>> {
    let hits = body
        .get("hits")
        .and_then(|h| h.get("hits"))
        .and_then(|h| h.as_array())
        .cloned()
        .unwrap_or_default();

    // Older servers and some proxies return a bare number.
    let total = body.get("hits").and_then(|h| h.get("total"));
    let total = total
        .and_then(|t| t.get("value"))
        .or(total)
        .and_then(|v| v.as_u64());

    let mut rows = Vec::with_capacity(hits.len());
    for hit in hits {
        match hit.get("_source") {
            Some(source) => rows.push(source.clone()),
            None => {
                return Err(
                    BackendError::mapping(BACKEND_NAME, "search hit without _source").into(),
                );
            }
        }
    }

    let total = total.unwrap_or(rows.len() as u64);
    Ok(RawPage { rows, total })
}

/// Builds the error for a non-success search response.
#[cfg_attr(not(feature = "elasticsearch"), allow(dead_code))]
fn search_failure(index: &str, status: u16, body: &str) -> BackendError {
    if body.contains("index_not_found_exception") {
        BackendError::query(BACKEND_NAME, format!("index not found: {}", index))
    } else {
        BackendError::query(
            BACKEND_NAME,
            format!("search on {} failed with status {}: {}", index, status, body),
        )
    }
}

#[cfg(feature = "elasticsearch")]
mod client {
    use std::time::Duration;

    use async_trait::async_trait;
    use elasticsearch::auth::Credentials;
    use elasticsearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
    use elasticsearch::{Elasticsearch, SearchParts};
    use serde_json::Value;

    use super::{BACKEND_NAME, ElasticsearchAuth, ElasticsearchConfig, SearchIndex, search_failure};
    use crate::backends::elasticsearch::EsQuery;
    use crate::error::{BackendError, EngineResult};

    /// Builds the client from configuration.
    pub(super) fn build_client(config: &ElasticsearchConfig) -> EngineResult<Elasticsearch> {
        let url = config
            .nodes
            .first()
            .cloned()
            .unwrap_or_else(|| "http://localhost:9200".to_string());

        let parsed_url: elasticsearch::http::Url =
            url.parse().map_err(|e| BackendError::ConnectionFailed {
                backend_name: BACKEND_NAME.to_string(),
                message: format!("Invalid URL: {}", e),
            })?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);

        let mut builder = TransportBuilder::new(conn_pool)
            .timeout(Duration::from_millis(config.request_timeout_ms));

        if let Some(ref auth) = config.auth {
            builder = match auth {
                ElasticsearchAuth::Basic { username, password } => {
                    builder.auth(Credentials::Basic(username.clone(), password.clone()))
                }
                ElasticsearchAuth::Bearer { token } => {
                    builder.auth(Credentials::Bearer(token.clone()))
                }
            };
        }

        let transport = builder.build().map_err(|e| BackendError::ConnectionFailed {
            backend_name: BACKEND_NAME.to_string(),
            message: format!("Failed to build transport: {}", e),
        })?;

        Ok(Elasticsearch::new(transport))
    }

    #[async_trait]
    impl SearchIndex for Elasticsearch {
        async fn search(&self, query: &EsQuery) -> EngineResult<Value> {
            let response = Elasticsearch::search(self, SearchParts::Index(&[query.index.as_str()]))
                .body(query.body.clone())
                .send()
                .await
                .map_err(|e| BackendError::ConnectionFailed {
                    backend_name: BACKEND_NAME.to_string(),
                    message: e.to_string(),
                })?;

            let status = response.status_code();
            if !status.is_success() {
                let body = response.text().await.map_err(|e| {
                    BackendError::query(
                        BACKEND_NAME,
                        format!("Failed to read error response ({}): {}", status, e),
                    )
                })?;
                return Err(search_failure(&query.index, status.as_u16(), &body).into());
            }

            response.json::<Value>().await.map_err(|e| {
                BackendError::mapping(BACKEND_NAME, format!("Failed to parse search response: {}", e))
                    .into()
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use serde_json::json;

    use super::*;
    use crate::error::EngineError;
    use crate::metadata::EntitySchema;
    use crate::types::{FilterCriteria, FilterOperator, SortCriteria};

    #[derive(Debug, Deserialize)]
    struct Release {
        name: String,
    }

    impl SearchableEntity for Release {
        fn schema() -> EntitySchema {
            EntitySchema::new("Release").field::<String>("name")
        }
    }

    struct FakeIndex {
        response: Value,
        seen: Mutex<Vec<EsQuery>>,
    }

    #[async_trait]
    impl SearchIndex for FakeIndex {
        async fn search(&self, query: &EsQuery) -> EngineResult<Value> {
            self.seen.lock().push(query.clone());
            Ok(self.response.clone())
        }
    }

    #[test]
    fn test_config_defaults() {
        let config: ElasticsearchConfig = serde_json::from_str(r#"{"index":"os"}"#).unwrap();
        assert_eq!(config.nodes, vec!["http://localhost:9200".to_string()]);
        assert_eq!(config.request_timeout_ms, 30000);
        assert_eq!(config.keyword_suffix, ".keyword");
        assert!(config.track_total_hits);
        assert!(config.auth.is_none());
    }

    #[test]
    fn test_parse_hits_total_shapes() {
        let page = parse_hits(&json!({
            "hits": { "total": { "value": 12, "relation": "eq" }, "hits": [{ "_source": { "name": "a" } }] }
        }))
        .unwrap();
        assert_eq!(page.total, 12);
        assert_eq!(page.rows, vec![json!({ "name": "a" })]);

        let page = parse_hits(&json!({ "hits": { "total": 3, "hits": [] } })).unwrap();
        assert_eq!(page.total, 3);

        assert!(parse_hits(&json!({ "hits": { "hits": [{ "_id": "1" }] } })).is_err());
    }

    #[tokio::test]
    async fn test_search_through_fake_index() {
        let fake = Arc::new(FakeIndex {
            response: json!({
                "hits": {
                    "total": { "value": 2 },
                    "hits": [
                        { "_source": { "name": "Fedora" } },
                        { "_source": { "name": "Debian" } }
                    ]
                }
            }),
            seen: Mutex::new(Vec::new()),
        });
        let repo =
            ElasticsearchRepository::<Release>::new(fake.clone(), &ElasticsearchConfig::new("os"))
                .unwrap();

        let criteria = SearchCriteria::default()
            .with_filter(FilterCriteria::with_value("name", FilterOperator::Contains, "e"))
            .with_sort(SortCriteria::desc("name"));
        let result = repo.find_by_criteria(&criteria).await.unwrap();

        assert_eq!(result.total_elements, 2);
        assert_eq!(result.content[0].name, "Fedora");

        let seen = fake.seen.lock();
        assert_eq!(seen[0].index, "os");
        assert_eq!(
            seen[0].body["sort"],
            json!([{ "name.keyword": { "order": "desc", "missing": "_last" } }])
        );
    }

    #[tokio::test]
    async fn test_mapping_error() {
        let fake = Arc::new(FakeIndex {
            response: json!({ "hits": { "total": { "value": 1 }, "hits": [{ "_source": { "name": 7 } }] } }),
            seen: Mutex::new(Vec::new()),
        });
        let repo =
            ElasticsearchRepository::<Release>::new(fake, &ElasticsearchConfig::new("os")).unwrap();
        let err = repo
            .find_by_criteria(&SearchCriteria::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Backend(BackendError::Mapping { .. })));
    }

    #[test]
    fn test_missing_index_is_a_query_error() {
        let body = r#"{"error":{"type":"index_not_found_exception","index":"releases"},"status":404}"#;
        let err = search_failure("releases", 404, body);
        assert!(matches!(
            err,
            BackendError::QueryError { ref message, .. } if message == "index not found: releases"
        ));

        let err = search_failure("releases", 400, "bad query");
        assert!(matches!(
            err,
            BackendError::QueryError { ref message, .. } if message.contains("status 400")
        ));
    }
}
