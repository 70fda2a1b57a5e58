//! Elasticsearch adapter tests.
//!
//! None of these need a running Elasticsearch instance: the client is built
//! without connecting, and searches run against a canned response.
//!
//! Run with: `cargo test -p dynamic-search --features elasticsearch -- elasticsearch`

#![cfg(feature = "elasticsearch")]

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};

use dynamic_search::backends::elasticsearch::{
    ElasticsearchAuth, ElasticsearchConfig, ElasticsearchRepository, EsQuery, SearchIndex,
};
use dynamic_search::core::{BackendCompiler, BackendKind, EntityRepository};
use dynamic_search::error::{BackendError, EngineError, EngineResult};
use dynamic_search::types::{FilterCriteria, FilterOperator, SearchCriteria, SortCriteria};

use common::{OperatingSystem, ids};

// ============================================================================
// Configuration Tests
// ============================================================================

#[test]
fn test_elasticsearch_config_defaults() {
    let config: ElasticsearchConfig = serde_json::from_value(json!({ "index": "os" })).unwrap();
    assert_eq!(config.nodes, vec!["http://localhost:9200".to_string()]);
    assert_eq!(config.index, "os");
    assert_eq!(config.request_timeout_ms, 30000);
    assert_eq!(config.keyword_suffix, ".keyword");
    assert!(config.track_total_hits);
    assert!(config.auth.is_none());
}

#[test]
fn test_elasticsearch_config_serialization() {
    let config = ElasticsearchConfig {
        nodes: vec!["http://es1:9200".to_string()],
        auth: Some(ElasticsearchAuth::Bearer {
            token: "secret".to_string(),
        }),
        keyword_suffix: ".raw".to_string(),
        ..ElasticsearchConfig::new("systems")
    };

    let json = serde_json::to_string(&config).unwrap();
    let deserialized: ElasticsearchConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized.nodes, config.nodes);
    assert_eq!(deserialized.index, "systems");
    assert_eq!(deserialized.keyword_suffix, ".raw");
    assert!(matches!(
        deserialized.auth,
        Some(ElasticsearchAuth::Bearer { ref token }) if token == "secret"
    ));
}

// ============================================================================
// Client Construction Tests (no ES instance required)
// ============================================================================

#[test]
fn test_connect_builds_client() {
    let config = ElasticsearchConfig {
        auth: Some(ElasticsearchAuth::Basic {
            username: "elastic".to_string(),
            password: "changeme".to_string(),
        }),
        ..ElasticsearchConfig::new("os")
    };
    let repository = ElasticsearchRepository::<OperatingSystem>::connect(&config).unwrap();
    assert_eq!(repository.kind(), BackendKind::Elasticsearch);
    assert_eq!(repository.descriptors().len(), 6);
}

#[test]
fn test_connect_rejects_invalid_url() {
    let config = ElasticsearchConfig {
        nodes: vec!["not a url".to_string()],
        ..ElasticsearchConfig::new("os")
    };
    let err = ElasticsearchRepository::<OperatingSystem>::connect(&config).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Backend(BackendError::ConnectionFailed { ref backend_name, .. })
            if backend_name == "elasticsearch"
    ));
}

// ============================================================================
// Search Tests (canned responses)
// ============================================================================

struct CannedIndex {
    response: Value,
    requests: Mutex<Vec<EsQuery>>,
}

#[async_trait]
impl SearchIndex for CannedIndex {
    async fn search(&self, query: &EsQuery) -> EngineResult<Value> {
        self.requests.lock().push(query.clone());
        Ok(self.response.clone())
    }
}

#[tokio::test]
async fn test_search_sends_body_and_maps_hits() {
    let index = Arc::new(CannedIndex {
        response: json!({
            "hits": {
                "total": { "value": 3, "relation": "eq" },
                "hits": [
                    { "_id": "3", "_source": { "id": 3, "name": "Debian", "version": "12" } },
                    { "_id": "2", "_source": { "id": 2, "name": "Ubuntu", "releaseDate": "2024-04-25" } }
                ]
            }
        }),
        requests: Mutex::new(Vec::new()),
    });
    let repository =
        ElasticsearchRepository::<OperatingSystem>::new(index.clone(), &ElasticsearchConfig::new("os"))
            .unwrap();

    let criteria = SearchCriteria::default()
        .with_filter(FilterCriteria::with_value("kernel", FilterOperator::StartsWith, "linux"))
        .with_sort(SortCriteria::asc("name"))
        .with_page(0, 2);
    let result = repository.find_by_criteria(&criteria).await.unwrap();

    assert_eq!(ids(&result), vec![3, 2]);
    assert_eq!(result.total_elements, 3);
    assert_eq!(result.total_pages, 2);
    assert!(!result.last);

    let requests = index.requests.lock();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].index, "os");
    assert_eq!(requests[0].body["size"], json!(2));
    assert_eq!(
        requests[0].body["sort"],
        json!([{ "name.keyword": { "order": "asc", "missing": "_first" } }])
    );
}

#[tokio::test]
async fn test_hit_without_source_is_a_mapping_error() {
    let index = Arc::new(CannedIndex {
        response: json!({ "hits": { "total": 1, "hits": [{ "_id": "1" }] } }),
        requests: Mutex::new(Vec::new()),
    });
    let repository =
        ElasticsearchRepository::<OperatingSystem>::new(index, &ElasticsearchConfig::new("os"))
            .unwrap();

    let err = repository
        .find_by_criteria(&SearchCriteria::default())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Backend(BackendError::Mapping { .. })));
}
