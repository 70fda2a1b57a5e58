//! Elasticsearch backend.
//!
//! Filters lower to Query DSL clauses inside a `bool.filter`, so matching
//! never affects scoring. Sorts on text fields and exact text matches use the
//! keyword sub-field, which the index mapping must provide.
//!
//! The repository talks to the index through the [`SearchIndex`] seam; the
//! client implementation requires the `elasticsearch` feature.

pub mod query_builder;
mod repository;

pub use query_builder::{EsQuery, EsQueryBuilder, escape_wildcard, to_json};
pub use repository::{
    ElasticsearchAuth, ElasticsearchConfig, ElasticsearchRepository, SearchIndex, parse_hits,
};
