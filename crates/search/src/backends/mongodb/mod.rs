//! MongoDB backend.
//!
//! Filters become BSON query documents: text matches are case-insensitive
//! anchored regexes over the escaped literal, negations use `$nor`, and
//! dates compare as BSON UTC datetimes. Date fields are therefore expected
//! to be stored as BSON dates.
//!
//! The repository talks to its collection through the [`DocumentCollection`]
//! seam; the driver implementation requires the `mongodb` feature.

pub mod query_builder;
mod repository;

pub use query_builder::{MongoQuery, MongoQueryBuilder, to_bson};
pub use repository::{DocumentCollection, MongoConfig, MongoRepository};
