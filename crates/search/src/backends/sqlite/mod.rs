//! SQLite backend.
//!
//! The SQL lowering in [`query_builder`] is always compiled; the pooled
//! repository adapter requires the `sqlite` feature.

pub mod query_builder;

#[cfg(feature = "sqlite")]
mod repository;

pub use query_builder::{SqlFragment, SqlParam, SqlQuery, SqlQueryBuilder};

#[cfg(feature = "sqlite")]
pub use repository::{SqliteConfig, SqliteRepository};
