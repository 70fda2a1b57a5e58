//! Repository adapters, one per storage technology.
//!
//! Each adapter implements [`BackendCompiler`](crate::core::BackendCompiler)
//! by lowering the shared [`Predicate`](crate::search::Predicate) tree into
//! its native query form, and [`EntityRepository`](crate::core::EntityRepository)
//! by delegating to [`execute_search`](crate::core::execute_search).
//!
//! | Backend | Lowering | Adapter | Feature |
//! |---|---|---|---|
//! | [`sqlite`] | parameterized SQL | `SqliteRepository` (r2d2 pool) | `sqlite` (default) |
//! | [`mongodb`] | BSON filter documents | `MongoRepository` | `mongodb` for the driver |
//! | [`elasticsearch`] | Query DSL JSON | `ElasticsearchRepository` | `elasticsearch` for the client |
//! | [`memory`] | direct evaluation | `MemoryRepository` | always |

pub mod elasticsearch;
pub mod memory;
pub mod mongodb;
pub mod sqlite;
