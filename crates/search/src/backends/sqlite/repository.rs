//! SQLite repository adapter.

use std::fmt::Debug;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::{BackendCompiler, BackendKind, EntityRepository, RawPage, execute_search};
use crate::error::{BackendError, EngineError, EngineResult};
use crate::metadata::{FilterMetadataExtractor, SearchableEntity};
use crate::search::CompiledCriteria;
use crate::types::{FieldType, FilterDescriptor, SearchCriteria, SearchResult};

use super::query_builder::{
    SqlFragment, SqlParam, SqlQuery, SqlQueryBuilder, UNICODE_UPPER, quote_identifier,
};

const BACKEND_NAME: &str = "sqlite";

/// Configuration for the SQLite adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteConfig {
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of idle connections.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in milliseconds.
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,

    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connection_timeout_ms() -> u64 {
    30000
}

fn default_busy_timeout_ms() -> u32 {
    5000
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connection_timeout_ms: default_connection_timeout_ms(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

/// Searches one table whose columns are named after the entity's filter keys.
///
/// Rows are read back as JSON objects and deserialized with serde; INTEGER
/// columns of BOOLEAN fields are turned back into booleans first.
pub struct SqliteRepository<T> {
    pool: Pool<SqliteConnectionManager>,
    builder: SqlQueryBuilder,
    descriptors: Vec<FilterDescriptor>,
    boolean_columns: Arc<Vec<String>>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Debug for SqliteRepository<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteRepository")
            .field("table", &self.builder.table())
            .field("filters", &self.descriptors.len())
            .finish_non_exhaustive()
    }
}

impl<T> SqliteRepository<T>
where
    T: SearchableEntity + Serialize + DeserializeOwned,
{
    /// Creates an adapter over a private in-memory database.
    ///
    /// The pool holds a single connection since every `:memory:` connection
    /// opens its own database.
    pub fn in_memory(table: impl Into<String>) -> EngineResult<Self> {
        let config = SqliteConfig {
            max_connections: 1,
            min_connections: 1,
            ..SqliteConfig::default()
        };
        Self::with_config(":memory:", table, config)
    }

    /// Opens or creates a file-based database.
    pub fn open<P: AsRef<Path>>(path: P, table: impl Into<String>) -> EngineResult<Self> {
        Self::with_config(path, table, SqliteConfig::default())
    }

    /// Creates an adapter with custom configuration.
    pub fn with_config<P: AsRef<Path>>(
        path: P,
        table: impl Into<String>,
        config: SqliteConfig,
    ) -> EngineResult<Self> {
        let busy_timeout = Duration::from_millis(u64::from(config.busy_timeout_ms));
        let manager = SqliteConnectionManager::file(path.as_ref())
            .with_init(move |conn| {
                conn.busy_timeout(busy_timeout)?;
                register_functions(conn)
            });

        let pool = Pool::builder()
            .max_size(config.max_connections)
            .min_idle(Some(config.min_connections))
            .connection_timeout(Duration::from_millis(config.connection_timeout_ms))
            .build(manager)
            .map_err(|e| BackendError::ConnectionFailed {
                backend_name: BACKEND_NAME.to_string(),
                message: e.to_string(),
            })?;

        let descriptors = FilterMetadataExtractor::extract::<T>()?;
        let boolean_columns = descriptors
            .iter()
            .filter(|d| d.field_type() == FieldType::Boolean)
            .map(|d| d.key().to_string())
            .collect();

        Ok(Self {
            pool,
            builder: SqlQueryBuilder::new(table),
            descriptors,
            boolean_columns: Arc::new(boolean_columns),
            _entity: PhantomData,
        })
    }

    /// Gets a connection from the pool.
    pub fn connection(&self) -> EngineResult<PooledConnection<SqliteConnectionManager>> {
        get_connection(&self.pool)
    }

    /// Runs a batch of statements, typically schema DDL.
    pub fn execute_batch(&self, sql: &str) -> EngineResult<()> {
        self.connection()?
            .execute_batch(sql)
            .map_err(|e| BackendError::query(BACKEND_NAME, e.to_string()).into())
    }

    /// Returns the column names of the table.
    pub fn table_columns(&self) -> EngineResult<Vec<String>> {
        let conn = self.connection()?;
        let query_error = |e: rusqlite::Error| BackendError::query(BACKEND_NAME, e.to_string());
        let mut stmt = conn
            .prepare("SELECT name FROM pragma_table_info(?1)")
            .map_err(query_error)?;
        let columns = stmt
            .query_map([self.builder.table()], |row| row.get::<_, String>(0))
            .map_err(query_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(query_error)?;
        Ok(columns)
    }

    /// Inserts a row, binding each serialized field to the column of the same name.
    ///
    /// Booleans bind as `0`/`1`; nested arrays and objects bind as JSON text.
    pub fn insert(&self, row: &T) -> EngineResult<()> {
        let value = serde_json::to_value(row)
            .map_err(|e| BackendError::mapping(BACKEND_NAME, e.to_string()))?;
        let Value::Object(fields) = value else {
            return Err(BackendError::mapping(BACKEND_NAME, "row must serialize to an object").into());
        };

        let mut statement = SqlFragment::new("");
        let mut columns = Vec::with_capacity(fields.len());
        let mut placeholders = Vec::with_capacity(fields.len());
        for (name, value) in &fields {
            columns.push(quote_identifier(name));
            placeholders.push(statement.add_param(json_param(value)));
        }
        statement.sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_identifier(self.builder.table()),
            columns.join(", "),
            placeholders.join(", ")
        );

        let conn = self.connection()?;
        conn.execute(&statement.sql, bind(&statement.params).as_slice())
            .map_err(|e| BackendError::query(BACKEND_NAME, e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl<T> BackendCompiler<T> for SqliteRepository<T>
where
    T: SearchableEntity + Serialize + DeserializeOwned,
{
    type Query = SqlQuery;
    type Row = Map<String, Value>;

    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    fn descriptors(&self) -> &[FilterDescriptor] {
        &self.descriptors
    }

    fn lower(&self, compiled: &CompiledCriteria) -> EngineResult<SqlQuery> {
        // Filters only reach descriptor keys; SQLite would read an unknown
        // double-quoted identifier as a string literal.
        let unknown = compiled
            .predicate
            .iter()
            .flat_map(|p| p.fields())
            .find(|field| !self.descriptors.iter().any(|d| d.key() == *field));
        if let Some(field) = unknown {
            return Err(no_such_column(field));
        }

        // Sorts may also use table columns that are not searchable.
        let needs_columns = compiled
            .sorts
            .iter()
            .any(|s| !self.descriptors.iter().any(|d| d.key() == s.key));
        if needs_columns {
            let columns = self.table_columns()?;
            if let Some(sort) = compiled.sorts.iter().find(|s| !columns.contains(&s.key)) {
                return Err(no_such_column(&sort.key));
            }
        }

        Ok(self.builder.build(compiled))
    }

    async fn execute(&self, query: &SqlQuery) -> EngineResult<RawPage<Map<String, Value>>> {
        let pool = self.pool.clone();
        let query = query.clone();
        let boolean_columns = Arc::clone(&self.boolean_columns);

        tokio::task::spawn_blocking(move || {
            let conn = get_connection(&pool)?;
            run_query(&conn, &query, &boolean_columns)
        })
        .await
        .map_err(|e| BackendError::internal(BACKEND_NAME, format!("search task failed: {}", e)))?
    }

    fn map_row(&self, row: Map<String, Value>) -> EngineResult<T> {
        serde_json::from_value(Value::Object(row))
            .map_err(|e| BackendError::mapping(BACKEND_NAME, e.to_string()).into())
    }
}

#[async_trait]
impl<T> EntityRepository<T> for SqliteRepository<T>
where
    T: SearchableEntity + Serialize + DeserializeOwned,
{
    async fn find_by_criteria(&self, criteria: &SearchCriteria) -> EngineResult<SearchResult<T>> {
        execute_search(self, criteria).await
    }
}

fn no_such_column(field: &str) -> EngineError {
    BackendError::query(BACKEND_NAME, format!("no such column: {}", field)).into()
}

/// Registers the scalar functions the SQL lowering relies on.
fn register_functions(conn: &mut rusqlite::Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        UNICODE_UPPER,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            Ok(match ctx.get_raw(0) {
                ValueRef::Text(bytes) => Some(String::from_utf8_lossy(bytes).to_uppercase()),
                ValueRef::Integer(i) => Some(i.to_string()),
                ValueRef::Real(f) => Some(f.to_string()),
                ValueRef::Null | ValueRef::Blob(_) => None,
            })
        },
    )
}

fn get_connection(
    pool: &Pool<SqliteConnectionManager>,
) -> EngineResult<PooledConnection<SqliteConnectionManager>> {
    pool.get().map_err(|e| {
        EngineError::Backend(BackendError::ConnectionFailed {
            backend_name: BACKEND_NAME.to_string(),
            message: e.to_string(),
        })
    })
}

fn run_query(
    conn: &rusqlite::Connection,
    query: &SqlQuery,
    boolean_columns: &[String],
) -> EngineResult<RawPage<Map<String, Value>>> {
    let query_error = |e: rusqlite::Error| BackendError::query(BACKEND_NAME, e.to_string());

    let total: i64 = conn
        .query_row(&query.count.sql, bind(&query.count.params).as_slice(), |row| {
            row.get(0)
        })
        .map_err(query_error)?;

    let mut stmt = conn.prepare(&query.select.sql).map_err(query_error)?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

    let rows = stmt
        .query_map(bind(&query.select.params).as_slice(), |row| {
            let mut object = Map::with_capacity(columns.len());
            for (index, name) in columns.iter().enumerate() {
                let value = match row.get_ref(index)? {
                    ValueRef::Null => Value::Null,
                    ValueRef::Integer(i) if boolean_columns.contains(name) => Value::Bool(i != 0),
                    ValueRef::Integer(i) => Value::from(i),
                    ValueRef::Real(f) => Value::from(f),
                    ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
                    ValueRef::Blob(_) => Value::Null,
                };
                object.insert(name.clone(), value);
            }
            Ok(object)
        })
        .map_err(query_error)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(query_error)?;

    Ok(RawPage {
        rows,
        total: u64::try_from(total).unwrap_or(0),
    })
}

fn bind(params: &[SqlParam]) -> Vec<&dyn rusqlite::ToSql> {
    params
        .iter()
        .map(|p| match p {
            SqlParam::String(s) => s as &dyn rusqlite::ToSql,
            SqlParam::Integer(i) => i as &dyn rusqlite::ToSql,
            SqlParam::Float(f) => f as &dyn rusqlite::ToSql,
            SqlParam::Null => &rusqlite::types::Null as &dyn rusqlite::ToSql,
        })
        .collect()
}

fn json_param(value: &Value) -> SqlParam {
    match value {
        Value::Null => SqlParam::Null,
        Value::Bool(b) => SqlParam::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlParam::Integer(i),
            None => SqlParam::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => SqlParam::String(s.clone()),
        other => SqlParam::String(other.to_string()),
    }
}
