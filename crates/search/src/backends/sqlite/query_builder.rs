//! SQL lowering of compiled criteria.
//!
//! Translates a [`Predicate`] tree into a parameterized `WHERE` clause over a
//! single table whose columns are named after the filter keys.
//!
//! - Text matches use `unicode_upper(col) LIKE ? ESCAPE '\'` with the user text
//!   escaped and upper-cased. `unicode_upper` is registered on every pooled
//!   connection by the repository.
//! - Date comparisons normalize both sides to `YYYY-MM-DDTHH:MM:SS.SSS` text so
//!   date-only and date-time columns compare chronologically.
//! - Booleans bind as `0`/`1`.
//! - Ascending sorts put nulls first, descending sorts put them last.

use crate::search::{CompiledCriteria, CompiledSort, Predicate, TextMode};
use crate::types::{FieldValue, NumberValue, SortDirection};

/// Name of the Unicode upper-casing scalar function used by text matches.
pub const UNICODE_UPPER: &str = "unicode_upper";

/// Text form of bound date parameters; matches `strftime('%Y-%m-%dT%H:%M:%f', ..)`.
pub const DATETIME_PARAM_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// A fragment of SQL with bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFragment {
    /// The SQL text.
    pub sql: String,
    /// Bound parameter values, in placeholder order.
    pub params: Vec<SqlParam>,
}

/// A bound SQL parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    /// Text parameter.
    String(String),
    /// Integer parameter.
    Integer(i64),
    /// Float parameter.
    Float(f64),
    /// Null parameter.
    Null,
}

impl SqlParam {
    /// Creates a text parameter.
    pub fn string(s: impl Into<String>) -> Self {
        SqlParam::String(s.into())
    }

    /// Binds a typed filter value.
    pub fn from_value(value: &FieldValue) -> Self {
        match value {
            FieldValue::Text(s) => SqlParam::String(s.clone()),
            FieldValue::Number(n) => match n {
                NumberValue::Int(v) => SqlParam::Integer(i64::from(*v)),
                NumberValue::Long(v) => SqlParam::Integer(*v),
                NumberValue::Double(_) | NumberValue::Decimal(_) => SqlParam::Float(n.as_f64()),
            },
            FieldValue::DateTime(dt) => {
                SqlParam::String(dt.format(DATETIME_PARAM_FORMAT).to_string())
            }
            FieldValue::Boolean(b) => SqlParam::Integer(i64::from(*b)),
        }
    }
}

impl SqlFragment {
    /// Creates a fragment without parameters.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Creates a fragment with parameters.
    pub fn with_params(sql: impl Into<String>, params: Vec<SqlParam>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Adds a parameter and returns its placeholder.
    pub fn add_param(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        format!("?{}", self.params.len())
    }

    /// Returns true if this fragment is empty.
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// The statements for one page of a search.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    /// Selects the rows of the page.
    pub select: SqlFragment,
    /// Counts all matches.
    pub count: SqlFragment,
}

/// Builds SQL statements against one table.
#[derive(Debug, Clone)]
pub struct SqlQueryBuilder {
    table: String,
}

impl SqlQueryBuilder {
    /// Creates a builder for the given table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }

    /// Returns the table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Builds the select and count statements for compiled criteria.
    pub fn build(&self, compiled: &CompiledCriteria) -> SqlQuery {
        let mut filter = SqlFragment::new("");
        if let Some(predicate) = &compiled.predicate {
            let clause = self.lower(predicate, &mut filter);
            filter.sql = format!(" WHERE {}", clause);
        }
        let table = quote_identifier(&self.table);

        let count = SqlFragment::with_params(
            format!("SELECT COUNT(*) FROM {}{}", table, filter.sql),
            filter.params.clone(),
        );

        let mut select = SqlFragment::with_params(
            format!("SELECT * FROM {}{}", table, filter.sql),
            filter.params,
        );
        select.sql.push_str(&self.order_by(&compiled.sorts));
        let limit = select.add_param(SqlParam::Integer(i64::from(compiled.page.size)));
        let offset = select.add_param(SqlParam::Integer(
            i64::try_from(compiled.page.offset()).unwrap_or(i64::MAX),
        ));
        select.sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset));

        SqlQuery { select, count }
    }

    /// Lowers a predicate, appending its parameters to `out`.
    pub fn lower(&self, predicate: &Predicate, out: &mut SqlFragment) -> String {
        match predicate {
            Predicate::And(children) => self.join(children, " AND ", "1 = 1", out),
            Predicate::Or(children) => self.join(children, " OR ", "0 = 1", out),
            Predicate::Not(child) => format!("NOT ({})", self.lower(child, out)),
            Predicate::Compare { field, op, value } => {
                let column = column_expr(field, value);
                let placeholder = out.add_param(SqlParam::from_value(value));
                format!("{} {} {}", column, op, placeholder)
            }
            Predicate::Range {
                field,
                lower,
                upper,
            } => {
                let column = column_expr(field, lower);
                let low = out.add_param(SqlParam::from_value(lower));
                let high = out.add_param(SqlParam::from_value(upper));
                format!("{} BETWEEN {} AND {}", column, low, high)
            }
            Predicate::In { field, values } => match values.first() {
                None => "0 = 1".to_string(),
                Some(first) => {
                    let column = column_expr(field, first);
                    let placeholders: Vec<String> = values
                        .iter()
                        .map(|v| out.add_param(SqlParam::from_value(v)))
                        .collect();
                    format!("{} IN ({})", column, placeholders.join(", "))
                }
            },
            Predicate::TextMatch { field, mode, text } => {
                let escaped = escape_like(text).to_uppercase();
                let pattern = match mode {
                    TextMode::Contains => format!("%{}%", escaped),
                    TextMode::StartsWith => format!("{}%", escaped),
                    TextMode::EndsWith => format!("%{}", escaped),
                };
                let placeholder = out.add_param(SqlParam::String(pattern));
                format!(
                    "{}({}) LIKE {} ESCAPE '\\'",
                    UNICODE_UPPER,
                    quote_identifier(field),
                    placeholder
                )
            }
            Predicate::IsNull { field } => format!("{} IS NULL", quote_identifier(field)),
            Predicate::IsNotNull { field } => format!("{} IS NOT NULL", quote_identifier(field)),
        }
    }

    fn join(
        &self,
        children: &[Predicate],
        separator: &str,
        empty: &str,
        out: &mut SqlFragment,
    ) -> String {
        if children.is_empty() {
            return empty.to_string();
        }
        let parts: Vec<String> = children
            .iter()
            .map(|child| format!("({})", self.lower(child, out)))
            .collect();
        parts.join(separator)
    }

    fn order_by(&self, sorts: &[CompiledSort]) -> String {
        if sorts.is_empty() {
            return String::new();
        }
        let keys: Vec<String> = sorts
            .iter()
            .map(|sort| {
                let direction = match sort.direction {
                    SortDirection::Asc => "ASC NULLS FIRST",
                    SortDirection::Desc => "DESC NULLS LAST",
                };
                format!("{} {}", quote_identifier(&sort.key), direction)
            })
            .collect();
        format!(" ORDER BY {}", keys.join(", "))
    }
}

/// Quotes an SQL identifier.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Escapes `\`, `%` and `_` for a `LIKE ... ESCAPE '\'` pattern.
pub fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn column_expr(field: &str, value: &FieldValue) -> String {
    match value {
        FieldValue::DateTime(_) => {
            format!("strftime('%Y-%m-%dT%H:%M:%f', {})", quote_identifier(field))
        }
        _ => quote_identifier(field),
    }
}

impl std::fmt::Display for SqlFragment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.sql)
    }
}
