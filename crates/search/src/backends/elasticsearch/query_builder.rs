//! Elasticsearch Query DSL lowering of compiled criteria.
//!
//! Exact and pattern matches on text target the keyword sub-field
//! (`<key><keyword_suffix>`), range and presence tests target the field
//! itself. Text matches are `wildcard` queries with `case_insensitive` set.

use serde_json::{Value, json};

use crate::search::{CompiledCriteria, CompiledSort, CompareOp, Predicate, TextMode};
use crate::types::{FieldType, FieldValue, NumberValue, SortDirection};

/// Text form of date values sent to the index.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// A complete Elasticsearch query body ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct EsQuery {
    /// The complete query body.
    pub body: Value,
    /// The index to search.
    pub index: String,
}

/// Builds Elasticsearch search bodies.
#[derive(Debug, Clone)]
pub struct EsQueryBuilder {
    index: String,
    keyword_suffix: String,
    track_total_hits: bool,
}

impl EsQueryBuilder {
    /// Creates a builder for an index with the default `.keyword` suffix.
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            keyword_suffix: ".keyword".to_string(),
            track_total_hits: true,
        }
    }

    /// Sets the keyword sub-field suffix.
    pub fn keyword_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.keyword_suffix = suffix.into();
        self
    }

    /// Sets whether exact totals are requested.
    pub fn track_total_hits(mut self, track: bool) -> Self {
        self.track_total_hits = track;
        self
    }

    /// Builds the search body for compiled criteria.
    pub fn build(&self, compiled: &CompiledCriteria) -> EsQuery {
        let query = match &compiled.predicate {
            Some(predicate) => json!({ "bool": { "filter": [self.lower(predicate)] } }),
            None => json!({ "match_all": {} }),
        };

        let mut body = json!({
            "query": query,
            "from": compiled.page.offset(),
            "size": compiled.page.size,
            "track_total_hits": self.track_total_hits,
        });

        if !compiled.sorts.is_empty() {
            body["sort"] = self.build_sort(&compiled.sorts);
        }

        EsQuery {
            body,
            index: self.index.clone(),
        }
    }

    /// Lowers one predicate into a query clause.
    pub fn lower(&self, predicate: &Predicate) -> Value {
        match predicate {
            Predicate::And(children) if children.is_empty() => json!({ "match_all": {} }),
            Predicate::And(children) => json!({ "bool": { "filter": self.lower_all(children) } }),
            Predicate::Or(children) if children.is_empty() => json!({ "match_none": {} }),
            Predicate::Or(children) => json!({
                "bool": { "should": self.lower_all(children), "minimum_should_match": 1 }
            }),
            Predicate::Not(child) => json!({ "bool": { "must_not": [self.lower(child)] } }),
            Predicate::Compare { field, op, value } => {
                let v = to_json(value);
                match op {
                    CompareOp::Eq => json!({ "term": { self.exact_field(field, value): v } }),
                    CompareOp::Ne => json!({
                        "bool": { "must_not": [{ "term": { self.exact_field(field, value): v } }] }
                    }),
                    CompareOp::Lt => json!({ "range": { field.as_str(): { "lt": v } } }),
                    CompareOp::Gt => json!({ "range": { field.as_str(): { "gt": v } } }),
                }
            }
            Predicate::Range {
                field,
                lower,
                upper,
            } => json!({
                "range": { field.as_str(): { "gte": to_json(lower), "lte": to_json(upper) } }
            }),
            Predicate::In { field, values } => match values.first() {
                None => json!({ "match_none": {} }),
                Some(first) => {
                    let values: Vec<Value> = values.iter().map(to_json).collect();
                    json!({ "terms": { self.exact_field(field, first): values } })
                }
            },
            Predicate::TextMatch { field, mode, text } => {
                let escaped = escape_wildcard(text);
                let pattern = match mode {
                    TextMode::Contains => format!("*{}*", escaped),
                    TextMode::StartsWith => format!("{}*", escaped),
                    TextMode::EndsWith => format!("*{}", escaped),
                };
                json!({
                    "wildcard": {
                        self.keyword(field): { "value": pattern, "case_insensitive": true }
                    }
                })
            }
            Predicate::IsNull { field } => json!({
                "bool": { "must_not": [{ "exists": { "field": field } }] }
            }),
            Predicate::IsNotNull { field } => json!({ "exists": { "field": field } }),
        }
    }

    fn lower_all(&self, children: &[Predicate]) -> Vec<Value> {
        children.iter().map(|c| self.lower(c)).collect()
    }

    fn keyword(&self, field: &str) -> String {
        format!("{}{}", field, self.keyword_suffix)
    }

    fn exact_field(&self, field: &str, value: &FieldValue) -> String {
        match value {
            FieldValue::Text(_) => self.keyword(field),
            _ => field.to_string(),
        }
    }

    fn build_sort(&self, sorts: &[CompiledSort]) -> Value {
        let clauses: Vec<Value> = sorts
            .iter()
            .map(|sort| {
                let field = if sort.field_type == FieldType::String {
                    self.keyword(&sort.key)
                } else {
                    sort.key.clone()
                };
                let (order, missing) = match sort.direction {
                    SortDirection::Asc => ("asc", "_first"),
                    SortDirection::Desc => ("desc", "_last"),
                };
                json!({ field: { "order": order, "missing": missing } })
            })
            .collect();
        Value::Array(clauses)
    }
}

/// Converts a typed filter value into JSON.
pub fn to_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Text(s) => json!(s),
        FieldValue::Number(n) => match n {
            NumberValue::Int(v) => json!(v),
            NumberValue::Long(v) => json!(v),
            NumberValue::Double(_) | NumberValue::Decimal(_) => json!(n.as_f64()),
        },
        FieldValue::DateTime(dt) => json!(dt.format(DATE_FORMAT).to_string()),
        FieldValue::Boolean(b) => json!(b),
    }
}

/// Escapes `\`, `*` and `?` for a wildcard pattern.
pub fn escape_wildcard(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '*' | '?') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
