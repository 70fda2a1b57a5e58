//! BSON lowering of compiled criteria.
//!
//! Builds a filter document, a sort document and the page window for
//! `find`, plus the same filter for `count_documents`.

use bson::{Bson, Document, doc};

use crate::search::{CompiledCriteria, CompiledSort, CompareOp, Predicate, TextMode};
use crate::types::{FieldValue, NumberValue, SortDirection};

/// A compiled document query.
#[derive(Debug, Clone, PartialEq)]
pub struct MongoQuery {
    /// The filter, empty to match every document.
    pub filter: Document,
    /// The sort specification, empty for natural order.
    pub sort: Document,
    /// Documents to skip.
    pub skip: u64,
    /// Maximum documents to return.
    pub limit: i64,
}

/// Lowers predicates into MongoDB query documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct MongoQueryBuilder;

impl MongoQueryBuilder {
    /// Creates a builder.
    pub fn new() -> Self {
        Self
    }

    /// Builds the query for compiled criteria.
    pub fn build(&self, compiled: &CompiledCriteria) -> MongoQuery {
        MongoQuery {
            filter: compiled
                .predicate
                .as_ref()
                .map(|p| self.lower(p))
                .unwrap_or_default(),
            sort: self.sort(&compiled.sorts),
            skip: compiled.page.offset(),
            limit: i64::from(compiled.page.size),
        }
    }

    /// Lowers one predicate into a filter document.
    pub fn lower(&self, predicate: &Predicate) -> Document {
        match predicate {
            Predicate::And(children) if children.is_empty() => Document::new(),
            Predicate::And(children) => doc! { "$and": self.lower_all(children) },
            // $nor over a match-all document matches nothing
            Predicate::Or(children) if children.is_empty() => doc! { "$nor": [{}] },
            Predicate::Or(children) => doc! { "$or": self.lower_all(children) },
            Predicate::Not(child) => doc! { "$nor": [self.lower(child)] },
            Predicate::Compare { field, op, value } => {
                let operator = match op {
                    CompareOp::Eq => "$eq",
                    CompareOp::Ne => "$ne",
                    CompareOp::Lt => "$lt",
                    CompareOp::Gt => "$gt",
                };
                doc! { field.as_str(): { operator: to_bson(value) } }
            }
            Predicate::Range {
                field,
                lower,
                upper,
            } => doc! { field.as_str(): { "$gte": to_bson(lower), "$lte": to_bson(upper) } },
            Predicate::In { field, values } => {
                let values: Vec<Bson> = values.iter().map(to_bson).collect();
                doc! { field.as_str(): { "$in": values } }
            }
            Predicate::TextMatch { field, mode, text } => {
                let escaped = regex::escape(text);
                let pattern = match mode {
                    TextMode::Contains => escaped,
                    TextMode::StartsWith => format!("^{}", escaped),
                    TextMode::EndsWith => format!("{}$", escaped),
                };
                doc! { field.as_str(): { "$regex": pattern, "$options": "i" } }
            }
            Predicate::IsNull { field } => doc! { field.as_str(): Bson::Null },
            Predicate::IsNotNull { field } => doc! { field.as_str(): { "$ne": Bson::Null } },
        }
    }

    fn lower_all(&self, children: &[Predicate]) -> Vec<Document> {
        children.iter().map(|c| self.lower(c)).collect()
    }

    fn sort(&self, sorts: &[CompiledSort]) -> Document {
        let mut sort = Document::new();
        for s in sorts {
            let direction = match s.direction {
                SortDirection::Asc => 1,
                SortDirection::Desc => -1,
            };
            sort.insert(s.key.clone(), direction);
        }
        sort
    }
}

/// Converts a typed filter value into BSON.
///
/// Decimals are sent as doubles; dates as BSON UTC datetimes.
pub fn to_bson(value: &FieldValue) -> Bson {
    match value {
        FieldValue::Text(s) => Bson::String(s.clone()),
        FieldValue::Number(n) => match n {
            NumberValue::Int(v) => Bson::Int32(*v),
            NumberValue::Long(v) => Bson::Int64(*v),
            NumberValue::Double(_) | NumberValue::Decimal(_) => Bson::Double(n.as_f64()),
        },
        FieldValue::DateTime(dt) => {
            Bson::DateTime(bson::DateTime::from_millis(dt.and_utc().timestamp_millis()))
        }
        FieldValue::Boolean(b) => Bson::Boolean(*b),
    }
}
