//! Backend-neutral predicate tree.
//!
//! Criteria are compiled once into a [`Predicate`]; each backend lowers the
//! tree into its native query form. Comparisons against a null or absent
//! field never match, and the compiler guards every negation with an explicit
//! [`Predicate::IsNotNull`] so backends with two-valued logic agree with SQL.

use std::fmt;

use serde::Serialize;

use crate::types::FieldValue;

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CompareOp {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Less than.
    Lt,
    /// Greater than.
    Gt,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "="),
            CompareOp::Ne => write!(f, "<>"),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Gt => write!(f, ">"),
        }
    }
}

/// Case-insensitive text match modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TextMode {
    /// Substring anywhere.
    Contains,
    /// Prefix.
    StartsWith,
    /// Suffix.
    EndsWith,
}

/// A predicate over the fields of one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Predicate {
    /// All children match. An empty conjunction matches everything.
    And(Vec<Predicate>),
    /// At least one child matches. An empty disjunction matches nothing.
    Or(Vec<Predicate>),
    /// The child does not match.
    Not(Box<Predicate>),
    /// `field <op> value`.
    Compare {
        /// Field key.
        field: String,
        /// Comparison operator.
        op: CompareOp,
        /// Right-hand side.
        value: FieldValue,
    },
    /// `lower <= field <= upper`.
    Range {
        /// Field key.
        field: String,
        /// Inclusive lower bound.
        lower: FieldValue,
        /// Inclusive upper bound.
        upper: FieldValue,
    },
    /// `field` equals one of `values`.
    In {
        /// Field key.
        field: String,
        /// Candidate values.
        values: Vec<FieldValue>,
    },
    /// Case-insensitive match of literal text.
    TextMatch {
        /// Field key.
        field: String,
        /// Match mode.
        mode: TextMode,
        /// Literal text to look for.
        text: String,
    },
    /// `field` is null or absent.
    IsNull {
        /// Field key.
        field: String,
    },
    /// `field` is present and not null.
    IsNotNull {
        /// Field key.
        field: String,
    },
}

impl Predicate {
    /// Creates a comparison.
    pub fn compare(field: impl Into<String>, op: CompareOp, value: impl Into<FieldValue>) -> Self {
        Predicate::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Creates an inclusive range.
    pub fn range(
        field: impl Into<String>,
        lower: impl Into<FieldValue>,
        upper: impl Into<FieldValue>,
    ) -> Self {
        Predicate::Range {
            field: field.into(),
            lower: lower.into(),
            upper: upper.into(),
        }
    }

    /// Creates a text match.
    pub fn text(field: impl Into<String>, mode: TextMode, text: impl Into<String>) -> Self {
        Predicate::TextMatch {
            field: field.into(),
            mode,
            text: text.into(),
        }
    }

    /// Creates a null test.
    pub fn is_null(field: impl Into<String>) -> Self {
        Predicate::IsNull {
            field: field.into(),
        }
    }

    /// Creates a presence test.
    pub fn is_not_null(field: impl Into<String>) -> Self {
        Predicate::IsNotNull {
            field: field.into(),
        }
    }

    /// Negates a predicate.
    #[allow(clippy::should_implement_trait)]
    pub fn not(predicate: Predicate) -> Self {
        Predicate::Not(Box::new(predicate))
    }

    /// Negates a predicate while requiring the field to be present.
    pub fn present_and_not(field: impl Into<String>, predicate: Predicate) -> Self {
        Predicate::And(vec![Predicate::is_not_null(field), Predicate::not(predicate)])
    }

    /// Combines predicates with AND; `None` when there is nothing to combine.
    ///
    /// Nested conjunctions are flattened and a single predicate is returned
    /// as is.
    pub fn all(predicates: impl IntoIterator<Item = Predicate>) -> Option<Predicate> {
        let mut flat = Vec::new();
        for predicate in predicates {
            match predicate {
                Predicate::And(children) => flat.extend(children),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => None,
            1 => flat.pop(),
            _ => Some(Predicate::And(flat)),
        }
    }

    /// Combines predicates with OR; `None` when there is nothing to combine.
    pub fn any(predicates: impl IntoIterator<Item = Predicate>) -> Option<Predicate> {
        let mut flat: Vec<Predicate> = predicates.into_iter().collect();
        match flat.len() {
            0 => None,
            1 => flat.pop(),
            _ => Some(Predicate::Or(flat)),
        }
    }

    /// Returns the distinct field names referenced by this predicate.
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        let field = match self {
            Predicate::And(children) | Predicate::Or(children) => {
                for child in children {
                    child.collect_fields(out);
                }
                return;
            }
            Predicate::Not(child) => {
                child.collect_fields(out);
                return;
            }
            Predicate::Compare { field, .. }
            | Predicate::Range { field, .. }
            | Predicate::In { field, .. }
            | Predicate::TextMatch { field, .. }
            | Predicate::IsNull { field }
            | Predicate::IsNotNull { field } => field.as_str(),
        };
        if !out.contains(&field) {
            out.push(field);
        }
    }
}
