//! Field types, filter operators and filter descriptors.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The logical type of a searchable field.
///
/// Drives both value parsing and the set of legal operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    /// Free text.
    String,
    /// Integer, floating point or decimal number.
    Number,
    /// Date or date-time.
    Date,
    /// Boolean flag.
    Boolean,
}

impl FieldType {
    /// Returns true if ordering comparisons (`<`, `>`, ranges) apply to this type.
    pub fn is_ordered(&self) -> bool {
        matches!(self, FieldType::Number | FieldType::Date)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::String => write!(f, "STRING"),
            FieldType::Number => write!(f, "NUMBER"),
            FieldType::Date => write!(f, "DATE"),
            FieldType::Boolean => write!(f, "BOOLEAN"),
        }
    }
}

impl FromStr for FieldType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "STRING" => Ok(FieldType::String),
            "NUMBER" => Ok(FieldType::Number),
            "DATE" => Ok(FieldType::Date),
            "BOOLEAN" => Ok(FieldType::Boolean),
            _ => Err(ValidationError::UnknownName {
                kind: "field type",
                value: s.to_string(),
            }),
        }
    }
}

/// Operators that can be applied to a filter.
///
/// The declaration order is the iteration order of operator sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterOperator {
    /// Exact match (date-only values on DATE fields match the whole day).
    Equals,
    /// Negation of exact match.
    NotEquals,
    /// Strictly less than (NUMBER and DATE only).
    LessThan,
    /// Strictly greater than (NUMBER and DATE only).
    GreaterThan,
    /// Case-insensitive substring match.
    Contains,
    /// Negation of [`FilterOperator::Contains`].
    NotContains,
    /// Case-insensitive prefix match.
    StartsWith,
    /// Case-insensitive suffix match.
    EndsWith,
    /// Membership in the filter's value list.
    In,
    /// Negation of [`FilterOperator::In`].
    NotIn,
    /// Inclusive range (NUMBER and DATE only).
    Between,
    /// Null, absent or empty string.
    Blank,
    /// Present, non-null and non-empty.
    NotBlank,
}

impl FilterOperator {
    /// All operators in declaration order.
    pub const ALL: [FilterOperator; 13] = [
        FilterOperator::Equals,
        FilterOperator::NotEquals,
        FilterOperator::LessThan,
        FilterOperator::GreaterThan,
        FilterOperator::Contains,
        FilterOperator::NotContains,
        FilterOperator::StartsWith,
        FilterOperator::EndsWith,
        FilterOperator::In,
        FilterOperator::NotIn,
        FilterOperator::Between,
        FilterOperator::Blank,
        FilterOperator::NotBlank,
    ];

    /// Returns the wire name of the operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Equals => "EQUALS",
            FilterOperator::NotEquals => "NOT_EQUALS",
            FilterOperator::LessThan => "LESS_THAN",
            FilterOperator::GreaterThan => "GREATER_THAN",
            FilterOperator::Contains => "CONTAINS",
            FilterOperator::NotContains => "NOT_CONTAINS",
            FilterOperator::StartsWith => "STARTS_WITH",
            FilterOperator::EndsWith => "ENDS_WITH",
            FilterOperator::In => "IN",
            FilterOperator::NotIn => "NOT_IN",
            FilterOperator::Between => "BETWEEN",
            FilterOperator::Blank => "BLANK",
            FilterOperator::NotBlank => "NOT_BLANK",
        }
    }

    /// Returns the operators auto-assigned to a field type.
    ///
    /// BLANK and NOT_BLANK are never assigned here; compilers still accept
    /// them for every field type when a caller issues them directly.
    pub fn defaults_for(field_type: FieldType) -> BTreeSet<FilterOperator> {
        use FilterOperator::*;

        let ops: &[FilterOperator] = match field_type {
            FieldType::String => &[
                Equals,
                NotEquals,
                Contains,
                NotContains,
                StartsWith,
                EndsWith,
                In,
                NotIn,
            ],
            FieldType::Number | FieldType::Date | FieldType::Boolean => &[
                Equals,
                NotEquals,
                GreaterThan,
                LessThan,
                In,
                NotIn,
                Between,
            ],
        };
        ops.iter().copied().collect()
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOperator {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        FilterOperator::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == upper)
            .ok_or_else(|| ValidationError::UnknownName {
                kind: "filter operator",
                value: s.to_string(),
            })
    }
}

/// Describes one filterable attribute of an entity type.
///
/// Constructed only through [`FilterDescriptor::new`] or the builder, both of
/// which reject a blank key, a missing field type and an empty operator set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFilterDescriptor", rename_all = "camelCase")]
pub struct FilterDescriptor {
    key: String,
    field_type: FieldType,
    nullable: bool,
    available_operators: BTreeSet<FilterOperator>,
}

impl FilterDescriptor {
    /// Creates a validated descriptor.
    pub fn new(
        key: impl Into<String>,
        field_type: FieldType,
        nullable: bool,
        available_operators: impl IntoIterator<Item = FilterOperator>,
    ) -> Result<Self, ValidationError> {
        FilterDescriptorBuilder::new(key)
            .field_type(field_type)
            .nullable(nullable)
            .operators(available_operators)
            .build()
    }

    /// Creates a descriptor with the default operator set of its field type.
    pub fn with_default_operators(
        key: impl Into<String>,
        field_type: FieldType,
        nullable: bool,
    ) -> Result<Self, ValidationError> {
        Self::new(
            key,
            field_type,
            nullable,
            FilterOperator::defaults_for(field_type),
        )
    }

    /// Starts a builder for the given key.
    pub fn builder(key: impl Into<String>) -> FilterDescriptorBuilder {
        FilterDescriptorBuilder::new(key)
    }

    /// Returns the logical key of the field.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the field type.
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Returns whether the field may be null.
    pub fn nullable(&self) -> bool {
        self.nullable
    }

    /// Returns the operators legal for this field.
    pub fn available_operators(&self) -> &BTreeSet<FilterOperator> {
        &self.available_operators
    }

    /// Returns true if the operator is in this field's operator set.
    pub fn supports(&self, operator: FilterOperator) -> bool {
        self.available_operators.contains(&operator)
    }
}

/// Builder for [`FilterDescriptor`].
#[derive(Debug, Clone, Default)]
pub struct FilterDescriptorBuilder {
    key: String,
    field_type: Option<FieldType>,
    nullable: bool,
    operators: BTreeSet<FilterOperator>,
}

impl FilterDescriptorBuilder {
    /// Creates a builder for the given key.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    /// Sets the field type.
    pub fn field_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    /// Sets the nullability flag.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Adds a single operator.
    pub fn operator(mut self, operator: FilterOperator) -> Self {
        self.operators.insert(operator);
        self
    }

    /// Adds several operators.
    pub fn operators(mut self, operators: impl IntoIterator<Item = FilterOperator>) -> Self {
        self.operators.extend(operators);
        self
    }

    /// Validates and builds the descriptor.
    pub fn build(self) -> Result<FilterDescriptor, ValidationError> {
        if self.key.trim().is_empty() {
            return Err(ValidationError::BlankKey);
        }
        let field_type = self
            .field_type
            .ok_or_else(|| ValidationError::MissingFieldType {
                key: self.key.clone(),
            })?;
        if self.operators.is_empty() {
            return Err(ValidationError::NoOperators { key: self.key });
        }

        Ok(FilterDescriptor {
            key: self.key,
            field_type,
            nullable: self.nullable,
            available_operators: self.operators,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFilterDescriptor {
    key: String,
    field_type: Option<FieldType>,
    #[serde(default)]
    nullable: bool,
    #[serde(default)]
    available_operators: BTreeSet<FilterOperator>,
}

impl TryFrom<RawFilterDescriptor> for FilterDescriptor {
    type Error = ValidationError;

    fn try_from(raw: RawFilterDescriptor) -> Result<Self, Self::Error> {
        let mut builder = FilterDescriptorBuilder::new(raw.key)
            .nullable(raw.nullable)
            .operators(raw.available_operators);
        if let Some(field_type) = raw.field_type {
            builder = builder.field_type(field_type);
        }
        builder.build()
    }
}
