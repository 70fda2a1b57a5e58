//! The canonical, backend-neutral description of a search request.
//!
//! All of these values are transient and owned by the caller. Collections are
//! never absent: JSON `null` and missing members both deserialize to their
//! defaults.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

use super::field::{FieldType, FilterOperator};

/// Default number of rows per page.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A single filter on one field.
///
/// `value` and `value_to` feed single-value operators and BETWEEN; `values`
/// feeds IN and NOT_IN. The field type may be left unset and is then resolved
/// from the entity's descriptors before compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    /// The field key.
    pub key: String,
    /// The operator to apply.
    pub operator: FilterOperator,
    /// The field type, if known to the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    /// The primary value (lower bound for BETWEEN).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Upper bound for BETWEEN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_to: Option<String>,
    /// Value list for IN and NOT_IN.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub values: Vec<String>,
}

impl FilterCriteria {
    /// Creates a filter with no value.
    pub fn new(key: impl Into<String>, operator: FilterOperator) -> Self {
        Self {
            key: key.into(),
            operator,
            field_type: None,
            value: None,
            value_to: None,
            values: Vec::new(),
        }
    }

    /// Creates a single-value filter.
    pub fn with_value(
        key: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<String>,
    ) -> Self {
        Self::new(key, operator).value(value)
    }

    /// Creates an inclusive BETWEEN filter.
    pub fn between(
        key: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self::new(key, FilterOperator::Between)
            .value(from)
            .value_to(to)
    }

    /// Creates a membership filter (IN or NOT_IN).
    pub fn membership<I, S>(key: impl Into<String>, operator: FilterOperator, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut filter = Self::new(key, operator);
        filter.values = values.into_iter().map(Into::into).collect();
        filter
    }

    /// Sets the primary value.
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Sets the upper bound.
    pub fn value_to(mut self, value_to: impl Into<String>) -> Self {
        self.value_to = Some(value_to.into());
        self
    }

    /// Sets the field type explicitly.
    pub fn field_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortDirection {
    /// Ascending order.
    #[default]
    #[serde(rename = "ASC", alias = "asc")]
    Asc,
    /// Descending order.
    #[serde(rename = "DESC", alias = "desc")]
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "ASC"),
            SortDirection::Desc => write!(f, "DESC"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ASC" => Ok(SortDirection::Asc),
            "DESC" => Ok(SortDirection::Desc),
            _ => Err(ValidationError::UnknownName {
                kind: "sort direction",
                value: s.to_string(),
            }),
        }
    }
}

/// Sort order on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortCriteria {
    /// The field key.
    pub key: String,
    /// The direction.
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortCriteria {
    /// Creates an ascending sort.
    pub fn asc(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            direction: SortDirection::Asc,
        }
    }

    /// Creates a descending sort.
    pub fn desc(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Free-text query matched against every STRING field of the entity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FullTextCriteria {
    /// The query text.
    #[serde(default)]
    pub query: Option<String>,
}

impl FullTextCriteria {
    /// Creates a full-text criterion.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
        }
    }

    /// Returns true if the query is present and not blank.
    pub fn is_active(&self) -> bool {
        self.query.as_deref().is_some_and(|q| !q.trim().is_empty())
    }

    /// Returns the query text when active.
    pub fn active_query(&self) -> Option<&str> {
        self.query.as_deref().filter(|q| !q.trim().is_empty())
    }
}

/// Zero-based page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCriteria {
    /// Page number, starting at 0.
    #[serde(default)]
    pub number: u32,
    /// Rows per page.
    #[serde(default = "default_page_size")]
    pub size: u32,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for PageCriteria {
    fn default() -> Self {
        Self {
            number: 0,
            size: default_page_size(),
        }
    }
}

impl PageCriteria {
    /// Creates a page window.
    pub fn new(number: u32, size: u32) -> Self {
        Self { number, size }
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.number) * u64::from(self.size)
    }
}

/// The aggregate search request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    #[serde(default, deserialize_with = "null_as_default")]
    filters: Vec<FilterCriteria>,
    #[serde(default, deserialize_with = "null_as_default")]
    sorts: Vec<SortCriteria>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    full_text: Option<FullTextCriteria>,
    #[serde(default, deserialize_with = "null_as_default")]
    page: PageCriteria,
}

impl SearchCriteria {
    /// Creates criteria from optional parts, substituting defaults for absent ones.
    pub fn new(
        filters: Option<Vec<FilterCriteria>>,
        sorts: Option<Vec<SortCriteria>>,
        full_text: Option<FullTextCriteria>,
        page: Option<PageCriteria>,
    ) -> Self {
        Self {
            filters: filters.unwrap_or_default(),
            sorts: sorts.unwrap_or_default(),
            full_text,
            page: page.unwrap_or_default(),
        }
    }

    /// Adds a filter.
    pub fn with_filter(mut self, filter: FilterCriteria) -> Self {
        self.filters.push(filter);
        self
    }

    /// Adds a sort.
    pub fn with_sort(mut self, sort: SortCriteria) -> Self {
        self.sorts.push(sort);
        self
    }

    /// Sets the full-text query.
    pub fn with_full_text(mut self, query: impl Into<String>) -> Self {
        self.full_text = Some(FullTextCriteria::new(query));
        self
    }

    /// Sets the page window.
    pub fn with_page(mut self, number: u32, size: u32) -> Self {
        self.page = PageCriteria::new(number, size);
        self
    }

    /// Returns the filters.
    pub fn filters(&self) -> &[FilterCriteria] {
        &self.filters
    }

    /// Returns mutable access to the filters.
    pub fn filters_mut(&mut self) -> &mut Vec<FilterCriteria> {
        &mut self.filters
    }

    /// Returns the sorts.
    pub fn sorts(&self) -> &[SortCriteria] {
        &self.sorts
    }

    /// Returns the full-text criterion, if any.
    pub fn full_text(&self) -> Option<&FullTextCriteria> {
        self.full_text.as_ref()
    }

    /// Returns the page window.
    pub fn page(&self) -> PageCriteria {
        self.page
    }

    /// Returns true if an active full-text query is present.
    pub fn has_full_text_search(&self) -> bool {
        self.full_text.as_ref().is_some_and(|ft| ft.is_active())
    }
}
