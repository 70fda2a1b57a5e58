//! Core types of the search engine.
//!
//! - [`FieldType`], [`FilterOperator`], [`FilterDescriptor`] - field metadata
//! - [`SearchCriteria`] and its parts - the request model
//! - [`SearchResult`] - the uniform paginated response
//! - [`FieldValue`] - typed scalars produced by the parser
//!
//! # Building Criteria
//!
//! ```
//! use dynamic_search::types::{
//!     FilterCriteria, FilterOperator, SearchCriteria, SortCriteria,
//! };
//!
//! let criteria = SearchCriteria::default()
//!     .with_filter(FilterCriteria::with_value("name", FilterOperator::Contains, "win"))
//!     .with_filter(FilterCriteria::between("usages", "100", "500"))
//!     .with_sort(SortCriteria::desc("releaseDate"))
//!     .with_page(0, 20);
//!
//! assert_eq!(criteria.filters().len(), 2);
//! assert_eq!(criteria.page().size, 20);
//! ```

mod criteria;
mod field;
mod result;
mod value;

pub use criteria::{
    DEFAULT_PAGE_SIZE, FilterCriteria, FullTextCriteria, PageCriteria, SearchCriteria,
    SortCriteria, SortDirection,
};
pub use field::{FieldType, FilterDescriptor, FilterDescriptorBuilder, FilterOperator};
pub use result::SearchResult;
pub use value::{FieldValue, NumberValue};
