//! The uniform paginated result shape.

use serde::{Deserialize, Serialize};

use super::criteria::{PageCriteria, SortCriteria};

/// A page of search results.
///
/// Built by each backend from its native paged result; the page flags are
/// always recomputed from the page window and the total count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult<T> {
    /// The rows of this page.
    pub content: Vec<T>,
    /// Zero-based page number.
    pub page_number: u32,
    /// Requested page size.
    pub page_size: u32,
    /// Total number of matching rows across all pages.
    pub total_elements: u64,
    /// Total number of pages.
    pub total_pages: u64,
    /// The sorts that were applied.
    pub sorts: Vec<SortCriteria>,
    /// True if this is the first page.
    pub first: bool,
    /// True if this is the last page.
    pub last: bool,
    /// True if this page has no rows.
    pub empty: bool,
}

impl<T> SearchResult<T> {
    /// The result of a search that produced nothing at all.
    pub fn empty() -> Self {
        Self {
            content: Vec::new(),
            page_number: 0,
            page_size: 0,
            total_elements: 0,
            total_pages: 0,
            sorts: Vec::new(),
            first: true,
            last: true,
            empty: true,
        }
    }

    /// Builds a result from a page of rows and the total match count.
    pub fn from_page(
        content: Vec<T>,
        page: PageCriteria,
        total_elements: u64,
        sorts: Vec<SortCriteria>,
    ) -> Self {
        let total_pages = if page.size == 0 {
            1
        } else {
            total_elements.div_ceil(u64::from(page.size))
        };
        let empty = content.is_empty();

        Self {
            content,
            page_number: page.number,
            page_size: page.size,
            total_elements,
            total_pages,
            sorts,
            first: page.number == 0,
            last: u64::from(page.number) + 1 >= total_pages,
            empty,
        }
    }

    /// Returns the number of rows in this page.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Returns true if this page has no rows.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Converts the content while keeping the page metadata.
    pub fn map<U, F>(self, f: F) -> SearchResult<U>
    where
        F: FnMut(T) -> U,
    {
        SearchResult {
            content: self.content.into_iter().map(f).collect(),
            page_number: self.page_number,
            page_size: self.page_size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            sorts: self.sorts,
            first: self.first,
            last: self.last,
            empty: self.empty,
        }
    }
}

impl<T> Default for SearchResult<T> {
    fn default() -> Self {
        Self::empty()
    }
}
