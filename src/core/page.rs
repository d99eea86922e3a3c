//! Pages produced by the paginators

use crate::core::cursor::CursorCodec;
use crate::core::sort::SortSpecification;
use indexmap::IndexMap;
use std::fmt;

/// One window of a sorted source
///
/// Items are always in ascending sort order, whichever direction was used to
/// fetch them. The page borrows the sort specification it was cut with so it
/// can mint cursors for its items.
pub struct Page<'s, T> {
    items: Vec<T>,
    has_next_page: bool,
    has_previous_page: bool,
    total_count: Option<usize>,
    sort: &'s SortSpecification<T>,
}

/// One page per group key, in order of first appearance
pub type BatchPage<'s, K, T> = IndexMap<K, Page<'s, T>>;

impl<'s, T> Page<'s, T> {
    pub fn new(
        items: Vec<T>,
        has_next_page: bool,
        has_previous_page: bool,
        sort: &'s SortSpecification<T>,
    ) -> Self {
        Self {
            items,
            has_next_page,
            has_previous_page,
            total_count: None,
            sort,
        }
    }

    /// A page without items or neighbours
    pub fn empty(sort: &'s SortSpecification<T>) -> Self {
        Self::new(Vec::new(), false, false, sort)
    }

    pub fn with_total_count(mut self, total_count: Option<usize>) -> Self {
        self.total_count = total_count;
        self
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// First item of the page
    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    /// Last item of the page
    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn has_next_page(&self) -> bool {
        self.has_next_page
    }

    pub fn has_previous_page(&self) -> bool {
        self.has_previous_page
    }

    /// Size of the whole source, when it was requested
    pub fn total_count(&self) -> Option<usize> {
        self.total_count
    }

    pub fn sort(&self) -> &'s SortSpecification<T> {
        self.sort
    }

    /// Cursor pointing at `item` under this page's sort order
    pub fn create_cursor(&self, item: &T) -> String {
        CursorCodec::encode(&self.sort.key_of(item))
    }

    pub fn start_cursor(&self) -> Option<String> {
        self.first().map(|item| self.create_cursor(item))
    }

    pub fn end_cursor(&self) -> Option<String> {
        self.last().map(|item| self.create_cursor(item))
    }

    /// Items paired with their cursors
    pub fn edges(&self) -> impl Iterator<Item = (String, &T)> + '_ {
        self.items
            .iter()
            .map(move |item| (self.create_cursor(item), item))
    }
}

impl<'a, 's, T> IntoIterator for &'a Page<'s, T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: fmt::Debug> fmt::Debug for Page<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("items", &self.items)
            .field("has_next_page", &self.has_next_page)
            .field("has_previous_page", &self.has_previous_page)
            .field("total_count", &self.total_count)
            .finish_non_exhaustive()
    }
}
