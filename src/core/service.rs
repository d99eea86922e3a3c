//! Source traits consumed by the paginators

use crate::core::query::{FetchRequest, KeyRange};
use crate::core::sort::SortSpecification;
use anyhow::Result;
use async_trait::async_trait;
use indexmap::{IndexMap, IndexSet};
use std::hash::Hash;

/// An ordered data source that can be windowed by cursor keys
///
/// The paginators never load a source wholesale; they ask for bounded
/// windows and cheap existence checks. Implementations translate the
/// requests into whatever the backing store understands (an indexed range
/// scan, a `WHERE (name, id) > ($1, $2) ORDER BY ... LIMIT n`, ...).
///
/// Errors are returned to the caller untouched. Retrying is the source's own
/// business.
#[async_trait]
pub trait PageSource<T: Send + Sync>: Send + Sync {
    /// Rows inside `request.range`, in `request.order`, at most `request.limit`
    async fn fetch(&self, sort: &SortSpecification<T>, request: &FetchRequest) -> Result<Vec<T>>;

    /// Whether at least one row lies inside `range`
    async fn exists(&self, sort: &SortSpecification<T>, range: &KeyRange) -> Result<bool>;

    /// Number of rows inside `range`
    async fn count(&self, sort: &SortSpecification<T>, range: &KeyRange) -> Result<usize>;
}

/// A page source whose rows belong to groups, queried per group
///
/// Backs [`BatchPaginator`](crate::paging::BatchPaginator). Every method
/// is a single grouped query: a windowed
/// `ROW_NUMBER() OVER (PARTITION BY parent_id ...)` scan for
/// [`fetch_groups`](Self::fetch_groups), `SELECT DISTINCT parent_id` for
/// [`existing_groups`](Self::existing_groups) and `GROUP BY parent_id` for
/// [`count_groups`](Self::count_groups). None of them should hand back more
/// rows than the page needs.
#[async_trait]
pub trait GroupedPageSource<T: Send + Sync>: PageSource<T> {
    /// Rows inside `request.range`, in `request.order`, keeping at most
    /// `request.per_group_limit` rows of each group
    ///
    /// Rows of different groups stay interleaved in scan order.
    async fn fetch_groups<K, G>(
        &self,
        sort: &SortSpecification<T>,
        request: &FetchRequest,
        group_of: &G,
    ) -> Result<Vec<T>>
    where
        K: Eq + Hash + Send,
        G: Fn(&T) -> K + Sync;

    /// Group keys having at least one row inside `range`, in sort order of
    /// their first row
    async fn existing_groups<K, G>(
        &self,
        sort: &SortSpecification<T>,
        range: &KeyRange,
        group_of: &G,
    ) -> Result<IndexSet<K>>
    where
        K: Eq + Hash + Send,
        G: Fn(&T) -> K + Sync;

    /// Number of rows per group inside `range`
    async fn count_groups<K, G>(
        &self,
        sort: &SortSpecification<T>,
        range: &KeyRange,
        group_of: &G,
    ) -> Result<IndexMap<K, usize>>
    where
        K: Eq + Hash + Send,
        G: Fn(&T) -> K + Sync;
}
