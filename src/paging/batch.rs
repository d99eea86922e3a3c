//! Grouped keyset pagination over a single fetch

use crate::config::PagingOptions;
use crate::core::error::PagingError;
use crate::core::events::{QueryDescription, QueryObserver};
use crate::core::page::{BatchPage, Page};
use crate::core::query::{FetchRequest, KeyRange, PagingArguments};
use crate::core::service::GroupedPageSource;
use crate::core::sort::SortSpecification;
use crate::paging::window::PageWindow;
use indexmap::{IndexMap, IndexSet};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// Cuts one page per group out of a source spanning many groups
///
/// Typical use is loading the first page of children for a whole list of
/// parents: the source is pre-filtered to those parents and `group_of`
/// returns the parent key of each child.
///
/// Exactly one grouped fetch is issued per call whatever the number of
/// groups, asking the source for at most `count + 1` rows of each group.
/// Cursor flags cost at most one grouped probe per supplied cursor, and
/// totals one grouped count. Queries run one after the other.
#[derive(Clone, Default)]
pub struct BatchPaginator {
    options: PagingOptions,
    observer: Option<Arc<dyn QueryObserver>>,
}

impl BatchPaginator {
    pub fn new(options: PagingOptions) -> Self {
        Self {
            options,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn QueryObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn options(&self) -> &PagingOptions {
        &self.options
    }

    /// Page every group of `source` with the same `args`
    ///
    /// Pages are keyed by `group_of` in order of first appearance in the
    /// fetch, followed by groups that only exist outside the window.
    pub async fn paginate_batch<'s, T, S, K, G>(
        &self,
        source: &S,
        group_of: G,
        sort: &'s SortSpecification<T>,
        args: &PagingArguments,
    ) -> Result<BatchPage<'s, K, T>, PagingError>
    where
        T: Send + Sync,
        S: GroupedPageSource<T>,
        K: Eq + Hash + Send,
        G: Fn(&T) -> K + Send + Sync,
    {
        let window = PageWindow::resolve(args, &self.options, sort).map_err(|err| {
            tracing::warn!(code = err.error_code(), "rejected batch paging arguments: {}", err);
            err
        })?;

        let keep = window.count().map(|n| n + 1);
        let request = FetchRequest::new(window.range(), window.traversal(), None)
            .with_per_group_limit(keep);
        self.observe(|| QueryDescription::fetch(sort, &request, true));
        let rows = source
            .fetch_groups(sort, &request, &group_of)
            .await
            .map_err(PagingError::Fetch)?;

        let fetched = rows.len();
        let partitions = partition(rows, &group_of, keep);
        tracing::trace!(rows = fetched, groups = partitions.len(), "partitioned batch");

        let previous = self
            .existing_groups(source, sort, window.previous_probe(), &group_of)
            .await?;
        let next = self
            .existing_groups(source, sort, window.next_probe(), &group_of)
            .await?;

        let totals = if window.include_total_count {
            let range = KeyRange::full();
            self.observe(|| QueryDescription::count(sort, &range, true));
            Some(
                source
                    .count_groups(sort, &range, &group_of)
                    .await
                    .map_err(PagingError::Fetch)?,
            )
        } else {
            None
        };
        let total_of = |key: &K| totals.as_ref().map(|t| t.get(key).copied().unwrap_or(0));

        let mut pages = BatchPage::with_capacity(partitions.len());
        for (key, rows) in partitions {
            let shaped = window.shape(rows);
            let page = Page::new(
                shaped.items,
                shaped.more_after || next.contains(&key),
                shaped.more_before || previous.contains(&key),
                sort,
            )
            .with_total_count(total_of(&key));
            pages.insert(key, page);
        }

        // groups with rows only beyond the cursors
        for key in previous {
            if !pages.contains_key(&key) {
                let page = Page::new(Vec::new(), next.contains(&key), true, sort)
                    .with_total_count(total_of(&key));
                pages.insert(key, page);
            }
        }
        for key in next {
            if !pages.contains_key(&key) {
                let page = Page::new(Vec::new(), true, false, sort).with_total_count(total_of(&key));
                pages.insert(key, page);
            }
        }

        tracing::debug!(
            traversal = ?window.traversal(),
            first = ?window.first,
            last = ?window.last,
            groups = pages.len(),
            "paginated batch"
        );

        Ok(pages)
    }

    async fn existing_groups<T, S, K, G>(
        &self,
        source: &S,
        sort: &SortSpecification<T>,
        range: Option<KeyRange>,
        group_of: &G,
    ) -> Result<IndexSet<K>, PagingError>
    where
        T: Send + Sync,
        S: GroupedPageSource<T>,
        K: Eq + Hash + Send,
        G: Fn(&T) -> K + Sync,
    {
        let Some(range) = range else {
            return Ok(IndexSet::new());
        };
        self.observe(|| QueryDescription::probe(sort, &range, true));
        source
            .existing_groups(sort, &range, group_of)
            .await
            .map_err(PagingError::Fetch)
    }

    fn observe(&self, describe: impl FnOnce() -> QueryDescription) {
        if let Some(observer) = &self.observer {
            observer.observe(&describe());
        }
    }
}

impl fmt::Debug for BatchPaginator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchPaginator")
            .field("options", &self.options)
            .field("observed", &self.observer.is_some())
            .finish()
    }
}

/// Stable partition of `rows` by group, keeping at most `keep` rows each
///
/// Sources already stop each group at `keep`; extra rows are dropped.
fn partition<T, K, G>(rows: Vec<T>, group_of: &G, keep: Option<usize>) -> IndexMap<K, Vec<T>>
where
    K: Eq + Hash,
    G: Fn(&T) -> K,
{
    let mut partitions: IndexMap<K, Vec<T>> = IndexMap::new();
    for row in rows {
        let bucket = partitions.entry(group_of(&row)).or_default();
        if keep.is_none_or(|keep| bucket.len() < keep) {
            bucket.push(row);
        }
    }
    partitions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cursor::{CursorCodec, CursorKey};
    use crate::core::error::ArgumentError;
    use crate::core::events::{QueryKind, RecordingObserver};
    use crate::core::field::{FieldKind, FieldValue};
    use crate::core::sort::SortDirection;
    use crate::storage::InMemorySource;

    // (group, id)
    type Row = (i64, i64);

    fn by_id() -> SortSpecification<Row> {
        SortSpecification::builder()
            .tie_breaker("id", FieldKind::Integer, SortDirection::Ascending, |r: &Row| {
                r.1.into()
            })
            .build()
            .unwrap()
    }

    fn source() -> InMemorySource<Row> {
        // group g holds ids g*10+1 ..= g*10+5
        InMemorySource::from_items((1..=3).flat_map(|g| (1..=5).map(move |i| (g, g * 10 + i))))
    }

    fn cursor(id: i64) -> String {
        CursorCodec::encode(&CursorKey::new(vec![FieldValue::Integer(id)]))
    }

    #[test]
    fn test_partition_is_stable_and_bounded() {
        let rows = vec![(1, 1), (2, 2), (1, 3), (1, 4), (2, 5)];
        let parts = partition(rows, &|r: &Row| r.0, Some(2));

        assert_eq!(parts.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(parts[&1], vec![(1, 1), (1, 3)]);
        assert_eq!(parts[&2], vec![(2, 2), (2, 5)]);
    }

    #[tokio::test]
    async fn test_first_page_per_group_with_one_fetch() {
        let sort = by_id();
        let observer = Arc::new(RecordingObserver::new());
        let paginator = BatchPaginator::default().with_observer(observer.clone());

        let pages = paginator
            .paginate_batch(&source(), |r: &Row| r.0, &sort, &PagingArguments::new().with_first(2))
            .await
            .unwrap();

        assert_eq!(pages.len(), 3);
        assert_eq!(pages[&2].items(), &[(2, 21), (2, 22)]);
        assert!(pages.values().all(|p| p.has_next_page() && !p.has_previous_page()));

        let queries = observer.queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].kind, QueryKind::Fetch);
        assert!(queries[0].partitioned);
        assert_eq!(queries[0].limit, None);
        assert_eq!(queries[0].per_group_limit, Some(3));
    }

    #[tokio::test]
    async fn test_cursor_excludes_whole_groups() {
        let sort = by_id();
        let args = PagingArguments::new().with_first(2).with_after(cursor(25));

        let pages = BatchPaginator::default()
            .paginate_batch(&source(), |r: &Row| r.0, &sort, &args)
            .await
            .unwrap();

        // group 3 is in the window, groups 1 and 2 only exist before it
        assert_eq!(pages.keys().copied().collect::<Vec<_>>(), vec![3, 1, 2]);
        assert_eq!(pages[&3].items(), &[(3, 31), (3, 32)]);
        assert!(pages[&3].has_next_page());
        assert!(!pages[&3].has_previous_page());
        assert!(pages[&1].is_empty());
        assert!(pages[&1].has_previous_page());
        assert!(!pages[&1].has_next_page());
    }

    #[tokio::test]
    async fn test_totals_per_group() {
        let sort = by_id();
        let args = PagingArguments::new().with_last(1).with_total_count();

        let pages = BatchPaginator::default()
            .paginate_batch(&source(), |r: &Row| r.0, &sort, &args)
            .await
            .unwrap();

        assert_eq!(pages[&1].items(), &[(1, 15)]);
        assert!(pages[&1].has_previous_page());
        assert!(pages.values().all(|p| p.total_count() == Some(5)));
    }

    #[tokio::test]
    async fn test_invalid_cursor_fails_once() {
        let sort = by_id();
        let observer = Arc::new(RecordingObserver::new());
        let paginator = BatchPaginator::default().with_observer(observer.clone());

        let err = paginator
            .paginate_batch(
                &source(),
                |r: &Row| r.0,
                &sort,
                &PagingArguments::new().with_first(2).with_after("@@"),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PagingError::InvalidArguments(ArgumentError::InvalidCursor { argument: "after", .. })
        ));
        assert!(observer.queries().is_empty());
    }
}
