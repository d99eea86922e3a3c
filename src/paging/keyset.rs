//! Single-source keyset pagination

use crate::config::PagingOptions;
use crate::core::error::PagingError;
use crate::core::events::{QueryDescription, QueryObserver};
use crate::core::page::Page;
use crate::core::query::{KeyRange, PagingArguments, Traversal};
use crate::core::service::PageSource;
use crate::core::sort::SortSpecification;
use crate::paging::window::PageWindow;
use std::fmt;
use std::sync::Arc;

/// Cuts one page out of a sorted source
///
/// The paginator holds no per-call state; one instance can serve any number
/// of concurrent calls.
#[derive(Clone, Default)]
pub struct KeysetPaginator {
    options: PagingOptions,
    observer: Option<Arc<dyn QueryObserver>>,
}

impl KeysetPaginator {
    pub fn new(options: PagingOptions) -> Self {
        Self {
            options,
            observer: None,
        }
    }

    /// Notify `observer` before every query issued to a source
    pub fn with_observer(mut self, observer: Arc<dyn QueryObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn options(&self) -> &PagingOptions {
        &self.options
    }

    /// Fetch the page of `source` described by `args` under `sort`
    ///
    /// At most one fetch is issued, bounded by the requested count plus one.
    /// Cursor-side flags come from existence probes that run concurrently
    /// with the fetch.
    pub async fn paginate<'s, T, S>(
        &self,
        source: &S,
        sort: &'s SortSpecification<T>,
        args: &PagingArguments,
    ) -> Result<Page<'s, T>, PagingError>
    where
        T: Send + Sync,
        S: PageSource<T>,
    {
        let window = PageWindow::resolve(args, &self.options, sort).map_err(|err| {
            tracing::warn!(code = err.error_code(), "rejected paging arguments: {}", err);
            err
        })?;

        let traversal = window.traversal();
        let empty_window = window.count() == Some(0);

        let fetch = async {
            match window.fetch_request() {
                Some(request) => {
                    self.observe(|| QueryDescription::fetch(sort, &request, false));
                    source.fetch(sort, &request).await
                }
                None => Ok(Vec::new()),
            }
        };
        let in_window = self.probe(source, sort, empty_window.then(|| window.range()));
        let previous = self.probe(source, sort, window.previous_probe());
        let next = self.probe(source, sort, window.next_probe());
        let total = async {
            if !window.include_total_count {
                return Ok(None);
            }
            let range = KeyRange::full();
            self.observe(|| QueryDescription::count(sort, &range, false));
            source.count(sort, &range).await.map(Some)
        };

        let (rows, in_window, previous, next, total_count) =
            futures::try_join!(fetch, in_window, previous, next, total)
                .map_err(PagingError::Fetch)?;

        let shaped = window.shape(rows);
        let has_next_page =
            shaped.more_after || next || (in_window && traversal == Traversal::Forward);
        let has_previous_page =
            shaped.more_before || previous || (in_window && traversal == Traversal::Backward);

        tracing::debug!(
            traversal = ?traversal,
            first = ?window.first,
            last = ?window.last,
            items = shaped.items.len(),
            has_next_page,
            has_previous_page,
            "paginated window"
        );

        Ok(Page::new(shaped.items, has_next_page, has_previous_page, sort)
            .with_total_count(total_count))
    }

    async fn probe<T, S>(
        &self,
        source: &S,
        sort: &SortSpecification<T>,
        range: Option<KeyRange>,
    ) -> anyhow::Result<bool>
    where
        T: Send + Sync,
        S: PageSource<T>,
    {
        let Some(range) = range else {
            return Ok(false);
        };
        self.observe(|| QueryDescription::probe(sort, &range, false));
        source.exists(sort, &range).await
    }

    fn observe(&self, describe: impl FnOnce() -> QueryDescription) {
        if let Some(observer) = &self.observer {
            observer.observe(&describe());
        }
    }
}

impl fmt::Debug for KeysetPaginator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeysetPaginator")
            .field("options", &self.options)
            .field("observed", &self.observer.is_some())
            .finish()
    }
}
