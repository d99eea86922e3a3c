//! Query observation
//!
//! Before every fetch, existence probe and count, the paginators hand a
//! [`QueryDescription`] to an optional [`QueryObserver`]. Observers see the
//! logical query (sort, bounds, order, limit) but cannot change it, and their
//! outcome never feeds back into the page.
//!
//! # Architecture
//!
//! ```text
//! KeysetPaginator ──┐
//!                   ├──▶ QueryObserver::observe() ──▶ TracingObserver   (log)
//! BatchPaginator  ──┘                             ──▶ RecordingObserver (capture)
//!                                                 ──▶ ChannelObserver   (broadcast)
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! let observer = Arc::new(ChannelObserver::new(256));
//! let mut rx = observer.subscribe();
//!
//! let paginator = KeysetPaginator::default().with_observer(observer);
//! paginator.paginate(&source, &sort, &args).await?;
//!
//! if let Ok(query) = rx.recv().await {
//!     println!("{}", query);
//! }
//! ```

use crate::core::cursor::CursorKey;
use crate::core::query::{FetchRequest, KeyRange, Traversal};
use crate::core::sort::{SortFieldDescription, SortSpecification};
use serde::Serialize;
use std::fmt;
use std::ops::Bound;
use std::sync::Mutex;
use tokio::sync::broadcast;

/// What a described query asks the source for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    /// Rows of a window
    Fetch,
    /// Whether any row exists in a range
    Probe,
    /// Number of rows in a range
    Count,
}

/// Logical description of one query issued to a page source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryDescription {
    pub kind: QueryKind,
    pub sort: Vec<SortFieldDescription>,
    pub lower: Bound<CursorKey>,
    pub upper: Bound<CursorKey>,
    /// Scan order, only meaningful for fetches
    pub order: Option<Traversal>,
    pub limit: Option<usize>,
    /// Rows kept per group by a grouped fetch
    pub per_group_limit: Option<usize>,
    /// Whether the query is evaluated per group key
    pub partitioned: bool,
}

impl QueryDescription {
    pub fn fetch<T>(sort: &SortSpecification<T>, request: &FetchRequest, partitioned: bool) -> Self {
        Self {
            kind: QueryKind::Fetch,
            sort: sort.describe(),
            lower: request.range.lower.clone(),
            upper: request.range.upper.clone(),
            order: Some(request.order),
            limit: request.limit,
            per_group_limit: request.per_group_limit,
            partitioned,
        }
    }

    pub fn probe<T>(sort: &SortSpecification<T>, range: &KeyRange, partitioned: bool) -> Self {
        Self::over_range(QueryKind::Probe, sort, range, partitioned)
    }

    pub fn count<T>(sort: &SortSpecification<T>, range: &KeyRange, partitioned: bool) -> Self {
        Self::over_range(QueryKind::Count, sort, range, partitioned)
    }

    fn over_range<T>(
        kind: QueryKind,
        sort: &SortSpecification<T>,
        range: &KeyRange,
        partitioned: bool,
    ) -> Self {
        Self {
            kind,
            sort: sort.describe(),
            lower: range.lower.clone(),
            upper: range.upper.clone(),
            order: None,
            limit: None,
            per_group_limit: None,
            partitioned,
        }
    }

    pub fn range(&self) -> KeyRange {
        KeyRange {
            lower: self.lower.clone(),
            upper: self.upper.clone(),
        }
    }
}

impl fmt::Display for QueryDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            QueryKind::Fetch => "FETCH",
            QueryKind::Probe => "PROBE",
            QueryKind::Count => "COUNT",
        };
        let sort: Vec<String> = self.sort.iter().map(ToString::to_string).collect();
        write!(f, "{} {} ORDER BY {}", kind, self.range(), sort.join(", "))?;
        if self.order == Some(Traversal::Backward) {
            f.write_str(" REVERSED")?;
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {}", limit)?;
        }
        if let Some(limit) = self.per_group_limit {
            write!(f, " LIMIT {} PER GROUP", limit)?;
        }
        if self.partitioned {
            f.write_str(" PARTITIONED")?;
        }
        Ok(())
    }
}

/// Observer notified before each query reaches the source
///
/// Implementations must return quickly and must not panic; they run inline
/// on the paging call.
pub trait QueryObserver: Send + Sync {
    fn observe(&self, query: &QueryDescription);
}

/// Logs every query as a `tracing` debug event
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl QueryObserver for TracingObserver {
    fn observe(&self, query: &QueryDescription) {
        tracing::debug!(
            kind = ?query.kind,
            limit = ?query.limit,
            per_group_limit = ?query.per_group_limit,
            partitioned = query.partitioned,
            "paging query: {}",
            query
        );
    }
}

/// Keeps every observed query in memory
#[derive(Debug, Default)]
pub struct RecordingObserver {
    queries: Mutex<Vec<QueryDescription>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded queries, oldest first
    pub fn queries(&self) -> Vec<QueryDescription> {
        self.queries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Recorded queries of one kind
    pub fn queries_of(&self, kind: QueryKind) -> Vec<QueryDescription> {
        self.queries()
            .into_iter()
            .filter(|q| q.kind == kind)
            .collect()
    }

    pub fn clear(&self) {
        self.queries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

impl QueryObserver for RecordingObserver {
    fn observe(&self, query: &QueryDescription) {
        self.queries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(query.clone());
    }
}

/// Publishes observed queries on a broadcast channel
///
/// Publishing never blocks and never fails. Without subscribers the query is
/// dropped; slow subscribers receive `Lagged` on their next `recv()`.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    sender: broadcast::Sender<QueryDescription>,
}

impl ChannelObserver {
    /// Create an observer whose channel buffers `capacity` queries
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueryDescription> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl QueryObserver for ChannelObserver {
    fn observe(&self, query: &QueryDescription) {
        // Err only means nobody is listening
        let _ = self.sender.send(query.clone());
    }
}
