//! Paging arguments and the key-range queries issued to a page source

use crate::core::cursor::CursorKey;
use crate::core::sort::SortSpecification;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Bound;

/// Relay-style paging arguments
///
/// This structure is usually deserialized straight from the request
/// (`first`, `after`, `last`, `before`). Counts are signed so that negative
/// input reaches validation instead of failing deserialization.
///
/// # Example
/// ```rust,ignore
/// // first page
/// PagingArguments::new().with_first(10)
///
/// // next page
/// PagingArguments::new().with_first(10).with_after(page.end_cursor().unwrap())
///
/// // from JSON
/// PagingArguments::from_json_str(r#"{"last": 5, "before": "czE"}"#)?
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PagingArguments {
    /// Number of items to return from the start of the window
    pub first: Option<i32>,

    /// Cursor after which the window starts (exclusive)
    pub after: Option<String>,

    /// Number of items to return from the end of the window
    pub last: Option<i32>,

    /// Cursor before which the window ends (exclusive)
    pub before: Option<String>,

    /// Also count the whole source
    pub include_total_count: bool,
}

impl PagingArguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_first(mut self, first: i32) -> Self {
        self.first = Some(first);
        self
    }

    pub fn with_after(mut self, cursor: impl Into<String>) -> Self {
        self.after = Some(cursor.into());
        self
    }

    pub fn with_last(mut self, last: i32) -> Self {
        self.last = Some(last);
        self
    }

    pub fn with_before(mut self, cursor: impl Into<String>) -> Self {
        self.before = Some(cursor.into());
        self
    }

    pub fn with_total_count(mut self) -> Self {
        self.include_total_count = true;
        self
    }

    /// Parse arguments from a JSON object
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Direction in which a source is scanned relative to the sort order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Traversal {
    /// In sort order
    #[default]
    Forward,
    /// Against sort order
    Backward,
}

impl Traversal {
    /// Apply the traversal to an ordering computed in sort order
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Traversal::Forward => ordering,
            Traversal::Backward => ordering.reverse(),
        }
    }
}

/// A range of positions in a sort order, bounded by cursor keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    pub lower: Bound<CursorKey>,
    pub upper: Bound<CursorKey>,
}

impl KeyRange {
    /// The whole source
    pub fn full() -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
        }
    }

    /// Positions strictly between `after` and `before`
    pub fn between(after: Option<CursorKey>, before: Option<CursorKey>) -> Self {
        Self {
            lower: after.map_or(Bound::Unbounded, Bound::Excluded),
            upper: before.map_or(Bound::Unbounded, Bound::Excluded),
        }
    }

    /// Positions up to and including `key`
    pub fn at_or_before(key: CursorKey) -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Included(key),
        }
    }

    /// Positions from `key` onwards, inclusive
    pub fn at_or_after(key: CursorKey) -> Self {
        Self {
            lower: Bound::Included(key),
            upper: Bound::Unbounded,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(
            (&self.lower, &self.upper),
            (Bound::Unbounded, Bound::Unbounded)
        )
    }

    /// Whether `item` lies inside the range under `sort`
    pub fn contains<T>(&self, sort: &SortSpecification<T>, item: &T) -> bool {
        let above_lower = match &self.lower {
            Bound::Unbounded => true,
            Bound::Included(key) => sort.compare_to_key(item, key) != Ordering::Less,
            Bound::Excluded(key) => sort.compare_to_key(item, key) == Ordering::Greater,
        };
        let below_upper = match &self.upper {
            Bound::Unbounded => true,
            Bound::Included(key) => sort.compare_to_key(item, key) != Ordering::Greater,
            Bound::Excluded(key) => sort.compare_to_key(item, key) == Ordering::Less,
        };
        above_lower && below_upper
    }
}

impl Default for KeyRange {
    fn default() -> Self {
        Self::full()
    }
}

impl fmt::Display for KeyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (open, lower) = match &self.lower {
            Bound::Unbounded => ('(', "-inf".to_string()),
            Bound::Included(key) => ('[', format_key(key)),
            Bound::Excluded(key) => ('(', format_key(key)),
        };
        let (upper, close) = match &self.upper {
            Bound::Unbounded => ("+inf".to_string(), ')'),
            Bound::Included(key) => (format_key(key), ']'),
            Bound::Excluded(key) => (format_key(key), ')'),
        };
        write!(f, "{}{}, {}{}", open, lower, upper, close)
    }
}

fn format_key(key: &CursorKey) -> String {
    let values: Vec<String> = key.values().iter().map(|v| format!("{:?}", v)).collect();
    format!("<{}>", values.join(", "))
}

/// One fetch against a page source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Rows to consider
    pub range: KeyRange,

    /// Order in which rows must be returned
    pub order: Traversal,

    /// Maximum number of rows to return; `None` returns the whole range
    pub limit: Option<usize>,

    /// Maximum number of rows per group, only honoured by grouped fetches
    pub per_group_limit: Option<usize>,
}

impl FetchRequest {
    /// Every row of `range`, in sort order
    pub fn unbounded(range: KeyRange) -> Self {
        Self {
            range,
            order: Traversal::Forward,
            limit: None,
            per_group_limit: None,
        }
    }

    /// Scan of `range` in `order`, at most `limit` rows
    pub fn new(range: KeyRange, order: Traversal, limit: Option<usize>) -> Self {
        Self {
            range,
            order,
            limit,
            per_group_limit: None,
        }
    }

    /// Keep at most `limit` rows of each group
    pub fn with_per_group_limit(mut self, limit: Option<usize>) -> Self {
        self.per_group_limit = limit;
        self
    }
}
