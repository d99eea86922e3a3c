//! Argument validation and window shaping shared by both paginators

use crate::config::PagingOptions;
use crate::core::cursor::{CursorCodec, CursorKey};
use crate::core::error::ArgumentError;
use crate::core::query::{FetchRequest, KeyRange, PagingArguments, Traversal};
use crate::core::sort::SortSpecification;

/// Validated, decoded paging arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PageWindow {
    pub first: Option<usize>,
    pub last: Option<usize>,
    pub after: Option<CursorKey>,
    pub before: Option<CursorKey>,
    pub include_total_count: bool,
}

/// Rows of one window after trimming, in ascending order
#[derive(Debug)]
pub(crate) struct Shaped<T> {
    pub items: Vec<T>,
    pub more_after: bool,
    pub more_before: bool,
}

impl PageWindow {
    /// Validate counts against `options` and decode both cursors for `sort`
    pub fn resolve<T>(
        args: &PagingArguments,
        options: &PagingOptions,
        sort: &SortSpecification<T>,
    ) -> Result<Self, ArgumentError> {
        let mut first = check_count("first", args.first, options.max_page_size)?;
        let last = check_count("last", args.last, options.max_page_size)?;

        if first.is_none() && last.is_none() {
            if options.require_paging_boundaries {
                return Err(ArgumentError::MissingBoundary);
            }
            first = options
                .default_page_size
                .map(|size| size.min(options.max_page_size));
        }

        Ok(Self {
            first,
            last,
            after: decode_cursor("after", args.after.as_deref(), sort)?,
            before: decode_cursor("before", args.before.as_deref(), sort)?,
            include_total_count: args.include_total_count || options.include_total_count,
        })
    }

    /// Backward only when `last` drives the window on its own
    pub fn traversal(&self) -> Traversal {
        if self.first.is_none() && self.last.is_some() {
            Traversal::Backward
        } else {
            Traversal::Forward
        }
    }

    /// The count bounding the scan in traversal direction
    pub fn count(&self) -> Option<usize> {
        match self.traversal() {
            Traversal::Forward => self.first,
            Traversal::Backward => self.last,
        }
    }

    /// Rows strictly between `after` and `before`
    pub fn range(&self) -> KeyRange {
        KeyRange::between(self.after.clone(), self.before.clone())
    }

    /// The over-fetching window scan; `None` when the count is zero
    pub fn fetch_request(&self) -> Option<FetchRequest> {
        let limit = match self.count() {
            Some(0) => return None,
            Some(n) => Some(n + 1),
            None => None,
        };

        Some(FetchRequest::new(self.range(), self.traversal(), limit))
    }

    /// Rows at or before `after`: their existence means a previous page
    pub fn previous_probe(&self) -> Option<KeyRange> {
        self.after.clone().map(KeyRange::at_or_before)
    }

    /// Rows at or after `before`: their existence means a next page
    pub fn next_probe(&self) -> Option<KeyRange> {
        self.before.clone().map(KeyRange::at_or_after)
    }

    /// Trim over-fetched rows (given in traversal order) and restore
    /// ascending order
    pub fn shape<T>(&self, mut rows: Vec<T>) -> Shaped<T> {
        let mut more_after = false;
        let mut more_before = false;

        match self.traversal() {
            Traversal::Forward => {
                if let Some(first) = self.first
                    && rows.len() > first
                {
                    rows.truncate(first);
                    more_after = true;
                }
                // first and last together: slice with first, then keep the tail
                if let Some(last) = self.last
                    && rows.len() > last
                {
                    rows.drain(..rows.len() - last);
                    more_before = true;
                }
            }
            Traversal::Backward => {
                if let Some(last) = self.last
                    && rows.len() > last
                {
                    rows.truncate(last);
                    more_before = true;
                }
                rows.reverse();
            }
        }

        Shaped {
            items: rows,
            more_after,
            more_before,
        }
    }
}

fn check_count(
    argument: &'static str,
    value: Option<i32>,
    max: usize,
) -> Result<Option<usize>, ArgumentError> {
    let Some(value) = value else {
        return Ok(None);
    };

    let count =
        usize::try_from(value).map_err(|_| ArgumentError::NegativeCount { argument, value })?;

    if count > max {
        return Err(ArgumentError::CountExceedsMaximum {
            argument,
            value,
            max,
        });
    }

    Ok(Some(count))
}

fn decode_cursor<T>(
    argument: &'static str,
    cursor: Option<&str>,
    sort: &SortSpecification<T>,
) -> Result<Option<CursorKey>, ArgumentError> {
    cursor
        .map(|token| {
            CursorCodec::decode_for(token, sort).map_err(|source| ArgumentError::InvalidCursor {
                argument,
                cursor: token.to_string(),
                source,
            })
        })
        .transpose()
}
