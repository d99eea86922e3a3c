//! # Keyset Paging
//!
//! Cursor-based (keyset) pagination over any ordered data source.
//!
//! ## Features
//!
//! - **Keyset Windows**: Pages are cut by comparing sort keys, never by offset
//! - **Relay Arguments**: `first`/`after`/`last`/`before` with next/previous flags
//! - **Opaque Cursors**: Typed, URL-safe tokens validated against the sort order
//! - **Batch Paging**: One page per group from a single fetch
//! - **Query Observation**: Log or broadcast every query sent to a source
//! - **Configuration-Based**: Page size limits via YAML configuration
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use keyset_paging::prelude::*;
//!
//! #[derive(Clone)]
//! struct Brand {
//!     id: i64,
//!     name: String,
//! }
//!
//! let sort = SortSpecification::builder()
//!     .ascending("name", FieldKind::String, |b: &Brand| b.name.clone().into())
//!     .tie_breaker("id", FieldKind::Integer, SortDirection::Ascending, |b: &Brand| b.id.into())
//!     .build()?;
//!
//! let source = InMemorySource::from_items(brands);
//! let paginator = KeysetPaginator::new(PagingOptions::default());
//!
//! let page = paginator
//!     .paginate(&source, &sort, &PagingArguments::new().with_first(10))
//!     .await?;
//!
//! // next page
//! let args = PagingArguments::new().with_first(10).with_after(page.end_cursor().unwrap());
//! let next = paginator.paginate(&source, &sort, &args).await?;
//! ```

pub mod config;
pub mod core;
pub mod paging;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core Types ===
    pub use crate::core::{
        cursor::{CursorCodec, CursorKey},
        field::{FieldKind, FieldValue},
        page::{BatchPage, Page},
        query::{FetchRequest, KeyRange, PagingArguments, Traversal},
        service::{GroupedPageSource, PageSource},
        sort::{SortDirection, SortSpecification},
    };

    // === Errors ===
    pub use crate::core::error::{ArgumentError, CursorError, PagingError, SortError};

    // === Observation ===
    pub use crate::core::events::{
        ChannelObserver, QueryDescription, QueryKind, QueryObserver, RecordingObserver,
        TracingObserver,
    };

    // === Paginators ===
    pub use crate::paging::{BatchPaginator, KeysetPaginator};

    // === Storage ===
    pub use crate::storage::InMemorySource;

    // === Config ===
    pub use crate::config::PagingOptions;

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use uuid::Uuid;
}
