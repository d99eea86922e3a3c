//! Core module containing the fundamental types and traits of the crate

pub mod cursor;
pub mod error;
pub mod events;
pub mod field;
pub mod page;
pub mod query;
pub mod service;
pub mod sort;

pub use cursor::{CursorCodec, CursorKey, MAX_CURSOR_TOKEN_LEN};
pub use error::{
    ArgumentError, ConfigError, CursorError, ErrorResponse, PagingError, SortError,
};
pub use events::{
    ChannelObserver, QueryDescription, QueryKind, QueryObserver, RecordingObserver,
    TracingObserver,
};
pub use field::{FieldKind, FieldValue};
pub use page::{BatchPage, Page};
pub use query::{FetchRequest, KeyRange, PagingArguments, Traversal};
pub use service::{GroupedPageSource, PageSource};
pub use sort::{
    FieldAccessor, SortDirection, SortField, SortFieldDescription, SortSpecification,
    SortSpecificationBuilder,
};
