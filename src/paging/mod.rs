//! Paginators turning paging arguments into pages
//!
//! [`KeysetPaginator`] cuts a single page out of one source.
//! [`BatchPaginator`] cuts one page per group out of a source spanning many
//! groups with a single fetch.

pub mod batch;
pub mod keyset;
mod window;

pub use batch::BatchPaginator;
pub use keyset::KeysetPaginator;
