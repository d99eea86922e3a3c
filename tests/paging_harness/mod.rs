//! Shared test harness for paging integration tests
//!
//! Provides a small catalog (`Brand`, `Product`) seeded the same way in every
//! test, the sort orders used across the suites, and page sources that fail
//! or count their calls.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! mod paging_harness;
//! use paging_harness::*;
//! ```

#![allow(dead_code)]

#[macro_use]
pub mod page_source_tests;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use indexmap::{IndexMap, IndexSet};
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};

use keyset_paging::core::field::FieldKind;
use keyset_paging::core::query::{FetchRequest, KeyRange};
use keyset_paging::core::service::{GroupedPageSource, PageSource};
use keyset_paging::core::sort::{SortDirection, SortSpecification};
use keyset_paging::storage::InMemorySource;

pub const BRAND_COUNT: i64 = 100;
pub const PRODUCTS_PER_BRAND: i64 = 100;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub struct Brand {
    pub id: i64,
    pub name: String,
    /// Only even brands have a display name
    pub display_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub brand_id: i64,
}

/// Brands `Brand:0` ..= `Brand:99` with ids 1 ..= 100
pub fn brands() -> Vec<Brand> {
    (0..BRAND_COUNT)
        .map(|i| Brand {
            id: i + 1,
            name: format!("Brand:{}", i),
            display_name: (i % 2 == 0).then(|| format!("BrandDisplay{}", i)),
        })
        .collect()
}

/// Products `Product i-j` of every brand, ids assigned in insertion order
pub fn products() -> Vec<Product> {
    (0..BRAND_COUNT)
        .flat_map(|i| {
            (0..PRODUCTS_PER_BRAND).map(move |j| Product {
                id: i * PRODUCTS_PER_BRAND + j + 1,
                name: format!("Product {}-{}", i, j),
                brand_id: i + 1,
            })
        })
        .collect()
}

pub fn brand_source() -> InMemorySource<Brand> {
    InMemorySource::from_items(brands())
}

/// Products of the given brands only
pub fn product_source(brand_ids: &[i64]) -> InMemorySource<Product> {
    InMemorySource::from_items(
        products()
            .into_iter()
            .filter(|p| brand_ids.contains(&p.brand_id)),
    )
}

// ---------------------------------------------------------------------------
// Sort orders
// ---------------------------------------------------------------------------

/// `ORDER BY name, id`
pub fn brands_by_name() -> SortSpecification<Brand> {
    SortSpecification::builder()
        .ascending("name", FieldKind::String, |b: &Brand| b.name.clone().into())
        .tie_breaker("id", FieldKind::Integer, SortDirection::Ascending, |b: &Brand| {
            b.id.into()
        })
        .build()
        .expect("valid brand sort")
}

/// `ORDER BY display_name DESC, id`, nulls sort lowest
pub fn brands_by_display_name_desc() -> SortSpecification<Brand> {
    SortSpecification::builder()
        .descending("display_name", FieldKind::String, |b: &Brand| {
            b.display_name.clone().into()
        })
        .tie_breaker("id", FieldKind::Integer, SortDirection::Ascending, |b: &Brand| {
            b.id.into()
        })
        .build()
        .expect("valid brand sort")
}

/// `ORDER BY name, id`
pub fn products_by_name() -> SortSpecification<Product> {
    SortSpecification::builder()
        .ascending("name", FieldKind::String, |p: &Product| p.name.clone().into())
        .tie_breaker("id", FieldKind::Integer, SortDirection::Ascending, |p: &Product| {
            p.id.into()
        })
        .build()
        .expect("valid product sort")
}

/// `ORDER BY id`
pub fn products_by_id() -> SortSpecification<Product> {
    SortSpecification::builder()
        .tie_breaker("id", FieldKind::Integer, SortDirection::Ascending, |p: &Product| {
            p.id.into()
        })
        .build()
        .expect("valid product sort")
}

/// All brands in `sort` order, the reference every page is checked against
pub fn sorted_brands(sort: &SortSpecification<Brand>) -> Vec<Brand> {
    let mut all = brands();
    all.sort_by(|a, b| sort.compare(a, b));
    all
}

pub fn ids(items: &[Brand]) -> Vec<i64> {
    items.iter().map(|b| b.id).collect()
}

// ---------------------------------------------------------------------------
// Sources with side effects
// ---------------------------------------------------------------------------

/// A source whose every call fails
pub struct FailingSource;

#[async_trait]
impl<T: Send + Sync> PageSource<T> for FailingSource {
    async fn fetch(&self, _sort: &SortSpecification<T>, _request: &FetchRequest) -> Result<Vec<T>> {
        Err(anyhow!("connection reset"))
    }

    async fn exists(&self, _sort: &SortSpecification<T>, _range: &KeyRange) -> Result<bool> {
        Err(anyhow!("connection reset"))
    }

    async fn count(&self, _sort: &SortSpecification<T>, _range: &KeyRange) -> Result<usize> {
        Err(anyhow!("connection reset"))
    }
}

#[async_trait]
impl<T: Send + Sync> GroupedPageSource<T> for FailingSource {
    async fn fetch_groups<K, G>(
        &self,
        _sort: &SortSpecification<T>,
        _request: &FetchRequest,
        _group_of: &G,
    ) -> Result<Vec<T>>
    where
        K: Eq + Hash + Send,
        G: Fn(&T) -> K + Sync,
    {
        Err(anyhow!("connection reset"))
    }

    async fn existing_groups<K, G>(
        &self,
        _sort: &SortSpecification<T>,
        _range: &KeyRange,
        _group_of: &G,
    ) -> Result<IndexSet<K>>
    where
        K: Eq + Hash + Send,
        G: Fn(&T) -> K + Sync,
    {
        Err(anyhow!("connection reset"))
    }

    async fn count_groups<K, G>(
        &self,
        _sort: &SortSpecification<T>,
        _range: &KeyRange,
        _group_of: &G,
    ) -> Result<IndexMap<K, usize>>
    where
        K: Eq + Hash + Send,
        G: Fn(&T) -> K + Sync,
    {
        Err(anyhow!("connection reset"))
    }
}

/// Wraps an in-memory source and counts the calls reaching it, and the rows
/// it hands back
pub struct CountingSource<T> {
    pub inner: InMemorySource<T>,
    pub fetches: AtomicUsize,
    pub probes: AtomicUsize,
    pub counts: AtomicUsize,
    pub rows: AtomicUsize,
}

impl<T> CountingSource<T> {
    pub fn new(inner: InMemorySource<T>) -> Self {
        Self {
            inner,
            fetches: AtomicUsize::new(0),
            probes: AtomicUsize::new(0),
            counts: AtomicUsize::new(0),
            rows: AtomicUsize::new(0),
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn counts(&self) -> usize {
        self.counts.load(Ordering::SeqCst)
    }

    /// Rows returned by fetches so far
    pub fn rows(&self) -> usize {
        self.rows.load(Ordering::SeqCst)
    }

    fn returned(&self, rows: Result<Vec<T>>) -> Result<Vec<T>> {
        if let Ok(rows) = &rows {
            self.rows.fetch_add(rows.len(), Ordering::SeqCst);
        }
        rows
    }
}

#[async_trait]
impl<T: Clone + Send + Sync> PageSource<T> for CountingSource<T> {
    async fn fetch(&self, sort: &SortSpecification<T>, request: &FetchRequest) -> Result<Vec<T>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.returned(self.inner.fetch(sort, request).await)
    }

    async fn exists(&self, sort: &SortSpecification<T>, range: &KeyRange) -> Result<bool> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.inner.exists(sort, range).await
    }

    async fn count(&self, sort: &SortSpecification<T>, range: &KeyRange) -> Result<usize> {
        self.counts.fetch_add(1, Ordering::SeqCst);
        self.inner.count(sort, range).await
    }
}

#[async_trait]
impl<T: Clone + Send + Sync> GroupedPageSource<T> for CountingSource<T> {
    async fn fetch_groups<K, G>(
        &self,
        sort: &SortSpecification<T>,
        request: &FetchRequest,
        group_of: &G,
    ) -> Result<Vec<T>>
    where
        K: Eq + Hash + Send,
        G: Fn(&T) -> K + Sync,
    {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.returned(self.inner.fetch_groups(sort, request, group_of).await)
    }

    async fn existing_groups<K, G>(
        &self,
        sort: &SortSpecification<T>,
        range: &KeyRange,
        group_of: &G,
    ) -> Result<IndexSet<K>>
    where
        K: Eq + Hash + Send,
        G: Fn(&T) -> K + Sync,
    {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.inner.existing_groups(sort, range, group_of).await
    }

    async fn count_groups<K, G>(
        &self,
        sort: &SortSpecification<T>,
        range: &KeyRange,
        group_of: &G,
    ) -> Result<IndexMap<K, usize>>
    where
        K: Eq + Hash + Send,
        G: Fn(&T) -> K + Sync,
    {
        self.counts.fetch_add(1, Ordering::SeqCst);
        self.inner.count_groups(sort, range, group_of).await
    }
}
