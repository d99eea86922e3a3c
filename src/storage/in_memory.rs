//! In-memory implementation of PageSource for testing and development

use crate::core::query::{FetchRequest, KeyRange, Traversal};
use crate::core::service::{GroupedPageSource, PageSource};
use crate::core::sort::SortSpecification;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

/// In-memory page source
///
/// Rows are kept in insertion order and sorted on every fetch. Useful for
/// testing and development. Uses RwLock for thread-safe access.
#[derive(Clone)]
pub struct InMemorySource<T> {
    rows: Arc<RwLock<Vec<T>>>,
}

impl<T> InMemorySource<T> {
    /// Create an empty in-memory source
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn from_items(items: impl IntoIterator<Item = T>) -> Self {
        Self {
            rows: Arc::new(RwLock::new(items.into_iter().collect())),
        }
    }

    pub fn insert(&self, item: T) -> Result<()> {
        let mut rows = self
            .rows
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        rows.push(item);

        Ok(())
    }

    pub fn extend(&self, items: impl IntoIterator<Item = T>) -> Result<()> {
        let mut rows = self
            .rows
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        rows.extend(items);

        Ok(())
    }

    pub fn len(&self) -> Result<usize> {
        let rows = self
            .rows
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(rows.len())
    }
}

impl<T> Default for InMemorySource<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> PageSource<T> for InMemorySource<T>
where
    T: Clone + Send + Sync,
{
    async fn fetch(&self, sort: &SortSpecification<T>, request: &FetchRequest) -> Result<Vec<T>> {
        let rows = self
            .rows
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        let limit = request.limit.unwrap_or(usize::MAX);
        Ok(scan(&rows, sort, &request.range, request.order)
            .into_iter()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn exists(&self, sort: &SortSpecification<T>, range: &KeyRange) -> Result<bool> {
        let rows = self
            .rows
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(rows.iter().any(|row| range.contains(sort, row)))
    }

    async fn count(&self, sort: &SortSpecification<T>, range: &KeyRange) -> Result<usize> {
        let rows = self
            .rows
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(rows.iter().filter(|row| range.contains(sort, row)).count())
    }
}

#[async_trait]
impl<T> GroupedPageSource<T> for InMemorySource<T>
where
    T: Clone + Send + Sync,
{
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
        let rows = self
            .rows
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        let limit = request.limit.unwrap_or(usize::MAX);
        let mut taken: HashMap<K, usize> = HashMap::new();
        let mut window = Vec::new();
        for row in scan(&rows, sort, &request.range, request.order) {
            if window.len() >= limit {
                break;
            }
            let taken = taken.entry(group_of(row)).or_insert(0);
            if request.per_group_limit.is_none_or(|per_group| *taken < per_group) {
                *taken += 1;
                window.push(row.clone());
            }
        }

        Ok(window)
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
        let rows = self
            .rows
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(scan(&rows, sort, range, Traversal::Forward)
            .into_iter()
            .map(group_of)
            .collect())
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
        let rows = self
            .rows
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        let mut counts = IndexMap::new();
        for row in scan(&rows, sort, range, Traversal::Forward) {
            *counts.entry(group_of(row)).or_insert(0) += 1;
        }

        Ok(counts)
    }
}

/// Rows of `range` in `order`, borrowed
fn scan<'a, T>(
    rows: &'a [T],
    sort: &SortSpecification<T>,
    range: &KeyRange,
    order: Traversal,
) -> Vec<&'a T> {
    let mut window: Vec<&T> = rows.iter().filter(|row| range.contains(sort, row)).collect();
    window.sort_by(|a, b| order.apply(sort.compare(a, b)));
    window
}
