//! Macro-generated test suite for `GroupedPageSource<Brand>` contract validation.
//!
//! The `page_source_tests!` macro generates a test module that validates any
//! `GroupedPageSource<Brand>` seeded with [`brands()`](super::brands) against
//! the contract the paginators rely on.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[macro_use]
//! mod paging_harness;
//!
//! use paging_harness::*;
//! use keyset_paging::storage::InMemorySource;
//!
//! page_source_tests!(InMemorySource::from_items(brands()));
//! ```
//!
//! # Generated Tests
//!
//! - `test_fetch_full_range_in_order`: every row, ascending
//! - `test_fetch_backward_with_limit`: reversed scan stops at the limit
//! - `test_fetch_range_is_exclusive`: rows equal to a bound are left out
//! - `test_exists_is_inclusive`: a probe at a row's own key finds it
//! - `test_count_range`: counts match the reference order
//! - `test_fetch_groups_per_group_limit`: each group stops at its limit
//! - `test_existing_groups_order`: groups in order of their first row
//! - `test_count_groups`: per-group counts over a range

/// Generate a `GroupedPageSource<Brand>` conformance test suite.
///
/// `$factory` must evaluate to a source holding exactly [`brands()`]. It is
/// re-evaluated for each test.
#[macro_export]
macro_rules! page_source_tests {
    ($factory:expr) => {
        mod page_source_contract_tests {
            use super::*;
            use keyset_paging::core::query::{FetchRequest, KeyRange, Traversal};
            use keyset_paging::core::service::{GroupedPageSource, PageSource};

            #[tokio::test]
            async fn test_fetch_full_range_in_order() {
                let source = $factory;
                let sort = brands_by_name();

                let rows = source
                    .fetch(&sort, &FetchRequest::unbounded(KeyRange::full()))
                    .await
                    .unwrap();

                assert_eq!(rows, sorted_brands(&sort));
            }

            #[tokio::test]
            async fn test_fetch_backward_with_limit() {
                let source = $factory;
                let sort = brands_by_name();
                let request = FetchRequest::new(KeyRange::full(), Traversal::Backward, Some(3));

                let rows = source.fetch(&sort, &request).await.unwrap();

                let reference = sorted_brands(&sort);
                let expected: Vec<Brand> = reference.iter().rev().take(3).cloned().collect();
                assert_eq!(rows, expected);
            }

            #[tokio::test]
            async fn test_fetch_range_is_exclusive() {
                let source = $factory;
                let sort = brands_by_name();
                let reference = sorted_brands(&sort);
                let range = KeyRange::between(
                    Some(sort.key_of(&reference[10])),
                    Some(sort.key_of(&reference[15])),
                );

                let rows = source
                    .fetch(&sort, &FetchRequest::unbounded(range))
                    .await
                    .unwrap();

                assert_eq!(rows, reference[11..15].to_vec());
            }

            #[tokio::test]
            async fn test_exists_is_inclusive() {
                let source = $factory;
                let sort = brands_by_name();
                let reference = sorted_brands(&sort);
                let last = reference.last().unwrap();

                assert!(source
                    .exists(&sort, &KeyRange::at_or_after(sort.key_of(last)))
                    .await
                    .unwrap());
                assert!(!source
                    .exists(&sort, &KeyRange::between(Some(sort.key_of(last)), None))
                    .await
                    .unwrap());
            }

            #[tokio::test]
            async fn test_count_range() {
                let source = $factory;
                let sort = brands_by_name();
                let reference = sorted_brands(&sort);

                assert_eq!(
                    source.count(&sort, &KeyRange::full()).await.unwrap(),
                    BRAND_COUNT as usize
                );
                assert_eq!(
                    source
                        .count(&sort, &KeyRange::at_or_before(sort.key_of(&reference[9])))
                        .await
                        .unwrap(),
                    10
                );
            }

            #[tokio::test]
            async fn test_fetch_groups_per_group_limit() {
                let source = $factory;
                let sort = brands_by_name();
                let reference = sorted_brands(&sort);
                let request = FetchRequest::unbounded(KeyRange::full()).with_per_group_limit(Some(2));

                let rows = source
                    .fetch_groups(&sort, &request, &|b: &Brand| b.display_name.is_some())
                    .await
                    .unwrap();

                // two brands with a display name, two without, in sort order
                let mut expected: Vec<Brand> = reference
                    .iter()
                    .filter(|b| b.display_name.is_some())
                    .take(2)
                    .chain(reference.iter().filter(|b| b.display_name.is_none()).take(2))
                    .cloned()
                    .collect();
                expected.sort_by(|a, b| sort.compare(a, b));
                assert_eq!(rows, expected);
            }

            #[tokio::test]
            async fn test_existing_groups_order() {
                let source = $factory;
                let sort = brands_by_name();

                let groups = source
                    .existing_groups(&sort, &KeyRange::full(), &|b: &Brand| b.display_name.is_some())
                    .await
                    .unwrap();

                // Brand:0 sorts first and has a display name
                assert_eq!(groups.into_iter().collect::<Vec<_>>(), vec![true, false]);
            }

            #[tokio::test]
            async fn test_count_groups() {
                let source = $factory;
                let sort = brands_by_name();

                let counts = source
                    .count_groups(&sort, &KeyRange::full(), &|b: &Brand| b.id % 4)
                    .await
                    .unwrap();

                assert_eq!(counts.len(), 4);
                assert!(counts.values().all(|count| *count == 25));
            }
        }
    };
}
