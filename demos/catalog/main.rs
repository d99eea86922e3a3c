//! Catalog example demonstrating single-page and batch keyset paging
//!
//! Run with `RUST_LOG=keyset_paging=debug` to see every query the paginators
//! send to the source.

use keyset_paging::prelude::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct Brand {
    id: i64,
    name: String,
}

#[derive(Debug, Clone)]
struct Product {
    id: i64,
    name: String,
    brand_id: i64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("🚀 Keyset Paging Catalog Example\n");

    let brands = InMemorySource::from_items((0..100).map(|i| Brand {
        id: i + 1,
        name: format!("Brand:{}", i),
    }));
    let products = InMemorySource::from_items((0..3).flat_map(|i| {
        (0..10).map(move |j| Product {
            id: i * 10 + j + 1,
            name: format!("Product {}-{}", i, j),
            brand_id: i + 1,
        })
    }));

    let brand_sort = SortSpecification::builder()
        .ascending("name", FieldKind::String, |b: &Brand| b.name.clone().into())
        .tie_breaker("id", FieldKind::Integer, SortDirection::Ascending, |b: &Brand| {
            b.id.into()
        })
        .build()?;
    let product_sort = SortSpecification::builder()
        .ascending("name", FieldKind::String, |p: &Product| p.name.clone().into())
        .tie_breaker("id", FieldKind::Integer, SortDirection::Ascending, |p: &Product| {
            p.id.into()
        })
        .build()?;

    let observer = Arc::new(ChannelObserver::new(64));
    let mut queries = observer.subscribe();

    let options = PagingOptions::from_yaml_str("max_page_size: 20\ninclude_total_count: true\n")?;
    let paginator = KeysetPaginator::new(options.clone()).with_observer(observer.clone());

    println!("📋 Paging brands forward...\n");

    let mut args = PagingArguments::new().with_first(5);
    for _ in 0..3 {
        let page = paginator.paginate(&brands, &brand_sort, &args).await?;
        let names: Vec<&str> = page.iter().map(|b| b.name.as_str()).collect();
        println!(
            "  {:?} (next: {}, previous: {}, total: {:?})",
            names,
            page.has_next_page(),
            page.has_previous_page(),
            page.total_count()
        );

        let Some(end) = page.end_cursor() else { break };
        args = PagingArguments::new().with_first(5).with_after(end);
    }

    println!("\n📋 Last page...\n");

    let page = paginator
        .paginate(&brands, &brand_sort, &PagingArguments::new().with_last(3))
        .await?;
    for (cursor, brand) in page.edges() {
        println!("  {} -> {}", cursor, brand.name);
    }

    println!("\n📋 First two products of every brand...\n");

    let batch = BatchPaginator::new(options).with_observer(observer.clone());
    let pages = batch
        .paginate_batch(
            &products,
            |p: &Product| p.brand_id,
            &product_sort,
            &PagingArguments::new().with_first(2),
        )
        .await?;
    for (brand_id, page) in &pages {
        let names: Vec<&str> = page.iter().map(|p| p.name.as_str()).collect();
        println!("  brand {}: {:?} (next: {})", brand_id, names, page.has_next_page());
    }

    println!("\n📋 Rejected arguments...\n");

    match paginator
        .paginate(&brands, &brand_sort, &PagingArguments::new().with_first(5).with_after("oops"))
        .await
    {
        Ok(_) => println!("  unexpectedly accepted"),
        Err(e) => println!("  {}", serde_json::to_string(&e.to_response())?),
    }

    println!("\n🔎 Queries sent to the sources:\n");

    while let Ok(query) = queries.try_recv() {
        println!("  {}", query);
    }

    Ok(())
}
