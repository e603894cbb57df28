use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use bistro_core::{CategoryId, MenuItemId};
use bistro_menu::{
    Catalog, CategoryFilter, FilterCriteria, MenuItem, Price, SortDirection, SortKey, StatusFilter,
    apply,
};
use chrono::{Duration, Utc};

/// Demo catalog repeated until it holds `count` items, with varied names,
/// prices, availability and creation times.
fn catalog_of(count: usize) -> Vec<MenuItem> {
    let base = Catalog::demo(Utc::now()).items;
    (0..count)
        .map(|i| {
            let mut item = base[i % base.len()].clone();
            item.id = MenuItemId::new(i as u64 + 1);
            item.name = format!("{} #{}", item.name, count - i);
            item.price = Price::from_cents(100 + ((i * 7919) % 5000) as u64);
            item.is_available = i % 3 != 0;
            item.created_at += Duration::seconds(i as i64);
            item
        })
        .collect()
}

fn bench_sort_keys(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_sort_keys");
    let items = catalog_of(1_000);
    group.throughput(Throughput::Elements(items.len() as u64));

    for key in [SortKey::Name, SortKey::Price, SortKey::Category, SortKey::Created] {
        let criteria = FilterCriteria {
            sort_by: key,
            ..FilterCriteria::default()
        };
        group.bench_with_input(BenchmarkId::new("sort", key), &criteria, |b, criteria| {
            b.iter(|| apply(black_box(&items), black_box(criteria)))
        });
    }

    group.finish();
}

fn bench_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_full_pipeline");

    for size in [100usize, 1_000, 10_000] {
        let items = catalog_of(size);
        let criteria = FilterCriteria {
            search_term: "salad".to_string(),
            category: CategoryFilter::Only(CategoryId::new(5)),
            status: StatusFilter::Available,
            sort_by: SortKey::Price,
            direction: SortDirection::Desc,
        };

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("search_filter_sort", size), &items, |b, items| {
            b.iter(|| apply(black_box(items), black_box(&criteria)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sort_keys, bench_full_pipeline);
criterion_main!(benches);
