use std::fs::File;
use std::hint::black_box;
use std::io::{BufWriter, Write};
use std::path::Path;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use supermarket_eda::analysis::discounts::{mean_discount_by_brand, mean_discount_by_category};
use supermarket_eda::analysis::price_stats::{category_price_stats, price_valid_rows};
use supermarket_eda::analysis::{analyze, load_products};

fn generate_test_csv(path: &Path, rows: usize) {
    let mut file = BufWriter::new(File::create(path).unwrap());
    writeln!(file, "Titulo,Marca,Preco_Normal,Desconto,Categoria").unwrap();
    for i in 0..rows {
        writeln!(
            file,
            "item {},brand_{},{:.2},{},cat_{}",
            i,
            i % 37,
            (i % 1000) as f64 * 1.5,
            if i % 3 == 0 { i % 50 } else { 0 },
            i % 12
        )
        .unwrap();
    }
}

fn bench_pipeline(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let sizes = [10_000, 100_000, 1_000_000];

    let mut group = c.benchmark_group("pipeline");
    group.sample_size(10);

    for size in sizes {
        let path = dir.path().join(format!("bench_{size}.csv"));
        generate_test_csv(&path, size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("load", size), &path, |b, path| {
            b.iter(|| black_box(load_products(path).unwrap()));
        });

        let (table, _) = load_products(&path).unwrap();

        group.bench_with_input(BenchmarkId::new("price_stats", size), &table, |b, table| {
            b.iter(|| {
                let rows = price_valid_rows(table).unwrap();
                black_box(category_price_stats(table, &rows).unwrap())
            });
        });

        group.bench_with_input(BenchmarkId::new("discounts", size), &table, |b, table| {
            b.iter(|| {
                black_box(mean_discount_by_category(table).unwrap());
                black_box(mean_discount_by_brand(table).unwrap())
            });
        });

        group.bench_with_input(BenchmarkId::new("analyze", size), &table, |b, table| {
            b.iter(|| black_box(analyze(table, Default::default()).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
