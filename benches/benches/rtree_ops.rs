// Copyright 2026 the Copse Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core operation benchmarks: build, search, delete, and snapshot churn.

use copse_rtree::{Aabb, RTree};
use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};

fn gen_grid_rects(n: usize, cell: f64) -> Vec<Aabb<f64>> {
    let mut out = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            let x0 = x as f64 * cell;
            let y0 = y as f64 * cell;
            out.push(Aabb::new([x0, y0], [x0 + cell, y0 + cell]));
        }
    }
    out
}

fn build(rects: &[Aabb<f64>]) -> RTree<f64, u32> {
    let mut tree = RTree::new();
    for (i, r) in rects.iter().copied().enumerate() {
        tree.insert(r, i as u32);
    }
    tree
}

fn bench_rtree_ops_f64(c: &mut Criterion) {
    let mut group = c.benchmark_group("rtree_ops_f64");
    for &n in &[64usize, 128] {
        let rects = gen_grid_rects(n, 10.0);
        let query = Aabb::new([100.0, 100.0], [500.0, 500.0]);
        group.throughput(Throughput::Elements((n * n) as u64));

        group.bench_function(format!("build_n{}", n), |b| {
            b.iter_batched(
                || rects.clone(),
                |rects| black_box(build(&rects)),
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("search_n{}", n), |b| {
            let tree = build(&rects);
            b.iter(|| {
                let mut hits = 0usize;
                tree.search(query, |_, _| {
                    hits += 1;
                    true
                });
                black_box(hits);
            })
        });

        group.bench_function(format!("scan_n{}", n), |b| {
            let tree = build(&rects);
            b.iter(|| {
                let mut seen = 0usize;
                tree.scan(|_, _| {
                    seen += 1;
                    true
                });
                black_box(seen);
            })
        });

        group.bench_function(format!("delete_all_n{}", n), |b| {
            b.iter_batched(
                || build(&rects),
                |mut tree| {
                    for (i, r) in rects.iter().copied().enumerate() {
                        tree.delete(r, &(i as u32));
                    }
                    black_box(tree.len());
                },
                BatchSize::SmallInput,
            )
        });

        // Snapshot, then write through the shared structure: measures the
        // lazy path-cloning cost rather than the O(1) snapshot itself.
        group.bench_function(format!("snapshot_churn_n{}", n), |b| {
            b.iter_batched(
                || build(&rects),
                |mut tree| {
                    let snapshot = tree.copy();
                    for (i, r) in rects.iter().copied().enumerate().take(64) {
                        tree.delete(r, &(i as u32));
                    }
                    black_box((tree.len(), snapshot.len()));
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_rtree_ops_f64);
criterion_main!(benches);
