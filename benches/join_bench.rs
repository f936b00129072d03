// Copyright 2025 Joinkit Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Join execution benchmarks: hash vs. sort vs. nested loop on equi-joins,
//! plus the sort-based asof path and the metric tree.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use joinkit::{by_distance, by_key, by_pred, join_indices, Datum, JoinOptions, Mode, Multi, PredOp, Radius};

fn keys(seed: u64, len: usize, span: i64) -> Vec<i64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(0..span)).collect()
}

fn bench_equi_join_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("equi_join");
    for size in [1_000usize, 10_000] {
        let left = keys(1, size, size as i64 / 4);
        let right = keys(2, size, size as i64 / 4);

        group.bench_with_input(BenchmarkId::new("hash", size), &size, |b, _| {
            b.iter(|| {
                join_indices(
                    black_box(&left),
                    black_box(&right),
                    by_key(|v: &i64| *v),
                    JoinOptions::inner().with_mode(Mode::Hash),
                )
                .unwrap()
            })
        });

        group.bench_with_input(BenchmarkId::new("sort", size), &size, |b, _| {
            b.iter(|| {
                join_indices(
                    black_box(&left),
                    black_box(&right),
                    by_key(|v: &i64| *v),
                    JoinOptions::inner().with_mode(Mode::Sort),
                )
                .unwrap()
            })
        });
    }

    // Nested loop only at a size it can stomach
    let left = keys(3, 1_000, 250);
    let right = keys(4, 1_000, 250);
    group.bench_function("nested_loop/1000", |b| {
        b.iter(|| {
            join_indices(
                black_box(&left),
                black_box(&right),
                by_key(|v: &i64| *v),
                JoinOptions::inner().with_mode(Mode::NestedLoop),
            )
            .unwrap()
        })
    });

    group.finish();
}

fn bench_asof_join(c: &mut Criterion) {
    let left = keys(5, 10_000, 1_000_000);
    let right = keys(6, 10_000, 1_000_000);

    c.bench_function("asof/sort_closest/10000", |b| {
        b.iter(|| {
            join_indices(
                black_box(&left),
                black_box(&right),
                by_pred(|v: &i64| *v, PredOp::Lt, |v: &i64| *v),
                JoinOptions::inner().with_multi(Multi::Closest),
            )
            .unwrap()
        })
    });
}

fn bench_distance_join(c: &mut Criterion) {
    let left = keys(7, 2_000, 100_000);
    let right = keys(8, 2_000, 100_000);

    c.bench_function("distance/tree/2000", |b| {
        b.iter(|| {
            join_indices(
                black_box(&left),
                black_box(&right),
                by_distance(
                    |v: &i64| *v,
                    |a: &Datum, b: &Datum| (a.as_f64().unwrap() - b.as_f64().unwrap()).abs(),
                    Radius::at_most(50.0),
                ),
                JoinOptions::inner(),
            )
            .unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_equi_join_modes,
    bench_asof_join,
    bench_distance_join
);
criterion_main!(benches);
