// Copyright 2025 the Stratabase Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for layered lists in `stratabase`.

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use stratabase::{Layer, ObjectId, Stratabase};

const ID: ObjectId = ObjectId::from_u128(0x1157);

fn baseline_list(len: u32) -> Stratabase {
    let strata = Stratabase::new();
    for n in 0..len {
        strata.add_element_into_baseline_list(ID, "Items", n);
    }
    strata
}

fn bench_lists(c: &mut Criterion) {
    let mut group = c.benchmark_group("stratabase/list");

    for len in [16_u32, 256] {
        group.bench_function(BenchmarkId::new("append_at_active_layer", len), |b| {
            b.iter_batched(
                || {
                    let strata = baseline_list(len);
                    let access = strata.list_access::<u32>(ID, "Items");
                    (strata, access)
                },
                |(strata, access)| {
                    black_box(access.add_element_to_baseline(len));
                    (strata, access)
                },
                BatchSize::SmallInput,
            );
        });

        group.bench_function(BenchmarkId::new("first_override_write", len), |b| {
            b.iter_batched(
                || {
                    let strata = baseline_list(len);
                    let access = strata.list_access::<u32>(ID, "Items");
                    (strata, access)
                },
                |(strata, access)| {
                    black_box(access.insert_element_into_override_layer(0, 0, u32::MAX));
                    (strata, access)
                },
                BatchSize::SmallInput,
            );
        });

        group.bench_function(BenchmarkId::new("materialize_from_top", len), |b| {
            let strata = baseline_list(len);
            b.iter(|| black_box(strata.materialized_list::<u32>(Layer::Override(31), ID, "Items")));
        });

        group.bench_function(BenchmarkId::new("cached_read", len), |b| {
            let strata = baseline_list(len);
            let access = strata.list_access::<u32>(ID, "Items");
            b.iter(|| black_box(access.with_elements(|items| items.len())));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_lists);
criterion_main!(benches);
