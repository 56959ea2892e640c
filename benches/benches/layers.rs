// Copyright 2025 the Stratabase Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for scalar resolution and writes in `stratabase`.

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::sync::Once;

use stratabase::{ErasedValue, Layer, ObjectId, Stratabase};
use stratabase_model::StratabaseBackedModel;

const ID: ObjectId = ObjectId::from_u128(0xbe9c);

fn layered_store(layers: usize) -> Stratabase {
    let strata = Stratabase::new();
    strata.set_baseline_value(ID, "Width", 0.0_f64);
    for layer in 0..layers {
        strata.set_override_value(layer, ID, "Other", layer);
    }
    if let Some(top) = layers.checked_sub(1) {
        strata.set_override_value(top / 2, ID, "Width", 100.0_f64);
    }
    strata
}

fn bench_resolve(c: &mut Criterion) {
    static PRINT_SIZES: Once = Once::new();
    PRINT_SIZES.call_once(|| {
        eprintln!(
            "sizes: Layer={} ObjectId={} ErasedValue={}",
            size_of::<Layer>(),
            size_of::<ObjectId>(),
            size_of::<ErasedValue>(),
        );
    });

    let mut group = c.benchmark_group("stratabase/resolve");

    for layers in [1_usize, 8, 64] {
        let strata = layered_store(layers);

        group.bench_function(BenchmarkId::new("accessor", layers), |b| {
            let access = strata.property_access::<f64>(ID, "Width");
            b.iter(|| black_box(access.get_value()));
        });

        group.bench_function(BenchmarkId::new("scan", layers), |b| {
            b.iter(|| {
                let layer = strata.find_active_layer(ID, "Width");
                black_box(layer.and_then(|l| strata.get_value::<f64>(l, ID, "Width").ok()))
            });
        });

        group.bench_function(BenchmarkId::new("bound_property", layers), |b| {
            let model = StratabaseBackedModel::new(&strata, ID);
            let width = model.generate_property("Width", 0.0_f64);
            b.iter(|| black_box(width.get()));
        });
    }

    group.finish();
}

fn bench_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("stratabase/write");

    group.bench_function("set_override/no_accessor", |b| {
        b.iter_batched(
            || layered_store(8),
            |strata| {
                black_box(strata.set_override_value(7, ID, "Width", 1.0_f64));
                strata
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("set_override/four_accessors", |b| {
        b.iter_batched(
            || {
                let strata = layered_store(8);
                let accessors: Vec<_> = (0..4)
                    .map(|_| strata.property_access::<f64>(ID, "Width"))
                    .collect();
                (strata, accessors)
            },
            |(strata, accessors)| {
                black_box(strata.set_override_value(7, ID, "Width", 1.0_f64));
                (strata, accessors)
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("set_equal/no_op", |b| {
        let strata = layered_store(8);
        let access = strata.property_access::<f64>(ID, "Width");
        b.iter(|| black_box(access.set_baseline_value(0.0)));
    });

    group.bench_function("obliterate_layer", |b| {
        b.iter_batched(
            || {
                let strata = layered_store(8);
                for n in 0..64_u128 {
                    strata.set_override_value(3, ObjectId::from_u128(n), "Width", 1.0_f64);
                }
                strata
            },
            |strata| {
                black_box(strata.obliterate_layer(Layer::Override(3)));
                strata
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_resolve, bench_write);
criterion_main!(benches);
