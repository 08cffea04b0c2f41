//! Encode/decode throughput for the lexical codec
//!
//! Measures flat encoding and decoding of a day of one-minute bars, plus the
//! precision scan on its own since it dominates encode time.

use codec::OriginalLexical;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use types::CandleStickFixed;

/// One day of one-minute bars with two-digit prices
fn minute_bars() -> Vec<CandleStickFixed> {
    (0..1_440)
        .map(|i| {
            let base = 100.0 + (i % 97) as f64 / 100.0;
            CandleStickFixed::new(
                1_700_000_000 + i * 60,
                base,
                base + 0.25,
                base - 0.25,
                base + 0.1,
                1_000.0 + (i % 13) as f64,
            )
        })
        .collect()
}

fn bench_encode(c: &mut Criterion) {
    let bars = minute_bars();
    let codec = OriginalLexical::new("BENCH", "1m");

    let mut group = c.benchmark_group("lexical_encode");
    group.throughput(Throughput::Elements(bars.len() as u64));

    group.bench_function("precision_scan", |b| {
        b.iter(|| black_box(codec.base10_price_digits(black_box(&bars))))
    });

    group.bench_function("binary_data_flat", |b| {
        b.iter(|| black_box(codec.binary_data_flat(black_box(&bars))))
    });

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let bars = minute_bars();
    let bits = match OriginalLexical::new("BENCH", "1m").binary_data_flat(&bars) {
        Ok(bits) => bits,
        Err(e) => panic!("benchmark fixture failed to encode: {e}"),
    };

    let mut group = c.benchmark_group("lexical_decode");
    group.throughput(Throughput::Elements(bars.len() as u64));

    group.bench_function("refined_data_flat", |b| {
        b.iter(|| black_box(OriginalLexical::refined_data_flat(black_box(&bits))))
    });

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
