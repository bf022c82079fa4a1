//! Benchmarks for label rendering
//!
//! Tests rendering performance for:
//! - Text-only labels with growing line counts
//! - QR payloads across capacity levels
//! - Requests built from host parameter bundles
//!
//! Platform: Cross-platform (no printer required)

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use sensor_codecs::drivers::LabelPrinter;
use sensor_codecs::test_utils::init_test_tracing;
use sensor_codecs::{ParamBundle, ParamValue, PrintRequest, PrinterLayout};
use std::hint::black_box;

fn bench_text_lines(c: &mut Criterion) {
    init_test_tracing();
    let printer = LabelPrinter::new(PrinterLayout::default());
    let mut group = c.benchmark_group("text_lines");

    for lines in [1usize, 8, 64] {
        let request = (0..lines)
            .fold(PrintRequest::new().with_barcode("SAMPLE-0001"), |r, i| {
                r.with_text_line(format!("line {}", i))
            });
        group.bench_with_input(BenchmarkId::from_parameter(lines), &request, |b, request| {
            b.iter(|| black_box(printer.render(request).unwrap()))
        });
    }

    group.finish();
}

fn bench_qr_levels(c: &mut Criterion) {
    let printer = LabelPrinter::new(PrinterLayout::default());
    let mut group = c.benchmark_group("qr_levels");

    for len in [10usize, 500, 3000] {
        let request = PrintRequest::new().with_qr_code("Q".repeat(len));
        group.bench_with_input(BenchmarkId::from_parameter(len), &request, |b, request| {
            b.iter(|| black_box(printer.render(request).unwrap()))
        });
    }

    group.finish();
}

fn bench_from_params(c: &mut Criterion) {
    let lines = (1..=16).fold(ParamBundle::new(), |bundle, i| {
        bundle.with(i.to_string(), ParamValue::Str(format!("text {}", i)))
    });
    let params = ParamBundle::new()
        .with("BARCODE", ParamValue::Str("0042".into()))
        .with("TEXT-STRINGS", ParamValue::Bundle(lines));

    c.bench_function("legacy_bundle_request", |b| {
        b.iter(|| black_box(PrintRequest::from_params(black_box(&params)).unwrap()))
    });
}

criterion_group!(benches, bench_text_lines, bench_qr_levels, bench_from_params);
criterion_main!(benches);
