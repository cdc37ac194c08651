use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::io::Cursor;
use xlsxstream::{encode_row, FixedAssets, Row, WriterOptions, XlsxWriter};

fn make_rows(count: usize, width: usize) -> Vec<Row> {
    (0..count)
        .map(|i| {
            (0..width)
                .map(|c| match c % 3 {
                    0 => i.to_string(),
                    1 => format!("Name_{i}"),
                    _ => format!("value <{}> & more", i * 100 + c),
                })
                .collect()
        })
        .collect()
}

fn memory_writer(workers: usize) -> XlsxWriter<Cursor<Vec<u8>>> {
    XlsxWriter::with_options(
        Cursor::new(Vec::new()),
        &FixedAssets::standard(),
        WriterOptions::with_workers(workers),
    )
    .unwrap()
}

fn benchmark_encode_row(c: &mut Criterion) {
    let row = make_rows(1, 200).remove(0);
    c.bench_function("encode_row_200_cells", |b| {
        b.iter(|| encode_row(black_box(12_345), black_box(&row)).unwrap())
    });
}

fn benchmark_sequential(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_write");
    group.sample_size(10);

    for size in [1_000, 10_000].iter() {
        let rows = make_rows(*size, 20);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &rows, |b, rows| {
            b.iter(|| {
                let mut writer = memory_writer(1);
                for row in rows {
                    writer.write_row(row).unwrap();
                }
                writer.close().unwrap()
            });
        });
    }

    group.finish();
}

fn benchmark_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_write");
    group.sample_size(10);

    let rows = make_rows(10_000, 20);
    group.throughput(Throughput::Elements(rows.len() as u64));
    for workers in [1, 2, 4, num_cpus::get()].iter() {
        group.bench_with_input(BenchmarkId::new("workers", workers), workers, |b, &workers| {
            b.iter(|| {
                let mut writer = memory_writer(workers);
                writer.write_rows(rows.clone()).unwrap();
                writer.close().unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_encode_row,
    benchmark_sequential,
    benchmark_pipeline
);
criterion_main!(benches);
