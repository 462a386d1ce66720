//! Criterion benchmarks for rust_log_facade

use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rust_log_facade::prelude::*;
use rust_log_facade::LevelFilterResolver;

struct NullSink;

impl Sink for NullSink {
    fn accept(&self, entry: &LogEntry) -> Result<()> {
        black_box(entry);
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}

struct NullAsyncSink;

#[async_trait]
impl AsyncSink for NullAsyncSink {
    async fn deliver(&self, entry: &LogEntry, _abort: &SignalListener) -> Result<()> {
        black_box(entry);
        Ok(())
    }

    fn name(&self) -> &str {
        "null_async"
    }
}

// ============================================================================
// Level Resolution Benchmarks
// ============================================================================

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    for filters in [0usize, 10, 100] {
        let mut resolver = LevelFilterResolver::new(LogLevel::Information);
        for i in 0..filters {
            let name = SourceName::new(format!("App.Module{}", i)).unwrap();
            resolver.add_filter(name, LogLevel::Debug).unwrap();
        }
        let source = SourceName::new("App.Module5.Sub.Leaf").unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(filters), &source, |b, source| {
            b.iter(|| black_box(resolver.resolve(source)));
        });
    }

    group.finish();
}

// ============================================================================
// Write Path Benchmarks
// ============================================================================

fn bench_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("write");
    group.throughput(Throughput::Elements(1));

    let factory = LogFactory::builder()
        .min_level(LogLevel::Information)
        .sink(NullSink)
        .build()
        .unwrap();
    let log = factory.create("App.Bench").unwrap();

    group.bench_function("disabled_level", |b| {
        b.iter(|| log.debug(black_box("filtered out")));
    });

    group.bench_function("sync_sink", |b| {
        b.iter(|| log.info(black_box("delivered inline")));
    });

    group.finish();
}

fn bench_enqueue(c: &mut Criterion) {
    let mut group = c.benchmark_group("enqueue");
    group.throughput(Throughput::Elements(1));

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let factory = LogFactory::builder()
        .runtime(runtime.handle().clone())
        .async_sink(NullAsyncSink)
        .build()
        .unwrap();
    let log = factory.create("App.Bench").unwrap();

    group.bench_function("async_sink", |b| {
        b.iter(|| log.info(black_box("queued")));
    });

    group.finish();
    runtime.block_on(factory.shutdown());
}

criterion_group!(benches, bench_resolve, bench_write, bench_enqueue);
criterion_main!(benches);
