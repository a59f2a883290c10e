use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::time::Duration;
use strata_storage::{Compression, FileBackend, KvBackend, MemoryBackend};
use tempfile::TempDir;

// ============================================================================
// Benchmark: Key Resolution & Security Validation
// ============================================================================

fn bench_key_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("key_resolution");

    let temp = TempDir::new().unwrap();
    let rt = tokio::runtime::Runtime::new().unwrap();
    let backend = rt.block_on(async {
        FileBackend::builder().root(temp.path()).create(true).connect().await.unwrap()
    });

    group.bench_function("shallow_key", |b| {
        b.iter(|| {
            black_box(backend.resolve("doc/default/port").unwrap());
        });
    });

    group.bench_function("deep_key", |b| {
        b.iter(|| {
            black_box(backend.resolve("doc/default/a/b/c/d/...0/e").unwrap());
        });
    });

    group.finish();
}

// ============================================================================
// Benchmark: Value I/O
// ============================================================================

fn bench_value_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("value_operations");
    group.measurement_time(Duration::from_secs(10));

    let temp = TempDir::new().unwrap();
    let rt = tokio::runtime::Runtime::new().unwrap();

    let sizes = [("16B", 16), ("1KB", 1024), ("64KB", 64 * 1024)];

    for (name, size) in sizes {
        let value = format!("\"{}\"", "v".repeat(size));
        group.throughput(Throughput::Bytes(u64::try_from(value.len()).unwrap_or(u64::MAX)));

        for (label, compression) in
            [("uncompressed", Compression::None), ("compressed", Compression::Lz4)]
        {
            let backend = rt.block_on(async {
                FileBackend::builder()
                    .root(temp.path().join(label))
                    .compression(compression)
                    .connect()
                    .await
                    .unwrap()
            });
            let key = format!("bench/default/{name}");

            group.bench_with_input(
                BenchmarkId::new(format!("put_{label}"), name),
                &value,
                |b, value| {
                    b.to_async(&rt).iter(|| async {
                        backend.put(&key, value).await.unwrap();
                    });
                },
            );

            group.bench_function(BenchmarkId::new(format!("get_{label}"), name), |b| {
                b.to_async(&rt).iter(|| async {
                    black_box(backend.get(&key).await.unwrap());
                });
            });
        }
    }

    group.finish();
}

// ============================================================================
// Benchmark: Subtree Listing
// ============================================================================

fn bench_subtree(c: &mut Criterion) {
    let mut group = c.benchmark_group("subtree");

    let temp = TempDir::new().unwrap();
    let rt = tokio::runtime::Runtime::new().unwrap();
    let file = rt.block_on(async {
        FileBackend::builder().root(temp.path()).create(true).connect().await.unwrap()
    });
    let memory = MemoryBackend::new();

    rt.block_on(async {
        for i in 0..200 {
            let key = format!("bench/default/servers/...{i}/port");
            file.put(&key, "80").await.unwrap();
            memory.put(&key, "80").await.unwrap();
        }
    });

    group.bench_function("file_list_subtree_200", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(file.list_subtree("bench/default/servers").await.unwrap());
        });
    });

    group.bench_function("memory_list_subtree_200", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(memory.list_subtree("bench/default/servers").await.unwrap());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_key_resolution, bench_value_operations, bench_subtree);

criterion_main!(benches);
