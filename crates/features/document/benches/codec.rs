use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use serde_json::{Map, Value, json};
use std::hint::black_box;
use strata_document::{DocumentTree, FsTemplateResolver, KeySet, Template, flatten, leaf_values};
use strata_domain::format::OutputFormat;

/// A document with `services` entries, each holding a few fields and a small array.
fn sample(services: usize) -> Value {
    let mut root = Map::new();
    for n in 0..services {
        root.insert(
            format!("service{n}"),
            json!({
                "host": format!("node-{n}.internal"),
                "port": 8000 + n,
                "enabled": n % 2 == 0,
                "weight": 0.25,
                "tags": ["edge", "blue", "canary"],
                "limits": {"rps": 1000, "burst": 50},
            }),
        );
    }
    Value::Object(root)
}

fn leaf_entries(value: &Value) -> Vec<(String, String)> {
    leaf_values(value).unwrap().into_iter().map(|(k, v)| (k.into_string(), v)).collect()
}

// ============================================================================
// Benchmark: Flattening
// ============================================================================

fn bench_flatten(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatten");

    for services in [10, 100, 1000] {
        let template = Template::from_value(sample(services));
        group.throughput(Throughput::Elements(services as u64));
        group.bench_with_input(BenchmarkId::from_parameter(services), &template, |b, template| {
            b.iter(|| black_box(flatten(template, &FsTemplateResolver).unwrap()));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Key Set Serialization
// ============================================================================

fn bench_keyset(c: &mut Criterion) {
    let mut group = c.benchmark_group("keyset");

    let keys = flatten(&Template::from_value(sample(500)), &FsTemplateResolver).unwrap();
    let serialized = keys.serialize();

    group.bench_function("serialize", |b| b.iter(|| black_box(keys.serialize())));
    group.bench_function("parse", |b| b.iter(|| black_box(KeySet::parse(&serialized).unwrap())));

    group.finish();
}

// ============================================================================
// Benchmark: Tree Rebuild & Emission
// ============================================================================

fn bench_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("rebuild");

    for services in [10, 100, 1000] {
        let entries = leaf_entries(&sample(services));
        group.throughput(Throughput::Elements(entries.len() as u64));

        group.bench_with_input(BenchmarkId::new("build", services), &entries, |b, entries| {
            b.iter(|| black_box(DocumentTree::build(entries.iter().cloned()).unwrap()));
        });

        let tree = DocumentTree::build(entries.iter().cloned()).unwrap();
        for format in [OutputFormat::Json, OutputFormat::Yaml] {
            group.bench_with_input(
                BenchmarkId::new(format!("emit_{format}"), services),
                &tree,
                |b, tree| {
                    b.iter(|| {
                        let mut out = Vec::with_capacity(64 * 1024);
                        tree.emit(format, &mut out).unwrap();
                        black_box(out);
                    });
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_flatten, bench_keyset, bench_rebuild);
criterion_main!(benches);
