use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use toon_condense::heuristics::Heuristics;
use toon_condense::shaper::ShaperConfig;

fn pods_json(n: usize) -> Vec<u8> {
    let mut rows = Vec::with_capacity(n);
    for i in 0..n {
        rows.push(format!(
            r#"{{"metadata":{{"name":"pod-{i}","namespace":"default"}},"spec":{{"containers":[{{"image":"nginx:1.25"}}]}},"status":{{"phase":"Running"}}}}"#
        ));
    }
    format!(r#"{{"pods":[{}]}}"#, rows.join(",")).into_bytes()
}

fn bench_condense_text(c: &mut Criterion) {
    let small = pods_json(50);
    let large = pods_json(2_000);
    let cfg = ShaperConfig::default();

    let mut group = c.benchmark_group("condense_text");
    group.bench_function("pods_50", |b| {
        b.iter_batched(
            || small.clone(),
            |raw| toon_condense::condense_text(&raw, "list_pods", &cfg),
            BatchSize::SmallInput,
        )
    });
    group.bench_function("pods_2000", |b| {
        b.iter_batched(
            || large.clone(),
            |raw| toon_condense::condense_text(&raw, "list_pods", &cfg),
            BatchSize::LargeInput,
        )
    });
    group.finish();
}

fn bench_condense_value(c: &mut Criterion) {
    let raw = pods_json(500);
    let tree = toon_condense::parsers::parse(&String::from_utf8(raw).unwrap(), Some("json"))
        .expect("parse");
    let heuristics = Heuristics::default();

    c.bench_function("condense_value_pods_500", |b| {
        b.iter(|| toon_condense::condense_value(&tree, &heuristics))
    });
}

criterion_group!(benches, bench_condense_text, bench_condense_value);
criterion_main!(benches);
