//! Benchmarks for envelope extension and finalization.

use contentflow::envelope::{ContextEnvelope, CustomerContext, UserInput};
use contentflow::nodes::{Node, NodeConfig, NodeKind};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;

fn seed() -> ContextEnvelope {
    let mut input = UserInput::new();
    input.insert("topic".to_string(), json!("Rust in production"));
    input.insert("tone".to_string(), json!("practical"));
    ContextEnvelope::create_initial(&NodeConfig::new(), input, CustomerContext::default(), "wf-bench")
}

fn chain(length: usize) -> ContextEnvelope {
    let node = Node::of_kind("writer", NodeKind::ContentWriter);
    (0..length).fold(seed(), |env, i| {
        let node = Node::new(format!("n{i}"), node.node_type.clone());
        env.extend(&node, json!({"content": "lorem ipsum dolor sit amet", "step": i}))
    })
}

fn envelope_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope_extend");
    for length in [5_usize, 20, 50] {
        group.bench_with_input(BenchmarkId::from_parameter(length), &length, |b, &length| {
            b.iter(|| black_box(chain(length)));
        });
    }
    group.finish();

    let long = chain(50);
    c.bench_function("envelope_finalize_50", |b| {
        b.iter(|| black_box(long.finalize(json!({"content": "done"}))));
    });
    c.bench_function("envelope_extract_for_invocation", |b| {
        b.iter(|| black_box(long.extract_for_invocation()));
    });
}

criterion_group!(benches, envelope_benchmark);
criterion_main!(benches);
