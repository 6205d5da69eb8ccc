//! Compile and evaluation benchmarks over a layered grid of functions.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use layergraph_core::GraphBuilder;

/// `width` inputs feeding `depth` layers, each node summing two neighbours
/// from the layer below.
fn grid(width: usize, depth: usize) -> GraphBuilder<u64> {
    let mut graph: GraphBuilder<u64> = GraphBuilder::with_label("grid");
    for level in 1..=depth {
        for column in 0..width {
            let left = format!("n{}_{}", level - 1, column);
            let right = format!("n{}_{}", level - 1, (column + 1) % width);
            let (l, r) = (left.clone(), right.clone());
            graph
                .register(
                    format!("n{level}_{column}"),
                    &[left.as_str(), right.as_str()],
                    [],
                    move |args| args[l.as_str()].wrapping_add(args[r.as_str()]),
                )
                .expect("grid names are unique");
        }
    }
    graph
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    for depth in [8, 32, 128] {
        let graph = grid(32, depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &graph, |b, graph| {
            b.iter(|| black_box(graph.compile().expect("grid is acyclic")))
        });
    }
    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    for depth in [8, 32, 128] {
        let compiled = grid(32, depth).compile().expect("grid is acyclic");
        let inputs: Vec<(String, u64)> = (0..32).map(|i| (format!("n0_{i}"), i as u64)).collect();

        group.bench_with_input(BenchmarkId::new("strict", depth), &inputs, |b, inputs| {
            b.iter(|| {
                let bindings = inputs.iter().map(|(name, value)| (name.as_str(), *value));
                black_box(compiled.evaluate(bindings).expect("all inputs bound"))
                    .into_values()
                    .len()
            })
        });

        group.bench_with_input(BenchmarkId::new("lazy_top", depth), &inputs, |b, inputs| {
            let top = format!("n{depth}_0");
            b.iter(|| {
                let bindings = inputs.iter().map(|(name, value)| (name.as_str(), *value));
                let mut evaluator = compiled.lazily_evaluate(bindings).expect("inputs are layer 0");
                black_box(evaluator.get(&top).expect("all inputs bound"))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compile, bench_evaluate);
criterion_main!(benches);
