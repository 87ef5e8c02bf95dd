use criterion::{criterion_group, criterion_main, Criterion};

use nbm_core::{EntropyArgs, RngHandle};
use nbm_engine::{metropolis_sweep, BlockState};
use nbm_graph::MultiGraph;

fn ring_of_cliques(cliques: usize, size: usize) -> MultiGraph {
    let n = cliques * size;
    let mut graph = MultiGraph::with_nodes(n);
    for c in 0..cliques {
        let base = c * size;
        for i in base..base + size {
            for j in (i + 1)..base + size {
                graph.add_edge(i, j, 1.0).unwrap();
            }
        }
        let next = ((c + 1) % cliques) * size;
        graph.add_edge(base + size - 1, next, 1.0).unwrap();
    }
    graph
}

fn bench_sweep(c: &mut Criterion) {
    let graph = ring_of_cliques(8, 6);
    let b: Vec<usize> = (0..graph.num_nodes()).map(|v| v % 8).collect();
    let args = EntropyArgs {
        dl: true,
        ..EntropyArgs::default()
    };

    c.bench_function("greedy_sweep_48n", |bench| {
        bench.iter(|| {
            let mut state = BlockState::new(graph.clone(), &b, None, false).unwrap();
            let mut rng = RngHandle::from_seed(42);
            metropolis_sweep(&mut state, f64::INFINITY, &args, &mut rng)
        })
    });
}

criterion_group!(benches, bench_sweep);
criterion_main!(benches);
