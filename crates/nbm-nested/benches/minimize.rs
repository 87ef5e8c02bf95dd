use criterion::{criterion_group, criterion_main, Criterion};

use nbm_core::RngHandle;
use nbm_engine::BlockState;
use nbm_graph::MultiGraph;
use nbm_nested::{hierarchy_minimize, CheckMode, MinimizeOpts, NestedBlockState};

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

fn bench_minimize(c: &mut Criterion) {
    let graph = ring_of_cliques(4, 4);
    let n = graph.num_nodes();
    let b: Vec<usize> = (0..n).map(|v| v % 4).collect();

    c.bench_function("hierarchy_minimize_16n", |bench| {
        bench.iter(|| {
            let base = BlockState::new(graph.clone(), &b, None, false).unwrap();
            let mut state =
                NestedBlockState::new(base, &[vec![0, 1, 0, 1]], CheckMode::Off).unwrap();
            let mut rng = RngHandle::from_seed(7);
            hierarchy_minimize(&mut state, &MinimizeOpts::default(), &mut rng).unwrap()
        })
    });
}

criterion_group!(benches, bench_minimize);
criterion_main!(benches);
