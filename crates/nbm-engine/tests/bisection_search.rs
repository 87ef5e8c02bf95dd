use nbm_core::{LevelSearch, LevelState, MultilevelOpts, RngHandle};
use nbm_engine::{bisection_minimize, BisectionOpts, BlockState};
use nbm_graph::MultiGraph;

/// Three 4-node cliques chained by single bridge edges.
fn three_cliques() -> MultiGraph {
    let mut graph = MultiGraph::with_nodes(12);
    for base in [0, 4, 8] {
        for i in base..base + 4 {
            for j in (i + 1)..base + 4 {
                graph.add_edge(i, j, 1.0).unwrap();
            }
        }
    }
    graph.add_edge(3, 4, 1.0).unwrap();
    graph.add_edge(7, 8, 1.0).unwrap();
    graph
}

fn identity_partition(n: usize) -> Vec<usize> {
    (0..n).collect()
}

#[test]
fn multilevel_reaches_requested_block_count() {
    let graph = three_cliques();
    let start = BlockState::new(graph, &identity_partition(12), None, false).unwrap();
    let opts = MultilevelOpts::default();
    let mut rng = RngHandle::from_seed(11);
    for target in [6, 3, 1] {
        let reduced = start.multilevel(target, &opts, &mut rng).unwrap();
        assert_eq!(reduced.num_blocks(), target);
        assert_eq!(reduced.num_nodes(), 12);
    }
}

#[test]
fn multilevel_stops_at_constraint_boundary() {
    let graph = three_cliques();
    let clabel: Vec<usize> = (0..12).map(|v| v / 4).collect();
    let start = BlockState::new(graph, &identity_partition(12), Some(&clabel), false).unwrap();
    let mut rng = RngHandle::from_seed(11);
    // the three constraint groups can never merge with one another
    let reduced = start
        .multilevel(1, &MultilevelOpts::default(), &mut rng)
        .unwrap();
    assert_eq!(reduced.num_blocks(), 3);
    assert!(reduced.check_clabel());
}

#[test]
fn bisection_rejects_inverted_bounds() {
    let graph = three_cliques();
    let fine = BlockState::new(graph.clone(), &identity_partition(12), None, false).unwrap();
    let coarse = fine.multilevel(2, &MultilevelOpts::default(), &mut RngHandle::from_seed(3)).unwrap();
    let err = bisection_minimize(fine, coarse, &BisectionOpts::default(), &mut RngHandle::from_seed(3))
        .unwrap_err();
    assert_eq!(err.info().code, "inverted-bounds");
}

#[test]
fn bisection_stays_within_bounds_and_is_deterministic() {
    let graph = three_cliques();
    let max_state = BlockState::new(graph.clone(), &identity_partition(12), None, false).unwrap();
    let min_state = BlockState::new(graph, &vec![0; 12], None, false).unwrap();
    let opts = BisectionOpts::default();

    let a = bisection_minimize(
        min_state.clone(),
        max_state.clone(),
        &opts,
        &mut RngHandle::from_seed(29),
    )
    .unwrap();
    assert!(a.num_blocks() >= 1 && a.num_blocks() <= 12);
    assert!(a.entropy(&opts.entropy) <= min_state.entropy(&opts.entropy) + 1e-9);
    assert!(a.entropy(&opts.entropy) <= max_state.entropy(&opts.entropy) + 1e-9);

    let b = bisection_minimize(min_state, max_state, &opts, &mut RngHandle::from_seed(29)).unwrap();
    assert_eq!(a.partition(), b.partition());
}