use nbm_core::BlockGraph;
use nbm_graph::MultiGraph;

fn path_graph(n: usize) -> MultiGraph {
    let mut graph = MultiGraph::with_nodes(n);
    for v in 0..n - 1 {
        graph.add_edge(v, v + 1, 1.0).unwrap();
    }
    graph
}

#[test]
fn quotient_aggregates_weights_and_multiplicities() {
    // 0-1-2-3 path, blocks {0,1} and {2,3}.
    let graph = path_graph(4);
    let coarse = graph.quotient(&[0, 0, 1, 1], 2);

    assert_eq!(coarse.num_nodes(), 2);
    assert_eq!(coarse.node_weight(0), 2.0);
    assert_eq!(coarse.node_weight(1), 2.0);
    // intra-block edges become self-loops, the 1-2 edge bridges the blocks
    assert_eq!(coarse.self_weight(0), 1.0);
    assert_eq!(coarse.self_weight(1), 1.0);
    assert_eq!(coarse.total_edge_weight(), 3.0);
    assert_eq!(coarse.edge_list(), vec![(0, 0, 1.0), (0, 1, 1.0), (1, 1, 1.0)]);
}

#[test]
fn quotient_by_identity_preserves_structure() {
    let graph = path_graph(5);
    let b: Vec<usize> = (0..5).collect();
    let coarse = graph.quotient(&b, 5);
    assert_eq!(coarse.edge_list(), graph.edge_list());
    assert_eq!(coarse.total_edge_weight(), graph.total_edge_weight());
}

#[test]
fn parallel_edges_merge_on_insert() {
    let mut graph = MultiGraph::with_nodes(2);
    graph.add_edge(0, 1, 1.0).unwrap();
    graph.add_edge(1, 0, 2.0).unwrap();
    assert_eq!(graph.edge_list(), vec![(0, 1, 3.0)]);
    assert_eq!(graph.degree(0), 3.0);
}

#[test]
fn self_loops_count_twice_in_degree() {
    let mut graph = MultiGraph::with_nodes(1);
    graph.add_edge(0, 0, 2.0).unwrap();
    assert_eq!(graph.degree(0), 4.0);
    assert_eq!(graph.self_weight(0), 2.0);
    assert_eq!(graph.total_edge_weight(), 2.0);
}

#[test]
fn add_edge_validates_endpoints() {
    let mut graph = MultiGraph::with_nodes(2);
    let err = graph.add_edge(0, 5, 1.0).unwrap_err();
    assert_eq!(err.info().code, "node-out-of-range");
    let err = graph.add_edge(0, 1, 0.0).unwrap_err();
    assert_eq!(err.info().code, "non-positive-weight");
}
