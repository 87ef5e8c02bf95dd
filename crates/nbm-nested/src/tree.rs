use nbm_core::partition::num_blocks;
use nbm_core::{BlockGraph, LevelState};

use crate::state::NestedBlockState;

/// Explicit rooted containment tree extracted from a nested state.
///
/// Vertices `0..num_leaves` are the base-level nodes; every higher-level
/// block becomes one vertex. Edges run parent to child.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyTree {
    /// Parent of each vertex; `None` only for the root.
    pub parent: Vec<Option<usize>>,
    /// Children of each vertex, in child-id order.
    pub children: Vec<Vec<usize>>,
    /// Hierarchy level each vertex belongs to (leaves are level 0).
    pub level_of: Vec<usize>,
    /// Block id of each vertex within its own level.
    pub label: Vec<usize>,
    /// Relative ordering within a level. Leaves carry their raw total degree;
    /// higher-level vertices carry their rank by total block degree.
    pub order: Vec<f64>,
    /// The single top vertex.
    pub root: usize,
}

impl HierarchyTree {
    /// Total number of tree vertices.
    pub fn num_nodes(&self) -> usize {
        self.parent.len()
    }

    /// All parent-to-child edges.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.parent
            .iter()
            .enumerate()
            .filter_map(|(v, p)| p.map(|p| (p, v)))
    }

    /// Whether `v` is a base-level leaf.
    pub fn is_leaf(&self, v: usize) -> bool {
        self.level_of[v] == 0
    }
}

/// Converts a nested state into an explicit containment tree.
///
/// If the stored top level still has more than one block, synthetic
/// single-node levels are appended so the tree always has a single root.
/// With `empty_branches = false`, upper-level vertices that lost all their
/// children are pruned (the root is always kept) and the remaining vertices
/// are renumbered compactly.
pub fn get_hierarchy_tree<S: LevelState>(
    state: &NestedBlockState<S>,
    empty_branches: bool,
) -> HierarchyTree {
    // one band per level: the level's own graph and partition
    let mut bands: Vec<(S::Graph, Vec<usize>)> = Vec::new();
    for s in state.levels() {
        bands.push((s.graph().clone(), s.partition().to_vec()));
        if s.num_nodes() == 1 {
            break;
        }
    }
    // extend with quotient bands until a single-node root band exists
    loop {
        let (g, b) = match bands.last() {
            Some(band) => band,
            None => break,
        };
        if g.num_nodes() == 1 {
            break;
        }
        let blocks = num_blocks(b);
        let bg = g.quotient(b, blocks);
        let n = bg.num_nodes();
        bands.push((bg, vec![0; n]));
    }

    let total: usize = bands.iter().map(|(g, _)| g.num_nodes()).sum();
    let mut parent: Vec<Option<usize>> = vec![None; total];
    let mut level_of = vec![0usize; total];
    let mut label = vec![0usize; total];
    let mut order = vec![0.0f64; total];

    // leaves: label by node id, order by raw total degree
    let base = &bands[0].0;
    let n0 = base.num_nodes();
    for v in 0..n0 {
        label[v] = v;
        order[v] = base.degree(v);
    }

    let mut last_pos = 0usize;
    let mut pos = n0;
    for (k, (g, _)) in bands.iter().enumerate().skip(1) {
        let n = g.num_nodes();
        for i in 0..n {
            label[pos + i] = i;
            level_of[pos + i] = k;
        }
        // sibling order: rank by total degree, self-loop weight halved
        let mut by_degree: Vec<usize> = (0..n).collect();
        by_degree.sort_by(|&a, &b| {
            let da = g.degree(a) - g.self_weight(a);
            let db = g.degree(b) - g.self_weight(b);
            da.total_cmp(&db)
        });
        for (rank, &i) in by_degree.iter().enumerate() {
            order[pos + i] = rank as f64;
        }
        // connect the previous band's vertices through its partition
        let prev_b = &bands[k - 1].1;
        for (v, &r) in prev_b.iter().enumerate() {
            parent[last_pos + v] = Some(pos + r);
        }
        last_pos = pos;
        pos += n;
    }
    let root = total - 1;

    let mut tree = assemble(parent, level_of, label, order, root);
    if !empty_branches {
        tree = prune_empty(tree, n0);
    }
    tree
}

fn assemble(
    parent: Vec<Option<usize>>,
    level_of: Vec<usize>,
    label: Vec<usize>,
    order: Vec<f64>,
    root: usize,
) -> HierarchyTree {
    let mut children = vec![Vec::new(); parent.len()];
    for (v, p) in parent.iter().enumerate() {
        if let Some(p) = *p {
            children[p].push(v);
        }
    }
    HierarchyTree {
        parent,
        children,
        level_of,
        label,
        order,
        root,
    }
}

/// Removes upper-level vertices with no surviving children, bottom-up, and
/// renumbers the remainder compactly.
fn prune_empty(tree: HierarchyTree, num_leaves: usize) -> HierarchyTree {
    let n = tree.num_nodes();
    let mut keep = vec![true; n];
    // child counts shrink as empty vertices are discarded level by level
    let mut live_children: Vec<usize> = tree.children.iter().map(Vec::len).collect();
    let mut frontier: Vec<usize> = (num_leaves..n)
        .filter(|&v| live_children[v] == 0 && v != tree.root)
        .collect();
    while let Some(v) = frontier.pop() {
        keep[v] = false;
        if let Some(p) = tree.parent[v] {
            live_children[p] -= 1;
            if live_children[p] == 0 && p != tree.root && keep[p] {
                frontier.push(p);
            }
        }
    }

    let mut remap = vec![usize::MAX; n];
    let mut next = 0usize;
    for v in 0..n {
        if keep[v] {
            remap[v] = next;
            next += 1;
        }
    }
    let mut parent = Vec::with_capacity(next);
    let mut level_of = Vec::with_capacity(next);
    let mut label = Vec::with_capacity(next);
    let mut order = Vec::with_capacity(next);
    for v in 0..n {
        if !keep[v] {
            continue;
        }
        parent.push(tree.parent[v].map(|p| remap[p]));
        level_of.push(tree.level_of[v]);
        label.push(tree.label[v]);
        order.push(tree.order[v]);
    }
    let root = remap[tree.root];
    assemble(parent, level_of, label, order, root)
}
