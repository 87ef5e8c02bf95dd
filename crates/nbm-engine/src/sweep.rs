use nbm_core::{EntropyArgs, LevelState, RngHandle};
use rand::RngCore;

use crate::block_state::BlockState;

/// Outcome of one sweep over all nodes of a state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepOutcome {
    /// Number of node moves accepted.
    pub accepted: usize,
    /// Total entropy change across accepted moves (non-positive when greedy).
    pub delta: f64,
}

/// Runs one Metropolis sweep over every node of `state`.
///
/// With `beta = f64::INFINITY` the sweep is strictly greedy and fully
/// deterministic: every compatible target block is scanned and the best
/// strictly-improving move is taken. With finite `beta` a single random
/// target is proposed per node and accepted with the Metropolis probability.
/// Moves never cross constraint labels and never empty a block, so the block
/// count is invariant under sweeping.
pub fn metropolis_sweep(
    state: &mut BlockState,
    beta: f64,
    args: &EntropyArgs,
    rng: &mut RngHandle,
) -> SweepOutcome {
    let n = state.num_nodes();
    let blocks = state.num_blocks();
    let mut outcome = SweepOutcome {
        accepted: 0,
        delta: 0.0,
    };
    if blocks < 2 {
        return outcome;
    }
    let bclabel = state.block_clabel();
    for v in 0..n {
        let r_old = state.partition()[v];
        if state.member_counts()[r_old] <= 1 {
            continue;
        }
        let label = state.clabel()[v];
        let s0 = state.entropy(args);
        if beta.is_infinite() {
            let mut best: Option<(usize, f64)> = None;
            for r in 0..blocks {
                if r == r_old || bclabel[r] != label {
                    continue;
                }
                state.move_node(v, r);
                let ds = state.entropy(args) - s0;
                state.move_node(v, r_old);
                if best.map_or(true, |(_, bds)| ds < bds) {
                    best = Some((r, ds));
                }
            }
            if let Some((r, ds)) = best {
                if ds < 0.0 {
                    state.move_node(v, r);
                    outcome.accepted += 1;
                    outcome.delta += ds;
                }
            }
        } else {
            let r = (rng.next_u64() as usize) % blocks;
            if r == r_old || bclabel[r] != label {
                continue;
            }
            state.move_node(v, r);
            let ds = state.entropy(args) - s0;
            let accept = ds < 0.0 || {
                let draw = rng.next_u64() as f64 / u64::MAX as f64;
                draw < (-beta * ds).exp()
            };
            if accept {
                outcome.accepted += 1;
                outcome.delta += ds;
            } else {
                state.move_node(v, r_old);
            }
        }
    }
    outcome
}
