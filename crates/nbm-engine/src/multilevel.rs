use nbm_core::errors::NbmError;
use nbm_core::partition::continuous_map;
use nbm_core::{LevelSearch, LevelState, MultilevelOpts, RngHandle, StateOverrides};
use rand::RngCore;

use crate::block_state::BlockState;
use crate::sweep::metropolis_sweep;

impl LevelSearch for BlockState {
    fn multilevel(
        &self,
        target_b: usize,
        opts: &MultilevelOpts,
        rng: &mut RngHandle,
    ) -> Result<Self, NbmError> {
        let target = target_b.max(1);
        let mut cur = self.clone();
        while cur.num_blocks() > target {
            let Some(next) = best_merge(&cur, opts, rng)? else {
                // constraint labels forbid any further merge
                log::debug!(
                    "multilevel stopped early at B={} (target {})",
                    cur.num_blocks(),
                    target
                );
                break;
            };
            cur = next;
            for _ in 0..opts.sweeps_per_merge {
                metropolis_sweep(&mut cur, opts.beta, &opts.entropy, rng);
            }
        }
        Ok(cur)
    }
}

/// Merges the best-scoring compatible block pair, or returns `None` when the
/// constraint labels leave nothing mergeable.
fn best_merge(
    state: &BlockState,
    opts: &MultilevelOpts,
    rng: &mut RngHandle,
) -> Result<Option<BlockState>, NbmError> {
    let blocks = state.num_blocks();
    let bclabel = state.block_clabel();
    let mut pairs: Vec<(usize, usize)> = Vec::new();
    for r in 0..blocks {
        for s in (r + 1)..blocks {
            if bclabel[r] == bclabel[s] {
                pairs.push((r, s));
            }
        }
    }
    if pairs.is_empty() {
        return Ok(None);
    }
    if pairs.len() > opts.merge_candidates {
        let mut sampled = Vec::with_capacity(opts.merge_candidates);
        let mut taken = vec![false; pairs.len()];
        while sampled.len() < opts.merge_candidates {
            let idx = (rng.next_u64() as usize) % pairs.len();
            if !taken[idx] {
                taken[idx] = true;
                sampled.push(pairs[idx]);
            }
        }
        sampled.sort_unstable();
        pairs = sampled;
    }

    let s0 = state.entropy(&opts.entropy);
    let mut best: Option<(f64, BlockState)> = None;
    for (r, s) in pairs {
        let merged: Vec<usize> = state
            .partition()
            .iter()
            .map(|&t| if t == s { r } else { t })
            .collect();
        let candidate = state.copy_with(StateOverrides {
            partition: Some(continuous_map(&merged)),
            ..StateOverrides::default()
        })?;
        let ds = candidate.entropy(&opts.entropy) - s0;
        if best.as_ref().map_or(true, |(bds, _)| ds < *bds) {
            best = Some((ds, candidate));
        }
    }
    Ok(best.map(|(_, state)| state))
}
