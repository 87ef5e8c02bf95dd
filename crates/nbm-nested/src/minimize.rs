use nbm_core::errors::NbmError;
use nbm_core::{LevelSearch, LevelState, RngHandle};

use crate::config::{LevelBounds, MinimizeOpts};
use crate::state::NestedBlockState;

/// Minimizes the description length of a nested state by local search over
/// the hierarchy levels.
///
/// Starting from the top, each visited level is offered three moves in order:
/// replace its partition with the result of a fresh boundary search, delete
/// the level by folding it into the one below, or insert a new level above it.
/// A replacement is kept only when it strictly lowers the total entropy, a
/// deletion is undone when it raises it, and an insertion is undone when it
/// fails to strictly lower it. Rejected moves are rolled back by restoring the
/// level objects saved beforehand. Whenever the top level is left with more
/// than one block, a single-block level is appended above it. Levels named in
/// `opts.frozen_levels` are offered no moves and count as converged. The
/// sweep ends when every level is marked converged, or when
/// `opts.max_sweeps` level visits have been spent.
///
/// Returns the accumulated entropy change, which equals the difference
/// between the state's total entropy after and before the call.
pub fn hierarchy_minimize<S: LevelSearch>(
    state: &mut NestedBlockState<S>,
    opts: &MinimizeOpts,
    rng: &mut RngHandle,
) -> Result<f64, NbmError> {
    let opts = opts.sanitised();
    let no_bounds = LevelBounds::unconstrained();
    let mut ds = 0.0;
    let mut visits = 0usize;

    let mut l = state.num_levels() - 1;
    let mut done: Vec<bool> = Vec::new();
    loop {
        if opts.max_sweeps > 0 && visits >= opts.max_sweeps {
            log::debug!("sweep budget of {} level visits exhausted", opts.max_sweeps);
            break;
        }
        visits += 1;

        while done.len() < state.num_levels() + 2 {
            done.push(false);
        }

        if done[l] {
            log::trace!("level {l}: converged, skipping");
            if l == 0 {
                break;
            }
            l -= 1;
            continue;
        }

        // `kept` stays true while the level survives each move unchanged;
        // frozen levels skip the moves but count as unchanged
        let frozen = opts.frozen_levels.contains(&l);
        let mut kept = true;

        // replace
        if kept && !frozen {
            let si = state.total_entropy();
            let saved = state.save_tail(l);
            let bounds = if l == 0 { &opts.bounds } else { &no_bounds };
            let candidate = state.find_new_level(l, bounds, &opts.search, rng)?;
            state.replace_level(l, candidate.partition())?;
            let sf = state.total_entropy();
            if sf < si {
                kept = false;
                ds += sf - si;
                log::debug!(
                    "level {l}: replaced, B={}, dS={:+.6}",
                    state.level(l).num_blocks(),
                    sf - si
                );
            } else {
                state.restore_tail(l, saved);
                log::trace!("level {l}: rejected replacement, dS={:+.6}", sf - si);
            }
        }

        // delete
        let floor_blocked = matches!(opts.bounds.b_min, Some(floor)
            if l == 1 && state.level(l).num_blocks() < floor);
        if kept && !frozen && l > 0 && l + 1 < state.num_levels() && !floor_blocked {
            let si = state.total_entropy();
            let saved = state.save_tail(l - 1);
            state.delete_level(l)?;
            let sf = state.total_entropy();
            if sf > si {
                state.restore_tail(l - 1, saved);
            } else {
                kept = false;
                done.remove(l);
                ds += sf - si;
                log::debug!("level {l}: deleted, dS={:+.6}", sf - si);
            }
        }

        // insert: duplicate the level and optimize the upper copy
        if kept && !frozen && l > 0 {
            let si = state.total_entropy();
            let saved = state.save_tail(l);
            state.duplicate_level(l)?;
            let candidate = state.find_new_level(l + 1, &no_bounds, &opts.search, rng)?;
            state.replace_level(l + 1, candidate.partition())?;
            let sf = state.total_entropy();
            if sf >= si {
                state.restore_tail(l, saved);
                log::trace!("level {l}: rejected insert, dS={:+.6}", sf - si);
            } else {
                kept = false;
                ds += sf - si;
                l += 1;
                done.insert(l, false);
                log::debug!(
                    "level {l}: inserted, B={}, dS={:+.6}",
                    state.level(l).num_blocks(),
                    sf - si
                );
            }
        }

        // keep the single-root invariant: cap the hierarchy with a B=1 level
        let top = state.level(state.num_levels() - 1);
        if top.num_blocks() > 1 {
            let si = state.total_entropy();
            let cap = top.coarsen(Some(&vec![0; top.num_blocks()]), false)?;
            state.push_level(cap);
            let sf = state.total_entropy();
            ds += sf - si;
            log::debug!("appended single-block top level, dS={:+.6}", sf - si);
        }

        done[l] = true;
        if !kept {
            if l + 1 < state.num_levels() {
                done[l + 1] = false;
            }
            if l > 0 {
                done[l - 1] = false;
            }
            l += 1;
        } else if (l + 1 < state.num_levels() && !done[l + 1])
            || (l + 1 == state.num_levels() && state.level(l).num_blocks() > 1)
        {
            l += 1;
        } else {
            if l == 0 {
                break;
            }
            l -= 1;
        }

        if l >= state.num_levels() {
            l = state.num_levels() - 1;
        }
    }

    for (l, n, b) in state.level_summary() {
        log::debug!("level {l}: {n} nodes, {b} blocks");
    }
    Ok(ds)
}
