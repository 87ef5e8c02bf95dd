use std::collections::BTreeMap;

use nbm_core::errors::{ErrorInfo, NbmError};
use nbm_core::{LevelSearch, LevelState, RngHandle};

use crate::config::BisectionOpts;

/// Finds the best state between two boundary block counts.
///
/// `min_state` and `max_state` are the boundary candidates (`min.B <= max.B`).
/// Intermediate candidates are derived from the maximal boundary via
/// [`LevelSearch::multilevel`] and memoized per requested block count; the
/// search narrows the interval golden-section style and finishes with an
/// exhaustive scan of the last few counts. The returned state is the best one
/// evaluated, boundaries included. Deterministic given the RNG seed.
pub fn bisection_minimize<S: LevelSearch>(
    min_state: S,
    max_state: S,
    opts: &BisectionOpts,
    rng: &mut RngHandle,
) -> Result<S, NbmError> {
    let opts = opts.sanitised();
    let b_lo = min_state.num_blocks();
    let b_hi = max_state.num_blocks();
    if b_lo > b_hi {
        return Err(NbmError::Search(
            ErrorInfo::new("inverted-bounds", "minimal boundary has more blocks than maximal")
                .with_context("min_b", b_lo.to_string())
                .with_context("max_b", b_hi.to_string()),
        ));
    }

    let seed_state = max_state.clone();
    let mut cache: BTreeMap<usize, (f64, S)> = BTreeMap::new();
    cache.insert(b_lo, (min_state.entropy(&opts.entropy), min_state));
    cache
        .entry(b_hi)
        .or_insert_with(|| (max_state.entropy(&opts.entropy), max_state));

    let mut lo = b_lo;
    let mut hi = b_hi;
    let mut iters = 0usize;
    while hi - lo > 2 && iters < opts.max_iters {
        let span = (hi - lo) as f64;
        let mut m1 = lo + (span * 0.382).round() as usize;
        let mut m2 = lo + (span * 0.618).round() as usize;
        m1 = m1.clamp(lo + 1, hi - 1);
        m2 = m2.clamp(lo + 1, hi - 1);
        if m2 <= m1 {
            m2 = m1 + 1;
            if m2 >= hi {
                break;
            }
        }
        let s1 = eval(m1, &seed_state, &opts, &mut cache, rng)?;
        let s2 = eval(m2, &seed_state, &opts, &mut cache, rng)?;
        if s1 <= s2 {
            hi = m2;
        } else {
            lo = m1;
        }
        iters += 1;
    }
    for b in lo..=hi {
        eval(b, &seed_state, &opts, &mut cache, rng)?;
    }

    // ascending key order makes ties resolve toward fewer blocks
    let mut best: Option<(f64, S)> = None;
    for (_, (s, state)) in cache {
        if best.as_ref().map_or(true, |(bs, _)| s < *bs) {
            best = Some((s, state));
        }
    }
    match best {
        Some((_, state)) => Ok(state),
        None => Err(NbmError::Search(ErrorInfo::new(
            "empty-search",
            "no candidate states were evaluated",
        ))),
    }
}

fn eval<S: LevelSearch>(
    target: usize,
    seed_state: &S,
    opts: &BisectionOpts,
    cache: &mut BTreeMap<usize, (f64, S)>,
    rng: &mut RngHandle,
) -> Result<f64, NbmError> {
    if let Some((s, _)) = cache.get(&target) {
        return Ok(*s);
    }
    let candidate = seed_state.multilevel(target, &opts.multilevel, rng)?;
    let s = candidate.entropy(&opts.entropy);
    cache.insert(target, (s, candidate));
    Ok(s)
}
