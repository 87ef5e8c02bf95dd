//! Description-length terms for block model states.
//!
//! The terms operate on the cached block-level aggregates (edge count matrix,
//! block degrees, block node weights) and are deterministic functions of them.
//! Log-factorials are evaluated through the gamma function so node weights and
//! edge counts may be fractional, which happens on aggregated block graphs.

use std::collections::BTreeMap;

use special::Gamma;

/// `ln x!` extended to non-negative reals via the gamma function.
pub fn ln_factorial(x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    (x + 1.0).ln_gamma().0
}

/// `ln C(n, k)` extended to non-negative reals; zero outside the valid range.
pub fn ln_binom(n: f64, k: f64) -> f64 {
    if k <= 0.0 || n <= 0.0 || k > n {
        return 0.0;
    }
    ln_factorial(n) - ln_factorial(k) - ln_factorial(n - k)
}

fn pair_space(r: usize, s: usize, nr: &[f64], multigraph: bool) -> f64 {
    if r == s {
        let n = nr[r];
        if multigraph {
            n * (n + 1.0) / 2.0
        } else {
            n * (n - 1.0) / 2.0
        }
    } else {
        nr[r] * nr[s]
    }
}

/// Sparse-graph entropy term.
///
/// `deg_lnfact` is the cached `sum_v ln k_v!` over the level's nodes, only
/// consumed by the degree-corrected variant.
pub fn sparse_term(
    mrs: &BTreeMap<(usize, usize), f64>,
    nr: &[f64],
    wr: &[f64],
    e_total: f64,
    deg_corr: bool,
    deg_lnfact: f64,
) -> f64 {
    let mut s = if deg_corr {
        -e_total - deg_lnfact
    } else {
        e_total
    };
    for (&(r, t), &e) in mrs {
        if e <= 0.0 {
            continue;
        }
        let denom = if deg_corr {
            wr[r] * wr[t]
        } else {
            nr[r] * nr[t]
        };
        if denom <= 0.0 {
            continue;
        }
        let m = if r == t { 2.0 * e } else { e };
        s -= e * (m / denom).ln();
    }
    s
}

/// Dense-graph entropy term (binary or multigraph ensemble).
pub fn dense_term(mrs: &BTreeMap<(usize, usize), f64>, nr: &[f64], multigraph: bool) -> f64 {
    let mut s = 0.0;
    for (&(r, t), &e) in mrs {
        if e <= 0.0 {
            continue;
        }
        let space = pair_space(r, t, nr, multigraph);
        if space <= 0.0 {
            continue;
        }
        if multigraph {
            s += ln_binom(space + e - 1.0, e);
        } else {
            s += ln_binom(space, e.min(space));
        }
    }
    s
}

/// Description length of the node partition itself.
pub fn partition_dl(nr: &[f64]) -> f64 {
    let n: f64 = nr.iter().sum();
    let blocks = nr.len() as f64;
    let mut s = ln_binom(n - 1.0, blocks - 1.0) + ln_factorial(n);
    for &w in nr {
        s -= ln_factorial(w);
    }
    s
}

/// Description length of the block degree sequence (degree-corrected models).
pub fn degree_dl(nr: &[f64], wr: &[f64]) -> f64 {
    let mut s = 0.0;
    for (&n, &e) in nr.iter().zip(wr.iter()) {
        s += ln_binom(n + e - 1.0, e);
    }
    s
}

/// Description length of the edge count matrix given `B` and `E`.
pub fn edges_dl(blocks: usize, e_total: f64) -> f64 {
    let pairs = (blocks * (blocks + 1) / 2) as f64;
    ln_binom(pairs + e_total - 1.0, e_total)
}
