//! Off-chain estimate of a single weighted-pool swap.
//!
//! The curve is the exchange's own approximation of the weighted-product
//! exponent, not the textbook `wB / wA`. Degenerate pools (empty reserves,
//! zero weights) yield NaN or negative outputs; those propagate unchanged and
//! route search treats anything non-positive as unusable.

use alloy::primitives::Address;

use crate::service::pool::WeightedPool;
use crate::service::utils::to_human_f64;

/// Expected output of swapping `input` (human units) of `in_token` through `pool`.
///
/// No fee is applied here; callers discount the input first.
pub fn calculate_swap(in_token: Address, pool: &WeightedPool, input: f64) -> f64 {
    let (from, to) = if pool.is_first(in_token) { (0, 1) } else { (1, 0) };

    let b_in = input;
    let pb_a = to_human_f64(pool.balances[to]);
    let pb_b = to_human_f64(pool.balances[from]);
    let w_a = to_human_f64(pool.weights[to]);
    let w_b = to_human_f64(pool.weights[from]);

    weighted_output(b_in, pb_a, pb_b, w_a, w_b)
}

/// `pb_a`/`w_a` belong to the token going out, `pb_b`/`w_b` to the token coming in.
fn weighted_output(b_in: f64, pb_a: f64, pb_b: f64, w_a: f64, w_b: f64) -> f64 {
    let ratio = pb_b / (pb_b + b_in);
    let skew = w_b * (1.0 - ratio) / (1.0 + ratio);
    let exponent = (w_b - skew) / (w_a + skew);

    pb_a * (1.0 - ratio.powf(exponent))
}
