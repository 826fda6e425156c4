//! Concentration of value across transfers.
//!
//! Both measures take raw magnitudes in any order and return a ratio in
//! `[0, 1]`. Sums are taken in 128-bit integers so the only rounding is
//! the final division.

use trustchain_core::constants::GINI_ALL_ZERO_SENTINEL;

/// Gini coefficient of `values`: `D / (2 n S)` where `D` is the full
/// double sum `Σ_i Σ_j |x_i - x_j|` and `S` the total.
///
/// - Fewer than two values: `0.0` (no inequality without a comparison).
/// - All values zero: [`GINI_ALL_ZERO_SENTINEL`].
/// - `n` equal positive values: `0.0`; one positive value among `n - 1`
///   zeros: `(n - 1) / n`.
///
/// `D` is computed from the ascending order as `2 Σ_i (2i - n + 1) x_i`,
/// which equals the double sum exactly.
pub fn gini(values: &[u64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    let n = sorted.len() as i128;
    let sum: i128 = sorted.iter().map(|&v| v as i128).sum();
    if sum == 0 {
        return GINI_ALL_ZERO_SENTINEL;
    }

    let weighted: i128 = sorted
        .iter()
        .enumerate()
        .map(|(i, &v)| (2 * i as i128 - n + 1) * v as i128)
        .sum();
    let abs_diff_sum = 2 * weighted;

    abs_diff_sum as f64 / (2.0 * n as f64 * sum as f64)
}

/// Herfindahl–Hirschman Index of `values`, normalised to `[0, 1]`.
///
/// Sum of squared percentage shares divided by 10 000: one value holding
/// everything gives `1.0`, `k` equal shares give `1/k`. Empty or all-zero
/// input gives `0.0`.
pub fn hhi(values: &[u64]) -> f64 {
    let total: u128 = values.iter().map(|&v| v as u128).sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;

    let squares: f64 = values
        .iter()
        .map(|&v| {
            let share = v as f64 / total * 100.0;
            share * share
        })
        .sum();

    (squares / 10_000.0).clamp(0.0, 1.0)
}
