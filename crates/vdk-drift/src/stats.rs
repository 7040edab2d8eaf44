//! Pure two-sample statistics.
//!
//! Every function here is deterministic and ignorant of patients, metrics,
//! and files. Empty samples yield `None` rather than a statistic; NaN inputs
//! are the caller's bug and are not defended against.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Kolmogorov-Smirnov
// ---------------------------------------------------------------------------

/// Outcome of a two-sample Kolmogorov-Smirnov test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KsTest {
    /// Supremum distance between the two empirical CDFs, in `[0, 1]`.
    pub statistic: f64,
    /// Asymptotic two-sided p-value for the statistic.
    pub p_value: f64,
}

/// Supremum distance between the empirical CDFs of two samples.
///
/// Returns `None` when either sample is empty.
pub fn ks_statistic(baseline: &[f64], current: &[f64]) -> Option<f64> {
    if baseline.is_empty() || current.is_empty() {
        return None;
    }
    let a = sorted(baseline);
    let b = sorted(current);

    // Both empirical CDFs only change at sample points, so the supremum is
    // attained at one of them.
    let mut max_dist: f64 = 0.0;
    for &x in a.iter().chain(b.iter()) {
        let dist = (cdf_at(&a, x) - cdf_at(&b, x)).abs();
        max_dist = max_dist.max(dist);
    }
    Some(max_dist)
}

/// Two-sample Kolmogorov-Smirnov test with the asymptotic two-sided p-value.
///
/// The p-value evaluates the Kolmogorov distribution at
/// `(sqrt(ne) + 0.12 + 0.11 / sqrt(ne)) * D` with
/// `ne = n1 * n2 / (n1 + n2)`, the small-sample-corrected form of the
/// classical approximation.
///
/// Returns `None` when either sample is empty.
pub fn ks_test(baseline: &[f64], current: &[f64]) -> Option<KsTest> {
    let statistic = ks_statistic(baseline, current)?;
    let n1 = baseline.len() as f64;
    let n2 = current.len() as f64;
    let ne = (n1 * n2 / (n1 + n2)).sqrt();
    let lambda = (ne + 0.12 + 0.11 / ne) * statistic;
    Some(KsTest {
        statistic,
        p_value: kolmogorov_sf(lambda),
    })
}

/// Survival function of the Kolmogorov distribution,
/// `Q(x) = 2 * sum_{j>=1} (-1)^(j-1) * exp(-2 j^2 x^2)`.
///
/// The alternating series is summed until terms stop mattering. When it does
/// not settle (tiny `x`) the mass is all in the tail and the answer is 1.
fn kolmogorov_sf(x: f64) -> f64 {
    let exponent_scale = -2.0 * x * x;
    let mut sign = 1.0;
    let mut sum = 0.0;
    let mut prev_term = 0.0_f64;
    for j in 1..=100 {
        let j = j as f64;
        let term = sign * 2.0 * (exponent_scale * j * j).exp();
        sum += term;
        if term.abs() <= 1e-3 * prev_term || term.abs() <= 1e-8 * sum.abs() {
            return sum.clamp(0.0, 1.0);
        }
        sign = -sign;
        prev_term = term.abs();
    }
    1.0
}

// ---------------------------------------------------------------------------
// Wasserstein distance
// ---------------------------------------------------------------------------

/// 1-D empirical Wasserstein distance (earth mover's distance) between two
/// samples: the integral of `|F_baseline - F_current|` over the real line.
///
/// Returns `None` when either sample is empty.
pub fn wasserstein_distance(baseline: &[f64], current: &[f64]) -> Option<f64> {
    if baseline.is_empty() || current.is_empty() {
        return None;
    }
    let a = sorted(baseline);
    let b = sorted(current);

    let mut merged: Vec<f64> = Vec::with_capacity(a.len() + b.len());
    merged.extend_from_slice(&a);
    merged.extend_from_slice(&b);
    merged.sort_unstable_by(f64::total_cmp);

    // Between consecutive merged points both CDFs are flat, so the integral
    // is a sum of rectangle areas.
    let mut total = 0.0;
    for pair in merged.windows(2) {
        let width = pair[1] - pair[0];
        if width <= 0.0 {
            continue;
        }
        total += (cdf_at(&a, pair[0]) - cdf_at(&b, pair[0])).abs() * width;
    }
    Some(total)
}

// ---------------------------------------------------------------------------
// Mean squared error
// ---------------------------------------------------------------------------

/// Mean squared error between actual and predicted values.
///
/// Returns `None` when the slices are empty or their lengths differ.
pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    if actual.is_empty() || actual.len() != predicted.len() {
        return None;
    }
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p) * (a - p))
        .sum();
    Some(sum / actual.len() as f64)
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn sorted(sample: &[f64]) -> Vec<f64> {
    let mut out = sample.to_vec();
    out.sort_unstable_by(f64::total_cmp);
    out
}

/// Empirical CDF of a sorted sample evaluated at `x` (right-continuous).
fn cdf_at(sorted_sample: &[f64], x: f64) -> f64 {
    let at_or_below = sorted_sample.partition_point(|&v| v <= x);
    at_or_below as f64 / sorted_sample.len() as f64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
