//! Descriptive statistics over `f64` samples.
//!
//! Every function here ignores NaN inputs; an empty (or all-NaN) sample yields NaN.

use crate::helpers::simd_helpers::sum_f64;
use crate::processor::AggregateOp;

/// Copy of `values` without NaN entries
pub fn finite_values(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    values.into_iter().filter(|v| !v.is_nan()).collect()
}

pub fn mean(values: &[f64]) -> f64 {
    let clean = finite_values(values.iter().copied());
    if clean.is_empty() {
        return f64::NAN;
    }
    sum_f64(&clean) / clean.len() as f64
}

pub fn median(values: &[f64]) -> f64 {
    let mut clean = finite_values(values.iter().copied());
    if clean.is_empty() {
        return f64::NAN;
    }
    clean.sort_by(f64::total_cmp);

    let n = clean.len();
    if n % 2 == 0 {
        (clean[n / 2 - 1] + clean[n / 2]) / 2.0
    } else {
        clean[n / 2]
    }
}

/// Sample standard deviation (n - 1 estimator). NaN for fewer than two values.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    let clean = finite_values(values.iter().copied());
    let n = clean.len();
    if n < 2 {
        return f64::NAN;
    }
    let mean = sum_f64(&clean) / n as f64;
    let squares: Vec<f64> = clean.iter().map(|v| (v - mean).powi(2)).collect();
    (sum_f64(&squares) / (n - 1) as f64).sqrt()
}

/// Round to `decimals` places, exact halves to the even digit; NaN stays NaN
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// Apply one aggregate operation to a sample
pub fn aggregate_values(values: &[f64], op: AggregateOp) -> f64 {
    match op {
        AggregateOp::Mean => mean(values),
        AggregateOp::Median => median(values),
        AggregateOp::StdDev => sample_std_dev(values),
        AggregateOp::Min => values
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .reduce(f64::min)
            .unwrap_or(f64::NAN),
        AggregateOp::Max => values
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .reduce(f64::max)
            .unwrap_or(f64::NAN),
    }
}
