//! Descriptive statistics and goodness-of-fit scores
//!
//! Missing observations are carried as `NaN`. The location and scale
//! estimators skip them, matching how the indicator panel treats gaps.

use crate::{MathError, Result};

/// Arithmetic mean of the finite values, `NaN` when there are none
pub fn mean(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

    if count == 0 {
        return f64::NAN;
    }

    sum / count as f64
}

/// Sample standard deviation (ddof = 1) of the finite values
///
/// Returns `NaN` when fewer than two finite values are available.
pub fn sample_std(values: &[f64]) -> f64 {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.len() < 2 {
        return f64::NAN;
    }

    // Constant input has exactly zero spread, whatever the rounding of the mean.
    if finite.iter().all(|v| *v == finite[0]) {
        return 0.0;
    }

    let m = finite.iter().sum::<f64>() / finite.len() as f64;
    let variance =
        finite.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (finite.len() - 1) as f64;

    variance.sqrt()
}

/// Standardize a series as `(x - mean) / std`
///
/// Single-element and zero-variance series produce `NaN` for every entry
/// rather than an error; missing entries stay missing.
pub fn z_scores(values: &[f64]) -> Vec<f64> {
    let m = mean(values);
    let s = sample_std(values);

    if !(s > 0.0) {
        return vec![f64::NAN; values.len()];
    }

    values.iter().map(|v| (v - m) / s).collect()
}

/// `n` evenly spaced samples over the closed interval `[start, stop]`
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { stop } else { start + step * i as f64 })
                .collect()
        }
    }
}

fn check_pair(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot score an empty series".to_string(),
        ));
    }

    if actual.len() != predicted.len() {
        return Err(MathError::InvalidInput(format!(
            "Actual length ({}) doesn't match predicted length ({})",
            actual.len(),
            predicted.len()
        )));
    }

    Ok(())
}

/// Mean squared error between observed and predicted values
pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_pair(actual, predicted)?;

    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();

    Ok(sum / actual.len() as f64)
}

/// Coefficient of determination (explained variance share)
///
/// A constant target scores 1.0 for a perfect prediction and 0.0 otherwise.
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_pair(actual, predicted)?;

    let y_mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_total: f64 = actual.iter().map(|a| (a - y_mean).powi(2)).sum();
    let ss_residual: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();

    if ss_total == 0.0 {
        return Ok(if ss_residual == 0.0 { 1.0 } else { 0.0 });
    }

    Ok(1.0 - ss_residual / ss_total)
}
