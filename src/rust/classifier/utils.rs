use ndarray::Array1;

/// Floor applied to probabilities before taking a logarithm.
pub(crate) const PROBABILITY_EPSILON: f64 = 1e-15;

/// Numerically stable `ln(sum(exp(z)))`.
pub(crate) fn log_sum_exp(scores: &Array1<f32>) -> f64 {
    let max = scores.iter().cloned().fold(f32::NEG_INFINITY, f32::max) as f64;
    if !max.is_finite() {
        return max;
    }
    let sum: f64 = scores.iter().map(|&z| (z as f64 - max).exp()).sum();
    max + sum.ln()
}

pub(crate) fn softmax(scores: &Array1<f32>) -> Array1<f32> {
    if scores.is_empty() {
        return Array1::zeros(0);
    }
    let lse = log_sum_exp(scores);
    scores.mapv(|z| (z as f64 - lse).exp() as f32)
}

/// Shannon entropy of a distribution, ignoring non-positive entries.
pub(crate) fn entropy(distribution: impl IntoIterator<Item = f64>) -> f64 {
    distribution
        .into_iter()
        .filter(|&p| p > 0.0)
        .map(|p| -p * p.ln())
        .sum()
}

pub(crate) fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(idx, _)| idx)
}
