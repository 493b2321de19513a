//! Seeded sampling helpers shared by the trainer and the predictor
//!
//! Everything here is deterministic given the caller's `StdRng`, which keeps
//! whole runs reproducible from a single seed.

use rand::{Rng, rngs::StdRng};
use rand_distr::{Distribution, Gumbel};

/// Upper clamp for the Gumbel noise scale so distribution construction
/// never fails on extreme temperature settings
const MAX_NOISE_SCALE: f64 = 1.0e9;

/// Logarithmic interpolation between `start` and `end` at parameter `t`
///
/// Used for the learning-rate schedule: equal ratios per unit of `t` rather
/// than equal differences. Falls back to linear interpolation when either
/// endpoint is non-positive.
pub fn log_lerp(start: f64, end: f64, t: f64) -> f64 {
    if start <= 0.0 || end <= 0.0 {
        return (end - start).mul_add(t, start);
    }
    start * (end / start).powf(t)
}

/// Draw one standard Gumbel sample per class, scaled by `scale`
///
/// Adding these to logits and taking the argmax is equivalent to sampling
/// from the softmax distribution; shrinking the scale toward zero makes the
/// argmax deterministic.
pub fn gumbel_noise(rng: &mut StdRng, count: usize, scale: f64) -> Vec<f64> {
    let scale = scale.clamp(f64::MIN_POSITIVE, MAX_NOISE_SCALE);
    match Gumbel::new(0.0, scale) {
        Ok(distribution) => (0..count).map(|_| distribution.sample(rng)).collect(),
        Err(_) => vec![0.0; count],
    }
}

/// Noise scale for a user-facing temperature setting
///
/// Negative temperatures shift collapses toward the argmax, positive ones
/// toward uniform randomness; zero leaves the standard Gumbel scale.
pub fn temperature_scale(temperature: f64) -> f64 {
    temperature.exp()
}

/// Convert logits to probabilities in place, subtracting the maximum first
/// for numerical stability
pub fn softmax_in_place(logits: &mut [f64]) {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for logit in logits.iter_mut() {
        *logit = (*logit - max).exp();
        sum += *logit;
    }
    if sum > 0.0 {
        for logit in logits.iter_mut() {
            *logit /= sum;
        }
    }
}

/// Weighted random selection over non-negative weights
///
/// Returns an index into `weights` using the cumulative distribution; a
/// non-positive total falls back to index zero.
pub fn weighted_choice(rng: &mut StdRng, weights: &[f64]) -> usize {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 || weights.is_empty() {
        return 0;
    }

    let mut rand_val = rng.random::<f64>() * total;
    for (index, &weight) in weights.iter().enumerate() {
        rand_val -= weight;
        if rand_val <= 0.0 {
            return index;
        }
    }
    weights.len() - 1
}
