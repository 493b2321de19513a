//! Tests for softmax stability, noise scaling, and weighted selection

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};
    use tileweave::math::sampling::{
        gumbel_noise, log_lerp, softmax_in_place, temperature_scale, weighted_choice,
    };

    // Verifies the schedule hits both endpoints and moves geometrically
    // Verified by replacing the ratio power with a linear blend
    #[test]
    fn test_log_lerp_endpoints() {
        assert!((log_lerp(0.1, 0.001, 0.0) - 0.1).abs() < 1e-12);
        assert!((log_lerp(0.1, 0.001, 1.0) - 0.001).abs() < 1e-12);
        // Halfway in log space is the geometric mean
        let mid = log_lerp(0.1, 0.001, 0.5);
        assert!((mid - 0.01).abs() < 1e-9);
    }

    // Tests softmax output is a distribution even for huge logits
    // Verified by removing the max subtraction
    #[test]
    fn test_softmax_stability() {
        let mut logits = vec![1000.0, 1001.0, 999.0];
        softmax_in_place(&mut logits);
        let sum: f64 = logits.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(logits.iter().all(|p| p.is_finite() && *p >= 0.0));
        assert!(logits[1] > logits[0]);
        assert!(logits[0] > logits[2]);
    }

    // Tests the noise vector shrinks with the scale
    // Verified by ignoring the scale parameter
    #[test]
    fn test_gumbel_noise_scale() {
        let mut rng = StdRng::seed_from_u64(7);
        let small = gumbel_noise(&mut rng, 200, 1e-6);
        let mut rng = StdRng::seed_from_u64(7);
        let large = gumbel_noise(&mut rng, 200, 10.0);

        let small_spread: f64 = small.iter().map(|g| g.abs()).sum();
        let large_spread: f64 = large.iter().map(|g| g.abs()).sum();
        assert!(small_spread < large_spread);
    }

    // Tests the temperature mapping is positive and monotone
    // Verified by negating the exponent
    #[test]
    fn test_temperature_scale_monotone() {
        assert!(temperature_scale(-5.0) < temperature_scale(0.0));
        assert!(temperature_scale(0.0) < temperature_scale(5.0));
        assert!(temperature_scale(-50.0) > 0.0);
        assert!((temperature_scale(0.0) - 1.0).abs() < 1e-12);
    }

    // Tests weighted choice respects zero weights and stays in range
    // Verified by selecting from the raw index distribution instead
    #[test]
    fn test_weighted_choice_skips_zero_weights() {
        let mut rng = StdRng::seed_from_u64(11);
        let weights = [0.0, 0.0, 1.0, 0.0];
        for _ in 0..50 {
            assert_eq!(weighted_choice(&mut rng, &weights), 2);
        }
    }

    // Tests degenerate weight vectors fall back to index zero
    // Verified by letting the cumulative scan run off the end
    #[test]
    fn test_weighted_choice_degenerate() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(weighted_choice(&mut rng, &[]), 0);
        assert_eq!(weighted_choice(&mut rng, &[0.0, 0.0]), 0);
    }
}
