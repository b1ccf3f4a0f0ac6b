//! Utility functions for the langid system

/// Mathematical utilities
pub mod math {
    /// Numerically stable softmax
    pub fn softmax(x: &[f32]) -> Vec<f32> {
        let max_val = x.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let exp_values: Vec<f32> = x.iter().map(|&val| (val - max_val).exp()).collect();
        let sum: f32 = exp_values.iter().sum();
        exp_values.iter().map(|&val| val / sum).collect()
    }

    /// Index of the maximum value; ties break to the lowest index
    pub fn argmax(x: &[f32]) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (i, &val) in x.iter().enumerate() {
            match best {
                Some((_, best_val)) if val <= best_val => {}
                _ => best = Some((i, val)),
            }
        }
        best.map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::math::{argmax, softmax};
    use approx::assert_relative_eq;

    #[test]
    fn softmax_is_a_distribution() {
        let probs = softmax(&[1.0, 2.0, 3.0, -4.0]);
        let sum: f32 = probs.iter().sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-6);
        assert!(probs.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn softmax_handles_large_logits() {
        let probs = softmax(&[1000.0, 0.0]);
        assert_relative_eq!(probs[0], 1.0, epsilon = 1e-6);
        assert!(probs.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn argmax_breaks_ties_to_lowest_index() {
        assert_eq!(argmax(&[0.5, 0.5, 0.1]), Some(0));
        assert_eq!(argmax(&[0.1, 0.9, 0.9]), Some(1));
        assert_eq!(argmax(&[]), None);
    }
}
