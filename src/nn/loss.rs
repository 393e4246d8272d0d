//! Differentiable loss functions.
//!
//! The adversarial objective only needs binary cross-entropy over
//! probabilities (the discriminator already ends in a sigmoid).
//!
//! ```
//! use garrec::nn::loss::BCELoss;
//! use garrec::autograd::Tensor;
//!
//! let criterion = BCELoss::new();
//! let pred = Tensor::new(&[0.9, 0.2], &[2, 1]);
//! let target = Tensor::new(&[1.0, 0.0], &[2, 1]);
//! let loss = criterion.forward(&pred, &target);
//! assert!(loss.item() < 0.2);
//! ```
//!
//! # References
//!
//! - Bishop, C. M. (2006). Pattern Recognition and Machine Learning. Springer.

use crate::autograd::grad_fn::BinaryCrossEntropyBackward;
use crate::autograd::{is_grad_enabled, with_graph, Tensor};
use std::sync::Arc;

/// Lower clamp applied to each log term, so p = 0 or p = 1 stays finite.
pub const BCE_LOG_CLAMP: f32 = -100.0;

/// Reduction mode for loss functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reduction {
    /// Return mean of losses (default)
    #[default]
    Mean,
    /// Return sum of losses
    Sum,
}

/// Binary cross-entropy over probabilities.
///
/// ```text
/// loss = -[y * log(p) + (1 - y) * log(1 - p)]
/// ```
///
/// Each log term is clamped at [`BCE_LOG_CLAMP`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BCELoss {
    reduction: Reduction,
}

impl BCELoss {
    /// Create a BCELoss with mean reduction.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create BCELoss with specified reduction.
    #[must_use]
    pub fn with_reduction(reduction: Reduction) -> Self {
        Self { reduction }
    }

    /// Compute the loss of probabilities `pred` against binary `target`.
    ///
    /// # Panics
    ///
    /// Panics if the shapes differ or the input is empty.
    #[must_use]
    pub fn forward(&self, pred: &Tensor, target: &Tensor) -> Tensor {
        assert_eq!(
            pred.shape(),
            target.shape(),
            "Prediction and target shapes must match"
        );
        assert!(pred.numel() > 0, "BCELoss requires a non-empty input");

        let total: f32 = pred
            .data()
            .iter()
            .zip(target.data())
            .map(|(&p, &y)| {
                let log_p = p.ln().max(BCE_LOG_CLAMP);
                let log_1mp = (1.0 - p).ln().max(BCE_LOG_CLAMP);
                -(y * log_p + (1.0 - y) * log_1mp)
            })
            .sum();

        let scale = match self.reduction {
            Reduction::Mean => 1.0 / pred.numel() as f32,
            Reduction::Sum => 1.0,
        };
        let mut loss = Tensor::new(&[total * scale], &[1]);

        if is_grad_enabled() && pred.requires_grad_enabled() {
            loss.requires_grad_(true);
            let grad_fn = Arc::new(BinaryCrossEntropyBackward {
                input: pred.clone(),
                target: target.clone(),
                scale,
            });
            loss.set_grad_fn(grad_fn.clone());

            with_graph(|graph| {
                graph.register_tensor(pred.clone());
                graph.record(loss.id(), grad_fn, vec![pred.id()]);
            });
        }

        loss
    }
}

/// Mean binary cross-entropy of `pred` against a constant `label`.
#[must_use]
pub fn binary_cross_entropy(pred: &Tensor, label: f32) -> Tensor {
    let target = Tensor::from_vec(vec![label; pred.numel()], pred.shape());
    BCELoss::new().forward(pred, &target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::{clear_graph, get_grad};

    #[test]
    fn test_bce_known_value() {
        let pred = Tensor::from_slice(&[0.5]);
        let loss = binary_cross_entropy(&pred, 1.0);
        assert!((loss.item() - std::f32::consts::LN_2).abs() < 1e-6);
    }

    #[test]
    fn test_bce_perfect_prediction_is_near_zero() {
        let loss = binary_cross_entropy(&Tensor::from_slice(&[1.0, 1.0]), 1.0);
        assert!(loss.item().abs() < 1e-6);
    }

    #[test]
    fn test_bce_is_clamped_at_saturation() {
        // log(0) would be -inf; the clamp caps each term at 100.
        let loss = binary_cross_entropy(&Tensor::from_slice(&[0.0]), 1.0);
        assert!(loss.item().is_finite());
        assert!((loss.item() - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_bce_sum_vs_mean() {
        let pred = Tensor::from_slice(&[0.2, 0.7, 0.9]);
        let target = Tensor::from_slice(&[0.0, 1.0, 1.0]);
        let mean = BCELoss::new().forward(&pred, &target).item();
        let sum = BCELoss::with_reduction(Reduction::Sum)
            .forward(&pred, &target)
            .item();
        assert!((sum - 3.0 * mean).abs() < 1e-5);
    }

    #[test]
    fn test_bce_gradient() {
        // d/dp mean BCE = (p - y) / (p (1 - p)) / n
        clear_graph();
        let pred = Tensor::from_slice(&[0.25, 0.8]).requires_grad();
        let target = Tensor::from_slice(&[1.0, 0.0]);

        BCELoss::new().forward(&pred, &target).backward();

        let grad = get_grad(pred.id()).expect("grad");
        let expected = [(-0.75 / (0.25 * 0.75)) / 2.0, (0.8 / (0.8 * 0.2)) / 2.0];
        for (g, e) in grad.data().iter().zip(expected.iter()) {
            assert!((g - e).abs() < 1e-3, "Expected {e}, got {g}");
        }
    }

    #[test]
    #[should_panic(expected = "shapes must match")]
    fn test_bce_shape_mismatch_panics() {
        let _ = BCELoss::new().forward(&Tensor::from_slice(&[0.5]), &Tensor::from_slice(&[1.0, 0.0]));
    }
}
