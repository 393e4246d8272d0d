//! Fully connected (linear) layer.
//!
//! Implements the transformation y = xW^T + b.

use super::init::linear_params;
use super::module::Module;
use crate::autograd::Tensor;

/// Fully connected layer: y = xW^T + b
///
/// Weight and bias are both drawn from U(-1/sqrt(in_features), 1/sqrt(in_features)).
///
/// # Shape
///
/// - Input: `(N, in_features)`
/// - Output: `(N, out_features)`
///
/// ```
/// use garrec::nn::{Linear, Module};
/// use garrec::autograd::Tensor;
///
/// let layer = Linear::with_seed(20, 30, Some(1));
/// let output = layer.forward(&Tensor::ones(&[128, 20]));
/// assert_eq!(output.shape(), &[128, 30]);
/// ```
pub struct Linear {
    /// Weight matrix, shape: [out_features, in_features]
    weight: Tensor,

    /// Bias vector, shape: [out_features]
    bias: Tensor,

    in_features: usize,
    out_features: usize,
}

impl Linear {
    /// Create a new Linear layer with fan-in uniform initialization.
    #[must_use]
    pub fn new(in_features: usize, out_features: usize) -> Self {
        Self::with_seed(in_features, out_features, None)
    }

    /// Create a Linear layer with a specific random seed.
    #[must_use]
    pub fn with_seed(in_features: usize, out_features: usize, seed: Option<u64>) -> Self {
        let (weight, bias) = linear_params(in_features, out_features, seed);
        let weight = weight.requires_grad();
        let bias = bias.requires_grad();

        Self {
            weight,
            bias,
            in_features,
            out_features,
        }
    }

    /// Get the input feature dimension.
    #[must_use]
    pub fn in_features(&self) -> usize {
        self.in_features
    }

    /// Get the output feature dimension.
    #[must_use]
    pub fn out_features(&self) -> usize {
        self.out_features
    }

    /// Get reference to weight tensor.
    #[must_use]
    pub fn weight(&self) -> &Tensor {
        &self.weight
    }

    /// Get reference to bias tensor.
    #[must_use]
    pub fn bias(&self) -> &Tensor {
        &self.bias
    }
}

impl Module for Linear {
    fn forward(&self, input: &Tensor) -> Tensor {
        assert_eq!(
            input.shape().last().copied(),
            Some(self.in_features),
            "Linear expects {} input features, got shape {:?}",
            self.in_features,
            input.shape()
        );

        // Transposed on every call so the gradient reaches the weight leaf.
        input
            .matmul(&self.weight.transpose())
            .broadcast_add(&self.bias)
    }

    fn parameters(&self) -> Vec<&Tensor> {
        vec![&self.weight, &self.bias]
    }

    fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        vec![&mut self.weight, &mut self.bias]
    }
}

impl std::fmt::Debug for Linear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Linear")
            .field("in_features", &self.in_features)
            .field("out_features", &self.out_features)
            .finish_non_exhaustive()
    }
}
