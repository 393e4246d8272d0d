//! Gradient function trait and implementations.
//!
//! Each differentiable operation implements `GradFn` to define
//! how gradients flow backward through the operation.

use super::tensor::Tensor;

/// Trait for functions that compute gradients during backward pass.
///
/// Each differentiable operation creates a `GradFn` implementation
/// that captures the necessary context for gradient computation.
///
/// For element-wise addition z = x + y:
/// - ∂z/∂x = 1
/// - ∂z/∂y = 1
///
/// So `backward(grad_output)` returns [`grad_output`, `grad_output`].
pub trait GradFn: Send + Sync {
    /// Compute gradients with respect to inputs.
    ///
    /// Returns one gradient per input, in the order the inputs were recorded.
    fn backward(&self, grad_output: &Tensor) -> Vec<Tensor>;

    /// Human-readable name for debugging.
    fn name(&self) -> &'static str;
}

/// Reduce a gradient back to the shape of an input that was broadcast.
///
/// Only scalar broadcasting is supported; equal-sized gradients are reshaped.
pub(crate) fn maybe_reduce_grad(grad: &Tensor, target_shape: &[usize]) -> Tensor {
    let target_numel: usize = target_shape.iter().product();
    if grad.numel() == target_numel {
        return Tensor::new(grad.data(), target_shape);
    }
    assert_eq!(
        target_numel, 1,
        "cannot reduce gradient of shape {:?} to {:?}",
        grad.shape(),
        target_shape
    );
    let total: f32 = grad.data().iter().sum();
    Tensor::new(&[total], target_shape)
}

// ============================================================================
// Element-wise Operations
// ============================================================================

/// Gradient function for addition: z = x + y
pub(crate) struct AddBackward {
    pub(crate) x_shape: Vec<usize>,
    pub(crate) y_shape: Vec<usize>,
}

impl GradFn for AddBackward {
    fn backward(&self, grad_output: &Tensor) -> Vec<Tensor> {
        let grad_x = maybe_reduce_grad(grad_output, &self.x_shape);
        let grad_y = maybe_reduce_grad(grad_output, &self.y_shape);
        vec![grad_x, grad_y]
    }

    fn name(&self) -> &'static str {
        "AddBackward"
    }
}

/// Gradient function for multiplication: z = x * y
pub(crate) struct MulBackward {
    pub(crate) x: Tensor,
    pub(crate) y: Tensor,
}

impl GradFn for MulBackward {
    fn backward(&self, grad_output: &Tensor) -> Vec<Tensor> {
        // ∂(x*y)/∂x = y, ∂(x*y)/∂y = x
        let grad_x_data: Vec<f32> = grad_output
            .data()
            .iter()
            .zip(self.y.data())
            .map(|(&g, &y)| g * y)
            .collect();
        let grad_y_data: Vec<f32> = grad_output
            .data()
            .iter()
            .zip(self.x.data())
            .map(|(&g, &x)| g * x)
            .collect();

        vec![
            Tensor::from_vec(grad_x_data, self.x.shape()),
            Tensor::from_vec(grad_y_data, self.y.shape()),
        ]
    }

    fn name(&self) -> &'static str {
        "MulBackward"
    }
}

/// Gradient function for scalar multiplication: z = x * c
pub(crate) struct MulScalarBackward {
    pub(crate) scalar: f32,
}

impl GradFn for MulScalarBackward {
    fn backward(&self, grad_output: &Tensor) -> Vec<Tensor> {
        let grad: Vec<f32> = grad_output.data().iter().map(|&g| g * self.scalar).collect();
        vec![Tensor::from_vec(grad, grad_output.shape())]
    }

    fn name(&self) -> &'static str {
        "MulScalarBackward"
    }
}

// ============================================================================
// Reduction Operations
// ============================================================================

/// Gradient function for sum: z = sum(x)
pub(crate) struct SumBackward {
    pub(crate) input_shape: Vec<usize>,
}

impl GradFn for SumBackward {
    fn backward(&self, grad_output: &Tensor) -> Vec<Tensor> {
        let g = grad_output.item();
        let numel: usize = self.input_shape.iter().product();
        vec![Tensor::from_vec(vec![g; numel], &self.input_shape)]
    }

    fn name(&self) -> &'static str {
        "SumBackward"
    }
}

/// Gradient function for the Euclidean norm: z = ||x||
///
/// ∂z/∂x = x / ||x||, taken as zero when ||x|| = 0.
pub(crate) struct NormBackward {
    pub(crate) x: Tensor,
    pub(crate) norm: f32,
}

impl GradFn for NormBackward {
    fn backward(&self, grad_output: &Tensor) -> Vec<Tensor> {
        if self.norm == 0.0 {
            return vec![Tensor::zeros(self.x.shape())];
        }
        let scale = grad_output.item() / self.norm;
        let grad_data: Vec<f32> = self.x.data().iter().map(|&x| x * scale).collect();
        vec![Tensor::from_vec(grad_data, self.x.shape())]
    }

    fn name(&self) -> &'static str {
        "NormBackward"
    }
}

// ============================================================================
// Activation Functions
// ============================================================================

/// Gradient function for `LeakyReLU`: z = max(negative_slope * x, x)
pub(crate) struct LeakyReluBackward {
    pub(crate) x: Tensor,
    pub(crate) negative_slope: f32,
}

impl GradFn for LeakyReluBackward {
    fn backward(&self, grad_output: &Tensor) -> Vec<Tensor> {
        let grad_data: Vec<f32> = grad_output
            .data()
            .iter()
            .zip(self.x.data())
            .map(|(&g, &x)| if x > 0.0 { g } else { g * self.negative_slope })
            .collect();
        vec![Tensor::from_vec(grad_data, grad_output.shape())]
    }

    fn name(&self) -> &'static str {
        "LeakyReluBackward"
    }
}

/// Gradient function for sigmoid: z = σ(x)
pub(crate) struct SigmoidBackward {
    pub(crate) output: Tensor, // σ(x)
}

impl GradFn for SigmoidBackward {
    fn backward(&self, grad_output: &Tensor) -> Vec<Tensor> {
        // ∂σ(x)/∂x = σ(x) * (1 - σ(x))
        let grad_data: Vec<f32> = grad_output
            .data()
            .iter()
            .zip(self.output.data())
            .map(|(&g, &s)| g * s * (1.0 - s))
            .collect();
        vec![Tensor::from_vec(grad_data, grad_output.shape())]
    }

    fn name(&self) -> &'static str {
        "SigmoidBackward"
    }
}

// ============================================================================
// Linear Algebra
// ============================================================================

/// Gradient function for matmul: Z = X @ Y
pub(crate) struct MatmulBackward {
    pub(crate) x: Tensor,
    pub(crate) y: Tensor,
}

impl GradFn for MatmulBackward {
    fn backward(&self, grad_output: &Tensor) -> Vec<Tensor> {
        // ∂L/∂X = G @ Yᵀ, ∂L/∂Y = Xᵀ @ G
        let (m, k) = (self.x.shape()[0], self.x.shape()[1]);
        let n = self.y.shape()[1];
        let g = grad_output.data();
        let x = self.x.data();
        let y = self.y.data();

        let mut grad_x = vec![0.0; m * k];
        for i in 0..m {
            for p in 0..k {
                let mut acc = 0.0;
                for j in 0..n {
                    acc += g[i * n + j] * y[p * n + j];
                }
                grad_x[i * k + p] = acc;
            }
        }

        let mut grad_y = vec![0.0; k * n];
        for p in 0..k {
            for j in 0..n {
                let mut acc = 0.0;
                for i in 0..m {
                    acc += x[i * k + p] * g[i * n + j];
                }
                grad_y[p * n + j] = acc;
            }
        }

        vec![
            Tensor::from_vec(grad_x, &[m, k]),
            Tensor::from_vec(grad_y, &[k, n]),
        ]
    }

    fn name(&self) -> &'static str {
        "MatmulBackward"
    }
}

/// Gradient function for 2-D transpose.
pub(crate) struct TransposeBackward;

impl GradFn for TransposeBackward {
    fn backward(&self, grad_output: &Tensor) -> Vec<Tensor> {
        // The gradient of a transpose is the transposed gradient.
        let (rows, cols) = (grad_output.shape()[0], grad_output.shape()[1]);
        let g = grad_output.data();
        let mut data = vec![0.0; rows * cols];
        for i in 0..rows {
            for j in 0..cols {
                data[j * rows + i] = g[i * cols + j];
            }
        }
        vec![Tensor::from_vec(data, &[cols, rows])]
    }

    fn name(&self) -> &'static str {
        "TransposeBackward"
    }
}

/// Gradient function for row-broadcast addition: Z = X + b
pub(crate) struct BroadcastAddBackward {
    pub(crate) x_shape: Vec<usize>,
    pub(crate) y_shape: Vec<usize>,
}

impl GradFn for BroadcastAddBackward {
    fn backward(&self, grad_output: &Tensor) -> Vec<Tensor> {
        let (rows, cols) = (self.x_shape[0], self.x_shape[1]);
        let g = grad_output.data();
        let mut grad_b = vec![0.0; cols];
        for i in 0..rows {
            for j in 0..cols {
                grad_b[j] += g[i * cols + j];
            }
        }
        vec![
            Tensor::new(g, &self.x_shape),
            Tensor::from_vec(grad_b, &self.y_shape),
        ]
    }

    fn name(&self) -> &'static str {
        "BroadcastAddBackward"
    }
}

// ============================================================================
// Indexing and Layout
// ============================================================================

/// Gradient function for row gather: Z = X[indices]
///
/// Rows gathered more than once receive the sum of their gradients.
pub(crate) struct IndexSelectBackward {
    pub(crate) input_shape: Vec<usize>,
    pub(crate) indices: Vec<usize>,
}

impl GradFn for IndexSelectBackward {
    fn backward(&self, grad_output: &Tensor) -> Vec<Tensor> {
        let cols = self.input_shape[1];
        let g = grad_output.data();
        let mut grad = vec![0.0; self.input_shape.iter().product()];
        for (out_row, &src_row) in self.indices.iter().enumerate() {
            let dst = &mut grad[src_row * cols..(src_row + 1) * cols];
            for (d, s) in dst.iter_mut().zip(&g[out_row * cols..(out_row + 1) * cols]) {
                *d += s;
            }
        }
        vec![Tensor::from_vec(grad, &self.input_shape)]
    }

    fn name(&self) -> &'static str {
        "IndexSelectBackward"
    }
}

/// Gradient function for column concatenation: Z = [X | Y]
pub(crate) struct ConcatColsBackward {
    pub(crate) left_cols: usize,
    pub(crate) right_cols: usize,
}

impl GradFn for ConcatColsBackward {
    fn backward(&self, grad_output: &Tensor) -> Vec<Tensor> {
        let rows = grad_output.shape()[0];
        let total = self.left_cols + self.right_cols;
        let mut left = Vec::with_capacity(rows * self.left_cols);
        let mut right = Vec::with_capacity(rows * self.right_cols);
        for row in grad_output.data().chunks(total) {
            left.extend_from_slice(&row[..self.left_cols]);
            right.extend_from_slice(&row[self.left_cols..]);
        }
        vec![
            Tensor::from_vec(left, &[rows, self.left_cols]),
            Tensor::from_vec(right, &[rows, self.right_cols]),
        ]
    }

    fn name(&self) -> &'static str {
        "ConcatColsBackward"
    }
}

// ============================================================================
// Losses
// ============================================================================

/// Gradient function for mean binary cross-entropy over probabilities.
///
/// ∂L/∂pᵢ = (pᵢ - yᵢ) / max(pᵢ(1 - pᵢ), ε) / n
pub(crate) struct BinaryCrossEntropyBackward {
    pub(crate) input: Tensor,
    pub(crate) target: Tensor,
    pub(crate) scale: f32,
}

/// Lower bound on p(1-p) in the BCE gradient denominator.
const BCE_GRAD_EPS: f32 = 1e-12;

impl GradFn for BinaryCrossEntropyBackward {
    fn backward(&self, grad_output: &Tensor) -> Vec<Tensor> {
        let g = grad_output.item() * self.scale;
        let grad: Vec<f32> = self
            .input
            .data()
            .iter()
            .zip(self.target.data())
            .map(|(&p, &y)| g * (p - y) / (p * (1.0 - p)).max(BCE_GRAD_EPS))
            .collect();
        vec![Tensor::from_vec(grad, self.input.shape())]
    }

    fn name(&self) -> &'static str {
        "BinaryCrossEntropyBackward"
    }
}
