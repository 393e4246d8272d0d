//! Differentiable operations for tensors.
//!
//! Each operation:
//! 1. Computes the forward result
//! 2. Records a `GradFn` to the computation graph (if gradient tracking is enabled
//!    and at least one input requires gradients)

use std::sync::Arc;

use super::grad_fn::{
    AddBackward, BroadcastAddBackward, ConcatColsBackward, GradFn, IndexSelectBackward,
    LeakyReluBackward, MatmulBackward, MulBackward, MulScalarBackward, NormBackward,
    SigmoidBackward, SumBackward, TransposeBackward,
};
use super::tensor::Tensor;
use super::{is_grad_enabled, with_graph};

/// Tape `result` as the output of `grad_fn` applied to `inputs`.
fn record(result: &mut Tensor, grad_fn: Arc<dyn GradFn>, inputs: &[&Tensor]) {
    if !is_grad_enabled() || !inputs.iter().any(|t| t.requires_grad_enabled()) {
        return;
    }

    result.requires_grad_(true);
    result.set_grad_fn(grad_fn.clone());

    with_graph(|graph| {
        for input in inputs {
            graph.register_tensor((*input).clone());
        }
        graph.record(result.id(), grad_fn, inputs.iter().map(|t| t.id()).collect());
    });
}

// ============================================================================
// Element-wise Operations
// ============================================================================

impl Tensor {
    /// Element-wise addition: z = self + other
    #[must_use]
    pub fn add(&self, other: &Tensor) -> Tensor {
        assert_eq!(self.numel(), other.numel(), "add requires equal sizes");
        let data: Vec<f32> = self
            .data()
            .iter()
            .zip(other.data())
            .map(|(&a, &b)| a + b)
            .collect();

        let mut result = Tensor::from_vec(data, self.shape());
        let grad_fn = Arc::new(AddBackward {
            x_shape: self.shape().to_vec(),
            y_shape: other.shape().to_vec(),
        });
        record(&mut result, grad_fn, &[self, other]);
        result
    }

    /// Element-wise multiplication: z = self * other
    #[must_use]
    pub fn mul(&self, other: &Tensor) -> Tensor {
        assert_eq!(self.shape(), other.shape(), "mul requires equal shapes");
        let data: Vec<f32> = self
            .data()
            .iter()
            .zip(other.data())
            .map(|(&a, &b)| a * b)
            .collect();

        let mut result = Tensor::from_vec(data, self.shape());
        let grad_fn = Arc::new(MulBackward {
            x: self.clone(),
            y: other.clone(),
        });
        record(&mut result, grad_fn, &[self, other]);
        result
    }

    /// Scalar multiplication: z = self * scalar
    #[must_use]
    pub fn mul_scalar(&self, scalar: f32) -> Tensor {
        let data: Vec<f32> = self.data().iter().map(|&a| a * scalar).collect();
        let mut result = Tensor::from_vec(data, self.shape());
        record(&mut result, Arc::new(MulScalarBackward { scalar }), &[self]);
        result
    }
}

// ============================================================================
// Reduction Operations
// ============================================================================

impl Tensor {
    /// Sum all elements: z = sum(self)
    #[must_use]
    pub fn sum(&self) -> Tensor {
        let sum: f32 = self.data().iter().sum();
        let mut result = Tensor::new(&[sum], &[1]);
        let grad_fn = Arc::new(SumBackward {
            input_shape: self.shape().to_vec(),
        });
        record(&mut result, grad_fn, &[self]);
        result
    }

    /// Euclidean (Frobenius) norm over every element: z = sqrt(sum(self²))
    ///
    /// The gradient at the origin is zero rather than 0/0.
    #[must_use]
    pub fn norm(&self) -> Tensor {
        let norm = self.data().iter().map(|&a| a * a).sum::<f32>().sqrt();
        let mut result = Tensor::new(&[norm], &[1]);
        let grad_fn = Arc::new(NormBackward {
            x: self.clone(),
            norm,
        });
        record(&mut result, grad_fn, &[self]);
        result
    }
}

// ============================================================================
// Activation Functions
// ============================================================================

impl Tensor {
    /// Sigmoid activation: z = 1 / (1 + exp(-self))
    #[must_use]
    pub fn sigmoid(&self) -> Tensor {
        let data: Vec<f32> = self
            .data()
            .iter()
            .map(|&a| 1.0 / (1.0 + (-a).exp()))
            .collect();
        let mut result = Tensor::from_vec(data, self.shape());
        let grad_fn = Arc::new(SigmoidBackward {
            output: result.clone(),
        });
        record(&mut result, grad_fn, &[self]);
        result
    }

    /// Leaky `ReLU` activation: z = max(negative_slope * x, x)
    #[must_use]
    pub fn leaky_relu(&self, negative_slope: f32) -> Tensor {
        let data: Vec<f32> = self
            .data()
            .iter()
            .map(|&x| if x > 0.0 { x } else { negative_slope * x })
            .collect();
        let mut result = Tensor::from_vec(data, self.shape());
        let grad_fn = Arc::new(LeakyReluBackward {
            x: self.clone(),
            negative_slope,
        });
        record(&mut result, grad_fn, &[self]);
        result
    }
}

// ============================================================================
// Linear Algebra
// ============================================================================

impl Tensor {
    /// Matrix multiplication: z = self @ other (2D only).
    ///
    /// Each output element accumulates its products in ascending order of the
    /// shared dimension, so `z[i][j]` equals the plain sequential dot product
    /// of row `i` and column `j`.
    #[must_use]
    pub fn matmul(&self, other: &Tensor) -> Tensor {
        assert_eq!(self.ndim(), 2, "matmul requires 2D tensors");
        assert_eq!(other.ndim(), 2, "matmul requires 2D tensors");

        let (m, k1) = (self.shape()[0], self.shape()[1]);
        let (k2, n) = (other.shape()[0], other.shape()[1]);
        assert_eq!(k1, k2, "matmul dimension mismatch: {k1} vs {k2}");

        let a = self.data();
        let b = other.data();
        let mut data = vec![0.0; m * n];
        for i in 0..m {
            for j in 0..n {
                let mut acc = 0.0;
                for p in 0..k1 {
                    acc += a[i * k1 + p] * b[p * n + j];
                }
                data[i * n + j] = acc;
            }
        }

        let mut result = Tensor::from_vec(data, &[m, n]);
        let grad_fn = Arc::new(MatmulBackward {
            x: self.clone(),
            y: other.clone(),
        });
        record(&mut result, grad_fn, &[self, other]);
        result
    }

    /// Transpose a 2D tensor.
    #[must_use]
    pub fn transpose(&self) -> Tensor {
        assert_eq!(self.ndim(), 2, "transpose requires 2D tensor");

        let (rows, cols) = (self.shape()[0], self.shape()[1]);
        let mut data = vec![0.0; rows * cols];
        for i in 0..rows {
            for j in 0..cols {
                data[j * rows + i] = self.data()[i * cols + j];
            }
        }

        let mut result = Tensor::from_vec(data, &[cols, rows]);
        record(&mut result, Arc::new(TransposeBackward), &[self]);
        result
    }

    /// Broadcast addition: z = matrix + vector (broadcasts over rows).
    ///
    /// # Shape
    ///
    /// - self: `[N, M]`
    /// - other: `[M]`
    /// - output: `[N, M]`
    #[must_use]
    pub fn broadcast_add(&self, other: &Tensor) -> Tensor {
        assert_eq!(self.ndim(), 2, "broadcast_add requires 2D matrix");
        assert_eq!(other.ndim(), 1, "broadcast_add requires 1D vector");
        assert_eq!(
            self.shape()[1],
            other.shape()[0],
            "Matrix columns {} must match vector length {}",
            self.shape()[1],
            other.shape()[0]
        );

        let cols = self.shape()[1];
        let data: Vec<f32> = self
            .data()
            .iter()
            .enumerate()
            .map(|(idx, &x)| x + other.data()[idx % cols])
            .collect();

        let mut result = Tensor::from_vec(data, self.shape());
        let grad_fn = Arc::new(BroadcastAddBackward {
            x_shape: self.shape().to_vec(),
            y_shape: other.shape().to_vec(),
        });
        record(&mut result, grad_fn, &[self, other]);
        result
    }
}

// ============================================================================
// Indexing and Layout
// ============================================================================

impl Tensor {
    /// Gather rows of a 2D tensor: z = self[indices].
    ///
    /// Gradients flow back to the gathered rows; repeated indices accumulate.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of range. Callers that accept external ids
    /// validate them first.
    #[must_use]
    pub fn index_select(&self, indices: &[usize]) -> Tensor {
        assert_eq!(self.ndim(), 2, "index_select requires 2D tensor");
        let (rows, cols) = (self.shape()[0], self.shape()[1]);

        let mut data = Vec::with_capacity(indices.len() * cols);
        for &idx in indices {
            assert!(idx < rows, "index_select: index {idx} out of range for {rows} rows");
            data.extend_from_slice(self.row(idx));
        }

        let mut result = Tensor::from_vec(data, &[indices.len(), cols]);
        let grad_fn = Arc::new(IndexSelectBackward {
            input_shape: self.shape().to_vec(),
            indices: indices.to_vec(),
        });
        record(&mut result, grad_fn, &[self]);
        result
    }

    /// Concatenate two 2D tensors along the feature axis: z = [self | other].
    #[must_use]
    pub fn cat_cols(&self, other: &Tensor) -> Tensor {
        assert_eq!(self.ndim(), 2, "cat_cols requires 2D tensors");
        assert_eq!(other.ndim(), 2, "cat_cols requires 2D tensors");
        assert_eq!(
            self.shape()[0],
            other.shape()[0],
            "cat_cols: row counts differ ({} vs {})",
            self.shape()[0],
            other.shape()[0]
        );

        let rows = self.shape()[0];
        let (left_cols, right_cols) = (self.shape()[1], other.shape()[1]);
        let mut data = Vec::with_capacity(rows * (left_cols + right_cols));
        for i in 0..rows {
            data.extend_from_slice(self.row(i));
            data.extend_from_slice(other.row(i));
        }

        let mut result = Tensor::from_vec(data, &[rows, left_cols + right_cols]);
        let grad_fn = Arc::new(ConcatColsBackward {
            left_cols,
            right_cols,
        });
        record(&mut result, grad_fn, &[self, other]);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::{clear_graph, get_grad, no_grad};

    /// Numerical gradient check using central differences.
    fn numerical_gradient<F>(f: F, x: &Tensor, eps: f32) -> Tensor
    where
        F: Fn(&Tensor) -> Tensor,
    {
        let mut grad_data = vec![0.0; x.numel()];

        for i in 0..x.numel() {
            let mut x_plus = x.data().to_vec();
            let mut x_minus = x.data().to_vec();
            x_plus[i] += eps;
            x_minus[i] -= eps;

            let y_plus = no_grad(|| f(&Tensor::new(&x_plus, x.shape())).item());
            let y_minus = no_grad(|| f(&Tensor::new(&x_minus, x.shape())).item());

            grad_data[i] = (y_plus - y_minus) / (2.0 * eps);
        }

        Tensor::new(&grad_data, x.shape())
    }

    fn check_gradient<F>(f: F, x: &Tensor, eps: f32, tol: f32) -> bool
    where
        F: Fn(&Tensor) -> Tensor,
    {
        clear_graph();

        let x_grad = x.clone().requires_grad();
        let x_id = x_grad.id();
        let y = f(&x_grad);
        y.backward();

        let analytical = get_grad(x_id).expect("No gradient computed");
        let numerical = numerical_gradient(&f, x, eps);

        let max_diff: f32 = analytical
            .data()
            .iter()
            .zip(numerical.data())
            .map(|(a, n)| (a - n).abs())
            .fold(0.0, f32::max);

        max_diff < tol
    }

    #[test]
    fn test_add_gradient() {
        clear_graph();
        let x = Tensor::from_slice(&[1.0, 2.0, 3.0]).requires_grad();
        let y = Tensor::from_slice(&[4.0, 5.0, 6.0]);

        x.add(&y).sum().backward();

        let grad = get_grad(x.id()).expect("Should have gradient");
        assert_eq!(grad.data(), &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_mul_gradient() {
        clear_graph();
        let x = Tensor::from_slice(&[1.0, 2.0, 3.0]).requires_grad();
        let y = Tensor::from_slice(&[4.0, 5.0, 6.0]);

        x.mul(&y).sum().backward();

        let grad = get_grad(x.id()).expect("grad");
        assert_eq!(grad.data(), &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_chain_gradient() {
        // d/dx(sum((x * 2)^2)) = 8x, with y feeding both sides of mul
        clear_graph();
        let x = Tensor::from_slice(&[1.0, 2.0, 3.0]).requires_grad();

        let y = x.mul_scalar(2.0);
        y.mul(&y).sum().backward();

        let grad = get_grad(x.id()).expect("No gradient");
        for (g, e) in grad.data().iter().zip(&[8.0_f32, 16.0, 24.0]) {
            assert!((g - e).abs() < 1e-3, "Expected {e}, got {g}");
        }
    }

    #[test]
    fn test_norm_value_and_gradient() {
        let x = Tensor::new(&[3.0, 0.0, 0.0, 4.0], &[2, 2]);
        assert!((x.norm().item() - 5.0).abs() < 1e-6);

        // d||x||/dx = x / ||x||
        assert!(check_gradient(|t| t.norm(), &x, 1e-3, 1e-2));
    }

    #[test]
    fn test_norm_gradient_at_origin_is_zero() {
        clear_graph();
        let x = Tensor::zeros(&[2, 3]).requires_grad();
        let n = x.norm();
        assert_eq!(n.item(), 0.0);

        n.mul_scalar(0.5).backward();
        let grad = get_grad(x.id()).expect("grad");
        assert!(grad.data().iter().all(|g| g.is_finite()));
        assert_eq!(grad.data(), &[0.0; 6]);
    }

    #[test]
    fn test_sigmoid_gradient() {
        clear_graph();
        let x = Tensor::from_slice(&[0.0]).requires_grad();
        x.sigmoid().sum().backward();
        let grad = get_grad(x.id()).expect("grad");
        assert!((grad.data()[0] - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_leaky_relu_forward_and_gradient() {
        clear_graph();
        let x = Tensor::from_slice(&[-2.0, 3.0]).requires_grad();
        let y = x.leaky_relu(0.2);
        assert!((y.data()[0] + 0.4).abs() < 1e-6);
        assert_eq!(y.data()[1], 3.0);

        y.sum().backward();
        let grad = get_grad(x.id()).expect("grad");
        assert!((grad.data()[0] - 0.2).abs() < 1e-6);
        assert_eq!(grad.data()[1], 1.0);
    }

    #[test]
    fn test_matmul_forward() {
        let a = Tensor::new(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
        let b = Tensor::new(&[5.0, 6.0, 7.0, 8.0], &[2, 2]);

        let c = a.matmul(&b);

        assert_eq!(c.shape(), &[2, 2]);
        assert_eq!(c.data(), &[19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn test_matmul_gradient() {
        let w = Tensor::new(&[0.5, -1.0, 2.0, 0.25, 1.5, -0.5], &[3, 2]);
        let x = Tensor::new(&[1.0, 2.0, -1.0, 0.5, 0.0, 3.0], &[2, 3]);
        assert!(check_gradient(
            |t| {
                let y = t.matmul(&w);
                y.mul(&y).sum()
            },
            &x,
            1e-2,
            5e-2
        ));
    }

    #[test]
    fn test_transpose_forward() {
        let a = Tensor::new(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
        let t = a.transpose();
        assert_eq!(t.shape(), &[3, 2]);
        assert_eq!(t.data(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_broadcast_add_gradient() {
        clear_graph();
        let m = Tensor::new(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
        let b = Tensor::from_slice(&[10.0, 20.0]).requires_grad();

        let out = m.broadcast_add(&b);
        assert_eq!(out.data(), &[11.0, 22.0, 13.0, 24.0]);

        out.sum().backward();
        let grad = get_grad(b.id()).expect("grad");
        assert_eq!(grad.data(), &[2.0, 2.0]);
    }

    #[test]
    fn test_index_select_forward() {
        let table = Tensor::new(&[0.0, 1.0, 10.0, 11.0, 20.0, 21.0], &[3, 2]);
        let rows = table.index_select(&[2, 0]);
        assert_eq!(rows.shape(), &[2, 2]);
        assert_eq!(rows.data(), &[20.0, 21.0, 0.0, 1.0]);
    }

    #[test]
    fn test_index_select_repeated_ids_accumulate() {
        clear_graph();
        let table = Tensor::new(&[1.0, 1.0, 2.0, 2.0], &[2, 2]).requires_grad();

        table.index_select(&[1, 1, 0]).sum().backward();

        let grad = get_grad(table.id()).expect("grad");
        assert_eq!(grad.data(), &[1.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_index_select_out_of_range_panics() {
        let table = Tensor::zeros(&[2, 2]);
        let _ = table.index_select(&[2]);
    }

    #[test]
    fn test_cat_cols_forward_and_gradient() {
        clear_graph();
        let a = Tensor::new(&[1.0, 2.0], &[2, 1]).requires_grad();
        let b = Tensor::new(&[3.0, 4.0, 5.0, 6.0], &[2, 2]).requires_grad();

        let c = a.cat_cols(&b);
        assert_eq!(c.shape(), &[2, 3]);
        assert_eq!(c.data(), &[1.0, 3.0, 4.0, 2.0, 5.0, 6.0]);

        let weights = Tensor::new(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
        c.mul(&weights).sum().backward();

        assert_eq!(get_grad(a.id()).expect("grad").data(), &[1.0, 4.0]);
        assert_eq!(get_grad(b.id()).expect("grad").data(), &[2.0, 3.0, 5.0, 6.0]);
    }

    #[test]
    fn test_ops_without_grad_do_not_record() {
        clear_graph();
        let x = Tensor::from_slice(&[1.0, 2.0]);
        let y = x.mul_scalar(3.0).sum();
        assert!(!y.requires_grad_enabled());
        assert!(y.is_leaf());
    }
}
