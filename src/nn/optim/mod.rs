//! Gradient-based optimizers for the external training loop.
//!
//! The model never updates its own weights. A driver computes the losses,
//! calls `backward()`, then hands the model's `parameters_mut()` to an
//! optimizer and clears the tape:
//!
//! ```
//! use garrec::autograd::{clear_graph, Tensor};
//! use garrec::nn::{Linear, Module, Optimizer, SGD};
//!
//! let mut model = Linear::with_seed(4, 1, Some(0));
//! let mut optimizer = SGD::new(0.1);
//!
//! let out = model.forward(&Tensor::ones(&[2, 4]));
//! let loss = out.mul(&out).sum();
//! loss.backward();
//! optimizer.step(&mut model.parameters_mut());
//! clear_graph();
//! ```
//!
//! Parameter state (momentum, moments) is kept by position, so the same
//! parameter order must be passed on every step.
//!
//! # References
//!
//! - Robbins, H., & Monro, S. (1951). A stochastic approximation method.
//! - Kingma, D. P., & Ba, J. (2015). Adam: A method for stochastic optimization. ICLR.

use crate::autograd::{clear_grad, get_grad, Tensor};

/// Common trait for all optimizers.
pub trait Optimizer {
    /// Apply one update to `params` using the gradients on the tape.
    ///
    /// Parameters without a gradient are left untouched.
    fn step(&mut self, params: &mut [&mut Tensor]);

    /// Drop the gradients of `params` from the tape.
    fn zero_grad(&mut self, params: &[&Tensor]) {
        for p in params {
            clear_grad(p.id());
        }
    }

    /// Get current learning rate.
    fn lr(&self) -> f32;

    /// Set learning rate.
    fn set_lr(&mut self, lr: f32);
}

/// Stochastic Gradient Descent optimizer with optional momentum.
///
/// ```text
/// v_t = momentum * v_{t-1} + grad
/// param = param - lr * v_t
/// ```
#[derive(Debug)]
pub struct SGD {
    lr: f32,
    /// Momentum factor (0 = no momentum)
    momentum: f32,
    /// Weight decay (L2 regularization)
    weight_decay: f32,
    /// Velocity buffers, one per parameter position
    velocities: Vec<Vec<f32>>,
}

impl SGD {
    /// Create a new SGD optimizer.
    #[must_use]
    pub fn new(lr: f32) -> Self {
        Self {
            lr,
            momentum: 0.0,
            weight_decay: 0.0,
            velocities: Vec::new(),
        }
    }

    /// Create SGD with momentum.
    #[must_use]
    pub fn with_momentum(lr: f32, momentum: f32) -> Self {
        Self {
            momentum,
            ..Self::new(lr)
        }
    }

    /// Set weight decay (L2 regularization).
    #[must_use]
    pub fn weight_decay(mut self, wd: f32) -> Self {
        self.weight_decay = wd;
        self
    }

    fn update_param(&mut self, param: &mut Tensor, idx: usize) {
        let Some(grad) = get_grad(param.id()) else {
            return;
        };

        let grad_data = grad.data();
        let param_data = param.data_mut();

        if idx >= self.velocities.len() {
            self.velocities.resize(idx + 1, Vec::new());
        }
        if self.velocities[idx].len() != param_data.len() {
            self.velocities[idx] = vec![0.0; param_data.len()];
        }
        let velocity = &mut self.velocities[idx];

        for i in 0..param_data.len() {
            let mut g = grad_data[i];

            if self.weight_decay != 0.0 {
                g += self.weight_decay * param_data[i];
            }

            if self.momentum != 0.0 {
                velocity[i] = self.momentum * velocity[i] + g;
                param_data[i] -= self.lr * velocity[i];
            } else {
                param_data[i] -= self.lr * g;
            }
        }
    }
}

impl Optimizer for SGD {
    fn step(&mut self, params: &mut [&mut Tensor]) {
        for (idx, param) in params.iter_mut().enumerate() {
            self.update_param(param, idx);
        }
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }
}

/// Adam optimizer (Kingma & Ba, 2015).
///
/// ```text
/// m_t = β₁ * m_{t-1} + (1 - β₁) * grad
/// v_t = β₂ * v_{t-1} + (1 - β₂) * grad²
/// param = param - lr * m̂_t / (√v̂_t + ε)
/// ```
#[derive(Debug)]
pub struct Adam {
    lr: f32,
    beta1: f32,
    beta2: f32,
    eps: f32,
    /// First moment estimates
    m: Vec<Vec<f32>>,
    /// Second moment estimates
    v: Vec<Vec<f32>>,
    /// Current timestep for bias correction
    t: usize,
}

impl Adam {
    /// Create a new Adam optimizer with β₁=0.9, β₂=0.999, ε=1e-8.
    #[must_use]
    pub fn new(lr: f32) -> Self {
        Self {
            lr,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
            m: Vec::new(),
            v: Vec::new(),
            t: 0,
        }
    }

    /// Set beta parameters.
    #[must_use]
    pub fn betas(mut self, beta1: f32, beta2: f32) -> Self {
        self.beta1 = beta1;
        self.beta2 = beta2;
        self
    }

    /// Number of steps taken so far.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.t
    }

    fn update_param(&mut self, param: &mut Tensor, idx: usize) {
        let Some(grad) = get_grad(param.id()) else {
            return;
        };

        let grad_data = grad.data();
        let param_data = param.data_mut();

        if idx >= self.m.len() {
            self.m.resize(idx + 1, Vec::new());
            self.v.resize(idx + 1, Vec::new());
        }
        if self.m[idx].len() != param_data.len() {
            self.m[idx] = vec![0.0; param_data.len()];
            self.v[idx] = vec![0.0; param_data.len()];
        }

        let m = &mut self.m[idx];
        let v = &mut self.v[idx];

        let bias_correction1 = 1.0 - self.beta1.powi(self.t as i32);
        let bias_correction2 = 1.0 - self.beta2.powi(self.t as i32);

        for i in 0..param_data.len() {
            let g = grad_data[i];
            m[i] = self.beta1 * m[i] + (1.0 - self.beta1) * g;
            v[i] = self.beta2 * v[i] + (1.0 - self.beta2) * g * g;

            let m_hat = m[i] / bias_correction1;
            let v_hat = v[i] / bias_correction2;

            param_data[i] -= self.lr * m_hat / (v_hat.sqrt() + self.eps);
        }
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: &mut [&mut Tensor]) {
        self.t += 1;
        for (idx, param) in params.iter_mut().enumerate() {
            self.update_param(param, idx);
        }
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::clear_graph;

    fn quadratic_step<O: Optimizer>(opt: &mut O, x: &mut Tensor) {
        // loss = sum(x²), grad = 2x
        clear_graph();
        x.mul(x).sum().backward();
        opt.step(&mut [x]);
        clear_graph();
    }

    #[test]
    fn test_sgd_step() {
        let mut x = Tensor::from_slice(&[1.0, -2.0]).requires_grad();
        let mut sgd = SGD::new(0.1);

        quadratic_step(&mut sgd, &mut x);

        // x - 0.1 * 2x = 0.8x
        assert!((x.data()[0] - 0.8).abs() < 1e-6);
        assert!((x.data()[1] + 1.6).abs() < 1e-6);
    }

    #[test]
    fn test_sgd_momentum_accelerates() {
        let mut plain = Tensor::from_slice(&[1.0]).requires_grad();
        let mut heavy = Tensor::from_slice(&[1.0]).requires_grad();
        let mut sgd = SGD::new(0.01);
        let mut momentum = SGD::with_momentum(0.01, 0.9);

        for _ in 0..5 {
            quadratic_step(&mut sgd, &mut plain);
            quadratic_step(&mut momentum, &mut heavy);
        }

        assert!(heavy.data()[0] < plain.data()[0]);
    }

    #[test]
    fn test_sgd_skips_params_without_grad() {
        clear_graph();
        let mut untouched = Tensor::from_slice(&[3.0]).requires_grad();
        let mut sgd = SGD::new(1.0);
        sgd.step(&mut [&mut untouched]);
        assert_eq!(untouched.data(), &[3.0]);
    }

    #[test]
    fn test_adam_first_step_magnitude() {
        // With bias correction the first Adam step moves each coordinate by ~lr.
        let mut x = Tensor::from_slice(&[5.0, -5.0]).requires_grad();
        let mut adam = Adam::new(0.1);

        quadratic_step(&mut adam, &mut x);

        assert_eq!(adam.steps(), 1);
        assert!((x.data()[0] - 4.9).abs() < 1e-4);
        assert!((x.data()[1] + 4.9).abs() < 1e-4);
    }

    #[test]
    fn test_set_lr() {
        let mut adam = Adam::new(0.1).betas(0.8, 0.99);
        adam.set_lr(0.05);
        assert!((adam.lr() - 0.05).abs() < f32::EPSILON);
    }
}
