//! The `Module` trait shared by every layer.

use crate::autograd::Tensor;

/// A differentiable transform with (possibly zero) trainable parameters.
///
/// Layers compose through [`Sequential`](super::Sequential); models built on
/// top expose their parameters in a stable order so an optimizer can keep
/// per-parameter state by index.
pub trait Module {
    /// Forward pass.
    fn forward(&self, input: &Tensor) -> Tensor;

    /// Trainable parameters.
    fn parameters(&self) -> Vec<&Tensor> {
        Vec::new()
    }

    /// Mutable access to trainable parameters, in the same order as
    /// [`Module::parameters`].
    fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        Vec::new()
    }

    /// Switch to training mode.
    fn train(&mut self) {}

    /// Switch to evaluation mode.
    fn eval(&mut self) {}

    /// Whether the module is in training mode.
    fn training(&self) -> bool {
        true
    }

    /// Total number of scalar parameters.
    fn num_parameters(&self) -> usize {
        self.parameters().iter().map(|p| p.numel()).sum()
    }
}
