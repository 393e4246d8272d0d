//! Neural network building blocks for the generator and discriminator.
//!
//! Organized around the [`Module`] trait:
//!
//! - **Layers**: [`Linear`]
//! - **Activations**: [`LeakyReLU`], [`Sigmoid`]
//! - **Containers**: [`Sequential`]
//! - **Init**: [`xavier_normal`], [`fan_in_uniform`]
//! - **Losses**: [`BCELoss`]
//! - **Optimizers**: [`SGD`], [`Adam`]
//!
//! # References
//!
//! - Paszke, A., et al. (2019). `PyTorch`: An imperative style, high-performance
//!   deep learning library. `NeurIPS`.
//! - Glorot, X., & Bengio, Y. (2010). Understanding the difficulty of training
//!   deep feedforward neural networks. AISTATS.

mod activation;
mod container;
mod init;
mod linear;
pub mod loss;
mod module;
pub mod optim;

pub use activation::{LeakyReLU, Sigmoid};
pub use container::Sequential;
pub use init::{fan_in_uniform, xavier_normal};
pub use linear::Linear;
pub use loss::{binary_cross_entropy, BCELoss, Reduction};
pub use module::Module;
pub use optim::{Adam, Optimizer, SGD};
