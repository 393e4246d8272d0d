//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use garrec::prelude::*;
//! ```

pub use crate::autograd::{clear_graph, no_grad, Tensor};
pub use crate::error::{GarError, Result};
pub use crate::nn::{Adam, Module, Optimizer, SGD};
pub use crate::recommend::{
    ContentFeatures, Discriminator, EmbeddingTable, GarConfig, GarRec, Generator, IdBatch,
    IdSpace, ItemPartition, LossBreakdown,
};
