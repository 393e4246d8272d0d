//! Adversarial cold-start recommendation.
//!
//! Users and items live in one unified id space and share one embedding
//! table. Items without interaction history get embeddings synthesized from
//! their content features by a [`Generator`], which is trained against a
//! [`Discriminator`] so generated embeddings become indistinguishable from
//! learned ones.
//!
//! # Components
//!
//! - [`IdSpace`]: unified id arithmetic
//! - [`EmbeddingTable`]: the shared table
//! - [`ContentFeatures`] / [`ContentBank`]: normalized item side information
//! - [`Generator`] / [`Discriminator`]: the adversarial pair
//! - [`GarRec`]: scoring and loss composition
//!
//! # References
//!
//! - Chen, H., et al. (2022). Generative Adversarial Framework for Cold-Start
//!   Item Recommendation. SIGIR.
//! - Goodfellow, I., et al. (2014). Generative Adversarial Nets. `NeurIPS`.

mod adversarial;
mod batch;
mod config;
mod content;
mod embedding;
mod gar;
mod id_space;

pub use adversarial::{Discriminator, Generator, HIDDEN_DIM, LEAKY_SLOPE};
pub use batch::IdBatch;
pub use config::{GarConfig, ItemPartition};
pub use content::{l2_normalize_rows, ContentBank, ContentFeatures, Modality, ROW_NORM_EPS};
pub use embedding::EmbeddingTable;
pub use gar::{GarRec, LossBreakdown};
pub use id_space::IdSpace;
