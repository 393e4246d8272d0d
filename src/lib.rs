//! garrec: adversarial cold-start recommendation in pure Rust.
//!
//! Scores user-item affinity from a shared embedding table and bridges
//! content features into that table with a generator trained against a
//! pair discriminator, so cold items with no interaction history still get
//! usable embeddings.
//!
//! # Quick Start
//!
//! ```
//! use garrec::prelude::*;
//!
//! let config = GarConfig::new(4, 6, 8).with_seed(42);
//! let partition = ItemPartition::new(vec![4, 5, 6, 7], vec![8, 9]);
//! let features = ContentFeatures::new().with_visual(Tensor::ones(&[6, 16]));
//! let mut model = GarRec::new(config, partition, features).unwrap();
//!
//! let users = IdBatch::repeat_rows(&[0, 1, 2], 2).unwrap();
//! let items = IdBatch::from_rows(&[vec![4, 8], vec![9, 5], vec![6, 7]]).unwrap();
//!
//! let mut optimizer = Adam::new(1e-3);
//! let (adversarial, reg) = model.compute_losses(&users, &items).unwrap();
//! adversarial.add(&reg).backward();
//! optimizer.step(&mut model.parameters_mut());
//! clear_graph();
//!
//! let scores = model.score(&[0, 1], &[8, 9]).unwrap();
//! assert_eq!(scores.shape(), &[2, 2]);
//! ```
//!
//! # Modules
//!
//! - [`autograd`]: Tensors with tape-based reverse-mode differentiation
//! - [`nn`]: Layers, activations, initialization, losses and optimizers
//! - [`recommend`]: The recommender: id space, embeddings, content, GAN pair
//! - [`error`]: Crate error type

pub mod autograd;
pub mod error;
pub mod nn;
pub mod prelude;
pub mod recommend;

pub use error::{GarError, Result};
pub use recommend::{GarConfig, GarRec};
