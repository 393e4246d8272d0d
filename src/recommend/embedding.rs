//! The shared user/item embedding table.

use super::id_space::IdSpace;
use crate::autograd::Tensor;
use crate::error::{GarError, Result};
use crate::nn::xavier_normal;

/// Dense `(num_user + num_item, dim)` table keyed by unified id.
///
/// The table is a trainable leaf tensor. Lookups gather rows through the tape,
/// so gradients of any loss built from them land on [`weight`](Self::weight).
///
/// ```
/// use garrec::recommend::{EmbeddingTable, IdSpace};
///
/// let table = EmbeddingTable::new(IdSpace::new(2, 3), 4, Some(7));
/// let rows = table.lookup(&[0, 4, 4]).unwrap();
/// assert_eq!(rows.shape(), &[3, 4]);
/// assert!(table.lookup(&[5]).is_err());
/// ```
#[derive(Debug)]
pub struct EmbeddingTable {
    weight: Tensor,
    id_space: IdSpace,
    dim: usize,
}

impl EmbeddingTable {
    /// Xavier-normal initialized table.
    #[must_use]
    pub fn new(id_space: IdSpace, dim: usize, seed: Option<u64>) -> Self {
        let rows = id_space.len();
        // 2-D weight of shape (rows, dim): fan_in = dim, fan_out = rows
        let weight = xavier_normal(&[rows, dim], dim, rows, seed).requires_grad();
        Self {
            weight,
            id_space,
            dim,
        }
    }

    /// Wrap existing weights, e.g. pretrained embeddings.
    pub fn from_tensor(id_space: IdSpace, weight: Tensor) -> Result<Self> {
        if weight.ndim() != 2 {
            return Err(GarError::dimension_mismatch("embedding ndim", 2, weight.ndim()));
        }
        if weight.shape()[0] != id_space.len() {
            return Err(GarError::dimension_mismatch(
                "embedding rows",
                id_space.len(),
                weight.shape()[0],
            ));
        }
        let dim = weight.shape()[1];
        let weight = if weight.requires_grad_enabled() {
            weight
        } else {
            weight.requires_grad()
        };
        Ok(Self {
            weight,
            id_space,
            dim,
        })
    }

    /// Gather the rows of `ids`, shape `(ids.len(), dim)`.
    pub fn lookup(&self, ids: &[usize]) -> Result<Tensor> {
        for &id in ids {
            self.id_space.check(id)?;
        }
        Ok(self.weight.index_select(ids))
    }

    /// Embedding dimension.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Id space the table is keyed by.
    #[must_use]
    pub fn id_space(&self) -> &IdSpace {
        &self.id_space
    }

    /// The table parameter.
    #[must_use]
    pub fn weight(&self) -> &Tensor {
        &self.weight
    }

    /// The table parameter, for optimizers.
    pub fn weight_mut(&mut self) -> &mut Tensor {
        &mut self.weight
    }
}
