//! The adversarial cold-start recommender.
//!
//! Users and items share one embedding table. Cold items get embeddings from
//! a content generator, trained against a discriminator that tells real
//! `[user | item]` pairs from `[user | generated item]` pairs.
//!
//! # Loss
//!
//! ```text
//! d_loss      = BCE(D([u | i]), 1) + BCE(D([u | G(c_i)]), 0)
//! g_loss      = BCE(D([u | G(c_i)]), 1)
//! adversarial = contrastive * g_loss + (1 - contrastive) * d_loss
//! reg         = reg_weight * (||U||_F + ||I||_F) / 2
//! ```
//!
//! # Example
//!
//! ```
//! use garrec::autograd::{clear_graph, Tensor};
//! use garrec::nn::{Optimizer, SGD};
//! use garrec::recommend::{ContentFeatures, GarConfig, GarRec, IdBatch, ItemPartition};
//!
//! let config = GarConfig::new(2, 3, 4).with_seed(11);
//! let partition = ItemPartition::new(vec![2, 3], vec![4]);
//! let features = ContentFeatures::new().with_text(Tensor::ones(&[3, 8]));
//! let mut model = GarRec::new(config, partition, features).unwrap();
//!
//! let users = IdBatch::repeat_rows(&[0, 1], 2).unwrap();
//! let items = IdBatch::from_rows(&[vec![2, 4], vec![3, 2]]).unwrap();
//! let (adversarial, reg) = model.compute_losses(&users, &items).unwrap();
//! adversarial.add(&reg).backward();
//!
//! let mut optimizer = SGD::new(0.01);
//! optimizer.step(&mut model.parameters_mut());
//! clear_graph();
//!
//! let scores = model.score(&[0, 1], &[2, 3, 4]).unwrap();
//! assert_eq!(scores.shape(), &[2, 3]);
//! ```

use tracing::{info, trace, warn};

use super::adversarial::{Discriminator, Generator};
use super::batch::IdBatch;
use super::config::{GarConfig, ItemPartition};
use super::content::{ContentBank, ContentFeatures};
use super::embedding::EmbeddingTable;
use super::id_space::IdSpace;
use crate::autograd::Tensor;
use crate::error::{GarError, Result};
use crate::nn::{binary_cross_entropy, Module};

// Seed offsets for the independently initialized parts.
const GENERATOR_SEED: u64 = 100;
const DISCRIMINATOR_SEED: u64 = 200;

/// Every intermediate of one loss evaluation.
#[derive(Debug, Clone)]
pub struct LossBreakdown {
    /// Table rows of the batch users, `(B, dim_e)`.
    pub user_emb: Tensor,
    /// Table rows of the positive items, `(B, dim_e)`.
    pub pos_item_emb: Tensor,
    /// Generated embeddings of the positive items, or `pos_item_emb` itself
    /// when there is no generator.
    pub fake_item_emb: Tensor,
    /// Discriminator output on real pairs, `(B, 1)`.
    pub d_real: Tensor,
    /// Discriminator output on fake pairs, `(B, 1)`.
    pub d_fake: Tensor,
    /// `BCE(d_real, 1) + BCE(d_fake, 0)`.
    pub discriminator_loss: Tensor,
    /// `BCE(d_fake, 1)`.
    pub generator_loss: Tensor,
    /// Convex combination of the generator and discriminator losses.
    pub adversarial: Tensor,
    /// Embedding norm penalty.
    pub regularization: Tensor,
}

/// Adversarial cold-start recommender.
#[derive(Debug)]
pub struct GarRec {
    config: GarConfig,
    id_space: IdSpace,
    partition: ItemPartition,
    embedding: EmbeddingTable,
    content: Option<ContentBank>,
    generator: Option<Generator>,
    discriminator: Discriminator,
    emb_ids: Vec<usize>,
    feat_ids: Vec<usize>,
}

impl GarRec {
    /// Build a model.
    ///
    /// Validates the config, the warm/cold partition and every supplied
    /// content modality. The generator exists iff at least one modality is
    /// supplied.
    pub fn new(
        config: GarConfig,
        partition: ItemPartition,
        features: ContentFeatures,
    ) -> Result<Self> {
        config.validate()?;
        let id_space = config.id_space();
        partition.validate(&id_space)?;

        let content = ContentBank::build(&features, config.num_item)?;
        let seed = config.seed;
        let embedding = EmbeddingTable::new(id_space, config.dim_e, seed);
        let generator = content.as_ref().map(|bank| {
            Generator::new(
                bank.dim(),
                config.dim_e,
                seed.map(|s| s.wrapping_add(GENERATOR_SEED)),
            )
        });
        let discriminator = Discriminator::new(
            config.dim_e,
            seed.map(|s| s.wrapping_add(DISCRIMINATOR_SEED)),
        );

        let emb_ids = (0..config.num_user)
            .chain(partition.warm.iter().copied())
            .collect();
        let feat_ids = partition
            .cold
            .iter()
            .map(|&id| id_space.unified_to_item(id))
            .collect::<Result<Vec<_>>>()?;

        if generator.is_none() {
            warn!("no content features supplied; fake item embeddings fall back to table rows");
        }
        info!(
            num_user = config.num_user,
            num_item = config.num_item,
            dim_e = config.dim_e,
            modalities = features.num_modalities(),
            warm = partition.warm.len(),
            cold = partition.cold.len(),
            "constructed GarRec model"
        );

        Ok(Self {
            config,
            id_space,
            partition,
            embedding,
            content,
            generator,
            discriminator,
            emb_ids,
            feat_ids,
        })
    }

    /// Affinity scores `lookup(user_ids) @ lookup(item_ids)^T`, shape
    /// `(|user_ids|, |item_ids|)`.
    pub fn score(&self, user_ids: &[usize], item_ids: &[usize]) -> Result<Tensor> {
        let users = self.embedding.lookup(user_ids)?;
        let items = self.embedding.lookup(item_ids)?;
        Ok(users.matmul(&items.transpose()))
    }

    /// Alias of [`score`](Self::score).
    pub fn forward(&self, user_ids: &[usize], item_ids: &[usize]) -> Result<Tensor> {
        self.score(user_ids, item_ids)
    }

    /// Generated embeddings for every item, `(num_item, dim_e)`, indexed by
    /// item-local id. `None` without content features.
    #[must_use]
    pub fn feature_extractor(&self) -> Option<Tensor> {
        match (&self.generator, &self.content) {
            (Some(generator), Some(bank)) => Some(generator.generate(bank.features())),
            _ => None,
        }
    }

    /// Discriminator probabilities for `(B, 2 * dim_e)` pairs.
    pub fn classify(&self, pair: &Tensor) -> Result<Tensor> {
        let width = 2 * self.config.dim_e;
        if pair.ndim() != 2 || pair.shape()[1] != width {
            return Err(GarError::DimensionMismatch {
                expected: format!("pair of shape (B, {width})"),
                actual: format!("{:?}", pair.shape()),
            });
        }
        Ok(self.discriminator.classify(pair))
    }

    /// Adversarial and regularization losses for one batch.
    ///
    /// Only column 0 of each batch is read: the user and its positive item.
    pub fn compute_losses(
        &self,
        user_batch: &IdBatch,
        item_batch: &IdBatch,
    ) -> Result<(Tensor, Tensor)> {
        let breakdown = self.loss_breakdown(user_batch, item_batch)?;
        Ok((breakdown.adversarial, breakdown.regularization))
    }

    /// Like [`compute_losses`](Self::compute_losses), keeping every
    /// intermediate tensor.
    pub fn loss_breakdown(
        &self,
        user_batch: &IdBatch,
        item_batch: &IdBatch,
    ) -> Result<LossBreakdown> {
        if user_batch.rows() != item_batch.rows() {
            return Err(GarError::dimension_mismatch(
                "batch rows",
                user_batch.rows(),
                item_batch.rows(),
            ));
        }

        let user_ids = user_batch.column(0);
        let pos_item_ids = item_batch.column(0);

        let user_emb = self.embedding.lookup(&user_ids)?;
        let pos_item_emb = self.embedding.lookup(&pos_item_ids)?;

        let fake_item_emb = match (&self.generator, &self.content) {
            (Some(generator), Some(bank)) => {
                let local = pos_item_ids
                    .iter()
                    .map(|&id| self.id_space.unified_to_item(id))
                    .collect::<Result<Vec<_>>>()?;
                generator.generate(bank.features()).index_select(&local)
            }
            _ => pos_item_emb.clone(),
        };

        let real_pair = user_emb.cat_cols(&pos_item_emb);
        let fake_pair = user_emb.cat_cols(&fake_item_emb);
        let d_real = self.discriminator.classify(&real_pair);
        let d_fake = self.discriminator.classify(&fake_pair);

        let discriminator_loss =
            binary_cross_entropy(&d_real, 1.0).add(&binary_cross_entropy(&d_fake, 0.0));
        let generator_loss = binary_cross_entropy(&d_fake, 1.0);

        let c = self.config.contrastive;
        let adversarial = generator_loss
            .mul_scalar(c)
            .add(&discriminator_loss.mul_scalar(1.0 - c));
        let regularization = user_emb
            .norm()
            .add(&pos_item_emb.norm())
            .mul_scalar(self.config.reg_weight)
            .mul_scalar(0.5);

        trace!(
            batch = user_batch.rows(),
            d_loss = discriminator_loss.item(),
            g_loss = generator_loss.item(),
            adversarial = adversarial.item(),
            regularization = regularization.item(),
            "computed adversarial losses"
        );

        Ok(LossBreakdown {
            user_emb,
            pos_item_emb,
            fake_item_emb,
            d_real,
            d_fake,
            discriminator_loss,
            generator_loss,
            adversarial,
            regularization,
        })
    }

    /// Trainable parameters: embedding table, generator, discriminator.
    #[must_use]
    pub fn parameters(&self) -> Vec<&Tensor> {
        let mut params = vec![self.embedding.weight()];
        if let Some(generator) = &self.generator {
            params.extend(generator.parameters());
        }
        params.extend(self.discriminator.parameters());
        params
    }

    /// Mutable parameters, in the order of [`parameters`](Self::parameters).
    pub fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        let mut params = vec![self.embedding.weight_mut()];
        if let Some(generator) = &mut self.generator {
            params.extend(generator.parameters_mut());
        }
        params.extend(self.discriminator.parameters_mut());
        params
    }

    /// Total number of scalar parameters.
    #[must_use]
    pub fn num_parameters(&self) -> usize {
        self.parameters().iter().map(|p| p.numel()).sum()
    }

    /// Construction config.
    #[must_use]
    pub fn config(&self) -> &GarConfig {
        &self.config
    }

    /// Unified id space.
    #[must_use]
    pub fn id_space(&self) -> &IdSpace {
        &self.id_space
    }

    /// Warm/cold item split.
    #[must_use]
    pub fn partition(&self) -> &ItemPartition {
        &self.partition
    }

    /// All user ids followed by the warm item ids (unified).
    #[must_use]
    pub fn emb_ids(&self) -> &[usize] {
        &self.emb_ids
    }

    /// Cold item ids in item-local space.
    #[must_use]
    pub fn feat_ids(&self) -> &[usize] {
        &self.feat_ids
    }

    /// Normalized content features, if any modality was supplied.
    #[must_use]
    pub fn content_bank(&self) -> Option<&ContentBank> {
        self.content.as_ref()
    }

    /// The embedding table.
    #[must_use]
    pub fn embedding(&self) -> &EmbeddingTable {
        &self.embedding
    }

    /// The content generator, if any.
    #[must_use]
    pub fn generator(&self) -> Option<&Generator> {
        self.generator.as_ref()
    }

    /// The pair discriminator.
    #[must_use]
    pub fn discriminator(&self) -> &Discriminator {
        &self.discriminator
    }
}
