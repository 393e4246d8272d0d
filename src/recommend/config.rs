//! Construction-time configuration.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::id_space::IdSpace;
use crate::error::{GarError, Result};

fn default_reg_weight() -> f32 {
    0.1
}

fn default_contrastive() -> f32 {
    0.5
}

fn default_temp_value() -> f32 {
    1.0
}

fn default_num_neg() -> usize {
    1
}

fn default_num_sample() -> f32 {
    0.5
}

/// Hyperparameters of a [`GarRec`](super::GarRec) model.
///
/// `temp_value`, `num_neg` and `num_sample` are carried for temperature-scaled
/// and sampling-based loss variants; the adversarial loss does not read them.
///
/// ```
/// use garrec::recommend::GarConfig;
///
/// let config = GarConfig::new(100, 50, 64)
///     .with_reg_weight(0.01)
///     .with_contrastive(0.3)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
///
/// let json = config.to_json_string().unwrap();
/// assert_eq!(GarConfig::from_json_str(&json).unwrap(), config);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GarConfig {
    /// Number of users.
    pub num_user: usize,
    /// Number of items (warm and cold).
    pub num_item: usize,
    /// Shared embedding dimension.
    pub dim_e: usize,
    /// Regularization strength, `>= 0`.
    #[serde(default = "default_reg_weight")]
    pub reg_weight: f32,
    /// Weight of the generator loss against the discriminator loss, in `[0, 1]`.
    #[serde(default = "default_contrastive")]
    pub contrastive: f32,
    /// Temperature for temperature-scaled variants (unused by the adversarial loss).
    #[serde(default = "default_temp_value")]
    pub temp_value: f32,
    /// Negatives per training row.
    #[serde(default = "default_num_neg")]
    pub num_neg: usize,
    /// Sampling parameter for sampling-based variants (unused by the adversarial loss).
    #[serde(default = "default_num_sample")]
    pub num_sample: f32,
    /// Seed for weight initialization; `None` draws from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl GarConfig {
    /// Create a config with default hyperparameters.
    #[must_use]
    pub fn new(num_user: usize, num_item: usize, dim_e: usize) -> Self {
        Self {
            num_user,
            num_item,
            dim_e,
            reg_weight: default_reg_weight(),
            contrastive: default_contrastive(),
            temp_value: default_temp_value(),
            num_neg: default_num_neg(),
            num_sample: default_num_sample(),
            seed: None,
        }
    }

    /// Set the regularization weight.
    #[must_use]
    pub fn with_reg_weight(mut self, reg_weight: f32) -> Self {
        self.reg_weight = reg_weight;
        self
    }

    /// Set the generator/discriminator weighting.
    #[must_use]
    pub fn with_contrastive(mut self, contrastive: f32) -> Self {
        self.contrastive = contrastive;
        self
    }

    /// Set the temperature.
    #[must_use]
    pub fn with_temp_value(mut self, temp_value: f32) -> Self {
        self.temp_value = temp_value;
        self
    }

    /// Set the number of negatives per row.
    #[must_use]
    pub fn with_num_neg(mut self, num_neg: usize) -> Self {
        self.num_neg = num_neg;
        self
    }

    /// Set the sampling parameter.
    #[must_use]
    pub fn with_num_sample(mut self, num_sample: f32) -> Self {
        self.num_sample = num_sample;
        self
    }

    /// Set the initialization seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// The id space described by `num_user` and `num_item`.
    #[must_use]
    pub fn id_space(&self) -> IdSpace {
        IdSpace::new(self.num_user, self.num_item)
    }

    /// Check every hyperparameter.
    pub fn validate(&self) -> Result<()> {
        if self.num_user == 0 {
            return Err(GarError::invalid_config("num_user", self.num_user, "> 0"));
        }
        if self.num_item == 0 {
            return Err(GarError::invalid_config("num_item", self.num_item, "> 0"));
        }
        if self.dim_e == 0 {
            return Err(GarError::invalid_config("dim_e", self.dim_e, "> 0"));
        }
        if !self.reg_weight.is_finite() || self.reg_weight < 0.0 {
            return Err(GarError::invalid_config(
                "reg_weight",
                self.reg_weight,
                "finite and >= 0",
            ));
        }
        if !(0.0..=1.0).contains(&self.contrastive) {
            return Err(GarError::invalid_config(
                "contrastive",
                self.contrastive,
                "in [0, 1]",
            ));
        }
        if !self.temp_value.is_finite() {
            return Err(GarError::invalid_config(
                "temp_value",
                self.temp_value,
                "finite",
            ));
        }
        if !self.num_sample.is_finite() {
            return Err(GarError::invalid_config(
                "num_sample",
                self.num_sample,
                "finite",
            ));
        }
        Ok(())
    }

    /// Parse a config from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the config as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Warm/cold split of the items, as unified ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPartition {
    /// Items with interaction history.
    pub warm: Vec<usize>,
    /// Items relying on content-generated embeddings.
    pub cold: Vec<usize>,
}

impl ItemPartition {
    /// Create a partition from warm and cold unified item ids.
    #[must_use]
    pub fn new(warm: Vec<usize>, cold: Vec<usize>) -> Self {
        Self { warm, cold }
    }

    /// Check that every id is an item of `space` and the sets are disjoint.
    pub fn validate(&self, space: &IdSpace) -> Result<()> {
        for (name, ids) in [("warm_item", &self.warm), ("cold_item", &self.cold)] {
            if let Some(&bad) = ids.iter().find(|&&id| !space.is_item(id)) {
                return Err(GarError::invalid_config(
                    name,
                    bad,
                    &format!("item ids in [{}, {})", space.num_user(), space.len()),
                ));
            }
        }

        let warm: HashSet<usize> = self.warm.iter().copied().collect();
        if let Some(&shared) = self.cold.iter().find(|id| warm.contains(id)) {
            return Err(GarError::invalid_config(
                "cold_item",
                shared,
                "disjoint from warm_item",
            ));
        }
        Ok(())
    }

    /// Whether `id` is listed as cold.
    #[must_use]
    pub fn is_cold(&self, id: usize) -> bool {
        self.cold.contains(&id)
    }

    /// Whether `id` is listed as warm.
    #[must_use]
    pub fn is_warm(&self, id: usize) -> bool {
        self.warm.contains(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GarConfig::new(10, 20, 8);
        assert!((config.reg_weight - 0.1).abs() < f32::EPSILON);
        assert!((config.contrastive - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.num_neg, 1);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(GarConfig::new(0, 5, 4).validate().is_err());
        assert!(GarConfig::new(5, 0, 4).validate().is_err());
        assert!(GarConfig::new(5, 5, 0).validate().is_err());
    }

    #[test]
    fn test_negative_reg_weight_rejected() {
        let err = GarConfig::new(2, 2, 4)
            .with_reg_weight(-0.5)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("reg_weight"));
    }

    #[test]
    fn test_contrastive_range() {
        assert!(GarConfig::new(2, 2, 4).with_contrastive(0.0).validate().is_ok());
        assert!(GarConfig::new(2, 2, 4).with_contrastive(1.0).validate().is_ok());
        assert!(GarConfig::new(2, 2, 4).with_contrastive(1.5).validate().is_err());
        assert!(GarConfig::new(2, 2, 4)
            .with_contrastive(f32::NAN)
            .validate()
            .is_err());
    }

    #[test]
    fn test_json_defaults_fill_missing_fields() {
        let config =
            GarConfig::from_json_str(r#"{"num_user": 3, "num_item": 4, "dim_e": 16}"#).unwrap();
        assert_eq!(config, GarConfig::new(3, 4, 16));
    }

    #[test]
    fn test_json_missing_required_field() {
        let err = GarConfig::from_json_str(r#"{"num_user": 3}"#).unwrap_err();
        assert!(matches!(err, GarError::Serialization(_)));
    }

    #[test]
    fn test_partition_validation() {
        let space = IdSpace::new(3, 4);
        assert!(ItemPartition::new(vec![3, 4], vec![5, 6])
            .validate(&space)
            .is_ok());
        // user id listed as an item
        assert!(ItemPartition::new(vec![1], vec![]).validate(&space).is_err());
        // past the end
        assert!(ItemPartition::new(vec![], vec![7]).validate(&space).is_err());
        // overlap
        assert!(ItemPartition::new(vec![3, 4], vec![4])
            .validate(&space)
            .is_err());
    }

    #[test]
    fn test_partition_membership() {
        let p = ItemPartition::new(vec![3], vec![4]);
        assert!(p.is_warm(3));
        assert!(p.is_cold(4));
        assert!(!p.is_cold(3));
    }
}
