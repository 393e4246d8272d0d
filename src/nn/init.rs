//! Weight initialization functions.
//!
//! - Xavier/Glorot normal (Glorot & Bengio, 2010) for the embedding table.
//! - Fan-in uniform U(-1/sqrt(fan_in), 1/sqrt(fan_in)) for linear weights and
//!   biases, matching the `torch.nn.Linear` default.
//!
//! # References
//!
//! - Glorot, X., & Bengio, Y. (2010). Understanding the difficulty of training
//!   deep feedforward neural networks. AISTATS.

use crate::autograd::Tensor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Fan-in uniform initialization, the default for `torch.nn.Linear`.
///
/// Samples from U(-a, a) where a = 1 / sqrt(`fan_in`).
///
/// ```
/// use garrec::nn::fan_in_uniform;
///
/// let weight = fan_in_uniform(&[256, 784], 784, Some(7));
/// assert_eq!(weight.shape(), &[256, 784]);
/// ```
#[must_use]
pub fn fan_in_uniform(shape: &[usize], fan_in: usize, seed: Option<u64>) -> Tensor {
    uniform(&mut rng_for(seed), shape, fan_in_bound(fan_in))
}

/// Weight `(out, in)` and bias `(out)` of a linear layer, both drawn in that
/// order from one fan-in uniform stream.
pub(crate) fn linear_params(
    in_features: usize,
    out_features: usize,
    seed: Option<u64>,
) -> (Tensor, Tensor) {
    let bound = fan_in_bound(in_features);
    let mut rng = rng_for(seed);
    let weight = uniform(&mut rng, &[out_features, in_features], bound);
    let bias = uniform(&mut rng, &[out_features], bound);
    (weight, bias)
}

fn fan_in_bound(fan_in: usize) -> f32 {
    1.0 / (fan_in.max(1) as f32).sqrt()
}

/// Xavier normal initialization (Glorot & Bengio, 2010).
///
/// Samples from N(0, std) where std = sqrt(2 / (`fan_in` + `fan_out`)).
#[must_use]
pub fn xavier_normal(shape: &[usize], fan_in: usize, fan_out: usize, seed: Option<u64>) -> Tensor {
    let std = (2.0 / (fan_in + fan_out) as f32).sqrt();
    normal(shape, 0.0, std, seed)
}

fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

/// Samples from U(-bound, bound).
fn uniform(rng: &mut StdRng, shape: &[usize], bound: f32) -> Tensor {
    let numel: usize = shape.iter().product();
    let data: Vec<f32> = (0..numel).map(|_| rng.gen_range(-bound..=bound)).collect();
    Tensor::from_vec(data, shape)
}

/// Normal distribution initialization.
///
/// Samples from N(mean, std).
pub(crate) fn normal(shape: &[usize], mean: f32, std: f32, seed: Option<u64>) -> Tensor {
    let numel: usize = shape.iter().product();
    let mut rng = rng_for(seed);

    // Box-Muller transform for normal distribution
    let data: Vec<f32> = (0..numel)
        .map(|_| {
            let u1: f32 = rng.gen_range(0.0001_f32..1.0_f32);
            let u2: f32 = rng.gen_range(0.0_f32..1.0_f32);
            let z = (-2.0_f32 * u1.ln()).sqrt() * (2.0_f32 * std::f32::consts::PI * u2).cos();
            mean + std * z
        })
        .collect();

    Tensor::from_vec(data, shape)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fan_in_uniform_bounds() {
        let t = fan_in_uniform(&[100, 64], 64, Some(42));
        let a = 0.125;

        for &val in t.data() {
            assert!(
                (-a..=a).contains(&val),
                "Value {val} out of bounds [-{a}, {a}]"
            );
        }
    }

    #[test]
    fn test_linear_params_share_bound() {
        let (weight, bias) = linear_params(16, 8, Some(2));
        assert_eq!(weight.shape(), &[8, 16]);
        assert_eq!(bias.shape(), &[8]);
        assert!(weight.data().iter().chain(bias.data()).all(|v| v.abs() <= 0.25));
        assert!(bias.data().iter().any(|&v| v != 0.0));
    }

    #[test]
    fn test_xavier_normal_statistics() {
        let t = xavier_normal(&[200, 50], 50, 200, Some(3));
        let n = t.numel() as f32;
        let mean: f32 = t.data().iter().sum::<f32>() / n;
        let var: f32 = t.data().iter().map(|x| (x - mean).powi(2)).sum::<f32>() / n;
        let expected_std = (2.0 / 250.0_f32).sqrt();

        assert!(mean.abs() < 0.01, "mean {mean} too far from 0");
        assert!(
            (var.sqrt() - expected_std).abs() < 0.01,
            "std {} vs expected {expected_std}",
            var.sqrt()
        );
    }

    #[test]
    fn test_seeded_init_is_deterministic() {
        let a = xavier_normal(&[4, 4], 4, 4, Some(11));
        let b = xavier_normal(&[4, 4], 4, 4, Some(11));
        assert_eq!(a.data(), b.data());
    }
}
