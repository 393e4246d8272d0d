//! Generator and discriminator networks.
//!
//! The generator maps content features into the embedding space; the
//! discriminator scores how plausible a `[user | item]` embedding pair is.
//! Both are plain [`Module`]s over a [`Sequential`] stack and know nothing
//! about each other; the model composes them.

use crate::autograd::Tensor;
use crate::nn::{LeakyReLU, Linear, Module, Sequential, Sigmoid};

/// Width of the hidden layer in both networks.
pub const HIDDEN_DIM: usize = 256;

/// Negative slope of the hidden activations.
pub const LEAKY_SLOPE: f32 = 0.2;

fn layer_seed(seed: Option<u64>, layer: u64) -> Option<u64> {
    seed.map(|s| s.wrapping_add(layer))
}

/// `Linear(content_dim, 256) -> LeakyReLU(0.2) -> Linear(256, dim_e)`.
///
/// ```
/// use garrec::autograd::Tensor;
/// use garrec::recommend::Generator;
///
/// let generator = Generator::new(12, 4, Some(0));
/// let fake = generator.generate(&Tensor::ones(&[5, 12]));
/// assert_eq!(fake.shape(), &[5, 4]);
/// ```
#[derive(Debug)]
pub struct Generator {
    net: Sequential,
    content_dim: usize,
    dim_e: usize,
}

impl Generator {
    /// Create a generator; layer `k` is seeded with `seed + k`.
    #[must_use]
    pub fn new(content_dim: usize, dim_e: usize, seed: Option<u64>) -> Self {
        let net = Sequential::new()
            .add(Linear::with_seed(content_dim, HIDDEN_DIM, layer_seed(seed, 0)))
            .add(LeakyReLU::with_slope(LEAKY_SLOPE))
            .add(Linear::with_seed(HIDDEN_DIM, dim_e, layer_seed(seed, 1)));
        Self {
            net,
            content_dim,
            dim_e,
        }
    }

    /// Synthesize embeddings for `(N, content_dim)` content rows.
    ///
    /// # Panics
    ///
    /// Panics if the input width is not `content_dim`.
    #[must_use]
    pub fn generate(&self, content: &Tensor) -> Tensor {
        self.forward(content)
    }

    /// Input width.
    #[must_use]
    pub fn content_dim(&self) -> usize {
        self.content_dim
    }

    /// Output width.
    #[must_use]
    pub fn dim_e(&self) -> usize {
        self.dim_e
    }
}

impl Module for Generator {
    fn forward(&self, input: &Tensor) -> Tensor {
        self.net.forward(input)
    }

    fn parameters(&self) -> Vec<&Tensor> {
        self.net.parameters()
    }

    fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        self.net.parameters_mut()
    }

    fn train(&mut self) {
        self.net.train();
    }

    fn eval(&mut self) {
        self.net.eval();
    }

    fn training(&self) -> bool {
        self.net.training()
    }
}

/// `Linear(2 * dim_e, 256) -> LeakyReLU(0.2) -> Linear(256, 1) -> Sigmoid`.
///
/// ```
/// use garrec::autograd::Tensor;
/// use garrec::recommend::Discriminator;
///
/// let discriminator = Discriminator::new(4, Some(0));
/// let p = discriminator.classify(&Tensor::ones(&[3, 8]));
/// assert_eq!(p.shape(), &[3, 1]);
/// assert!(p.data().iter().all(|&v| (0.0..=1.0).contains(&v)));
/// ```
///
/// Outputs lie in `[0, 1]`. In `f32` the sigmoid saturates to exactly 0 or 1
/// for large logits; [`crate::nn::BCELoss`] clamps its log terms at
/// [`crate::nn::loss::BCE_LOG_CLAMP`] so such outputs still give a finite loss.
#[derive(Debug)]
pub struct Discriminator {
    net: Sequential,
    dim_e: usize,
}

impl Discriminator {
    /// Create a discriminator over pairs of `dim_e` embeddings.
    #[must_use]
    pub fn new(dim_e: usize, seed: Option<u64>) -> Self {
        let net = Sequential::new()
            .add(Linear::with_seed(2 * dim_e, HIDDEN_DIM, layer_seed(seed, 0)))
            .add(LeakyReLU::with_slope(LEAKY_SLOPE))
            .add(Linear::with_seed(HIDDEN_DIM, 1, layer_seed(seed, 1)))
            .add(Sigmoid::new());
        Self { net, dim_e }
    }

    /// Probability in `[0, 1]` (saturating) that each `(B, 2 * dim_e)` pair is
    /// real, shape `(B, 1)`.
    ///
    /// # Panics
    ///
    /// Panics if the pair width is not `2 * dim_e`.
    #[must_use]
    pub fn classify(&self, pair: &Tensor) -> Tensor {
        self.forward(pair)
    }

    /// Width of one half of a pair.
    #[must_use]
    pub fn dim_e(&self) -> usize {
        self.dim_e
    }
}

impl Module for Discriminator {
    fn forward(&self, input: &Tensor) -> Tensor {
        self.net.forward(input)
    }

    fn parameters(&self) -> Vec<&Tensor> {
        self.net.parameters()
    }

    fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        self.net.parameters_mut()
    }

    fn train(&mut self) {
        self.net.train();
    }

    fn eval(&mut self) {
        self.net.eval();
    }

    fn training(&self) -> bool {
        self.net.training()
    }
}
