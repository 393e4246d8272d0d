//! Item content features and the normalized content bank.
//!
//! Each supplied modality is row-normalized to unit L2 norm, then the
//! modalities are concatenated along the feature axis in the fixed order
//! visual, audio, text. The bank is a constant: it never requires grad.

use std::fmt;

use tracing::debug;

use crate::autograd::Tensor;
use crate::error::{GarError, Result};

/// Floor on the row norm, so zero rows normalize to zero rows.
pub const ROW_NORM_EPS: f32 = 1e-12;

/// A source of item side information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modality {
    /// Image features.
    Visual,
    /// Audio features.
    Audio,
    /// Text features.
    Text,
}

impl Modality {
    /// All modalities in concatenation order.
    pub const ALL: [Modality; 3] = [Modality::Visual, Modality::Audio, Modality::Text];

    /// Lowercase name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Modality::Visual => "visual",
            Modality::Audio => "audio",
            Modality::Text => "text",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw per-modality feature matrices, each `(num_item, d_m)` and indexed by
/// item-local id.
///
/// ```
/// use garrec::autograd::Tensor;
/// use garrec::recommend::ContentFeatures;
///
/// let features = ContentFeatures::new()
///     .with_text(Tensor::ones(&[10, 8]))
///     .with_visual(Tensor::ones(&[10, 32]));
/// assert_eq!(features.num_modalities(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContentFeatures {
    /// Visual features.
    pub visual: Option<Tensor>,
    /// Audio features.
    pub audio: Option<Tensor>,
    /// Text features.
    pub text: Option<Tensor>,
}

impl ContentFeatures {
    /// No modalities.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set visual features.
    #[must_use]
    pub fn with_visual(mut self, features: Tensor) -> Self {
        self.visual = Some(features);
        self
    }

    /// Set audio features.
    #[must_use]
    pub fn with_audio(mut self, features: Tensor) -> Self {
        self.audio = Some(features);
        self
    }

    /// Set text features.
    #[must_use]
    pub fn with_text(mut self, features: Tensor) -> Self {
        self.text = Some(features);
        self
    }

    /// Features of one modality.
    #[must_use]
    pub fn get(&self, modality: Modality) -> Option<&Tensor> {
        match modality {
            Modality::Visual => self.visual.as_ref(),
            Modality::Audio => self.audio.as_ref(),
            Modality::Text => self.text.as_ref(),
        }
    }

    /// Supplied modalities in concatenation order.
    pub fn iter(&self) -> impl Iterator<Item = (Modality, &Tensor)> {
        Modality::ALL
            .into_iter()
            .filter_map(move |m| self.get(m).map(|t| (m, t)))
    }

    /// Number of supplied modalities.
    #[must_use]
    pub fn num_modalities(&self) -> usize {
        self.iter().count()
    }

    /// True when no modality is supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.num_modalities() == 0
    }
}

/// Divide each row of a 2-D tensor by `max(||row||_2, ROW_NORM_EPS)`.
///
/// The result is detached from the tape.
///
/// # Panics
///
/// Panics if `x` is not 2-D.
#[must_use]
pub fn l2_normalize_rows(x: &Tensor) -> Tensor {
    assert_eq!(x.ndim(), 2, "l2_normalize_rows requires a 2D tensor");
    let (rows, cols) = (x.shape()[0], x.shape()[1]);

    let mut data = Vec::with_capacity(rows * cols);
    for i in 0..rows {
        let row = x.row(i);
        let norm = row.iter().map(|v| v * v).sum::<f32>().sqrt().max(ROW_NORM_EPS);
        data.extend(row.iter().map(|v| v / norm));
    }
    Tensor::from_vec(data, &[rows, cols])
}

/// Normalized, concatenated content matrix `(num_item, total_dim)`.
#[derive(Debug, Clone)]
pub struct ContentBank {
    features: Tensor,
    layout: Vec<(Modality, usize)>,
}

impl ContentBank {
    /// Build the bank, or `None` when no modality is supplied.
    ///
    /// Every modality must be 2-D with exactly `num_item` rows and at least one
    /// column.
    pub fn build(features: &ContentFeatures, num_item: usize) -> Result<Option<Self>> {
        let mut bank: Option<Tensor> = None;
        let mut layout = Vec::new();

        for (modality, raw) in features.iter() {
            if raw.ndim() != 2 {
                return Err(GarError::DimensionMismatch {
                    expected: format!("{modality} features with 2 dims"),
                    actual: format!("{} dims", raw.ndim()),
                });
            }
            if raw.shape()[0] != num_item {
                return Err(GarError::DimensionMismatch {
                    expected: format!("{modality} rows={num_item}"),
                    actual: raw.shape()[0].to_string(),
                });
            }
            if raw.shape()[1] == 0 {
                return Err(GarError::invalid_config(
                    &format!("{modality}_feat"),
                    "0 columns",
                    "at least one feature column",
                ));
            }

            let normalized = l2_normalize_rows(raw);
            layout.push((modality, raw.shape()[1]));
            bank = Some(match bank {
                Some(acc) => acc.cat_cols(&normalized),
                None => normalized,
            });
        }

        let Some(features) = bank else {
            debug!("no content modalities supplied, content bank absent");
            return Ok(None);
        };
        debug!(
            num_item,
            content_dim = features.shape()[1],
            modalities = layout.len(),
            "assembled content bank"
        );
        Ok(Some(Self { features, layout }))
    }

    /// The normalized feature matrix.
    #[must_use]
    pub fn features(&self) -> &Tensor {
        &self.features
    }

    /// Total feature width.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.features.shape()[1]
    }

    /// Number of item rows.
    #[must_use]
    pub fn num_item(&self) -> usize {
        self.features.shape()[0]
    }

    /// Modalities and their widths, in column order.
    #[must_use]
    pub fn layout(&self) -> &[(Modality, usize)] {
        &self.layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_norm(row: &[f32]) -> f32 {
        row.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    #[test]
    fn test_normalize_unit_rows() {
        let x = Tensor::new(&[3.0, 4.0, 1.0, 0.0], &[2, 2]);
        let y = l2_normalize_rows(&x);
        assert!((y.data()[0] - 0.6).abs() < 1e-6);
        assert!((y.data()[1] - 0.8).abs() < 1e-6);
        assert_eq!(y.row(1), &[1.0, 0.0]);
    }

    #[test]
    fn test_normalize_zero_row_stays_zero() {
        let y = l2_normalize_rows(&Tensor::zeros(&[1, 3]));
        assert_eq!(y.data(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_normalized_is_constant() {
        let x = Tensor::ones(&[2, 2]).requires_grad();
        assert!(!l2_normalize_rows(&x).requires_grad_enabled());
    }

    #[test]
    fn test_no_modalities_means_no_bank() {
        assert!(ContentBank::build(&ContentFeatures::new(), 4)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_concatenation_order() {
        // text supplied first in builder order, but visual still comes first
        let features = ContentFeatures::new()
            .with_text(Tensor::new(&[0.0, 2.0, 0.0, 5.0], &[2, 2]))
            .with_visual(Tensor::new(&[7.0, 9.0], &[2, 1]));
        let bank = ContentBank::build(&features, 2).unwrap().unwrap();

        assert_eq!(bank.dim(), 3);
        assert_eq!(bank.num_item(), 2);
        assert_eq!(
            bank.layout(),
            &[(Modality::Visual, 1), (Modality::Text, 2)]
        );
        assert_eq!(bank.features().row(0), &[1.0, 0.0, 1.0]);
        assert_eq!(bank.features().row(1), &[1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_each_modality_block_has_unit_norm() {
        let features = ContentFeatures::new()
            .with_visual(Tensor::new(&[1.0, 2.0, 3.0, -4.0, 0.5, 0.25], &[2, 3]))
            .with_audio(Tensor::new(&[10.0, -10.0], &[2, 1]));
        let bank = ContentBank::build(&features, 2).unwrap().unwrap();

        for i in 0..2 {
            let row = bank.features().row(i);
            assert!((row_norm(&row[..3]) - 1.0).abs() < 1e-5);
            assert!((row_norm(&row[3..]) - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_wrong_row_count() {
        let features = ContentFeatures::new().with_audio(Tensor::ones(&[3, 2]));
        let err = ContentBank::build(&features, 4).unwrap_err();
        assert!(matches!(err, GarError::DimensionMismatch { .. }));
        assert!(err.to_string().contains("audio"));
    }

    #[test]
    fn test_non_matrix_rejected() {
        let features = ContentFeatures::new().with_visual(Tensor::ones(&[4]));
        assert!(ContentBank::build(&features, 4).is_err());
    }

    #[test]
    fn test_modality_display() {
        assert_eq!(Modality::Text.to_string(), "text");
        assert_eq!(Modality::ALL.len(), 3);
    }
}
