//! Error types for garrec operations.
//!
//! Every failure here is a caller contract violation: bad configuration,
//! mismatched shapes, or ids outside the unified id space. Nothing is retried;
//! errors propagate straight to the training or evaluation driver.

use thiserror::Error;

/// Main error type for garrec operations.
///
/// # Examples
///
/// ```
/// use garrec::error::GarError;
///
/// let err = GarError::DimensionMismatch {
///     expected: "num_item=10".to_string(),
///     actual: "8".to_string(),
/// };
/// assert!(err.to_string().contains("dimension mismatch"));
/// ```
#[derive(Error, Debug)]
pub enum GarError {
    /// Invalid hyperparameter or construction argument.
    #[error("Invalid configuration: {param} = {value}, expected {constraint}")]
    InvalidConfig {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Matrix dimensions or batch shapes don't match.
    #[error("Tensor dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions description
        expected: String,
        /// Actual dimensions found
        actual: String,
    },

    /// Id outside the unified id space.
    #[error("Index {index} out of range (len={len})")]
    IndexOutOfRange {
        /// Offending id
        index: usize,
        /// Size of the indexed space
        len: usize,
    },

    /// An item-space operation received a user id.
    #[error("Id {id} is not an item id (items start at {num_user})")]
    NotAnItem {
        /// Offending id
        id: usize,
        /// First item id in the unified space
        num_user: usize,
    },

    /// Empty batch or id list.
    #[error("Empty input: {context}")]
    EmptyInput {
        /// What was empty
        context: String,
    },

    /// Config (de)serialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for GarError {
    fn from(err: serde_json::Error) -> Self {
        GarError::Serialization(err.to_string())
    }
}

impl GarError {
    /// Create a dimension mismatch error with descriptive context
    #[must_use]
    pub fn dimension_mismatch(context: &str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            expected: format!("{context}={expected}"),
            actual: format!("{actual}"),
        }
    }

    /// Create an invalid configuration error
    #[must_use]
    pub fn invalid_config(param: &str, value: impl ToString, constraint: &str) -> Self {
        Self::InvalidConfig {
            param: param.to_string(),
            value: value.to_string(),
            constraint: constraint.to_string(),
        }
    }

    /// Create an empty input error
    #[must_use]
    pub fn empty_input(context: &str) -> Self {
        Self::EmptyInput {
            context: context.to_string(),
        }
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, GarError>;
