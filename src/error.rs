use thiserror::Error;

use crate::Shape;


/// Errors produced while training, evaluating or persisting an [Autoencoder](crate::Autoencoder).
///
/// No operation retries internally. Whenever an error is returned,
/// model parameters are left exactly as they were before the call.

#[derive(Error, Debug)]
pub enum Error {
  #[error("Dimension mismatch in {operation}: expected {expected}, got {actual}")]
  DimensionMismatch {
    operation: &'static str,
    expected: usize,
    actual: usize,
  },

  #[error("Shape mismatch for {tensor}: expected {expected}, got {actual}")]
  ShapeMismatch {
    tensor: &'static str,
    expected: Shape,
    actual: Shape,
  },

  #[error("Cannot compute gradients for an empty batch")]
  EmptyBatch,

  #[error("Parameter storage failed: {0}")]
  StorageIO(#[from] std::io::Error),

  #[error("Malformed parameter encoding: {0}")]
  Encoding(#[from] postcard::Error),
}

impl Error {
  pub(crate) fn dimension(operation: &'static str, expected: usize, actual: usize) -> Self {
    Self::DimensionMismatch { operation, expected, actual }
  }
}


pub type Result<T> = std::result::Result<T, Error>;
