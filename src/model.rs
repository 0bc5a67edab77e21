use rand::{ Rng, SeedableRng, rngs::StdRng };
use serde::{ de, Serialize, Deserialize, Deserializer };

use crate::{
  error::{ Error, Result },
  scalar::Real,
  ops::BaseOps,
  Shape, Tensor,
};


/// Trainable state of an autoencoder with one hidden layer.
///
/// | tensor | shape                      |
/// |--------|----------------------------|
/// | `w1`   | `input_size × latent_size` |
/// | `b1`   | `latent_size`              |
/// | `w2`   | `latent_size × input_size` |
/// | `b2`   | `input_size`               |
///
/// Shapes are fixed at construction. Decoded parameters go
/// through [Parameters::from_tensors] and are rejected unless
/// all four tensors agree.

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameters<R: Real> {
  pub(crate) w1: Tensor<R>,
  pub(crate) b1: Tensor<R>,
  pub(crate) w2: Tensor<R>,
  pub(crate) b2: Tensor<R>,
}

/// Parameters as decoded, before their shapes have been checked.

#[derive(Deserialize)]
#[serde(bound(deserialize = ""))]
pub(crate) struct RawParameters<R: Real> {
  w1: Tensor<R>,
  b1: Tensor<R>,
  w2: Tensor<R>,
  b2: Tensor<R>,
}

impl<R: Real> RawParameters<R> {
  /// Accepts the tensors only if they fit exactly these sizes.

  pub(crate) fn validate(self, input_size: usize, latent_size: usize) -> Result<Parameters<R>> {
    let params = Parameters { w1: self.w1, b1: self.b1, w2: self.w2, b2: self.b2 };
    params.check(input_size, latent_size)?;
    Ok(params)
  }
}

impl<'de, R: Real> Deserialize<'de> for Parameters<R> {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
    let raw = RawParameters::<R>::deserialize(deserializer)?;
    Self::from_tensors(raw.w1, raw.b1, raw.w2, raw.b2).map_err(de::Error::custom)
  }
}

impl<R: Real> Parameters<R> {
  /// Glorot-normal weights and zero biases from the thread-local generator.
  ///
  /// # Panics
  /// If either size is zero.

  pub fn new(input_size: usize, latent_size: usize) -> Self {
    Self::init(input_size, latent_size, &mut rand::thread_rng())
  }

  /// Like [Parameters::new], but reproducible.

  pub fn seeded(input_size: usize, latent_size: usize, seed: u64) -> Self {
    Self::init(input_size, latent_size, &mut StdRng::seed_from_u64(seed))
  }

  pub fn init(input_size: usize, latent_size: usize, rng: &mut impl Rng) -> Self {
    assert!(input_size > 0 && latent_size > 0,
      "Autoencoder sizes must be positive, got {input_size} inputs and {latent_size} latents");
    Self {
      w1: Tensor::glorot_normal(&[input_size, latent_size], rng),
      b1: Tensor::zeros(&[latent_size]),
      w2: Tensor::glorot_normal(&[latent_size, input_size], rng),
      b2: Tensor::zeros(&[input_size]),
    }
  }

  /// Assembles parameters from existing tensors, deriving both sizes from `w1`.

  pub fn from_tensors(w1: Tensor<R>, b1: Tensor<R>, w2: Tensor<R>, b2: Tensor<R>) -> Result<Self> {
    let dims = w1.shape().dims.clone();
    let params = Self { w1, b1, w2, b2 };
    match dims[..] {
      [input_size, latent_size] if input_size > 0 && latent_size > 0 => {
        params.check(input_size, latent_size)?;
        Ok(params)
      },
      _ => Err(Error::ShapeMismatch {
        tensor: "w1",
        expected: Shape::matrix(1, 1),
        actual: Shape::new(&dims),
      }),
    }
  }

  pub fn input_size(&self) -> usize {
    self.w1.shape().at_or(0, 0)
  }

  pub fn latent_size(&self) -> usize {
    self.w1.shape().at_or(1, 0)
  }

  pub fn w1(&self) -> &Tensor<R> { &self.w1 }
  pub fn b1(&self) -> &Tensor<R> { &self.b1 }
  pub fn w2(&self) -> &Tensor<R> { &self.w2 }
  pub fn b2(&self) -> &Tensor<R> { &self.b2 }

  /// Verifies every tensor against the given sizes, failing
  /// with [Error::ShapeMismatch] on the first disagreement.

  pub fn check(&self, input_size: usize, latent_size: usize) -> Result<()> {
    let expectations = [
      ("w1", &self.w1, Shape::matrix(input_size, latent_size)),
      ("b1", &self.b1, Shape::vector(latent_size)),
      ("w2", &self.w2, Shape::matrix(latent_size, input_size)),
      ("b2", &self.b2, Shape::vector(input_size)),
    ];
    for (tensor, param, expected) in expectations {
      if param.shape() != &expected || !param.is_consistent() {
        return Err(Error::ShapeMismatch { tensor, expected, actual: param.shape().clone() })
      }
    }
    Ok(())
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn shapes() {
    let params = Parameters::<f64>::seeded(8, 3, 1);
    assert_eq!(params.input_size(), 8);
    assert_eq!(params.latent_size(), 3);
    assert_eq!(params.w1().shape(), &Shape::matrix(8, 3));
    assert_eq!(params.w2().shape(), &Shape::matrix(3, 8));
    assert_eq!(params.b1(), &Tensor::zeros(&[3]));
    assert_eq!(params.b2(), &Tensor::zeros(&[8]));
    assert!(params.check(8, 3).is_ok());
  }

  #[test]
  fn seeded_is_reproducible() {
    assert_eq!(Parameters::<f32>::seeded(8, 3, 42), Parameters::seeded(8, 3, 42));
    assert_ne!(Parameters::<f32>::seeded(8, 3, 42), Parameters::seeded(8, 3, 43));
  }

  #[test]
  fn check_reports_first_mismatch() {
    let params = Parameters::<f64>::seeded(8, 3, 1);
    let err = params.check(8, 4).unwrap_err();
    match err {
      Error::ShapeMismatch { tensor, expected, actual } => {
        assert_eq!(tensor, "w1");
        assert_eq!(expected, Shape::matrix(8, 4));
        assert_eq!(actual, Shape::matrix(8, 3));
      },
      other => panic!("unexpected error {other}"),
    }
  }

  #[test]
  fn from_tensors() {
    let params = Parameters::from_tensors(
      Tensor::<f64>::zeros(&[4, 2]),
      Tensor::zeros(&[2]),
      Tensor::zeros(&[2, 4]),
      Tensor::zeros(&[4]),
    ).unwrap();
    assert_eq!(params.input_size(), 4);

    let err = Parameters::from_tensors(
      Tensor::<f64>::zeros(&[4, 2]),
      Tensor::zeros(&[3]),
      Tensor::zeros(&[2, 4]),
      Tensor::zeros(&[4]),
    ).unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch { tensor: "b1", .. }));
  }

  #[test]
  fn decoding_validates() {
    let params = Parameters::<f64>::seeded(8, 3, 1);
    let bytes = postcard::to_allocvec(&params).unwrap();
    assert_eq!(postcard::from_bytes::<Parameters<f64>>(&bytes).unwrap(), params);

    // Each tensor is sound on its own, but b1 doesn't fit w1
    let bytes = postcard::to_allocvec(&Parameters {
      b1: Tensor::zeros(&[5]),
      ..params.clone()
    }).unwrap();
    assert!(postcard::from_bytes::<Parameters<f64>>(&bytes).is_err());

    // w1 claims more elements than it stores
    let bytes = postcard::to_allocvec(&(
      (Shape::matrix(8, 3), vec![0.0f64; 5]),
      params.b1(), params.w2(), params.b2(),
    )).unwrap();
    assert!(postcard::from_bytes::<Parameters<f64>>(&bytes).is_err());
  }

  #[test]
  #[should_panic]
  fn zero_latent() {
    Parameters::<f32>::new(8, 0);
  }
}
