use num_traits::Float;

use crate::{
  error::Result,
  scalar::{ Inner, Real },
  Shape,
};


/// Low-level compute operations on raw row-major buffers.
///
/// Implemented for `f32` and `f64`, either through [matrixmultiply]
/// (with the default `unsafe` feature) or a plain triple loop.

pub trait Cops: Sized {
  /// Computes `out = lhs · rhs` for a `rows_l × cols_l` left and
  /// a `cols_l × cols_r` right operand. `out` must be zeroed.
  fn gemm(rows_l: usize, cols_l: usize, cols_r: usize, lhs: &[Self], rhs: &[Self], out: &mut [Self]);
}


/// Shape inspection shared by all tensors.

pub trait BaseOps<I: Inner> {
  fn shape(&self) -> &Shape;

  fn rows(&self) -> usize {
    self.shape().rows()
  }

  fn cols(&self) -> usize {
    self.shape().cols()
  }
}


/// Linear algebra used by the dense layers.

pub trait NumericOps<I: Real>: BaseOps<I> + Sized {
  /// Dense matrix product. Fails unless `self.cols() == rhs.rows()`.
  fn mm(&self, rhs: &Self) -> Result<Self>;

  /// Adds `bias` to every row. Fails unless `bias` is a vector of length `self.cols()`.
  fn add_row_bias(&self, bias: &Self) -> Result<Self>;
}


/// Element-wise activations.

pub trait RealOps<I: Real> {
  fn sigmoid(&self) -> Self;
  fn sigmoid_derivative(&self) -> Self;
}


/// Logistic function `1 / (1 + e^-x)`.
///
/// Only ever exponentiates non-positive arguments, so it stays finite
/// and inside `[0, 1]` for inputs of any magnitude.

#[inline]
pub fn sigmoid<R: Float>(x: R) -> R {
  if x >= R::zero() {
    R::one() / (R::one() + (-x).exp())
  } else {
    let e = x.exp();
    e / (R::one() + e)
  }
}

/// Derivative of [sigmoid], taking the pre-activation as argument.

#[inline]
pub fn sigmoid_derivative<R: Float>(x: R) -> R {
  let s = sigmoid(x);
  s * (R::one() - s)
}
