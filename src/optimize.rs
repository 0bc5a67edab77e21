use std::thread;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::{
  error::{ Error, Result },
  scalar::Real,
  ops::BaseOps,
  gradient::Gradients,
  model::Parameters,
  workers::Parallelism,
  Tensor,
};


/// Plain stochastic gradient descent.
///
/// Every step decrements each parameter by `learning_rate × gradient`.

#[derive(Debug, Clone)]
pub struct Optimizer<R: Real> {
  pub learning_rate: R,
  parallelism: Parallelism,
  step: usize,
}

impl<R: Real> Optimizer<R> {
  pub fn new(learning_rate: R) -> Self {
    Self { learning_rate, parallelism: Parallelism::default(), step: 0 }
  }

  pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
    self.parallelism = parallelism;
    self
  }

  /// Number of updates applied so far.

  pub fn step(&self) -> usize {
    self.step
  }

  pub fn minimize(&mut self, params: &mut Parameters<R>, grads: &Gradients<R>) -> Result<()> {
    apply_update(params, grads, self.learning_rate, self.parallelism)?;
    self.step += 1;
    Ok(())
  }
}


fn descend_row<R: Real>(param: &mut [R], grad: &[R], rate: R) {
  for (p, &g) in param.iter_mut().zip(grad) {
    *p -= rate * g;
  }
}

#[cfg(feature = "rayon")]
fn descend<R: Real>(param: &mut Tensor<R>, grad: &Tensor<R>, rate: R) {
  let cols = param.cols().max(1);
  param.raw_mut()
    .par_chunks_mut(cols)
    .zip(grad.raw().par_chunks(cols))
    .for_each(|(p, g)| descend_row(p, g, rate) );
}

#[cfg(not(feature = "rayon"))]
fn descend<R: Real>(param: &mut Tensor<R>, grad: &Tensor<R>, rate: R) {
  descend_row(param.raw_mut(), grad.raw(), rate);
}


/// Applies `param -= rate × grad` to all four parameter tensors.
///
/// Gradient shapes are validated before anything is written, so a
/// failed call leaves `params` untouched. With a parallelism degree above
/// one, the four tensors are updated on separate threads.

pub fn apply_update<R: Real>(params: &mut Parameters<R>, grads: &Gradients<R>, rate: R, parallelism: Parallelism) -> Result<()> {
  for (tensor, param, grad) in [
    ("w1", &params.w1, &grads.w1),
    ("b1", &params.b1, &grads.b1),
    ("w2", &params.w2, &grads.w2),
    ("b2", &params.b2, &grads.b2),
  ] {
    if param.shape() != grad.shape() {
      return Err(Error::ShapeMismatch {
        tensor,
        expected: param.shape().clone(),
        actual: grad.shape().clone(),
      })
    }
  }

  let Parameters { w1, b1, w2, b2 } = params;
  let groups = [(w1, &grads.w1), (b1, &grads.b1), (w2, &grads.w2), (b2, &grads.b2)];

  if parallelism.degree() > 1 {
    thread::scope(|s| {
      for (param, grad) in groups {
        s.spawn(move || descend(param, grad, rate) );
      }
    });
  } else {
    for (param, grad) in groups {
      descend(param, grad, rate);
    }
  }
  Ok(())
}
