//! Back-propagation for the two dense sigmoid layers.
//!
//! The batch's rows are the unit of parallel work. Each phase fans out
//! over contiguous row ranges (see [workers](crate::workers)) and every
//! worker accumulates into its own zeroed buffers. Once all workers of a
//! phase have joined, their partials are summed in range order. No
//! gradient cell is ever written by two threads, so the hot loops need
//! neither locks nor atomics.
//!
//! Phases run strictly one after another, because each consumes the
//! complete output of the previous one:
//!
//! 1. output layer: `dOut` rows and the squared error
//! 2. decoder gradients and the hidden layer's `dA1` rows
//! 3. encoder gradients

use std::ops::Range;

use itertools::izip;
use log::trace;

use crate::{
  error::{ Error, Result },
  scalar::Real,
  ops::{ sigmoid_derivative, BaseOps },
  forward::ForwardPass,
  model::Parameters,
  workers::{ self, Parallelism },
  Tensor,
};


/// Gradients of the sum-of-squares objective with respect to every parameter,
/// plus the loss reported for the batch.
///
/// `loss` is the squared reconstruction error summed over the whole batch and
/// divided by the feature count only. The gradients are not divided by
/// anything, so they are the exact derivatives of `input_size × loss`.

#[derive(Debug, Clone, PartialEq)]
pub struct Gradients<R: Real> {
  pub w1: Tensor<R>,
  pub b1: Tensor<R>,
  pub w2: Tensor<R>,
  pub b2: Tensor<R>,
  pub loss: R,
}


/// Private accumulator for one worker's share of a weight matrix and its bias.

struct Partial<R> {
  weights: Vec<R>,
  bias: Vec<R>,
}

impl<R: Real> Partial<R> {
  fn zeros(rows: usize, cols: usize) -> Self {
    Self {
      weights: vec![R::zero(); rows * cols],
      bias: vec![R::zero(); cols],
    }
  }

  fn merge(mut self, other: &Self) -> Self {
    for (acc, &a) in self.weights.iter_mut().zip(&other.weights) { *acc += a }
    for (acc, &a) in self.bias.iter_mut().zip(&other.bias) { *acc += a }
    self
  }

  fn into_tensors(self, rows: usize, cols: usize) -> (Tensor<R>, Tensor<R>) {
    (Tensor::new(&[rows, cols], self.weights), Tensor::from_vec(self.bias))
  }
}

/// Sums partials in range order.

fn reduce<R: Real>(partials: Vec<Partial<R>>, rows: usize, cols: usize) -> Partial<R> {
  partials.iter().fold(Partial::zeros(rows, cols), Partial::merge)
}

fn concat_rows<R: Real>(chunks: impl IntoIterator<Item = Vec<R>>, cols: usize) -> Tensor<R> {
  let data: Vec<R> = chunks.into_iter().flatten().collect();
  let rows = if cols == 0 { 0 } else { data.len() / cols };
  Tensor::new(&[rows, cols], data)
}


/// Phase 1: per-element output delta `2 (out - x) σ'(z2)` and the squared error of a row range.

fn output_delta<R: Real>(batch: &Tensor<R>, pass: &ForwardPass<R>, rows: Range<usize>) -> (Vec<R>, R) {
  let two = R::one() + R::one();
  let cols = batch.cols();
  let span = rows.start * cols..rows.end * cols;
  let mut delta = Vec::with_capacity(span.len());
  let mut squared_error = R::zero();
  for (&out, &x, &z2) in izip!(
    &pass.reconstruction.raw()[span.clone()],
    &batch.raw()[span.clone()],
    &pass.decoder_pre_activation.raw()[span],
  ) {
    let diff = out - x;
    squared_error += diff * diff;
    delta.push(two * diff * sigmoid_derivative(z2));
  }
  (delta, squared_error)
}

/// Phase 2: decoder gradients and the back-propagated hidden delta of a row range.

fn decoder_backward<R: Real>(
  d_out: &Tensor<R>,
  pass: &ForwardPass<R>,
  params: &Parameters<R>,
  rows: Range<usize>,
) -> (Partial<R>, Vec<R>) {
  let input_size = params.input_size();
  let latent_size = params.latent_size();
  let w2 = params.w2.raw();
  let mut partial = Partial::zeros(latent_size, input_size);
  let mut hidden_delta = Vec::with_capacity(rows.len() * latent_size);
  for i in rows {
    let delta = d_out.row(i);
    let latent = pass.latent.row(i);
    let z1 = pass.encoder_pre_activation.row(i);

    for (j, &d) in delta.iter().enumerate() {
      partial.bias[j] += d;
      for (k, &a) in latent.iter().enumerate() {
        partial.weights[k * input_size + j] += a * d;
      }
    }

    for j in 0..latent_size {
      let w2_row = &w2[j * input_size..(j + 1) * input_size];
      let sum: R = delta.iter().zip(w2_row).map(|(&d, &w)| d * w ).sum();
      hidden_delta.push(sigmoid_derivative(z1[j]) * sum);
    }
  }
  (partial, hidden_delta)
}

/// Phase 3: encoder gradients of a row range.

fn encoder_backward<R: Real>(
  batch: &Tensor<R>,
  d_a1: &Tensor<R>,
  params: &Parameters<R>,
  rows: Range<usize>,
) -> Partial<R> {
  let input_size = params.input_size();
  let latent_size = params.latent_size();
  let mut partial = Partial::zeros(input_size, latent_size);
  for i in rows {
    let delta = d_a1.row(i);
    let x = batch.row(i);
    for (j, &d) in delta.iter().enumerate() {
      partial.bias[j] += d;
      for (k, &a) in x.iter().enumerate() {
        partial.weights[k * latent_size + j] += a * d;
      }
    }
  }
  partial
}


fn check_pass<R: Real>(batch: &Tensor<R>, pass: &ForwardPass<R>, params: &Parameters<R>) -> Result<()> {
  let input_size = params.input_size();
  let latent_size = params.latent_size();
  let rows = batch.rows();
  let expectations = [
    ("gradient batch", batch, input_size),
    ("gradient encoder pre-activation", &pass.encoder_pre_activation, latent_size),
    ("gradient latent", &pass.latent, latent_size),
    ("gradient decoder pre-activation", &pass.decoder_pre_activation, input_size),
    ("gradient reconstruction", &pass.reconstruction, input_size),
  ];
  for (operation, tensor, cols) in expectations {
    if tensor.rank() != 2 {
      return Err(Error::dimension(operation, 2, tensor.rank()))
    }
    if tensor.cols() != cols {
      return Err(Error::dimension(operation, cols, tensor.cols()))
    }
    if tensor.rows() != rows {
      return Err(Error::dimension(operation, rows, tensor.rows()))
    }
  }
  Ok(())
}


/// Computes the loss and all four parameter gradients for a batch,
/// given the forward pass that was run on it with the same parameters.
///
/// Results do not depend on `parallelism` beyond floating point
/// rounding of the final reduction.

pub fn compute_gradients<R: Real>(
  batch: &Tensor<R>,
  pass: &ForwardPass<R>,
  params: &Parameters<R>,
  parallelism: Parallelism,
) -> Result<Gradients<R>> {
  check_pass(batch, pass, params)?;
  let rows = batch.rows();
  if rows == 0 { return Err(Error::EmptyBatch) }
  let input_size = params.input_size();
  let latent_size = params.latent_size();

  let outputs = workers::fan_out(parallelism, rows, |range| output_delta(batch, pass, range) );
  let squared_error: R = outputs.iter().map(|(_, error)| *error ).sum();
  let loss = squared_error / R::from(input_size).unwrap();
  let d_out = concat_rows(outputs.into_iter().map(|(delta, _)| delta ), input_size);
  trace!("Output layer done, loss {loss:?}");

  let decoded = workers::fan_out(parallelism, rows, |range| decoder_backward(&d_out, pass, params, range) );
  let (decoder_partials, hidden_deltas): (Vec<_>, Vec<_>) = decoded.into_iter().unzip();
  let (w2, b2) = reduce(decoder_partials, latent_size, input_size).into_tensors(latent_size, input_size);
  let d_a1 = concat_rows(hidden_deltas, latent_size);

  let encoded = workers::fan_out(parallelism, rows, |range| encoder_backward(batch, &d_a1, params, range) );
  let (w1, b1) = reduce(encoded, input_size, latent_size).into_tensors(input_size, latent_size);

  Ok(Gradients { w1, b1, w2, b2, loss })
}
