use std::path::Path;

use log::{ debug, trace };

use crate::{
  error::Result,
  scalar::Real,
  ops::BaseOps,
  forward::{ self, ForwardPass },
  gradient::{ self, Gradients },
  model::Parameters,
  optimize,
  persist,
  workers::Parallelism,
  Tensor,
};


/// Autoencoder with a single sigmoid hidden layer.
///
/// Training mutates the parameters in place and requires exclusive
/// access, so concurrent steps on the same model are ruled out at
/// compile time.

#[derive(Debug, Clone, PartialEq)]
pub struct Autoencoder<R: Real> {
  params: Parameters<R>,
  parallelism: Parallelism,
}

impl<R: Real> Autoencoder<R> {
  pub fn new(input_size: usize, latent_size: usize) -> Self {
    Self::from_parameters(Parameters::new(input_size, latent_size))
  }

  pub fn seeded(input_size: usize, latent_size: usize, seed: u64) -> Self {
    Self::from_parameters(Parameters::seeded(input_size, latent_size, seed))
  }

  pub fn from_parameters(params: Parameters<R>) -> Self {
    debug!("Autoencoder with {} inputs and {} latents", params.input_size(), params.latent_size());
    Self { params, parallelism: Parallelism::default() }
  }

  /// Sets how many workers gradient accumulation and updates fan out to.

  pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
    self.parallelism = parallelism;
    self
  }

  pub fn input_size(&self) -> usize {
    self.params.input_size()
  }

  pub fn latent_size(&self) -> usize {
    self.params.latent_size()
  }

  pub fn parameters(&self) -> &Parameters<R> {
    &self.params
  }

  pub fn parallelism(&self) -> Parallelism {
    self.parallelism
  }

  pub fn forward(&self, batch: &Tensor<R>) -> Result<ForwardPass<R>> {
    forward::forward(batch, &self.params)
  }

  pub fn encode(&self, batch: &Tensor<R>) -> Result<Tensor<R>> {
    forward::encode(batch, &self.params)
  }

  pub fn decode(&self, latent: &Tensor<R>) -> Result<Tensor<R>> {
    forward::decode(latent, &self.params)
  }

  /// Reconstructs the batch and binarizes every row at `threshold`.

  pub fn reconstruct(&self, batch: &Tensor<R>, threshold: R) -> Result<Tensor<R>> {
    Ok(self.forward(batch)?.reconstruction.threshold(threshold))
  }

  pub fn compute_gradients(&self, batch: &Tensor<R>, pass: &ForwardPass<R>) -> Result<Gradients<R>> {
    gradient::compute_gradients(batch, pass, &self.params, self.parallelism)
  }

  /// Runs one full forward, backward and update cycle on `batch`
  /// and returns the batch loss.
  ///
  /// Parameters are only written after all gradients have been
  /// computed, so on error the model is unchanged.

  pub fn train_step(&mut self, batch: &Tensor<R>, learning_rate: R) -> Result<R> {
    let pass = self.forward(batch)?;
    let grads = self.compute_gradients(batch, &pass)?;
    optimize::apply_update(&mut self.params, &grads, learning_rate, self.parallelism)?;
    trace!("Trained on {} samples, loss {:?}", batch.rows(), grads.loss);
    Ok(grads.loss)
  }

  /// Like [Autoencoder::train_step], taking samples as plain rows.

  pub fn train_rows<S: AsRef<[R]>>(&mut self, rows: &[S], learning_rate: R) -> Result<R> {
    let batch = Tensor::batch(rows, self.input_size())?;
    self.train_step(&batch, learning_rate)
  }

  pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
    persist::save_file(&self.params, path)
  }

  /// Loads a model with the sizes stored in the file.

  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    Ok(Self::from_parameters(persist::restore_file(path)?))
  }

  /// Replaces all parameters with those stored in the file.
  ///
  /// The file must hold parameters for this model's sizes. Nothing
  /// is replaced unless the whole file decodes and validates.

  pub fn load_parameters(&mut self, path: impl AsRef<Path>) -> Result<()> {
    self.params = persist::load_file(path, self.input_size(), self.latent_size())?;
    Ok(())
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::Error;

  #[test]
  fn output_in_sigmoid_range() {
    let model = Autoencoder::<f64>::seeded(8, 3, 2);
    let batch = Tensor::new(&[3, 8], (0..24).map(|i| (i % 3) as f64 - 1.0 ).collect());
    let pass = model.forward(&batch).unwrap();
    assert_eq!(pass.reconstruction.shape(), batch.shape());
    assert!(pass.reconstruction.all(|a| a > 0.0 && a < 1.0 ));
  }

  #[test]
  fn decode_encode_shape() {
    let model = Autoencoder::<f32>::seeded(8, 3, 2);
    let batch = Tensor::fill(&[4, 8], 1.0);
    let latent = model.encode(&batch).unwrap();
    assert_eq!(latent.shape().dims, vec![4, 3]);
    assert_eq!(model.decode(&latent).unwrap().shape(), batch.shape());
  }

  #[test]
  fn failed_step_keeps_parameters() {
    let mut model = Autoencoder::<f64>::seeded(8, 3, 2);
    let before = model.parameters().clone();
    let err = model.train_step(&Tensor::zeros(&[1, 7]), 0.05).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { expected: 8, actual: 7, .. }));
    let err = model.train_step(&Tensor::zeros(&[0, 8]), 0.05).unwrap_err();
    assert!(matches!(err, Error::EmptyBatch));
    assert_eq!(model.parameters(), &before);
  }

  #[test]
  fn train_rows_validates() {
    let mut model = Autoencoder::<f64>::seeded(4, 2, 2);
    assert!(model.train_rows(&[vec![0.0, 1.0, 0.0, 1.0]], 0.05).is_ok());
    let err = model.train_rows(&[vec![0.0, 1.0, 0.0, 1.0], vec![1.0]], 0.05).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { .. }));
  }

  #[test]
  fn step_changes_parameters() {
    let mut model = Autoencoder::<f64>::seeded(4, 2, 2).with_parallelism(Parallelism::fixed(2));
    let before = model.parameters().clone();
    let loss = model.train_step(&Tensor::new(&[1, 4], vec![0.0, 1.0, 1.0, 0.0]), 0.1).unwrap();
    assert!(loss > 0.0);
    assert_ne!(model.parameters(), &before);
  }

  #[test]
  fn reconstruct_thresholds_every_row() {
    let model = Autoencoder::<f64>::seeded(4, 2, 2);
    let batch = Tensor::new(&[3, 4], vec![0.5; 12]);
    let binary = model.reconstruct(&batch, 0.5).unwrap();
    assert_eq!(binary.shape(), batch.shape());
    assert!(binary.all(|a| a == 0.0 || a == 1.0 ));
    assert_eq!(binary, model.forward(&batch).unwrap().reconstruction.threshold(0.5));
  }
}
