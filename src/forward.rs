use crate::{
  error::{ Error, Result },
  scalar::Real,
  ops::{ BaseOps, NumericOps, RealOps },
  model::Parameters,
  Tensor,
};


/// Every intermediate of a forward pass, kept for back-propagation.
///
/// All four tensors have one row per batch sample.

#[derive(Debug, Clone, PartialEq)]
pub struct ForwardPass<R: Real> {
  /// `batch · w1 + b1`
  pub encoder_pre_activation: Tensor<R>,
  /// Sigmoid of the encoder pre-activation. This is the latent code.
  pub latent: Tensor<R>,
  /// `latent · w2 + b2`
  pub decoder_pre_activation: Tensor<R>,
  /// Sigmoid of the decoder pre-activation, shaped like the batch.
  pub reconstruction: Tensor<R>,
}


fn dense<R: Real>(input: &Tensor<R>, weights: &Tensor<R>, bias: &Tensor<R>) -> Result<(Tensor<R>, Tensor<R>)> {
  let pre_activation = input.mm(weights)?.add_row_bias(bias)?;
  let activation = pre_activation.sigmoid();
  Ok((pre_activation, activation))
}

fn expect_width<R: Real>(operation: &'static str, input: &Tensor<R>, width: usize) -> Result<()> {
  if input.rank() != 2 {
    return Err(Error::dimension(operation, 2, input.rank()))
  }
  if input.cols() != width {
    return Err(Error::dimension(operation, width, input.cols()))
  }
  Ok(())
}


/// Runs the encoder and decoder on a `rows × input_size` batch.

pub fn forward<R: Real>(batch: &Tensor<R>, params: &Parameters<R>) -> Result<ForwardPass<R>> {
  expect_width("forward", batch, params.input_size())?;
  let (encoder_pre_activation, latent) = dense(batch, &params.w1, &params.b1)?;
  let (decoder_pre_activation, reconstruction) = dense(&latent, &params.w2, &params.b2)?;
  Ok(ForwardPass {
    encoder_pre_activation,
    latent,
    decoder_pre_activation,
    reconstruction,
  })
}

/// Latent code of every sample in the batch.

pub fn encode<R: Real>(batch: &Tensor<R>, params: &Parameters<R>) -> Result<Tensor<R>> {
  expect_width("encode", batch, params.input_size())?;
  Ok(dense(batch, &params.w1, &params.b1)?.1)
}

/// Reconstruction from an arbitrary `rows × latent_size` matrix.

pub fn decode<R: Real>(latent: &Tensor<R>, params: &Parameters<R>) -> Result<Tensor<R>> {
  expect_width("decode", latent, params.latent_size())?;
  Ok(dense(latent, &params.w2, &params.b2)?.1)
}


#[cfg(test)]
mod tests {
  use super::*;
  use approx::assert_relative_eq;

  fn params() -> Parameters<f64> {
    Parameters::from_tensors(
      Tensor::new(&[2, 1], vec![1.0, -1.0]),
      Tensor::vec(&[0.5]),
      Tensor::new(&[1, 2], vec![2.0, -2.0]),
      Tensor::vec(&[0.0, 1.0]),
    ).unwrap()
  }

  #[test]
  fn hand_computed() {
    let batch = Tensor::new(&[1, 2], vec![1.0, 0.0]);
    let pass = forward(&batch, &params()).unwrap();
    assert_eq!(pass.encoder_pre_activation, Tensor::new(&[1, 1], vec![1.5]));
    let a1 = 1.0 / (1.0 + (-1.5f64).exp());
    assert_relative_eq!(pass.latent.raw()[0], a1, epsilon = 1e-12);
    assert_relative_eq!(pass.decoder_pre_activation.raw()[0], 2.0 * a1, epsilon = 1e-12);
    assert_relative_eq!(pass.decoder_pre_activation.raw()[1], 1.0 - 2.0 * a1, epsilon = 1e-12);
    assert_eq!(pass.reconstruction, pass.decoder_pre_activation.sigmoid());
  }

  #[test]
  fn encode_decode_compose() {
    let params = Parameters::<f64>::seeded(8, 3, 5);
    let batch = Tensor::new(&[2, 8], (0..16).map(|i| (i % 2) as f64 ).collect());
    let pass = forward(&batch, &params).unwrap();
    let latent = encode(&batch, &params).unwrap();
    assert_eq!(latent, pass.latent);
    assert_eq!(decode(&latent, &params).unwrap(), pass.reconstruction);
  }

  #[test]
  fn decode_arbitrary_latent() {
    let params = Parameters::<f64>::seeded(8, 3, 5);
    let out = decode(&Tensor::new(&[4, 3], vec![0.0; 12]), &params).unwrap();
    assert_eq!(out.shape().dims, vec![4, 8]);

    let err = decode(&Tensor::zeros(&[1, 8]), &params).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { operation: "decode", expected: 3, actual: 8 }));
  }

  #[test]
  fn wrong_width() {
    let params = Parameters::<f64>::seeded(8, 3, 5);
    let err = forward(&Tensor::zeros(&[1, 7]), &params).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { operation: "forward", expected: 8, actual: 7 }));

    let err = encode(&Tensor::zeros(&[8]), &params).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { operation: "encode", expected: 2, actual: 1 }));
  }
}
