//! Binary persistence of [Parameters].
//!
//! Parameters are stored with [postcard] together with the sizes they were
//! created for. Floats are written bit-exact, so a save/load round trip
//! reproduces every weight. Loading validates all shapes before handing
//! anything back; a stream that disagrees with the requested sizes is
//! rejected as a whole.

use std::io::{ Read, Write };
use std::fs;
use std::path::Path;

use log::debug;
use serde::{ Serialize, Deserialize };

use crate::{
  error::{ Error, Result },
  scalar::Real,
  model::{ Parameters, RawParameters },
  Shape,
};


#[derive(Serialize, Deserialize)]
struct ParameterDump<P> {
  input_size: usize,
  latent_size: usize,
  parameters: P,
}


pub fn to_bytes<R: Real>(params: &Parameters<R>) -> Result<Vec<u8>> {
  let dump = ParameterDump {
    input_size: params.input_size(),
    latent_size: params.latent_size(),
    parameters: params,
  };
  Ok(postcard::to_allocvec(&dump)?)
}

/// Decodes parameters using the sizes stored alongside them.

pub fn restore<R: Real>(bytes: &[u8]) -> Result<Parameters<R>> {
  let dump: ParameterDump<RawParameters<R>> = postcard::from_bytes(bytes)?;
  dump.parameters.validate(dump.input_size, dump.latent_size)
}

/// Decodes parameters, failing with [Error::ShapeMismatch] unless
/// they were stored for exactly these sizes.

pub fn from_bytes<R: Real>(bytes: &[u8], input_size: usize, latent_size: usize) -> Result<Parameters<R>> {
  let dump: ParameterDump<RawParameters<R>> = postcard::from_bytes(bytes)?;
  if dump.input_size != input_size || dump.latent_size != latent_size {
    return Err(Error::ShapeMismatch {
      tensor: "parameters",
      expected: Shape::matrix(input_size, latent_size),
      actual: Shape::matrix(dump.input_size, dump.latent_size),
    })
  }
  dump.parameters.validate(input_size, latent_size)
}

pub fn save<R: Real>(params: &Parameters<R>, mut writer: impl Write) -> Result<()> {
  writer.write_all(&to_bytes(params)?)?;
  writer.flush()?;
  Ok(())
}

pub fn load<R: Real>(mut reader: impl Read, input_size: usize, latent_size: usize) -> Result<Parameters<R>> {
  let mut bytes = vec![];
  reader.read_to_end(&mut bytes)?;
  from_bytes(&bytes, input_size, latent_size)
}

pub fn save_file<R: Real>(params: &Parameters<R>, path: impl AsRef<Path>) -> Result<()> {
  let path = path.as_ref();
  let bytes = to_bytes(params)?;
  fs::write(path, &bytes)?;
  debug!("Saved {}x{} parameters to {} ({} bytes)",
    params.input_size(), params.latent_size(), path.display(), bytes.len());
  Ok(())
}

pub fn load_file<R: Real>(path: impl AsRef<Path>, input_size: usize, latent_size: usize) -> Result<Parameters<R>> {
  let path = path.as_ref();
  let params = from_bytes(&fs::read(path)?, input_size, latent_size)?;
  debug!("Loaded {input_size}x{latent_size} parameters from {}", path.display());
  Ok(params)
}

pub fn restore_file<R: Real>(path: impl AsRef<Path>) -> Result<Parameters<R>> {
  let path = path.as_ref();
  let params: Parameters<R> = restore(&fs::read(path)?)?;
  debug!("Restored {}x{} parameters from {}",
    params.input_size(), params.latent_size(), path.display());
  Ok(params)
}
