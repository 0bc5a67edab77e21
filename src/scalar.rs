use rand::distributions::uniform::SampleUniform;
use num_traits::{ Float, NumAssignOps };
use serde::{ Serialize, de::DeserializeOwned };

use crate::ops::Cops;


/// All types that may be used in a [Tensor](crate::Tensor).
///
/// This trait gets implemented automatically for all types
/// that satisfy its dependent traits.

pub trait Inner: PartialEq + Clone + Copy + Send + Sync + std::fmt::Debug + 'static {}
impl<T: PartialEq + Clone + Copy + Send + Sync + std::fmt::Debug + 'static> Inner for T {}


/// All continuous numeric types an [Autoencoder](crate::Autoencoder) can be trained with.
///
/// Implemented automatically for `f32` and `f64`. Other float types
/// need a [Cops] implementation first.

pub trait Real:
  Inner + Float + NumAssignOps + std::iter::Sum + SampleUniform
  + Serialize + DeserializeOwned + Cops
{}

impl<T> Real for T where
  T: Inner + Float + NumAssignOps + std::iter::Sum + SampleUniform
  + Serialize + DeserializeOwned + Cops
{}
