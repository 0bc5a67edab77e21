use rand::Rng;
use serde::{ de, Serialize, Deserialize, Deserializer };

mod cops;
mod lops;

use crate::{
  internal::*,
  error::{ Error, Result },
  shape::Shape,
  scalar::{ Inner, Real },
  ops::BaseOps,
};


/// Dense, row-major matrix or vector.
///
/// Tensors own their storage, so they can be handed to worker
/// threads by reference without any locking. Decoding rejects
/// shapes that don't account for every stored element.

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tensor<T: Inner> {
  shape: Shape,
  data: Vec<T>,
}

#[derive(Deserialize)]
struct RawTensor<T> {
  shape: Shape,
  data: Vec<T>,
}

impl<'de, T: Inner + Deserialize<'de>> Deserialize<'de> for Tensor<T> {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
    let raw = RawTensor::<T>::deserialize(deserializer)?;
    let tensor = Self { shape: raw.shape, data: raw.data };
    if !tensor.is_consistent() {
      let err = Error::dimension("tensor storage", tensor.shape.size(), tensor.data.len());
      return Err(de::Error::custom(err))
    }
    Ok(tensor)
  }
}

impl<T: Inner> BaseOps<T> for Tensor<T> {
  fn shape(&self) -> &Shape {
    &self.shape
  }
}

impl<T: Inner> Tensor<T> {
  pub fn from_shape(shape: Shape, data: Vec<T>) -> Self {
    assert_eq!(shape.size(), data.len(),
      "{} doesn't match data length {}", shape, data.len());
    Self { shape, data }
  }

  pub fn new(shape: &[usize], data: Vec<T>) -> Self {
    Self::from_shape(Shape::new(shape), data)
  }

  pub fn vec(vec: &[T]) -> Self {
    Self::new(&[vec.len()], vec.to_vec())
  }

  pub fn from_vec(vec: Vec<T>) -> Self {
    Self::new(&[vec.len()], vec)
  }

  pub fn fill(shape: &[usize], filler: T) -> Self {
    Self::new(shape, vec![filler; shape.iter().product()])
  }

  /// Stacks equally long samples into a matrix with one row per sample.
  ///
  /// Fails with [Error::DimensionMismatch] if any sample's length
  /// differs from the first one's.

  pub fn from_rows<S: AsRef<[T]>>(rows: &[S]) -> Result<Self> {
    let cols = rows.first().map(|row| row.as_ref().len() ).unwrap_or(0);
    let mut data = Vec::with_capacity(rows.len() * cols);
    for row in rows {
      let row = row.as_ref();
      if row.len() != cols {
        return Err(Error::dimension("batch sample", cols, row.len()))
      }
      data.extend_from_slice(row);
    }
    Ok(Self::new(&[rows.len(), cols], data))
  }

  /// Like [Tensor::from_rows], but additionally requires every sample to have length `cols`.

  pub fn batch<S: AsRef<[T]>>(rows: &[S], cols: usize) -> Result<Self> {
    let tensor = Self::from_rows(rows)?;
    if !rows.is_empty() && tensor.cols() != cols {
      return Err(Error::dimension("batch sample", cols, tensor.cols()))
    }
    Ok(tensor.view(&[rows.len(), cols]))
  }

  pub fn raw(&self) -> &[T] {
    &self.data
  }

  pub fn raw_mut(&mut self) -> &mut [T] {
    &mut self.data
  }

  pub fn size(&self) -> usize {
    self.shape.size()
  }

  pub fn rank(&self) -> usize {
    self.shape.rank()
  }

  /// Reinterprets the storage using new dimensions of equal size.

  pub fn view(self, dims: &[usize]) -> Self {
    Self::new(dims, self.data)
  }

  pub fn row(&self, idx: usize) -> &[T] {
    let cols = self.shape.cols();
    &self.data[idx * cols..(idx + 1) * cols]
  }

  pub fn iter_rows(&self) -> impl Iterator<Item = &[T]> + '_ {
    let cols = self.shape.cols().max(1);
    self.data.chunks(cols).take(self.shape.rows())
  }

  /// Checks that the stored shape accounts for every element.

  pub(crate) fn is_consistent(&self) -> bool {
    self.shape.size() == self.data.len()
  }

  pub fn zip<O, F>(&self, rhs: &Self, cb: F) -> Tensor<O>
  where
    O: Inner,
    F: Fn((T, T)) -> O,
  {
    assert_eq!(self.shape, rhs.shape,
      "Could not zip {} tensor with {} tensor", self.shape, rhs.shape);
    let data = self.data.iter().copied()
      .zip(rhs.data.iter().copied())
      .map(cb)
      .collect();
    Tensor::from_shape(self.shape.clone(), data)
  }

  pub fn vectorize<O, F>(&self, cb: F) -> Tensor<O>
  where
    O: Inner,
    F: FnMut(T) -> O,
  {
    let data = self.data.iter().copied().map(cb).collect();
    Tensor::from_shape(self.shape.clone(), data)
  }
}

impl<T: Real> Tensor<T> {
  pub fn zeros(shape: &[usize]) -> Self {
    Self::fill(shape, T::zero())
  }

  /// Standard normal samples.

  pub fn randn(shape: &[usize], rng: &mut impl Rng) -> Self {
    let len = shape.iter().product();
    let mut data = vec![T::zero(); len];
    for i in 0..(len as f64 / 2.0).ceil() as usize {
      let j = i * 2;
      let (r1, r2): (T, T) = randn(rng);
      data[j] = r1;
      data[(j + 1) % len] = r2;
    }
    Self::new(shape, data)
  }

  /// Normal samples scaled by `sqrt(2 / (fan_in + fan_out))`.

  pub fn glorot_normal(shape: &[usize], rng: &mut impl Rng) -> Self {
    let fan: usize = shape.iter().sum();
    let gain = T::from(2.0 / fan.max(1) as f64).unwrap().sqrt();
    let mut out = Self::randn(shape, rng);
    out.data.iter_mut().for_each(|a| *a *= gain );
    out
  }

  /// Random binary samples, each element being 0 or 1 with equal probability.

  pub fn binary(shape: &[usize], rng: &mut impl Rng) -> Self {
    let len = shape.iter().product();
    Self::new(shape, (0..len)
      .map(|_| if rng.gen::<bool>() { T::one() } else { T::zero() })
      .collect())
  }

  /// Maps every element strictly above `threshold` to 1 and all others to 0.

  pub fn threshold(&self, threshold: T) -> Self {
    self.vectorize(|a| if a > threshold { T::one() } else { T::zero() })
  }

  pub fn sum(&self) -> T {
    self.data.iter().copied().sum()
  }

  pub fn all(&self, cb: impl Fn(T) -> bool) -> bool {
    self.data.iter().all(|&a| cb(a) )
  }
}

impl<T: Inner> std::fmt::Display for Tensor<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "Tensor{:?} ", self.shape.dims)?;
    print_chunks(0, &self.shape, &self.data, f)?;
    Ok(())
  }
}

fn print_chunks<T: std::fmt::Debug>(idx: usize, shape: &Shape, vec: &[T], f: &mut std::fmt::Formatter) -> std::fmt::Result {
  let indent = (0..idx * 2).map(|_| " ").collect::<String>();
  if shape.rank() == 0 {
    write!(f, "{indent}{:?}", vec.first())?;
  } else if idx == shape.rank() - 1 {
    writeln!(f, "{indent}{:?}", vec)?;
  } else {
    writeln!(f, "{indent}[")?;
    if !vec.is_empty() {
      for chunk in vec.chunks(vec.len() / shape.dims[idx]) {
        print_chunks(idx + 1, shape, chunk, f)?;
      }
    }
    writeln!(f, "{indent}]")?;
  }
  Ok(())
}


#[cfg(test)]
mod tests {
  use super::*;
  use rand::{ SeedableRng, rngs::StdRng };

  #[test]
  fn rows() {
    let x = Tensor::from_rows(&[vec![1, 2, 3], vec![4, 5, 6]]).unwrap();
    assert_eq!(x, Tensor::new(&[2,3], vec![1, 2, 3, 4, 5, 6]));
    assert_eq!(x.row(1), &[4, 5, 6]);
    assert_eq!(x.iter_rows().collect::<Vec<_>>(), vec![&[1, 2, 3][..], &[4, 5, 6][..]]);
  }

  #[test]
  fn ragged_rows() {
    let err = Tensor::from_rows(&[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { expected: 2, actual: 1, .. }));
  }

  #[test]
  fn batch_width() {
    let err = Tensor::batch(&[vec![0.0; 7]], 8).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { expected: 8, actual: 7, .. }));

    let empty = Tensor::<f32>::batch::<Vec<f32>>(&[], 8).unwrap();
    assert_eq!(empty.shape().dims, vec![0, 8]);
  }

  #[test]
  fn threshold() {
    let x = Tensor::vec(&[0.2, 0.5, 0.51, 0.9]);
    assert_eq!(x.threshold(0.5), Tensor::vec(&[0.0, 0.0, 1.0, 1.0]));
  }

  #[test]
  fn binary() {
    let mut rng = StdRng::seed_from_u64(3);
    let x = Tensor::<f64>::binary(&[10, 8], &mut rng);
    assert!(x.all(|a| a == 0.0 || a == 1.0 ));
    assert!(x.sum() > 0.0 && x.sum() < 80.0);
  }

  #[test]
  fn glorot_scale() {
    let mut rng = StdRng::seed_from_u64(11);
    let w = Tensor::<f64>::glorot_normal(&[200, 100], &mut rng);
    let n = w.size() as f64;
    let variance = w.raw().iter().map(|a| a * a ).sum::<f64>() / n;
    assert!((variance - 2.0 / 300.0).abs() < 1e-3);
  }

  #[test]
  fn decoding_checks_storage() {
    let bytes = postcard::to_allocvec(&Tensor::new(&[2,2], vec![1.0, 2.0, 3.0, 4.0])).unwrap();
    let x: Tensor<f64> = postcard::from_bytes(&bytes).unwrap();
    assert_eq!(x, Tensor::new(&[2,2], vec![1.0, 2.0, 3.0, 4.0]));

    // Shape claims four elements, only three are stored
    let bytes = postcard::to_allocvec(&(Shape::matrix(2, 2), vec![1.0f64, 2.0, 3.0])).unwrap();
    assert!(postcard::from_bytes::<Tensor<f64>>(&bytes).is_err());
  }

  #[test]
  fn display() {
    let x = Tensor::new(&[2,2], vec![1, 2, 3, 4]);
    assert_eq!(x.to_string(), "Tensor[2, 2] [\n  [1, 2]\n  [3, 4]\n]\n");
  }
}
