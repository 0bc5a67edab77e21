use serde::{Serialize, Deserialize};

use crate::internal::*;


/// The shape of a [Tensor](crate::Tensor).
///
/// Tensors in this crate are either vectors (rank 1) or
/// row-major matrices (rank 2).

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
  pub dims: Vec<usize>,
}

impl Shape {
  pub fn new(dims: &[usize]) -> Self {
    Self { dims: dims.to_vec() }
  }

  pub fn matrix(rows: usize, cols: usize) -> Self {
    Self::new(&[rows, cols])
  }

  pub fn vector(len: usize) -> Self {
    Self::new(&[len])
  }

  pub fn size(&self) -> usize {
    self.dims.iter().product()
  }

  pub fn rank(&self) -> usize {
    self.dims.len()
  }

  /// Number of rows. Vectors count as a single row.

  pub fn rows(&self) -> usize {
    match self.rank() {
      0 | 1 => 1,
      _ => self[-2],
    }
  }

  /// Length of a single row.

  pub fn cols(&self) -> usize {
    match self.rank() {
      0 => 1,
      _ => self[-1],
    }
  }

  pub fn is_matrix(&self) -> bool {
    self.rank() == 2
  }

  pub fn at_or(&self, idx: isize, or: usize) -> usize {
    let off_bounds = if idx < 0 {
      idx.unsigned_abs() > self.rank()
    } else {
      idx as usize >= self.rank()
    };
    if off_bounds { or } else { self[idx] }
  }
}

impl std::ops::Index<isize> for Shape {
  type Output = usize;

  fn index(&self, i: isize) -> &usize {
    let idx = negative_index(i, self.rank());
    &self.dims[idx]
  }
}

impl std::fmt::Display for Shape {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "Shape{:?}", self.dims)
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rows_and_cols() {
    let shape = Shape::matrix(3, 2);
    assert_eq!(shape.rows(), 3);
    assert_eq!(shape.cols(), 2);
    assert_eq!(shape.size(), 6);

    let shape = Shape::vector(4);
    assert_eq!(shape.rows(), 1);
    assert_eq!(shape.cols(), 4);
  }

  #[test]
  fn index() {
    let shape = Shape::matrix(3, 2);
    assert_eq!(shape[0], 3);
    assert_eq!(shape[-1], 2);
    assert_eq!(shape.at_or(-3, 1), 1);
    assert_eq!(shape.at_or(2, 1), 1);
  }

  #[test]
  fn display() {
    assert_eq!(Shape::matrix(2, 8).to_string(), "Shape[2, 8]");
  }
}
