use crate::{
  error::{ Error, Result },
  tensor::Tensor,
  scalar::Real,
  ops::{ self, BaseOps, NumericOps, RealOps },
};


impl<T: Real> NumericOps<T> for Tensor<T> {
  fn mm(&self, rhs: &Self) -> Result<Self> {
    if !self.shape.is_matrix() {
      return Err(Error::dimension("matmul lhs rank", 2, self.rank()))
    }
    if !rhs.shape.is_matrix() {
      return Err(Error::dimension("matmul rhs rank", 2, rhs.rank()))
    }
    let rows_l = self.rows();
    let cols_l = self.cols();
    let cols_r = rhs.cols();
    if cols_l != rhs.rows() {
      return Err(Error::dimension("matmul", cols_l, rhs.rows()))
    }

    let mut data = vec![T::zero(); rows_l * cols_r];
    T::gemm(rows_l, cols_l, cols_r, &self.data, &rhs.data, &mut data);

    Ok(Self::new(&[rows_l, cols_r], data))
  }

  fn add_row_bias(&self, bias: &Self) -> Result<Self> {
    if bias.rank() != 1 {
      return Err(Error::dimension("bias rank", 1, bias.rank()))
    }
    let cols = self.cols();
    if bias.size() != cols {
      return Err(Error::dimension("bias addition", cols, bias.size()))
    }
    let data = self.data
      .chunks(cols.max(1))
      .flat_map(|row| row.iter().zip(&bias.data).map(|(&a, &b)| a + b ) )
      .collect();
    Ok(Self::from_shape(self.shape.clone(), data))
  }
}

impl<T: Real> RealOps<T> for Tensor<T> {
  fn sigmoid(&self) -> Self {
    self.vectorize(ops::sigmoid)
  }

  fn sigmoid_derivative(&self) -> Self {
    self.vectorize(ops::sigmoid_derivative)
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn matmul_mismatch() {
    let x = Tensor::<f64>::zeros(&[2,3]);
    let y = Tensor::zeros(&[2,2]);
    let err = x.mm(&y).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { operation: "matmul", expected: 3, actual: 2 }));

    let v = Tensor::zeros(&[3]);
    assert!(x.mm(&v).is_err());
  }

  #[test]
  fn bias() {
    let x = Tensor::new(&[2,3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let b = Tensor::vec(&[10.0, 20.0, 30.0]);
    assert_eq!(x.add_row_bias(&b).unwrap(), Tensor::new(&[2,3], vec![11.0, 22.0, 33.0, 14.0, 25.0, 36.0]));

    let b = Tensor::vec(&[1.0, 2.0]);
    let err = x.add_row_bias(&b).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { operation: "bias addition", expected: 3, actual: 2 }));
  }

  #[test]
  fn sigmoid() {
    let z = Tensor::vec(&[-1000.0, 0.0, 1000.0]);
    assert_eq!(z.sigmoid(), Tensor::vec(&[0.0, 0.5, 1.0]));
    assert_eq!(z.sigmoid_derivative(), Tensor::vec(&[0.0, 0.25, 0.0]));
  }
}
