use num_traits::{ Float, NumAssignOps };

use crate::ops::Cops;


#[allow(dead_code)]
fn naive_gemm<T: Float + NumAssignOps>(rows_l: usize, cols_l: usize, cols_r: usize, lhs: &[T], rhs: &[T], out: &mut [T]) {
  for i in 0..rows_l {
    for k in 0..cols_l {
      let a = lhs[i * cols_l + k];
      for j in 0..cols_r {
        out[i * cols_r + j] += a * rhs[k * cols_r + j];
      }
    }
  }
}

macro_rules! impl_cops {
  ($type:ty, $gemm:path) => {
    impl Cops for $type {
      #[cfg(feature = "unsafe")]
      fn gemm(rows_l: usize, cols_l: usize, cols_r: usize, lhs: &[Self], rhs: &[Self], out: &mut [Self]) {
        assert!(lhs.len() >= rows_l * cols_l && rhs.len() >= cols_l * cols_r && out.len() >= rows_l * cols_r);
        if rows_l == 0 || cols_l == 0 || cols_r == 0 { return }
        unsafe {
          $gemm(
            rows_l,
            cols_l,
            cols_r,
            1.0,
            lhs.as_ptr(),
            cols_l as isize,
            1,
            rhs.as_ptr(),
            cols_r as isize,
            1,
            0.0,
            out.as_mut_ptr(),
            cols_r as isize,
            1,
          );
        }
      }

      #[cfg(not(feature = "unsafe"))]
      fn gemm(rows_l: usize, cols_l: usize, cols_r: usize, lhs: &[Self], rhs: &[Self], out: &mut [Self]) {
        naive_gemm(rows_l, cols_l, cols_r, lhs, rhs, out)
      }
    }
  };
}

impl_cops!(f32, matrixmultiply::sgemm);
impl_cops!(f64, matrixmultiply::dgemm);


#[cfg(test)]
mod tests {
  use super::*;
  use approx::assert_relative_eq;
  use crate::{ Tensor, ops::NumericOps };

  #[test]
  fn matmul() {
    let x = Tensor::new(&[2,3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let y = Tensor::new(&[3,2], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    assert_eq!(x.mm(&y).unwrap(), Tensor::new(&[2,2], vec![22.0, 28.0, 49.0, 64.0]));
  }

  #[test]
  fn matmul_vector() {
    let x = Tensor::new(&[2,3], vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let y = Tensor::new(&[3,1], vec![1.0, 2.0, 3.0]);
    assert_eq!(x.mm(&y).unwrap(), Tensor::new(&[2,1], vec![14.0, 32.0]));
  }

  #[test]
  fn naive_agrees() {
    let lhs = [0.5, -1.0, 2.0, 0.25, 3.0, -0.75];
    let rhs = [1.5, 0.5, -2.0, 1.0, 0.0, 4.0];
    let mut naive = [0.0; 4];
    let mut fast = [0.0; 4];
    naive_gemm(2, 3, 2, &lhs, &rhs, &mut naive);
    f64::gemm(2, 3, 2, &lhs, &rhs, &mut fast);
    for (&a, &b) in naive.iter().zip(&fast) {
      assert_relative_eq!(a, b, epsilon = 1e-12);
    }
  }
}
