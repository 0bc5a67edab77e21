use rand::Rng;

use crate::{
  scalar::Real,
};


#[inline]
pub fn negative_index(i: isize, n: usize) -> usize {
  if i < 0 {
    (n as isize + i) as usize
  } else {
    i as usize
  }
}


// Polar Box-Muller transformation

pub fn randn<T: Real, G: Rng>(rng: &mut G) -> (T, T) {
  loop {
    let u = rng.gen_range(-T::one(), T::one());
    let v = rng.gen_range(-T::one(), T::one());
    let r = u * u + v * v;
    // Try again if outside interval
    if r == T::zero() || r >= T::one() { continue }
    let c = (T::from(-2.0).unwrap() * r.ln() / r).sqrt();
    return (u * c, v * c)
  }
}
