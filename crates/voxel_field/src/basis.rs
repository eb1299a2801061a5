//! Color bases: map a view direction plus per-sample coefficients to color.
//!
//! Both bases are linear in the coefficients, so `backward` is the
//! transpose of `eval` for a fixed direction.

use crate::error::{FieldError, FieldResult};
use crate::real::Real;

/// Pluggable view-dependent color evaluation.
pub trait ColorBasis<T: Real>: Sync {
  /// Output channel count for `coefficients` input coefficients, or an error
  /// if the basis cannot consume that many.
  fn output_channels(&self, coefficients: usize) -> FieldResult<usize>;

  /// `out = B(dir) · coeffs`. `dir` is unit length.
  fn eval(&self, dir: [T; 3], coeffs: &[T], out: &mut [T]);

  /// `grad_coeffs += B(dir)ᵀ · grad_out`.
  fn backward(&self, dir: [T; 3], grad_out: &[T], grad_coeffs: &mut [T]);
}

/// Coefficients are the color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Identity;

impl<T: Real> ColorBasis<T> for Identity {
  fn output_channels(&self, coefficients: usize) -> FieldResult<usize> {
    Ok(coefficients)
  }

  #[inline]
  fn eval(&self, _dir: [T; 3], coeffs: &[T], out: &mut [T]) {
    out.copy_from_slice(coeffs);
  }

  #[inline]
  fn backward(&self, _dir: [T; 3], grad_out: &[T], grad_coeffs: &mut [T]) {
    for (g, &d) in grad_coeffs.iter_mut().zip(grad_out) {
      *g += d;
    }
  }
}

/// Real spherical harmonics constants.
const SH_C0: f64 = 0.282_094_791_773_878_14;
const SH_C1: f64 = 0.488_602_511_902_919_9;
const SH_C2: [f64; 5] = [
  1.092_548_430_592_079_2,
  -1.092_548_430_592_079_2,
  0.315_391_565_252_520_05,
  -1.092_548_430_592_079_2,
  0.546_274_215_296_039_6,
];
const SH_C3: [f64; 7] = [
  -0.590_043_589_926_643_5,
  2.890_611_442_640_554,
  -0.457_045_799_464_465_8,
  0.373_176_332_590_115_4,
  -0.457_045_799_464_465_8,
  1.445_305_721_320_277,
  -0.590_043_589_926_643_5,
];

/// Maximum supported degree.
pub const SH_MAX_DEGREE: usize = 3;

/// RGB from real spherical harmonics of a fixed degree.
///
/// Coefficients are channel-major: `coeffs[c * B + b]` is basis function `b`
/// of color channel `c`, with `B = (degree + 1)²`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SphericalHarmonics {
  degree: usize,
}

impl SphericalHarmonics {
  pub fn new(degree: usize) -> FieldResult<Self> {
    if degree > SH_MAX_DEGREE {
      return Err(FieldError::InvalidParameter {
        name: "degree",
        reason: "spherical harmonics degree must be at most 3",
      });
    }
    Ok(Self { degree })
  }

  #[inline]
  pub fn degree(&self) -> usize {
    self.degree
  }

  /// Basis functions per color channel.
  #[inline]
  pub fn basis_count(&self) -> usize {
    (self.degree + 1) * (self.degree + 1)
  }

  /// Evaluate the basis functions for `dir` into `out[..basis_count]`.
  pub fn basis<T: Real>(&self, dir: [T; 3], out: &mut [T; 16]) {
    let c = T::cast;
    let [x, y, z] = dir;
    out[0] = c(SH_C0);
    if self.degree == 0 {
      return;
    }
    out[1] = -c(SH_C1) * y;
    out[2] = c(SH_C1) * z;
    out[3] = -c(SH_C1) * x;
    if self.degree == 1 {
      return;
    }
    let (xx, yy, zz) = (x * x, y * y, z * z);
    let (xy, yz, xz) = (x * y, y * z, x * z);
    let two = c(2.0);
    out[4] = c(SH_C2[0]) * xy;
    out[5] = c(SH_C2[1]) * yz;
    out[6] = c(SH_C2[2]) * (two * zz - xx - yy);
    out[7] = c(SH_C2[3]) * xz;
    out[8] = c(SH_C2[4]) * (xx - yy);
    if self.degree == 2 {
      return;
    }
    let three = c(3.0);
    let four = c(4.0);
    out[9] = c(SH_C3[0]) * y * (three * xx - yy);
    out[10] = c(SH_C3[1]) * xy * z;
    out[11] = c(SH_C3[2]) * y * (four * zz - xx - yy);
    out[12] = c(SH_C3[3]) * z * (two * zz - three * xx - three * yy);
    out[13] = c(SH_C3[4]) * x * (four * zz - xx - yy);
    out[14] = c(SH_C3[5]) * z * (xx - yy);
    out[15] = c(SH_C3[6]) * x * (xx - three * yy);
  }
}

impl<T: Real> ColorBasis<T> for SphericalHarmonics {
  fn output_channels(&self, coefficients: usize) -> FieldResult<usize> {
    let expected = 3 * self.basis_count();
    if coefficients != expected {
      return Err(FieldError::BasisMismatch {
        expected,
        actual: coefficients,
      });
    }
    Ok(3)
  }

  fn eval(&self, dir: [T; 3], coeffs: &[T], out: &mut [T]) {
    let count = self.basis_count();
    let mut sh = [T::zero(); 16];
    self.basis(dir, &mut sh);
    for (channel, dst) in out.iter_mut().enumerate().take(3) {
      let row = &coeffs[channel * count..(channel + 1) * count];
      *dst = row.iter().zip(&sh[..count]).map(|(&a, &b)| a * b).sum();
    }
  }

  fn backward(&self, dir: [T; 3], grad_out: &[T], grad_coeffs: &mut [T]) {
    let count = self.basis_count();
    let mut sh = [T::zero(); 16];
    self.basis(dir, &mut sh);
    for (channel, &g) in grad_out.iter().enumerate().take(3) {
      let row = &mut grad_coeffs[channel * count..(channel + 1) * count];
      for (dst, &b) in row.iter_mut().zip(&sh[..count]) {
        *dst += g * b;
      }
    }
  }
}

#[cfg(test)]
#[path = "basis_test.rs"]
mod basis_test;
