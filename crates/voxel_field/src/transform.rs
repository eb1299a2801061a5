//! World space to tree space mapping.
//!
//! ```text
//! x_tree = x_world * invradius + offset
//! ```
//!
//! A tree covering the world box `center ± radius` uses
//! `invradius = 1 / (2 * radius)` and `offset = 0.5 - center * invradius`.

use crate::real::Real;

/// Affine, axis-aligned mapping from world coordinates into `[0, 1)³`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform<T: Real> {
  /// Additive offset, applied after scaling.
  pub offset: [T; 3],
  /// Per-axis inverse scale.
  pub invradius: [T; 3],
}

impl<T: Real> Transform<T> {
  pub fn new(offset: [T; 3], invradius: [T; 3]) -> Self {
    Self { offset, invradius }
  }

  /// Scalar inverse radius broadcast to all axes.
  pub fn uniform(offset: [T; 3], invradius: T) -> Self {
    Self::new(offset, [invradius; 3])
  }

  /// Tree space equals world space.
  pub fn identity() -> Self {
    Self::uniform([T::zero(); 3], T::one())
  }

  /// Transform for a tree spanning `center ± radius` in world space.
  pub fn from_center_radius(center: [T; 3], radius: T) -> Self {
    let inv = T::one() / (radius + radius);
    Self::uniform(
      [
        T::cast(0.5) - center[0] * inv,
        T::cast(0.5) - center[1] * inv,
        T::cast(0.5) - center[2] * inv,
      ],
      inv,
    )
  }

  #[inline]
  pub fn apply_point(&self, p: [T; 3]) -> [T; 3] {
    [
      p[0] * self.invradius[0] + self.offset[0],
      p[1] * self.invradius[1] + self.offset[1],
      p[2] * self.invradius[2] + self.offset[2],
    ]
  }

  /// Directions are scaled but not offset.
  #[inline]
  pub fn apply_direction(&self, d: [T; 3]) -> [T; 3] {
    [
      d[0] * self.invradius[0],
      d[1] * self.invradius[1],
      d[2] * self.invradius[2],
    ]
  }

  #[inline]
  pub fn inverse_point(&self, p: [T; 3]) -> [T; 3] {
    [
      (p[0] - self.offset[0]) / self.invradius[0],
      (p[1] - self.offset[1]) / self.invradius[1],
      (p[2] - self.offset[2]) / self.invradius[2],
    ]
  }
}

impl<T: Real> Default for Transform<T> {
  fn default() -> Self {
    Self::identity()
  }
}
