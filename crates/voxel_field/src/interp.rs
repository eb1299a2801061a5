//! Per-level trilinear stencil and the vertical blend law.
//!
//! Data lives at cell centres. Inside a node, a point with node-local
//! coordinate `x` in `[0, 1)` interpolates between the two cell centres
//! bracketing `x * N - 0.5`; indices are clamped to the node (clamp to edge),
//! so near the node border both corners collapse onto the border cell.
//!
//! Corner layout (binary: ZYX):
//! ```text
//! 0: (0,0,0)  4: (0,0,1)
//! 1: (1,0,0)  5: (1,0,1)
//! 2: (0,1,0)  6: (0,1,1)
//! 3: (1,1,0)  7: (1,1,1)
//! ```
//!
//! # Vertical blend
//!
//! Every level `l` on a traversal path gets a coefficient `β_l`:
//!
//! ```text
//! f(p) = Σ_l β_l Σ_c w_{l,c}(p) · data[node_l, corner_c]
//! ```
//!
//! The field is linear in `data`, so the backward pass and the assign
//! kernel distribute with exactly the same `β_l · w_{l,c}` coefficients.

use crate::real::Real;
use crate::tree::Path;

/// How the per-level interpolated values combine along a traversal path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
  /// Sum of every visited level (`β_l = 1`). Deeper levels store residual
  /// refinements, so splitting a cell into an all-zero child leaves the field
  /// unchanged.
  #[default]
  Residual,

  /// Only the deepest visited level contributes (`β_L = 1`, others 0).
  Deepest,
}

impl BlendMode {
  /// Coefficient `β` for `level` on a path of `depth` levels.
  #[inline]
  pub fn level_weight<T: Real>(self, level: usize, depth: usize) -> T {
    match self {
      BlendMode::Residual => T::one(),
      BlendMode::Deepest => {
        if level + 1 == depth {
          T::one()
        } else {
          T::zero()
        }
      }
    }
  }

  /// Whether `level` contributes at all.
  #[inline]
  pub fn contributes(self, level: usize, depth: usize) -> bool {
    match self {
      BlendMode::Residual => true,
      BlendMode::Deepest => level + 1 == depth,
    }
  }
}

/// Trilinear stencil inside one node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stencil<T: Real> {
  /// Lower corner index per axis (clamped).
  pub lo: [usize; 3],
  /// Upper corner index per axis (clamped).
  pub hi: [usize; 3],
  /// Interpolation fraction towards `hi` per axis.
  pub frac: [T; 3],
}

impl<T: Real> Stencil<T> {
  /// Build the stencil for node-local coordinate `local` on an `grid`³ node.
  #[inline]
  pub fn new(local: [T; 3], grid: usize) -> Self {
    let n = T::cast(grid as f64);
    let last = grid as isize - 1;
    let mut lo = [0usize; 3];
    let mut hi = [0usize; 3];
    let mut frac = [T::zero(); 3];
    for axis in 0..3 {
      let u = local[axis] * n - T::cast(0.5);
      let base = u.floor();
      frac[axis] = u - base;
      let i0 = base.to_isize().unwrap_or(0);
      lo[axis] = i0.clamp(0, last) as usize;
      hi[axis] = (i0 + 1).clamp(0, last) as usize;
    }
    Self { lo, hi, frac }
  }

  /// Visit the 8 corners with their trilinear weights. Weights sum to 1.
  #[inline]
  pub fn for_each_corner(&self, mut f: impl FnMut([usize; 3], T)) {
    for corner in 0..8usize {
      let mut cell = [0usize; 3];
      let mut weight = T::one();
      for axis in 0..3 {
        if (corner >> axis) & 1 == 1 {
          cell[axis] = self.hi[axis];
          weight *= self.frac[axis];
        } else {
          cell[axis] = self.lo[axis];
          weight *= T::one() - self.frac[axis];
        }
      }
      f(cell, weight);
    }
  }
}

/// Visit every `(node, cell, β·w)` triple that contributes to the field at
/// the path's point. Zero-coefficient levels are skipped.
#[inline]
pub fn for_each_contribution<T: Real>(
  path: &Path<T>,
  grid: usize,
  blend: BlendMode,
  mut f: impl FnMut(usize, [usize; 3], T),
) {
  let depth = path.depth();
  for (level_idx, level) in path.levels().iter().enumerate() {
    if !blend.contributes(level_idx, depth) {
      continue;
    }
    let beta: T = blend.level_weight(level_idx, depth);
    Stencil::new(level.local, grid).for_each_corner(|cell, w| f(level.node, cell, beta * w));
  }
}

#[cfg(test)]
#[path = "interp_test.rs"]
mod interp_test;
