//! Scatter-accumulate buffer: many workers, one target, atomic adds.
//!
//! Contributions land in a shared buffer of atomic cells with no locks and no
//! ordering between workers. Addition is the only combining operator, so the
//! result is independent of scheduling up to floating point summation order.

use rayon::prelude::*;

use crate::interp::{for_each_contribution, BlendMode};
use crate::real::Real;
use crate::tree::{Path, TreeShape};

/// Shared accumulation target shaped like the tree's data array.
#[derive(Debug)]
pub struct ScatterBuffer<T: Real> {
  shape: TreeShape,
  cells: Vec<T::Atomic>,
}

impl<T: Real> ScatterBuffer<T> {
  /// All-zero buffer of `shape.data_len()` cells.
  pub fn zeros(shape: TreeShape) -> Self {
    let cells = (0..shape.data_len())
      .into_par_iter()
      .map(|_| T::atomic_new(T::zero()))
      .collect();
    Self { shape, cells }
  }

  #[inline]
  pub fn shape(&self) -> TreeShape {
    self.shape
  }

  /// Atomic `buffer[index] += value`.
  #[inline]
  pub fn add(&self, index: usize, value: T) {
    T::atomic_add(&self.cells[index], value);
  }

  /// Add `weight * values[k]` into every channel of one cell.
  #[inline]
  pub fn add_cell(&self, node: usize, cell: [usize; 3], weight: T, values: &[T]) {
    let base = self.shape.data_index(node, cell);
    for (k, &v) in values.iter().enumerate() {
      self.add(base + k, weight * v);
    }
  }

  /// Distribute a K-channel vector along a traversal path using the field's
  /// interpolation/blend coefficients (the adjoint of the vertical query).
  #[inline]
  pub fn scatter_path(&self, path: &Path<T>, blend: BlendMode, values: &[T]) {
    for_each_contribution(path, self.shape.grid, blend, |node, cell, weight| {
      self.add_cell(node, cell, weight, values);
    });
  }

  /// Read one accumulated value.
  #[inline]
  pub fn get(&self, index: usize) -> T {
    T::atomic_load(&self.cells[index])
  }

  /// Finish accumulation and take the plain values.
  pub fn into_vec(self) -> Vec<T> {
    self
      .cells
      .into_par_iter()
      .map(T::atomic_into_inner)
      .collect()
  }

  /// Finish accumulation and add the result into `target` in place.
  pub fn add_into(self, target: &mut [T]) {
    debug_assert_eq!(target.len(), self.cells.len());
    target
      .par_iter_mut()
      .zip(self.cells.into_par_iter())
      .for_each(|(t, cell)| *t += T::atomic_into_inner(cell));
  }
}
