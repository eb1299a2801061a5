//! TreeShape - array dimensions and flat index math.

use crate::error::{FieldError, FieldResult};

/// Dimensions of the tree arrays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TreeShape {
  /// Number of branch nodes (M).
  pub nodes: usize,
  /// Grid resolution per axis inside a node (N).
  pub grid: usize,
  /// Data channels per cell (K).
  pub channels: usize,
}

impl TreeShape {
  /// Create a shape, rejecting zero dimensions.
  pub fn new(nodes: usize, grid: usize, channels: usize) -> FieldResult<Self> {
    let shape = Self {
      nodes,
      grid,
      channels,
    };
    shape.check_non_empty()?;
    Ok(shape)
  }

  /// N³
  #[inline]
  pub fn cells_per_node(&self) -> usize {
    self.grid * self.grid * self.grid
  }

  /// Length of the child array (M·N³).
  #[inline]
  pub fn cell_count(&self) -> usize {
    self.nodes * self.cells_per_node()
  }

  /// Length of the data array (M·N³·K).
  #[inline]
  pub fn data_len(&self) -> usize {
    self.cell_count() * self.channels
  }

  /// Flat index into the child array.
  #[inline(always)]
  pub fn cell_index(&self, node: usize, cell: [usize; 3]) -> usize {
    ((node * self.grid + cell[0]) * self.grid + cell[1]) * self.grid + cell[2]
  }

  /// Flat index of channel 0 of a cell in the data array.
  #[inline(always)]
  pub fn data_index(&self, node: usize, cell: [usize; 3]) -> usize {
    self.cell_index(node, cell) * self.channels
  }

  /// Inverse of `cell_index`.
  #[inline]
  pub fn cell_coord(&self, index: usize) -> (usize, [usize; 3]) {
    let n = self.grid;
    let z = index % n;
    let y = (index / n) % n;
    let x = (index / (n * n)) % n;
    let node = index / self.cells_per_node();
    (node, [x, y, z])
  }

  /// Deepest possible descent: every node visited at most once.
  #[inline]
  pub fn max_depth(&self) -> usize {
    self.nodes
  }

  /// Fields are public, so every constructor taking a shape re-checks this.
  pub(crate) fn check_non_empty(&self) -> FieldResult<()> {
    if self.nodes == 0 || self.grid == 0 || self.channels == 0 {
      return Err(FieldError::EmptyShape {
        nodes: self.nodes,
        grid: self.grid,
        channels: self.channels,
      });
    }
    Ok(())
  }

  pub(crate) fn check_len(&self, what: &'static str, expected: usize, actual: usize) -> FieldResult<()> {
    if expected != actual {
      return Err(FieldError::ShapeMismatch {
        what,
        expected,
        actual,
      });
    }
    Ok(())
  }
}

#[cfg(test)]
#[path = "shape_test.rs"]
mod shape_test;
