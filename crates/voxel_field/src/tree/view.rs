//! TreeView - borrowed data array plus structure, used by the read kernels.

use super::{TreeShape, TreeStructure};
use crate::error::FieldResult;
use crate::interp::BlendMode;
use crate::real::Real;

/// Read-only view over externally owned tree arrays.
#[derive(Clone, Copy, Debug)]
pub struct TreeView<'a, T: Real> {
  structure: TreeStructure<'a>,
  data: &'a [T],
}

impl<'a, T: Real> TreeView<'a, T> {
  /// Wrap `data` (M·N³·K) and `child` (M·N³), checking both lengths.
  pub fn new(shape: TreeShape, data: &'a [T], child: &'a [i32]) -> FieldResult<Self> {
    shape.check_non_empty()?;
    shape.check_len("data", shape.data_len(), data.len())?;
    let structure = TreeStructure::new(shape, child)?;
    Ok(Self { structure, data })
  }

  /// Pair an existing structure with a data slice.
  pub fn from_structure(structure: TreeStructure<'a>, data: &'a [T]) -> FieldResult<Self> {
    let shape = structure.shape();
    shape.check_len("data", shape.data_len(), data.len())?;
    Ok(Self { structure, data })
  }

  pub(crate) fn new_unchecked(structure: TreeStructure<'a>, data: &'a [T]) -> Self {
    Self { structure, data }
  }

  pub fn with_blend(mut self, blend: BlendMode) -> Self {
    self.structure = self.structure.with_blend(blend);
    self
  }

  #[inline]
  pub fn structure(&self) -> &TreeStructure<'a> {
    &self.structure
  }

  #[inline]
  pub fn shape(&self) -> TreeShape {
    self.structure.shape()
  }

  #[inline]
  pub fn data(&self) -> &'a [T] {
    self.data
  }

  /// K-channel vector of one cell.
  #[inline]
  pub fn cell_data(&self, node: usize, cell: [usize; 3]) -> &'a [T] {
    let shape = self.shape();
    let start = shape.data_index(node, cell);
    &self.data[start..start + shape.channels]
  }
}
