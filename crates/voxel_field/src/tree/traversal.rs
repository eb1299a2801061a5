//! Traversal primitive: descend from the root to the leaf cell containing a
//! tree-space point.
//!
//! ```text
//! level 0: node 0, cell = floor(p * N)          local = p
//! level 1: node child[0, cell], ...             local = p * N - cell
//! ...
//! stop when child[node, cell] == 0
//! ```
//!
//! The descent never revisits a node in a well-formed tree, so a path longer
//! than the node count proves a cycle (or a subtree shared by two parents
//! along the same path) and is reported instead of looping forever.

use smallvec::SmallVec;

use super::TreeShape;
use crate::error::{FieldError, FieldResult};
use crate::interp::BlendMode;
use crate::real::Real;

/// One visited level of a traversal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Level<T: Real> {
  /// Branch node index.
  pub node: usize,
  /// Cell inside the node containing the point.
  pub cell: [usize; 3],
  /// The point in the node's own `[0, 1)³` frame.
  pub local: [T; 3],
}

/// Tree-space box of a single cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellBounds<T: Real> {
  pub min: [T; 3],
  pub size: T,
}

impl<T: Real> CellBounds<T> {
  #[inline]
  pub fn max(&self) -> [T; 3] {
    [
      self.min[0] + self.size,
      self.min[1] + self.size,
      self.min[2] + self.size,
    ]
  }
}

/// Ordered levels from the root down to the leaf cell.
#[derive(Clone, Debug, PartialEq)]
pub struct Path<T: Real> {
  levels: SmallVec<[Level<T>; 8]>,
  leaf: CellBounds<T>,
}

impl<T: Real> Path<T> {
  #[inline]
  pub fn levels(&self) -> &[Level<T>] {
    &self.levels
  }

  /// Number of visited levels (at least 1).
  #[inline]
  pub fn depth(&self) -> usize {
    self.levels.len()
  }

  /// Deepest visited level.
  #[inline]
  pub fn leaf(&self) -> &Level<T> {
    &self.levels[self.levels.len() - 1]
  }

  /// Tree-space bounds of the leaf cell. Every point inside shares this path's
  /// node and cell sequence.
  #[inline]
  pub fn leaf_bounds(&self) -> CellBounds<T> {
    self.leaf
  }
}

/// Whether a tree-space point lies in the half-open unit cube.
#[inline]
pub fn in_domain<T: Real>(p: [T; 3]) -> bool {
  p.iter().all(|&x| x >= T::zero() && x < T::one())
}

/// Borrowed child-pointer array plus the field's blend law.
///
/// This is all the backward and assign kernels need; read kernels use
/// [`TreeView`](super::TreeView), which wraps a structure with data.
#[derive(Clone, Copy, Debug)]
pub struct TreeStructure<'a> {
  shape: TreeShape,
  child: &'a [i32],
  blend: BlendMode,
}

impl<'a> TreeStructure<'a> {
  /// Wrap a child array, checking it matches `shape`.
  pub fn new(shape: TreeShape, child: &'a [i32]) -> FieldResult<Self> {
    shape.check_non_empty()?;
    shape.check_len("child", shape.cell_count(), child.len())?;
    Ok(Self {
      shape,
      child,
      blend: BlendMode::default(),
    })
  }

  /// Owned arenas keep their arrays in sync with the shape.
  pub(crate) fn new_unchecked(shape: TreeShape, child: &'a [i32], blend: BlendMode) -> Self {
    Self {
      shape,
      child,
      blend,
    }
  }

  pub fn with_blend(mut self, blend: BlendMode) -> Self {
    self.blend = blend;
    self
  }

  #[inline]
  pub fn shape(&self) -> TreeShape {
    self.shape
  }

  #[inline]
  pub fn blend(&self) -> BlendMode {
    self.blend
  }

  #[inline]
  pub fn child(&self) -> &'a [i32] {
    self.child
  }

  /// Raw child pointer of a cell.
  #[inline]
  pub fn child_of(&self, node: usize, cell: [usize; 3]) -> i32 {
    self.child[self.shape.cell_index(node, cell)]
  }

  /// Descend from the root to the leaf cell containing `p` (tree space).
  ///
  /// Returns `Ok(None)` for points outside `[0, 1)³`.
  pub fn traverse<T: Real>(&self, p: [T; 3]) -> FieldResult<Option<Path<T>>> {
    if !in_domain(p) {
      return Ok(None);
    }

    let grid = self.shape.grid;
    let n = T::cast(grid as f64);
    let mut levels: SmallVec<[Level<T>; 8]> = SmallVec::new();
    let mut node = 0usize;
    let mut local = p;
    let mut min = [T::zero(); 3];
    let mut size = T::one();

    loop {
      if levels.len() == self.shape.max_depth() {
        #[cfg(feature = "tracing")]
        tracing::warn!(max_depth = self.shape.max_depth(), "tree traversal exceeded max depth");
        return Err(FieldError::DepthExceeded {
          max_depth: self.shape.max_depth(),
        });
      }

      let cell = [
        cell_coord(local[0], n, grid),
        cell_coord(local[1], n, grid),
        cell_coord(local[2], n, grid),
      ];
      levels.push(Level { node, cell, local });

      size = size / n;
      for axis in 0..3 {
        min[axis] += T::cast(cell[axis] as f64) * size;
      }

      let pointer = self.child_of(node, cell);
      if pointer == 0 {
        break;
      }
      if pointer < 0 || pointer as usize >= self.shape.nodes {
        #[cfg(feature = "tracing")]
        tracing::warn!(node, pointer, "corrupt child pointer");
        return Err(FieldError::CorruptTree {
          node,
          cell,
          pointer: pointer as i64,
          nodes: self.shape.nodes,
        });
      }

      node = pointer as usize;
      for axis in 0..3 {
        local[axis] = local[axis] * n - T::cast(cell[axis] as f64);
      }
    }

    Ok(Some(Path {
      levels,
      leaf: CellBounds { min, size },
    }))
  }
}

/// `floor(x * N)` clamped into `[0, N)`; rounding can push `x * N` onto `N`.
#[inline(always)]
fn cell_coord<T: Real>(x: T, n: T, grid: usize) -> usize {
  // Negative and NaN coordinates fail the conversion and land in cell 0.
  (x * n).floor().to_usize().map_or(0, |c| c.min(grid - 1))
}

#[cfg(test)]
#[path = "traversal_test.rs"]
mod traversal_test;
