//! Tree - owned arena storage for callers without a host tensor runtime.
//!
//! Nodes are appended to flat `Vec`s; child pointers are plain indices into
//! the arena. Kernels never use this type directly, they borrow it through
//! [`Tree::view`] and [`Tree::structure`].

use super::{TreeShape, TreeStructure, TreeView};
use crate::error::{FieldError, FieldResult};
use crate::interp::BlendMode;
use crate::real::Real;

/// Owned tree arrays.
#[derive(Clone, Debug, PartialEq)]
pub struct Tree<T: Real> {
  shape: TreeShape,
  data: Vec<T>,
  child: Vec<i32>,
  blend: BlendMode,
}

impl<T: Real> Tree<T> {
  /// Create a tree with a single all-zero, all-leaf root node.
  pub fn new(grid: usize, channels: usize) -> FieldResult<Self> {
    let shape = TreeShape::new(1, grid, channels)?;
    Ok(Self {
      shape,
      data: vec![T::zero(); shape.data_len()],
      child: vec![0; shape.cell_count()],
      blend: BlendMode::default(),
    })
  }

  /// Take ownership of existing arrays.
  pub fn from_parts(shape: TreeShape, data: Vec<T>, child: Vec<i32>) -> FieldResult<Self> {
    shape.check_non_empty()?;
    shape.check_len("data", shape.data_len(), data.len())?;
    shape.check_len("child", shape.cell_count(), child.len())?;
    Ok(Self {
      shape,
      data,
      child,
      blend: BlendMode::default(),
    })
  }

  pub fn with_blend(mut self, blend: BlendMode) -> Self {
    self.blend = blend;
    self
  }

  pub fn set_blend(&mut self, blend: BlendMode) {
    self.blend = blend;
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
  pub fn data(&self) -> &[T] {
    &self.data
  }

  #[inline]
  pub fn data_mut(&mut self) -> &mut [T] {
    &mut self.data
  }

  #[inline]
  pub fn child(&self) -> &[i32] {
    &self.child
  }

  /// Mutable child array. Callers are responsible for keeping it a tree;
  /// [`Tree::validate`] checks.
  #[inline]
  pub fn child_mut(&mut self) -> &mut [i32] {
    &mut self.child
  }

  pub fn cell_data(&self, node: usize, cell: [usize; 3]) -> &[T] {
    let start = self.shape.data_index(node, cell);
    &self.data[start..start + self.shape.channels]
  }

  pub fn cell_data_mut(&mut self, node: usize, cell: [usize; 3]) -> &mut [T] {
    let start = self.shape.data_index(node, cell);
    &mut self.data[start..start + self.shape.channels]
  }

  /// Child node of a cell, if it has one.
  pub fn child_node(&self, node: usize, cell: [usize; 3]) -> Option<usize> {
    match self.child[self.shape.cell_index(node, cell)] {
      0 => None,
      v => Some(v as usize),
    }
  }

  /// Attach a fresh all-zero node below `cell` of `node` and return its index.
  ///
  /// Returns the existing child when the cell is already split.
  pub fn split_cell(&mut self, node: usize, cell: [usize; 3]) -> FieldResult<usize> {
    if node >= self.shape.nodes || cell.iter().any(|&c| c >= self.shape.grid) {
      return Err(FieldError::InvalidParameter {
        name: "cell",
        reason: "node or cell index out of range",
      });
    }
    if let Some(existing) = self.child_node(node, cell) {
      return Ok(existing);
    }
    if self.shape.nodes >= i32::MAX as usize {
      return Err(FieldError::InvalidParameter {
        name: "nodes",
        reason: "arena exceeds i32 child pointer range",
      });
    }

    let new_node = self.shape.nodes;
    self.shape.nodes += 1;
    self.data.resize(self.shape.data_len(), T::zero());
    self.child.resize(self.shape.cell_count(), 0);

    let index = self.shape.cell_index(node, cell);
    self.child[index] = new_node as i32;
    Ok(new_node)
  }

  /// Check pointer range, the single-parent invariant and reachability.
  ///
  /// With node 0 unreachable as a child (pointer 0 means "leaf") and every
  /// other node referenced at most once, any descent from the root visits
  /// distinct nodes, so traversal always terminates. Every non-root node must
  /// also hang below the root; detached nodes, including detached cycles,
  /// are rejected.
  pub fn validate(&self) -> FieldResult<()> {
    let mut referenced = vec![false; self.shape.nodes];
    for (index, &pointer) in self.child.iter().enumerate() {
      if pointer == 0 {
        continue;
      }
      let (node, cell) = self.shape.cell_coord(index);
      if pointer < 0 || pointer as usize >= self.shape.nodes {
        return Err(FieldError::CorruptTree {
          node,
          cell,
          pointer: pointer as i64,
          nodes: self.shape.nodes,
        });
      }
      let target = pointer as usize;
      if referenced[target] {
        return Err(FieldError::MultipleParents { node: target });
      }
      referenced[target] = true;
    }

    let cells = self.shape.cells_per_node();
    let mut reached = vec![false; self.shape.nodes];
    reached[0] = true;
    let mut stack = vec![0usize];
    while let Some(node) = stack.pop() {
      for &pointer in &self.child[node * cells..(node + 1) * cells] {
        let target = pointer as usize;
        if pointer != 0 && !reached[target] {
          reached[target] = true;
          stack.push(target);
        }
      }
    }
    match reached.iter().position(|&r| !r) {
      Some(node) => Err(FieldError::Unreachable { node }),
      None => Ok(()),
    }
  }

  /// Maximum number of levels any descent from the root can visit.
  pub fn depth(&self) -> FieldResult<usize> {
    self.validate()?;
    let mut deepest = 0;
    let mut stack = vec![(0usize, 1usize)];
    while let Some((node, depth)) = stack.pop() {
      deepest = deepest.max(depth);
      let start = node * self.shape.cells_per_node();
      for &pointer in &self.child[start..start + self.shape.cells_per_node()] {
        if pointer != 0 {
          stack.push((pointer as usize, depth + 1));
        }
      }
    }
    Ok(deepest)
  }

  /// Borrow as a read view.
  pub fn view(&self) -> TreeView<'_, T> {
    TreeView::new_unchecked(self.structure(), &self.data)
  }

  /// Borrow the child structure.
  pub fn structure(&self) -> TreeStructure<'_> {
    TreeStructure::new_unchecked(self.shape, &self.child, self.blend)
  }

  /// Borrow the structure and the mutable data array at once (for assign).
  pub fn split_mut(&mut self) -> (TreeStructure<'_>, &mut [T]) {
    let structure = TreeStructure::new_unchecked(self.shape, &self.child, self.blend);
    (structure, &mut self.data)
  }
}

#[cfg(test)]
#[path = "arena_test.rs"]
mod arena_test;
