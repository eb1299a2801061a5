//! Vertical query: evaluate the field at a batch of points.
//!
//! One rayon task per point. Each task transforms its point into tree space,
//! descends to the leaf cell and sums the blended trilinear values of every
//! visited level (see [`crate::interp`] for the blend law). Points outside
//! the unit cube evaluate to the zero vector.

use rayon::prelude::*;

use crate::error::FieldResult;
use crate::interp::for_each_contribution;
use crate::real::Real;
use crate::transform::Transform;
use crate::tree::{Path, TreeView};

/// Evaluate the field at world-space `points`.
///
/// Returns `points.len() * K` values, row-major, in input order.
#[cfg_attr(
  feature = "tracing",
  tracing::instrument(skip_all, name = "field::query_vertical", fields(points = points.len()))
)]
pub fn query_vertical<T: Real>(
  tree: &TreeView<'_, T>,
  transform: &Transform<T>,
  points: &[[T; 3]],
) -> FieldResult<Vec<T>> {
  let channels = tree.shape().channels;
  let mut out = vec![T::zero(); points.len() * channels];

  out
    .par_chunks_mut(channels)
    .zip(points.par_iter())
    .try_for_each(|(dst, &p)| evaluate(tree, transform.apply_point(p), dst).map(|_| ()))?;

  Ok(out)
}

/// Evaluate one tree-space point into `out` (K channels).
///
/// Returns the traversal path so callers (the renderer) can reuse it, or
/// `None` when the point is out of domain and `out` was zeroed.
#[inline]
pub fn evaluate<T: Real>(
  tree: &TreeView<'_, T>,
  p: [T; 3],
  out: &mut [T],
) -> FieldResult<Option<Path<T>>> {
  out.fill(T::zero());
  let Some(path) = tree.structure().traverse(p)? else {
    return Ok(None);
  };
  accumulate_path(tree, &path, out);
  Ok(Some(path))
}

/// Add the blended contribution of every level on `path` into `out`.
#[inline]
pub fn accumulate_path<T: Real>(tree: &TreeView<'_, T>, path: &Path<T>, out: &mut [T]) {
  let structure = tree.structure();
  for_each_contribution(path, structure.shape().grid, structure.blend(), |node, cell, weight| {
    let src = tree.cell_data(node, cell);
    for (dst, &v) in out.iter_mut().zip(src) {
      *dst += weight * v;
    }
  });
}

#[cfg(test)]
#[path = "query_test.rs"]
mod query_test;
