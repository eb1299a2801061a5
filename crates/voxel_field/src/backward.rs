//! Vertical query backward: scatter upstream gradients onto the data array.
//!
//! The adjoint of [`crate::query`]: every point's K-channel gradient is
//! distributed to each `(level, corner)` it read, weighted by the same
//! `β_l · w_{l,c}` coefficient, and summed across points with atomic adds.

use rayon::prelude::*;

use crate::error::FieldResult;
use crate::real::Real;
use crate::scatter::ScatterBuffer;
use crate::transform::Transform;
use crate::tree::{Path, TreeStructure};

/// Gradient of `query_vertical` w.r.t. the data array.
///
/// `grad_output` holds `points.len() * K` values. The result is shaped like
/// the data array (`M·N³·K`). Only the child structure is needed.
#[cfg_attr(
  feature = "tracing",
  tracing::instrument(skip_all, name = "field::query_vertical_backward", fields(points = points.len()))
)]
pub fn query_vertical_backward<T: Real>(
  structure: &TreeStructure<'_>,
  transform: &Transform<T>,
  points: &[[T; 3]],
  grad_output: &[T],
) -> FieldResult<Vec<T>> {
  let shape = structure.shape();
  shape.check_len("grad_output", points.len() * shape.channels, grad_output.len())?;

  let paths = trace_points(structure, transform, points)?;
  let buffer = ScatterBuffer::zeros(shape);
  scatter_paths(&buffer, structure, &paths, grad_output);
  Ok(buffer.into_vec())
}

/// Traverse every point up front so structural faults surface before any
/// accumulation is published.
pub(crate) fn trace_points<T: Real>(
  structure: &TreeStructure<'_>,
  transform: &Transform<T>,
  points: &[[T; 3]],
) -> FieldResult<Vec<Option<Path<T>>>> {
  #[cfg(feature = "tracing")]
  let _span = tracing::info_span!("trace_points").entered();

  points
    .par_iter()
    .map(|&p| structure.traverse(transform.apply_point(p)))
    .collect()
}

pub(crate) fn scatter_paths<T: Real>(
  buffer: &ScatterBuffer<T>,
  structure: &TreeStructure<'_>,
  paths: &[Option<Path<T>>],
  values: &[T],
) {
  #[cfg(feature = "tracing")]
  let _span = tracing::info_span!("scatter_paths").entered();

  let channels = structure.shape().channels;
  let blend = structure.blend();
  paths
    .par_iter()
    .zip(values.par_chunks(channels))
    .for_each(|(path, v)| {
      if let Some(path) = path {
        buffer.scatter_path(path, blend, v);
      }
    });
}

#[cfg(test)]
#[path = "backward_test.rs"]
mod backward_test;
