//! Vertical assign: scatter caller-supplied values into the tree in place.
//!
//! Structurally the backward kernel with the upstream gradient replaced by
//! `values`: contributions follow the query's interpolation/blend
//! coefficients and overlapping points sum rather than overwrite.

use crate::backward::{scatter_paths, trace_points};
use crate::error::FieldResult;
use crate::real::Real;
use crate::scatter::ScatterBuffer;
use crate::transform::Transform;
use crate::tree::TreeStructure;

/// Accumulate `values` (`points.len() * K`) into `data` at world-space `points`.
///
/// All points are traversed before `data` is touched: on error `data` is
/// left unchanged. Out-of-domain points are skipped.
#[cfg_attr(
  feature = "tracing",
  tracing::instrument(skip_all, name = "field::assign_vertical", fields(points = points.len()))
)]
pub fn assign_vertical<T: Real>(
  data: &mut [T],
  structure: &TreeStructure<'_>,
  transform: &Transform<T>,
  points: &[[T; 3]],
  values: &[T],
) -> FieldResult<()> {
  let shape = structure.shape();
  shape.check_len("data", shape.data_len(), data.len())?;
  shape.check_len("values", points.len() * shape.channels, values.len())?;

  let paths = trace_points(structure, transform, points)?;
  let buffer = ScatterBuffer::zeros(shape);
  scatter_paths(&buffer, structure, &paths, values);
  buffer.add_into(data);
  Ok(())
}

#[cfg(test)]
#[path = "assign_test.rs"]
mod assign_test;
