//! voxel_field - Sparse hierarchical volumetric field on an N³ octree
//!
//! A tree of `N×N×N` branch nodes stored as two flat arrays (per-cell data
//! and child pointers). Every cell carries `K` data channels; the field at a
//! point blends trilinear interpolants along the root-to-leaf path.
//!
//! # Kernels
//!
//! - **Vertical query** ([`query_vertical`]): field values at a point batch
//! - **Query backward** ([`query_vertical_backward`]): gradient w.r.t. data
//! - **Assign** ([`assign_vertical`]): add values back along the same stencils
//! - **Volume render** ([`volume_render`], [`volume_render_backward`]):
//!   differentiable emission-absorption ray marching with empty-space
//!   skipping and a pluggable [`ColorBasis`]
//!
//! Every kernel is generic over `f32` / `f64` ([`Real`]) and parallel across
//! its batch with rayon. Scatter kernels accumulate through atomic cells.
//!
//! # Example
//!
//! ```ignore
//! use voxel_field::{query_vertical, Transform, Tree};
//!
//! let mut tree = Tree::<f32>::new(2, 4)?;
//! let child = tree.split_cell(0, [1, 1, 1])?;
//! tree.cell_data_mut(child, [0, 0, 0]).copy_from_slice(&[5.0, 1.0, 0.5, 0.2]);
//!
//! let values = query_vertical(&tree.view(), &Transform::identity(), &[[0.6, 0.6, 0.6]])?;
//! ```

pub mod assign;
pub mod backward;
pub mod basis;
pub mod camera;
pub mod error;
pub mod interp;
pub mod metrics;
pub mod query;
pub mod real;
pub mod render;
pub mod scatter;
pub mod transform;
pub mod tree;

#[cfg(test)]
pub mod test_utils;

pub use assign::assign_vertical;
pub use backward::query_vertical_backward;
pub use basis::{ColorBasis, Identity, SphericalHarmonics};
pub use camera::{CameraRays, PinholeCamera};
pub use error::{FieldError, FieldResult};
pub use interp::BlendMode;
pub use query::query_vertical;
pub use real::Real;
pub use render::{
  volume_render, volume_render_backward, volume_render_with_stats, RayBatch, RenderOptions,
  RenderStats,
};
pub use scatter::ScatterBuffer;
pub use transform::Transform;
pub use tree::{Path, Tree, TreeShape, TreeStructure, TreeView};
