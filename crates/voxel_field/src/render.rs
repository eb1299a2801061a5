//! Differentiable volume renderer.
//!
//! One rayon task per ray. Each ray is mapped into tree space, clipped to the
//! unit cube and marched front to back with a fixed step:
//!
//! ```text
//! t_i   = t_entry + i * step          while t_i < t_exit
//! σ     = max(field(p(t_i))[0], 0)
//! α     = 1 - exp(-σ * step)
//! out  += T * α * basis(view_dir, field[1..])
//! T    *= 1 - α                        stop once T < stop_thresh
//! out  += background * T               unless stopped
//! ```
//!
//! # Empty-space skipping
//!
//! Every point inside a leaf cell shares the same `(node, cell)` sequence and
//! its stencil corners stay within the 3×3×3 neighbourhood of each level's
//! cell. When all contributing neighbourhoods hold non-positive density, the
//! whole leaf cell has `α = 0` and the march jumps to the first sample index
//! past the cell. The result is identical to the plain fixed-step march.
//!
//! # Backward
//!
//! With `R_i` the composite of everything behind sample `i` starting from full
//! transmittance (`R_last` = background, or 0 if the ray stopped early):
//!
//! ```text
//! dC/dα_i     = T_i * (c_i - R_i)
//! dC/dc_i     = T_i * α_i
//! dα_i/dσ_i   = step * (1 - α_i)           (σ_raw > 0)
//! R_{i-1}     = c_i * α_i + (1 - α_i) * R_i
//! ```
//!
//! The per-sample K-channel gradient is scattered through the same machinery
//! as the vertical query backward.

use rayon::prelude::*;
use smallvec::SmallVec;
use web_time::Instant;

use crate::basis::ColorBasis;
use crate::error::{FieldError, FieldResult};
use crate::interp::BlendMode;
use crate::query::evaluate;
use crate::real::Real;
use crate::scatter::ScatterBuffer;
use crate::transform::Transform;
use crate::tree::{Path, TreeView};

/// Density plus three color channels.
pub const MIN_RENDER_CHANNELS: usize = 4;

/// Inline capacity for per-sample channel vectors. Degree-3 SH RGB plus
/// density needs 49.
type Channels<T> = SmallVec<[T; 64]>;

// =============================================================================
// Configuration
// =============================================================================

/// Ray marching parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderOptions<T: Real> {
  /// Distance between samples, in tree-space units.
  pub step_size: T,
  /// Stop marching once transmittance falls below this.
  pub stop_thresh: T,
  /// Color added (times remaining transmittance) when a ray leaves the cube.
  pub background_brightness: T,
  /// Jump over leaf cells with provably zero density.
  pub skip_empty: bool,
}

impl<T: Real> Default for RenderOptions<T> {
  fn default() -> Self {
    Self {
      step_size: T::cast(1e-3),
      stop_thresh: T::cast(1e-2),
      background_brightness: T::one(),
      skip_empty: true,
    }
  }
}

impl<T: Real> RenderOptions<T> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_step_size(mut self, step_size: T) -> Self {
    self.step_size = step_size;
    self
  }

  pub fn with_stop_thresh(mut self, stop_thresh: T) -> Self {
    self.stop_thresh = stop_thresh;
    self
  }

  pub fn with_background_brightness(mut self, background_brightness: T) -> Self {
    self.background_brightness = background_brightness;
    self
  }

  pub fn with_skip_empty(mut self, skip_empty: bool) -> Self {
    self.skip_empty = skip_empty;
    self
  }

  pub fn validate(&self) -> FieldResult<()> {
    if !(self.step_size.is_finite() && self.step_size > T::zero()) {
      return Err(FieldError::InvalidParameter {
        name: "step_size",
        reason: "must be finite and positive",
      });
    }
    if !(self.stop_thresh >= T::zero() && self.stop_thresh < T::one()) {
      return Err(FieldError::InvalidParameter {
        name: "stop_thresh",
        reason: "must lie in [0, 1)",
      });
    }
    if !self.background_brightness.is_finite() {
      return Err(FieldError::InvalidParameter {
        name: "background_brightness",
        reason: "must be finite",
      });
    }
    Ok(())
  }
}

// =============================================================================
// Ray batches
// =============================================================================

/// Borrowed ray arrays: origins and directions in world space, plus optional
/// view directions used only for color evaluation.
#[derive(Clone, Copy, Debug)]
pub struct RayBatch<'a, T: Real> {
  origins: &'a [[T; 3]],
  dirs: &'a [[T; 3]],
  view_dirs: Option<&'a [[T; 3]]>,
}

impl<'a, T: Real> RayBatch<'a, T> {
  pub fn new(origins: &'a [[T; 3]], dirs: &'a [[T; 3]]) -> FieldResult<Self> {
    if origins.len() != dirs.len() {
      return Err(FieldError::ShapeMismatch {
        what: "dirs",
        expected: origins.len(),
        actual: dirs.len(),
      });
    }
    Ok(Self {
      origins,
      dirs,
      view_dirs: None,
    })
  }

  /// View directions differing from the traversal direction (reflection,
  /// refraction).
  pub fn with_view_dirs(mut self, view_dirs: &'a [[T; 3]]) -> FieldResult<Self> {
    if view_dirs.len() != self.origins.len() {
      return Err(FieldError::ShapeMismatch {
        what: "view_dirs",
        expected: self.origins.len(),
        actual: view_dirs.len(),
      });
    }
    self.view_dirs = Some(view_dirs);
    Ok(self)
  }

  /// Arrays produced together with equal lengths.
  pub(crate) fn new_unchecked(origins: &'a [[T; 3]], dirs: &'a [[T; 3]]) -> Self {
    Self {
      origins,
      dirs,
      view_dirs: None,
    }
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.origins.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.origins.is_empty()
  }

  #[inline]
  fn view_dir(&self, index: usize) -> [T; 3] {
    match self.view_dirs {
      Some(v) => v[index],
      None => self.dirs[index],
    }
  }
}

// =============================================================================
// Statistics
// =============================================================================

/// Per-call renderer counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
  /// Rays in the batch.
  pub rays: usize,
  /// Rays intersecting the unit cube.
  pub hits: usize,
  /// Samples evaluated.
  pub samples: usize,
  /// Leaf cells jumped over by empty-space skipping.
  pub skipped_cells: usize,
  /// Rays stopped by the transmittance threshold.
  pub early_terminations: usize,
  /// Wall time of the call in microseconds.
  pub elapsed_us: u64,
}

impl RenderStats {
  fn merge(self, other: Self) -> Self {
    Self {
      rays: self.rays + other.rays,
      hits: self.hits + other.hits,
      samples: self.samples + other.samples,
      skipped_cells: self.skipped_cells + other.skipped_cells,
      early_terminations: self.early_terminations + other.early_terminations,
      elapsed_us: self.elapsed_us.max(other.elapsed_us),
    }
  }
}

// =============================================================================
// Forward
// =============================================================================

/// Render a batch of rays. Returns `rays.len() * C` values where `C` is the
/// basis output channel count for `K - 1` coefficients.
pub fn volume_render<T: Real, B: ColorBasis<T>>(
  tree: &TreeView<'_, T>,
  transform: &Transform<T>,
  rays: &RayBatch<'_, T>,
  options: &RenderOptions<T>,
  basis: &B,
) -> FieldResult<Vec<T>> {
  volume_render_with_stats(tree, transform, rays, options, basis).map(|(out, _)| out)
}

/// [`volume_render`] plus per-call statistics.
#[cfg_attr(
  feature = "tracing",
  tracing::instrument(skip_all, name = "field::volume_render", fields(rays = rays.len()))
)]
pub fn volume_render_with_stats<T: Real, B: ColorBasis<T>>(
  tree: &TreeView<'_, T>,
  transform: &Transform<T>,
  rays: &RayBatch<'_, T>,
  options: &RenderOptions<T>,
  basis: &B,
) -> FieldResult<(Vec<T>, RenderStats)> {
  let start = Instant::now();
  let color_channels = check_render_inputs(tree, options, basis)?;
  let mut out = vec![T::zero(); rays.len() * color_channels];

  let mut stats = out
    .par_chunks_mut(color_channels)
    .enumerate()
    .map(|(index, dst)| -> FieldResult<RenderStats> {
      let mut ray_stats = RenderStats {
        rays: 1,
        ..RenderStats::default()
      };
      let Some(ray) = TreeRay::new(transform, rays, index) else {
        dst.fill(options.background_brightness);
        return Ok(ray_stats);
      };
      ray_stats.hits = 1;

      let outcome = march(tree, basis, &ray, options, dst, |_, _, _, _| {})?;
      if !outcome.terminated {
        for c in dst.iter_mut() {
          *c += options.background_brightness * outcome.transmittance;
        }
      }
      ray_stats.samples = outcome.samples;
      ray_stats.skipped_cells = outcome.skipped;
      ray_stats.early_terminations = outcome.terminated as usize;
      Ok(ray_stats)
    })
    .try_reduce(RenderStats::default, |a, b| Ok(a.merge(b)))?;

  stats.elapsed_us = start.elapsed().as_micros() as u64;

  #[cfg(feature = "tracing")]
  tracing::debug!(
    hits = stats.hits,
    samples = stats.samples,
    skipped = stats.skipped_cells,
    terminated = stats.early_terminations,
    "volume render finished"
  );

  Ok((out, stats))
}

// =============================================================================
// Backward
// =============================================================================

/// Gradient of [`volume_render`] w.r.t. the data array.
///
/// `grad_output` holds `rays.len() * C` values. The result is shaped like the
/// data array. Each ray is re-marched, so no forward state is kept between
/// calls.
#[cfg_attr(
  feature = "tracing",
  tracing::instrument(skip_all, name = "field::volume_render_backward", fields(rays = rays.len()))
)]
pub fn volume_render_backward<T: Real, B: ColorBasis<T>>(
  tree: &TreeView<'_, T>,
  transform: &Transform<T>,
  rays: &RayBatch<'_, T>,
  options: &RenderOptions<T>,
  basis: &B,
  grad_output: &[T],
) -> FieldResult<Vec<T>> {
  let color_channels = check_render_inputs(tree, options, basis)?;
  let shape = tree.shape();
  shape.check_len("grad_output", rays.len() * color_channels, grad_output.len())?;

  let buffer = ScatterBuffer::zeros(shape);
  let blend = tree.structure().blend();

  grad_output
    .par_chunks(color_channels)
    .enumerate()
    .try_for_each(|(index, grad)| -> FieldResult<()> {
      if grad.iter().all(|&g| g == T::zero()) {
        return Ok(());
      }
      let Some(ray) = TreeRay::new(transform, rays, index) else {
        return Ok(());
      };

      let mut samples: Vec<SampleRecord<T>> = Vec::new();
      let mut color_out: Channels<T> = SmallVec::from_elem(T::zero(), color_channels);
      let outcome = march(
        tree,
        basis,
        &ray,
        options,
        &mut color_out,
        |path, alpha, transmittance, color| {
          samples.push(SampleRecord {
            path: path.clone(),
            alpha,
            transmittance,
            color: SmallVec::from_slice(color),
          });
        },
      )?;

      // Composite behind the current sample, starting at full transmittance.
      let mut behind: Channels<T> = if outcome.terminated {
        SmallVec::from_elem(T::zero(), color_channels)
      } else {
        SmallVec::from_elem(options.background_brightness, color_channels)
      };
      let mut grad_k: Channels<T> = SmallVec::from_elem(T::zero(), shape.channels);
      let mut grad_color: Channels<T> = SmallVec::from_elem(T::zero(), color_channels);

      for sample in samples.iter().rev() {
        let weight = sample.transmittance * sample.alpha;

        let mut grad_alpha = T::zero();
        for c in 0..color_channels {
          grad_alpha += grad[c] * sample.transmittance * (sample.color[c] - behind[c]);
          grad_color[c] = grad[c] * weight;
        }

        grad_k.fill(T::zero());
        grad_k[0] = grad_alpha * options.step_size * (T::one() - sample.alpha);
        basis.backward(ray.view_dir, &grad_color, &mut grad_k[1..]);
        buffer.scatter_path(&sample.path, blend, &grad_k);

        for c in 0..color_channels {
          behind[c] = sample.color[c] * sample.alpha + (T::one() - sample.alpha) * behind[c];
        }
      }
      Ok(())
    })?;

  Ok(buffer.into_vec())
}

// =============================================================================
// Shared march
// =============================================================================

fn check_render_inputs<T: Real, B: ColorBasis<T>>(
  tree: &TreeView<'_, T>,
  options: &RenderOptions<T>,
  basis: &B,
) -> FieldResult<usize> {
  options.validate()?;
  let channels = tree.shape().channels;
  if channels < MIN_RENDER_CHANNELS {
    return Err(FieldError::TooFewChannels {
      required: MIN_RENDER_CHANNELS,
      actual: channels,
    });
  }
  basis.output_channels(channels - 1)
}

/// A ray clipped to the unit cube, in tree space.
#[derive(Clone, Copy, Debug)]
struct TreeRay<T: Real> {
  origin: [T; 3],
  dir: [T; 3],
  view_dir: [T; 3],
  t_entry: T,
  t_exit: T,
}

impl<T: Real> TreeRay<T> {
  /// `None` when the ray misses the cube or has zero direction.
  fn new(transform: &Transform<T>, rays: &RayBatch<'_, T>, index: usize) -> Option<Self> {
    let origin = transform.apply_point(rays.origins[index]);
    let dir = normalize(transform.apply_direction(rays.dirs[index]))?;
    let view_dir = normalize(rays.view_dir(index)).unwrap_or(dir);

    let mut t_min = T::neg_infinity();
    let mut t_max = T::infinity();
    for axis in 0..3 {
      if dir[axis] == T::zero() {
        if origin[axis] < T::zero() || origin[axis] > T::one() {
          return None;
        }
        continue;
      }
      let inv = T::one() / dir[axis];
      let t0 = (T::zero() - origin[axis]) * inv;
      let t1 = (T::one() - origin[axis]) * inv;
      t_min = t_min.max(t0.min(t1));
      t_max = t_max.min(t0.max(t1));
    }

    let t_entry = t_min.max(T::zero());
    if !(t_entry < t_max) {
      return None;
    }
    Some(Self {
      origin,
      dir,
      view_dir,
      t_entry,
      t_exit: t_max,
    })
  }

  #[inline]
  fn at(&self, t: T) -> [T; 3] {
    [
      self.origin[0] + t * self.dir[0],
      self.origin[1] + t * self.dir[1],
      self.origin[2] + t * self.dir[2],
    ]
  }

  /// Parameter where the ray leaves an axis-aligned cell.
  fn exit_of(&self, min: [T; 3], max: [T; 3]) -> T {
    let mut t_exit = T::infinity();
    for axis in 0..3 {
      let d = self.dir[axis];
      if d > T::zero() {
        t_exit = t_exit.min((max[axis] - self.origin[axis]) / d);
      } else if d < T::zero() {
        t_exit = t_exit.min((min[axis] - self.origin[axis]) / d);
      }
    }
    t_exit
  }
}

#[inline]
fn normalize<T: Real>(v: [T; 3]) -> Option<[T; 3]> {
  let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
  if !(len > T::zero()) || !len.is_finite() {
    return None;
  }
  Some([v[0] / len, v[1] / len, v[2] / len])
}

/// One compositing step that contributed (σ > 0), as replayed by backward.
#[derive(Clone, Debug)]
struct SampleRecord<T: Real> {
  path: Path<T>,
  alpha: T,
  /// Transmittance before this sample.
  transmittance: T,
  color: Channels<T>,
}

#[derive(Clone, Copy, Debug)]
struct MarchOutcome<T: Real> {
  transmittance: T,
  terminated: bool,
  samples: usize,
  skipped: usize,
}

/// March one ray, compositing into `out` (C channels, background excluded).
///
/// `on_sample(path, alpha, transmittance_before, color)` sees every sample
/// with positive density.
fn march<T: Real, B: ColorBasis<T>>(
  tree: &TreeView<'_, T>,
  basis: &B,
  ray: &TreeRay<T>,
  options: &RenderOptions<T>,
  out: &mut [T],
  mut on_sample: impl FnMut(&Path<T>, T, T, &[T]),
) -> FieldResult<MarchOutcome<T>> {
  let channels = tree.shape().channels;
  let step = options.step_size;
  let mut value: Channels<T> = SmallVec::from_elem(T::zero(), channels);
  let mut color: Channels<T> = SmallVec::from_elem(T::zero(), out.len());

  let mut transmittance = T::one();
  let mut outcome = MarchOutcome {
    transmittance,
    terminated: false,
    samples: 0,
    skipped: 0,
  };

  let mut i = 0usize;
  loop {
    let t = ray.t_entry + T::cast(i as f64) * step;
    if !(t < ray.t_exit) {
      break;
    }
    outcome.samples += 1;

    let Some(path) = evaluate(tree, ray.at(t), &mut value)? else {
      i += 1;
      continue;
    };

    let sigma = value[0];
    if sigma <= T::zero() {
      i = if options.skip_empty && region_is_empty(tree, &path) {
        outcome.skipped += 1;
        next_sample_after_cell(ray, &path, step, i)
      } else {
        i + 1
      };
      continue;
    }

    let alpha = T::one() - (-(sigma * step)).exp();
    basis.eval(ray.view_dir, &value[1..], &mut color);
    let weight = transmittance * alpha;
    for (dst, &c) in out.iter_mut().zip(color.iter()) {
      *dst += weight * c;
    }
    on_sample(&path, alpha, transmittance, &color);

    transmittance *= T::one() - alpha;
    if transmittance < options.stop_thresh {
      outcome.terminated = true;
      break;
    }
    i += 1;
  }

  outcome.transmittance = transmittance;
  Ok(outcome)
}

/// Whether density is non-positive everywhere inside the path's leaf cell.
///
/// Checks the 3×3×3 neighbourhood of each contributing level's cell; every
/// stencil of a point inside the leaf cell reads only those cells.
fn region_is_empty<T: Real>(tree: &TreeView<'_, T>, path: &Path<T>) -> bool {
  let structure = tree.structure();
  let grid = structure.shape().grid;
  let blend: BlendMode = structure.blend();
  let depth = path.depth();

  path.levels().iter().enumerate().all(|(level_idx, level)| {
    if !blend.contributes(level_idx, depth) {
      return true;
    }
    let lo = level.cell.map(|c| c.saturating_sub(1));
    let hi = level.cell.map(|c| (c + 1).min(grid - 1));
    for x in lo[0]..=hi[0] {
      for y in lo[1]..=hi[1] {
        for z in lo[2]..=hi[2] {
          if tree.cell_data(level.node, [x, y, z])[0] > T::zero() {
            return false;
          }
        }
      }
    }
    true
  })
}

/// First sample index strictly past the leaf cell, never going backwards.
fn next_sample_after_cell<T: Real>(ray: &TreeRay<T>, path: &Path<T>, step: T, i: usize) -> usize {
  let bounds = path.leaf_bounds();
  let t_cell_exit = ray.exit_of(bounds.min, bounds.max());
  // Rounding slack: landing one sample early only costs an evaluation.
  let steps = ((t_cell_exit - ray.t_entry) / step).to_f64().unwrap_or(f64::NAN) - 1e-4;
  if !steps.is_finite() || steps <= (i + 1) as f64 {
    return i + 1;
  }
  steps.ceil() as usize
}

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;
