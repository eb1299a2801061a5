//! Renderer metrics: rolling timings and ray counters.
//!
//! Feature-gated and runtime-toggled so recording costs nothing when disabled.
//!
//! # Usage
//!
//! ```ignore
//! use voxel_field::metrics::{FieldMetrics, COLLECT_METRICS};
//!
//! // Compile with --features metrics
//! // Runtime toggle:
//! COLLECT_METRICS.store(false, Ordering::Relaxed);
//!
//! let mut metrics = FieldMetrics::new();
//! let (image, stats) = volume_render_with_stats(&view, &transform, &rays, &options, &basis)?;
//! metrics.record_render(&stats);
//! ```

use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
#[cfg(feature = "metrics")]
use std::sync::atomic::Ordering;

use crate::render::RenderStats;

/// Runtime toggle for metrics collection.
pub static COLLECT_METRICS: AtomicBool = AtomicBool::new(true);

/// Compile-time feature and runtime toggle both enabled.
#[inline]
pub fn is_enabled() -> bool {
  #[cfg(feature = "metrics")]
  {
    COLLECT_METRICS.load(Ordering::Relaxed)
  }
  #[cfg(not(feature = "metrics"))]
  {
    false
  }
}

/// Fixed-capacity window of recent values.
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
  buffer: VecDeque<T>,
  capacity: usize,
}

impl<T> RollingWindow<T> {
  pub fn new(capacity: usize) -> Self {
    Self {
      buffer: VecDeque::with_capacity(capacity),
      capacity,
    }
  }

  /// Push a value, evicting the oldest at capacity.
  pub fn push(&mut self, value: T) {
    if self.capacity == 0 {
      return;
    }
    if self.buffer.len() >= self.capacity {
      self.buffer.pop_front();
    }
    self.buffer.push_back(value);
  }

  pub fn len(&self) -> usize {
    self.buffer.len()
  }

  pub fn is_empty(&self) -> bool {
    self.buffer.is_empty()
  }

  pub fn clear(&mut self) {
    self.buffer.clear();
  }

}

impl RollingWindow<u64> {
  pub fn sum(&self) -> u64 {
    self.buffer.iter().sum()
  }

  pub fn average(&self) -> f64 {
    if self.buffer.is_empty() {
      0.0
    } else {
      self.sum() as f64 / self.buffer.len() as f64
    }
  }
}

impl Default for RollingWindow<u64> {
  fn default() -> Self {
    Self::new(128)
  }
}

/// Accumulated renderer statistics across calls.
#[derive(Debug, Clone, Default)]
pub struct FieldMetrics {
  // Renderer totals
  pub rays: u64,
  pub hits: u64,
  pub samples: u64,
  pub skipped_cells: u64,
  pub early_terminations: u64,

  // Timing (microseconds)
  pub render_timings: RollingWindow<u64>,
  pub last_render_us: u64,

  /// Renderer calls recorded this session.
  pub total_renders: u64,
}

impl FieldMetrics {
  pub fn new() -> Self {
    Self::default()
  }

  /// Reset everything except `total_renders`, which is cumulative.
  pub fn reset(&mut self) {
    self.rays = 0;
    self.hits = 0;
    self.samples = 0;
    self.skipped_cells = 0;
    self.early_terminations = 0;
    self.render_timings.clear();
    self.last_render_us = 0;
  }

  pub fn record_render(&mut self, stats: &RenderStats) {
    if !is_enabled() {
      return;
    }
    self.rays += stats.rays as u64;
    self.hits += stats.hits as u64;
    self.samples += stats.samples as u64;
    self.skipped_cells += stats.skipped_cells as u64;
    self.early_terminations += stats.early_terminations as u64;
    self.render_timings.push(stats.elapsed_us);
    self.last_render_us = stats.elapsed_us;
    self.total_renders += 1;
  }

  /// Fraction of rays that hit the unit cube.
  pub fn hit_ratio(&self) -> f64 {
    if self.rays == 0 {
      0.0
    } else {
      self.hits as f64 / self.rays as f64
    }
  }

  pub fn samples_per_hit(&self) -> f64 {
    if self.hits == 0 {
      0.0
    } else {
      self.samples as f64 / self.hits as f64
    }
  }

  pub fn avg_render_timing_us(&self) -> f64 {
    self.render_timings.average()
  }
}
