//! Test utilities shared by the kernel tests.
//!
//! Provides small deterministic trees and point sets so every kernel can be
//! checked against the others (query vs. backward, assign vs. query).

use crate::interp::BlendMode;
use crate::tree::Tree;

// =============================================================================
// Deterministic fixtures
// =============================================================================

/// Deterministic pseudo-random value in `[-0.5, 0.5)` for index `i`.
pub fn pattern(i: usize) -> f64 {
  let x = (i as f64 * 0.618_033_988_749_894_9 + 0.137).fract();
  x - 0.5
}

/// `count` in-domain points spread over the unit cube (additive recurrence).
pub fn sample_points(count: usize) -> Vec<[f64; 3]> {
  const A: [f64; 3] = [0.819_172_513_396_164_4, 0.671_043_606_703_789_2, 0.549_700_477_901_970_4];
  (0..count)
    .map(|i| {
      let t = i as f64 + 1.0;
      [
        (0.5 + A[0] * t).fract(),
        (0.5 + A[1] * t).fract(),
        (0.5 + A[2] * t).fract(),
      ]
    })
    .collect()
}

/// Three-level tree (grid 2) with every data value set from [`pattern`].
///
/// ```text
/// node 0 (root)
///   cell (1,1,1) -> node 1
///     cell (0,0,0) -> node 2
///   cell (0,1,0) -> node 3
/// ```
pub fn patterned_tree(channels: usize, blend: BlendMode) -> Tree<f64> {
  let mut tree = empty_tree(channels, blend);
  for (i, v) in tree.data_mut().iter_mut().enumerate() {
    *v = pattern(i);
  }
  tree
}

/// Same structure as [`patterned_tree`] with all-zero data.
pub fn empty_tree(channels: usize, blend: BlendMode) -> Tree<f64> {
  let mut tree = Tree::new(2, channels).unwrap().with_blend(blend);
  let a = tree.split_cell(0, [1, 1, 1]).unwrap();
  tree.split_cell(a, [0, 0, 0]).unwrap();
  tree.split_cell(0, [0, 1, 0]).unwrap();
  tree
}

pub fn assert_close(actual: &[f64], expected: &[f64], tol: f64) {
  assert_eq!(actual.len(), expected.len(), "length mismatch");
  for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
    assert!(
      (a - e).abs() <= tol * (1.0 + e.abs()),
      "index {}: got {}, expected {}",
      i,
      a,
      e
    );
  }
}
