//! Error type shared by all kernels.

use thiserror::Error;

/// Failures reported by the field kernels.
///
/// Precondition violations are detected before any worker runs. Structural
/// faults (`CorruptTree`, `DepthExceeded`) are detected during traversal and
/// abort the whole batch; kernels that write never publish partial results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
  /// An input array has the wrong number of elements.
  #[error("{what}: expected {expected} elements, got {actual}")]
  ShapeMismatch {
    what: &'static str,
    expected: usize,
    actual: usize,
  },

  /// Tree shape has a zero dimension.
  #[error("tree shape must be non-empty (nodes={nodes}, grid={grid}, channels={channels})")]
  EmptyShape {
    nodes: usize,
    grid: usize,
    channels: usize,
  },

  /// Renderer needs density plus at least three color channels.
  #[error("volume rendering needs at least {required} data channels, tree has {actual}")]
  TooFewChannels { required: usize, actual: usize },

  /// Color basis cannot consume the available coefficient count.
  #[error("color basis expects {expected} coefficients, tree provides {actual}")]
  BasisMismatch { expected: usize, actual: usize },

  /// Scalar parameter out of range.
  #[error("invalid parameter `{name}`: {reason}")]
  InvalidParameter {
    name: &'static str,
    reason: &'static str,
  },

  /// Child pointer outside `[0, nodes)`.
  #[error("corrupt tree: node {node} cell {cell:?} points to {pointer} (nodes={nodes})")]
  CorruptTree {
    node: usize,
    cell: [usize; 3],
    pointer: i64,
    nodes: usize,
  },

  /// Traversal visited more levels than there are nodes (cycle or shared subtree).
  #[error("traversal exceeded maximum depth {max_depth}; child pointers form a cycle")]
  DepthExceeded { max_depth: usize },

  /// A node is referenced by more than one parent cell (reported by `Tree::validate`).
  #[error("node {node} is referenced by more than one parent cell")]
  MultipleParents { node: usize },

  /// A non-root node cannot be reached from the root (reported by `Tree::validate`).
  #[error("node {node} is not reachable from the root")]
  Unreachable { node: usize },
}

/// Shorthand result type for field kernels.
pub type FieldResult<T> = Result<T, FieldError>;
