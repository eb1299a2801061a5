//! Tree store: an arena of N×N×N branch nodes addressed by integer index.
//!
//! # Layout
//!
//! ```text
//! data  [M, N, N, N, K]   row-major, channel innermost
//! child [M, N, N, N]      0 = leaf cell, v in [1, M) = subtree at node v
//! ```
//!
//! Node 0 is the root and covers `[0, 1)³` in tree space. Every cell of a
//! node covers `1/N` of the node along each axis; a child node covers
//! exactly its parent cell.
//!
//! # Module Structure
//!
//! - [`shape`]: `TreeShape` - dimensions and flat index math
//! - [`traversal`]: `TreeStructure`, `Path` - the descent primitive shared
//!   by every kernel
//! - [`view`]: `TreeView` - borrowed data + structure for read kernels
//! - [`arena`]: `Tree` - owned storage with a mechanical `split_cell`

pub mod arena;
pub mod shape;
pub mod traversal;
pub mod view;

pub use arena::Tree;
pub use shape::TreeShape;
pub use traversal::{CellBounds, Level, Path, TreeStructure};
pub use view::TreeView;
