use super::*;
use crate::tree::{Tree, TreeView};

/// Root-only tree: a single level whose cell is floor(p * N).
#[test]
fn test_single_level_path() {
  let tree = Tree::<f64>::new(4, 1).unwrap();
  let path = tree
    .structure()
    .traverse([0.1, 0.5, 0.99])
    .unwrap()
    .expect("point is inside the domain");

  assert_eq!(path.depth(), 1);
  assert_eq!(path.leaf().node, 0);
  assert_eq!(path.leaf().cell, [0, 2, 3]);
  assert_eq!(path.leaf().local, [0.1, 0.5, 0.99]);
}

/// Descending rescales the point into the child's frame.
#[test]
fn test_two_level_local_coordinates() {
  let mut tree = Tree::<f64>::new(2, 1).unwrap();
  let child = tree.split_cell(0, [1, 0, 1]).unwrap();

  let path = tree.structure().traverse::<f64>([0.75, 0.125, 0.625]).unwrap().unwrap();
  assert_eq!(path.depth(), 2);

  let levels = path.levels();
  assert_eq!(levels[0].node, 0);
  assert_eq!(levels[0].cell, [1, 0, 1]);
  assert_eq!(levels[1].node, child);
  assert_eq!(levels[1].cell, [1, 0, 0]);
  let expected = [0.5, 0.25, 0.25];
  for axis in 0..3 {
    assert!((levels[1].local[axis] - expected[axis]).abs() < 1e-12);
  }
}

#[test]
fn test_leaf_bounds() {
  let mut tree = Tree::<f64>::new(2, 1).unwrap();
  let child = tree.split_cell(0, [1, 1, 1]).unwrap();
  tree.split_cell(child, [0, 0, 0]).unwrap();

  let path = tree.structure().traverse::<f64>([0.6, 0.6, 0.6]).unwrap().unwrap();
  assert_eq!(path.depth(), 3);
  let bounds = path.leaf_bounds();
  assert!((bounds.size - 0.125).abs() < 1e-12);
  for axis in 0..3 {
    assert!((bounds.min[axis] - 0.5).abs() < 1e-12);
    assert!((bounds.max()[axis] - 0.625).abs() < 1e-12);
  }

  // A point in an unsplit root cell stops at level 0.
  let shallow = tree.structure().traverse::<f64>([0.1, 0.1, 0.1]).unwrap().unwrap();
  assert_eq!(shallow.depth(), 1);
  assert!((shallow.leaf_bounds().size - 0.5).abs() < 1e-12);
}

/// Out-of-domain points produce no path, not an error.
#[test]
fn test_out_of_domain() {
  let tree = Tree::<f32>::new(2, 1).unwrap();
  let structure = tree.structure();
  for p in [
    [-0.01f32, 0.5, 0.5],
    [0.5, 1.0, 0.5],
    [0.5, 0.5, 2.0],
    [f32::NAN, 0.5, 0.5],
    [0.5, f32::INFINITY, 0.5],
  ] {
    assert!(structure.traverse(p).unwrap().is_none(), "{:?}", p);
  }
}

/// Values just below 1.0 must not index past the last cell.
#[test]
fn test_upper_edge_clamps() {
  let tree = Tree::<f32>::new(3, 1).unwrap();
  let p = [1.0f32 - f32::EPSILON / 2.0; 3];
  let path = tree.structure().traverse(p).unwrap().unwrap();
  assert_eq!(path.leaf().cell, [2, 2, 2]);
}

#[test]
fn test_out_of_range_pointer_is_corrupt() {
  let shape = TreeShape::new(2, 2, 1).unwrap();
  let mut child = vec![0i32; shape.cell_count()];
  child[shape.cell_index(0, [0, 0, 0])] = 5;
  let structure = TreeStructure::new(shape, &child).unwrap();

  let err = structure.traverse([0.1f64, 0.1, 0.1]).unwrap_err();
  assert_eq!(
    err,
    FieldError::CorruptTree {
      node: 0,
      cell: [0, 0, 0],
      pointer: 5,
      nodes: 2
    }
  );

  // Untouched cells still traverse fine.
  assert!(structure.traverse([0.9f64, 0.9, 0.9]).unwrap().is_some());
}

#[test]
fn test_negative_pointer_is_corrupt() {
  let shape = TreeShape::new(2, 1, 1).unwrap();
  let child = vec![-1i32, 0];
  let structure = TreeStructure::new(shape, &child).unwrap();
  assert!(matches!(
    structure.traverse([0.5f32, 0.5, 0.5]),
    Err(FieldError::CorruptTree { pointer: -1, .. })
  ));
}

/// A cycle fails fast instead of looping forever.
#[test]
fn test_cycle_exceeds_depth() {
  let shape = TreeShape::new(3, 1, 1).unwrap();
  // 0 -> 1 -> 2 -> 1 -> ...
  let child = vec![1i32, 2, 1];
  let structure = TreeStructure::new(shape, &child).unwrap();
  assert_eq!(
    structure.traverse([0.5f64, 0.5, 0.5]),
    Err(FieldError::DepthExceeded { max_depth: 3 })
  );
}

#[test]
fn test_child_length_checked() {
  let shape = TreeShape::new(2, 2, 1).unwrap();
  let child = vec![0i32; 15];
  assert!(matches!(
    TreeStructure::new(shape, &child),
    Err(FieldError::ShapeMismatch { what: "child", .. })
  ));
}

/// Shape fields are public; borrowed views re-check them.
#[test]
fn test_empty_shape_rejected_by_views() {
  let no_grid = TreeShape {
    nodes: 1,
    grid: 0,
    channels: 1,
  };
  assert!(matches!(
    TreeStructure::new(no_grid, &[]),
    Err(FieldError::EmptyShape { grid: 0, .. })
  ));

  let no_channels = TreeShape {
    nodes: 1,
    grid: 2,
    channels: 0,
  };
  let child = [0i32; 8];
  assert!(matches!(
    TreeView::<f32>::new(no_channels, &[], &child),
    Err(FieldError::EmptyShape { channels: 0, .. })
  ));
}
