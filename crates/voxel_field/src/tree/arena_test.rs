use super::*;

#[test]
fn test_new_tree_is_single_zero_root() {
  let tree = Tree::<f32>::new(3, 4).unwrap();
  assert_eq!(tree.shape(), TreeShape::new(1, 3, 4).unwrap());
  assert!(tree.data().iter().all(|&v| v == 0.0));
  assert!(tree.child().iter().all(|&c| c == 0));
  assert_eq!(tree.depth().unwrap(), 1);
}

#[test]
fn test_split_cell_appends_node() {
  let mut tree = Tree::<f32>::new(2, 3).unwrap();
  let a = tree.split_cell(0, [0, 1, 0]).unwrap();
  let b = tree.split_cell(a, [1, 1, 1]).unwrap();

  assert_eq!((a, b), (1, 2));
  assert_eq!(tree.shape().nodes, 3);
  assert_eq!(tree.data().len(), tree.shape().data_len());
  assert_eq!(tree.child().len(), tree.shape().cell_count());
  assert_eq!(tree.child_node(0, [0, 1, 0]), Some(1));
  assert_eq!(tree.child_node(1, [1, 1, 1]), Some(2));
  assert_eq!(tree.child_node(0, [0, 0, 0]), None);
  assert_eq!(tree.depth().unwrap(), 3);
  tree.validate().unwrap();
}

/// Splitting an already split cell returns the existing child.
#[test]
fn test_split_cell_is_idempotent() {
  let mut tree = Tree::<f64>::new(2, 1).unwrap();
  let first = tree.split_cell(0, [1, 1, 1]).unwrap();
  let second = tree.split_cell(0, [1, 1, 1]).unwrap();
  assert_eq!(first, second);
  assert_eq!(tree.shape().nodes, 2);
}

#[test]
fn test_split_cell_rejects_bad_index() {
  let mut tree = Tree::<f64>::new(2, 1).unwrap();
  assert!(tree.split_cell(0, [2, 0, 0]).is_err());
  assert!(tree.split_cell(7, [0, 0, 0]).is_err());
}

#[test]
fn test_cell_data_access() {
  let mut tree = Tree::<f32>::new(2, 2).unwrap();
  tree.cell_data_mut(0, [1, 0, 1]).copy_from_slice(&[3.0, 4.0]);
  assert_eq!(tree.cell_data(0, [1, 0, 1]), &[3.0, 4.0]);
  assert_eq!(tree.view().cell_data(0, [1, 0, 1]), &[3.0, 4.0]);
}

#[test]
fn test_validate_rejects_shared_subtree() {
  let mut tree = Tree::<f32>::new(2, 1).unwrap();
  let child = tree.split_cell(0, [0, 0, 0]).unwrap();
  let shape = tree.shape();
  tree.child_mut()[shape.cell_index(0, [1, 1, 1])] = child as i32;
  assert_eq!(
    tree.validate(),
    Err(FieldError::MultipleParents { node: child })
  );
}

#[test]
fn test_validate_rejects_out_of_range() {
  let mut tree = Tree::<f32>::new(2, 1).unwrap();
  tree.child_mut()[3] = 9;
  assert!(matches!(
    tree.validate(),
    Err(FieldError::CorruptTree { pointer: 9, .. })
  ));
}

#[test]
fn test_from_parts_checks_lengths() {
  let shape = TreeShape::new(1, 2, 2).unwrap();
  assert!(Tree::<f32>::from_parts(shape, vec![0.0; 16], vec![0; 8]).is_ok());
  assert!(Tree::<f32>::from_parts(shape, vec![0.0; 15], vec![0; 8]).is_err());
  assert!(Tree::<f32>::from_parts(shape, vec![0.0; 16], vec![0; 7]).is_err());
}

/// Nodes 1 and 2 point at each other but nothing below the root reaches them.
#[test]
fn test_validate_rejects_detached_cycle() {
  let shape = TreeShape::new(3, 2, 1).unwrap();
  let mut child = vec![0; shape.cell_count()];
  child[shape.cell_index(1, [0, 0, 0])] = 2;
  child[shape.cell_index(2, [0, 0, 0])] = 1;
  let tree = Tree::<f32>::from_parts(shape, vec![0.0; shape.data_len()], child).unwrap();

  assert_eq!(tree.validate(), Err(FieldError::Unreachable { node: 1 }));
  assert!(tree.depth().is_err());
}

#[test]
fn test_validate_rejects_detached_node() {
  let mut tree = Tree::<f32>::new(2, 1).unwrap();
  let a = tree.split_cell(0, [0, 0, 0]).unwrap();
  tree.split_cell(a, [1, 0, 0]).unwrap();
  let shape = tree.shape();
  tree.child_mut()[shape.cell_index(0, [0, 0, 0])] = 0;
  assert_eq!(tree.validate(), Err(FieldError::Unreachable { node: a }));
}

#[test]
fn test_from_parts_rejects_empty_shape() {
  let shape = TreeShape {
    nodes: 1,
    grid: 0,
    channels: 1,
  };
  assert_eq!(
    Tree::<f32>::from_parts(shape, Vec::new(), Vec::new()),
    Err(FieldError::EmptyShape {
      nodes: 1,
      grid: 0,
      channels: 1
    })
  );
}

#[test]
fn test_blend_propagates_to_views() {
  let tree = Tree::<f32>::new(2, 1).unwrap().with_blend(BlendMode::Deepest);
  assert_eq!(tree.structure().blend(), BlendMode::Deepest);
  assert_eq!(tree.view().structure().blend(), BlendMode::Deepest);
}
