use super::*;

#[test]
fn test_zero_dimension_rejected() {
  assert!(matches!(
    TreeShape::new(0, 2, 4),
    Err(FieldError::EmptyShape { .. })
  ));
  assert!(TreeShape::new(1, 0, 4).is_err());
  assert!(TreeShape::new(1, 2, 0).is_err());
}

#[test]
fn test_lengths() {
  let shape = TreeShape::new(3, 4, 5).unwrap();
  assert_eq!(shape.cells_per_node(), 64);
  assert_eq!(shape.cell_count(), 192);
  assert_eq!(shape.data_len(), 960);
  assert_eq!(shape.max_depth(), 3);
}

/// Row-major with z innermost, matching the host array layout.
#[test]
fn test_cell_index_is_row_major() {
  let shape = TreeShape::new(2, 3, 1).unwrap();
  assert_eq!(shape.cell_index(0, [0, 0, 0]), 0);
  assert_eq!(shape.cell_index(0, [0, 0, 1]), 1);
  assert_eq!(shape.cell_index(0, [0, 1, 0]), 3);
  assert_eq!(shape.cell_index(0, [1, 0, 0]), 9);
  assert_eq!(shape.cell_index(1, [0, 0, 0]), 27);
}

#[test]
fn test_cell_coord_roundtrip() {
  let shape = TreeShape::new(4, 3, 2).unwrap();
  for index in 0..shape.cell_count() {
    let (node, cell) = shape.cell_coord(index);
    assert_eq!(shape.cell_index(node, cell), index, "index {}", index);
  }
}

#[test]
fn test_data_index_scales_by_channels() {
  let shape = TreeShape::new(2, 2, 7).unwrap();
  assert_eq!(shape.data_index(1, [1, 0, 1]), shape.cell_index(1, [1, 0, 1]) * 7);
}

#[test]
fn test_check_len() {
  let shape = TreeShape::new(1, 2, 1).unwrap();
  assert!(shape.check_len("child", 8, 8).is_ok());
  assert_eq!(
    shape.check_len("child", 8, 9),
    Err(FieldError::ShapeMismatch {
      what: "child",
      expected: 8,
      actual: 9
    })
  );
}
