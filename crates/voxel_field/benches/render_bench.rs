//! Volume rendering benchmarks: plain march vs. empty-space skipping, and
//! the backward pass.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::DVec3;
use voxel_field::{
  volume_render, volume_render_backward, Identity, PinholeCamera, RenderOptions, Transform, Tree,
};

/// One dense blob in a corner of an otherwise empty grid-4 tree.
fn blob_tree() -> Tree<f32> {
  let mut tree = Tree::new(4, 4).unwrap();
  let child = tree.split_cell(0, [1, 1, 1]).unwrap();
  for x in 0..4 {
    for y in 0..4 {
      for z in 0..4 {
        let d = ((x + y + z) as f32 - 4.5).abs();
        tree
          .cell_data_mut(child, [x, y, z])
          .copy_from_slice(&[40.0 / (1.0 + d), 0.9, 0.4, 0.2]);
      }
    }
  }
  tree
}

fn bench_render(c: &mut Criterion) {
  let tree = blob_tree();
  let camera = PinholeCamera::look_at(
    DVec3::new(1.8, 1.2, 2.0),
    DVec3::splat(0.5),
    DVec3::Y,
    128,
    128,
    40.0,
  )
  .unwrap();
  let rays = camera.generate_rays::<f32>();
  let transform = Transform::identity();
  let plain = RenderOptions::default()
    .with_step_size(2e-3)
    .with_skip_empty(false);
  let skipping = plain.with_skip_empty(true);

  let mut group = c.benchmark_group("volume_render (128x128)");
  group.bench_function("fixed step", |b| {
    b.iter(|| volume_render(&tree.view(), &transform, black_box(&rays.batch()), &plain, &Identity).unwrap())
  });
  group.bench_function("skip empty", |b| {
    b.iter(|| {
      volume_render(&tree.view(), &transform, black_box(&rays.batch()), &skipping, &Identity).unwrap()
    })
  });
  group.finish();

  let grad = vec![1.0f32; rays.origins.len() * 3];
  c.bench_function("volume_render_backward (128x128)", |b| {
    b.iter(|| {
      volume_render_backward(&tree.view(), &transform, &rays.batch(), &skipping, &Identity, &grad)
        .unwrap()
    })
  });
}

criterion_group!(benches, bench_render);
criterion_main!(benches);
