//! Sphere scene to sparse field.
//!
//! Refinement: every cell whose box may cross a sphere surface is split, down
//! to `volume.depth` levels below the root. Data: 4 channels per cell,
//! `[density, r, g, b]`, sampled at cell centres. Leaf cells are written
//! through `assign_vertical`, which is exact at leaf centres under the
//! deepest-level blend; branch cells get their centre value directly so
//! neighbouring leaves interpolate smoothly.

use anyhow::{Context, Result};
use voxel_field::{assign_vertical, BlendMode, Transform, Tree};

use crate::config::SceneConfig;

pub const CHANNELS: usize = 4;

pub struct Scene {
	pub tree: Tree<f32>,
	/// World to tree space.
	pub transform: Transform<f32>,
}

/// Sphere in tree space.
struct TreeSphere {
	center: [f64; 3],
	radius: f64,
	density: f32,
	color: [f32; 3],
}

impl TreeSphere {
	fn distance(&self, p: [f64; 3]) -> f64 {
		let d = [p[0] - self.center[0], p[1] - self.center[1], p[2] - self.center[2]];
		(d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt()
	}
}

pub fn build(config: &SceneConfig) -> Result<Scene> {
	let volume = &config.volume;
	let world_to_tree = Transform::<f64>::from_center_radius(volume.center, volume.radius);
	let scale = world_to_tree.invradius[0];
	let spheres: Vec<TreeSphere> = config
		.spheres
		.iter()
		.map(|s| TreeSphere {
			center: world_to_tree.apply_point(s.center),
			radius: s.radius * scale,
			density: s.density,
			color: s.color,
		})
		.collect();

	let grid = volume.grid;
	let finest = 1.0 / (grid as f64).powi(volume.depth as i32 + 1);
	let mut tree = Tree::<f32>::new(grid, CHANNELS)
		.context("Creating root node")?
		.with_blend(BlendMode::Deepest);

	// Tree-space (min corner, size) per node, indexed like the arena.
	let mut bounds = vec![([0.0f64; 3], 1.0f64)];
	let mut frontier = vec![0usize];
	for _ in 0..volume.depth {
		let mut next = Vec::new();
		for node in frontier {
			let (min, size) = bounds[node];
			let cell_size = size / grid as f64;
			for cell in cells(grid) {
				let cell_min = cell_corner(min, cell_size, cell);
				let centre = cell_centre(cell_min, cell_size);
				if crosses_surface(&spheres, centre, cell_size, finest) {
					let child = tree.split_cell(node, cell)?;
					debug_assert_eq!(child, bounds.len());
					bounds.push((cell_min, cell_size));
					next.push(child);
				}
			}
		}
		frontier = next;
	}

	let mut leaf_points = Vec::new();
	let mut leaf_values = Vec::new();
	let mut branch_cells = Vec::new();
	for (node, &(min, size)) in bounds.iter().enumerate() {
		let cell_size = size / grid as f64;
		for cell in cells(grid) {
			let centre = cell_centre(cell_corner(min, cell_size, cell), cell_size);
			let value = sample(&spheres, centre, finest);
			if tree.child_node(node, cell).is_some() {
				branch_cells.push((node, cell, value));
			} else {
				leaf_points.push(centre.map(|c| c as f32));
				leaf_values.extend_from_slice(&value);
			}
		}
	}

	let (structure, data) = tree.split_mut();
	assign_vertical(data, &structure, &Transform::identity(), &leaf_points, &leaf_values)
		.context("Assigning leaf values")?;
	for (node, cell, value) in branch_cells {
		tree.cell_data_mut(node, cell).copy_from_slice(&value);
	}

	let transform = Transform::new(
		world_to_tree.offset.map(|v| v as f32),
		world_to_tree.invradius.map(|v| v as f32),
	);
	Ok(Scene { tree, transform })
}

fn cells(grid: usize) -> impl Iterator<Item = [usize; 3]> {
	(0..grid).flat_map(move |x| (0..grid).flat_map(move |y| (0..grid).map(move |z| [x, y, z])))
}

fn cell_corner(min: [f64; 3], cell_size: f64, cell: [usize; 3]) -> [f64; 3] {
	[
		min[0] + cell[0] as f64 * cell_size,
		min[1] + cell[1] as f64 * cell_size,
		min[2] + cell[2] as f64 * cell_size,
	]
}

fn cell_centre(cell_min: [f64; 3], cell_size: f64) -> [f64; 3] {
	cell_min.map(|c| c + 0.5 * cell_size)
}

/// Conservative: the cell's bounding sphere touches the soft surface shell.
fn crosses_surface(spheres: &[TreeSphere], centre: [f64; 3], cell_size: f64, softness: f64) -> bool {
	let half_diagonal = 0.5 * 3f64.sqrt() * cell_size;
	spheres
		.iter()
		.any(|s| (s.distance(centre) - s.radius).abs() < half_diagonal + softness)
}

/// `[density, r, g, b]` of the most opaque sphere at `p`, with a linear
/// falloff of width `softness` across the surface.
fn sample(spheres: &[TreeSphere], p: [f64; 3], softness: f64) -> [f32; CHANNELS] {
	let mut best = [0.0f32; CHANNELS];
	for s in spheres {
		let coverage = ((s.radius - s.distance(p)) / softness + 0.5).clamp(0.0, 1.0) as f32;
		let density = s.density * coverage;
		if density > best[0] {
			best = [density, s.color[0], s.color[1], s.color[2]];
		}
	}
	best
}
