//! Sphere scene renderer.
//!
//! Loads a TOML scene, builds a sparse field around the sphere surfaces and
//! renders it with the differentiable volume renderer.
//!
//! Field layout: 4 channels per cell, `[density, r, g, b]`, identity color
//! basis, deepest-level blend.

mod config;
mod scene;

use anyhow::{Context, Result};
use clap::Parser;
use glam::DVec3;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use voxel_field::metrics::{FieldMetrics, COLLECT_METRICS};
use voxel_field::{volume_render_with_stats, Identity, PinholeCamera, RenderOptions};

use config::SceneConfig;

/// Sparse octree field renderer.
#[derive(Parser, Debug)]
#[command(name = "render_field")]
#[command(about = "Renders a TOML sphere scene through a sparse voxel field")]
struct Args {
	/// Path to scene TOML file.
	#[arg(short, long)]
	scene: PathBuf,

	/// Output PNG (default: `output` from the scene, relative to the scene file).
	#[arg(short, long)]
	output: Option<PathBuf>,

	/// Override the scene's step size.
	#[arg(long)]
	step_size: Option<f32>,

	/// Disable empty-space skipping.
	#[arg(long)]
	no_skip: bool,

	/// Skip collecting render statistics.
	#[arg(long)]
	no_metrics: bool,
}

fn main() -> Result<()> {
	let args = Args::parse();
	if args.no_metrics {
		COLLECT_METRICS.store(false, Ordering::Relaxed);
	}

	println!("Loading scene from: {}", args.scene.display());
	let config = SceneConfig::load(&args.scene)?;

	let output = args.output.clone().unwrap_or_else(|| {
		args.scene
			.parent()
			.unwrap_or(Path::new("."))
			.join(&config.output)
	});

	let scene = scene::build(&config)?;
	println!(
		"Built tree: {} nodes, depth {}, {} spheres",
		scene.tree.shape().nodes,
		scene.tree.depth()?,
		config.spheres.len()
	);

	let camera = PinholeCamera::look_at(
		DVec3::from_array(config.camera.eye),
		DVec3::from_array(config.camera.target),
		DVec3::from_array(config.camera.up),
		config.width,
		config.height,
		config.camera.fov_y,
	)
	.context("Invalid camera")?;
	let rays = camera.generate_rays::<f32>();

	let options = RenderOptions::default()
		.with_step_size(args.step_size.unwrap_or(config.render.step_size))
		.with_stop_thresh(config.render.stop_thresh)
		.with_background_brightness(config.render.background)
		.with_skip_empty(config.render.skip_empty && !args.no_skip);

	println!("Rendering {}x{}...", config.width, config.height);
	let (pixels, stats) = volume_render_with_stats(
		&scene.tree.view(),
		&scene.transform,
		&rays.batch(),
		&options,
		&Identity,
	)
	.context("Volume render failed")?;

	let mut metrics = FieldMetrics::new();
	metrics.record_render(&stats);
	if metrics.total_renders > 0 {
		println!(
			"  {} rays, {:.1}% hit, {:.1} samples/hit, {} cells skipped, {} early stops, {:.2} ms",
			metrics.rays,
			100.0 * metrics.hit_ratio(),
			metrics.samples_per_hit(),
			metrics.skipped_cells,
			metrics.early_terminations,
			metrics.avg_render_timing_us() / 1000.0
		);
	}

	write_png(&pixels, config.width, config.height, &output)?;
	println!("\nDone! Output written to: {}", output.display());
	Ok(())
}

/// Clamp linear RGB to [0, 1] and write an 8-bit PNG.
fn write_png(pixels: &[f32], width: u32, height: u32, path: &Path) -> Result<()> {
	let bytes: Vec<u8> = pixels
		.iter()
		.map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
		.collect();
	let image = image::RgbImage::from_raw(width, height, bytes)
		.context("Rendered buffer does not match image size")?;
	image
		.save(path)
		.with_context(|| format!("Failed to write: {}", path.display()))?;
	Ok(())
}
