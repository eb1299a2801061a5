//! Scene configuration parsed from TOML.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Root scene description.
#[derive(Debug, Deserialize)]
pub struct SceneConfig {
	/// Output PNG path, relative to the scene file.
	#[serde(default = "default_output")]
	pub output: String,
	/// Image width in pixels.
	pub width: u32,
	/// Image height in pixels.
	pub height: u32,
	pub camera: CameraConfig,
	#[serde(default)]
	pub render: RenderConfig,
	#[serde(default)]
	pub volume: VolumeConfig,
	/// Emitting/absorbing spheres, world space.
	pub spheres: Vec<SphereConfig>,
}

#[derive(Debug, Deserialize)]
pub struct CameraConfig {
	pub eye: [f64; 3],
	pub target: [f64; 3],
	#[serde(default = "default_up")]
	pub up: [f64; 3],
	/// Vertical field of view in degrees.
	#[serde(default = "default_fov")]
	pub fov_y: f64,
}

#[derive(Debug, Deserialize)]
pub struct RenderConfig {
	/// Tree-space distance between samples.
	#[serde(default = "default_step_size")]
	pub step_size: f32,
	#[serde(default = "default_stop_thresh")]
	pub stop_thresh: f32,
	#[serde(default = "default_background")]
	pub background: f32,
	#[serde(default = "default_true")]
	pub skip_empty: bool,
}

impl Default for RenderConfig {
	fn default() -> Self {
		Self {
			step_size: default_step_size(),
			stop_thresh: default_stop_thresh(),
			background: default_background(),
			skip_empty: true,
		}
	}
}

/// World box covered by the tree and its refinement.
#[derive(Debug, Deserialize)]
pub struct VolumeConfig {
	#[serde(default)]
	pub center: [f64; 3],
	#[serde(default = "default_radius")]
	pub radius: f64,
	/// Cells per node axis.
	#[serde(default = "default_grid")]
	pub grid: usize,
	/// Refinement levels below the root around sphere surfaces.
	#[serde(default = "default_depth")]
	pub depth: usize,
}

impl Default for VolumeConfig {
	fn default() -> Self {
		Self {
			center: [0.0; 3],
			radius: default_radius(),
			grid: default_grid(),
			depth: default_depth(),
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct SphereConfig {
	pub center: [f64; 3],
	pub radius: f64,
	/// Extinction inside the sphere, per tree-space unit.
	pub density: f32,
	/// Linear RGB in [0, 1].
	pub color: [f32; 3],
}

fn default_output() -> String {
	"render.png".to_string()
}

fn default_up() -> [f64; 3] {
	[0.0, 1.0, 0.0]
}

fn default_fov() -> f64 {
	40.0
}

fn default_step_size() -> f32 {
	2e-3
}

fn default_stop_thresh() -> f32 {
	1e-2
}

fn default_background() -> f32 {
	1.0
}

fn default_true() -> bool {
	true
}

fn default_radius() -> f64 {
	1.0
}

fn default_grid() -> usize {
	4
}

fn default_depth() -> usize {
	2
}

impl SceneConfig {
	/// Load and validate a scene from a TOML file.
	pub fn load(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path)
			.with_context(|| format!("Failed to read scene file: {}", path.display()))?;
		let config: SceneConfig = toml::from_str(&content).with_context(|| "Failed to parse scene TOML")?;
		config.validate()?;
		Ok(config)
	}

	fn validate(&self) -> Result<()> {
		if self.width == 0 || self.height == 0 {
			anyhow::bail!("Image size must be non-zero, got {}x{}", self.width, self.height);
		}
		if self.spheres.is_empty() {
			anyhow::bail!("Scene must have at least one sphere");
		}
		if self.volume.grid < 2 {
			anyhow::bail!("volume.grid must be at least 2, got {}", self.volume.grid);
		}
		if self.volume.depth > 4 {
			anyhow::bail!("volume.depth is limited to 4, got {}", self.volume.depth);
		}
		if !(self.volume.radius > 0.0) {
			anyhow::bail!("volume.radius must be positive, got {}", self.volume.radius);
		}
		for (i, sphere) in self.spheres.iter().enumerate() {
			if !(sphere.radius > 0.0) || sphere.density < 0.0 {
				anyhow::bail!("Sphere {} needs a positive radius and non-negative density", i);
			}
		}
		Ok(())
	}
}
