//! Pinhole camera ray generation.
//!
//! Camera space follows the right-handed convention: the camera looks down
//! `-Z` with `+Y` up. Pixels are emitted row-major starting at the top-left,
//! each ray passing through the pixel centre.

use glam::{DMat4, DVec3};
use rayon::prelude::*;

use crate::error::{FieldError, FieldResult};
use crate::real::Real;
use crate::render::RayBatch;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinholeCamera {
  camera_to_world: DMat4,
  width: u32,
  height: u32,
  /// Focal length in pixels.
  focal: f64,
}

impl PinholeCamera {
  pub fn new(camera_to_world: DMat4, width: u32, height: u32, focal: f64) -> FieldResult<Self> {
    if width == 0 || height == 0 {
      return Err(FieldError::InvalidParameter {
        name: "resolution",
        reason: "width and height must be non-zero",
      });
    }
    if !(focal.is_finite() && focal > 0.0) {
      return Err(FieldError::InvalidParameter {
        name: "focal",
        reason: "must be finite and positive",
      });
    }
    Ok(Self {
      camera_to_world,
      width,
      height,
      focal,
    })
  }

  /// Camera at `eye` looking at `target` with a vertical field of view.
  pub fn look_at(
    eye: DVec3,
    target: DVec3,
    up: DVec3,
    width: u32,
    height: u32,
    fov_y_degrees: f64,
  ) -> FieldResult<Self> {
    if !(fov_y_degrees > 0.0 && fov_y_degrees < 180.0) {
      return Err(FieldError::InvalidParameter {
        name: "fov_y_degrees",
        reason: "must lie in (0, 180)",
      });
    }
    if (target - eye).cross(up).length_squared() == 0.0 {
      return Err(FieldError::InvalidParameter {
        name: "up",
        reason: "must not be parallel to the view direction",
      });
    }
    let world_to_camera = DMat4::look_at_rh(eye, target, up);
    let focal = 0.5 * height as f64 / (0.5 * fov_y_degrees.to_radians()).tan();
    Self::new(world_to_camera.inverse(), width, height, focal)
  }

  #[inline]
  pub fn width(&self) -> u32 {
    self.width
  }

  #[inline]
  pub fn height(&self) -> u32 {
    self.height
  }

  #[inline]
  pub fn focal(&self) -> f64 {
    self.focal
  }

  #[inline]
  pub fn camera_to_world(&self) -> DMat4 {
    self.camera_to_world
  }

  #[inline]
  pub fn ray_count(&self) -> usize {
    self.width as usize * self.height as usize
  }

  /// World-space ray through the centre of pixel `(x, y)`.
  pub fn pixel_ray(&self, x: u32, y: u32) -> (DVec3, DVec3) {
    let camera_dir = DVec3::new(
      (x as f64 + 0.5 - 0.5 * self.width as f64) / self.focal,
      -(y as f64 + 0.5 - 0.5 * self.height as f64) / self.focal,
      -1.0,
    );
    let origin = self.camera_to_world.transform_point3(DVec3::ZERO);
    let dir = self.camera_to_world.transform_vector3(camera_dir).normalize();
    (origin, dir)
  }

  /// One ray per pixel, row-major.
  pub fn generate_rays<T: Real>(&self) -> CameraRays<T> {
    let to_real = |v: DVec3| [T::cast(v.x), T::cast(v.y), T::cast(v.z)];
    let width = self.width as usize;
    let (origins, dirs): (Vec<_>, Vec<_>) = (0..self.ray_count())
      .into_par_iter()
      .map(|index| {
        let (origin, dir) = self.pixel_ray((index % width) as u32, (index / width) as u32);
        (to_real(origin), to_real(dir))
      })
      .unzip();
    CameraRays { origins, dirs }
  }
}

/// Owned ray arrays for one image.
#[derive(Clone, Debug, Default)]
pub struct CameraRays<T: Real> {
  pub origins: Vec<[T; 3]>,
  pub dirs: Vec<[T; 3]>,
}

impl<T: Real> CameraRays<T> {
  pub fn batch(&self) -> RayBatch<'_, T> {
    RayBatch::new_unchecked(&self.origins, &self.dirs)
  }
}

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;
