//! Camera utilities for 3D visualization

use nalgebra::{Matrix4, Perspective3, Point3, Rotation3, Unit, Vector3};
use pcdseq_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Minimum distance kept between the eye and the target while zooming
const MIN_DISTANCE: f32 = 1e-3;

/// A 3D camera orbiting a target point.
///
/// The whole struct is the persisted camera pose: it serializes to JSON
/// with [`Camera::save`] and reads back with [`Camera::load`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    /// Vertical field of view in radians
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Create a new camera
    pub fn new(
        position: Point3<f32>,
        target: Point3<f32>,
        up: Vector3<f32>,
        fov: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            position,
            target,
            up,
            fov,
            aspect_ratio,
            near,
            far,
        }
    }

    /// Get the view matrix
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Get the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        let perspective = Perspective3::new(self.aspect_ratio, self.fov, self.near, self.far);
        perspective.into_inner()
    }

    /// Projection followed by view, as uploaded to the shaders. Depth is
    /// remapped from OpenGL's `[-1, 1]` to wgpu's `[0, 1]`.
    pub fn view_projection(&self) -> Matrix4<f32> {
        #[rustfmt::skip]
        let opengl_to_wgpu = Matrix4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 0.5, 0.5,
            0.0, 0.0, 0.0, 1.0,
        );
        opengl_to_wgpu * self.projection_matrix() * self.view_matrix()
    }

    pub fn distance(&self) -> f32 {
        (self.position - self.target).norm()
    }

    pub fn set_aspect_ratio(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect_ratio = width as f32 / height as f32;
        }
    }

    /// Rotate the camera around the target.
    ///
    /// `horizontal` turns about the up axis, `vertical` tilts about the
    /// camera's right axis. The tilt stops short of the poles.
    pub fn orbit(&mut self, horizontal: f32, vertical: f32) {
        let offset = self.position - self.target;
        let radius = offset.norm();
        if radius < MIN_DISTANCE {
            return;
        }

        let up = Unit::new_normalize(self.up);
        let yaw = Rotation3::from_axis_angle(&up, -horizontal);
        let mut offset = yaw * offset;

        let forward = -offset / radius;
        let right = forward.cross(&*up);
        if right.norm() > f32::EPSILON {
            let pitch = Rotation3::from_axis_angle(&Unit::new_normalize(right), -vertical);
            let tilted = pitch * offset;
            // Keep away from looking straight along the up axis
            if tilted.normalize().dot(&*up).abs() < 0.999 {
                offset = tilted;
            }
        }

        self.position = self.target + offset;
    }

    /// Translate eye and target together in the view plane
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let forward = (self.target - self.position).normalize();
        let right = forward.cross(&self.up).normalize();
        let up = right.cross(&forward);
        let scale = self.distance();
        let shift = (-right * dx + up * dy) * scale;
        self.position += shift;
        self.target += shift;
    }

    /// Move toward the target by a fraction of the current distance
    pub fn zoom(&mut self, amount: f32) {
        let offset = self.position - self.target;
        let distance = offset.norm();
        let new_distance = (distance * (1.0 - amount)).max(MIN_DISTANCE);
        if distance > 0.0 {
            self.position = self.target + offset * (new_distance / distance);
        }
    }

    /// Restore the default pose, keeping the aspect ratio
    pub fn reset(&mut self) {
        let aspect_ratio = self.aspect_ratio;
        *self = Self {
            aspect_ratio,
            ..Self::default()
        };
    }

    /// Frame the axis-aligned box `[min, max]` from the +Z side.
    pub fn fit_to_bounds(&mut self, min: &Point3<f32>, max: &Point3<f32>) {
        let center = nalgebra::center(min, max);
        let radius = ((max - min).norm() * 0.5).max(MIN_DISTANCE);
        let distance = radius / (self.fov * 0.5).sin();

        self.target = center;
        self.position = center + Vector3::new(0.0, 0.0, distance);
        self.up = Vector3::y();
        self.near = (distance - radius).max(distance * 1e-3);
        self.far = (distance + radius) * 4.0;
    }

    /// Write the camera pose as JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| Error::InvalidData(format!("failed to serialize camera: {}", e)))?;
        writer.flush()?;
        Ok(())
    }

    /// Read a camera pose written by [`Camera::save`]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound(format!(
                "camera parameter file {}",
                path.display()
            )));
        }
        let reader = BufReader::new(File::open(path)?);
        let camera: Camera = serde_json::from_reader(reader).map_err(|e| {
            Error::InvalidData(format!("camera parameter file {}: {}", path.display(), e))
        })?;
        if !(camera.fov > 0.0 && camera.near > 0.0 && camera.far > camera.near) {
            return Err(Error::InvalidData(format!(
                "camera parameter file {}: invalid projection",
                path.display()
            )));
        }
        Ok(camera)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(
            Point3::new(0.0, 0.0, 5.0),
            Point3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            std::f32::consts::FRAC_PI_4,
            16.0 / 9.0,
            0.1,
            100.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_orbit_keeps_distance() {
        let mut camera = Camera::default();
        let before = camera.distance();
        camera.orbit(0.7, 0.3);
        assert_relative_eq!(camera.distance(), before, epsilon = 1e-4);
        assert_ne!(camera.position, Camera::default().position);
    }

    #[test]
    fn test_horizontal_orbit_stays_in_plane() {
        let mut camera = Camera::default();
        camera.orbit(std::f32::consts::FRAC_PI_2, 0.0);
        assert_relative_eq!(camera.position.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(camera.position.x.abs(), 5.0, epsilon = 1e-4);
    }

    #[test]
    fn test_pan_moves_eye_and_target_together() {
        let mut camera = Camera::default();
        let offset = camera.position - camera.target;
        camera.pan(0.1, 0.2);
        assert_relative_eq!(camera.position - camera.target, offset, epsilon = 1e-5);
        assert!(camera.target.y > 0.0);
    }

    #[test]
    fn test_zoom_never_crosses_target() {
        let mut camera = Camera::default();
        camera.zoom(0.5);
        assert_relative_eq!(camera.distance(), 2.5, epsilon = 1e-5);
        camera.zoom(2.0);
        assert!(camera.distance() >= MIN_DISTANCE);
    }

    #[test]
    fn test_reset_keeps_aspect_ratio() {
        let mut camera = Camera::default();
        camera.set_aspect_ratio(800, 400);
        camera.orbit(1.0, 0.0);
        camera.reset();
        assert_eq!(camera.position, Camera::default().position);
        assert_relative_eq!(camera.aspect_ratio, 2.0);
    }

    #[test]
    fn test_fit_to_bounds_centers_target() {
        let mut camera = Camera::default();
        camera.fit_to_bounds(&Point3::new(-1.0, -2.0, 0.0), &Point3::new(3.0, 2.0, 4.0));
        assert_relative_eq!(camera.target, Point3::new(1.0, 0.0, 2.0));
        assert!(camera.position.z > 4.0);
        assert!(camera.near > 0.0 && camera.far > camera.near);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("camera_params.json");

        let mut camera = Camera::default();
        camera.orbit(0.4, -0.2);
        camera.save(&path).unwrap();

        let loaded = Camera::load(&path).unwrap();
        assert_relative_eq!(loaded.position, camera.position, epsilon = 1e-6);
        assert_relative_eq!(loaded.fov, camera.fov);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("camera.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Camera::load(&path), Err(Error::InvalidData(_))));
        assert!(matches!(
            Camera::load(dir.path().join("missing.json")),
            Err(Error::NotFound(_))
        ));
    }
}
