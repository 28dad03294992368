//! Render-surface traits and the handler interface between the window loop
//! and the sequence logic.
//!
//! The window loop translates platform events into [`KeyEvent`] and
//! [`PointPickEvent`] values and hands them to a [`ViewerHandler`] together
//! with the surfaces it may draw on. Nothing on the handler side sees winit.

use nalgebra::{Point3, UnitQuaternion, Vector3};
use pcdseq_core::{ColoredPointCloud3f, ImageFrame, Result};
use std::path::Path;

/// How a cuboid is drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeStyle {
    pub color: [f32; 3],
    pub wireframe: bool,
}

impl ShapeStyle {
    pub fn wireframe(color: [f32; 3]) -> Self {
        Self {
            color,
            wireframe: true,
        }
    }
}

/// The 3D window as seen by the sequence logic
pub trait SceneSurface {
    /// Replace the displayed cloud
    fn update_point_cloud(&mut self, cloud: &ColoredPointCloud3f) -> Result<()>;

    /// Drop every cuboid and text label
    fn remove_all_shapes(&mut self) -> Result<()>;

    /// Add an oriented cuboid with extents `x`, `y`, `z` along its local axes
    #[allow(clippy::too_many_arguments)]
    fn add_cube(
        &mut self,
        id: &str,
        translation: &Point3<f32>,
        rotation: &UnitQuaternion<f32>,
        x: f32,
        y: f32,
        z: f32,
        style: ShapeStyle,
    ) -> Result<()>;

    /// Add a text label; `euler_xyz` orients it as `Rx * Ry * Rz`
    fn add_text3d(
        &mut self,
        id: &str,
        text: &str,
        position: &Point3<f32>,
        euler_xyz: &Vector3<f32>,
        scale: f32,
        color: [f32; 3],
    ) -> Result<()>;

    fn load_camera_parameters(&mut self, path: &Path) -> Result<()>;

    fn save_camera_parameters(&mut self, path: &Path) -> Result<()>;

    fn save_screenshot(&mut self, path: &Path) -> Result<()>;
}

/// The 2D image window
pub trait ImageSurface {
    fn show_image(&mut self, image: &ImageFrame) -> Result<()>;
}

/// Surfaces available to a handler callback. The image window is absent
/// when no image source is configured.
pub struct RenderTargets<'a> {
    pub scene: &'a mut dyn SceneSurface,
    pub image: Option<&'a mut dyn ImageSurface>,
}

impl<'a> RenderTargets<'a> {
    pub fn new(scene: &'a mut dyn SceneSurface, image: Option<&'a mut dyn ImageSurface>) -> Self {
        Self { scene, image }
    }

    pub fn scene_only(scene: &'a mut dyn SceneSurface) -> Self {
        Self { scene, image: None }
    }
}

/// Keys the viewer distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Right,
    Left,
    Char(char),
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub pressed: bool,
}

impl KeyEvent {
    pub fn down(key: Key) -> Self {
        Self { key, pressed: true }
    }

    pub fn up(key: Key) -> Self {
        Self { key, pressed: false }
    }
}

/// A point chosen with shift + left click
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointPickEvent {
    /// Index of the point in the displayed cloud
    pub index: usize,
    pub point: Point3<f32>,
}

/// Receives input from the window loop
pub trait ViewerHandler {
    fn on_key(&mut self, event: &KeyEvent, targets: &mut RenderTargets<'_>);

    fn on_point_pick(&mut self, event: &PointPickEvent);
}
