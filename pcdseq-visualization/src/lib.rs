//! Visualization and sequence control for point cloud sequences
//!
//! This crate connects the frame catalog to the render windows:
//! - Sequence controller stepping through frames with paired images and boxes
//! - Surface traits and the handler interface used by the window loop
//! - Orbit camera with JSON persistence
//! - Box wireframe and label geometry, screen-space point picking
//! - winit windows rendered with wgpu

pub mod camera;
pub mod controller;
pub mod picking;
pub mod shapes;
pub mod surface;
pub mod window;

pub use camera::Camera;
pub use controller::{Direction, FrameReport, SequenceConfig, SequenceController, SequenceState};
pub use picking::{pick_point, project_to_screen, DEFAULT_PICK_RADIUS};
pub use shapes::{cuboid_segments, text_segments, Segment};
pub use surface::{
    ImageSurface, Key, KeyEvent, PointPickEvent, RenderTargets, SceneSurface, ShapeStyle,
    ViewerHandler,
};
pub use window::{GpuImageSurface, GpuSceneSurface, SequenceWindows, WindowConfig};
