//! # pcdseq GPU
//!
//! wgpu renderers backing the sequence viewer windows:
//!
//! - [`SceneRenderer`] draws colored points as screen-space squares plus
//!   line segments (box wireframes and labels) and can read the frame back
//!   for screenshots.
//! - [`ImageRenderer`] shows one RGBA image stretched over its window.
//!
//! Both share a single [`GpuContext`] so that one device serves every window.

pub mod device;
pub mod scene;
pub mod image_view;
pub mod readback;
mod shaders;

pub use device::GpuContext;
pub use scene::{ColorVertex, RenderConfig, SceneRenderer, SceneUniform};
pub use image_view::ImageRenderer;
pub use readback::unpad_rows;
