//! winit windows backing the render surfaces, and the event loop that feeds
//! a [`ViewerHandler`].
//!
//! One event loop serves both the 3D window and the image window. The loop
//! wakes at a fixed poll interval; input is translated into handler events
//! and every state change requests a redraw.

use crate::camera::Camera;
use crate::picking::{pick_point, DEFAULT_PICK_RADIUS};
use crate::shapes::{cuboid_segments, text_segments, Segment};
use crate::surface::{
    ImageSurface, Key, KeyEvent, PointPickEvent, RenderTargets, SceneSurface, ShapeStyle,
    ViewerHandler,
};
use log::{debug, error, info, warn};
use nalgebra::{Point2, Point3, UnitQuaternion, Vector3};
use pcdseq_core::{
    rotation_from_euler_xyz, ColoredPointCloud3f, Drawable, Error, ImageFrame, Result,
};
use pcdseq_gpu::{ColorVertex, GpuContext, ImageRenderer, RenderConfig, SceneRenderer};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use winit::{
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{Key as WinitKey, KeyCode, NamedKey, PhysicalKey},
    window::{Window, WindowBuilder},
};

/// Shortest and longest accepted poll intervals
const POLL_RANGE_MS: (u64, u64) = (30, 100);

/// Window titles, sizes and loop timing
#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub scene_title: String,
    pub image_title: String,
    pub scene_size: (u32, u32),
    pub image_size: (u32, u32),
    pub poll_interval: Duration,
    /// Draw a unit coordinate triad at the origin
    pub show_axes: bool,
    pub pick_radius: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            scene_title: "3D Viewer".to_string(),
            image_title: "Image Viewer".to_string(),
            scene_size: (1280, 720),
            image_size: (640, 480),
            poll_interval: Duration::from_millis(100),
            show_axes: true,
            pick_radius: DEFAULT_PICK_RADIUS,
        }
    }
}

impl WindowConfig {
    /// Set the poll interval, clamped to 30..=100 ms
    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        let clamped = ms.clamp(POLL_RANGE_MS.0, POLL_RANGE_MS.1);
        if clamped != ms {
            warn!("poll interval {} ms out of range, using {} ms", ms, clamped);
        }
        self.poll_interval = Duration::from_millis(clamped);
        self
    }
}

/// Convert a colored cloud into per-point instances
pub fn cloud_vertices(cloud: &ColoredPointCloud3f) -> Vec<ColorVertex> {
    cloud
        .iter()
        .map(|p| ColorVertex::new(p.position.coords.into(), p.color_f32()))
        .collect()
}

/// Flatten segments into a line list
pub fn segment_vertices(segments: &[Segment], color: [f32; 3]) -> Vec<ColorVertex> {
    segments
        .iter()
        .flat_map(|[a, b]| {
            [
                ColorVertex::new(a.coords.into(), color),
                ColorVertex::new(b.coords.into(), color),
            ]
        })
        .collect()
}

/// X, Y and Z axes in red, green and blue
pub fn axes_vertices(length: f32) -> Vec<ColorVertex> {
    let origin = Point3::origin();
    [
        (Vector3::x(), [1.0, 0.0, 0.0]),
        (Vector3::y(), [0.0, 1.0, 0.0]),
        (Vector3::z(), [0.0, 0.0, 1.0]),
    ]
    .into_iter()
    .flat_map(|(axis, color)| segment_vertices(&[[origin, origin + axis * length]], color))
    .collect()
}

/// Map a winit key to the viewer's key set
pub fn translate_key(key: &WinitKey) -> Key {
    match key {
        WinitKey::Named(NamedKey::ArrowRight) => Key::Right,
        WinitKey::Named(NamedKey::ArrowLeft) => Key::Left,
        WinitKey::Character(text) => key_from_text(text.as_str()),
        _ => Key::Other,
    }
}

fn key_from_text(text: &str) -> Key {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Key::Char(c),
        _ => Key::Other,
    }
}

struct Shape {
    id: String,
    vertices: Vec<ColorVertex>,
}

/// [`SceneSurface`] drawing into the 3D window
pub struct GpuSceneSurface {
    renderer: SceneRenderer,
    camera: Camera,
    /// Pose restored by the reset key
    home: Option<Camera>,
    positions: Vec<Point3<f32>>,
    shapes: Vec<Shape>,
    axes: Vec<ColorVertex>,
}

impl GpuSceneSurface {
    pub fn new(renderer: SceneRenderer, show_axes: bool) -> Self {
        let (width, height) = renderer.size();
        let mut camera = Camera::default();
        camera.set_aspect_ratio(width, height);
        let mut surface = Self {
            renderer,
            camera,
            home: None,
            positions: Vec::new(),
            shapes: Vec::new(),
            axes: if show_axes { axes_vertices(1.0) } else { Vec::new() },
        };
        surface.upload_lines();
        surface
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn reset_camera(&mut self) {
        match &self.home {
            Some(home) => {
                let aspect_ratio = self.camera.aspect_ratio;
                self.camera = home.clone();
                self.camera.aspect_ratio = aspect_ratio;
            }
            None => self.camera.reset(),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.renderer.resize(width, height);
        self.camera.set_aspect_ratio(width, height);
    }

    /// Point of the displayed cloud under `cursor`, if any
    pub fn pick(&self, cursor: Point2<f32>, radius: f32) -> Option<PointPickEvent> {
        pick_point(
            &self.positions,
            &self.camera.view_projection(),
            self.renderer.size(),
            cursor,
            radius,
        )
    }

    pub fn render(&mut self) -> Result<()> {
        self.renderer.set_view_proj(self.camera.view_projection());
        self.renderer.render()
    }

    fn add_shape(&mut self, id: &str, vertices: Vec<ColorVertex>) -> Result<()> {
        if self.shapes.iter().any(|s| s.id == id) {
            return Err(Error::Visualization(format!("shape id '{}' already exists", id)));
        }
        self.shapes.push(Shape {
            id: id.to_string(),
            vertices,
        });
        self.upload_lines();
        Ok(())
    }

    fn upload_lines(&mut self) {
        let lines: Vec<ColorVertex> = self
            .axes
            .iter()
            .chain(self.shapes.iter().flat_map(|s| s.vertices.iter()))
            .copied()
            .collect();
        self.renderer.set_lines(&lines);
    }
}

impl SceneSurface for GpuSceneSurface {
    fn update_point_cloud(&mut self, cloud: &ColoredPointCloud3f) -> Result<()> {
        self.renderer.set_points(&cloud_vertices(cloud));
        self.positions = cloud.iter().map(|p| p.position).collect();

        if self.home.is_none() && !cloud.is_empty() {
            let (min, max) = cloud.bounding_box();
            self.camera.fit_to_bounds(&min, &max);
            self.home = Some(self.camera.clone());
        }
        Ok(())
    }

    fn remove_all_shapes(&mut self) -> Result<()> {
        self.shapes.clear();
        self.upload_lines();
        Ok(())
    }

    fn add_cube(
        &mut self,
        id: &str,
        translation: &Point3<f32>,
        rotation: &UnitQuaternion<f32>,
        x: f32,
        y: f32,
        z: f32,
        style: ShapeStyle,
    ) -> Result<()> {
        let segments = cuboid_segments(translation, rotation, x, y, z);
        self.add_shape(id, segment_vertices(&segments, style.color))
    }

    fn add_text3d(
        &mut self,
        id: &str,
        text: &str,
        position: &Point3<f32>,
        euler_xyz: &Vector3<f32>,
        scale: f32,
        color: [f32; 3],
    ) -> Result<()> {
        let rotation = rotation_from_euler_xyz(euler_xyz);
        let segments = text_segments(text, position, &rotation, scale);
        self.add_shape(id, segment_vertices(&segments, color))
    }

    fn load_camera_parameters(&mut self, path: &Path) -> Result<()> {
        let aspect_ratio = self.camera.aspect_ratio;
        let mut camera = Camera::load(path)?;
        camera.aspect_ratio = aspect_ratio;
        self.home = Some(camera.clone());
        self.camera = camera;
        Ok(())
    }

    fn save_camera_parameters(&mut self, path: &Path) -> Result<()> {
        self.camera.save(path)
    }

    fn save_screenshot(&mut self, path: &Path) -> Result<()> {
        self.renderer.set_view_proj(self.camera.view_projection());
        let (width, height, pixels) = self.renderer.capture()?;
        let image = image::RgbaImage::from_raw(width, height, pixels)
            .ok_or_else(|| Error::Image("screenshot buffer has the wrong size".to_string()))?;
        image
            .save(path)
            .map_err(|e| Error::Image(format!("cannot write {}: {}", path.display(), e)))
    }
}

/// [`ImageSurface`] drawing into the image window. The window stays hidden
/// until the first image arrives and is then sized to it.
pub struct GpuImageSurface {
    renderer: ImageRenderer,
    window: Arc<Window>,
    sized: bool,
}

impl GpuImageSurface {
    pub fn new(renderer: ImageRenderer, window: Arc<Window>) -> Self {
        Self {
            renderer,
            window,
            sized: false,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.renderer.resize(width, height);
    }

    pub fn render(&mut self) -> Result<()> {
        self.renderer.render()
    }
}

impl ImageSurface for GpuImageSurface {
    fn show_image(&mut self, image: &ImageFrame) -> Result<()> {
        self.renderer.upload(image);
        if !self.sized {
            let size = PhysicalSize::new(image.width(), image.height());
            if let Some(actual) = self.window.request_inner_size(size) {
                self.renderer.resize(actual.width, actual.height);
            }
            self.window.set_visible(true);
            self.sized = true;
        }
        self.window.request_redraw();
        Ok(())
    }
}

/// Mouse state of the 3D window
#[derive(Debug, Default)]
struct PointerState {
    position: Option<PhysicalPosition<f64>>,
    left: bool,
    right: bool,
    shift: bool,
}

/// The 3D window, the optional image window and the loop driving them
pub struct SequenceWindows {
    event_loop: EventLoop<()>,
    config: WindowConfig,
    scene_window: Arc<Window>,
    scene: GpuSceneSurface,
    image: Option<GpuImageSurface>,
}

impl SequenceWindows {
    /// Open the 3D window and, when `with_image` is set, a hidden image
    /// window sharing the same GPU device.
    pub fn new(config: WindowConfig, render: RenderConfig, with_image: bool) -> Result<Self> {
        let event_loop = EventLoop::new()
            .map_err(|e| Error::Visualization(format!("Failed to create event loop: {}", e)))?;

        let scene_window = Arc::new(
            WindowBuilder::new()
                .with_title(config.scene_title.as_str())
                .with_inner_size(PhysicalSize::new(config.scene_size.0, config.scene_size.1))
                .build(&event_loop)
                .map_err(|e| Error::Visualization(format!("Failed to create window: {}", e)))?,
        );

        let instance = GpuContext::create_instance();
        let scene_surface = instance
            .create_surface(scene_window.clone())
            .map_err(|e| Error::Gpu(format!("Failed to create surface: {}", e)))?;
        let gpu = Arc::new(pollster::block_on(GpuContext::new(
            instance,
            Some(&scene_surface),
        ))?);

        let size = scene_window.inner_size();
        let renderer = SceneRenderer::new(gpu.clone(), scene_surface, size.width, size.height, render)?;
        let scene = GpuSceneSurface::new(renderer, config.show_axes);

        let image = if with_image {
            let window = Arc::new(
                WindowBuilder::new()
                    .with_title(config.image_title.as_str())
                    .with_inner_size(PhysicalSize::new(config.image_size.0, config.image_size.1))
                    .with_visible(false)
                    .build(&event_loop)
                    .map_err(|e| Error::Visualization(format!("Failed to create window: {}", e)))?,
            );
            let surface = gpu
                .instance
                .create_surface(window.clone())
                .map_err(|e| Error::Gpu(format!("Failed to create surface: {}", e)))?;
            let size = window.inner_size();
            let renderer = ImageRenderer::new(gpu.clone(), surface, size.width, size.height)?;
            Some(GpuImageSurface::new(renderer, window))
        } else {
            None
        };

        Ok(Self {
            event_loop,
            config,
            scene_window,
            scene,
            image,
        })
    }

    /// Surfaces for calls made outside the event loop, such as startup
    pub fn targets(&mut self) -> RenderTargets<'_> {
        RenderTargets::new(
            &mut self.scene,
            self.image.as_mut().map(|i| i as &mut dyn ImageSurface),
        )
    }

    pub fn scene_mut(&mut self) -> &mut GpuSceneSurface {
        &mut self.scene
    }

    /// Run until the 3D window is closed
    pub fn run<H: ViewerHandler>(self, mut handler: H) -> Result<()> {
        let Self {
            event_loop,
            config,
            scene_window,
            mut scene,
            mut image,
        } = self;

        let scene_id = scene_window.id();
        let image_window = image.as_ref().map(|i| i.window.clone());
        let image_id = image_window.as_ref().map(|w| w.id());
        let mut pointer = PointerState::default();

        info!("viewer running; Right/Left switch frames, c saves the camera, i saves a screenshot");
        scene_window.request_redraw();

        event_loop
            .run(move |event, target| {
                target.set_control_flow(ControlFlow::wait_duration(config.poll_interval));

                let (window_id, event) = match event {
                    Event::WindowEvent { window_id, event } => (window_id, event),
                    _ => return,
                };

                if Some(window_id) == image_id {
                    match event {
                        WindowEvent::CloseRequested => {
                            if let Some(window) = &image_window {
                                window.set_visible(false);
                            }
                        }
                        WindowEvent::Resized(size) => {
                            if let Some(surface) = image.as_mut() {
                                surface.resize(size.width, size.height);
                            }
                        }
                        WindowEvent::RedrawRequested => {
                            if let Some(Err(e)) = image.as_mut().map(GpuImageSurface::render) {
                                error!("Image render error: {}", e);
                            }
                        }
                        _ => {}
                    }
                    return;
                }
                if window_id != scene_id {
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => {
                        target.exit();
                    }
                    WindowEvent::Resized(size) => {
                        scene.resize(size.width, size.height);
                        scene_window.request_redraw();
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        let pressed = event.state == ElementState::Pressed;
                        if let PhysicalKey::Code(KeyCode::ShiftLeft | KeyCode::ShiftRight) =
                            event.physical_key
                        {
                            pointer.shift = pressed;
                        }

                        let key = translate_key(&event.logical_key);
                        if pressed && key == Key::Char('r') {
                            scene.reset_camera();
                        } else if key != Key::Other {
                            let mut targets = RenderTargets::new(
                                &mut scene,
                                image.as_mut().map(|i| i as &mut dyn ImageSurface),
                            );
                            handler.on_key(&KeyEvent { key, pressed }, &mut targets);
                        }
                        scene_window.request_redraw();
                    }
                    WindowEvent::MouseInput { state, button, .. } => {
                        let pressed = state == ElementState::Pressed;
                        match button {
                            MouseButton::Left if pressed && pointer.shift => {
                                if let Some(position) = pointer.position {
                                    let cursor = Point2::new(position.x as f32, position.y as f32);
                                    match scene.pick(cursor, config.pick_radius) {
                                        Some(picked) => handler.on_point_pick(&picked),
                                        None => debug!("no point under the cursor"),
                                    }
                                }
                            }
                            MouseButton::Left => pointer.left = pressed,
                            MouseButton::Right => pointer.right = pressed,
                            _ => {}
                        }
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        if let Some(last) = pointer.position {
                            let dx = (position.x - last.x) as f32;
                            let dy = (position.y - last.y) as f32;
                            if pointer.left {
                                scene.camera_mut().orbit(dx * 0.01, dy * 0.01);
                                scene_window.request_redraw();
                            } else if pointer.right {
                                scene.camera_mut().pan(dx * 0.001, dy * 0.001);
                                scene_window.request_redraw();
                            }
                        }
                        pointer.position = Some(position);
                    }
                    WindowEvent::MouseWheel { delta, .. } => {
                        let scroll = match delta {
                            MouseScrollDelta::LineDelta(_, y) => y,
                            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                        };
                        scene.camera_mut().zoom(scroll * 0.1);
                        scene_window.request_redraw();
                    }
                    WindowEvent::RedrawRequested => {
                        if let Err(e) = scene.render() {
                            error!("Render error: {}", e);
                        }
                    }
                    _ => {}
                }
            })
            .map_err(|e| Error::Visualization(format!("Event loop error: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcdseq_core::{ColoredPoint3f, PointCloud};

    #[test]
    fn test_cloud_vertices_carry_color() {
        let cloud = PointCloud::from_points(vec![
            ColoredPoint3f::new(Point3::new(1.0, 2.0, 3.0), [255, 0, 0]),
            ColoredPoint3f::new(Point3::new(-1.0, 0.0, 0.5), [0, 0, 255]),
        ]);
        let vertices = cloud_vertices(&cloud);
        assert_eq!(vertices.len(), 2);
        assert_eq!(vertices[0].position, [1.0, 2.0, 3.0]);
        assert_eq!(vertices[0].color, [1.0, 0.0, 0.0]);
        assert_eq!(vertices[1].color, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_segment_vertices_pairs() {
        let segments = cuboid_segments(&Point3::origin(), &UnitQuaternion::identity(), 1.0, 1.0, 1.0);
        let vertices = segment_vertices(&segments, [0.5, 0.5, 0.5]);
        assert_eq!(vertices.len(), 24);
        assert!(vertices.iter().all(|v| v.color == [0.5, 0.5, 0.5]));
    }

    #[test]
    fn test_axes() {
        let axes = axes_vertices(2.0);
        assert_eq!(axes.len(), 6);
        assert_eq!(axes[1].position, [2.0, 0.0, 0.0]);
        assert_eq!(axes[3].position, [0.0, 2.0, 0.0]);
        assert_eq!(axes[5].color, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_translate_key() {
        assert_eq!(translate_key(&WinitKey::Named(NamedKey::ArrowRight)), Key::Right);
        assert_eq!(translate_key(&WinitKey::Named(NamedKey::ArrowLeft)), Key::Left);
        assert_eq!(translate_key(&WinitKey::Named(NamedKey::Escape)), Key::Other);
        assert_eq!(key_from_text("c"), Key::Char('c'));
        assert_eq!(key_from_text("ab"), Key::Other);
        assert_eq!(key_from_text(""), Key::Other);
    }

    #[test]
    fn test_poll_interval_is_clamped() {
        let config = WindowConfig::default().with_poll_interval_ms(5);
        assert_eq!(config.poll_interval, Duration::from_millis(30));
        let config = WindowConfig::default().with_poll_interval_ms(500);
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        let config = WindowConfig::default().with_poll_interval_ms(50);
        assert_eq!(config.poll_interval, Duration::from_millis(50));
    }
}
