//! Sequence controller
//!
//! Owns the frame catalog and the per-frame synchronization of the point
//! cloud, its companion image and its box annotations. Every navigation
//! reloads the whole frame; nothing is cached between frames.

use crate::surface::{
    Key, KeyEvent, PointPickEvent, RenderTargets, ShapeStyle, ViewerHandler,
};
use log::{error, info, warn};
use pcdseq_core::{BoundingBox3D, Error, Result};
use pcdseq_io::{
    companion_path, load_annotations, load_image, read_point_cloud, FrameCatalog,
    ANNOTATION_EXTENSION,
};
use std::path::{Path, PathBuf};

/// Direction of a navigation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

impl Direction {
    fn delta(self) -> isize {
        match self {
            Direction::Next => 1,
            Direction::Previous => -1,
        }
    }
}

/// Controller lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceState {
    /// No frame shown yet
    Idle,
    /// A frame has been shown; `index` is the catalog cursor
    Viewing { index: usize },
}

/// Where companion files live and how frames are drawn
#[derive(Debug, Clone)]
pub struct SequenceConfig {
    /// Directory of per-frame images, or a single image shown for every frame
    pub image_root: Option<PathBuf>,
    /// Directory of per-frame annotation files, or a single file
    pub annotation_root: Option<PathBuf>,
    pub camera_save_path: PathBuf,
    pub screenshot_path: PathBuf,
    pub image_extension: String,
    pub point_color: [u8; 3],
    pub box_color: [f32; 3],
    pub label_color: [f32; 3],
    pub label_scale: f32,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            image_root: None,
            annotation_root: None,
            camera_save_path: PathBuf::from("camera_params.json"),
            screenshot_path: PathBuf::from("screenshot.png"),
            image_extension: ".png".to_string(),
            point_color: [48, 48, 48],
            box_color: [1.0, 0.0, 0.0],
            label_color: [0.0, 0.0, 0.0],
            label_scale: 1.0,
        }
    }
}

/// Outcome of loading one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub index: usize,
    pub path: PathBuf,
    pub points: usize,
    pub image_shown: bool,
    pub boxes: usize,
    /// Degraded assets, one message each
    pub warnings: Vec<String>,
}

/// Drives frame navigation and keeps the surfaces in sync with the catalog
pub struct SequenceController {
    catalog: FrameCatalog,
    config: SequenceConfig,
    state: SequenceState,
    boxes: Vec<BoundingBox3D>,
    last_pick: Option<PointPickEvent>,
}

impl SequenceController {
    /// Create a controller over a non-empty catalog
    pub fn new(catalog: FrameCatalog, config: SequenceConfig) -> Result<Self> {
        if catalog.is_empty() {
            return Err(Error::EmptyCatalog);
        }
        Ok(Self {
            catalog,
            config,
            state: SequenceState::Idle,
            boxes: Vec::new(),
            last_pick: None,
        })
    }

    pub fn state(&self) -> SequenceState {
        self.state
    }

    pub fn catalog(&self) -> &FrameCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }

    /// Boxes of the most recently loaded frame
    pub fn boxes(&self) -> &[BoundingBox3D] {
        &self.boxes
    }

    pub fn last_pick(&self) -> Option<&PointPickEvent> {
        self.last_pick.as_ref()
    }

    /// Show the first frame. Failing here leaves the controller idle and
    /// the caller is expected to abort.
    pub fn start(&mut self, targets: &mut RenderTargets<'_>) -> Result<FrameReport> {
        if self.state != SequenceState::Idle {
            return Err(Error::Visualization("sequence already started".to_string()));
        }
        let report = self.load_frame(0, targets)?;
        self.state = SequenceState::Viewing { index: 0 };
        Ok(report)
    }

    /// Load frame `index` and push it to the surfaces.
    ///
    /// The catalog cursor moves to `index` before loading. When the cloud
    /// cannot be read the surfaces keep the previous frame and the error is
    /// returned; missing or broken companion files only add warnings.
    pub fn load_frame(
        &mut self,
        index: usize,
        targets: &mut RenderTargets<'_>,
    ) -> Result<FrameReport> {
        let path = self
            .catalog
            .get(index)
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                Error::InvalidData(format!(
                    "frame index {} out of range for {} frame(s)",
                    index,
                    self.catalog.len()
                ))
            })?;
        self.catalog.set_current(index)?;
        if let SequenceState::Viewing { .. } = self.state {
            self.state = SequenceState::Viewing { index };
        }

        let cloud = match read_point_cloud(&path) {
            Ok(cloud) => cloud,
            Err(e) => {
                error!("cannot load point cloud {}: {}", path.display(), e);
                return Err(e);
            }
        };
        let cloud = cloud.recolored(self.config.point_color);

        let mut warnings = Vec::new();
        let image = self.config.image_root.as_deref().and_then(|root| {
            let image_path = companion_path(root, &path, &self.config.image_extension);
            match load_image(&image_path) {
                Ok(image) => Some(image),
                Err(e) => {
                    let message = format!("image {} not shown: {}", image_path.display(), e);
                    warn!("{}", message);
                    warnings.push(message);
                    None
                }
            }
        });

        let boxes = match self.config.annotation_root.as_deref() {
            Some(root) => {
                let annotation_path = companion_path(root, &path, ANNOTATION_EXTENSION);
                info!("loading : {}", annotation_path.display());
                load_annotations(&annotation_path).unwrap_or_else(|e| {
                    let message = format!(
                        "annotations {} not shown: {}",
                        annotation_path.display(),
                        e
                    );
                    warn!("{}", message);
                    warnings.push(message);
                    Vec::new()
                })
            }
            None => Vec::new(),
        };

        targets.scene.remove_all_shapes()?;
        targets.scene.update_point_cloud(&cloud)?;

        let mut image_shown = false;
        if let (Some(image), Some(surface)) = (image.as_ref(), targets.image.as_mut()) {
            match surface.show_image(image) {
                Ok(()) => image_shown = true,
                Err(e) => {
                    let message = format!("image window not updated: {}", e);
                    warn!("{}", message);
                    warnings.push(message);
                }
            }
        }

        for bbox in &boxes {
            if let Err(e) = self.draw_box(bbox, targets) {
                let message = format!("box '{}' not drawn: {}", bbox.id, e);
                warn!("{}", message);
                warnings.push(message);
            }
        }

        info!(
            "frame {}/{}: {} ({} points, {} boxes)",
            index + 1,
            self.catalog.len(),
            path.display(),
            cloud.len(),
            boxes.len()
        );

        let report = FrameReport {
            index,
            path,
            points: cloud.len(),
            image_shown,
            boxes: boxes.len(),
            warnings,
        };
        self.boxes = boxes;
        Ok(report)
    }

    /// Step one frame forward or back, wrapping at the ends. A single-frame
    /// sequence never reloads and reports `Ok(None)`.
    pub fn navigate(
        &mut self,
        direction: Direction,
        targets: &mut RenderTargets<'_>,
    ) -> Result<Option<FrameReport>> {
        if self.catalog.len() == 1 {
            info!("only one frame is loaded; the cloud shown will not change");
            return Ok(None);
        }
        let current = match self.state {
            SequenceState::Viewing { index } => index,
            SequenceState::Idle => {
                return Err(Error::Visualization(
                    "cannot navigate before the first frame is shown".to_string(),
                ))
            }
        };

        let next = self.catalog.advance(current, direction.delta())?;
        info!("toggle cloud shown to : {}", self.catalog.files()[next].display());
        self.load_frame(next, targets).map(Some)
    }

    /// Write the current camera pose to the configured path
    pub fn save_camera_pose(&self, targets: &mut RenderTargets<'_>) -> Result<()> {
        targets
            .scene
            .save_camera_parameters(&self.config.camera_save_path)?;
        info!("camera parameters saved to {}", self.config.camera_save_path.display());
        Ok(())
    }

    /// Write the 3D window contents to the configured path
    pub fn save_screenshot(&self, targets: &mut RenderTargets<'_>) -> Result<()> {
        targets.scene.save_screenshot(&self.config.screenshot_path)?;
        info!("screenshot saved to {}", self.config.screenshot_path.display());
        Ok(())
    }

    /// Restore a camera pose saved earlier. Failure only warns.
    pub fn load_camera_pose(&self, path: &Path, targets: &mut RenderTargets<'_>) -> bool {
        match targets.scene.load_camera_parameters(path) {
            Ok(()) => {
                info!("camera parameters loaded from {}", path.display());
                true
            }
            Err(e) => {
                warn!("cannot load camera parameters {}: {}", path.display(), e);
                false
            }
        }
    }

    pub fn on_point_picked(&mut self, event: &PointPickEvent) {
        info!(
            "picked point {}: ({}, {}, {})",
            event.index, event.point.x, event.point.y, event.point.z
        );
        self.last_pick = Some(*event);
    }

    fn draw_box(&self, bbox: &BoundingBox3D, targets: &mut RenderTargets<'_>) -> Result<()> {
        // Depth runs along the cube's y extent and height along z
        targets.scene.add_cube(
            &bbox.id,
            &bbox.translation,
            &bbox.rotation,
            bbox.width,
            bbox.depth,
            bbox.height,
            ShapeStyle::wireframe(self.config.box_color),
        )?;
        targets.scene.add_text3d(
            &format!("{}_text", bbox.id),
            &bbox.id,
            &bbox.translation,
            &bbox.euler_angles(),
            self.config.label_scale,
            self.config.label_color,
        )
    }
}

impl ViewerHandler for SequenceController {
    fn on_key(&mut self, event: &KeyEvent, targets: &mut RenderTargets<'_>) {
        if !event.pressed {
            return;
        }
        let result = match event.key {
            Key::Right => self.navigate(Direction::Next, targets).map(|_| ()),
            Key::Left => self.navigate(Direction::Previous, targets).map(|_| ()),
            Key::Char('c') => self.save_camera_pose(targets),
            Key::Char('i') => self.save_screenshot(targets),
            _ => Ok(()),
        };
        if let Err(e) = result {
            error!("{}", e);
        }
    }

    fn on_point_pick(&mut self, event: &PointPickEvent) {
        self.on_point_picked(event);
    }
}
