//! Command-line arguments

use clap::Parser;
use pcdseq_gpu::RenderConfig;
use pcdseq_visualization::{SequenceConfig, WindowConfig};
use std::path::PathBuf;

/// Step through a sequence of PCD frames with paired images and box annotations.
///
/// Right/Left switch frames, c saves the camera pose, i saves a screenshot,
/// shift + click picks a point, r resets the camera.
#[derive(Parser, Debug)]
#[command(name = "pcdseq-viewer", version, about)]
pub struct Args {
    /// A point cloud file or a directory of point cloud files
    pub source: PathBuf,

    /// Directory of images named after the frames, or a single image
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Directory of JSON annotations named after the frames, or a single file
    #[arg(long)]
    pub annotation: Option<PathBuf>,

    /// Camera parameter file to load at startup
    #[arg(long)]
    pub camera: Option<PathBuf>,

    /// Where the c key saves the camera parameters
    #[arg(long, default_value = "camera_params.json")]
    pub camera_save: PathBuf,

    /// Where the i key saves the screenshot
    #[arg(long, default_value = "screenshot.png")]
    pub screenshot: PathBuf,

    /// Extension of the point cloud files
    #[arg(long, default_value = ".pcd")]
    pub extension: String,

    /// Extension of the paired images
    #[arg(long, default_value = ".png")]
    pub image_extension: String,

    /// Rendered point size in pixels
    #[arg(long, default_value_t = 4.0)]
    pub point_size: f32,

    /// Event loop poll interval in milliseconds (30 to 100)
    #[arg(long, default_value_t = 100)]
    pub poll_ms: u64,
}

impl Args {
    pub fn sequence_config(&self) -> SequenceConfig {
        SequenceConfig {
            image_root: self.image.clone(),
            annotation_root: self.annotation.clone(),
            camera_save_path: self.camera_save.clone(),
            screenshot_path: self.screenshot.clone(),
            image_extension: self.image_extension.clone(),
            ..SequenceConfig::default()
        }
    }

    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            point_size: self.point_size,
            ..RenderConfig::default()
        }
    }

    pub fn window_config(&self) -> WindowConfig {
        WindowConfig::default().with_poll_interval_ms(self.poll_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["pcdseq-viewer", "clouds/"]).unwrap();
        assert_eq!(args.source, Path::new("clouds/"));
        assert!(args.image.is_none());
        assert!(args.annotation.is_none());
        assert!(args.camera.is_none());

        let config = args.sequence_config();
        assert_eq!(config.camera_save_path, Path::new("camera_params.json"));
        assert_eq!(config.screenshot_path, Path::new("screenshot.png"));
        assert_eq!(config.image_extension, ".png");
        assert_eq!(args.extension, ".pcd");
        assert_eq!(args.render_config().point_size, 4.0);
        assert_eq!(args.window_config().poll_interval, Duration::from_millis(100));
    }

    #[test]
    fn test_overrides() {
        let args = Args::try_parse_from([
            "pcdseq-viewer",
            "frames",
            "--image",
            "images",
            "--annotation",
            "labels",
            "--camera",
            "cam.json",
            "--camera-save",
            "out.json",
            "--image-extension",
            ".jpg",
            "--point-size",
            "2.5",
            "--poll-ms",
            "30",
        ])
        .unwrap();

        let config = args.sequence_config();
        assert_eq!(config.image_root.as_deref(), Some(Path::new("images")));
        assert_eq!(config.annotation_root.as_deref(), Some(Path::new("labels")));
        assert_eq!(config.camera_save_path, Path::new("out.json"));
        assert_eq!(config.image_extension, ".jpg");
        assert_eq!(args.camera.as_deref(), Some(Path::new("cam.json")));
        assert_eq!(args.render_config().point_size, 2.5);
        assert_eq!(args.window_config().poll_interval, Duration::from_millis(30));
    }

    #[test]
    fn test_source_is_required() {
        assert!(Args::try_parse_from(["pcdseq-viewer"]).is_err());
    }
}
