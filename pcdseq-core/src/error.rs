//! Error types for pcdseq

use thiserror::Error;

/// Main error type for pcdseq operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Cannot load point cloud {path}: {reason}")]
    Load { path: String, reason: String },

    #[error("Catalog is empty")]
    EmptyCatalog,

    #[error("Annotation error: {0}")]
    Annotation(String),

    #[error("Image error: {0}")]
    Image(String),

    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("Visualization error: {0}")]
    Visualization(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl Error {
    /// Wrap any error raised while reading a point cloud file
    pub fn load(path: impl AsRef<std::path::Path>, reason: impl std::fmt::Display) -> Self {
        Error::Load {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for pcdseq operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(feature = "gpu")]
impl From<wgpu::BufferAsyncError> for Error {
    fn from(e: wgpu::BufferAsyncError) -> Self {
        Error::Gpu(e.to_string())
    }
}

#[cfg(feature = "gpu")]
impl From<wgpu::SurfaceError> for Error {
    fn from(e: wgpu::SurfaceError) -> Self {
        Error::Gpu(format!("surface error: {}", e))
    }
}
