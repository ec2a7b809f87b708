use std::path::{Path, PathBuf};

use image::RgbaImage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to decode captured image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("captured image {path} is empty")]
    EmptyImage { path: PathBuf },
    #[error("capture unavailable: {message}")]
    Unavailable { message: String },
}

pub type CaptureResult<T> = std::result::Result<T, CaptureError>;

/// Source of a freshly captured base raster.
pub trait CaptureProvider {
    fn capture(&self) -> CaptureResult<RgbaImage>;
}

/// Reads a screenshot some other tool already wrote to disk.
#[derive(Debug, Clone)]
pub struct FileCapture {
    path: PathBuf,
}

impl FileCapture {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CaptureProvider for FileCapture {
    fn capture(&self) -> CaptureResult<RgbaImage> {
        let image = image::open(&self.path)
            .map_err(|source| CaptureError::Decode {
                path: self.path.clone(),
                source,
            })?
            .to_rgba8();
        if image.width() == 0 || image.height() == 0 {
            return Err(CaptureError::EmptyImage {
                path: self.path.clone(),
            });
        }
        tracing::debug!(path = ?self.path, width = image.width(), height = image.height(), "capture loaded");
        Ok(image)
    }
}
