use std::path::PathBuf;

use crate::capture::CaptureError;
use crate::clipboard::ClipboardError;
use crate::editor::EditError;
use crate::render::RenderError;
use crate::state::StateError;
use crate::storage::ProjectError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Project(#[from] ProjectError),
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error("failed to write {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
