//! Annotation editing: shapes, handles, overlays, destructive region edits and the canvas controller.

pub mod canvas;
pub mod handles;
pub mod overlay;
pub mod region;
pub mod shapes;
pub mod tool;

use thiserror::Error;

use crate::clipboard::ClipboardError;
use crate::geometry::Rect;
use crate::render::RenderError;
use crate::storage::ProjectError;

pub use canvas::{Canvas, CanvasResponse, EditorDefaults, TextEditorRequest};
pub use overlay::{SelectorRectangle, TrimRectangle};
pub use region::{CutAxis, StripCut};
pub use tool::{ToolKind, ToolOptionVisibility};

pub type EditResult<T> = std::result::Result<T, EditError>;

#[derive(Debug, Error)]
pub enum EditError {
    #[error("region {rect:?} does not overlap the image")]
    RegionOutsideImage { rect: Rect },
    #[error("strip of {size}px is too small to remove")]
    StripTooSmall { size: f64 },
    #[error("strip of {size}px would consume the whole {extent}px image")]
    StripConsumesImage { size: f64, extent: u32 },
    #[error("no selector region is active")]
    NoSelector,
    #[error("no trim is in progress")]
    NoActiveTrim,
    #[error("image of {width}x{height} is too small to trim")]
    ImageTooSmall { width: u32, height: u32 },
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
    #[error(transparent)]
    Project(#[from] ProjectError),
}
