use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Cursor;

use image::{ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::ShapeRecord;

/// Clipboard format name of the structured single-shape channel.
pub const SINGLE_SHAPE_FORMAT: &str = "annotator-single-shape";

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("invalid shape payload on the clipboard: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("failed to encode clipboard image: {0}")]
    Encode(#[from] image::ImageError),
    #[error("clipboard unavailable: {message}")]
    Unavailable { message: String },
}

pub type ClipboardResult<T> = std::result::Result<T, ClipboardError>;

/// Structured and raster channels of the system clipboard.
pub trait ClipboardBackend {
    fn set_data(&self, format: &str, payload: String) -> ClipboardResult<()>;
    fn data(&self, format: &str) -> ClipboardResult<Option<String>>;
    fn set_png(&self, png: Vec<u8>) -> ClipboardResult<()>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SingleShapePayload {
    shape: ShapeRecord,
}

pub fn copy_shape<B: ClipboardBackend + ?Sized>(
    backend: &B,
    record: ShapeRecord,
) -> ClipboardResult<()> {
    let payload = serde_json::to_string(&SingleShapePayload { shape: record })?;
    backend.set_data(SINGLE_SHAPE_FORMAT, payload)
}

/// Shape record on the structured channel, or `None` when the clipboard holds none.
pub fn paste_shape<B: ClipboardBackend + ?Sized>(backend: &B) -> ClipboardResult<Option<ShapeRecord>> {
    let Some(payload) = backend.data(SINGLE_SHAPE_FORMAT)? else {
        return Ok(None);
    };
    let SingleShapePayload { shape } = serde_json::from_str(&payload)?;
    Ok(Some(shape))
}

pub fn copy_image<B: ClipboardBackend + ?Sized>(backend: &B, image: &RgbaImage) -> ClipboardResult<()> {
    let mut png = Cursor::new(Vec::new());
    image.write_to(&mut png, ImageFormat::Png)?;
    backend.set_png(png.into_inner())
}

/// Process-local clipboard used by the CLI and tests.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    data: RefCell<HashMap<String, String>>,
    png: RefCell<Option<Vec<u8>>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(&self) -> ClipboardResult<Option<RgbaImage>> {
        self.png
            .borrow()
            .as_deref()
            .map(|bytes| Ok(image::load_from_memory(bytes)?.to_rgba8()))
            .transpose()
    }
}

impl ClipboardBackend for MemoryClipboard {
    fn set_data(&self, format: &str, payload: String) -> ClipboardResult<()> {
        self.data.borrow_mut().insert(format.to_string(), payload);
        Ok(())
    }

    fn data(&self, format: &str) -> ClipboardResult<Option<String>> {
        Ok(self.data.borrow().get(format).cloned())
    }

    fn set_png(&self, png: Vec<u8>) -> ClipboardResult<()> {
        *self.png.borrow_mut() = Some(png);
        Ok(())
    }
}
