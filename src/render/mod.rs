//! Raster output: drawing surfaces, fonts and the flattening compositor.

mod compositor;
mod fonts;
mod surface;

use thiserror::Error;

pub use compositor::{composite_bounds, render, render_region, Composite};
pub use fonts::FontBook;
#[cfg(test)]
pub(crate) use fonts::bundled_test_fonts;
pub use surface::{Surface, TextLayout, TextStyle};

pub type RenderResult<T> = std::result::Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cannot allocate a {width}x{height} surface")]
    SurfaceAllocation { width: u32, height: u32 },
    #[error("surface pixels could not be read back into an image")]
    SurfaceReadback,
}
