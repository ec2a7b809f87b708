use image::{imageops, RgbaImage};

use super::{FontBook, RenderResult, Surface};
use crate::editor::shapes::{Annotation, Shape};
use crate::geometry::{Point, Rect, Vector};

/// Flattened base image plus shapes, with the image-space position of its top-left pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    pub image: RgbaImage,
    pub origin: Point,
}

/// Union of the base image rectangle and every shape's bounds.
pub fn composite_bounds(image: &RgbaImage, shapes: &[Annotation]) -> Rect {
    let image_rect = Rect::new(0.0, 0.0, f64::from(image.width()), f64::from(image.height()));
    shapes
        .iter()
        .map(Shape::bounds)
        .fold(image_rect, Rect::union)
}

/// Paints the base image then every shape in list order, without selection decoration.
///
/// The output grows past the image edge to keep shapes that overhang it.
pub fn render(
    image: &RgbaImage,
    shapes: &[Annotation],
    fonts: Option<&FontBook>,
) -> RenderResult<Composite> {
    let bounds = composite_bounds(image, shapes);
    let left = bounds.left().floor();
    let top = bounds.top().floor();
    let width = (bounds.right().ceil() - left).max(1.0) as u32;
    let height = (bounds.bottom().ceil() - top).max(1.0) as u32;

    let mut surface = Surface::new(width, height)?
        .with_offset(Vector::new(-left, -top))
        .with_fonts(fonts.cloned());
    surface.draw_image(image, Point::new(0.0, 0.0))?;
    for shape in shapes {
        shape.render(&mut surface, false)?;
    }

    tracing::debug!(width, height, shapes = shapes.len(), "composite rendered");
    Ok(Composite {
        image: surface.into_image()?,
        origin: Point::new(left, top),
    })
}

/// Composite cropped to `rect` (image space), clamped to the composite and at least 1x1.
pub fn render_region(
    image: &RgbaImage,
    shapes: &[Annotation],
    fonts: Option<&FontBook>,
    rect: Rect,
) -> RenderResult<RgbaImage> {
    let composite = render(image, shapes, fonts)?;
    let (width, height) = composite.image.dimensions();

    let x = clamp_pixel(rect.x - composite.origin.x, width - 1);
    let y = clamp_pixel(rect.y - composite.origin.y, height - 1);
    let crop_width = clamp_pixel(rect.width, width - x).max(1);
    let crop_height = clamp_pixel(rect.height, height - y).max(1);

    Ok(imageops::crop_imm(&composite.image, x, y, crop_width, crop_height).to_image())
}

fn clamp_pixel(value: f64, max: u32) -> u32 {
    (value.round().max(0.0) as u32).min(max)
}
