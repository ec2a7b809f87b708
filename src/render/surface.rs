use ab_glyph::PxScale;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use tiny_skia::{
    FillRule, LineCap, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, StrokeDash, Transform,
};

use super::fonts::FontBook;
use super::{RenderError, RenderResult};
use crate::geometry::{Color, Point, Rect, Vector};

const TEXT_LINE_SPACING: f32 = 1.2;

/// Horizontal/vertical layout of a centered text block inside a rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextLayout {
    pub padding: f64,
    pub min_wrap_width: f64,
}

/// Style of a text run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
    pub color: Color,
}

/// Raster drawing target for shapes. All coordinates are in image space and
/// shifted by the surface offset before hitting pixels.
pub struct Surface {
    pixmap: Pixmap,
    offset: Vector,
    fonts: Option<FontBook>,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        let pixmap = Pixmap::new(width.max(1), height.max(1))
            .ok_or(RenderError::SurfaceAllocation { width, height })?;
        Ok(Self {
            pixmap,
            offset: Vector::new(0.0, 0.0),
            fonts: None,
        })
    }

    pub fn with_offset(mut self, offset: Vector) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_fonts(mut self, fonts: Option<FontBook>) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    fn transform(&self) -> Transform {
        Transform::from_translate(self.offset.dx as f32, self.offset.dy as f32)
    }

    pub fn draw_image(&mut self, image: &RgbaImage, at: Point) -> RenderResult<()> {
        self.draw_image_with_opacity(image, at, 1.0)
    }

    pub fn draw_image_with_opacity(
        &mut self,
        image: &RgbaImage,
        at: Point,
        opacity: f32,
    ) -> RenderResult<()> {
        let source = pixmap_from_image(image)?;
        let paint = PixmapPaint {
            opacity,
            ..PixmapPaint::default()
        };
        let transform = self.transform().pre_translate(at.x as f32, at.y as f32);
        self.pixmap
            .draw_pixmap(0, 0, source.as_ref(), &paint, transform, None);
        Ok(())
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let Some(rect) = skia_rect(rect) else {
            return;
        };
        let paint = paint_for(color);
        let transform = self.transform();
        self.pixmap.fill_rect(rect, &paint, transform, None);
    }

    pub fn stroke_rect(&mut self, rect: Rect, color: Color, width: f64) {
        self.stroke_rect_with_dash(rect, color, width, None);
    }

    pub fn stroke_dashed_rect(&mut self, rect: Rect, color: Color, width: f64, dash: f64) {
        self.stroke_rect_with_dash(rect, color, width, Some(dash));
    }

    fn stroke_rect_with_dash(&mut self, rect: Rect, color: Color, width: f64, dash: Option<f64>) {
        let Some(rect) = skia_rect(rect) else {
            return;
        };
        let path = PathBuilder::from_rect(rect);
        let stroke = Stroke {
            width: width as f32,
            dash: dash.and_then(|dash| StrokeDash::new(vec![dash as f32, dash as f32], 0.0)),
            ..Stroke::default()
        };
        let paint = paint_for(color);
        let transform = self.transform();
        self.pixmap
            .stroke_path(&path, &paint, &stroke, transform, None);
    }

    pub fn fill_rounded_rect(&mut self, rect: Rect, radius: f64, color: Color) {
        let Some(path) = rounded_rect_path(rect, radius) else {
            return;
        };
        let paint = paint_for(color);
        let transform = self.transform();
        self.pixmap
            .fill_path(&path, &paint, FillRule::Winding, transform, None);
    }

    pub fn stroke_rounded_rect(&mut self, rect: Rect, radius: f64, color: Color, width: f64) {
        let Some(path) = rounded_rect_path(rect, radius) else {
            return;
        };
        let stroke = Stroke {
            width: width as f32,
            ..Stroke::default()
        };
        let paint = paint_for(color);
        let transform = self.transform();
        self.pixmap
            .stroke_path(&path, &paint, &stroke, transform, None);
    }

    /// Strokes a line with round caps.
    pub fn stroke_line(&mut self, from: Point, to: Point, color: Color, width: f64) {
        let mut builder = PathBuilder::new();
        builder.move_to(from.x as f32, from.y as f32);
        builder.line_to(to.x as f32, to.y as f32);
        let Some(path) = builder.finish() else {
            return;
        };
        let stroke = Stroke {
            width: width as f32,
            line_cap: LineCap::Round,
            ..Stroke::default()
        };
        let paint = paint_for(color);
        let transform = self.transform();
        self.pixmap
            .stroke_path(&path, &paint, &stroke, transform, None);
    }

    pub fn fill_polygon(&mut self, points: &[Point], color: Color) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        let mut builder = PathBuilder::new();
        builder.move_to(first.x as f32, first.y as f32);
        for point in rest {
            builder.line_to(point.x as f32, point.y as f32);
        }
        builder.close();
        let Some(path) = builder.finish() else {
            return;
        };
        let paint = paint_for(color);
        let transform = self.transform();
        self.pixmap
            .fill_path(&path, &paint, FillRule::Winding, transform, None);
    }

    /// Square handle marker centered on `center`.
    pub fn draw_handle(&mut self, center: Point, size: f64, fill: Color, outline: Option<Color>) {
        let rect = Rect::new(center.x - size / 2.0, center.y - size / 2.0, size, size);
        self.fill_rect(rect, fill);
        if let Some(outline) = outline {
            self.stroke_rect(rect, outline, 1.0);
        }
    }

    /// Word-wrapped, horizontally and vertically centered text inside `rect`.
    ///
    /// Silently does nothing when no font is available.
    pub fn draw_text_block(&mut self, rect: Rect, text: &str, style: TextStyle, layout: TextLayout) {
        if text.trim().is_empty() {
            return;
        }
        let Some(fonts) = self.fonts.as_ref() else {
            return;
        };
        let font = fonts.face(style.bold, style.italic).clone();
        let scale = PxScale::from(style.size.max(1.0) as f32);

        let max_width = layout
            .min_wrap_width
            .max(rect.width - layout.padding * 2.0)
            .max(1.0) as u32;
        let lines = wrap_text(text, max_width, |line| text_size(scale, &font, line).0);
        let line_height = (scale.y * TEXT_LINE_SPACING).ceil() as i32;
        let block_height = line_height * lines.len() as i32;

        let device = rect.translate(self.offset);
        let Some(region) = device_region(&device, self.pixmap.width(), self.pixmap.height())
        else {
            return;
        };
        let (region_x, region_y, region_width, region_height) = region;

        let mut canvas = self.read_region(region);
        let color = Rgba([style.color.r, style.color.g, style.color.b, style.color.a]);
        let top = (device.y + (device.height - f64::from(block_height)) / 2.0).round() as i32;
        for (index, line) in lines.iter().enumerate() {
            let (line_width, _) = text_size(scale, &font, line);
            let left = (device.center().x - f64::from(line_width) / 2.0).round() as i32;
            draw_text_mut(
                &mut canvas,
                color,
                left - region_x as i32,
                top + line_height * index as i32 - region_y as i32,
                scale,
                &font,
                line,
            );
        }
        self.write_region(region_x, region_y, region_width, region_height, &canvas);
    }

    fn read_region(&self, region: (u32, u32, u32, u32)) -> RgbaImage {
        let (x, y, width, height) = region;
        let stride = self.pixmap.width() as usize * 4;
        let data = self.pixmap.data();
        RgbaImage::from_fn(width, height, |col, row| {
            let index = (y + row) as usize * stride + (x + col) as usize * 4;
            demultiply([data[index], data[index + 1], data[index + 2], data[index + 3]])
        })
    }

    fn write_region(&mut self, x: u32, y: u32, width: u32, height: u32, image: &RgbaImage) {
        let stride = self.pixmap.width() as usize * 4;
        let data = self.pixmap.data_mut();
        for row in 0..height {
            for col in 0..width {
                let index = (y + row) as usize * stride + (x + col) as usize * 4;
                let pixel = premultiply(image.get_pixel(col, row).0);
                data[index..index + 4].copy_from_slice(&pixel);
            }
        }
    }

    /// Straight-alpha copy of the surface contents.
    pub fn into_image(self) -> RenderResult<RgbaImage> {
        let (width, height) = (self.pixmap.width(), self.pixmap.height());
        let data = self
            .pixmap
            .data()
            .chunks_exact(4)
            .flat_map(|px| demultiply([px[0], px[1], px[2], px[3]]).0)
            .collect::<Vec<_>>();
        RgbaImage::from_raw(width, height, data).ok_or(RenderError::SurfaceReadback)
    }
}

fn rounded_rect_path(rect: Rect, radius: f64) -> Option<tiny_skia::Path> {
    let radius = radius.min(rect.width / 2.0).min(rect.height / 2.0).max(0.0) as f32;
    let (left, top) = (rect.left() as f32, rect.top() as f32);
    let (right, bottom) = (rect.right() as f32, rect.bottom() as f32);
    if right <= left || bottom <= top {
        return None;
    }

    let mut builder = PathBuilder::new();
    builder.move_to(left + radius, top);
    builder.line_to(right - radius, top);
    builder.quad_to(right, top, right, top + radius);
    builder.line_to(right, bottom - radius);
    builder.quad_to(right, bottom, right - radius, bottom);
    builder.line_to(left + radius, bottom);
    builder.quad_to(left, bottom, left, bottom - radius);
    builder.line_to(left, top + radius);
    builder.quad_to(left, top, left + radius, top);
    builder.close();
    builder.finish()
}

fn paint_for(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

fn skia_rect(rect: Rect) -> Option<tiny_skia::Rect> {
    tiny_skia::Rect::from_xywh(
        rect.x as f32,
        rect.y as f32,
        rect.width as f32,
        rect.height as f32,
    )
}

fn device_region(rect: &Rect, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    let bounds = Rect::new(0.0, 0.0, f64::from(width), f64::from(height));
    let clipped = rect.intersect(bounds)?;
    let left = clipped.left().floor() as u32;
    let top = clipped.top().floor() as u32;
    let right = (clipped.right().ceil() as u32).min(width);
    let bottom = (clipped.bottom().ceil() as u32).min(height);
    if right <= left || bottom <= top {
        return None;
    }
    Some((left, top, right - left, bottom - top))
}

pub(crate) fn pixmap_from_image(image: &RgbaImage) -> RenderResult<Pixmap> {
    let size = tiny_skia::IntSize::from_wh(image.width(), image.height()).ok_or(
        RenderError::SurfaceAllocation {
            width: image.width(),
            height: image.height(),
        },
    )?;
    let data = image
        .pixels()
        .flat_map(|pixel| premultiply(pixel.0))
        .collect::<Vec<_>>();
    Pixmap::from_vec(data, size).ok_or(RenderError::SurfaceAllocation {
        width: image.width(),
        height: image.height(),
    })
}

fn premultiply([r, g, b, a]: [u8; 4]) -> [u8; 4] {
    let scale = |channel: u8| ((u16::from(channel) * u16::from(a) + 127) / 255) as u8;
    [scale(r), scale(g), scale(b), a]
}

fn demultiply([r, g, b, a]: [u8; 4]) -> Rgba<u8> {
    if a == 0 {
        return Rgba([0, 0, 0, 0]);
    }
    let scale = |channel: u8| {
        ((u32::from(channel) * 255 + u32::from(a) / 2) / u32::from(a)).min(255) as u8
    };
    Rgba([scale(r), scale(g), scale(b), a])
}

/// Greedy word wrap. Words wider than `max_width` get a line of their own.
pub(crate) fn wrap_text(text: &str, max_width: u32, measure: impl Fn(&str) -> u32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate = format!("{current} {word}");
            if measure(&candidate) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            }
        }
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white_image(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]))
    }

    #[test]
    fn into_image_preserves_drawn_base_image() {
        let mut surface = Surface::new(4, 3).expect("surface");
        surface
            .draw_image(&white_image(4, 3), Point::new(0.0, 0.0))
            .expect("draw image");

        let image = surface.into_image().expect("readback");
        assert_eq!(image.dimensions(), (4, 3));
        assert_eq!(image.get_pixel(2, 1), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn offset_shifts_drawing_into_surface_space() {
        let mut surface = Surface::new(20, 20)
            .expect("surface")
            .with_offset(Vector::new(10.0, 10.0));
        surface.fill_rect(Rect::new(-10.0, -10.0, 5.0, 5.0), Color::RED);

        let image = surface.into_image().expect("readback");
        assert_eq!(image.get_pixel(2, 2), &Rgba([255, 0, 0, 255]));
        assert_eq!(image.get_pixel(12, 12)[3], 0);
    }

    #[test]
    fn wrap_text_breaks_on_measured_width() {
        let lines = wrap_text("aa bb cc\ndd", 5, |line| line.len() as u32);
        assert_eq!(lines, vec!["aa bb", "cc", "dd"]);
    }

    #[test]
    fn premultiply_and_demultiply_keep_opaque_pixels() {
        let opaque = [10, 20, 30, 255];
        assert_eq!(demultiply(premultiply(opaque)).0, opaque);
        assert_eq!(demultiply([0, 0, 0, 0]).0, [0, 0, 0, 0]);
    }
}
