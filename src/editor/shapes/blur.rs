use image::RgbaImage;

use super::{draw_corner_handles, remap_rect, CornerResize, Shape, StrokeStyle};
use crate::editor::region::blur_region;
use crate::editor::EditResult;
use crate::geometry::{Color, Point, Rect, Vector};
use crate::render::{RenderResult, Surface};

/// Shown while a blur rectangle has no cached raster.
const FALLBACK_FILL: Color = Color::GRAY.with_alpha(179);

/// Blurred pixels for the part of a rectangle that overlaps the base image.
#[derive(Debug, Clone, PartialEq)]
pub struct BlurCache {
    pub region: Rect,
    pub image: RgbaImage,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlurRectangleShape {
    pub id: u64,
    pub rect: Rect,
    pub style: StrokeStyle,
    cache: Option<BlurCache>,
}

impl BlurRectangleShape {
    pub fn new(id: u64, rect: Rect, style: StrokeStyle) -> Self {
        Self {
            id,
            rect,
            style,
            cache: None,
        }
    }

    pub fn cache(&self) -> Option<&BlurCache> {
        self.cache.as_ref()
    }

    /// Regenerates the blurred raster from `source`.
    ///
    /// On failure the cache is cleared and the fallback fill is shown.
    pub fn refresh(&mut self, source: &RgbaImage, radius: u32) -> EditResult<()> {
        self.cache = None;
        let cache = blur_region(source, self.rect, radius)?;
        self.cache = Some(cache);
        Ok(())
    }

    fn invalidate(&mut self) {
        self.cache = None;
    }
}

impl CornerResize for BlurRectangleShape {
    fn frame(&self) -> Rect {
        self.rect
    }

    fn set_frame(&mut self, frame: Rect) {
        self.rect = frame;
        self.invalidate();
    }
}

impl Shape for BlurRectangleShape {
    fn bounds(&self) -> Rect {
        self.rect
    }

    fn hit_test(&self, point: Point) -> bool {
        self.rect.contains(point)
    }

    fn move_by(&mut self, offset: Vector) {
        self.rect = self.rect.translate(offset);
        self.invalidate();
    }

    fn render(&self, surface: &mut Surface, selected: bool) -> RenderResult<()> {
        match &self.cache {
            Some(cache) => surface.draw_image(&cache.image, cache.region.top_left())?,
            None => surface.fill_rect(self.rect, FALLBACK_FILL),
        }

        if selected {
            draw_corner_handles(surface, &self.rect);
        }
        Ok(())
    }

    fn remap_points(&mut self, remap: &dyn Fn(Point) -> Point) {
        self.rect = remap_rect(self.rect, remap);
        self.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::region::BLUR_RADIUS;
    use image::Rgba;

    fn striped(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, _| {
            if x % 2 == 0 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        })
    }

    #[test]
    fn refresh_caches_clamped_region() {
        let mut blur = BlurRectangleShape::new(
            1,
            Rect::new(80.0, 10.0, 50.0, 20.0),
            StrokeStyle::default(),
        );
        blur.refresh(&striped(100, 50), BLUR_RADIUS).expect("blur should succeed");

        let cache = blur.cache().expect("cache present");
        assert_eq!(cache.region, Rect::new(80.0, 10.0, 20.0, 20.0));
        assert_eq!(cache.image.dimensions(), (20, 20));
    }

    #[test]
    fn moving_drops_stale_cache() {
        let mut blur = BlurRectangleShape::new(
            1,
            Rect::new(0.0, 0.0, 30.0, 30.0),
            StrokeStyle::default(),
        );
        blur.refresh(&striped(100, 50), BLUR_RADIUS).expect("blur should succeed");
        blur.move_by(Vector::new(1.0, 0.0));
        assert!(blur.cache().is_none());
    }

    #[test]
    fn refresh_outside_image_fails_and_leaves_fallback() {
        let mut blur = BlurRectangleShape::new(
            1,
            Rect::new(500.0, 500.0, 30.0, 30.0),
            StrokeStyle::default(),
        );
        blur.refresh(&striped(100, 50), BLUR_RADIUS)
            .expect_err("region outside the image cannot be blurred");
        assert!(blur.cache().is_none());
    }
}
