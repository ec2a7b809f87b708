use super::{draw_corner_handles, remap_rect, CornerResize, Shape, StrokeStyle, SHADOW_OFFSET};
use crate::geometry::{Color, Point, Rect, Vector};
use crate::render::{RenderResult, Surface};

const MIN_BORDER_BAND: f64 = 10.0;

/// Unfilled frame; only the band near its border is hit-testable.
#[derive(Debug, Clone, PartialEq)]
pub struct BorderedRectangleShape {
    pub id: u64,
    pub rect: Rect,
    pub style: StrokeStyle,
}

impl BorderedRectangleShape {
    pub fn new(id: u64, rect: Rect, style: StrokeStyle) -> Self {
        Self { id, rect, style }
    }

    fn border_band(&self) -> f64 {
        MIN_BORDER_BAND.max(self.style.thickness * 2.0)
    }
}

impl CornerResize for BorderedRectangleShape {
    fn frame(&self) -> Rect {
        self.rect
    }

    fn set_frame(&mut self, frame: Rect) {
        self.rect = frame;
    }
}

impl Shape for BorderedRectangleShape {
    fn bounds(&self) -> Rect {
        self.rect.inflate(self.style.thickness / 2.0 + SHADOW_OFFSET.dx)
    }

    fn hit_test(&self, point: Point) -> bool {
        if !self.rect.contains(point) {
            return false;
        }
        let inner = self.rect.deflate(self.border_band());
        let strictly_inside = point.x > inner.left()
            && point.x < inner.right()
            && point.y > inner.top()
            && point.y < inner.bottom();
        !strictly_inside
    }

    fn move_by(&mut self, offset: Vector) {
        self.rect = self.rect.translate(offset);
    }

    fn render(&self, surface: &mut Surface, selected: bool) -> RenderResult<()> {
        let (color, thickness) = self.style.effective(selected);
        let width = thickness / 2.0;
        surface.stroke_rect(self.rect.translate(SHADOW_OFFSET), Color::SHADOW, width);
        surface.stroke_rect(self.rect, color, width);

        if selected {
            draw_corner_handles(surface, &self.rect);
        }
        Ok(())
    }

    fn remap_points(&mut self, remap: &dyn Fn(Point) -> Point) {
        self.rect = remap_rect(self.rect, remap);
    }
}
