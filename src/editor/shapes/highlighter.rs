use super::{CornerResize, Shape, StrokeStyle};
use crate::editor::handles::{self, Corner};
use crate::geometry::{Color, Point, Rect, Vector};
use crate::render::{RenderResult, Surface};

const HIGHLIGHTER_HANDLE_SIZE: f64 = 8.0;

/// Translucent fill spanning two corner points.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlighterShape {
    pub id: u64,
    pub start: Point,
    pub end: Point,
    /// `style.color` is the fill color; thickness is unused.
    pub style: StrokeStyle,
}

impl HighlighterShape {
    pub fn new(id: u64, start: Point, end: Point, style: StrokeStyle) -> Self {
        Self {
            id,
            start,
            end,
            style,
        }
    }
}

impl CornerResize for HighlighterShape {
    fn frame(&self) -> Rect {
        Rect::from_points(self.start, self.end)
    }

    fn set_frame(&mut self, frame: Rect) {
        self.start = frame.top_left();
        self.end = frame.bottom_right();
    }

    fn corner_at(&self, point: Point) -> Option<Corner> {
        handles::corner_at_point_boxed(&self.frame(), point)
    }
}

impl Shape for HighlighterShape {
    fn bounds(&self) -> Rect {
        self.frame()
    }

    fn hit_test(&self, point: Point) -> bool {
        self.frame().contains(point)
    }

    fn move_by(&mut self, offset: Vector) {
        self.start = self.start.offset(offset);
        self.end = self.end.offset(offset);
    }

    fn render(&self, surface: &mut Surface, selected: bool) -> RenderResult<()> {
        let frame = self.frame();
        surface.fill_rect(frame, self.style.color);

        if selected {
            surface.stroke_dashed_rect(frame, Color::ORANGE, 1.0, 4.0);
            for (_, corner) in handles::corner_points(&frame) {
                surface.draw_handle(
                    corner,
                    HIGHLIGHTER_HANDLE_SIZE,
                    Color::WHITE,
                    Some(Color::ORANGE),
                );
            }
        }
        Ok(())
    }

    fn remap_points(&mut self, remap: &dyn Fn(Point) -> Point) {
        self.start = remap(self.start);
        self.end = remap(self.end);
    }
}
