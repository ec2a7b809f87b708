use super::{Shape, StrokeStyle, SHADOW_OFFSET};
use crate::editor::handles::point_within_radius;
use crate::geometry::{distance_to_segment, Color, Point, Rect, Vector};
use crate::render::{RenderResult, Surface};

pub const ARROW_HEAD_LENGTH: f64 = 40.0;
pub const ARROW_HEAD_WIDTH: f64 = 30.0;
const ARROW_HIT_TOLERANCE: f64 = 10.0;
const ARROW_ENDPOINT_RADIUS: f64 = 8.0;
const ARROW_BOUNDS_PADDING: f64 = 45.0;
const ARROW_HANDLE_SIZE: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowEndpoint {
    Start,
    End,
}

/// Triangle at the tip of an arrow. `base` is where the shaft stops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowHead {
    pub tip: Point,
    pub base: Point,
    pub left: Point,
    pub right: Point,
}

impl ArrowHead {
    /// Head pointing from `from` toward `tip`, set back along that direction.
    pub fn toward(from: Point, tip: Point, length: f64, width: f64) -> Self {
        let angle = (tip.y - from.y).atan2(tip.x - from.x);
        let (sin, cos) = angle.sin_cos();
        let base = Point::new(tip.x - length * cos, tip.y - length * sin);
        let half = width / 2.0;
        // Perpendicular to the shaft.
        let (px, py) = (-sin * half, cos * half);
        Self {
            tip,
            base,
            left: Point::new(base.x - px, base.y - py),
            right: Point::new(base.x + px, base.y + py),
        }
    }

    pub fn translate(self, offset: Vector) -> Self {
        Self {
            tip: self.tip.offset(offset),
            base: self.base.offset(offset),
            left: self.left.offset(offset),
            right: self.right.offset(offset),
        }
    }

    pub fn polygon(&self) -> [Point; 3] {
        [self.left, self.tip, self.right]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrowShape {
    pub id: u64,
    pub start: Point,
    pub end: Point,
    pub style: StrokeStyle,
}

impl ArrowShape {
    pub fn new(id: u64, start: Point, end: Point, style: StrokeStyle) -> Self {
        Self {
            id,
            start,
            end,
            style,
        }
    }

    pub fn head(&self) -> ArrowHead {
        ArrowHead::toward(self.start, self.end, ARROW_HEAD_LENGTH, ARROW_HEAD_WIDTH)
    }

    pub fn endpoint_at(&self, point: Point) -> Option<ArrowEndpoint> {
        if point_within_radius(point, self.start, ARROW_ENDPOINT_RADIUS) {
            Some(ArrowEndpoint::Start)
        } else if point_within_radius(point, self.end, ARROW_ENDPOINT_RADIUS) {
            Some(ArrowEndpoint::End)
        } else {
            None
        }
    }

    pub fn move_endpoint(&mut self, endpoint: ArrowEndpoint, point: Point) {
        match endpoint {
            ArrowEndpoint::Start => self.start = point,
            ArrowEndpoint::End => self.end = point,
        }
    }
}

impl Shape for ArrowShape {
    fn bounds(&self) -> Rect {
        Rect::from_points(self.start, self.end).inflate(ARROW_BOUNDS_PADDING)
    }

    fn hit_test(&self, point: Point) -> bool {
        distance_to_segment(point, self.start, self.end) < ARROW_HIT_TOLERANCE
    }

    fn move_by(&mut self, offset: Vector) {
        self.start = self.start.offset(offset);
        self.end = self.end.offset(offset);
    }

    fn render(&self, surface: &mut Surface, selected: bool) -> RenderResult<()> {
        let (color, thickness) = self.style.effective(selected);
        let head = self.head();

        let shadow = head.translate(SHADOW_OFFSET);
        surface.stroke_line(
            self.start.offset(SHADOW_OFFSET),
            shadow.base,
            Color::SHADOW,
            thickness,
        );
        surface.fill_polygon(&shadow.polygon(), Color::SHADOW);

        surface.stroke_line(self.start, head.base, color, thickness);
        surface.fill_polygon(&head.polygon(), color);

        if selected {
            for endpoint in [self.start, self.end] {
                surface.draw_handle(endpoint, ARROW_HANDLE_SIZE, Color::WHITE, Some(Color::BLACK));
            }
        }
        Ok(())
    }

    fn remap_points(&mut self, remap: &dyn Fn(Point) -> Point) {
        self.start = remap(self.start);
        self.end = remap(self.end);
    }
}
