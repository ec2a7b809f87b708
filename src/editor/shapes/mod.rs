mod arrow;
mod blur;
mod bordered;
mod callout;
mod highlighter;

pub use arrow::{ArrowEndpoint, ArrowHead, ArrowShape, ARROW_HEAD_LENGTH, ARROW_HEAD_WIDTH};
pub use blur::{BlurCache, BlurRectangleShape};
pub use bordered::BorderedRectangleShape;
pub use callout::{CalloutNoArrowShape, CalloutShape, FontSpec, TextBody};
pub use highlighter::HighlighterShape;

use super::handles::{self, Corner};
use crate::geometry::{Color, Point, Rect, Vector};
use crate::render::{RenderResult, Surface};

/// Offset of the drop shadow drawn under arrows, callouts and borders.
pub const SHADOW_OFFSET: Vector = Vector::new(3.0, 3.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    pub thickness: f64,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: Color::RED,
            thickness: 10.0,
        }
    }
}

impl StrokeStyle {
    pub const fn new(color: Color, thickness: f64) -> Self {
        Self { color, thickness }
    }

    pub fn set_thickness(&mut self, thickness: f64) {
        self.thickness = thickness.clamp(1.0, 100.0);
    }

    /// Color and width actually painted; selection paints blue and one unit wider.
    pub fn effective(&self, selected: bool) -> (Color, f64) {
        if selected {
            (Color::BLUE, self.thickness + 1.0)
        } else {
            (self.color, self.thickness)
        }
    }
}

/// Common contract of every annotation variant.
pub trait Shape {
    fn bounds(&self) -> Rect;
    fn hit_test(&self, point: Point) -> bool;
    fn move_by(&mut self, offset: Vector);
    fn render(&self, surface: &mut Surface, selected: bool) -> RenderResult<()>;
    /// Rewrites every point-valued field through `remap`.
    fn remap_points(&mut self, remap: &dyn Fn(Point) -> Point);
}

/// Rectangle-like geometry that can be resized by dragging a corner.
pub trait CornerResize {
    fn frame(&self) -> Rect;
    fn set_frame(&mut self, frame: Rect);

    fn corner_at(&self, point: Point) -> Option<Corner> {
        handles::corner_at_point(&self.frame(), point)
    }

    /// Returns `false` and leaves the frame untouched when the result would be too small.
    fn resize_from_corner(&mut self, corner: Corner, point: Point) -> bool {
        match handles::resize_from_corner(&self.frame(), corner, point) {
            Some(frame) => {
                self.set_frame(frame);
                true
            }
            None => false,
        }
    }
}

/// Remaps a rectangle through its top-left and bottom-right corners.
pub(crate) fn remap_rect(rect: Rect, remap: &dyn Fn(Point) -> Point) -> Rect {
    Rect::from_points(remap(rect.top_left()), remap(rect.bottom_right()))
}

pub(crate) fn draw_corner_handles(surface: &mut Surface, rect: &Rect) {
    for (_, corner) in handles::corner_points(rect) {
        surface.draw_handle(corner, handles::CORNER_HANDLE_DRAW_SIZE, Color::BLUE, None);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Arrow,
    Callout,
    CalloutNoArrow,
    BorderedRectangle,
    BlurRectangle,
    Highlighter,
}

/// A grabbable handle on the selected shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    ArrowEndpoint(ArrowEndpoint),
    Beak,
    Corner(Corner),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    Arrow(ArrowShape),
    Callout(CalloutShape),
    CalloutNoArrow(CalloutNoArrowShape),
    BorderedRectangle(BorderedRectangleShape),
    BlurRectangle(BlurRectangleShape),
    Highlighter(HighlighterShape),
}

impl Annotation {
    pub const fn id(&self) -> u64 {
        match self {
            Self::Arrow(shape) => shape.id,
            Self::Callout(shape) => shape.id,
            Self::CalloutNoArrow(shape) => shape.id,
            Self::BorderedRectangle(shape) => shape.id,
            Self::BlurRectangle(shape) => shape.id,
            Self::Highlighter(shape) => shape.id,
        }
    }

    pub(crate) fn set_id(&mut self, id: u64) {
        match self {
            Self::Arrow(shape) => shape.id = id,
            Self::Callout(shape) => shape.id = id,
            Self::CalloutNoArrow(shape) => shape.id = id,
            Self::BorderedRectangle(shape) => shape.id = id,
            Self::BlurRectangle(shape) => shape.id = id,
            Self::Highlighter(shape) => shape.id = id,
        }
    }

    pub const fn kind(&self) -> ShapeKind {
        match self {
            Self::Arrow(_) => ShapeKind::Arrow,
            Self::Callout(_) => ShapeKind::Callout,
            Self::CalloutNoArrow(_) => ShapeKind::CalloutNoArrow,
            Self::BorderedRectangle(_) => ShapeKind::BorderedRectangle,
            Self::BlurRectangle(_) => ShapeKind::BlurRectangle,
            Self::Highlighter(_) => ShapeKind::Highlighter,
        }
    }

    pub fn style(&self) -> StrokeStyle {
        match self {
            Self::Arrow(shape) => shape.style,
            Self::Callout(shape) => shape.style,
            Self::CalloutNoArrow(shape) => shape.style,
            Self::BorderedRectangle(shape) => shape.style,
            Self::BlurRectangle(shape) => shape.style,
            Self::Highlighter(shape) => shape.style,
        }
    }

    fn as_shape(&self) -> &dyn Shape {
        match self {
            Self::Arrow(shape) => shape,
            Self::Callout(shape) => shape,
            Self::CalloutNoArrow(shape) => shape,
            Self::BorderedRectangle(shape) => shape,
            Self::BlurRectangle(shape) => shape,
            Self::Highlighter(shape) => shape,
        }
    }

    fn as_shape_mut(&mut self) -> &mut dyn Shape {
        match self {
            Self::Arrow(shape) => shape,
            Self::Callout(shape) => shape,
            Self::CalloutNoArrow(shape) => shape,
            Self::BorderedRectangle(shape) => shape,
            Self::BlurRectangle(shape) => shape,
            Self::Highlighter(shape) => shape,
        }
    }

    pub fn as_resizable(&self) -> Option<&dyn CornerResize> {
        match self {
            Self::Arrow(_) => None,
            Self::Callout(shape) => Some(shape),
            Self::CalloutNoArrow(shape) => Some(shape),
            Self::BorderedRectangle(shape) => Some(shape),
            Self::BlurRectangle(shape) => Some(shape),
            Self::Highlighter(shape) => Some(shape),
        }
    }

    pub fn as_resizable_mut(&mut self) -> Option<&mut dyn CornerResize> {
        match self {
            Self::Arrow(_) => None,
            Self::Callout(shape) => Some(shape),
            Self::CalloutNoArrow(shape) => Some(shape),
            Self::BorderedRectangle(shape) => Some(shape),
            Self::BlurRectangle(shape) => Some(shape),
            Self::Highlighter(shape) => Some(shape),
        }
    }

    pub fn as_arrow_mut(&mut self) -> Option<&mut ArrowShape> {
        match self {
            Self::Arrow(arrow) => Some(arrow),
            _ => None,
        }
    }

    pub fn as_callout_mut(&mut self) -> Option<&mut CalloutShape> {
        match self {
            Self::Callout(callout) => Some(callout),
            _ => None,
        }
    }

    pub fn as_blur_mut(&mut self) -> Option<&mut BlurRectangleShape> {
        match self {
            Self::BlurRectangle(blur) => Some(blur),
            _ => None,
        }
    }

    /// Text body of callout variants.
    pub fn text_body(&self) -> Option<&TextBody> {
        match self {
            Self::Callout(callout) => Some(&callout.body),
            Self::CalloutNoArrow(callout) => Some(&callout.body),
            _ => None,
        }
    }

    pub fn text_body_mut(&mut self) -> Option<&mut TextBody> {
        match self {
            Self::Callout(callout) => Some(&mut callout.body),
            Self::CalloutNoArrow(callout) => Some(&mut callout.body),
            _ => None,
        }
    }

    /// Handle under `point`, checked in priority order: arrow endpoints, beak, then corners.
    pub fn handle_at(&self, point: Point) -> Option<HandleKind> {
        match self {
            Self::Arrow(arrow) => arrow.endpoint_at(point).map(HandleKind::ArrowEndpoint),
            Self::Callout(callout) if callout.beak_handle_contains(point) => Some(HandleKind::Beak),
            _ => self
                .as_resizable()
                .and_then(|shape| shape.corner_at(point))
                .map(HandleKind::Corner),
        }
    }

    /// Shape has enough extent to be kept when drawing finishes.
    pub fn meets_commit_threshold(&self) -> bool {
        match self {
            Self::Arrow(arrow) => arrow.start.distance_to(arrow.end) > 5.0,
            Self::Highlighter(highlighter) => {
                let frame = highlighter.frame();
                frame.width > 5.0 && frame.height > 5.0
            }
            _ => self
                .as_resizable()
                .map(|shape| shape.frame())
                .is_some_and(|frame| frame.width > 10.0 && frame.height > 10.0),
        }
    }
}

impl Shape for Annotation {
    fn bounds(&self) -> Rect {
        self.as_shape().bounds()
    }

    fn hit_test(&self, point: Point) -> bool {
        self.as_shape().hit_test(point)
    }

    fn move_by(&mut self, offset: Vector) {
        self.as_shape_mut().move_by(offset);
    }

    fn render(&self, surface: &mut Surface, selected: bool) -> RenderResult<()> {
        self.as_shape().render(surface, selected)
    }

    fn remap_points(&mut self, remap: &dyn Fn(Point) -> Point) {
        self.as_shape_mut().remap_points(remap);
    }
}
