use super::{draw_corner_handles, remap_rect, CornerResize, Shape, StrokeStyle, SHADOW_OFFSET};
use crate::editor::handles::point_within_radius;
use crate::geometry::{ray_rect_exit, Color, Point, Rect, Side, Vector};
use crate::render::{RenderResult, Surface, TextLayout, TextStyle};

const CALLOUT_CORNER_RADIUS: f64 = 10.0;
const BEAK_BASE_WIDTH: f64 = 30.0;
const BEAK_HANDLE_RADIUS: f64 = 10.0;
const BEAK_HANDLE_SIZE: f64 = 8.0;
/// Distance below a freshly drawn callout where its beak starts out.
pub(crate) const DEFAULT_BEAK_DROP: f64 = 30.0;

const CALLOUT_TEXT_LAYOUT: TextLayout = TextLayout {
    padding: 20.0,
    min_wrap_width: 50.0,
};

pub const DEFAULT_FONT_FAMILY: &str = "Arial";
pub const DEFAULT_FONT_SIZE: f64 = 24.0;

#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: DEFAULT_FONT_FAMILY.to_string(),
            size: DEFAULT_FONT_SIZE,
            bold: false,
            italic: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextBody {
    pub text: String,
    pub font: FontSpec,
}

impl TextBody {
    fn render(&self, surface: &mut Surface, frame: Rect) {
        let style = TextStyle {
            size: self.font.size,
            bold: self.font.bold,
            italic: self.font.italic,
            color: Color::WHITE,
        };
        surface.draw_text_block(frame, &self.text, style, CALLOUT_TEXT_LAYOUT);
    }
}

/// How far the border stroke extends outside the body, selected width included.
fn border_reach(style: &StrokeStyle) -> f64 {
    (style.thickness + 1.0) / 2.0
}

/// Speech bubble with a beak pointing at `beak`.
#[derive(Debug, Clone, PartialEq)]
pub struct CalloutShape {
    pub id: u64,
    pub rect: Rect,
    pub beak: Point,
    pub body: TextBody,
    pub style: StrokeStyle,
}

impl CalloutShape {
    pub fn new(id: u64, rect: Rect, beak: Point, style: StrokeStyle) -> Self {
        Self {
            id,
            rect,
            beak,
            body: TextBody::default(),
            style,
        }
    }

    /// Side the beak leaves from: the axis with the larger displacement from the center wins.
    pub fn beak_side(&self) -> Side {
        let center = self.rect.center();
        let dx = self.beak.x - center.x;
        let dy = self.beak.y - center.y;
        if dx.abs() > dy.abs() {
            if dx > 0.0 {
                Side::Right
            } else {
                Side::Left
            }
        } else if dy > 0.0 {
            Side::Bottom
        } else {
            Side::Top
        }
    }

    /// Base corners of the beak triangle, flush with the facing side.
    ///
    /// `None` while the beak point sits inside the body.
    pub fn beak_base(&self) -> Option<(Point, Point)> {
        if self.rect.contains(self.beak) {
            return None;
        }
        let (exit, _) = ray_rect_exit(&self.rect, self.rect.center(), self.beak);
        let half = BEAK_BASE_WIDTH / 2.0;
        let inset = CALLOUT_CORNER_RADIUS + half;
        let along = |value: f64, low: f64, high: f64| {
            if high - low < inset * 2.0 {
                (low + high) / 2.0
            } else {
                value.clamp(low + inset, high - inset)
            }
        };

        let rect = &self.rect;
        let base = match self.beak_side() {
            Side::Top | Side::Bottom => {
                let y = if self.beak_side() == Side::Top {
                    rect.top()
                } else {
                    rect.bottom()
                };
                let x = along(exit.x, rect.left(), rect.right());
                (Point::new(x - half, y), Point::new(x + half, y))
            }
            Side::Left | Side::Right => {
                let x = if self.beak_side() == Side::Left {
                    rect.left()
                } else {
                    rect.right()
                };
                let y = along(exit.y, rect.top(), rect.bottom());
                (Point::new(x, y - half), Point::new(x, y + half))
            }
        };
        Some(base)
    }

    pub fn beak_handle_contains(&self, point: Point) -> bool {
        point_within_radius(point, self.beak, BEAK_HANDLE_RADIUS)
    }

    pub fn move_beak(&mut self, point: Point) {
        self.beak = point;
    }

    /// Rectangle from a draw gesture; the beak follows below the body.
    pub(crate) fn stretch_to(&mut self, anchor: Point, point: Point) {
        self.rect = Rect::from_points(anchor, point);
        self.beak = Point::new(self.rect.center().x, self.rect.bottom() + DEFAULT_BEAK_DROP);
    }

    fn beak_polygon(&self, offset: Vector) -> Option<[Point; 3]> {
        let (left, right) = self.beak_base()?;
        Some([left.offset(offset), self.beak.offset(offset), right.offset(offset)])
    }
}

impl CornerResize for CalloutShape {
    fn frame(&self) -> Rect {
        self.rect
    }

    fn set_frame(&mut self, frame: Rect) {
        self.rect = frame;
    }
}

impl Shape for CalloutShape {
    fn bounds(&self) -> Rect {
        self.rect
            .inflate(border_reach(&self.style))
            .union(Rect::new(self.beak.x, self.beak.y, 0.0, 0.0))
            .inflate(SHADOW_OFFSET.dx)
    }

    fn hit_test(&self, point: Point) -> bool {
        self.rect.contains(point)
    }

    fn move_by(&mut self, offset: Vector) {
        self.rect = self.rect.translate(offset);
        self.beak = self.beak.offset(offset);
    }

    fn render(&self, surface: &mut Surface, selected: bool) -> RenderResult<()> {
        let (color, thickness) = self.style.effective(selected);

        surface.fill_rounded_rect(
            self.rect.translate(SHADOW_OFFSET),
            CALLOUT_CORNER_RADIUS,
            Color::SHADOW,
        );
        if let Some(shadow) = self.beak_polygon(SHADOW_OFFSET) {
            surface.fill_polygon(&shadow, Color::SHADOW);
        }

        surface.fill_rounded_rect(self.rect, CALLOUT_CORNER_RADIUS, color);
        surface.stroke_rounded_rect(self.rect, CALLOUT_CORNER_RADIUS, color, thickness);
        if let Some(beak) = self.beak_polygon(Vector::new(0.0, 0.0)) {
            surface.fill_polygon(&beak, color);
        }
        self.body.render(surface, self.rect);

        if selected {
            draw_corner_handles(surface, &self.rect);
            surface.draw_handle(self.beak, BEAK_HANDLE_SIZE, Color::ORANGE, None);
        }
        Ok(())
    }

    fn remap_points(&mut self, remap: &dyn Fn(Point) -> Point) {
        self.rect = remap_rect(self.rect, remap);
        self.beak = remap(self.beak);
    }
}

/// Text box without a beak.
#[derive(Debug, Clone, PartialEq)]
pub struct CalloutNoArrowShape {
    pub id: u64,
    pub rect: Rect,
    pub body: TextBody,
    pub style: StrokeStyle,
}

impl CalloutNoArrowShape {
    pub fn new(id: u64, rect: Rect, style: StrokeStyle) -> Self {
        Self {
            id,
            rect,
            body: TextBody::default(),
            style,
        }
    }
}

impl CornerResize for CalloutNoArrowShape {
    fn frame(&self) -> Rect {
        self.rect
    }

    fn set_frame(&mut self, frame: Rect) {
        self.rect = frame;
    }
}

impl Shape for CalloutNoArrowShape {
    fn bounds(&self) -> Rect {
        self.rect.inflate(border_reach(&self.style) + SHADOW_OFFSET.dx)
    }

    fn hit_test(&self, point: Point) -> bool {
        self.rect.contains(point)
    }

    fn move_by(&mut self, offset: Vector) {
        self.rect = self.rect.translate(offset);
    }

    fn render(&self, surface: &mut Surface, selected: bool) -> RenderResult<()> {
        let (color, thickness) = self.style.effective(selected);
        surface.fill_rect(self.rect.translate(SHADOW_OFFSET), Color::SHADOW);
        surface.fill_rect(self.rect, color);
        surface.stroke_rect(self.rect, color, thickness);
        self.body.render(surface, self.rect);

        if selected {
            draw_corner_handles(surface, &self.rect);
        }
        Ok(())
    }

    fn remap_points(&mut self, remap: &dyn Fn(Point) -> Point) {
        self.rect = remap_rect(self.rect, remap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::handles::Corner;

    fn callout() -> CalloutShape {
        CalloutShape::new(
            1,
            Rect::from_ltrb(50.0, 50.0, 250.0, 150.0),
            Point::new(150.0, 300.0),
            StrokeStyle::default(),
        )
    }

    #[test]
    fn beak_below_body_resolves_to_bottom_side() {
        let callout = callout();
        assert_eq!(callout.beak_side(), Side::Bottom);

        let (left, right) = callout.beak_base().expect("beak outside body has a base");
        assert_eq!(left, Point::new(135.0, 150.0));
        assert_eq!(right, Point::new(165.0, 150.0));
    }

    #[test]
    fn beak_side_follows_dominant_displacement() {
        let mut callout = callout();
        callout.beak = Point::new(600.0, 120.0);
        assert_eq!(callout.beak_side(), Side::Right);
        callout.beak = Point::new(-100.0, 90.0);
        assert_eq!(callout.beak_side(), Side::Left);
        callout.beak = Point::new(160.0, -40.0);
        assert_eq!(callout.beak_side(), Side::Top);
    }

    #[test]
    fn beak_inside_body_has_no_base() {
        let mut callout = callout();
        callout.beak = Point::new(100.0, 100.0);
        assert_eq!(callout.beak_base(), None);
    }

    #[test]
    fn resize_to_inverted_corner_is_rejected() {
        let mut callout = callout();
        let before = callout.clone();
        assert!(!callout.resize_from_corner(Corner::BottomRight, Point::new(10.0, 10.0)));
        assert_eq!(callout, before);
    }

    #[test]
    fn stretch_places_default_beak_below_center() {
        let mut callout = callout();
        callout.stretch_to(Point::new(100.0, 100.0), Point::new(20.0, 40.0));
        assert_eq!(callout.rect, Rect::from_ltrb(20.0, 40.0, 100.0, 100.0));
        assert_eq!(callout.beak, Point::new(60.0, 130.0));
    }

    #[test]
    fn hit_test_uses_body_only() {
        let callout = callout();
        assert!(callout.hit_test(Point::new(60.0, 140.0)));
        assert!(!callout.hit_test(Point::new(150.0, 290.0)));
    }

    fn light_pixels_inside(image: &image::RgbaImage, rect: Rect) -> usize {
        image
            .enumerate_pixels()
            .filter(|(x, y, pixel)| {
                rect.contains(Point::new(f64::from(*x), f64::from(*y))) && pixel.0[1] > 200
            })
            .count()
    }

    fn render_callout(fonts: Option<crate::render::FontBook>, text: &str) -> image::RgbaImage {
        let mut callout = callout();
        callout.body.text = text.to_string();
        let mut surface = Surface::new(300, 340).expect("surface").with_fonts(fonts);
        callout.render(&mut surface, false).expect("render");
        surface.into_image().expect("image")
    }

    #[test]
    fn callout_text_is_drawn_inside_body() {
        let body = callout().rect;
        let with_text = render_callout(Some(crate::render::bundled_test_fonts()), "Hello callout");
        assert!(light_pixels_inside(&with_text, body) > 0);

        let empty = render_callout(Some(crate::render::bundled_test_fonts()), "   ");
        assert_eq!(light_pixels_inside(&empty, body), 0);
        let without_fonts = render_callout(None, "Hello callout");
        assert_eq!(light_pixels_inside(&without_fonts, body), 0);
    }

    #[test]
    fn long_callout_text_wraps_onto_several_lines() {
        let body = callout().rect;
        let image = render_callout(
            Some(crate::render::bundled_test_fonts()),
            "wrapped words keep going",
        );
        let text_rows = (body.top() as u32..body.bottom() as u32)
            .filter(|&y| {
                (body.left() as u32..body.right() as u32)
                    .any(|x| image.get_pixel(x, y).0[1] > 200)
            })
            .count();
        assert!(text_rows > DEFAULT_FONT_SIZE as usize);
    }

    #[test]
    fn border_stroke_extends_past_body() {
        let shape = CalloutNoArrowShape::new(
            2,
            Rect::new(50.0, 50.0, 100.0, 60.0),
            StrokeStyle::default(),
        );
        let mut surface = Surface::new(200, 150).expect("surface");
        shape.render(&mut surface, false).expect("render");
        let image = surface.into_image().expect("image");

        assert_eq!(image.get_pixel(47, 80).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(40, 80).0[3], 0);
        assert!(shape.bounds().left() <= 45.0);
    }

    #[test]
    fn callout_without_beak_moves_only_its_rectangle() {
        let mut shape = CalloutNoArrowShape::new(
            2,
            Rect::new(0.0, 0.0, 40.0, 30.0),
            StrokeStyle::default(),
        );
        shape.move_by(Vector::new(5.0, 6.0));
        assert_eq!(shape.rect, Rect::new(5.0, 6.0, 40.0, 30.0));
    }
}
