use super::handles::{self, MIN_RESIZE_EXTENT};
use super::region::StripCut;
use super::shapes::CornerResize;
use crate::geometry::{Color, Rect};
use crate::render::Surface;

const OVERLAY_DASH: f64 = 4.0;
const SELECTOR_BORDER_WIDTH: f64 = 2.0;
const SELECTOR_HANDLE_SIZE: f64 = 8.0;
const TRIM_BORDER_WIDTH: f64 = 2.0;
const TRIM_SHADE: Color = Color::new(120, 0, 0, 0);
const CUT_PREVIEW_FILL: Color = Color::new(100, 255, 0, 0);

/// Marquee used for region copy and whiteout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectorRectangle {
    pub rect: Rect,
}

impl SelectorRectangle {
    pub const fn new(rect: Rect) -> Self {
        Self { rect }
    }

    pub fn render(&self, surface: &mut Surface) {
        let border = Color::RED.with_alpha(204);
        surface.stroke_dashed_rect(self.rect, border, SELECTOR_BORDER_WIDTH, OVERLAY_DASH);
        for (_, corner) in handles::corner_points(&self.rect) {
            surface.draw_handle(corner, SELECTOR_HANDLE_SIZE, Color::WHITE, Some(Color::RED));
        }
    }

    pub fn remap(&mut self, cut: &StripCut) {
        self.rect = cut.remap_rect(self.rect);
    }
}

impl CornerResize for SelectorRectangle {
    fn frame(&self) -> Rect {
        self.rect
    }

    fn set_frame(&mut self, frame: Rect) {
        self.rect = frame;
    }
}

/// Pending crop region, previewed over the image before it is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimRectangle {
    pub rect: Rect,
}

impl TrimRectangle {
    /// Trim covering the whole image, or `None` if the image is below the resize minimum.
    pub fn covering(width: u32, height: u32) -> Option<Self> {
        let (width, height) = (f64::from(width), f64::from(height));
        if width < MIN_RESIZE_EXTENT || height < MIN_RESIZE_EXTENT {
            return None;
        }
        Some(Self {
            rect: Rect::new(0.0, 0.0, width, height),
        })
    }

    /// Shades everything outside the kept area within `image_rect`.
    pub fn render(&self, surface: &mut Surface, image_rect: Rect) {
        let kept = self.rect;
        let bands = [
            Rect::from_ltrb(image_rect.left(), image_rect.top(), image_rect.right(), kept.top()),
            Rect::from_ltrb(image_rect.left(), kept.bottom(), image_rect.right(), image_rect.bottom()),
            Rect::from_ltrb(image_rect.left(), kept.top(), kept.left(), kept.bottom()),
            Rect::from_ltrb(kept.right(), kept.top(), image_rect.right(), kept.bottom()),
        ];
        for band in bands.into_iter().filter(|band| band.width > 0.0 && band.height > 0.0) {
            surface.fill_rect(band, TRIM_SHADE);
        }
        surface.stroke_dashed_rect(kept, Color::WHITE, TRIM_BORDER_WIDTH, OVERLAY_DASH);
    }
}

impl CornerResize for TrimRectangle {
    fn frame(&self) -> Rect {
        self.rect
    }

    fn set_frame(&mut self, frame: Rect) {
        self.rect = frame;
    }
}

/// Translucent band previewing a strip removal while the cut tool drags.
pub fn render_cut_preview(surface: &mut Surface, band: Rect) {
    surface.fill_rect(band, CUT_PREVIEW_FILL);
    surface.stroke_dashed_rect(band, Color::RED, SELECTOR_BORDER_WIDTH, OVERLAY_DASH);
}
