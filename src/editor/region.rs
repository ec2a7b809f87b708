//! Destructive edits applied to the base raster.

use image::{imageops, GenericImage, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;

use super::shapes::BlurCache;
use super::{EditError, EditResult};
use crate::geometry::{Point, Rect};

/// Blur strength used for blur rectangles.
pub const BLUR_RADIUS: u32 = 15;
/// Strips narrower than this are ignored.
pub const MIN_STRIP_SIZE: f64 = 5.0;

/// Pixel rectangle `(x, y, width, height)` of `rect` clipped to the image.
pub fn bounded_pixel_region(rect: Rect, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    if width == 0 || height == 0 {
        return None;
    }
    let image_rect = Rect::new(0.0, 0.0, f64::from(width), f64::from(height));
    let clipped = rect.intersect(image_rect)?;
    let left = clipped.left().round() as u32;
    let top = clipped.top().round() as u32;
    let right = (clipped.right().round() as u32).min(width);
    let bottom = (clipped.bottom().round() as u32).min(height);
    if right <= left || bottom <= top {
        return None;
    }
    Some((left, top, right - left, bottom - top))
}

pub const fn blur_downsample_factor(radius: u32) -> u32 {
    let factor = radius / 3;
    if factor < 1 {
        1
    } else {
        factor
    }
}

/// Approximate blur: shrink the region by `radius / 3` and stretch it back.
pub fn blur_region(source: &RgbaImage, rect: Rect, radius: u32) -> EditResult<BlurCache> {
    let (x, y, width, height) = bounded_pixel_region(rect, source.width(), source.height())
        .ok_or(EditError::RegionOutsideImage { rect })?;

    let region = imageops::crop_imm(source, x, y, width, height).to_image();
    let factor = blur_downsample_factor(radius);
    let reduced = imageops::resize(
        &region,
        (width / factor).max(1),
        (height / factor).max(1),
        imageops::FilterType::Triangle,
    );
    let image = imageops::resize(&reduced, width, height, imageops::FilterType::Triangle);

    Ok(BlurCache {
        region: Rect::new(f64::from(x), f64::from(y), f64::from(width), f64::from(height)),
        image,
    })
}

/// Paints an opaque white rectangle over `rect`.
pub fn whiteout(image: &mut RgbaImage, rect: Rect) -> EditResult<()> {
    let (x, y, width, height) = bounded_pixel_region(rect, image.width(), image.height())
        .ok_or(EditError::RegionOutsideImage { rect })?;
    let area = imageproc::rect::Rect::at(x as i32, y as i32).of_size(width, height);
    draw_filled_rect_mut(image, area, Rgba([255, 255, 255, 255]));
    Ok(())
}

/// Copy of `image` restricted to `rect` plus the pixel-aligned rectangle actually kept.
pub fn crop(image: &RgbaImage, rect: Rect) -> EditResult<(RgbaImage, Rect)> {
    let (x, y, width, height) = bounded_pixel_region(rect, image.width(), image.height())
        .ok_or(EditError::RegionOutsideImage { rect })?;
    let cropped = imageops::crop_imm(image, x, y, width, height).to_image();
    let kept = Rect::new(f64::from(x), f64::from(y), f64::from(width), f64::from(height));
    Ok((cropped, kept))
}

/// Direction of the removed band. A vertical cut removes columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutAxis {
    Vertical,
    Horizontal,
}

/// Band removed from the base image, `at..at + size` along `axis`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StripCut {
    pub axis: CutAxis,
    pub at: f64,
    pub size: f64,
}

impl StripCut {
    /// Strip between two already-clamped coordinates; `None` when thinner than [`MIN_STRIP_SIZE`].
    pub fn between(axis: CutAxis, start: f64, end: f64) -> Option<Self> {
        let size = (end - start).abs();
        if size < MIN_STRIP_SIZE {
            return None;
        }
        Some(Self {
            axis,
            at: start.min(end),
            size,
        })
    }

    /// Before the strip: unchanged. After: shifted back by `size`. Inside: collapsed onto `at`.
    pub fn remap_coordinate(&self, value: f64) -> f64 {
        if value <= self.at {
            value
        } else if value > self.at + self.size {
            value - self.size
        } else {
            self.at
        }
    }

    pub fn remap_point(&self, point: Point) -> Point {
        match self.axis {
            CutAxis::Vertical => Point::new(self.remap_coordinate(point.x), point.y),
            CutAxis::Horizontal => Point::new(point.x, self.remap_coordinate(point.y)),
        }
    }

    pub fn remap_rect(&self, rect: Rect) -> Rect {
        Rect::from_points(
            self.remap_point(rect.top_left()),
            self.remap_point(rect.bottom_right()),
        )
    }
}

/// Image with the strip removed and the two remaining slices joined.
pub fn remove_strip(image: &RgbaImage, cut: &StripCut) -> EditResult<RgbaImage> {
    let (width, height) = image.dimensions();
    let extent = match cut.axis {
        CutAxis::Vertical => width,
        CutAxis::Horizontal => height,
    };
    let start = (cut.at.max(0.0).round() as u32).min(extent);
    let end = ((cut.at + cut.size).round().max(0.0) as u32).min(extent);
    let removed = end.saturating_sub(start);
    if removed == 0 {
        return Err(EditError::StripTooSmall { size: cut.size });
    }
    if removed >= extent {
        return Err(EditError::StripConsumesImage {
            size: cut.size,
            extent,
        });
    }

    let mut output = match cut.axis {
        CutAxis::Vertical => RgbaImage::new(width - removed, height),
        CutAxis::Horizontal => RgbaImage::new(width, height - removed),
    };

    match cut.axis {
        CutAxis::Vertical => {
            if start > 0 {
                output.copy_from(&slice(image, 0, 0, start, height), 0, 0)?;
            }
            if end < width {
                output.copy_from(&slice(image, end, 0, width - end, height), start, 0)?;
            }
        }
        CutAxis::Horizontal => {
            if start > 0 {
                output.copy_from(&slice(image, 0, 0, width, start), 0, 0)?;
            }
            if end < height {
                output.copy_from(&slice(image, 0, end, width, height - end), 0, start)?;
            }
        }
    }
    Ok(output)
}

fn slice(image: &RgbaImage, x: u32, y: u32, width: u32, height: u32) -> RgbaImage {
    imageops::crop_imm(image, x, y, width, height).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column_coded(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 0, 255]))
    }

    #[test]
    fn vertical_cut_remaps_points_around_strip() {
        let cut = StripCut::between(CutAxis::Vertical, 400.0, 500.0).expect("strip is wide enough");

        assert_eq!(cut.remap_point(Point::new(450.0, 20.0)), Point::new(400.0, 20.0));
        assert_eq!(cut.remap_point(Point::new(700.0, 20.0)), Point::new(600.0, 20.0));
        assert_eq!(cut.remap_point(Point::new(100.0, 20.0)), Point::new(100.0, 20.0));
    }

    #[test]
    fn strip_between_normalizes_direction_and_rejects_thin_strips() {
        let cut = StripCut::between(CutAxis::Horizontal, 80.0, 30.0).expect("strip");
        assert_eq!(cut.at, 30.0);
        assert_eq!(cut.size, 50.0);

        assert!(StripCut::between(CutAxis::Vertical, 10.0, 10.0).is_none());
        assert!(StripCut::between(CutAxis::Vertical, 10.0, 14.9).is_none());
    }

    #[test]
    fn remove_vertical_strip_joins_slices() {
        let image = column_coded(20, 4);
        let cut = StripCut::between(CutAxis::Vertical, 5.0, 12.0).expect("strip");
        let output = remove_strip(&image, &cut).expect("cut should succeed");

        assert_eq!(output.dimensions(), (13, 4));
        assert_eq!(output.get_pixel(4, 0)[0], 4);
        assert_eq!(output.get_pixel(5, 0)[0], 12);
        assert_eq!(output.get_pixel(12, 3)[0], 19);
    }

    #[test]
    fn remove_horizontal_strip_joins_slices() {
        let image = column_coded(4, 20);
        let cut = StripCut::between(CutAxis::Horizontal, 0.0, 6.0).expect("strip");
        let output = remove_strip(&image, &cut).expect("cut should succeed");

        assert_eq!(output.dimensions(), (4, 14));
        assert_eq!(output.get_pixel(0, 0)[1], 6);
    }

    #[test]
    fn remove_strip_rejects_whole_image() {
        let image = column_coded(10, 10);
        let cut = StripCut::between(CutAxis::Vertical, 0.0, 10.0).expect("strip");
        let err = remove_strip(&image, &cut).expect_err("removing everything should fail");
        assert!(matches!(err, EditError::StripConsumesImage { extent: 10, .. }));
    }

    #[test]
    fn blur_region_keeps_size_and_smooths_stripes() {
        let image = RgbaImage::from_fn(40, 40, |x, _| {
            if x % 2 == 0 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        let cache = blur_region(&image, Rect::new(-10.0, 5.0, 30.0, 20.0), BLUR_RADIUS)
            .expect("blur should succeed");

        assert_eq!(cache.region, Rect::new(0.0, 5.0, 20.0, 20.0));
        assert_eq!(cache.image.dimensions(), (20, 20));
        let middle = cache.image.get_pixel(10, 10)[0];
        assert!(middle > 40 && middle < 215, "expected mid gray, got {middle}");
    }

    #[test]
    fn blur_factor_has_floor_of_one() {
        assert_eq!(blur_downsample_factor(15), 5);
        assert_eq!(blur_downsample_factor(2), 1);
    }

    #[test]
    fn whiteout_paints_only_clamped_region() {
        let mut image = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255]));
        whiteout(&mut image, Rect::new(5.0, 5.0, 20.0, 20.0)).expect("whiteout");

        assert_eq!(image.get_pixel(9, 9), &Rgba([255, 255, 255, 255]));
        assert_eq!(image.get_pixel(4, 4), &Rgba([0, 0, 0, 255]));
        assert!(whiteout(&mut image, Rect::new(50.0, 50.0, 5.0, 5.0)).is_err());
    }
}
