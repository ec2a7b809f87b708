use crate::geometry::{Point, Rect};

/// Smallest width or height a corner resize may produce.
pub const MIN_RESIZE_EXTENT: f64 = 20.0;
/// Radius of the circular zone around a rectangle corner that grabs it.
pub const CORNER_HANDLE_RADIUS: f64 = 8.0;
/// Drawn handle size (edge length) for corner markers.
pub const CORNER_HANDLE_DRAW_SIZE: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    pub fn of(self, rect: &Rect) -> Point {
        match self {
            Self::TopLeft => rect.top_left(),
            Self::TopRight => rect.top_right(),
            Self::BottomLeft => rect.bottom_left(),
            Self::BottomRight => rect.bottom_right(),
        }
    }
}

pub fn corner_points(rect: &Rect) -> [(Corner, Point); 4] {
    Corner::ALL.map(|corner| (corner, corner.of(rect)))
}

pub fn point_within_radius(point: Point, center: Point, radius: f64) -> bool {
    point.distance_to(center) < radius
}

/// First corner (TL, TR, BL, BR order) whose circular handle contains `point`.
pub fn corner_at_point(rect: &Rect, point: Point) -> Option<Corner> {
    corner_points(rect)
        .into_iter()
        .find(|(_, corner)| point_within_radius(point, *corner, CORNER_HANDLE_RADIUS))
        .map(|(corner, _)| corner)
}

/// Square-box variant of [`corner_at_point`] used by highlighter fills.
pub fn corner_at_point_boxed(rect: &Rect, point: Point) -> Option<Corner> {
    corner_points(rect)
        .into_iter()
        .find(|(_, corner)| {
            (point.x - corner.x).abs() < CORNER_HANDLE_RADIUS
                && (point.y - corner.y).abs() < CORNER_HANDLE_RADIUS
        })
        .map(|(corner, _)| corner)
}

/// Moves one corner of `rect` to `point`, keeping the other sides fixed.
///
/// Returns `None` when the result would be narrower or shorter than
/// [`MIN_RESIZE_EXTENT`]; callers keep the previous rectangle in that case.
pub fn resize_from_corner(rect: &Rect, corner: Corner, point: Point) -> Option<Rect> {
    let (mut left, mut top, mut right, mut bottom) =
        (rect.left(), rect.top(), rect.right(), rect.bottom());
    match corner {
        Corner::TopLeft => {
            left = point.x;
            top = point.y;
        }
        Corner::TopRight => {
            right = point.x;
            top = point.y;
        }
        Corner::BottomLeft => {
            left = point.x;
            bottom = point.y;
        }
        Corner::BottomRight => {
            right = point.x;
            bottom = point.y;
        }
    }

    if right - left < MIN_RESIZE_EXTENT || bottom - top < MIN_RESIZE_EXTENT {
        return None;
    }
    Some(Rect::from_ltrb(left, top, right, bottom))
}
