//! Shared geometric and color primitives used across editor, render and storage modules.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, vector: Vector) -> Self {
        Self::new(self.x + vector.dx, self.y + vector.dy)
    }

    pub fn vector_to(self, other: Point) -> Vector {
        Vector::new(other.x - self.x, other.y - self.y)
    }

    pub fn distance_to(self, other: Point) -> f64 {
        self.vector_to(other).length()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector {
    pub dx: f64,
    pub dy: f64,
}

impl Vector {
    pub const fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    pub fn length(self) -> f64 {
        self.dx.hypot(self.dy)
    }

    pub fn negate(self) -> Self {
        Self::new(-self.dx, -self.dy)
    }
}

/// Axis-aligned rectangle; width and height are never negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Normalized rectangle spanning two arbitrary corners.
    pub fn from_points(a: Point, b: Point) -> Self {
        Self::from_ltrb(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y))
    }

    pub fn from_ltrb(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self::new(left, top, right - left, bottom - top)
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.left(), self.top())
    }

    pub fn top_right(&self) -> Point {
        Point::new(self.right(), self.top())
    }

    pub fn bottom_left(&self) -> Point {
        Point::new(self.left(), self.bottom())
    }

    pub fn bottom_right(&self) -> Point {
        Point::new(self.right(), self.bottom())
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }

    pub fn translate(self, vector: Vector) -> Self {
        Self::new(self.x + vector.dx, self.y + vector.dy, self.width, self.height)
    }

    pub fn inflate(self, amount: f64) -> Self {
        Self::from_ltrb(
            self.left() - amount,
            self.top() - amount,
            self.right() + amount,
            self.bottom() + amount,
        )
    }

    /// Shrinks each side by `amount`; collapses to the center when too small.
    pub fn deflate(self, amount: f64) -> Self {
        let center = self.center();
        let left = (self.left() + amount).min(center.x);
        let top = (self.top() + amount).min(center.y);
        let right = (self.right() - amount).max(center.x);
        let bottom = (self.bottom() - amount).max(center.y);
        Self::from_ltrb(left, top, right, bottom)
    }

    pub fn union(self, other: Rect) -> Self {
        Self::from_ltrb(
            self.left().min(other.left()),
            self.top().min(other.top()),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    pub fn intersect(self, other: Rect) -> Option<Self> {
        let left = self.left().max(other.left());
        let top = self.top().max(other.top());
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= left || bottom <= top {
            return None;
        }
        Some(Self::from_ltrb(left, top, right, bottom))
    }
}

/// Side of a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

/// Straight ARGB color as persisted in project records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const RED: Self = Self::new(255, 255, 0, 0);
    pub const BLUE: Self = Self::new(255, 0, 0, 255);
    pub const ORANGE: Self = Self::new(255, 255, 165, 0);
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    pub const BLACK: Self = Self::new(255, 0, 0, 0);
    pub const GRAY: Self = Self::new(255, 128, 128, 128);
    pub const SHADOW: Self = Self::new(100, 0, 0, 0);

    pub const fn new(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { a, r, g, b }
    }

    pub const fn from_argb(value: u32) -> Self {
        Self::new(
            (value >> 24) as u8,
            (value >> 16) as u8,
            (value >> 8) as u8,
            value as u8,
        )
    }

    pub const fn to_argb(self) -> u32 {
        ((self.a as u32) << 24) | ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self::new(a, self.r, self.g, self.b)
    }
}

/// Shortest distance from `point` to the segment `start..end`.
pub fn distance_to_segment(point: Point, start: Point, end: Point) -> f64 {
    let segment = start.vector_to(end);
    let length_squared = segment.dx * segment.dx + segment.dy * segment.dy;
    if length_squared == 0.0 {
        return point.distance_to(start);
    }

    let t = (((point.x - start.x) * segment.dx + (point.y - start.y) * segment.dy)
        / length_squared)
        .clamp(0.0, 1.0);
    let projection = Point::new(start.x + t * segment.dx, start.y + t * segment.dy);
    point.distance_to(projection)
}

/// Where the ray from `origin` toward `target` leaves `rect`.
///
/// Every edge the ray can cross is tried and the nearest crossing with a
/// positive parameter wins. Returns `origin` when `target == origin` or no
/// edge is crossed.
pub fn ray_rect_exit(rect: &Rect, origin: Point, target: Point) -> (Point, Option<Side>) {
    let dx = target.x - origin.x;
    let dy = target.y - origin.y;
    if dx == 0.0 && dy == 0.0 {
        return (origin, None);
    }

    let candidates = [
        (dy < 0.0, Side::Top, (rect.top() - origin.y) / dy),
        (dy > 0.0, Side::Bottom, (rect.bottom() - origin.y) / dy),
        (dx < 0.0, Side::Left, (rect.left() - origin.x) / dx),
        (dx > 0.0, Side::Right, (rect.right() - origin.x) / dx),
    ];

    let nearest = candidates
        .into_iter()
        .filter(|(applies, _, t)| *applies && *t > 0.0)
        .map(|(_, side, t)| (side, t))
        .min_by(|a, b| a.1.total_cmp(&b.1));

    match nearest {
        Some((side, t)) => (Point::new(origin.x + t * dx, origin.y + t * dy), Some(side)),
        None => (origin, None),
    }
}
