//! Geometry Kernel
//!
//! Integer value types shared by every drawing and compositing path:
//! points, sizes, rectangles, line segments and circles. Rectangles use
//! half-open extents (`x..x+width`), so `contains` and `intersection`
//! agree about edge pixels.

use core::ops::{Add, AddAssign, Sub, SubAssign};

/// A position in surface or screen space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Point {
    fn sub_assign(&mut self, rhs: Point) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

/// A width/height pair. Both components are kept non-negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self {
            width: if width > 0 { width } else { 0 },
            height: if height > 0 { height } else { 0 },
        }
    }

    /// Number of pixels covered.
    #[inline]
    pub const fn area(&self) -> usize {
        (self.width * self.height) as usize
    }

    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// An axis-aligned rectangle: a top-left offset plus a size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub offset: Point,
    pub size: Size,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            offset: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub const fn at(offset: Point, size: Size) -> Self {
        Self { offset, size }
    }

    /// A rectangle anchored at the origin.
    pub const fn of_size(size: Size) -> Self {
        Self {
            offset: Point::new(0, 0),
            size,
        }
    }

    /// One past the bottom-right corner.
    #[inline]
    pub const fn end_point(&self) -> Point {
        Point::new(
            self.offset.x + self.size.width,
            self.offset.y + self.size.height,
        )
    }

    #[inline]
    pub const fn area(&self) -> usize {
        self.size.area()
    }

    /// Half-open containment test.
    pub const fn contains(&self, p: Point) -> bool {
        p.x >= self.offset.x
            && p.x < self.offset.x + self.size.width
            && p.y >= self.offset.y
            && p.y < self.offset.y + self.size.height
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        let a = self.end_point();
        let b = other.end_point();
        !(a.x <= other.offset.x
            || b.x <= self.offset.x
            || a.y <= other.offset.y
            || b.y <= self.offset.y)
    }

    /// Overlap of two rectangles, `None` when they are disjoint.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        let x = self.offset.x.max(other.offset.x);
        let y = self.offset.y.max(other.offset.y);
        let right = self.end_point().x.min(other.end_point().x);
        let bottom = self.end_point().y.min(other.end_point().y);
        if right > x && bottom > y {
            Some(Rect::new(x, y, right - x, bottom - y))
        } else {
            None
        }
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.size.is_empty() {
            return *other;
        }
        if other.size.is_empty() {
            return *self;
        }
        let x = self.offset.x.min(other.offset.x);
        let y = self.offset.y.min(other.offset.y);
        let right = self.end_point().x.max(other.end_point().x);
        let bottom = self.end_point().y.max(other.end_point().y);
        Rect::new(x, y, right - x, bottom - y)
    }

    /// The same rectangle shifted by `delta`.
    pub fn translated(&self, delta: Point) -> Rect {
        Rect::at(self.offset + delta, self.size)
    }
}

/// A line segment between two points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub start: Point,
    pub end: Point,
}

impl Line {
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self {
            start: Point::new(x0, y0),
            end: Point::new(x1, y1),
        }
    }

    pub const fn between(start: Point, end: Point) -> Self {
        Self { start, end }
    }
}

/// A circle given by center and radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Circle {
    pub center: Point,
    pub radius: i32,
}

impl Circle {
    pub const fn new(center: Point, radius: i32) -> Self {
        Self { center, radius }
    }
}
