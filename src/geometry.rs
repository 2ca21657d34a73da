use std::ops::{Add, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Point,
    pub size: Size,
}

impl Rect {
    pub fn from_min_size(min: Point, size: Size) -> Self {
        Self { min, size }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x
            && p.y >= self.min.y
            && p.x <= self.min.x + self.size.width
            && p.y <= self.min.y + self.size.height
    }
}

/// Maps pointer positions reported by the host (screen space) to board space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scale: f64,
    pub offset: Point,
}

impl Viewport {
    pub fn to_board(&self, screen: Point) -> Point {
        let scale = if self.scale > 0.0 { self.scale } else { 1.0 };
        Point::new(
            (screen.x - self.offset.x) / scale,
            (screen.y - self.offset.y) / scale,
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Point::ZERO,
        }
    }
}
