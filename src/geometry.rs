//! Screen-space primitives shared by the task drag and the panel drag.
//!
//! Coordinates are terminal cells expressed as `f32` so that the pointer
//! distance checks stay exact for fractional activation thresholds.

use std::ops::{Add, Sub};

use tuirealm::ratatui::layout::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn from_cell(column: u16, row: u16) -> Self {
        Self::new(f32::from(column), f32::from(row))
    }

    pub fn distance(self, other: Self) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn length(self) -> f32 {
        self.distance(Self::ORIGIN)
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Axis-aligned rectangle, half-open on the right and bottom edges.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Region {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Region {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

impl From<Rect> for Region {
    fn from(rect: Rect) -> Self {
        Self::new(
            f32::from(rect.x),
            f32::from(rect.y),
            f32::from(rect.width),
            f32::from(rect.height),
        )
    }
}

/// Where a drag began: the pointer position and the dragged element's
/// origin at that instant. Everything else is derived from the delta.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragAnchor {
    pub pointer_start: Point,
    pub element_start: Point,
}

impl DragAnchor {
    pub fn new(pointer_start: Point, element_start: Point) -> Self {
        Self {
            pointer_start,
            element_start,
        }
    }

    pub fn delta(&self, pointer: Point) -> Point {
        pointer - self.pointer_start
    }

    pub fn element_position(&self, pointer: Point) -> Point {
        self.element_start + self.delta(pointer)
    }

    /// True once the pointer has travelled strictly farther than `threshold`.
    pub fn exceeds(&self, pointer: Point, threshold: f32) -> bool {
        self.delta(pointer).length() > threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_contains_is_half_open() {
        let region = Region::new(0.0, 0.0, 10.0, 5.0);
        assert!(region.contains(Point::new(0.0, 0.0)));
        assert!(region.contains(Point::new(9.5, 4.5)));
        assert!(!region.contains(Point::new(10.0, 2.0)));
        assert!(!region.contains(Point::new(3.0, 5.0)));
    }

    #[test]
    fn anchor_tracks_pointer_delta() {
        let anchor = DragAnchor::new(Point::new(5.0, 5.0), Point::new(2.0, 3.0));
        let pointer = Point::new(8.0, 9.0);
        assert_eq!(anchor.delta(pointer), Point::new(3.0, 4.0));
        assert_eq!(anchor.element_position(pointer), Point::new(5.0, 7.0));
    }

    #[test]
    fn activation_requires_strictly_greater_distance() {
        let anchor = DragAnchor::new(Point::ORIGIN, Point::ORIGIN);
        assert!(!anchor.exceeds(Point::new(3.0, 4.0), 5.0));
        assert!(anchor.exceeds(Point::new(3.0, 4.1), 5.0));
    }

    #[test]
    fn region_from_rect_keeps_cells() {
        let region = Region::from(Rect::new(2, 3, 4, 6));
        assert_eq!(region.center(), Point::new(4.0, 6.0));
        assert_eq!(region.origin(), Point::new(2.0, 3.0));
    }
}
