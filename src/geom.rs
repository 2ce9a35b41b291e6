//! Axis-aligned rectangles used by the dirty-region tracker and the
//! presentation path.
use cgmath::{Point2, Vector2};

/// An axis-aligned rectangle, represented by its minimum and maximum corners.
///
/// An empty rectangle (`max <= min` on either axis) has an area of zero and
/// contains nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Point2<f32>,
    pub max: Point2<f32>,
}

impl Rect {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min: Point2::new(min_x, min_y),
            max: Point2::new(max_x, max_y),
        }
    }

    pub fn from_origin_size(origin: Point2<f32>, size: Vector2<f32>) -> Self {
        Self {
            min: origin,
            max: origin + size,
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn area(&self) -> f32 {
        if self.is_empty() {
            0.0
        } else {
            self.width() * self.height()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.max.x <= self.min.x || self.max.y <= self.min.y
    }

    /// `true` if `other` lies entirely within `self`.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.min.x >= self.min.x
            && other.min.y >= self.min.y
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
    }

    pub fn contains_point(&self, p: Point2<f32>) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(
            self.min.x.min(other.min.x),
            self.min.y.min(other.min.y),
            self.max.x.max(other.max.x),
            self.max.y.max(other.max.y),
        )
    }

    pub fn translate(&self, d: Vector2<f32>) -> Rect {
        Rect {
            min: self.min + d,
            max: self.max + d,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containment() {
        let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
        let inner = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(outer.contains_rect(&inner));
        assert!(!inner.contains_rect(&outer));
        assert!(outer.contains_rect(&outer));
    }

    #[test]
    fn area_of_empty_rect_is_zero() {
        assert_eq!(Rect::new(10.0, 10.0, 10.0, 20.0).area(), 0.0);
        assert_eq!(Rect::new(10.0, 10.0, 0.0, 0.0).area(), 0.0);
        assert_eq!(Rect::new(0.0, 0.0, 4.0, 2.0).area(), 8.0);
    }

    #[test]
    fn translate_round_trips() {
        let r = Rect::new(3.5, -2.0, 10.0, 8.25);
        let d = Vector2::new(12.5, -7.0);
        assert_eq!(r.translate(d).translate(-d), r);
    }

    #[test]
    fn union_covers_both() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, -5.0, 20.0, 8.0);
        let u = a.union(&b);
        assert!(u.contains_rect(&a));
        assert!(u.contains_rect(&b));
    }
}
