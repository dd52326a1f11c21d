//! Bounding rectangles for rendering events.

use serde_derive::{Deserialize, Serialize};

/// Rectangle (x, y, width, height) from the LOWER LEFT corner of the page.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    /// The rectangle spanned by two arbitrary corner points.
    pub fn from_corners(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        let left = x0.min(x1);
        let bottom = y0.min(y1);
        Rect {
            x: left,
            y: bottom,
            width: (x1 - x0).abs(),
            height: (y1 - y0).abs(),
        }
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y
    }

    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    /// The smallest rectangle containing both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Rect {
        let left = self.left().min(other.left());
        let bottom = self.bottom().min(other.bottom());
        let right = self.right().max(other.right());
        let top = self.top().max(other.top());
        Rect {
            x: left,
            y: bottom,
            width: right - left,
            height: top - bottom,
        }
    }

    /// Rendering events must carry finite, non-degenerate boxes.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union() {
        let a = Rect::new(0.0, 0.0, 10.0, 5.0);
        let b = Rect::new(5.0, 2.0, 10.0, 10.0);
        let u = a.union(&b);
        assert_eq!(u, Rect::new(0.0, 0.0, 15.0, 12.0));
    }

    #[test]
    fn test_from_corners_normalizes() {
        let r = Rect::from_corners(10.0, 12.0, 4.0, 2.0);
        assert_eq!(r, Rect::new(4.0, 2.0, 6.0, 10.0));
    }
}
