//! Geometric primitives shared by segments and paragraph features.

use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box in page coordinates (points, top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge
    pub left: f32,
    /// Top edge
    pub top: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Horizontal center.
    pub fn center_x(&self) -> f32 {
        self.left + self.width / 2.0
    }

    /// Vertical center.
    pub fn center_y(&self) -> f32 {
        self.top + self.height / 2.0
    }

    /// Box area.
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Smallest box covering both operands.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        BoundingBox::new(left, top, right - left, bottom - top)
    }

    /// Whether all coordinates are finite and dimensions non-negative.
    pub fn is_well_formed(&self) -> bool {
        self.left.is_finite()
            && self.top.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width >= 0.0
            && self.height >= 0.0
    }
}

/// Font descriptor carried by tokens and paragraphs.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FontStyle {
    /// Font size in points (0.0 when unknown)
    pub size: f32,
    /// Whether the font appears to be bold
    pub bold: bool,
    /// Whether the font appears to be italic
    pub italic: bool,
}

impl FontStyle {
    /// Create a new font style.
    pub fn new(size: f32, bold: bool, italic: bool) -> Self {
        Self { size, bold, italic }
    }

    /// Plain font at the given size.
    pub fn regular(size: f32) -> Self {
        Self::new(size, false, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_accessors() {
        let bb = BoundingBox::new(10.0, 20.0, 100.0, 40.0);
        assert_eq!(bb.right(), 110.0);
        assert_eq!(bb.bottom(), 60.0);
        assert_eq!(bb.center_x(), 60.0);
        assert_eq!(bb.center_y(), 40.0);
        assert_eq!(bb.area(), 4000.0);
    }

    #[test]
    fn test_bounding_box_union() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 5.0, 10.0, 10.0);
        let u = a.union(&b);
        assert_eq!(u, BoundingBox::new(0.0, 0.0, 15.0, 15.0));
    }

    #[test]
    fn test_bounding_box_well_formed() {
        assert!(BoundingBox::new(0.0, 0.0, 1.0, 1.0).is_well_formed());
        assert!(!BoundingBox::new(0.0, 0.0, -1.0, 1.0).is_well_formed());
        assert!(!BoundingBox::new(f32::NAN, 0.0, 1.0, 1.0).is_well_formed());
    }
}
