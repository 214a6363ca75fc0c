//! Math utilities and types
//!
//! Provides the vector, matrix and rectangle types used for screen-space layout
//! and for building the renderer's projection.

pub use nalgebra::{Matrix4, Vector2, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Axis-aligned rectangle in screen space (pixels, top-left origin)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Top-left corner
    pub min: Vec2,
    /// Bottom-right corner
    pub max: Vec2,
}

impl Rect {
    /// Create a rectangle from its corners
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Create a rectangle from a position and a size
    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self { min: pos, max: pos + size }
    }

    /// A rectangle large enough to never clip anything
    pub fn unbounded() -> Self {
        Self {
            min: Vec2::new(-8192.0, -8192.0),
            max: Vec2::new(8192.0, 8192.0),
        }
    }

    /// Width in pixels (negative for inverted rectangles)
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    /// Height in pixels (negative for inverted rectangles)
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Size as a vector
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Center point
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Whether the point lies inside the rectangle (min inclusive, max exclusive)
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.y >= self.min.y && point.x < self.max.x && point.y < self.max.y
    }

    /// Whether the two rectangles share any area
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.min.x < other.max.x && self.max.x > other.min.x
            && self.min.y < other.max.y && self.max.y > other.min.y
    }

    /// Intersection of two rectangles
    ///
    /// The result may be empty (zero or negative extent) when they do not overlap.
    pub fn intersect(&self, other: &Rect) -> Rect {
        Rect {
            min: Vec2::new(self.min.x.max(other.min.x), self.min.y.max(other.min.y)),
            max: Vec2::new(self.max.x.min(other.max.x), self.max.y.min(other.max.y)),
        }
    }

    /// Grow (or shrink, for negative amounts) on every side
    pub fn expand(&self, amount: f32) -> Rect {
        Rect {
            min: self.min - Vec2::new(amount, amount),
            max: self.max + Vec2::new(amount, amount),
        }
    }

    /// Move by an offset
    pub fn translate(&self, offset: Vec2) -> Rect {
        Rect { min: self.min + offset, max: self.max + offset }
    }

    /// Whether the rectangle has no positive area
    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }
}

/// Orthographic projection mapping display space onto clip space
///
/// `display_pos` maps to (-1, 1) and `display_pos + display_size` maps to (1, -1),
/// so y grows downward on screen as it does in layout space.
pub fn orthographic_projection(display_pos: Vec2, display_size: Vec2) -> Mat4 {
    let left = display_pos.x;
    let right = display_pos.x + display_size.x;
    let top = display_pos.y;
    let bottom = display_pos.y + display_size.y;
    Mat4::new_orthographic(left, right, bottom, top, -1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rect_intersection() {
        let a = Rect::new(Vec2::new(0.0, 0.0), Vec2::new(100.0, 50.0));
        let b = Rect::new(Vec2::new(50.0, 25.0), Vec2::new(200.0, 200.0));
        let c = a.intersect(&b);

        assert_eq!(c.min, Vec2::new(50.0, 25.0));
        assert_eq!(c.max, Vec2::new(100.0, 50.0));
        assert!(a.overlaps(&b));
    }

    #[test]
    fn test_rect_disjoint_is_empty() {
        let a = Rect::from_pos_size(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
        let b = Rect::from_pos_size(Vec2::new(20.0, 0.0), Vec2::new(10.0, 10.0));

        assert!(!a.overlaps(&b));
        assert!(a.intersect(&b).is_empty());
    }

    #[test]
    fn test_rect_contains() {
        let r = Rect::from_pos_size(Vec2::new(10.0, 10.0), Vec2::new(20.0, 20.0));
        assert!(r.contains(Vec2::new(10.0, 10.0)));
        assert!(r.contains(Vec2::new(29.9, 29.9)));
        assert!(!r.contains(Vec2::new(30.0, 15.0)));
    }

    #[test]
    fn test_projection_maps_display_corners() {
        let proj = orthographic_projection(Vec2::new(0.0, 0.0), Vec2::new(800.0, 600.0));

        let top_left = proj * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(top_left.x, -1.0, epsilon = 1e-6);
        assert_relative_eq!(top_left.y, 1.0, epsilon = 1e-6);

        let bottom_right = proj * Vec4::new(800.0, 600.0, 0.0, 1.0);
        assert_relative_eq!(bottom_right.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(bottom_right.y, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_projection_honors_display_origin() {
        let proj = orthographic_projection(Vec2::new(100.0, 50.0), Vec2::new(200.0, 100.0));
        let center = proj * Vec4::new(200.0, 100.0, 0.0, 1.0);

        assert_relative_eq!(center.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(center.y, 0.0, epsilon = 1e-6);
    }
}
