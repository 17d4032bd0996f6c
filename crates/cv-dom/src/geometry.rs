//! Geometry
//!
//! DOMRect as returned by getBoundingClientRect, plus the few operations the
//! highlight overlay needs.

/// DOMRect - rectangle geometry
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DOMRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DOMRect {
    /// Create with dimensions
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Top edge (same as y)
    pub fn top(&self) -> f64 {
        self.y
    }

    /// Right edge
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Left edge (same as x)
    pub fn left(&self) -> f64 {
        self.x
    }

    /// Zero-area rects come from elements that are not rendered
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Smallest rect containing both
    pub fn union(&self, other: &DOMRect) -> DOMRect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        DOMRect {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }

    /// Grow by `amount` on every side
    pub fn inflate(&self, amount: f64) -> DOMRect {
        DOMRect {
            x: self.x - amount,
            y: self.y - amount,
            width: self.width + amount * 2.0,
            height: self.height + amount * 2.0,
        }
    }

    /// Move by an offset (viewport -> document coordinates)
    pub fn translate(&self, dx: f64, dy: f64) -> DOMRect {
        DOMRect { x: self.x + dx, y: self.y + dy, ..*self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union() {
        let a = DOMRect::from_xywh(0.0, 0.0, 10.0, 10.0);
        let b = DOMRect::from_xywh(5.0, 20.0, 10.0, 5.0);
        assert_eq!(a.union(&b), DOMRect::from_xywh(0.0, 0.0, 15.0, 25.0));
    }

    #[test]
    fn test_inflate_and_translate() {
        let r = DOMRect::from_xywh(10.0, 10.0, 20.0, 20.0).inflate(10.0).translate(0.0, 100.0);
        assert_eq!(r, DOMRect::from_xywh(0.0, 100.0, 40.0, 40.0));
        assert!(DOMRect::default().is_empty());
    }
}
