//! Bounding-box arithmetic shared by the shape handlers and the labeler.
//!
//! Raw boxes live in signed pixel space because defects enter and leave the
//! frame; only the clipped box is ever normalized.

use serde::Serialize;

/// Axis-aligned box in pixel coordinates; `(x, y)` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Tight box around a point set, counting pixels inclusively
    /// (a single point yields a 1×1 box). Returns `None` for an empty set.
    pub fn enclosing(points: &[(i32, i32)]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let (mut min_x, mut min_y) = *first;
        let (mut max_x, mut max_y) = *first;
        for &(x, y) in rest {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Some(Self::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }

    /// Grow the box by `pad` pixels on every side.
    pub fn padded(self, pad: i32) -> Self {
        Self::new(
            self.x - pad,
            self.y - pad,
            self.width + 2 * pad,
            self.height + 2 * pad,
        )
    }

    /// Clip to a `frame_width × frame_height` frame.
    ///
    /// The corner is pinned to the frame (`x = max(0, x)`, `y = max(0, y)`)
    /// and the extent is capped by the room left after it
    /// (`w = min(w, frame_width − x)`, `h = min(h, frame_height − y)`).
    /// Returns `None` when the result has zero or negative width or height.
    pub fn clip_to_frame(self, frame_width: u32, frame_height: u32) -> Option<Self> {
        let x = (self.x as i64).max(0);
        let y = (self.y as i64).max(0);
        let width = (self.width as i64).min(frame_width as i64 - x);
        let height = (self.height as i64).min(frame_height as i64 - y);
        if width <= 0 || height <= 0 {
            return None;
        }
        Some(Self::new(x as i32, y as i32, width as i32, height as i32))
    }

    /// Divide `x, width` by the frame width and `y, height` by the frame height.
    ///
    /// Only meaningful for boxes already clipped to the same frame.
    pub fn normalize(self, frame_width: u32, frame_height: u32) -> NormalizedBox {
        let fw = frame_width as f64;
        let fh = frame_height as f64;
        NormalizedBox {
            x: self.x as f64 / fw,
            y: self.y as f64 / fh,
            width: self.width as f64 / fw,
            height: self.height as f64 / fh,
        }
    }
}

/// Bounding box in frame-relative units, every component in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizedBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedBox {
    /// True when the box lies inside the unit square.
    pub fn is_within_unit_square(&self) -> bool {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        in_unit(self.x)
            && in_unit(self.y)
            && in_unit(self.width)
            && in_unit(self.height)
            && self.x + self.width <= 1.0 + f64::EPSILON
            && self.y + self.height <= 1.0 + f64::EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enclosing_counts_pixels_inclusively() {
        let b = PixelBox::enclosing(&[(10, 20), (14, 20), (12, 29)]).unwrap();
        assert_eq!(b, PixelBox::new(10, 20, 5, 10));
    }

    #[test]
    fn enclosing_empty_is_none() {
        assert!(PixelBox::enclosing(&[]).is_none());
    }

    #[test]
    fn padding_grows_every_side() {
        let b = PixelBox::new(10, 10, 4, 6).padded(3);
        assert_eq!(b, PixelBox::new(7, 7, 10, 12));
    }

    #[test]
    fn clip_inside_is_identity() {
        let b = PixelBox::new(940, 480, 120, 120);
        assert_eq!(b.clip_to_frame(1920, 1080), Some(b));
    }

    #[test]
    fn clip_pins_top_left_corner_without_shrinking() {
        let b = PixelBox::new(-20, -50, 100, 100);
        assert_eq!(
            b.clip_to_frame(1920, 1080),
            Some(PixelBox::new(0, 0, 100, 100))
        );
    }

    #[test]
    fn clip_keeps_full_height_when_leaving_through_top() {
        let b = PixelBox::new(940, -50, 120, 120);
        assert_eq!(
            b.clip_to_frame(1920, 1080),
            Some(PixelBox::new(940, 0, 120, 120))
        );
    }

    #[test]
    fn clip_trims_bottom_right_overhang() {
        let b = PixelBox::new(1900, 1000, 100, 100);
        assert_eq!(
            b.clip_to_frame(1920, 1080),
            Some(PixelBox::new(1900, 1000, 20, 80))
        );
    }

    #[test]
    fn clip_drops_box_below_frame() {
        let b = PixelBox::new(940, 1170, 120, 120);
        assert_eq!(b.clip_to_frame(1920, 1080), None);
    }

    #[test]
    fn clip_drops_box_right_of_frame() {
        let b = PixelBox::new(1920, 100, 40, 40);
        assert_eq!(b.clip_to_frame(1920, 1080), None);
    }

    #[test]
    fn box_above_frame_is_pinned_to_top_edge() {
        let b = PixelBox::new(940, -210, 120, 120);
        let clipped = b.clip_to_frame(1920, 1080).unwrap();
        assert_eq!(clipped, PixelBox::new(940, 0, 120, 120));
        assert!(clipped.normalize(1920, 1080).is_within_unit_square());
    }

    #[test]
    fn normalize_matches_reference_circle() {
        let n = PixelBox::new(940, 480, 120, 120).normalize(1920, 1080);
        assert!((n.x - 0.489_583).abs() < 1e-4);
        assert!((n.y - 0.444_444).abs() < 1e-4);
        assert!((n.width - 0.0625).abs() < 1e-9);
        assert!((n.height - 0.111_111).abs() < 1e-4);
        assert!(n.is_within_unit_square());
    }

    #[test]
    fn full_frame_box_is_within_unit_square() {
        let n = PixelBox::new(0, 0, 1920, 1080).normalize(1920, 1080);
        assert!(n.is_within_unit_square());
    }
}
