//! Defect shapes: one rasteriser and one bounding-box rule per variant.
//!
//! The shape set is closed. Adding a shape means adding a [`Shape`] variant
//! and its arms in [`Shape::raw_bbox`] and [`Shape::draw`]; the compiler flags
//! any arm that is missing.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;
use serde::Serialize;

use crate::geometry::PixelBox;

/// Number of vertices in a crack zigzag.
pub const ZIGZAG_SEGMENTS: usize = 8;

// ---------------------------------------------------------------------------
// Shape
// ---------------------------------------------------------------------------

/// Geometry of a defect, independent of where it is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    /// Filled disc (pothole).
    Circle { diameter: u32 },
    /// Thick zigzag stroke spanning `length` pixels vertically (crack).
    Polyline { length: u32, thickness: u32 },
}

impl Shape {
    /// Unclipped bounding box of the shape centred at `(cx, cy)`.
    ///
    /// Circles use `(cx − r, cy − r, 2r, 2r)` with `r = diameter / 2`.
    /// Polylines use the tight box of the zigzag vertices padded by the
    /// stroke thickness on every side.
    pub fn raw_bbox(&self, cx: i32, cy: i32) -> PixelBox {
        match *self {
            Self::Circle { diameter } => {
                let r = (diameter / 2) as i32;
                PixelBox::new(cx - r, cy - r, 2 * r, 2 * r)
            }
            Self::Polyline { length, thickness } => {
                let points = zigzag_points(cx, cy, length, thickness);
                let tight = PixelBox::enclosing(&points)
                    .unwrap_or_else(|| PixelBox::new(cx, cy, 1, 1));
                tight.padded(thickness as i32)
            }
        }
    }

    /// Rasterise the shape centred at `(cx, cy)`. Pixels outside the canvas
    /// are discarded.
    pub fn draw(&self, canvas: &mut RgbImage, cx: i32, cy: i32, color: Rgb<u8>) {
        match *self {
            Self::Circle { diameter } => {
                draw_filled_circle_mut(canvas, (cx, cy), (diameter / 2) as i32, color);
            }
            Self::Polyline { length, thickness } => {
                let points = zigzag_points(cx, cy, length, thickness);
                draw_thick_polyline(canvas, &points, thickness, color);
            }
        }
    }
}

/// Vertices of the crack zigzag: [`ZIGZAG_SEGMENTS`] points evenly spread over
/// `length` pixels vertically around `cy`, alternating `±2·thickness` around `cx`.
pub fn zigzag_points(cx: i32, cy: i32, length: u32, thickness: u32) -> Vec<(i32, i32)> {
    let amp = 2.0 * thickness as f64;
    let length = length as f64;
    (0..ZIGZAG_SEGMENTS)
        .map(|i| {
            let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            let x = cx as f64 + sign * amp;
            let y = cy as f64 - length / 2.0 + i as f64 * length / (ZIGZAG_SEGMENTS - 1) as f64;
            (x as i32, y as i32)
        })
        .collect()
}

/// Stroke a polyline `thickness` pixels wide: one filled quad per segment
/// plus a disc on every vertex so the joints stay closed.
fn draw_thick_polyline(canvas: &mut RgbImage, points: &[(i32, i32)], thickness: u32, color: Rgb<u8>) {
    let half = thickness as f32 / 2.0;
    for pair in points.windows(2) {
        let (x0, y0) = (pair[0].0 as f32, pair[0].1 as f32);
        let (x1, y1) = (pair[1].0 as f32, pair[1].1 as f32);
        let (dx, dy) = (x1 - x0, y1 - y0);
        let len = (dx * dx + dy * dy).sqrt();
        if len == 0.0 {
            continue;
        }
        let (nx, ny) = (-dy / len * half, dx / len * half);
        let quad = [
            Point::new((x0 + nx).round() as i32, (y0 + ny).round() as i32),
            Point::new((x1 + nx).round() as i32, (y1 + ny).round() as i32),
            Point::new((x1 - nx).round() as i32, (y1 - ny).round() as i32),
            Point::new((x0 - nx).round() as i32, (y0 - ny).round() as i32),
        ];
        if quad[0] == quad[3] || quad[1] == quad[2] {
            // Hairline stroke: the quad collapses onto the segment itself.
            draw_line_segment_mut(canvas, (x0, y0), (x1, y1), color);
        } else {
            draw_polygon_mut(canvas, &quad, color);
        }
    }
    let joint_radius = (thickness / 2) as i32;
    if joint_radius > 0 {
        for &(x, y) in points {
            draw_filled_circle_mut(canvas, (x, y), joint_radius, color);
        }
    }
}
