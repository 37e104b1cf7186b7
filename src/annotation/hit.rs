use crate::annotation::model::{Geometry, Shape, Tool};
use crate::foundation::core::{Point, Size, Vec2};

/// Hit radius in displayed pixels.
pub const HIT_RADIUS_PX: f64 = 15.0;
/// Displayed canvas size assumed when none (or a degenerate one) is given.
pub const DEFAULT_HIT_CANVAS: Size = Size::new(1000.0, 1000.0);
/// Ellipse hits accept a slightly inflated boundary.
const ELLIPSE_SLACK: f64 = 1.1;
const TEXT_BOX_HALF_HEIGHT: f64 = 0.05;
const TEXT_CHAR_WIDTH: f64 = TEXT_BOX_HALF_HEIGHT * 0.6;
const TEXT_FALLBACK_CHARS: usize = 5;

/// Whether `point` selects `shape`. Both are in normalized coordinates; `canvas` is the size
/// the canvas is displayed at, used to keep the hit radius constant in screen pixels.
pub fn is_point_in_shape(point: Point, shape: &Shape, canvas: Option<Size>) -> bool {
    let canvas = canvas
        .filter(|c| c.width > 0.0 && c.height > 0.0)
        .unwrap_or(DEFAULT_HIT_CANVAS);
    let threshold = (HIT_RADIUS_PX / canvas.width).max(HIT_RADIUS_PX / canvas.height);

    if shape.tool.is_freehand() {
        let Geometry::Points(points) = &shape.geometry else {
            return false;
        };
        return points
            .windows(2)
            .any(|pair| dist_to_segment(point, pair[0], pair[1]) < threshold);
    }

    let Some((origin, size)) = shape.geometry.as_box() else {
        return false;
    };

    match shape.tool {
        Tool::Rectangle => {
            let x = if size.x < 0.0 { origin.x + size.x } else { origin.x };
            let y = if size.y < 0.0 { origin.y + size.y } else { origin.y };
            let (w, h) = (size.x.abs(), size.y.abs());
            point.x >= x && point.x <= x + w && point.y >= y && point.y <= y + h
        }
        Tool::Ellipse => {
            let center = origin + size * 0.5;
            let (rx, ry) = ((size.x / 2.0).abs(), (size.y / 2.0).abs());
            if rx == 0.0 || ry == 0.0 {
                return false;
            }
            let v = (point.x - center.x).powi(2) / rx.powi(2)
                + (point.y - center.y).powi(2) / ry.powi(2);
            v <= ELLIPSE_SLACK
        }
        Tool::Line | Tool::Arrow => dist_to_segment(point, origin, origin + size) < threshold,
        Tool::Text => {
            let chars = shape
                .text
                .as_deref()
                .map(|t| t.chars().count())
                .filter(|n| *n > 0)
                .unwrap_or(TEXT_FALLBACK_CHARS);
            let width = chars as f64 * TEXT_CHAR_WIDTH;
            point.x >= origin.x
                && point.x <= origin.x + width
                && point.y >= origin.y - TEXT_BOX_HALF_HEIGHT
                && point.y <= origin.y + TEXT_BOX_HALF_HEIGHT
        }
        Tool::Pen | Tool::Highlighter | Tool::Eraser => false,
    }
}

/// Copy of `shape` translated by `delta` (normalized units).
pub fn move_shape(shape: &Shape, delta: Vec2) -> Shape {
    let mut moved = shape.clone();
    moved.geometry.translate(delta);
    moved
}

fn dist_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let l2 = ab.hypot2();
    if l2 == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / l2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

#[cfg(test)]
#[path = "../../tests/unit/annotation/hit.rs"]
mod tests;
