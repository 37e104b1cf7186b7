//! Progressive annotation rendering.
//!
//! A set is always rendered from scratch: the surface is cleared, then each shape is drawn at the
//! requested reveal `progress` in `0..=1`. Animation is driven by re-rendering the same set at
//! increasing progress values.

use std::f64::consts::{FRAC_PI_6, TAU};

use kurbo::Shape as _;

use crate::annotation::geometry::{Placement, Projector, stroke_scale_factor};
use crate::annotation::model::{AnnotationSet, Geometry, Shape, Tool};
use crate::foundation::core::{BezPath, Point, Vec2};
use crate::foundation::error::ReviewResult;
use crate::render::surface::{AnnotationSurface, CompositeMode, PaintState};

const HIGHLIGHTER_ALPHA: f64 = 0.4;
/// Highlighter and eraser strokes are this many times wider than the recorded width.
const WIDE_STROKE_MULTIPLIER: f64 = 3.0;
/// Arrow shafts finish at 1/1.2 of the reveal; the head grows over the last fifth.
const ARROW_SHAFT_RATE: f64 = 1.2;
const ARROW_HEAD_START: f64 = 0.8;
const ARROW_HEAD_RATE: f64 = 5.0;
const ARC_TOLERANCE: f64 = 0.1;

/// Clear `surface` and draw every shape of `set` revealed up to `progress`.
///
/// `progress <= 0` leaves the surface cleared. Shapes that cannot be drawn are skipped.
#[tracing::instrument(level = "trace", skip_all, fields(shapes = set.shapes.len(), progress = progress))]
pub fn render_annotation_set<S>(surface: &mut S, set: &AnnotationSet, progress: f64) -> ReviewResult<()>
where
    S: AnnotationSurface + ?Sized,
{
    surface.clear();

    let progress = if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    };
    if progress <= 0.0 {
        return Ok(());
    }

    for shape in &set.shapes {
        let drawn = draw_shape(surface, shape, progress, set.aspect_ratio);
        surface.set_paint_state(PaintState::default());
        drawn?;
    }
    Ok(())
}

fn draw_shape<S>(
    surface: &mut S,
    shape: &Shape,
    progress: f64,
    container_aspect: Option<f64>,
) -> ReviewResult<()>
where
    S: AnnotationSurface + ?Sized,
{
    let (w, h) = (f64::from(surface.width()), f64::from(surface.height()));
    let projector = Projector::new(
        w,
        h,
        container_aspect.or(shape.aspect_ratio),
        shape.space,
    );
    let scale_factor = stroke_scale_factor(w, h);

    let wide = matches!(shape.tool, Tool::Highlighter | Tool::Eraser);
    let base_width = if wide {
        shape.stroke_width * WIDE_STROKE_MULTIPLIER
    } else {
        shape.stroke_width
    };
    surface.set_paint_state(PaintState {
        color: shape.color,
        alpha: if shape.tool == Tool::Highlighter {
            HIGHLIGHTER_ALPHA
        } else {
            1.0
        },
        line_width: base_width * scale_factor,
        composite: if shape.tool == Tool::Eraser {
            CompositeMode::DestinationOut
        } else {
            CompositeMode::SourceOver
        },
        dash: Vec::new(),
    });

    if shape.tool.is_freehand() {
        let Geometry::Points(points) = &shape.geometry else {
            return Ok(());
        };
        return match freehand_path(points, progress, &projector) {
            Some(path) => surface.stroke_path(&path),
            None => Ok(()),
        };
    }

    let Some(place) = projector.place(&shape.geometry) else {
        tracing::debug!(tool = shape.tool.wire_name(), "primitive shape has no box geometry");
        return Ok(());
    };

    match shape.tool {
        Tool::Rectangle => {
            if progress < 1.0 {
                let perimeter = place.perimeter();
                let mut state = surface.paint_state().clone();
                state.dash = vec![perimeter * progress, perimeter];
                surface.set_paint_state(state);
            }
            surface.stroke_path(&rect_path(&place))
        }
        Tool::Ellipse => surface.stroke_path(&ellipse_path(&place, progress)),
        Tool::Arrow => {
            let shaft = (progress * ARROW_SHAFT_RATE).min(1.0);
            surface.stroke_path(&segment(place.origin, place.origin + place.extent * shaft))?;

            let head = ((progress - ARROW_HEAD_START) * ARROW_HEAD_RATE).max(0.0);
            if head > 0.0 {
                let len = shape.stroke_width * WIDE_STROKE_MULTIPLIER * scale_factor * head;
                surface.stroke_path(&arrow_head(&place, len))?;
            }
            Ok(())
        }
        Tool::Line => {
            surface.stroke_path(&segment(place.origin, place.origin + place.extent * progress))
        }
        Tool::Text => {
            let mut state = surface.paint_state().clone();
            state.alpha = progress;
            surface.set_paint_state(state);
            let font_size = shape.stroke_width * WIDE_STROKE_MULTIPLIER * scale_factor;
            surface.fill_text(shape.display_text(), place.origin, font_size)
        }
        Tool::Pen | Tool::Highlighter | Tool::Eraser => Ok(()),
    }
}

/// Polyline over the first `max(2, floor(n * progress))` points; needs at least two points.
fn freehand_path(points: &[Point], progress: f64, projector: &Projector) -> Option<BezPath> {
    if points.len() < 2 {
        return None;
    }
    let count = ((points.len() as f64 * progress).floor() as usize).clamp(2, points.len());

    let mut path = BezPath::new();
    let mut iter = points[..count].iter().map(|p| projector.point(*p));
    path.move_to(iter.next()?);
    for p in iter {
        path.line_to(p);
    }
    Some(path)
}

/// Outline starting at the origin corner, walking along x first, so dashes reveal clockwise
/// for positive extents.
fn rect_path(place: &Placement) -> BezPath {
    let Placement { origin: o, extent: e } = *place;
    let mut path = BezPath::new();
    path.move_to(o);
    path.line_to((o.x + e.x, o.y));
    path.line_to((o.x + e.x, o.y + e.y));
    path.line_to((o.x, o.y + e.y));
    path.close_path();
    path
}

fn ellipse_path(place: &Placement, progress: f64) -> BezPath {
    let arc = kurbo::Arc::new(
        place.center(),
        Vec2::new((place.extent.x / 2.0).abs(), (place.extent.y / 2.0).abs()),
        0.0,
        TAU * progress,
        0.0,
    );
    arc.to_path(ARC_TOLERANCE)
}

fn segment(from: Point, to: Point) -> BezPath {
    let mut path = BezPath::new();
    path.move_to(from);
    path.line_to(to);
    path
}

/// Two wings at ±30° meeting at the full (not revealed) end of the shaft.
fn arrow_head(place: &Placement, len: f64) -> BezPath {
    let tip = place.end();
    let angle = place.extent.y.atan2(place.extent.x);
    let wing = |a: f64| Point::new(tip.x - len * a.cos(), tip.y - len * a.sin());

    let mut path = BezPath::new();
    path.move_to(tip);
    path.line_to(wing(angle - FRAC_PI_6));
    path.move_to(tip);
    path.line_to(wing(angle + FRAC_PI_6));
    path
}

#[cfg(test)]
#[path = "../../tests/unit/annotation/renderer.rs"]
mod tests;
