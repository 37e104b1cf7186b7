use crate::annotation::model::{CoordSpace, Geometry};
use crate::foundation::core::{Point, Vec2};

/// Reference surface height (or width, for portrait surfaces) at which stroke widths are 1:1.
pub const REFERENCE_EXTENT_PX: f64 = 1080.0;
/// Lower bound of the stroke scale factor on small surfaces.
pub const MIN_STROKE_SCALE: f64 = 0.5;

/// Per-axis correction mapping shapes drawn at one aspect ratio onto a surface with another.
///
/// Landscape sources keep their vertical field of view, portrait sources their horizontal one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AspectCorrection {
    pub scale_x: f64,
    pub scale_y: f64,
}

impl AspectCorrection {
    pub const IDENTITY: Self = Self {
        scale_x: 1.0,
        scale_y: 1.0,
    };

    pub fn between(saved: Option<f64>, current: f64) -> Self {
        let Some(saved) = saved.filter(|a| a.is_finite() && *a > 0.0) else {
            return Self::IDENTITY;
        };
        if !current.is_finite() || current <= 0.0 {
            return Self::IDENTITY;
        }

        let (scale_x, scale_y) = match (saved > 1.0, current > 1.0) {
            (true, true) => (saved / current, 1.0),
            (false, false) => (1.0, current / saved),
            (true, false) => (saved, current),
            (false, true) => (1.0 / current, 1.0 / saved),
        };
        Self { scale_x, scale_y }
    }
}

/// Multiplier applied to stroke widths so strokes keep their visual weight across resolutions.
pub fn stroke_scale_factor(width: f64, height: f64) -> f64 {
    let current = width / height;
    let extent = if current > 1.0 { height } else { width };
    (extent / REFERENCE_EXTENT_PX).max(MIN_STROKE_SCALE)
}

/// Maps recorded coordinates of one shape onto surface pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projector {
    pub width: f64,
    pub height: f64,
    pub correction: AspectCorrection,
    pub space: CoordSpace,
}

impl Projector {
    pub fn new(width: f64, height: f64, saved_aspect: Option<f64>, space: CoordSpace) -> Self {
        Self {
            width,
            height,
            correction: AspectCorrection::between(saved_aspect, width / height),
            space,
        }
    }

    /// Pixel-space coordinates pass through untouched; they are never aspect corrected.
    pub fn point(&self, p: Point) -> Point {
        match self.space {
            CoordSpace::Pixels => p,
            CoordSpace::Normalized => {
                let AspectCorrection { scale_x, scale_y } = self.correction;
                Point::new(
                    ((p.x - 0.5) * scale_x + 0.5) * self.width,
                    ((p.y - 0.5) * scale_y + 0.5) * self.height,
                )
            }
        }
    }

    /// Pixel origin and signed pixel extent of a box-like geometry.
    pub fn place(&self, geometry: &Geometry) -> Option<Placement> {
        match geometry {
            Geometry::Points(_) => None,
            Geometry::Box { origin, size } => {
                let extent = match self.space {
                    CoordSpace::Pixels => *size,
                    CoordSpace::Normalized => Vec2::new(
                        size.x * self.width * self.correction.scale_x,
                        size.y * self.height * self.correction.scale_y,
                    ),
                };
                Some(Placement {
                    origin: self.point(*origin),
                    extent,
                })
            }
            Geometry::Segment { start, end } => {
                let origin = self.point(*start);
                Some(Placement {
                    origin,
                    extent: self.point(*end) - origin,
                })
            }
        }
    }
}

/// Resolved pixel box of a primitive shape. The extent is signed: drags up or left are negative.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub origin: Point,
    pub extent: Vec2,
}

impl Placement {
    pub fn end(&self) -> Point {
        self.origin + self.extent
    }

    pub fn center(&self) -> Point {
        self.origin + self.extent * 0.5
    }

    pub fn perimeter(&self) -> f64 {
        2.0 * (self.extent.x.abs() + self.extent.y.abs())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/annotation/geometry.rs"]
mod tests;
