use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::foundation::color::{DEFAULT_ANNOTATION_COLOR, parse_css_color};
use crate::foundation::core::{Point, Rgba8, Vec2};
use crate::foundation::error::{ReviewError, ReviewResult};

/// Stroke width used when a shape carries none (or a non-positive one).
pub const DEFAULT_STROKE_WIDTH: f64 = 5.0;
/// Label drawn by a text shape without text.
pub const DEFAULT_TEXT: &str = "Text";
/// Recorded coordinates at or below this value are taken as normalized when a shape does not
/// declare its coordinate space.
pub const NORMALIZED_HEURISTIC_MAX: f64 = 1.5;

/// Drawing tool that produced a shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tool {
    Pen,
    Highlighter,
    Eraser,
    Rectangle,
    Ellipse,
    Arrow,
    Line,
    Text,
}

impl Tool {
    /// Resolve a wire tool name, accepting the aliases older clients emit.
    pub fn from_wire(name: &str) -> Option<Self> {
        let tool = match name {
            "pencil" | "freehand" | "pen" => Self::Pen,
            "highlighter" => Self::Highlighter,
            "eraser" => Self::Eraser,
            "rect" | "rectangle" => Self::Rectangle,
            "circle" | "ellipse" => Self::Ellipse,
            "arrow" => Self::Arrow,
            "line" => Self::Line,
            "text" => Self::Text,
            _ => return None,
        };
        Some(tool)
    }

    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Pen => "pencil",
            Self::Highlighter => "highlighter",
            Self::Eraser => "eraser",
            Self::Rectangle => "rect",
            Self::Ellipse => "circle",
            Self::Arrow => "arrow",
            Self::Line => "line",
            Self::Text => "text",
        }
    }

    /// Tools that record a polyline of points.
    pub fn is_freehand(self) -> bool {
        matches!(self, Self::Pen | Self::Highlighter | Self::Eraser)
    }
}

/// Space the recorded coordinates live in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordSpace {
    /// `0..1` fractions of the surface the shape was drawn on.
    #[default]
    Normalized,
    /// Absolute surface pixels.
    Pixels,
}

/// Recorded position data of a shape.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    /// Freehand polyline.
    Points(Vec<Point>),
    /// Origin plus signed extent (`x, y, w, h` on the wire).
    Box { origin: Point, size: Vec2 },
    /// Two recorded drag endpoints.
    Segment { start: Point, end: Point },
}

impl Geometry {
    /// The first recorded x coordinate, used to guess the coordinate space.
    pub fn first_x(&self) -> Option<f64> {
        match self {
            Self::Points(points) => points.first().map(|p| p.x),
            Self::Box { origin, .. } => Some(origin.x),
            Self::Segment { start, .. } => Some(start.x),
        }
    }

    /// Box view of the geometry: origin and signed extent in recorded coordinates.
    pub fn as_box(&self) -> Option<(Point, Vec2)> {
        match self {
            Self::Points(_) => None,
            Self::Box { origin, size } => Some((*origin, *size)),
            Self::Segment { start, end } => Some((*start, *end - *start)),
        }
    }

    pub fn translate(&mut self, delta: Vec2) {
        match self {
            Self::Points(points) => points.iter_mut().for_each(|p| *p += delta),
            Self::Box { origin, .. } => *origin += delta,
            Self::Segment { start, end } => {
                *start += delta;
                *end += delta;
            }
        }
    }
}

/// A decoded, validated annotation shape.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    pub tool: Tool,
    pub color: Rgba8,
    pub stroke_width: f64,
    pub geometry: Geometry,
    pub text: Option<String>,
    /// Aspect ratio of the surface the shape was drawn on.
    pub aspect_ratio: Option<f64>,
    pub space: CoordSpace,
}

impl Shape {
    pub fn display_text(&self) -> &str {
        self.text
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TEXT)
    }
}

/// Loose wire form of a shape. Every field is optional; [`ShapeDef::resolve`] decides whether
/// the result is drawable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    /// Older clients send the tool as `type`.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<Point>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coord_space: Option<CoordSpace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_normalized: Option<bool>,
}

impl ShapeDef {
    /// Validate into a [`Shape`]. Returns `None` (and logs) for shapes that cannot be drawn.
    pub fn resolve(&self) -> Option<Shape> {
        let name = self.tool.as_deref().or(self.kind.as_deref());
        let Some(tool) = name.and_then(Tool::from_wire) else {
            tracing::debug!(tool = ?name, "skipping shape with unknown tool");
            return None;
        };

        let geometry = if tool.is_freehand() {
            let Some(points) = &self.points else {
                tracing::debug!(tool = tool.wire_name(), "skipping freehand shape without points");
                return None;
            };
            Geometry::Points(points.clone())
        } else if let (Some(start), Some(end)) = (self.start, self.end) {
            Geometry::Segment { start, end }
        } else if self.x.is_some() || self.y.is_some() || self.start.is_some() {
            let origin = Point::new(
                self.x.or(self.start.map(|p| p.x)).unwrap_or(0.0),
                self.y.or(self.start.map(|p| p.y)).unwrap_or(0.0),
            );
            Geometry::Box {
                origin,
                size: Vec2::new(self.w.unwrap_or(0.0), self.h.unwrap_or(0.0)),
            }
        } else {
            tracing::debug!(tool = tool.wire_name(), "skipping shape without a position");
            return None;
        };

        let color = match self.color.as_deref().filter(|c| !c.is_empty()) {
            None => DEFAULT_ANNOTATION_COLOR,
            Some(css) => parse_css_color(css).unwrap_or_else(|err| {
                tracing::debug!(%err, "invalid shape color, using default");
                DEFAULT_ANNOTATION_COLOR
            }),
        };

        let stroke_width = self
            .stroke_width
            .filter(|w| w.is_finite() && *w > 0.0)
            .unwrap_or(DEFAULT_STROKE_WIDTH);

        let space = self.coord_space_for(&geometry);

        Some(Shape {
            tool,
            color,
            stroke_width,
            geometry,
            text: self.text.clone(),
            aspect_ratio: positive(self.aspect_ratio),
            space,
        })
    }

    fn coord_space_for(&self, geometry: &Geometry) -> CoordSpace {
        if let Some(space) = self.coord_space {
            return space;
        }
        match self.is_normalized {
            Some(true) => return CoordSpace::Normalized,
            Some(false) => return CoordSpace::Pixels,
            None => {}
        }
        let first_x = geometry.first_x();
        let space = match first_x {
            Some(x) if x <= NORMALIZED_HEURISTIC_MAX => CoordSpace::Normalized,
            _ => CoordSpace::Pixels,
        };
        tracing::debug!(?first_x, ?space, "coordinate space inferred from first coordinate");
        space
    }
}

fn positive(v: Option<f64>) -> Option<f64> {
    v.filter(|v| v.is_finite() && *v > 0.0)
}

/// An ordered list of shapes drawn together, plus the aspect ratio of the surface they were
/// drawn on. The container aspect ratio takes precedence over per-shape ones.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnnotationSet {
    pub shapes: Vec<Shape>,
    pub aspect_ratio: Option<f64>,
}

impl AnnotationSet {
    pub fn new(shapes: Vec<Shape>, aspect_ratio: Option<f64>) -> Self {
        Self {
            shapes,
            aspect_ratio: positive(aspect_ratio),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Decode any accepted wire form: `{shapes, aspectRatio}`, a bare array of shapes, a single
    /// shape object, or a JSON string holding one of those.
    ///
    /// Shapes that fail to decode or validate are skipped.
    pub fn from_value(value: &Value) -> ReviewResult<Self> {
        let (raw, aspect_ratio): (&[Value], Option<f64>) = match value {
            Value::String(s) => {
                let inner: Value = serde_json::from_str(s)?;
                return Self::from_value(&inner);
            }
            Value::Null => return Ok(Self::default()),
            Value::Array(items) => (items.as_slice(), None),
            Value::Object(map) => {
                let aspect = map.get("aspectRatio").and_then(Value::as_f64);
                match map.get("shapes") {
                    Some(Value::Array(items)) => (items.as_slice(), aspect),
                    Some(_) => {
                        return Err(ReviewError::validation(
                            "annotation \"shapes\" must be an array",
                        ));
                    }
                    None => (std::slice::from_ref(value), aspect),
                }
            }
            _ => {
                return Err(ReviewError::validation(
                    "annotation must be an object, an array or a JSON string",
                ));
            }
        };

        let shapes = raw
            .iter()
            .filter_map(|v| match ShapeDef::deserialize(v) {
                Ok(def) => def.resolve(),
                Err(err) => {
                    tracing::debug!(%err, "skipping undecodable shape");
                    None
                }
            })
            .collect();

        Ok(Self::new(shapes, aspect_ratio))
    }
}

impl<'de> Deserialize<'de> for AnnotationSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/annotation/model.rs"]
mod tests;
