use crate::foundation::core::{BezPath, Point, Rgba8};
use crate::foundation::error::ReviewResult;

/// How a draw combines with the pixels already on the surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CompositeMode {
    #[default]
    SourceOver,
    /// Removes destination coverage where the source paints (eraser strokes).
    DestinationOut,
}

/// Mutable drawing state applied to subsequent draws, in the manner of a 2D canvas context.
///
/// Caps and joins are always round.
#[derive(Clone, Debug, PartialEq)]
pub struct PaintState {
    pub color: Rgba8,
    /// Global alpha multiplied into every draw.
    pub alpha: f64,
    pub line_width: f64,
    pub composite: CompositeMode,
    /// Alternating on/off dash lengths; empty means a solid stroke.
    pub dash: Vec<f64>,
}

impl Default for PaintState {
    fn default() -> Self {
        Self {
            color: Rgba8::BLACK,
            alpha: 1.0,
            line_width: 1.0,
            composite: CompositeMode::SourceOver,
            dash: Vec::new(),
        }
    }
}

/// A 2D raster target that annotations are drawn onto.
pub trait AnnotationSurface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Reset every pixel to transparent.
    fn clear(&mut self);

    fn paint_state(&self) -> &PaintState;
    fn set_paint_state(&mut self, state: PaintState);

    /// Stroke `path` with the current color, alpha, width, dash and composite mode.
    fn stroke_path(&mut self, path: &BezPath) -> ReviewResult<()>;

    /// Fill `path` (non-zero winding) with the current color, alpha and composite mode.
    fn fill_path(&mut self, path: &BezPath) -> ReviewResult<()>;

    /// Fill `text` with its alphabetic baseline starting at `origin`.
    fn fill_text(&mut self, text: &str, origin: Point, font_size: f64) -> ReviewResult<()>;
}
