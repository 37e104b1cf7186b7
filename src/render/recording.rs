use crate::foundation::core::{BezPath, Point};
use crate::foundation::error::ReviewResult;
use crate::render::surface::{AnnotationSurface, PaintState};

/// One recorded draw call with the paint state active at the time.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCall {
    Clear,
    Stroke {
        path: BezPath,
        state: PaintState,
    },
    Fill {
        path: BezPath,
        state: PaintState,
    },
    Text {
        text: String,
        origin: Point,
        font_size: f64,
        state: PaintState,
    },
}

/// Surface that records draw calls instead of rasterizing them.
#[derive(Clone, Debug)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    state: PaintState,
    calls: Vec<DrawCall>,
    /// Paint states in the order they were set, for checking resets between shapes.
    state_log: Vec<PaintState>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            state: PaintState::default(),
            calls: Vec::new(),
            state_log: Vec::new(),
        }
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    pub fn state_log(&self) -> &[PaintState] {
        &self.state_log
    }

    /// Draw calls after the most recent clear.
    pub fn visible_calls(&self) -> &[DrawCall] {
        let start = self
            .calls
            .iter()
            .rposition(|c| matches!(c, DrawCall::Clear))
            .map_or(0, |i| i + 1);
        &self.calls[start..]
    }

    pub fn take_calls(&mut self) -> Vec<DrawCall> {
        self.state_log.clear();
        std::mem::take(&mut self.calls)
    }
}

impl AnnotationSurface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self) {
        self.calls.push(DrawCall::Clear);
    }

    fn paint_state(&self) -> &PaintState {
        &self.state
    }

    fn set_paint_state(&mut self, state: PaintState) {
        self.state_log.push(state.clone());
        self.state = state;
    }

    fn stroke_path(&mut self, path: &BezPath) -> ReviewResult<()> {
        self.calls.push(DrawCall::Stroke {
            path: path.clone(),
            state: self.state.clone(),
        });
        Ok(())
    }

    fn fill_path(&mut self, path: &BezPath) -> ReviewResult<()> {
        self.calls.push(DrawCall::Fill {
            path: path.clone(),
            state: self.state.clone(),
        });
        Ok(())
    }

    fn fill_text(&mut self, text: &str, origin: Point, font_size: f64) -> ReviewResult<()> {
        self.calls.push(DrawCall::Text {
            text: text.to_owned(),
            origin,
            font_size,
            state: self.state.clone(),
        });
        Ok(())
    }
}
