use std::sync::Arc;

use crate::foundation::core::{Affine, BezPath, Canvas, Point};
use crate::foundation::error::{ReviewError, ReviewResult};
use crate::render::composite;
use crate::render::frame::FrameRGBA;
use crate::render::surface::{AnnotationSurface, CompositeMode, PaintState};
use crate::render::text::{TextBrushRgba8, TextLayoutEngine, first_baseline};

/// Annotation surface rasterized with `vello_cpu`.
///
/// Every draw is rendered into a scratch layer and then composited onto the surface with the
/// paint state's alpha and composite mode, the way a canvas 2D context applies `globalAlpha`
/// and `globalCompositeOperation` per draw. The render context and layer pixmap are reused
/// across draws.
pub struct CpuSurface {
    width: u16,
    height: u16,
    pixmap: vello_cpu::Pixmap,
    scratch: vello_cpu::RenderContext,
    layer: vello_cpu::Pixmap,
    state: PaintState,
    text: Option<CpuText>,
}

struct CpuText {
    engine: TextLayoutEngine,
    font: vello_cpu::peniko::FontData,
}

impl CpuSurface {
    pub fn new(canvas: Canvas) -> ReviewResult<Self> {
        let width: u16 = canvas
            .width
            .try_into()
            .map_err(|_| ReviewError::render("surface width exceeds u16"))?;
        let height: u16 = canvas
            .height
            .try_into()
            .map_err(|_| ReviewError::render("surface height exceeds u16"))?;
        Ok(Self {
            width,
            height,
            pixmap: vello_cpu::Pixmap::new(width, height),
            scratch: vello_cpu::RenderContext::new(width, height),
            layer: vello_cpu::Pixmap::new(width, height),
            state: PaintState::default(),
            text: None,
        })
    }

    /// Enable text drawing with the given TTF/OTF font.
    pub fn with_font(mut self, font_bytes: Arc<Vec<u8>>) -> ReviewResult<Self> {
        let font = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(font_bytes.as_ref().clone()),
            0,
        );
        let engine = TextLayoutEngine::new(font_bytes)?;
        self.text = Some(CpuText { engine, font });
        Ok(self)
    }

    pub fn has_font(&self) -> bool {
        self.text.is_some()
    }

    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: u32::from(self.width),
            height: u32::from(self.height),
        }
    }

    /// Premultiplied RGBA8 pixels.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    pub fn snapshot(&self) -> FrameRGBA {
        FrameRGBA {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: self.data().to_vec(),
            premultiplied: true,
        }
    }

    fn draw_layer(
        &mut self,
        draw: impl FnOnce(&mut vello_cpu::RenderContext) -> ReviewResult<()>,
    ) -> ReviewResult<()> {
        let ctx = &mut self.scratch;
        ctx.reset();
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        draw(ctx)?;
        ctx.flush();

        self.layer.data_as_u8_slice_mut().fill(0);
        ctx.render_to_pixmap(&mut self.layer);

        let alpha = self.state.alpha.clamp(0.0, 1.0) as f32;
        let dst = self.pixmap.data_as_u8_slice_mut();
        let src = self.layer.data_as_u8_slice();
        match self.state.composite {
            CompositeMode::SourceOver => composite::over_in_place(dst, src, alpha),
            CompositeMode::DestinationOut => composite::destination_out_in_place(dst, src, alpha),
        }
    }

    fn paint_color(&self) -> vello_cpu::peniko::Color {
        let c = self.state.color;
        vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
    }
}

impl AnnotationSurface for CpuSurface {
    fn width(&self) -> u32 {
        u32::from(self.width)
    }

    fn height(&self) -> u32 {
        u32::from(self.height)
    }

    fn clear(&mut self) {
        self.pixmap.data_as_u8_slice_mut().fill(0);
    }

    fn paint_state(&self) -> &PaintState {
        &self.state
    }

    fn set_paint_state(&mut self, state: PaintState) {
        self.state = state;
    }

    fn stroke_path(&mut self, path: &BezPath) -> ReviewResult<()> {
        let width = self.state.line_width;
        if !width.is_finite() || width <= 0.0 {
            return Ok(());
        }

        let dashed;
        let path = if self.state.dash.is_empty() {
            path
        } else {
            let total: f64 = self.state.dash.iter().sum();
            if !total.is_finite() || total <= 0.0 || self.state.dash.iter().any(|d| *d < 0.0) {
                return Ok(());
            }
            dashed = BezPath::from_vec(kurbo::dash(path.iter(), 0.0, &self.state.dash).collect());
            &dashed
        };

        let color = self.paint_color();
        let cpu_path = bezpath_to_cpu(path);
        self.draw_layer(|ctx| {
            ctx.set_paint(color);
            ctx.set_stroke(
                vello_cpu::kurbo::Stroke::new(width)
                    .with_caps(vello_cpu::kurbo::Cap::Round)
                    .with_join(vello_cpu::kurbo::Join::Round),
            );
            ctx.stroke_path(&cpu_path);
            Ok(())
        })
    }

    fn fill_path(&mut self, path: &BezPath) -> ReviewResult<()> {
        let color = self.paint_color();
        let cpu_path = bezpath_to_cpu(path);
        self.draw_layer(|ctx| {
            ctx.set_paint(color);
            ctx.fill_path(&cpu_path);
            Ok(())
        })
    }

    fn fill_text(&mut self, text: &str, origin: Point, font_size: f64) -> ReviewResult<()> {
        let Some(cpu_text) = self.text.as_mut() else {
            tracing::debug!("no font configured, skipping text draw");
            return Ok(());
        };
        if text.is_empty() {
            return Ok(());
        }

        let brush = TextBrushRgba8::from(self.state.color);
        let layout = cpu_text
            .engine
            .layout_line(text, font_size as f32, brush)?;
        let font = cpu_text.font.clone();
        let baseline = f64::from(first_baseline(&layout));
        let transform = Affine::translate((origin.x, origin.y - baseline));

        self.draw_layer(|ctx| {
            ctx.set_transform(affine_to_cpu(transform));
            for line in layout.lines() {
                for item in line.items() {
                    let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                        continue;
                    };
                    let brush = run.style().brush;
                    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                        brush.r, brush.g, brush.b, brush.a,
                    ));
                    let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    });
                    ctx.glyph_run(&font)
                        .font_size(run.run().font_size())
                        .fill_glyphs(glyphs);
                }
            }
            Ok(())
        })
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
