//! Raster targets for annotations and page captures.

pub mod composite;
pub mod cpu;
pub mod frame;
pub mod recording;
pub mod surface;
pub mod text;

pub use cpu::CpuSurface;
pub use frame::FrameRGBA;
pub use recording::{DrawCall, RecordingSurface};
pub use surface::{AnnotationSurface, CompositeMode, PaintState};
pub use text::{TextBrushRgba8, TextLayoutEngine};
