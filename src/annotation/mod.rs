//! Annotation shapes: wire decoding, placement on a surface, animated rendering and hit testing.

pub mod geometry;
pub mod hit;
pub mod model;
pub mod renderer;

pub use geometry::{AspectCorrection, Placement, Projector, stroke_scale_factor};
pub use hit::{is_point_in_shape, move_shape};
pub use model::{AnnotationSet, CoordSpace, Geometry, Shape, ShapeDef, Tool};
pub use renderer::render_annotation_set;
