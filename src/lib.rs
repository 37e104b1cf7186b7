//! Review render core: frame-accurate timecodes, annotation rasterization, a headless render
//! page driven over a line-delimited JSON protocol, and the digest director that walks review
//! comments into a video.
//!
//! - [`timecode`] converts between playback time, frame numbers and SMPTE strings
//! - [`annotation`] decodes shape sets and renders them with a progress-driven reveal
//! - [`page`] holds the render page session and its viewers
//! - [`protocol`] parses driver commands and answers them with acks
//! - [`digest`] renders comment digests into a [`encode::FrameSink`]
#![forbid(unsafe_code)]

pub mod annotation;
pub mod digest;
pub mod encode;
pub mod foundation;
pub mod page;
pub mod protocol;
pub mod render;
pub mod timecode;

pub use crate::foundation::clock::{Clock, ManualClock, SystemClock};
pub use crate::foundation::core::{Canvas, Rgba8};
pub use crate::foundation::error::{ReviewError, ReviewResult};

pub use crate::annotation::{AnnotationSet, Shape, render_annotation_set};
pub use crate::digest::{DigestJob, DigestReport, DigestSettings, DigestTiming, render_digest};
pub use crate::encode::{FfmpegEncoder, FrameSink, InMemorySink, PngSequenceSink};
pub use crate::page::{PageConfig, RenderPage, headless_viewers};
pub use crate::protocol::{Ack, Command, Dispatcher, serve};
pub use crate::render::{CpuSurface, FrameRGBA};
pub use crate::timecode::{Timecode, format_smpte, frame_to_time, time_to_frame};
