//! Capabilities the render page drives. Each viewer shows one asset kind; the page keeps exactly
//! one of them active at a time.

use crate::foundation::core::Canvas;
use crate::foundation::error::ReviewResult;
use crate::page::camera::CameraSnapshot;
use crate::render::frame::FrameRGBA;

/// An interactive 3D model viewer.
pub trait Asset3DViewer {
    fn load(&mut self, src: &str) -> ReviewResult<()>;

    fn camera(&self) -> CameraSnapshot;
    /// Orbit attribute such as `"0.5rad 1.2rad 3m"` or `"auto auto auto"`.
    fn set_camera_orbit(&mut self, attr: &str);
    /// Target attribute such as `"0m 1m 0m"` or `"auto auto auto"`.
    fn set_camera_target(&mut self, attr: &str);
    /// Field-of-view attribute such as `"30deg"` or `"auto"`.
    fn set_field_of_view(&mut self, attr: &str);

    /// Camera smoothing; 0 applies camera changes immediately.
    fn interpolation_decay(&self) -> f64;
    fn set_interpolation_decay(&mut self, decay: f64);

    fn available_animations(&self) -> Vec<String>;
    fn set_animation_name(&mut self, name: &str);
    fn play(&mut self);
    fn pause(&mut self);
    fn is_playing(&self) -> bool;
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, seconds: f64);

    /// Rasterize the current view, if the viewer can.
    fn render(&mut self, canvas: Canvas) -> ReviewResult<Option<FrameRGBA>>;
}

/// Hands out the 3D viewer once its component has finished registering.
pub trait Asset3DProvider {
    /// `None` while the component is still unavailable. Once a viewer is returned the provider
    /// may be empty.
    fn poll_viewer(&mut self) -> Option<Box<dyn Asset3DViewer>>;
}

/// A seekable video element.
pub trait VideoViewer {
    fn load(&mut self, src: &str) -> ReviewResult<()>;
    /// Seek and block until the seek has completed.
    fn seek(&mut self, seconds: f64) -> ReviewResult<()>;
    fn current_time(&self) -> f64;
    fn frame_rate(&self) -> Option<f64>;
    /// Frame at the current position.
    fn current_frame(&mut self) -> ReviewResult<Option<FrameRGBA>>;
}

/// A still image element.
pub trait ImageViewer {
    fn load(&mut self, src: &str) -> ReviewResult<()>;
    fn frame(&self) -> Option<&FrameRGBA>;
}

/// The viewer set a render page is built with.
pub struct Viewers {
    pub model: Box<dyn Asset3DProvider>,
    pub video: Box<dyn VideoViewer>,
    pub image: Box<dyn ImageViewer>,
}
