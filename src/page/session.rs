use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::annotation::{AnnotationSet, render_annotation_set};
use crate::foundation::clock::Clock;
use crate::foundation::core::Canvas;
use crate::foundation::error::{ReviewError, ReviewResult};
use crate::page::camera::{AUTO_ATTR, AUTO_FOV_ATTR, CameraSnapshot, CameraState};
use crate::page::config::PageConfig;
use crate::page::headless::{AssetResolver, decode_image};
use crate::page::overlay::{CardLayout, CommentOverlay, CommentUser};
use crate::page::viewer::{Asset3DViewer, Viewers};
use crate::render::composite::{self, BlitParams};
use crate::render::cpu::CpuSurface;
use crate::render::frame::FrameRGBA;
use crate::render::surface::AnnotationSurface;

/// The asset kind a page is showing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    #[serde(rename = "3d")]
    ThreeD,
    #[serde(rename = "video")]
    Video,
    #[serde(rename = "image")]
    Image,
}

impl AssetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ThreeD => "3d",
            Self::Video => "video",
            Self::Image => "image",
        }
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a render page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageState {
    Uninitialized,
    Initializing,
    Ready,
    Loading(AssetKind),
    /// Initialization failed; the page refuses every further command.
    Failed(String),
}

struct Surfaces {
    annotation: CpuSurface,
    overlay: CpuSurface,
}

/// One render page: the active viewer, the annotation canvas and the comment overlay.
///
/// Every operation runs to completion before returning; waits go through the page clock. Loading
/// an asset resets the page: all viewers are hidden and the annotation is dropped before the new
/// viewer loads.
pub struct RenderPage<C: Clock> {
    config: PageConfig,
    clock: C,
    state: PageState,
    viewers: Viewers,
    model: Option<Box<dyn Asset3DViewer>>,
    resolver: AssetResolver,
    current: Option<AssetKind>,
    visible: Option<AssetKind>,
    loading_visible: bool,
    ready: bool,
    annotation: Option<AnnotationSet>,
    annotation_progress: f64,
    annotation_opacity: f64,
    overlay: CommentOverlay,
    surfaces: Option<Surfaces>,
    avatars: HashMap<String, Option<Arc<FrameRGBA>>>,
}

impl<C: Clock> RenderPage<C> {
    pub fn new(config: PageConfig, viewers: Viewers, clock: C) -> Self {
        Self {
            resolver: AssetResolver::new(config.assets_root.clone()),
            overlay: CommentOverlay::new(config.overlay_hide_delay),
            config,
            clock,
            state: PageState::Uninitialized,
            viewers,
            model: None,
            current: None,
            visible: None,
            loading_visible: true,
            ready: false,
            annotation: None,
            annotation_progress: 0.0,
            annotation_opacity: 1.0,
            surfaces: None,
            avatars: HashMap::new(),
        }
    }

    /// Allocate the page surfaces and load the configured font. A failure leaves the page
    /// [`PageState::Failed`].
    pub fn initialize(&mut self) -> ReviewResult<()> {
        match &self.state {
            PageState::Uninitialized => {}
            PageState::Failed(msg) => return Err(failed_init(msg)),
            _ => return Ok(()),
        }

        self.state = PageState::Initializing;
        match self.build_surfaces() {
            Ok(surfaces) => {
                self.surfaces = Some(surfaces);
                self.state = PageState::Ready;
                tracing::debug!(
                    width = self.config.canvas.width,
                    height = self.config.canvas.height,
                    "render page initialized"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "render page failed to initialize");
                self.state = PageState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    fn build_surfaces(&self) -> ReviewResult<Surfaces> {
        let canvas = self.config.canvas;
        let mut annotation = CpuSurface::new(canvas)?;
        let mut overlay = CpuSurface::new(canvas)?;
        if let Some(path) = &self.config.font_path {
            let bytes = std::fs::read(path)
                .with_context(|| format!("read font '{}'", path.display()))?;
            let bytes = Arc::new(bytes);
            annotation = annotation.with_font(bytes.clone())?;
            overlay = overlay.with_font(bytes)?;
        }
        Ok(Surfaces {
            annotation,
            overlay,
        })
    }

    fn require_ready(&self) -> ReviewResult<()> {
        match &self.state {
            PageState::Ready => Ok(()),
            PageState::Failed(msg) => Err(failed_init(msg)),
            PageState::Loading(kind) => Err(ReviewError::protocol(format!(
                "page is still loading a {kind} asset"
            ))),
            PageState::Uninitialized | PageState::Initializing => {
                Err(ReviewError::protocol("page is not initialized"))
            }
        }
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    pub fn canvas(&self) -> Canvas {
        self.config.canvas
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn current_type(&self) -> Option<AssetKind> {
        self.current
    }

    pub fn visible_viewer(&self) -> Option<AssetKind> {
        self.visible
    }

    pub fn is_loading_visible(&self) -> bool {
        self.loading_visible
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn annotation(&self) -> Option<&AnnotationSet> {
        self.annotation.as_ref()
    }

    pub fn annotation_progress(&self) -> f64 {
        self.annotation_progress
    }

    pub fn annotation_opacity(&self) -> f64 {
        self.annotation_opacity
    }

    pub fn overlay(&self) -> &CommentOverlay {
        &self.overlay
    }

    /// The 3D viewer, once a 3D load has obtained it.
    pub fn model_viewer(&self) -> Option<&dyn Asset3DViewer> {
        self.model.as_deref()
    }

    /// Annotation canvas pixels (premultiplied).
    pub fn annotation_frame(&self) -> Option<FrameRGBA> {
        self.surfaces.as_ref().map(|s| s.annotation.snapshot())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn load_3d(&mut self, src: &str) -> ReviewResult<()> {
        self.require_ready()?;
        self.wait_for_model_viewer()?;
        self.load(AssetKind::ThreeD, src)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn load_video(&mut self, src: &str) -> ReviewResult<()> {
        self.require_ready()?;
        self.load(AssetKind::Video, src)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn load_image(&mut self, src: &str) -> ReviewResult<()> {
        self.require_ready()?;
        self.load(AssetKind::Image, src)
    }

    /// Poll the 3D provider until it hands out a viewer or the wait times out.
    fn wait_for_model_viewer(&mut self) -> ReviewResult<()> {
        if self.model.is_some() {
            return Ok(());
        }
        let start = self.clock.now();
        loop {
            if let Some(viewer) = self.viewers.model.poll_viewer() {
                tracing::debug!("3D viewer ready");
                self.model = Some(viewer);
                return Ok(());
            }
            if self.clock.now().saturating_sub(start) > self.config.viewer_wait_timeout {
                return Err(ReviewError::timeout(format!(
                    "3D viewer did not become available within {} ms",
                    self.config.viewer_wait_timeout.as_millis()
                )));
            }
            self.clock.sleep(self.config.viewer_poll_interval);
        }
    }

    fn load(&mut self, kind: AssetKind, src: &str) -> ReviewResult<()> {
        self.reset_for_load(kind);
        self.state = PageState::Loading(kind);

        let result = match kind {
            AssetKind::ThreeD => self.load_model(src),
            AssetKind::Video => self.viewers.video.load(src),
            AssetKind::Image => self.viewers.image.load(src),
        };
        self.state = PageState::Ready;

        match result {
            Ok(()) => {
                self.loading_visible = false;
                tracing::info!(kind = %kind, src, "asset loaded");
                Ok(())
            }
            Err(e) => {
                self.current = None;
                self.visible = None;
                tracing::warn!(kind = %kind, src, error = %e, "asset failed to load");
                Err(e)
            }
        }
    }

    fn load_model(&mut self, src: &str) -> ReviewResult<()> {
        let viewer = self
            .model
            .as_mut()
            .ok_or_else(|| ReviewError::protocol("3D viewer is not available"))?;
        viewer.load(src)?;

        if let Some(first) = viewer.available_animations().first() {
            tracing::debug!(animation = %first, "playing first animation");
            viewer.set_animation_name(first);
            viewer.play();
        }
        Ok(())
    }

    fn reset_for_load(&mut self, kind: AssetKind) {
        self.visible = Some(kind);
        self.current = Some(kind);
        self.annotation = None;
        self.annotation_progress = 0.0;
        if let Some(s) = self.surfaces.as_mut() {
            s.annotation.clear();
        }
    }

    /// Apply a camera state (object or JSON string) to the 3D viewer.
    ///
    /// Outside 3D mode, for a null state and for undecodable JSON this logs and does nothing.
    /// With `animate` the viewer interpolates toward the new camera; the call does not wait
    /// for that to finish.
    pub fn set_camera_state(&mut self, state: &Value, animate: bool) -> ReviewResult<()> {
        self.require_ready()?;
        if self.current != Some(AssetKind::ThreeD) || state.is_null() {
            tracing::debug!(current = ?self.current, "set_camera_state skipped");
            return Ok(());
        }
        let camera = match CameraState::from_value(state) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring undecodable camera state");
                return Ok(());
            }
        };
        let Some(viewer) = self.model.as_mut() else {
            return Ok(());
        };

        viewer.set_interpolation_decay(if animate {
            self.config.camera_decay
        } else {
            0.0
        });
        if let Some(orbit) = camera.orbit_attr().filter(|s| !s.is_empty()) {
            viewer.set_camera_orbit(&orbit);
        }
        if let Some(target) = camera.target_attr().filter(|s| !s.is_empty()) {
            viewer.set_camera_target(&target);
        }
        if let Some(fov) = camera.fov_attr() {
            viewer.set_field_of_view(&fov);
        }
        tracing::debug!(camera = ?viewer.camera(), animate, "camera set");
        Ok(())
    }

    /// Numeric camera of the 3D viewer, `None` outside 3D mode.
    pub fn get_camera_state(&self) -> Option<CameraSnapshot> {
        if self.current != Some(AssetKind::ThreeD) {
            return None;
        }
        self.model.as_ref().map(|v| v.camera())
    }

    /// Reset the 3D camera to its automatic framing and let it settle.
    pub fn fit_to_view(&mut self) -> ReviewResult<()> {
        self.require_ready()?;
        if self.current != Some(AssetKind::ThreeD) {
            return Ok(());
        }
        if let Some(viewer) = self.model.as_mut() {
            viewer.set_camera_orbit(AUTO_ATTR);
            viewer.set_camera_target(AUTO_ATTR);
            viewer.set_field_of_view(AUTO_FOV_ATTR);
        }
        self.clock.sleep(self.config.fit_settle);
        Ok(())
    }

    /// Seek the video and wait for the seek to complete. Ignored outside video mode.
    pub fn seek_to(&mut self, timestamp: f64) -> ReviewResult<()> {
        self.require_ready()?;
        if self.current != Some(AssetKind::Video) {
            return Ok(());
        }
        self.viewers.video.seek(timestamp)
    }

    /// Pause the 3D animation and jump to `timestamp`. Ignored outside 3D mode.
    pub fn seek_3d_animation(&mut self, timestamp: f64) -> ReviewResult<()> {
        self.require_ready()?;
        if self.current != Some(AssetKind::ThreeD) {
            return Ok(());
        }
        if let Some(viewer) = self.model.as_mut() {
            viewer.pause();
            viewer.set_current_time(timestamp);
            tracing::trace!(timestamp, "3D animation seeked");
        }
        Ok(())
    }

    /// Store `set` and draw it at progress 0.
    pub fn draw_annotation(&mut self, set: AnnotationSet) -> ReviewResult<()> {
        self.require_ready()?;
        self.annotation = Some(set);
        self.annotation_progress = 0.0;
        self.redraw_annotation()
    }

    /// Re-render the stored annotation at `progress`. Without an annotation this does nothing.
    pub fn update_annotation_progress(&mut self, progress: f64) -> ReviewResult<()> {
        self.require_ready()?;
        if self.annotation.is_none() {
            return Ok(());
        }
        self.annotation_progress = progress;
        self.redraw_annotation()
    }

    pub fn clear_annotation(&mut self) -> ReviewResult<()> {
        self.require_ready()?;
        self.annotation = None;
        self.annotation_progress = 0.0;
        if let Some(s) = self.surfaces.as_mut() {
            s.annotation.clear();
        }
        Ok(())
    }

    fn redraw_annotation(&mut self) -> ReviewResult<()> {
        let (Some(set), Some(s)) = (self.annotation.as_ref(), self.surfaces.as_mut()) else {
            return Ok(());
        };
        render_annotation_set(&mut s.annotation, set, self.annotation_progress)
    }

    /// Opacity the annotation canvas is composited with.
    pub fn set_annotation_opacity(&mut self, opacity: f64) -> ReviewResult<()> {
        self.require_ready()?;
        self.annotation_opacity = if opacity.is_finite() { opacity } else { 1.0 };
        Ok(())
    }

    /// Show the comment overlay, or hide it when `user` or `text` is missing.
    ///
    /// `opacity` switches the overlay to manual opacity with transitions disabled.
    pub fn show_comment(
        &mut self,
        user: Option<&CommentUser>,
        text: Option<&str>,
        opacity: Option<f64>,
    ) -> ReviewResult<()> {
        self.require_ready()?;
        let now = self.clock.now();
        self.overlay.show(user, text, opacity, now);
        Ok(())
    }

    /// Legacy overlay entry point: a comment attributed to `name`.
    pub fn show_project_info(
        &mut self,
        name: Option<&str>,
        comment: Option<&str>,
    ) -> ReviewResult<()> {
        let user = CommentUser {
            name: name.map(str::to_owned),
            avatar_path: None,
        };
        self.show_comment(Some(&user), comment, None)
    }

    pub fn hide_project_info(&mut self) -> ReviewResult<()> {
        self.show_project_info(None, None)
    }

    /// Mark the page ready and hide the loading indicator.
    pub fn mark_ready(&mut self) -> ReviewResult<()> {
        self.require_ready()?;
        self.ready = true;
        self.loading_visible = false;
        Ok(())
    }

    pub fn sleep(&self, d: Duration) {
        self.clock.sleep(d);
    }

    /// Composite the page into one frame: background, the active viewer letterboxed, the
    /// annotation canvas at its opacity, then the comment overlay.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn capture(&mut self) -> ReviewResult<FrameRGBA> {
        self.require_ready()?;
        let canvas = self.config.canvas;
        let now = self.clock.now();
        self.overlay.tick(now);

        let mut out = FrameRGBA::filled(canvas, self.config.background.to_premul().to_array());

        if let Some(frame) = self.viewer_frame()? {
            let (w, h, x, y) = letterbox(frame.width, frame.height, canvas);
            if w > 0 && h > 0 {
                let mut fitted = frame.resized(w, h)?;
                if !fitted.premultiplied {
                    composite::premultiply_in_place(&mut fitted.data);
                }
                composite::over_at(
                    &mut out.data,
                    &fitted.data,
                    BlitParams {
                        dst_width: canvas.width,
                        dst_height: canvas.height,
                        src_width: w,
                        src_height: h,
                        x,
                        y,
                        opacity: 1.0,
                    },
                )?;
            }
        }

        let overlay_opacity = self.overlay.effective_opacity(now);
        let avatar = self.overlay_avatar(overlay_opacity);
        let Some(s) = self.surfaces.as_mut() else {
            return Ok(out);
        };

        let annotation_opacity = self.annotation_opacity.clamp(0.0, 1.0) as f32;
        if self.annotation.is_some() && annotation_opacity > 0.0 {
            composite::over_in_place(&mut out.data, s.annotation.data(), annotation_opacity)?;
        }

        if overlay_opacity > 0.0 {
            self.overlay.paint(&mut s.overlay, overlay_opacity)?;
            composite::over_in_place(&mut out.data, s.overlay.data(), 1.0)?;
            if let Some((avatar, x, y)) = avatar {
                composite::over_at(
                    &mut out.data,
                    &avatar.data,
                    BlitParams {
                        dst_width: canvas.width,
                        dst_height: canvas.height,
                        src_width: avatar.width,
                        src_height: avatar.height,
                        x,
                        y,
                        opacity: overlay_opacity as f32,
                    },
                )?;
            }
        }

        Ok(out)
    }

    fn viewer_frame(&mut self) -> ReviewResult<Option<FrameRGBA>> {
        let canvas = self.config.canvas;
        match self.visible {
            Some(AssetKind::ThreeD) => match self.model.as_mut() {
                Some(viewer) => viewer.render(canvas),
                None => Ok(None),
            },
            Some(AssetKind::Video) => self.viewers.video.current_frame(),
            Some(AssetKind::Image) => Ok(self.viewers.image.frame().cloned()),
            None => Ok(None),
        }
    }

    /// Circular avatar image and its top-left position, when the overlay shows one that decodes.
    fn overlay_avatar(&mut self, opacity: f64) -> Option<(Arc<FrameRGBA>, i64, i64)> {
        if opacity <= 0.0 {
            return None;
        }
        let path = self.overlay.content()?.avatar_path.clone()?;
        let circle = CardLayout::new(self.config.canvas.width, self.config.canvas.height).avatar;
        let diameter = (circle.radius * 2.0).round().max(1.0) as u32;

        let resolver = &self.resolver;
        let avatar = self
            .avatars
            .entry(path.clone())
            .or_insert_with(|| match load_avatar(resolver, &path, diameter) {
                Ok(frame) => Some(Arc::new(frame)),
                Err(e) => {
                    tracing::debug!(path = %path, error = %e, "avatar unavailable");
                    None
                }
            })
            .as_ref()
            .map(Arc::clone)?;
        let x = (circle.center.x - circle.radius).round() as i64;
        let y = (circle.center.y - circle.radius).round() as i64;
        Some((avatar, x, y))
    }
}

fn failed_init(msg: &str) -> ReviewError {
    ReviewError::protocol(format!("page failed to initialize: {msg}"))
}

fn load_avatar(resolver: &AssetResolver, src: &str, diameter: u32) -> ReviewResult<FrameRGBA> {
    let path = resolver.resolve(src)?;
    let bytes =
        std::fs::read(&path).with_context(|| format!("read avatar '{}'", path.display()))?;
    let mut frame = decode_image(&bytes)?.resized(diameter, diameter)?;
    mask_circle(&mut frame);
    Ok(frame)
}

/// Clear every premultiplied pixel outside the inscribed circle.
fn mask_circle(frame: &mut FrameRGBA) {
    let (w, h) = (frame.width as usize, frame.height as usize);
    let r = w.min(h) as f64 / 2.0;
    let (cx, cy) = (w as f64 / 2.0, h as f64 / 2.0);
    for (i, px) in frame.data.chunks_exact_mut(4).enumerate() {
        let x = (i % w) as f64 + 0.5 - cx;
        let y = (i / w) as f64 + 0.5 - cy;
        if x * x + y * y > r * r {
            px.fill(0);
        }
    }
}

/// Size and offset that fit a `src_w`×`src_h` frame inside `canvas`, preserving aspect ratio
/// and centring it.
pub fn letterbox(src_w: u32, src_h: u32, canvas: Canvas) -> (u32, u32, i64, i64) {
    if src_w == 0 || src_h == 0 {
        return (0, 0, 0, 0);
    }
    let scale = (f64::from(canvas.width) / f64::from(src_w))
        .min(f64::from(canvas.height) / f64::from(src_h));
    let w = ((f64::from(src_w) * scale).round() as u32).clamp(1, canvas.width);
    let h = ((f64::from(src_h) * scale).round() as u32).clamp(1, canvas.height);
    let x = i64::from((canvas.width - w) / 2);
    let y = i64::from((canvas.height - h) / 2);
    (w, h, x, y)
}

#[cfg(test)]
#[path = "../../tests/unit/page/session.rs"]
mod tests;
