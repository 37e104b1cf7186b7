use std::time::Duration;

use crate::digest::job::{DigestComment, DigestItem, DigestJob};
use crate::digest::schedule::{
    self, OverlayCue, PauseFrame, TransitionFrame, frames_per_comment,
};
use crate::digest::settings::DigestTiming;
use crate::encode::sink::FrameSink;
use crate::foundation::clock::Clock;
use crate::foundation::error::{ReviewError, ReviewResult};
use crate::page::camera::{CameraSnapshot, CameraState};
use crate::page::session::{AssetKind, RenderPage};
use crate::render::frame::FrameRGBA;

/// Settle time after an asset loads, before its first frame is captured.
pub const ASSET_WARMUP: Duration = Duration::from_millis(1000);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DigestReport {
    pub frames: u64,
    pub items_rendered: usize,
    pub items_skipped: usize,
    pub comments: usize,
}

/// Upper bound of the frames `job` renders; exact when every asset loads.
pub fn planned_frames(job: &DigestJob, timing: &DigestTiming) -> u64 {
    job.comment_count() as u64 * frames_per_comment(timing)
}

/// Walk every comment of `job` on `page`, pushing captured frames into `sink`.
///
/// The page must be sized to the digest canvas. Items whose asset fails to load are skipped;
/// every other error aborts the digest.
#[tracing::instrument(skip_all, fields(items = job.items.len(), fps = timing.fps))]
pub fn render_digest<C, S>(
    page: &mut RenderPage<C>,
    job: &DigestJob,
    timing: &DigestTiming,
    sink: &mut S,
) -> ReviewResult<DigestReport>
where
    C: Clock,
    S: FrameSink + ?Sized,
{
    if page.canvas() != timing.canvas {
        return Err(ReviewError::validation(format!(
            "page is {}x{} but the digest renders at {}x{}",
            page.canvas().width,
            page.canvas().height,
            timing.canvas.width,
            timing.canvas.height
        )));
    }
    page.initialize()?;

    let mut director = Director {
        page,
        timing,
        sink,
        last_frame: None,
        report: DigestReport::default(),
    };
    for item in &job.items {
        director.item(item)?;
    }

    let report = director.report;
    tracing::info!(
        frames = report.frames,
        rendered = report.items_rendered,
        skipped = report.items_skipped,
        "digest rendered"
    );
    Ok(report)
}

struct Director<'a, C: Clock, S: FrameSink + ?Sized> {
    page: &'a mut RenderPage<C>,
    timing: &'a DigestTiming,
    sink: &'a mut S,
    last_frame: Option<FrameRGBA>,
    report: DigestReport,
}

impl<C: Clock, S: FrameSink + ?Sized> Director<'_, C, S> {
    fn item(&mut self, item: &DigestItem) -> ReviewResult<()> {
        if item.comments.is_empty() {
            tracing::debug!(src = %item.src, "item has no comments");
            return Ok(());
        }
        if let Err(e) = self.load(item) {
            tracing::warn!(
                kind = %item.kind,
                src = %item.src,
                error = %e,
                "skipping digest item"
            );
            self.report.items_skipped += 1;
            return Ok(());
        }
        tracing::info!(
            kind = %item.kind,
            project = item.project_name.as_deref().unwrap_or(""),
            comments = item.comments.len(),
            "rendering digest item"
        );

        for (i, comment) in item.comments.iter().enumerate() {
            let previous = i.checked_sub(1).map(|p| &item.comments[p]);
            self.comment(item.kind, previous, comment)?;
            self.report.comments += 1;
        }

        self.page.show_comment(None, None, None)?;
        self.report.items_rendered += 1;
        Ok(())
    }

    fn load(&mut self, item: &DigestItem) -> ReviewResult<()> {
        match item.kind {
            AssetKind::ThreeD => {
                self.page.load_3d(&item.src)?;
                self.page.fit_to_view()?;
            }
            AssetKind::Video => {
                self.page.load_video(&item.src)?;
                self.page.seek_to(0.0)?;
            }
            AssetKind::Image => self.page.load_image(&item.src)?,
        }
        self.page.sleep(ASSET_WARMUP);
        Ok(())
    }

    fn comment(
        &mut self,
        kind: AssetKind,
        previous: Option<&DigestComment>,
        comment: &DigestComment,
    ) -> ReviewResult<()> {
        let annotation = comment.annotation_set();
        let (start_camera, end_camera) = match kind {
            AssetKind::ThreeD => (self.page.get_camera_state(), comment.camera()),
            _ => (None, None),
        };
        let user = comment.display_user();
        let text = comment.display_text();

        for frame in schedule::transition_frames(self.timing) {
            if let Some(to) = comment.timestamp {
                let ts = frame.timestamp(previous.and_then(|p| p.timestamp), to);
                match kind {
                    AssetKind::ThreeD => self.page.seek_3d_animation(ts)?,
                    AssetKind::Video => self.page.seek_to(ts)?,
                    AssetKind::Image => {}
                }
            }

            if let (Some(start), Some(end)) = (&start_camera, &end_camera) {
                self.move_camera(start, end, &frame)?;
            }

            match frame.overlay(previous.is_some()) {
                OverlayCue::Keep => {}
                OverlayCue::FadePrevious(opacity) => {
                    if let Some(prev) = previous {
                        self.page.show_comment(
                            Some(&prev.display_user()),
                            prev.display_text().as_deref(),
                            Some(opacity),
                        )?;
                    }
                    self.page.set_annotation_opacity(opacity)?;
                }
                OverlayCue::Hidden => {
                    self.page.show_comment(None, None, Some(0.0))?;
                    self.page.set_annotation_opacity(0.0)?;
                }
                OverlayCue::ShowCurrent(opacity) => {
                    self.page
                        .show_comment(Some(&user), text.as_deref(), Some(opacity))?;
                    self.page.set_annotation_opacity(1.0)?;
                }
            }

            if let Some(set) = &annotation {
                if frame.redraws_annotation() {
                    self.page.set_annotation_opacity(1.0)?;
                    self.page.draw_annotation(set.clone())?;
                    self.page.update_annotation_progress(0.0)?;
                }
                if let Some(progress) = frame.annotation_progress() {
                    self.page.update_annotation_progress(progress)?;
                }
            }

            self.capture()?;
            self.page.sleep(Duration::from_secs_f64(frame.interval_ms / 1000.0));
        }

        for frame in schedule::pause_frames(self.timing) {
            self.pause_frame(&frame, annotation.is_some())?;
        }

        if annotation.is_some() {
            self.page.clear_annotation()?;
        }
        Ok(())
    }

    fn move_camera(
        &mut self,
        start: &CameraSnapshot,
        end: &CameraState,
        frame: &TransitionFrame,
    ) -> ReviewResult<()> {
        let state = start.lerp_toward(end, frame.t);
        let value = serde_json::to_value(&state)?;
        self.page.set_camera_state(&value, false)
    }

    fn pause_frame(&mut self, frame: &PauseFrame, has_annotation: bool) -> ReviewResult<()> {
        if frame.is_static()
            && let Some(last) = &self.last_frame
        {
            self.sink.push_frame(last)?;
            self.report.frames += 1;
            return Ok(());
        }

        if has_annotation {
            self.page
                .update_annotation_progress(frame.annotation_progress())?;
        }
        self.capture()?;
        self.page
            .sleep(Duration::from_secs_f64(frame.interval_ms / 1000.0));
        Ok(())
    }

    fn capture(&mut self) -> ReviewResult<()> {
        let frame = self.page.capture()?;
        self.sink.push_frame(&frame)?;
        self.report.frames += 1;
        self.last_frame = Some(frame);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/digest/director.rs"]
mod tests;
