//! Frame timing of a comment: the transition into it and the pause on it.
//!
//! All times are milliseconds since the start of the comment's transition phase.

use std::time::Duration;

use crate::digest::settings::DigestTiming;
use crate::foundation::ease::{Ease, lerp};

/// The previous comment fades out over this window.
pub const HIDE_MS: f64 = 300.0;
/// The new comment starts fading in here.
pub const SHOW_DELAY_MS: f64 = 400.0;
pub const SHOW_DURATION_MS: f64 = 500.0;
pub const ANNOTATION_START_MS: f64 = 800.0;
pub const ANNOTATION_DURATION_MS: f64 = 1000.0;
/// Nominal time the pause phase starts at.
pub const PAUSE_START_MS: f64 = 1500.0;

/// Number of frames a phase of `duration` spans at `fps`.
pub fn phase_frames(duration: Duration, fps: u32) -> u32 {
    (duration.as_secs_f64() * f64::from(fps)).round() as u32
}

/// What the comment overlay does on one transition frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OverlayCue {
    /// Leave the overlay as it is.
    Keep,
    /// Show the previous comment at this opacity.
    FadePrevious(f64),
    Hidden,
    /// Show the new comment at this opacity.
    ShowCurrent(f64),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionFrame {
    pub index: u32,
    pub elapsed_ms: f64,
    pub interval_ms: f64,
    /// Eased `index / count`.
    pub t: f64,
}

impl TransitionFrame {
    pub fn overlay(&self, has_previous: bool) -> OverlayCue {
        let e = self.elapsed_ms;
        if has_previous && e < HIDE_MS {
            OverlayCue::FadePrevious((1.0 - e / HIDE_MS).max(0.0))
        } else if (HIDE_MS..SHOW_DELAY_MS).contains(&e) {
            OverlayCue::Hidden
        } else if e >= SHOW_DELAY_MS {
            OverlayCue::ShowCurrent(((e - SHOW_DELAY_MS) / SHOW_DURATION_MS).min(1.0))
        } else {
            OverlayCue::Keep
        }
    }

    /// The annotation is drawn fresh on the first frame and again when its reveal starts.
    pub fn redraws_annotation(&self) -> bool {
        self.index == 0
            || (self.elapsed_ms >= ANNOTATION_START_MS
                && self.elapsed_ms - self.interval_ms < ANNOTATION_START_MS)
    }

    pub fn annotation_progress(&self) -> Option<f64> {
        annotation_progress(self.elapsed_ms)
    }

    /// Playback position between the previous comment's timestamp (or 0) and `to`.
    pub fn timestamp(&self, from: Option<f64>, to: f64) -> f64 {
        lerp(from.unwrap_or(0.0), to, self.t)
    }
}

/// Reveal progress of the annotation at `elapsed_ms`, `None` before the reveal starts.
pub fn annotation_progress(elapsed_ms: f64) -> Option<f64> {
    (elapsed_ms >= ANNOTATION_START_MS)
        .then(|| ((elapsed_ms - ANNOTATION_START_MS) / ANNOTATION_DURATION_MS).min(1.0))
}

pub fn transition_frames(timing: &DigestTiming) -> impl Iterator<Item = TransitionFrame> {
    let count = phase_frames(timing.transition, timing.fps);
    let interval_ms = if count == 0 {
        0.0
    } else {
        timing.transition.as_secs_f64() * 1000.0 / f64::from(count)
    };
    (0..count).map(move |index| TransitionFrame {
        index,
        elapsed_ms: f64::from(index) * interval_ms,
        interval_ms,
        t: Ease::InOutCubic.apply(f64::from(index) / f64::from(count)),
    })
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PauseFrame {
    pub index: u32,
    pub total_ms: f64,
    pub interval_ms: f64,
}

impl PauseFrame {
    /// Frames after the annotation reveal finished repeat the previous frame.
    pub fn is_static(&self) -> bool {
        self.index > 0 && self.total_ms > ANNOTATION_START_MS + ANNOTATION_DURATION_MS
    }

    pub fn annotation_progress(&self) -> f64 {
        annotation_progress(self.total_ms).unwrap_or(0.0)
    }
}

pub fn pause_frames(timing: &DigestTiming) -> impl Iterator<Item = PauseFrame> {
    let count = phase_frames(timing.pause, timing.fps);
    let interval_ms = if count == 0 {
        0.0
    } else {
        timing.pause.as_secs_f64() * 1000.0 / f64::from(count)
    };
    (0..count).map(move |index| PauseFrame {
        index,
        total_ms: PAUSE_START_MS + f64::from(index) * interval_ms,
        interval_ms,
    })
}

/// Frames one comment produces.
pub fn frames_per_comment(timing: &DigestTiming) -> u64 {
    u64::from(phase_frames(timing.transition, timing.fps))
        + u64::from(phase_frames(timing.pause, timing.fps))
}

#[cfg(test)]
#[path = "../../tests/unit/digest/schedule.rs"]
mod tests;
