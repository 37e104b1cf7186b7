use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::foundation::core::Canvas;
use crate::foundation::error::{ReviewError, ReviewResult};

pub const DEFAULT_FPS: f64 = 18.0;
pub const DEFAULT_FPS_MAX: f64 = 24.0;
pub const DEFAULT_TRANSITION_SECS: f64 = 1.0;
pub const DEFAULT_TRANSITION_MAX_SECS: f64 = 3.0;
pub const DEFAULT_PAUSE_SECS: f64 = 2.0;
pub const DEFAULT_PAUSE_MAX_SECS: f64 = 10.0;
pub const DEFAULT_WIDTH: u32 = 1280;
pub const DEFAULT_HEIGHT: u32 = 720;

/// Digest tuning as stored by an installation, plus optional per-team overrides.
///
/// Missing and zero values fall back to the defaults. Team overrides are capped at the
/// installation maxima; installation defaults are not.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DigestSettings {
    pub fps_default: Option<f64>,
    pub fps_max: Option<f64>,
    pub transition_default: Option<f64>,
    pub transition_max: Option<f64>,
    pub pause_default: Option<f64>,
    pub pause_max: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub team: Option<TeamOverrides>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamOverrides {
    pub fps: Option<f64>,
    /// Seconds.
    pub transition: Option<f64>,
    /// Seconds.
    pub pause: Option<f64>,
}

/// Resolved digest timing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DigestTiming {
    pub fps: u32,
    pub transition: Duration,
    pub pause: Duration,
    pub canvas: Canvas,
}

impl Default for DigestTiming {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS as u32,
            transition: Duration::from_secs_f64(DEFAULT_TRANSITION_SECS),
            pause: Duration::from_secs_f64(DEFAULT_PAUSE_SECS),
            canvas: Canvas {
                width: DEFAULT_WIDTH,
                height: DEFAULT_HEIGHT,
            },
        }
    }
}

fn or_default(v: Option<f64>, default: f64) -> f64 {
    v.filter(|v| *v != 0.0 && !v.is_nan()).unwrap_or(default)
}

impl DigestSettings {
    pub fn from_json(s: &str) -> ReviewResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn resolve(&self) -> ReviewResult<DigestTiming> {
        let fps_max = or_default(self.fps_max, DEFAULT_FPS_MAX);
        let transition_max = or_default(self.transition_max, DEFAULT_TRANSITION_MAX_SECS);
        let pause_max = or_default(self.pause_max, DEFAULT_PAUSE_MAX_SECS);

        let mut fps = or_default(self.fps_default, DEFAULT_FPS);
        let mut transition = or_default(self.transition_default, DEFAULT_TRANSITION_SECS);
        let mut pause = or_default(self.pause_default, DEFAULT_PAUSE_SECS);

        if let Some(team) = &self.team {
            if let Some(v) = team.fps {
                fps = v.min(fps_max);
            }
            if let Some(v) = team.transition {
                transition = v.min(transition_max);
            }
            if let Some(v) = team.pause {
                pause = v.min(pause_max);
            }
        }

        let fps = fps.round();
        if !(1.0..=240.0).contains(&fps) {
            return Err(ReviewError::validation(format!(
                "digest fps must be between 1 and 240, got {fps}"
            )));
        }
        let secs = |name: &str, v: f64| {
            if v.is_finite() && v >= 0.0 {
                Ok(Duration::from_secs_f64(v))
            } else {
                Err(ReviewError::validation(format!(
                    "digest {name} must be a non-negative number of seconds, got {v}"
                )))
            }
        };

        let width = self.width.filter(|w| *w > 0).unwrap_or(DEFAULT_WIDTH);
        let height = self.height.filter(|h| *h > 0).unwrap_or(DEFAULT_HEIGHT);

        Ok(DigestTiming {
            fps: fps as u32,
            transition: secs("transition", transition)?,
            pause: secs("pause", pause)?,
            canvas: Canvas::new(width, height)?,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/digest/settings.rs"]
mod tests;
