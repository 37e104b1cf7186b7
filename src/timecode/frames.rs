use std::fmt;

/// Added before flooring so a time that lands a float-rounding hair short of a frame boundary
/// still resolves to that frame.
pub const FRAME_EPSILON: f64 = 0.0001;

/// Added to frame start times so the produced time sits inside the frame, not on its boundary.
pub const TIME_BIAS_SECS: f64 = 0.001;

fn usable_rate(frame_rate: f64) -> Option<f64> {
    (frame_rate.is_finite() && frame_rate > 0.0).then_some(frame_rate)
}

/// Frame index (relative to time 0) containing `time_seconds`.
///
/// Returns 0 for a missing/non-positive frame rate. Non-finite times count as 0.
pub fn time_to_frame(time_seconds: f64, frame_rate: f64) -> i64 {
    let Some(rate) = usable_rate(frame_rate) else {
        return 0;
    };
    let t = if time_seconds.is_finite() {
        time_seconds
    } else {
        0.0
    };
    (t * rate + FRAME_EPSILON).floor() as i64
}

/// Playback time that lands strictly inside `frame`.
pub fn frame_to_time(frame: i64, frame_rate: f64) -> f64 {
    let Some(rate) = usable_rate(frame_rate) else {
        return 0.0;
    };
    frame as f64 / rate + TIME_BIAS_SECS
}

/// Frame number shown to users: the frame index plus the asset's start-frame offset.
pub fn calculate_current_frame(time_seconds: f64, frame_rate: f64, start_frame_offset: i64) -> i64 {
    time_to_frame(time_seconds, frame_rate) + start_frame_offset
}

/// Snap an arbitrary scrub position onto the frame it falls in.
pub fn snap_to_frame(time_seconds: f64, frame_rate: f64) -> f64 {
    frame_to_time(time_to_frame(time_seconds, frame_rate), frame_rate)
}

/// Time of the frame `delta` frames away from the one containing `time_seconds`, clamped to
/// `[0, duration_seconds]`.
pub fn step_frame(time_seconds: f64, frame_rate: f64, delta: i64, duration_seconds: f64) -> f64 {
    let frame = time_to_frame(time_seconds, frame_rate).saturating_add(delta);
    let t = frame_to_time(frame, frame_rate);
    let upper = if duration_seconds.is_finite() {
        duration_seconds.max(0.0)
    } else {
        f64::MAX
    };
    t.clamp(0.0, upper)
}

/// SMPTE-style `HH:MM:SS:FF` timecode, quantized to the frame grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timecode {
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub frames: i64,
}

impl Timecode {
    /// Decompose `time_seconds` at `frame_rate`.
    ///
    /// The fields are recomputed from the integer frame index rather than from the raw input
    /// time, so the display always agrees with [`calculate_current_frame`]. An unusable frame
    /// rate yields all zeros.
    pub fn from_time(time_seconds: f64, frame_rate: f64) -> Self {
        let Some(rate) = usable_rate(frame_rate) else {
            return Self {
                hours: 0,
                minutes: 0,
                seconds: 0,
                frames: 0,
            };
        };

        let frame_index = time_to_frame(time_seconds, rate);
        let secs_total = frame_index as f64 / rate;

        Self {
            hours: (secs_total / 3600.0).floor() as i64,
            minutes: ((secs_total % 3600.0) / 60.0).floor() as i64,
            seconds: (secs_total % 60.0).floor() as i64,
            frames: (frame_index as f64 % rate).floor() as i64,
        }
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds, self.frames
        )
    }
}

/// Format `time_seconds` as `HH:MM:SS:FF`.
///
/// The start frame offset only affects [`calculate_current_frame`]; it is accepted here so
/// callers can pass the same triple to both, but it never shifts the displayed fields.
pub fn format_smpte(time_seconds: f64, frame_rate: f64, _start_frame_offset: i64) -> String {
    Timecode::from_time(time_seconds, frame_rate).to_string()
}

#[cfg(test)]
#[path = "../../tests/unit/timecode/frames.rs"]
mod tests;
