//! Frame/time arithmetic shared by the player surfaces, the render page and the digest director.
//!
//! Every frame computation in the crate goes through this module. Seeking to frame `N` and
//! reading the frame back from the resulting playback time must always yield `N`; the two small
//! biases in [`time_to_frame`] and [`frame_to_time`] exist for that round trip.

mod frames;
mod markers;

pub use frames::{
    FRAME_EPSILON, Timecode, TIME_BIAS_SECS, calculate_current_frame, format_smpte,
    frame_to_time, snap_to_frame, step_frame, time_to_frame,
};
pub use markers::{MARKER_GROUP_FRACTION, MarkerGroup, group_markers};
