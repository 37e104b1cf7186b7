//! Digest videos: a walk through the comments of several assets, captured frame by frame from a
//! render page.

pub mod director;
pub mod job;
pub mod schedule;
pub mod settings;

pub use director::{DigestReport, planned_frames, render_digest};
pub use job::{DigestComment, DigestItem, DigestJob, ProjectEntry};
pub use settings::{DigestSettings, DigestTiming, TeamOverrides};
