//! The render page: viewers for each asset kind, the annotation canvas, the comment overlay and
//! the session object that ties them together.

pub mod camera;
pub mod config;
pub mod headless;
pub mod media;
pub mod overlay;
pub mod session;
pub mod viewer;

pub use camera::{CameraSnapshot, CameraState};
pub use config::PageConfig;
pub use headless::{AssetResolver, headless_viewers};
pub use overlay::{CommentOverlay, CommentUser};
pub use session::{AssetKind, PageState, RenderPage};
pub use viewer::{Asset3DProvider, Asset3DViewer, ImageViewer, VideoViewer, Viewers};
