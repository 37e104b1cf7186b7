use std::path::PathBuf;
use std::time::Duration;

use crate::foundation::core::{Canvas, Rgba8};

/// Render page tuning. Defaults match the digest page layout; every field can be overridden from
/// `REVIEW_RENDER_*` environment variables.
#[derive(Clone, Debug, PartialEq)]
pub struct PageConfig {
    /// Size of the page and its annotation canvas.
    pub canvas: Canvas,
    /// How long a 3D load waits for the 3D viewer to become available.
    pub viewer_wait_timeout: Duration,
    pub viewer_poll_interval: Duration,
    /// Settle delay after resetting the 3D camera.
    pub fit_settle: Duration,
    /// Delay before a transition-mode overlay hide takes the overlay out of the layout.
    pub overlay_hide_delay: Duration,
    /// Interpolation decay used for animated camera moves (0 jumps immediately).
    pub camera_decay: f64,
    /// Page color behind letterboxed assets.
    pub background: Rgba8,
    /// Directory that relative asset sources resolve against.
    pub assets_root: Option<PathBuf>,
    /// Font used for annotation text and the comment overlay.
    pub font_path: Option<PathBuf>,
}

pub const DEFAULT_CANVAS: Canvas = Canvas {
    width: 1280,
    height: 720,
};

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            canvas: DEFAULT_CANVAS,
            viewer_wait_timeout: Duration::from_millis(15_000),
            viewer_poll_interval: Duration::from_millis(100),
            fit_settle: Duration::from_millis(500),
            overlay_hide_delay: Duration::from_millis(300),
            camera_decay: 300.0,
            background: Rgba8::BLACK,
            assets_root: None,
            font_path: None,
        }
    }
}

impl PageConfig {
    /// Defaults with process environment overrides applied.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_overrides(|key| std::env::var(key).ok());
        cfg
    }

    /// Apply overrides from `lookup`. Unparseable or out-of-range values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let number = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());
        let millis = |key: &str| number(key).filter(|&n| n > 0).map(Duration::from_millis);

        if let Some(w) = number("REVIEW_RENDER_WIDTH").and_then(|n| u32::try_from(n).ok())
            && let Ok(c) = Canvas::new(w, self.canvas.height)
        {
            self.canvas = c;
        }
        if let Some(h) = number("REVIEW_RENDER_HEIGHT").and_then(|n| u32::try_from(n).ok())
            && let Ok(c) = Canvas::new(self.canvas.width, h)
        {
            self.canvas = c;
        }
        if let Some(d) = millis("REVIEW_RENDER_VIEWER_TIMEOUT_MS") {
            self.viewer_wait_timeout = d;
        }
        if let Some(d) = millis("REVIEW_RENDER_VIEWER_POLL_MS") {
            self.viewer_poll_interval = d;
        }
        if let Some(n) = number("REVIEW_RENDER_FIT_SETTLE_MS") {
            self.fit_settle = Duration::from_millis(n);
        }
        if let Some(n) = number("REVIEW_RENDER_CAMERA_DECAY") {
            self.camera_decay = n as f64;
        }
        if let Some(bg) = lookup("REVIEW_RENDER_BACKGROUND")
            .and_then(|v| crate::foundation::color::parse_css_color(&v).ok())
        {
            self.background = bg;
        }
        if let Some(dir) = lookup("REVIEW_RENDER_ASSETS").filter(|v| !v.is_empty()) {
            self.assets_root = Some(PathBuf::from(dir));
        }
        if let Some(font) = lookup("REVIEW_RENDER_FONT").filter(|v| !v.is_empty()) {
            self.font_path = Some(PathBuf::from(font));
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/page/config.rs"]
mod tests;
