//! The comment card shown over the asset while a digest plays.

use std::time::Duration;

use kurbo::{Circle, RoundedRect, Shape as _};
use serde::{Deserialize, Serialize};

use crate::foundation::core::{Point, Rgba8};
use crate::foundation::error::ReviewResult;
use crate::render::surface::{AnnotationSurface, PaintState};

pub const DEFAULT_REVIEWER_NAME: &str = "Reviewer";
/// Manual opacities at or below this take the overlay out of the layout.
pub const HIDDEN_OPACITY: f64 = 0.01;

/// Author of a comment as sent by the driver.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentUser {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_path: Option<String>,
}

/// Up to two upper-cased initials of `name`, `R` when there is no name.
pub fn initials(name: Option<&str>) -> String {
    let name = name.filter(|n| !n.is_empty()).unwrap_or("R");
    name.split(' ')
        .filter_map(|word| word.chars().next())
        .take(2)
        .collect::<String>()
        .to_uppercase()
}

#[derive(Clone, Debug, PartialEq)]
pub struct OverlayContent {
    pub name: String,
    /// Shown in the avatar circle when there is no avatar image.
    pub initials: Option<String>,
    pub avatar_path: Option<String>,
    pub text: String,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum OpacityMode {
    /// Inline opacity with transitions disabled.
    Manual(f64),
    /// Fading toward `to` since `since`.
    Transition { from: f64, to: f64, since: Duration },
}

/// Overlay display state.
///
/// In transition mode opacity eases linearly toward visible or hidden over the fade duration, and
/// a hide takes the overlay out of the layout once the hide delay has passed. A later show cancels
/// a pending hide.
#[derive(Clone, Debug)]
pub struct CommentOverlay {
    content: Option<OverlayContent>,
    displayed: bool,
    mode: OpacityMode,
    hide_at: Option<Duration>,
    fade: Duration,
}

impl CommentOverlay {
    pub fn new(fade: Duration) -> Self {
        Self {
            content: None,
            displayed: false,
            mode: OpacityMode::Transition {
                from: 0.0,
                to: 0.0,
                since: Duration::ZERO,
            },
            hide_at: None,
            fade,
        }
    }

    pub fn content(&self) -> Option<&OverlayContent> {
        self.content.as_ref()
    }

    pub fn is_displayed(&self) -> bool {
        self.displayed
    }

    /// Whether transitions are disabled by a manual opacity.
    pub fn is_manual(&self) -> bool {
        matches!(self.mode, OpacityMode::Manual(_))
    }

    /// Show `text` attributed to `user`, or hide when either is missing or the text is empty.
    pub fn show(
        &mut self,
        user: Option<&CommentUser>,
        text: Option<&str>,
        opacity: Option<f64>,
        now: Duration,
    ) {
        self.tick(now);
        let (Some(user), Some(text)) = (user, text.filter(|t| !t.is_empty())) else {
            self.hide(opacity, now);
            return;
        };

        let name = user.name.as_deref().filter(|n| !n.is_empty());
        let avatar_path = user.avatar_path.clone().filter(|p| !p.is_empty());
        self.content = Some(OverlayContent {
            name: name.unwrap_or(DEFAULT_REVIEWER_NAME).to_owned(),
            initials: avatar_path.is_none().then(|| initials(name)),
            avatar_path,
            text: text.to_owned(),
        });
        self.displayed = true;
        self.hide_at = None;
        self.mode = match opacity {
            Some(o) => OpacityMode::Manual(o),
            None => OpacityMode::Transition {
                from: self.effective_opacity(now),
                to: 1.0,
                since: now,
            },
        };
    }

    pub fn hide(&mut self, opacity: Option<f64>, now: Duration) {
        self.tick(now);
        match opacity {
            Some(o) => {
                self.mode = OpacityMode::Manual(o);
                if o <= HIDDEN_OPACITY {
                    self.displayed = false;
                    self.hide_at = None;
                }
            }
            None => {
                self.mode = OpacityMode::Transition {
                    from: self.effective_opacity(now),
                    to: 0.0,
                    since: now,
                };
                if self.displayed {
                    self.hide_at = Some(now + self.fade);
                }
            }
        }
    }

    /// Apply a pending transition hide whose delay has elapsed.
    pub fn tick(&mut self, now: Duration) {
        if let Some(at) = self.hide_at
            && now >= at
        {
            self.displayed = false;
            self.hide_at = None;
        }
    }

    pub fn effective_opacity(&self, now: Duration) -> f64 {
        if !self.displayed {
            return 0.0;
        }
        match self.mode {
            OpacityMode::Manual(o) => o.clamp(0.0, 1.0),
            OpacityMode::Transition { from, to, since } => {
                let t = if self.fade.is_zero() {
                    1.0
                } else {
                    (now.saturating_sub(since).as_secs_f64() / self.fade.as_secs_f64()).min(1.0)
                };
                from + (to - from) * t
            }
        }
    }

    /// Paint the card at `opacity` onto a cleared surface. Layout scales with the surface height
    /// from a 720 px reference.
    pub fn paint<S: AnnotationSurface + ?Sized>(
        &self,
        surface: &mut S,
        opacity: f64,
    ) -> ReviewResult<()> {
        surface.clear();
        let Some(content) = self.content.as_ref().filter(|_| opacity > 0.0) else {
            return Ok(());
        };

        let layout = CardLayout::new(surface.width(), surface.height());
        let alpha = opacity.clamp(0.0, 1.0);
        let paint = |surface: &mut S, color: Rgba8| {
            surface.set_paint_state(PaintState {
                color,
                alpha,
                ..PaintState::default()
            });
        };

        paint(surface, CARD_COLOR);
        surface.fill_path(&layout.card.to_path(0.1))?;

        paint(surface, AVATAR_COLOR);
        surface.fill_path(&layout.avatar.to_path(0.1))?;

        paint(surface, Rgba8::WHITE);
        if let Some(initials) = &content.initials {
            let size = 16.0 * layout.scale;
            let origin = Point::new(
                layout.avatar.center.x - size * 0.35 * initials.chars().count() as f64,
                layout.avatar.center.y + size * 0.35,
            );
            surface.fill_text(initials, origin, size)?;
        }
        surface.fill_text(&content.name, layout.name_origin, 16.0 * layout.scale)?;

        paint(surface, TEXT_COLOR);
        surface.fill_text(&content.text, layout.text_origin, 15.0 * layout.scale)?;

        surface.set_paint_state(PaintState::default());
        Ok(())
    }
}

const CARD_COLOR: Rgba8 = Rgba8::new(18, 18, 24, 190);
const AVATAR_COLOR: Rgba8 = Rgba8::opaque(0x3b, 0x82, 0xf6);
const TEXT_COLOR: Rgba8 = Rgba8::opaque(230, 230, 235);

/// Card geometry, bottom-left aligned.
#[derive(Clone, Copy, Debug)]
pub struct CardLayout {
    pub scale: f64,
    pub card: RoundedRect,
    pub avatar: Circle,
    pub name_origin: Point,
    pub text_origin: Point,
}

impl CardLayout {
    pub fn new(width: u32, height: u32) -> Self {
        let (w, h) = (f64::from(width), f64::from(height));
        let s = (h / 720.0).max(0.25);
        let margin = 24.0 * s;
        let card_w = (w - 2.0 * margin).min(720.0 * s).max(0.0);
        let card_h = 88.0 * s;
        let x0 = margin;
        let y0 = h - margin - card_h;
        Self {
            scale: s,
            card: RoundedRect::new(x0, y0, x0 + card_w, y0 + card_h, 16.0 * s),
            avatar: Circle::new((x0 + 40.0 * s, y0 + card_h / 2.0), 20.0 * s),
            name_origin: Point::new(x0 + 76.0 * s, y0 + 36.0 * s),
            text_origin: Point::new(x0 + 76.0 * s, y0 + 64.0 * s),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/page/overlay.rs"]
mod tests;
