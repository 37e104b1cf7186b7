use crate::foundation::clock::Clock;
use crate::foundation::error::ReviewResult;
use crate::page::session::{AssetKind, RenderPage};
use crate::protocol::message::{Ack, Command, Envelope};

/// Routes commands to a [`RenderPage`] and turns results into acks.
///
/// Each command runs to completion before its ack is produced. Errors become `error` acks and
/// leave the page usable, except for initialization failures which leave it failed for good.
pub struct Dispatcher<C: Clock> {
    page: RenderPage<C>,
}

impl<C: Clock> Dispatcher<C> {
    pub fn new(page: RenderPage<C>) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &RenderPage<C> {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut RenderPage<C> {
        &mut self.page
    }

    pub fn into_page(self) -> RenderPage<C> {
        self.page
    }

    /// Initialize the page. Returns the single `error` ack to send when that fails.
    pub fn start(&mut self) -> Option<Ack> {
        self.page.initialize().err().map(|e| Ack::error(&e))
    }

    /// Handle one transport line. Returns `None` for actions without an ack and for unknown
    /// actions.
    pub fn handle_line(&mut self, line: &str) -> Option<Ack> {
        let parsed = Envelope::parse(line).and_then(|env| {
            let action = env.action.clone();
            Command::from_envelope(env).map(|cmd| (action, cmd))
        });
        match parsed {
            Ok((_, Some(cmd))) => self.dispatch(cmd),
            Ok((action, None)) => {
                tracing::warn!(action = %action, "ignoring unknown action");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "rejecting malformed message");
                Some(Ack::error(&e))
            }
        }
    }

    #[tracing::instrument(level = "debug", skip_all, fields(action = command.action()))]
    pub fn dispatch(&mut self, command: Command) -> Option<Ack> {
        match self.execute(command) {
            Ok(ack) => ack,
            Err(e) => {
                tracing::warn!(error = %e, "command failed");
                Some(Ack::error(&e))
            }
        }
    }

    fn execute(&mut self, command: Command) -> ReviewResult<Option<Ack>> {
        let page = &mut self.page;
        let ack = match command {
            Command::Load3D { src } => {
                page.load_3d(&src)?;
                Ack::Loaded {
                    kind: AssetKind::ThreeD,
                }
            }
            Command::LoadVideo { src } => {
                page.load_video(&src)?;
                Ack::Loaded {
                    kind: AssetKind::Video,
                }
            }
            Command::LoadImage { src } => {
                page.load_image(&src)?;
                Ack::Loaded {
                    kind: AssetKind::Image,
                }
            }
            Command::SetCameraState { state, animate } => {
                page.set_camera_state(&state, animate)?;
                Ack::CameraSet
            }
            Command::GetCameraState => Ack::CameraState {
                state: page.get_camera_state(),
            },
            Command::FitToView => {
                page.fit_to_view()?;
                Ack::FitDone
            }
            Command::SeekTo { timestamp } => {
                page.seek_to(timestamp)?;
                Ack::SeekDone
            }
            Command::Seek3DAnimation { timestamp } => {
                page.seek_3d_animation(timestamp)?;
                return Ok(None);
            }
            Command::DrawAnnotation { annotation } => {
                page.draw_annotation(annotation)?;
                Ack::AnnotationDrawn
            }
            Command::UpdateAnnotationProgress { progress } => {
                page.update_annotation_progress(progress)?;
                return Ok(None);
            }
            Command::ClearAnnotation => {
                page.clear_annotation()?;
                Ack::AnnotationCleared
            }
            Command::ShowComment {
                user,
                comment,
                opacity,
            } => {
                page.show_comment(user.as_ref(), comment.as_deref(), opacity)?;
                return Ok(None);
            }
            Command::ShowProjectInfo { name, comment } => {
                page.show_project_info(name.as_deref(), comment.as_deref())?;
                return Ok(None);
            }
            Command::HideProjectInfo => {
                page.hide_project_info()?;
                return Ok(None);
            }
            Command::SetAnnotationOpacity { opacity } => {
                page.set_annotation_opacity(opacity)?;
                return Ok(None);
            }
            Command::Ready => {
                page.mark_ready()?;
                Ack::Ready
            }
            Command::Capture { path } => {
                page.capture()?.save_png(&path)?;
                Ack::Captured { path }
            }
        };
        Ok(Some(ack))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/protocol/dispatch.rs"]
mod tests;
