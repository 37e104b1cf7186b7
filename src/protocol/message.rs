//! Wire messages: `{ "action": ..., "data": {...} }` in both directions.

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::annotation::AnnotationSet;
use crate::foundation::error::{ReviewError, ReviewResult};
use crate::page::camera::CameraSnapshot;
use crate::page::overlay::CommentUser;
use crate::page::session::AssetKind;

/// A raw inbound message before its action is interpreted.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Envelope {
    pub action: String,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// Parse one line of the transport. Anything but an object with a string `action` is a
    /// protocol error.
    pub fn parse(line: &str) -> ReviewResult<Self> {
        let value: Value = serde_json::from_str(line)
            .map_err(|e| ReviewError::protocol(format!("message is not valid JSON: {e}")))?;
        if !value.is_object() {
            return Err(ReviewError::protocol("message must be a JSON object"));
        }
        Self::deserialize(value).map_err(|e| {
            ReviewError::protocol(format!("message needs a string \"action\": {e}"))
        })
    }
}

/// Commands the render page understands.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Load3D { src: String },
    LoadVideo { src: String },
    LoadImage { src: String },
    SetCameraState { state: Value, animate: bool },
    GetCameraState,
    FitToView,
    SeekTo { timestamp: f64 },
    Seek3DAnimation { timestamp: f64 },
    DrawAnnotation { annotation: AnnotationSet },
    UpdateAnnotationProgress { progress: f64 },
    ClearAnnotation,
    ShowComment {
        user: Option<CommentUser>,
        comment: Option<String>,
        opacity: Option<f64>,
    },
    ShowProjectInfo {
        name: Option<String>,
        comment: Option<String>,
    },
    HideProjectInfo,
    SetAnnotationOpacity { opacity: f64 },
    Ready,
    Capture { path: PathBuf },
}

#[derive(Deserialize)]
struct SrcData {
    src: String,
}

#[derive(Deserialize)]
struct CameraData {
    #[serde(default)]
    state: Value,
    #[serde(default)]
    animate: Value,
}

#[derive(Deserialize)]
struct TimestampData {
    timestamp: f64,
}

#[derive(Deserialize)]
struct AnnotationData {
    #[serde(default)]
    annotation: AnnotationSet,
}

#[derive(Deserialize)]
struct ProgressData {
    progress: f64,
}

#[derive(Deserialize)]
struct OpacityData {
    opacity: f64,
}

#[derive(Deserialize)]
struct CommentData {
    #[serde(default)]
    user: Option<CommentUser>,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default)]
    opacity: Option<f64>,
}

#[derive(Deserialize)]
struct ProjectInfoData {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    comment: Option<String>,
}

#[derive(Deserialize)]
struct CaptureData {
    path: PathBuf,
}

fn data<T: DeserializeOwned>(action: &str, data: Value) -> ReviewResult<T> {
    let data = if data.is_null() {
        Value::Object(Default::default())
    } else {
        data
    };
    serde_json::from_value(data)
        .map_err(|e| ReviewError::protocol(format!("invalid data for '{action}': {e}")))
}

impl Command {
    /// Interpret an envelope. `Ok(None)` means the action is not a known command.
    pub fn from_envelope(env: Envelope) -> ReviewResult<Option<Self>> {
        let Envelope { action, data: raw } = env;
        let a = action.as_str();
        let cmd = match a {
            "load3D" => Self::Load3D {
                src: data::<SrcData>(a, raw)?.src,
            },
            "loadVideo" => Self::LoadVideo {
                src: data::<SrcData>(a, raw)?.src,
            },
            "loadImage" => Self::LoadImage {
                src: data::<SrcData>(a, raw)?.src,
            },
            "setCameraState" => {
                let d: CameraData = data(a, raw)?;
                Self::SetCameraState {
                    state: d.state,
                    animate: d.animate != Value::Bool(false),
                }
            }
            "getCameraState" => Self::GetCameraState,
            "fitToView" => Self::FitToView,
            "seekTo" => Self::SeekTo {
                timestamp: data::<TimestampData>(a, raw)?.timestamp,
            },
            "seek3DAnimation" => Self::Seek3DAnimation {
                timestamp: data::<TimestampData>(a, raw)?.timestamp,
            },
            "drawAnnotation" => Self::DrawAnnotation {
                annotation: data::<AnnotationData>(a, raw)?.annotation,
            },
            "updateAnnotationProgress" => Self::UpdateAnnotationProgress {
                progress: data::<ProgressData>(a, raw)?.progress,
            },
            "clearAnnotation" => Self::ClearAnnotation,
            "showComment" => {
                let d: CommentData = data(a, raw)?;
                Self::ShowComment {
                    user: d.user,
                    comment: d.comment,
                    opacity: d.opacity,
                }
            }
            "showProjectInfo" => {
                let d: ProjectInfoData = data(a, raw)?;
                Self::ShowProjectInfo {
                    name: d.name,
                    comment: d.comment,
                }
            }
            "hideProjectInfo" => Self::HideProjectInfo,
            "setAnnotationOpacity" => Self::SetAnnotationOpacity {
                opacity: data::<OpacityData>(a, raw)?.opacity,
            },
            "ready" => Self::Ready,
            "capture" => Self::Capture {
                path: data::<CaptureData>(a, raw)?.path,
            },
            _ => return Ok(None),
        };
        Ok(Some(cmd))
    }

    pub fn action(&self) -> &'static str {
        match self {
            Self::Load3D { .. } => "load3D",
            Self::LoadVideo { .. } => "loadVideo",
            Self::LoadImage { .. } => "loadImage",
            Self::SetCameraState { .. } => "setCameraState",
            Self::GetCameraState => "getCameraState",
            Self::FitToView => "fitToView",
            Self::SeekTo { .. } => "seekTo",
            Self::Seek3DAnimation { .. } => "seek3DAnimation",
            Self::DrawAnnotation { .. } => "drawAnnotation",
            Self::UpdateAnnotationProgress { .. } => "updateAnnotationProgress",
            Self::ClearAnnotation => "clearAnnotation",
            Self::ShowComment { .. } => "showComment",
            Self::ShowProjectInfo { .. } => "showProjectInfo",
            Self::HideProjectInfo => "hideProjectInfo",
            Self::SetAnnotationOpacity { .. } => "setAnnotationOpacity",
            Self::Ready => "ready",
            Self::Capture { .. } => "capture",
        }
    }
}

/// Outbound acknowledgement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Ack {
    Loaded {
        #[serde(rename = "type")]
        kind: AssetKind,
    },
    CameraSet,
    CameraState {
        state: Option<CameraSnapshot>,
    },
    FitDone,
    SeekDone,
    AnnotationDrawn,
    AnnotationCleared,
    Ready,
    Captured {
        path: PathBuf,
    },
    Error {
        error: String,
    },
}

impl Ack {
    pub fn error(err: &ReviewError) -> Self {
        Self::Error {
            error: err.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn to_line(&self) -> ReviewResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/protocol/message.rs"]
mod tests;
