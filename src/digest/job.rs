//! Digest input: the assets to show and the comments to walk through on each.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::annotation::AnnotationSet;
use crate::foundation::error::{ReviewError, ReviewResult};
use crate::page::camera::CameraState;
use crate::page::overlay::{CommentUser, DEFAULT_REVIEWER_NAME};
use crate::page::session::AssetKind;

/// Longest comment text shown on the overlay, in characters.
pub const MAX_COMMENT_CHARS: usize = 150;
/// Directory avatar paths are stored under.
pub const AVATAR_DIR: &str = "avatars";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestComment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub user: Option<CommentUser>,
    /// Seconds into the video or 3D animation.
    #[serde(default)]
    pub timestamp: Option<f64>,
    /// Camera object or a JSON string holding one.
    #[serde(default)]
    pub camera_state: Option<Value>,
    #[serde(default)]
    pub annotation: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Value>,
    /// RFC 3339 creation time; used for ordering when timestamps are missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<Value>,
}

impl DigestComment {
    pub fn is_reply(&self) -> bool {
        self.parent_id.as_ref().is_some_and(|v| !v.is_null())
    }

    /// Author as shown on the overlay: named `Reviewer` when anonymous, avatar resolved under
    /// the avatar directory.
    pub fn display_user(&self) -> CommentUser {
        let user = self.user.as_ref();
        CommentUser {
            name: Some(
                user.and_then(|u| u.name.clone())
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| DEFAULT_REVIEWER_NAME.to_owned()),
            ),
            avatar_path: user
                .and_then(|u| u.avatar_path.as_deref())
                .filter(|p| !p.is_empty())
                .map(|p| format!("{AVATAR_DIR}/{p}")),
        }
    }

    pub fn display_text(&self) -> Option<String> {
        self.content
            .as_deref()
            .map(|c| c.chars().take(MAX_COMMENT_CHARS).collect())
    }

    pub fn camera(&self) -> Option<CameraState> {
        let value = self.camera_state.as_ref().filter(|v| !v.is_null())?;
        match CameraState::from_value(value) {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring undecodable comment camera state");
                None
            }
        }
    }

    /// The decoded annotation; `None` when absent, undecodable or without shapes.
    pub fn annotation_set(&self) -> Option<AnnotationSet> {
        let value = self.annotation.as_ref().filter(|v| !v.is_null())?;
        match AnnotationSet::from_value(value) {
            Ok(set) if !set.is_empty() => Some(set),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring undecodable comment annotation");
                None
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestItem {
    #[serde(rename = "type")]
    pub kind: AssetKind,
    #[serde(alias = "assetPath")]
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Value>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub comments: Vec<DigestComment>,
}

impl DigestItem {
    /// Drop replies and order the remaining comments for playback.
    ///
    /// When every comment carries a timestamp they play in timestamp order; otherwise in
    /// creation order. Ties keep their input order.
    pub fn normalize(&mut self) {
        self.comments.retain(|c| !c.is_reply());
        if self.comments.iter().all(|c| c.timestamp.is_some()) {
            self.comments.sort_by(|a, b| {
                let (ta, tb) = (a.timestamp.unwrap_or(0.0), b.timestamp.unwrap_or(0.0));
                ta.total_cmp(&tb).then_with(|| by_created(a, b))
            });
        } else {
            self.comments.sort_by(by_created);
        }
    }
}

fn by_created(a: &DigestComment, b: &DigestComment) -> Ordering {
    a.created_at.cmp(&b.created_at)
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DigestJob {
    #[serde(default)]
    pub items: Vec<DigestItem>,
}

impl DigestJob {
    /// Parse a job from `{"items": [...]}`, a bare item array, or `{"projects": [...]}` in
    /// the project/version layout. Items are normalized.
    pub fn from_json(s: &str) -> ReviewResult<Self> {
        let value: Value = serde_json::from_str(s)?;
        let mut job = match value {
            Value::Array(_) => Self {
                items: serde_json::from_value(value)?,
            },
            Value::Object(ref map) if map.contains_key("projects") => {
                let projects: Vec<ProjectEntry> =
                    serde_json::from_value(map["projects"].clone())?;
                Self::from_projects(&projects)
            }
            Value::Object(_) => serde_json::from_value(value)?,
            _ => {
                return Err(ReviewError::validation(
                    "digest job must be an object or an array of items",
                ));
            }
        };
        job.normalize();
        Ok(job)
    }

    pub fn normalize(&mut self) {
        for item in &mut self.items {
            item.normalize();
        }
    }

    pub fn comment_count(&self) -> usize {
        self.items.iter().map(|i| i.comments.len()).sum()
    }

    /// A digest with no comments produces no video.
    pub fn is_renderable(&self) -> bool {
        self.comment_count() > 0
    }

    /// One item per project, built from the first version that has comments (or the first
    /// version when none do). Image bundles contribute the comments of all their images.
    pub fn from_projects(projects: &[ProjectEntry]) -> Self {
        let items = projects.iter().filter_map(ProjectEntry::to_item).collect();
        let mut job = Self { items };
        job.normalize();
        job
    }
}

/// A project as listed by the review backend.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProjectEntry {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub versions: Vec<VersionEntry>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct VersionEntry {
    /// `three_d_asset`, `video` or `image_bundle`.
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub comments: Vec<DigestComment>,
    #[serde(default)]
    pub images: Vec<ImageEntry>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ImageEntry {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub comments: Vec<DigestComment>,
}

impl VersionEntry {
    fn has_comments(&self) -> bool {
        !self.comments.is_empty() || self.images.iter().any(|i| !i.comments.is_empty())
    }

    fn asset_kind(&self) -> AssetKind {
        match self.kind.as_str() {
            "three_d_asset" => AssetKind::ThreeD,
            "image_bundle" => AssetKind::Image,
            _ => AssetKind::Video,
        }
    }

    fn collect_comments(&self) -> Vec<DigestComment> {
        match self.kind.as_str() {
            "three_d_asset" | "video" => self.comments.clone(),
            "image_bundle" => self
                .images
                .iter()
                .flat_map(|img| {
                    img.comments.iter().map(|c| DigestComment {
                        image_id: img.id.clone(),
                        ..c.clone()
                    })
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl ProjectEntry {
    fn to_item(&self) -> Option<DigestItem> {
        let version = self
            .versions
            .iter()
            .find(|v| v.has_comments())
            .or_else(|| self.versions.first())?;
        Some(DigestItem {
            kind: version.asset_kind(),
            src: version.filename.clone().unwrap_or_default(),
            project_id: self.id.clone(),
            project_name: self.name.clone(),
            comments: version.collect_comments(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/digest/job.rs"]
mod tests;
