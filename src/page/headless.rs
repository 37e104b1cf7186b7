//! Viewers that run without a browser: still images through the `image` crate and glTF/GLB
//! models tracked as camera/animation state.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::foundation::core::Canvas;
use crate::foundation::error::{ReviewError, ReviewResult};
use crate::page::camera::{
    CameraSnapshot, DEFAULT_FOV_DEG, Orbit, Target, parse_angle_deg, parse_angle_rad,
    parse_length_m,
};
use crate::page::media::FfmpegVideoViewer;
use crate::page::viewer::{Asset3DProvider, Asset3DViewer, ImageViewer, Viewers};
use crate::render::composite::premultiply_in_place;
use crate::render::frame::FrameRGBA;

/// Maps asset `src` strings to local files.
///
/// Relative paths are normalized (no `..`) and joined to the assets root. Absolute paths and
/// `file://` URLs are used as given when no root is set; with a root they must lie inside it.
/// Remote URLs are rejected.
#[derive(Clone, Debug, Default)]
pub struct AssetResolver {
    root: Option<PathBuf>,
}

impl AssetResolver {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    pub fn resolve(&self, src: &str) -> ReviewResult<PathBuf> {
        let src = src.trim();
        if src.is_empty() {
            return Err(ReviewError::validation("asset src must be non-empty"));
        }
        if src.starts_with("http://") || src.starts_with("https://") {
            return Err(ReviewError::asset(format!(
                "remote asset sources are not supported: {src}"
            )));
        }
        let src = src.strip_prefix("file://").unwrap_or(src);
        let path = Path::new(src);
        if path.is_absolute() {
            return match &self.root {
                Some(root) if !is_inside(path, root) => Err(ReviewError::asset(format!(
                    "asset path is outside the asset root '{}': {src}",
                    root.display()
                ))),
                _ => Ok(path.to_path_buf()),
            };
        }

        let rel = normalize_rel_path(src)?;
        Ok(match &self.root {
            Some(root) => root.join(rel),
            None => PathBuf::from(rel),
        })
    }
}

fn is_inside(path: &Path, root: &Path) -> bool {
    !path
        .components()
        .any(|c| matches!(c, std::path::Component::ParentDir))
        && path.starts_with(root)
}

/// Normalize a relative path: `/` separators, no `.` segments, no parent traversal.
pub fn normalize_rel_path(source: &str) -> ReviewResult<String> {
    let s = source.replace('\\', "/");
    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(ReviewError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }
    if out.is_empty() {
        return Err(ReviewError::validation(
            "asset path must contain a file name",
        ));
    }
    Ok(out.join("/"))
}

/// Decode encoded image bytes into a premultiplied frame.
pub fn decode_image(bytes: &[u8]) -> ReviewResult<FrameRGBA> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut data = rgba.into_raw();
    premultiply_in_place(&mut data);
    Ok(FrameRGBA {
        width,
        height,
        data,
        premultiplied: true,
    })
}

/// Image viewer reading local files.
#[derive(Debug, Default)]
pub struct FileImageViewer {
    resolver: AssetResolver,
    frame: Option<FrameRGBA>,
}

impl FileImageViewer {
    pub fn new(resolver: AssetResolver) -> Self {
        Self {
            resolver,
            frame: None,
        }
    }
}

impl ImageViewer for FileImageViewer {
    fn load(&mut self, src: &str) -> ReviewResult<()> {
        self.frame = None;
        let path = self.resolver.resolve(src)?;
        let bytes = std::fs::read(&path)
            .with_context(|| format!("read image '{}'", path.display()))?;
        let frame = decode_image(&bytes)?;
        tracing::debug!(path = %path.display(), frame.width, frame.height, "image loaded");
        self.frame = Some(frame);
        Ok(())
    }

    fn frame(&self) -> Option<&FrameRGBA> {
        self.frame.as_ref()
    }
}

const GLB_MAGIC: u32 = 0x4654_6C67;
const GLB_JSON_CHUNK: u32 = 0x4E4F_534A;
/// Polar angle of the default orbit.
const AUTO_PHI_DEG: f64 = 75.0;
/// Default orbit radius relative to the framing distance.
const AUTO_RADIUS_FACTOR: f64 = 1.05;

#[derive(Debug, Default, serde::Deserialize)]
struct GltfDoc {
    #[serde(default)]
    animations: Vec<GltfAnimation>,
    #[serde(default)]
    accessors: Vec<GltfAccessor>,
    #[serde(default)]
    meshes: Vec<GltfMesh>,
}

#[derive(Debug, serde::Deserialize)]
struct GltfAnimation {
    name: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct GltfAccessor {
    min: Option<Vec<f64>>,
    max: Option<Vec<f64>>,
}

#[derive(Debug, serde::Deserialize)]
struct GltfMesh {
    #[serde(default)]
    primitives: Vec<GltfPrimitive>,
}

#[derive(Debug, serde::Deserialize)]
struct GltfPrimitive {
    #[serde(default)]
    attributes: HashMap<String, usize>,
}

/// What the headless viewer knows about a loaded model.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelInfo {
    pub animations: Vec<String>,
    /// Axis-aligned bounds of all mesh positions, when the accessors declare them.
    pub bounds: Option<([f64; 3], [f64; 3])>,
}

impl ModelInfo {
    /// Read the glTF JSON from `.gltf` text or a binary `.glb` container.
    pub fn parse(bytes: &[u8]) -> ReviewResult<Self> {
        let json = if bytes.len() >= 4 && read_u32(bytes, 0) == Some(GLB_MAGIC) {
            glb_json_chunk(bytes)?
        } else {
            bytes
        };
        let doc: GltfDoc = serde_json::from_slice(json)
            .map_err(|e| ReviewError::asset(format!("invalid glTF json: {e}")))?;

        let animations = doc
            .animations
            .iter()
            .enumerate()
            .map(|(i, a)| a.name.clone().unwrap_or_else(|| format!("animation-{i}")))
            .collect();

        let mut bounds: Option<([f64; 3], [f64; 3])> = None;
        let positions = doc
            .meshes
            .iter()
            .flat_map(|m| &m.primitives)
            .filter_map(|p| p.attributes.get("POSITION"))
            .filter_map(|&i| doc.accessors.get(i));
        for acc in positions {
            let (Some(min), Some(max)) = (&acc.min, &acc.max) else {
                continue;
            };
            if min.len() < 3 || max.len() < 3 {
                continue;
            }
            let (lo, hi) = bounds.get_or_insert(([f64::MAX; 3], [f64::MIN; 3]));
            for k in 0..3 {
                lo[k] = lo[k].min(min[k]);
                hi[k] = hi[k].max(max[k]);
            }
        }

        Ok(Self { animations, bounds })
    }

    fn center(&self) -> [f64; 3] {
        match self.bounds {
            Some((lo, hi)) => [
                (lo[0] + hi[0]) / 2.0,
                (lo[1] + hi[1]) / 2.0,
                (lo[2] + hi[2]) / 2.0,
            ],
            None => [0.0; 3],
        }
    }

    fn bounding_radius(&self) -> f64 {
        match self.bounds {
            Some((lo, hi)) => {
                let d: f64 = (0..3).map(|k| (hi[k] - lo[k]).powi(2)).sum();
                (d.sqrt() / 2.0).max(f64::EPSILON)
            }
            None => 1.0,
        }
    }
}

fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let b = bytes.get(at..at + 4)?;
    Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

fn glb_json_chunk(bytes: &[u8]) -> ReviewResult<&[u8]> {
    let bad = |msg: &str| ReviewError::asset(format!("invalid GLB container: {msg}"));
    let chunk_len = read_u32(bytes, 12).ok_or_else(|| bad("truncated header"))? as usize;
    let chunk_type = read_u32(bytes, 16).ok_or_else(|| bad("truncated header"))?;
    if chunk_type != GLB_JSON_CHUNK {
        return Err(bad("first chunk is not JSON"));
    }
    bytes
        .get(20..20 + chunk_len)
        .ok_or_else(|| bad("JSON chunk exceeds file length"))
}

/// 3D viewer that tracks camera and animation state of a glTF/GLB model without rasterizing it.
///
/// Camera attributes take effect immediately regardless of interpolation decay.
#[derive(Debug)]
pub struct GltfModelViewer {
    resolver: AssetResolver,
    model: Option<ModelInfo>,
    orbit: Orbit,
    target: Target,
    fov: f64,
    decay: f64,
    animation: Option<String>,
    playing: bool,
    time: f64,
}

impl GltfModelViewer {
    pub fn new(resolver: AssetResolver) -> Self {
        let mut viewer = Self {
            resolver,
            model: None,
            orbit: Orbit {
                theta: 0.0,
                phi: AUTO_PHI_DEG.to_radians(),
                radius: 1.0,
            },
            target: Target {
                x: 0.0,
                y: 0.0,
                z: 0.0,
            },
            fov: DEFAULT_FOV_DEG,
            decay: 50.0,
            animation: None,
            playing: false,
            time: 0.0,
        };
        viewer.orbit = viewer.auto_orbit();
        viewer.target = viewer.auto_target();
        viewer
    }

    pub fn model(&self) -> Option<&ModelInfo> {
        self.model.as_ref()
    }

    pub fn animation_name(&self) -> Option<&str> {
        self.animation.as_deref()
    }

    fn auto_target(&self) -> Target {
        let [x, y, z] = self.model.as_ref().map(ModelInfo::center).unwrap_or([0.0; 3]);
        Target { x, y, z }
    }

    /// Distance at which the bounding sphere fills the field of view.
    fn framing_radius(&self) -> f64 {
        let r = self
            .model
            .as_ref()
            .map_or(1.0, ModelInfo::bounding_radius);
        r / (self.fov.to_radians() / 2.0).sin().max(f64::EPSILON)
    }

    fn auto_orbit(&self) -> Orbit {
        Orbit {
            theta: 0.0,
            phi: AUTO_PHI_DEG.to_radians(),
            radius: self.framing_radius() * AUTO_RADIUS_FACTOR,
        }
    }
}

impl Asset3DViewer for GltfModelViewer {
    fn load(&mut self, src: &str) -> ReviewResult<()> {
        let path = self.resolver.resolve(src)?;
        let bytes = std::fs::read(&path)
            .with_context(|| format!("read model '{}'", path.display()))?;
        let info = ModelInfo::parse(&bytes)?;
        tracing::debug!(
            path = %path.display(),
            animations = info.animations.len(),
            "model loaded"
        );
        self.model = Some(info);
        self.animation = None;
        self.playing = false;
        self.time = 0.0;
        self.fov = DEFAULT_FOV_DEG;
        self.orbit = self.auto_orbit();
        self.target = self.auto_target();
        Ok(())
    }

    fn camera(&self) -> CameraSnapshot {
        CameraSnapshot {
            orbit: self.orbit,
            target: self.target,
            fov: self.fov,
        }
    }

    fn set_camera_orbit(&mut self, attr: &str) {
        let auto = self.auto_orbit();
        let parts: Vec<&str> = attr.split_whitespace().collect();
        let part = |i: usize| parts.get(i).copied().unwrap_or("auto");

        let theta = component(part(0), auto.theta, self.orbit.theta, parse_angle_rad);
        let phi = component(part(1), auto.phi, self.orbit.phi, parse_angle_rad);
        let radius = match part(2).strip_suffix('%') {
            Some(pct) => pct
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map_or(self.orbit.radius, |p| auto.radius * p / 100.0),
            None => component(part(2), auto.radius, self.orbit.radius, parse_length_m),
        };
        self.orbit = Orbit { theta, phi, radius };
    }

    fn set_camera_target(&mut self, attr: &str) {
        let auto = self.auto_target();
        let parts: Vec<&str> = attr.split_whitespace().collect();
        let part = |i: usize| parts.get(i).copied().unwrap_or("auto");
        self.target = Target {
            x: component(part(0), auto.x, self.target.x, parse_length_m),
            y: component(part(1), auto.y, self.target.y, parse_length_m),
            z: component(part(2), auto.z, self.target.z, parse_length_m),
        };
    }

    fn set_field_of_view(&mut self, attr: &str) {
        self.fov = component(attr.trim(), DEFAULT_FOV_DEG, self.fov, parse_angle_deg);
    }

    fn interpolation_decay(&self) -> f64 {
        self.decay
    }

    fn set_interpolation_decay(&mut self, decay: f64) {
        self.decay = decay;
    }

    fn available_animations(&self) -> Vec<String> {
        self.model
            .as_ref()
            .map(|m| m.animations.clone())
            .unwrap_or_default()
    }

    fn set_animation_name(&mut self, name: &str) {
        self.animation = Some(name.to_owned());
    }

    fn play(&mut self) {
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.time = if seconds.is_finite() {
            seconds.max(0.0)
        } else {
            0.0
        };
    }

    fn render(&mut self, _canvas: Canvas) -> ReviewResult<Option<FrameRGBA>> {
        Ok(None)
    }
}

/// `auto` resets to the auto value; unparseable tokens keep the current value.
fn component(token: &str, auto: f64, current: f64, parse: fn(&str) -> Option<f64>) -> f64 {
    if token == "auto" {
        return auto;
    }
    parse(token).unwrap_or_else(|| {
        tracing::debug!(token, "ignoring unparseable camera attribute");
        current
    })
}

/// Provider whose 3D viewer is available immediately.
pub struct ReadyModelProvider {
    viewer: Option<Box<dyn Asset3DViewer>>,
}

impl ReadyModelProvider {
    pub fn new(viewer: Box<dyn Asset3DViewer>) -> Self {
        Self {
            viewer: Some(viewer),
        }
    }

    pub fn gltf(resolver: AssetResolver) -> Self {
        Self::new(Box::new(GltfModelViewer::new(resolver)))
    }
}

impl Asset3DProvider for ReadyModelProvider {
    fn poll_viewer(&mut self) -> Option<Box<dyn Asset3DViewer>> {
        self.viewer.take()
    }
}

/// The viewer set used outside a browser: glTF model, ffmpeg video and file image viewers, all
/// resolving sources against `root`.
pub fn headless_viewers(root: Option<PathBuf>) -> Viewers {
    let resolver = AssetResolver::new(root);
    Viewers {
        model: Box::new(ReadyModelProvider::gltf(resolver.clone())),
        video: Box::new(FfmpegVideoViewer::new(resolver.clone())),
        image: Box::new(FileImageViewer::new(resolver)),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/page/headless.rs"]
mod tests;
