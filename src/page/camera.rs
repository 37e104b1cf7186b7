//! 3D camera state as exchanged with the model viewer.
//!
//! The viewer reports numeric state (`orbit` in radians/meters, `target` in meters, `fov` in
//! degrees) and accepts string attributes such as `"0.5rad 1.2rad 3m"`. Stored comment cameras
//! may use either form.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::foundation::ease::lerp;
use crate::foundation::error::ReviewResult;

/// Attribute value that resets orbit or target to the viewer's framing.
pub const AUTO_ATTR: &str = "auto auto auto";
pub const AUTO_FOV_ATTR: &str = "auto";
/// Field of view assumed for `auto` or missing values when interpolating.
pub const DEFAULT_FOV_DEG: f64 = 45.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Orbit {
    pub theta: f64,
    pub phi: f64,
    pub radius: f64,
}

impl Orbit {
    pub fn to_attr(self) -> String {
        format!("{}rad {}rad {}m", self.theta, self.phi, self.radius)
    }

    pub fn lerp(self, to: Self, t: f64) -> Self {
        Self {
            theta: lerp(self.theta, to.theta, t),
            phi: lerp(self.phi, to.phi, t),
            radius: lerp(self.radius, to.radius, t),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Target {
    pub fn to_attr(self) -> String {
        format!("{}m {}m {}m", self.x, self.y, self.z)
    }

    pub fn lerp(self, to: Self, t: f64) -> Self {
        Self {
            x: lerp(self.x, to.x, t),
            y: lerp(self.y, to.y, t),
            z: lerp(self.z, to.z, t),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrbitValue {
    Spherical(Orbit),
    Attr(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetValue {
    Point(Target),
    Attr(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FovValue {
    Degrees(f64),
    Attr(String),
}

impl FovValue {
    /// Numeric degrees, with `auto` and unparseable values mapped to the default.
    pub fn degrees(&self) -> f64 {
        match self {
            Self::Degrees(d) => *d,
            Self::Attr(s) => parse_angle_deg(s).unwrap_or(DEFAULT_FOV_DEG),
        }
    }
}

/// Requested camera placement; every part is optional.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orbit: Option<OrbitValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fov: Option<FovValue>,
}

impl CameraState {
    /// Decode an object or a JSON string holding one.
    pub fn from_value(value: &Value) -> ReviewResult<Self> {
        match value {
            Value::String(s) => Ok(serde_json::from_str(s)?),
            other => Ok(Self::deserialize(other)?),
        }
    }

    pub fn orbit_attr(&self) -> Option<String> {
        self.orbit.as_ref().map(|o| match o {
            OrbitValue::Spherical(o) => o.to_attr(),
            OrbitValue::Attr(s) => s.clone(),
        })
    }

    pub fn target_attr(&self) -> Option<String> {
        self.target.as_ref().map(|t| match t {
            TargetValue::Point(t) => t.to_attr(),
            TargetValue::Attr(s) => s.clone(),
        })
    }

    /// A zero field of view is treated as absent.
    pub fn fov_attr(&self) -> Option<String> {
        match self.fov.as_ref()? {
            FovValue::Degrees(d) if *d == 0.0 => None,
            FovValue::Degrees(d) => Some(format!("{d}deg")),
            FovValue::Attr(s) if s.is_empty() => None,
            FovValue::Attr(s) => Some(s.clone()),
        }
    }

    pub fn resolved_orbit(&self) -> Option<Orbit> {
        match self.orbit.as_ref()? {
            OrbitValue::Spherical(o) => Some(*o),
            OrbitValue::Attr(s) => parse_orbit(s),
        }
    }

    pub fn resolved_target(&self) -> Option<Target> {
        match self.target.as_ref()? {
            TargetValue::Point(t) => Some(*t),
            TargetValue::Attr(s) => parse_target(s),
        }
    }
}

/// Numeric camera state as read back from the viewer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraSnapshot {
    pub orbit: Orbit,
    pub target: Target,
    /// Degrees.
    pub fov: f64,
}

impl CameraSnapshot {
    /// Interpolate toward `end`. Parts `end` does not specify (or that fail to parse) are
    /// omitted; the field of view treats missing/`auto` as 45°.
    pub fn lerp_toward(&self, end: &CameraState, t: f64) -> CameraState {
        let orbit = end
            .resolved_orbit()
            .map(|o| OrbitValue::Spherical(self.orbit.lerp(o, t)));
        let target = end
            .resolved_target()
            .map(|p| TargetValue::Point(self.target.lerp(p, t)));
        let end_fov = end.fov.as_ref().map_or(DEFAULT_FOV_DEG, FovValue::degrees);
        let fov = lerp(self.fov, end_fov, t);

        CameraState {
            orbit,
            target,
            fov: (fov != 0.0).then_some(FovValue::Degrees(fov)),
        }
    }
}

/// Parse `"{θ}rad {φ}rad {r}m"`. Angles also accept `deg`; unit-less numbers are taken as-is.
pub fn parse_orbit(s: &str) -> Option<Orbit> {
    let mut parts = s.split_whitespace();
    let theta = parse_angle_rad(parts.next()?)?;
    let phi = parse_angle_rad(parts.next()?)?;
    let radius = parse_length_m(parts.next()?)?;
    Some(Orbit { theta, phi, radius })
}

/// Parse `"{x}m {y}m {z}m"`.
pub fn parse_target(s: &str) -> Option<Target> {
    let mut parts = s.split_whitespace();
    Some(Target {
        x: parse_length_m(parts.next()?)?,
        y: parse_length_m(parts.next()?)?,
        z: parse_length_m(parts.next()?)?,
    })
}

pub fn parse_angle_rad(token: &str) -> Option<f64> {
    let token = token.trim();
    if let Some(v) = token.strip_suffix("rad") {
        return finite(v);
    }
    if let Some(v) = token.strip_suffix("deg") {
        return finite(v).map(f64::to_radians);
    }
    finite(token)
}

pub fn parse_angle_deg(token: &str) -> Option<f64> {
    let token = token.trim();
    if let Some(v) = token.strip_suffix("deg") {
        return finite(v);
    }
    if let Some(v) = token.strip_suffix("rad") {
        return finite(v).map(f64::to_degrees);
    }
    finite(token)
}

pub fn parse_length_m(token: &str) -> Option<f64> {
    let token = token.trim();
    finite(token.strip_suffix('m').unwrap_or(token))
}

fn finite(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
#[path = "../../tests/unit/page/camera.rs"]
mod tests;
