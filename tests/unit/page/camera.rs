use super::*;
use serde_json::json;

#[test]
fn object_state_formats_attributes() {
    let state = CameraState::from_value(&json!({
        "orbit": {"theta": 0.5, "phi": 1.2, "radius": 3},
        "target": {"x": 0, "y": 1.5, "z": -2},
        "fov": 30
    }))
    .unwrap();
    assert_eq!(state.orbit_attr().as_deref(), Some("0.5rad 1.2rad 3m"));
    assert_eq!(state.target_attr().as_deref(), Some("0m 1.5m -2m"));
    assert_eq!(state.fov_attr().as_deref(), Some("30deg"));
}

#[test]
fn string_parts_pass_through() {
    let state = CameraState::from_value(&json!(
        r#"{"orbit":"10deg 75deg 4m","target":"auto auto auto","fov":"auto"}"#
    ))
    .unwrap();
    assert_eq!(state.orbit_attr().as_deref(), Some("10deg 75deg 4m"));
    assert_eq!(state.target_attr().as_deref(), Some(AUTO_ATTR));
    assert_eq!(state.fov_attr().as_deref(), Some("auto"));
    assert!(state.resolved_target().is_none());

    let orbit = state.resolved_orbit().unwrap();
    assert!((orbit.theta - 10f64.to_radians()).abs() < 1e-12);
    assert_eq!(orbit.radius, 4.0);
}

#[test]
fn malformed_json_string_is_an_error() {
    assert!(CameraState::from_value(&json!("{orbit:")).is_err());
    assert!(CameraState::from_value(&json!({"orbit": 3})).is_err());
}

#[test]
fn zero_fov_is_skipped() {
    let state = CameraState {
        fov: Some(FovValue::Degrees(0.0)),
        ..CameraState::default()
    };
    assert_eq!(state.fov_attr(), None);
}

#[test]
fn orbit_strings_parse() {
    assert_eq!(
        parse_orbit("0.1rad 1.5rad 2.5m"),
        Some(Orbit {
            theta: 0.1,
            phi: 1.5,
            radius: 2.5
        })
    );
    assert_eq!(parse_orbit("auto auto auto"), None);
    assert_eq!(parse_orbit("1rad 2rad"), None);
    assert_eq!(
        parse_target("1m 2m 3m"),
        Some(Target {
            x: 1.0,
            y: 2.0,
            z: 3.0
        })
    );
}

#[test]
fn snapshot_interpolation() {
    let start = CameraSnapshot {
        orbit: Orbit {
            theta: 0.0,
            phi: 1.0,
            radius: 2.0,
        },
        target: Target {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        },
        fov: 30.0,
    };
    let end = CameraState::from_value(&json!({
        "orbit": "1rad 2rad 4m",
        "fov": "auto"
    }))
    .unwrap();

    let mid = start.lerp_toward(&end, 0.5);
    assert_eq!(
        mid.resolved_orbit(),
        Some(Orbit {
            theta: 0.5,
            phi: 1.5,
            radius: 3.0
        })
    );
    assert!(mid.target.is_none());
    assert_eq!(mid.fov, Some(FovValue::Degrees(37.5)));

    let no_fov = start.lerp_toward(&CameraState::default(), 1.0);
    assert_eq!(no_fov.fov, Some(FovValue::Degrees(DEFAULT_FOV_DEG)));
}
