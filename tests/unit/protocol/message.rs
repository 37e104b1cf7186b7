use super::*;
use serde_json::json;

fn parse(line: &str) -> ReviewResult<Option<Command>> {
    Command::from_envelope(Envelope::parse(line)?)
}

#[test]
fn envelope_requires_object_with_string_action() {
    assert!(Envelope::parse("not json").is_err());
    assert!(Envelope::parse("[1,2]").is_err());
    assert!(Envelope::parse(r#"{"action": 3}"#).is_err());
    assert!(Envelope::parse(r#"{"data": {}}"#).is_err());

    let env = Envelope::parse(r#"{"action": "ready"}"#).unwrap();
    assert_eq!(env.action, "ready");
    assert!(env.data.is_null());
}

#[test]
fn parses_load_commands() {
    assert_eq!(
        parse(r#"{"action":"load3D","data":{"src":"m.glb"}}"#).unwrap(),
        Some(Command::Load3D { src: "m.glb".into() })
    );
    assert_eq!(
        parse(r#"{"action":"loadImage","data":{"src":"a.png"}}"#).unwrap(),
        Some(Command::LoadImage { src: "a.png".into() })
    );
    let err = parse(r#"{"action":"loadVideo"}"#).unwrap_err();
    assert!(err.to_string().contains("loadVideo"));
}

#[test]
fn animate_defaults_to_true_unless_literal_false() {
    let cmd = |animate: Value| {
        Command::from_envelope(Envelope {
            action: "setCameraState".into(),
            data: json!({"state": {"fov": 30}, "animate": animate}),
        })
        .unwrap()
        .unwrap()
    };
    for (animate, expected) in [
        (Value::Null, true),
        (json!(true), true),
        (json!("false"), true),
        (json!(false), false),
    ] {
        let Command::SetCameraState { animate, state } = cmd(animate) else {
            panic!("wrong command");
        };
        assert_eq!(animate, expected);
        assert_eq!(state, json!({"fov": 30}));
    }
}

#[test]
fn parses_annotation_and_comment_payloads() {
    let Some(Command::DrawAnnotation { annotation }) = parse(
        r#"{"action":"drawAnnotation","data":{"annotation":{"shapes":[{"tool":"rect","x":0.1,"y":0.1,"w":0.2,"h":0.2}],"aspectRatio":1.5}}}"#,
    )
    .unwrap() else {
        panic!("expected drawAnnotation");
    };
    assert_eq!(annotation.shapes.len(), 1);
    assert_eq!(annotation.aspect_ratio, Some(1.5));

    let Some(Command::ShowComment {
        user,
        comment,
        opacity,
    }) = parse(
        r#"{"action":"showComment","data":{"user":{"name":"Ann","avatarPath":"a.png"},"comment":"hi","opacity":0.5}}"#,
    )
    .unwrap() else {
        panic!("expected showComment");
    };
    let user = user.unwrap();
    assert_eq!(user.avatar_path.as_deref(), Some("a.png"));
    assert_eq!(comment.as_deref(), Some("hi"));
    assert_eq!(opacity, Some(0.5));
}

#[test]
fn unknown_actions_are_not_commands() {
    assert_eq!(parse(r#"{"action":"dance"}"#).unwrap(), None);
}

#[test]
fn action_names_round_trip_through_parse() {
    for line in [
        r#"{"action":"fitToView"}"#,
        r#"{"action":"clearAnnotation"}"#,
        r#"{"action":"hideProjectInfo"}"#,
        r#"{"action":"getCameraState"}"#,
        r#"{"action":"seek3DAnimation","data":{"timestamp":1}}"#,
        r#"{"action":"capture","data":{"path":"/tmp/f.png"}}"#,
    ] {
        let cmd = parse(line).unwrap().unwrap();
        let action = Envelope::parse(line).unwrap().action;
        assert_eq!(cmd.action(), action);
    }
}

#[test]
fn acks_serialize_with_action_tag() {
    assert_eq!(
        serde_json::to_value(Ack::Loaded {
            kind: AssetKind::ThreeD
        })
        .unwrap(),
        json!({"action": "loaded", "type": "3d"})
    );
    assert_eq!(Ack::FitDone.to_line().unwrap(), r#"{"action":"fitDone"}"#);
    assert_eq!(
        serde_json::to_value(Ack::CameraState { state: None }).unwrap(),
        json!({"action": "cameraState", "state": null})
    );
    let err = Ack::error(&ReviewError::timeout("slow"));
    assert!(err.is_error());
    assert_eq!(
        serde_json::to_value(&err).unwrap(),
        json!({"action": "error", "error": "timeout: slow"})
    );
}
