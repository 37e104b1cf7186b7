use super::*;

use std::path::PathBuf;
use std::rc::Rc;

use serde_json::json;

use crate::foundation::clock::ManualClock;
use crate::foundation::core::Canvas;
use crate::page::config::PageConfig;
use crate::page::headless::headless_viewers;

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "review_render_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn dispatcher(root: Option<PathBuf>, font: Option<PathBuf>) -> Dispatcher<Rc<ManualClock>> {
    let config = PageConfig {
        canvas: Canvas::new(16, 9).unwrap(),
        assets_root: root.clone(),
        font_path: font,
        ..PageConfig::default()
    };
    let page = RenderPage::new(config, headless_viewers(root), Rc::new(ManualClock::new()));
    Dispatcher::new(page)
}

fn line(v: serde_json::Value) -> String {
    v.to_string()
}

#[test]
fn init_failure_yields_one_error_then_errors() {
    let mut d = dispatcher(None, Some(PathBuf::from("/no/such/font.ttf")));
    assert!(d.start().unwrap().is_error());

    let ack = d.handle_line(&line(json!({"action": "ready"}))).unwrap();
    let Ack::Error { error } = ack else {
        panic!("expected error ack");
    };
    assert!(error.contains("page failed to initialize"));
}

#[test]
fn known_commands_ack_and_unknown_are_ignored() {
    let mut d = dispatcher(None, None);
    assert!(d.start().is_none());

    assert_eq!(d.handle_line(r#"{"action":"ready"}"#), Some(Ack::Ready));
    assert_eq!(d.handle_line(r#"{"action":"wiggle"}"#), None);
    assert_eq!(d.handle_line(r#"{"action":"fitToView"}"#), Some(Ack::FitDone));
    assert_eq!(
        d.handle_line(r#"{"action":"seekTo","data":{"timestamp":1.5}}"#),
        Some(Ack::SeekDone)
    );
    assert_eq!(
        d.handle_line(r#"{"action":"setCameraState","data":{"state":{"fov":30}}}"#),
        Some(Ack::CameraSet)
    );
    assert_eq!(
        d.handle_line(r#"{"action":"getCameraState"}"#),
        Some(Ack::CameraState { state: None })
    );
    assert_eq!(
        d.handle_line(r#"{"action":"setAnnotationOpacity","data":{"opacity":0.5}}"#),
        None
    );
    assert_eq!(d.page().annotation_opacity(), 0.5);
    assert!(d.handle_line("{oops").unwrap().is_error());
}

#[test]
fn annotation_commands_round_trip() {
    let mut d = dispatcher(None, None);
    d.start();

    let draw = line(json!({
        "action": "drawAnnotation",
        "data": {"annotation": [{"tool": "arrow", "x": 0.1, "y": 0.1, "w": 0.5, "h": 0.5}]}
    }));
    assert_eq!(d.handle_line(&draw), Some(Ack::AnnotationDrawn));
    assert_eq!(
        d.handle_line(r#"{"action":"updateAnnotationProgress","data":{"progress":0.5}}"#),
        None
    );
    assert_eq!(d.page().annotation_progress(), 0.5);
    assert_eq!(
        d.handle_line(r#"{"action":"clearAnnotation"}"#),
        Some(Ack::AnnotationCleared)
    );
    assert!(d.page().annotation().is_none());
}

#[test]
fn loads_report_type_or_error() {
    let root = temp_dir("dispatch_loads");
    image::RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 255, 255]))
        .save(root.join("still.png"))
        .unwrap();
    std::fs::write(
        root.join("box.gltf"),
        r#"{"asset":{"version":"2.0"},"animations":[{"name":"Spin"}]}"#,
    )
    .unwrap();

    let mut d = dispatcher(Some(root.clone()), None);
    d.start();

    assert_eq!(
        d.handle_line(r#"{"action":"loadImage","data":{"src":"still.png"}}"#),
        Some(Ack::Loaded {
            kind: AssetKind::Image
        })
    );
    assert!(
        d.handle_line(r#"{"action":"loadImage","data":{"src":"../escape.png"}}"#)
            .unwrap()
            .is_error()
    );
    assert_eq!(d.page().current_type(), None);

    assert_eq!(
        d.handle_line(r#"{"action":"load3D","data":{"src":"box.gltf"}}"#),
        Some(Ack::Loaded {
            kind: AssetKind::ThreeD
        })
    );
    let viewer = d.page().model_viewer().unwrap();
    assert!(viewer.is_playing());

    let Some(Ack::CameraState { state: Some(cam) }) =
        d.handle_line(r#"{"action":"getCameraState"}"#)
    else {
        panic!("expected a camera state");
    };
    assert_eq!(cam.fov, 45.0);

    let out = root.join("frame.png");
    let capture = line(json!({"action": "capture", "data": {"path": out}}));
    assert_eq!(
        d.handle_line(&capture),
        Some(Ack::Captured { path: out.clone() })
    );
    let img = image::open(&out).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (16, 9));

    std::fs::remove_dir_all(&root).ok();
}
