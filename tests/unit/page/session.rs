use super::*;

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;

use crate::foundation::clock::ManualClock;
use crate::page::camera::{Orbit, Target};
use crate::page::viewer::{Asset3DProvider, ImageViewer, VideoViewer};

type Log = Rc<RefCell<Vec<String>>>;

struct FakeModel {
    log: Log,
    fail: bool,
    time: f64,
}

impl Asset3DViewer for FakeModel {
    fn load(&mut self, src: &str) -> ReviewResult<()> {
        self.log.borrow_mut().push(format!("load {src}"));
        if self.fail {
            return Err(ReviewError::asset("bad model"));
        }
        Ok(())
    }

    fn camera(&self) -> CameraSnapshot {
        CameraSnapshot {
            orbit: Orbit {
                theta: 0.0,
                phi: 1.0,
                radius: 2.0,
            },
            target: Target {
                x: 0.0,
                y: 0.5,
                z: 0.0,
            },
            fov: 45.0,
        }
    }

    fn set_camera_orbit(&mut self, attr: &str) {
        self.log.borrow_mut().push(format!("orbit {attr}"));
    }

    fn set_camera_target(&mut self, attr: &str) {
        self.log.borrow_mut().push(format!("target {attr}"));
    }

    fn set_field_of_view(&mut self, attr: &str) {
        self.log.borrow_mut().push(format!("fov {attr}"));
    }

    fn interpolation_decay(&self) -> f64 {
        0.0
    }

    fn set_interpolation_decay(&mut self, decay: f64) {
        self.log.borrow_mut().push(format!("decay {decay}"));
    }

    fn available_animations(&self) -> Vec<String> {
        vec!["Walk".into(), "Run".into()]
    }

    fn set_animation_name(&mut self, name: &str) {
        self.log.borrow_mut().push(format!("animation {name}"));
    }

    fn play(&mut self) {
        self.log.borrow_mut().push("play".into());
    }

    fn pause(&mut self) {
        self.log.borrow_mut().push("pause".into());
    }

    fn is_playing(&self) -> bool {
        false
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.time = seconds;
        self.log.borrow_mut().push(format!("time {seconds}"));
    }

    fn render(&mut self, _canvas: Canvas) -> ReviewResult<Option<FrameRGBA>> {
        Ok(None)
    }
}

struct SlowProvider {
    polls_until_ready: u32,
    viewer: Option<Box<dyn Asset3DViewer>>,
}

impl Asset3DProvider for SlowProvider {
    fn poll_viewer(&mut self) -> Option<Box<dyn Asset3DViewer>> {
        if self.polls_until_ready > 0 {
            self.polls_until_ready -= 1;
            return None;
        }
        self.viewer.take()
    }
}

struct FakeVideo {
    log: Log,
    time: f64,
}

impl VideoViewer for FakeVideo {
    fn load(&mut self, src: &str) -> ReviewResult<()> {
        self.log.borrow_mut().push(format!("video {src}"));
        Ok(())
    }

    fn seek(&mut self, seconds: f64) -> ReviewResult<()> {
        self.time = seconds;
        self.log.borrow_mut().push(format!("seek {seconds}"));
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn frame_rate(&self) -> Option<f64> {
        Some(24.0)
    }

    fn current_frame(&mut self) -> ReviewResult<Option<FrameRGBA>> {
        Ok(None)
    }
}

/// Serves a 2×1 opaque red image for any src except `missing.png`.
struct FakeImage {
    frame: Option<FrameRGBA>,
}

impl ImageViewer for FakeImage {
    fn load(&mut self, src: &str) -> ReviewResult<()> {
        if src == "missing.png" {
            self.frame = None;
            return Err(ReviewError::asset("missing"));
        }
        self.frame = Some(FrameRGBA {
            width: 2,
            height: 1,
            data: [255, 0, 0, 255].repeat(2),
            premultiplied: true,
        });
        Ok(())
    }

    fn frame(&self) -> Option<&FrameRGBA> {
        self.frame.as_ref()
    }
}

struct Harness {
    page: RenderPage<Rc<ManualClock>>,
    clock: Rc<ManualClock>,
    log: Log,
}

fn harness_with(config: PageConfig, polls_until_ready: Option<u32>, model_fails: bool) -> Harness {
    let log: Log = Rc::default();
    let clock = Rc::new(ManualClock::new());
    let model = FakeModel {
        log: log.clone(),
        fail: model_fails,
        time: 0.0,
    };
    let viewers = Viewers {
        model: Box::new(SlowProvider {
            polls_until_ready: polls_until_ready.unwrap_or(u32::MAX),
            viewer: polls_until_ready.map(|_| Box::new(model) as Box<dyn Asset3DViewer>),
        }),
        video: Box::new(FakeVideo {
            log: log.clone(),
            time: 0.0,
        }),
        image: Box::new(FakeImage { frame: None }),
    };
    let page = RenderPage::new(config, viewers, clock.clone());
    Harness { page, clock, log }
}

fn small_config() -> PageConfig {
    PageConfig {
        canvas: Canvas::new(8, 8).unwrap(),
        ..PageConfig::default()
    }
}

fn ready(polls_until_ready: u32) -> Harness {
    let mut h = harness_with(small_config(), Some(polls_until_ready), false);
    h.page.initialize().unwrap();
    h
}

fn rect_set() -> AnnotationSet {
    AnnotationSet::from_value(&json!({
        "shapes": [{"tool": "rectangle", "x": 0.25, "y": 0.25, "w": 0.5, "h": 0.5, "color": "#00ff00"}]
    }))
    .unwrap()
}

#[test]
fn commands_require_initialization() {
    let mut h = harness_with(small_config(), Some(0), false);
    assert_eq!(h.page.state(), &PageState::Uninitialized);
    let err = h.page.load_image("a.png").unwrap_err();
    assert!(err.to_string().contains("not initialized"));

    h.page.initialize().unwrap();
    assert_eq!(h.page.state(), &PageState::Ready);
    h.page.initialize().unwrap();
}

#[test]
fn failed_initialization_is_terminal() {
    let config = PageConfig {
        font_path: Some("/definitely/not/a/font.ttf".into()),
        ..small_config()
    };
    let mut h = harness_with(config, Some(0), false);
    assert!(h.page.initialize().is_err());
    assert!(matches!(h.page.state(), PageState::Failed(_)));

    let err = h.page.mark_ready().unwrap_err();
    assert!(err.to_string().contains("page failed to initialize"));
    assert!(h.page.initialize().is_err());
}

#[test]
fn load_3d_waits_for_viewer_and_plays_first_animation() {
    let mut h = ready(3);
    h.page.load_3d("model.glb").unwrap();

    assert_eq!(h.clock.now(), Duration::from_millis(300));
    assert_eq!(h.page.current_type(), Some(AssetKind::ThreeD));
    assert_eq!(h.page.visible_viewer(), Some(AssetKind::ThreeD));
    assert!(!h.page.is_loading_visible());
    assert_eq!(
        *h.log.borrow(),
        vec!["load model.glb", "animation Walk", "play"]
    );
}

#[test]
fn load_3d_times_out_without_viewer() {
    let mut h = harness_with(small_config(), None, false);
    h.page.initialize().unwrap();

    let err = h.page.load_3d("model.glb").unwrap_err();
    assert!(matches!(err, ReviewError::Timeout(_)));
    assert!(h.clock.now() > Duration::from_secs(15));
    assert!(h.clock.now() <= Duration::from_millis(15_100));
    assert_eq!(h.page.current_type(), None);
}

#[test]
fn failed_load_clears_current_type() {
    let mut h = harness_with(small_config(), Some(0), true);
    h.page.initialize().unwrap();
    assert!(h.page.load_3d("broken.glb").is_err());
    assert_eq!(h.page.current_type(), None);
    assert_eq!(h.page.state(), &PageState::Ready);

    assert!(h.page.load_image("missing.png").is_err());
    assert_eq!(h.page.current_type(), None);
    assert_eq!(h.page.visible_viewer(), None);
}

#[test]
fn load_resets_annotation() {
    let mut h = ready(0);
    h.page.load_image("a.png").unwrap();
    h.page.draw_annotation(rect_set()).unwrap();
    h.page.update_annotation_progress(1.0).unwrap();
    assert!(
        h.page
            .annotation_frame()
            .unwrap()
            .data
            .chunks_exact(4)
            .any(|px| px[3] > 0)
    );

    h.page.load_video("clip.mp4").unwrap();
    assert!(h.page.annotation().is_none());
    assert!(h.page.annotation_frame().unwrap().data.iter().all(|&b| b == 0));
    assert_eq!(h.page.current_type(), Some(AssetKind::Video));
}

#[test]
fn draw_annotation_starts_hidden() {
    let mut h = ready(0);
    h.page.draw_annotation(rect_set()).unwrap();
    assert_eq!(h.page.annotation_progress(), 0.0);
    assert!(h.page.annotation_frame().unwrap().data.iter().all(|&b| b == 0));

    h.page.clear_annotation().unwrap();
    h.page.update_annotation_progress(1.0).unwrap();
    assert_eq!(h.page.annotation_progress(), 0.0);
}

#[test]
fn camera_state_only_applies_in_3d() {
    let mut h = ready(0);
    h.page
        .set_camera_state(&json!({"orbit": "1rad 1rad 1m"}), true)
        .unwrap();
    assert!(h.log.borrow().is_empty());
    assert!(h.page.get_camera_state().is_none());

    h.page.load_3d("m.glb").unwrap();
    h.log.borrow_mut().clear();

    h.page
        .set_camera_state(
            &json!({"orbit": {"theta": 0.5, "phi": 1.0, "radius": 2.0}, "target": "0m 1m 0m", "fov": 0}),
            false,
        )
        .unwrap();
    assert_eq!(
        *h.log.borrow(),
        vec!["decay 0", "orbit 0.5rad 1rad 2m", "target 0m 1m 0m"]
    );

    h.log.borrow_mut().clear();
    h.page
        .set_camera_state(&json!("{\"fov\": 30}"), true)
        .unwrap();
    assert_eq!(*h.log.borrow(), vec!["decay 300", "fov 30deg"]);

    h.log.borrow_mut().clear();
    h.page.set_camera_state(&json!("{not json"), true).unwrap();
    h.page.set_camera_state(&Value::Null, true).unwrap();
    assert!(h.log.borrow().is_empty());

    assert_eq!(h.page.get_camera_state().unwrap().fov, 45.0);
}

#[test]
fn fit_to_view_resets_camera_and_settles() {
    let mut h = ready(0);
    h.page.fit_to_view().unwrap();
    assert_eq!(h.clock.now(), Duration::ZERO);

    h.page.load_3d("m.glb").unwrap();
    h.log.borrow_mut().clear();
    h.page.fit_to_view().unwrap();
    assert_eq!(
        *h.log.borrow(),
        vec![
            "orbit auto auto auto",
            "target auto auto auto",
            "fov auto"
        ]
    );
    assert_eq!(h.clock.now(), Duration::from_millis(500));
}

#[test]
fn seeks_are_mode_gated() {
    let mut h = ready(0);
    h.page.load_3d("m.glb").unwrap();
    h.log.borrow_mut().clear();

    h.page.seek_to(2.0).unwrap();
    h.page.seek_3d_animation(1.5).unwrap();
    assert_eq!(*h.log.borrow(), vec!["pause", "time 1.5"]);

    h.page.load_video("v.mp4").unwrap();
    h.log.borrow_mut().clear();
    h.page.seek_3d_animation(1.0).unwrap();
    h.page.seek_to(2.0).unwrap();
    assert_eq!(*h.log.borrow(), vec!["seek 2"]);
}

#[test]
fn project_info_drives_the_overlay() {
    let mut h = ready(0);
    h.page
        .show_project_info(Some("Chair v2"), Some("Final pass"))
        .unwrap();
    let content = h.page.overlay().content().unwrap();
    assert_eq!(content.name, "Chair v2");
    assert_eq!(content.initials.as_deref(), Some("CV"));
    assert!(h.page.overlay().is_displayed());

    h.page.hide_project_info().unwrap();
    h.page.sleep(Duration::from_millis(300));
    h.page.capture().unwrap();
    assert!(!h.page.overlay().is_displayed());
}

#[test]
fn ready_hides_loading_indicator() {
    let mut h = ready(0);
    assert!(h.page.is_loading_visible());
    h.page.mark_ready().unwrap();
    assert!(h.page.is_ready());
    assert!(!h.page.is_loading_visible());
}

#[test]
fn capture_letterboxes_viewer_frame() {
    let mut h = ready(0);
    h.page.load_image("wide.png").unwrap();
    let frame = h.page.capture().unwrap();
    assert_eq!((frame.width, frame.height), (8, 8));

    let px = |x: usize, y: usize| &frame.data[(y * 8 + x) * 4..(y * 8 + x) * 4 + 4];
    assert_eq!(px(0, 0), &[0, 0, 0, 255]);
    assert_eq!(px(0, 7), &[0, 0, 0, 255]);
    assert_eq!(px(3, 4), &[255, 0, 0, 255]);
}

#[test]
fn capture_applies_annotation_opacity() {
    let mut h = ready(0);
    h.page
        .draw_annotation(
            AnnotationSet::from_value(&json!([{
                "tool": "pen",
                "strokeWidth": 40,
                "color": "#ffffff",
                "points": [{"x": 0.0, "y": 0.5}, {"x": 1.0, "y": 0.5}]
            }]))
            .unwrap(),
        )
        .unwrap();
    h.page.update_annotation_progress(1.0).unwrap();

    let full = h.page.capture().unwrap();
    h.page.set_annotation_opacity(0.0).unwrap();
    let hidden = h.page.capture().unwrap();

    let center = (4 * 8 + 4) * 4;
    assert!(full.data[center] > 200);
    assert_eq!(hidden.data[center], 0);
}

#[test]
fn letterbox_fits_and_centres() {
    let canvas = Canvas::new(1280, 720).unwrap();
    assert_eq!(letterbox(1920, 1080, canvas), (1280, 720, 0, 0));
    assert_eq!(letterbox(1000, 1000, canvas), (720, 720, 280, 0));
    assert_eq!(letterbox(2000, 500, canvas), (1280, 320, 0, 200));
    assert_eq!(letterbox(0, 10, canvas), (0, 0, 0, 0));
}

#[test]
fn avatar_is_decoded_once_and_shared_across_captures() {
    let dir = std::env::temp_dir().join(format!(
        "review_render_avatar_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    image::RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 255, 255]))
        .save(dir.join("me.png"))
        .unwrap();

    let config = PageConfig {
        canvas: Canvas::new(64, 64).unwrap(),
        assets_root: Some(dir),
        ..PageConfig::default()
    };
    let mut h = harness_with(config, Some(0), false);
    h.page.initialize().unwrap();
    let user = CommentUser {
        name: Some("Ada".to_owned()),
        avatar_path: Some("me.png".to_owned()),
    };
    h.page.show_comment(Some(&user), Some("hi"), Some(1.0)).unwrap();

    h.page.capture().unwrap();
    h.page.capture().unwrap();
    assert_eq!(h.page.avatars.len(), 1);

    let (first, ..) = h.page.overlay_avatar(1.0).unwrap();
    let (second, ..) = h.page.overlay_avatar(1.0).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(first.data.chunks_exact(4).any(|px| px[2] > 200));
}
