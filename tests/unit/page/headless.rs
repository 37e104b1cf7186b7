use super::*;

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

const GLTF_JSON: &str = r#"{
    "asset": {"version": "2.0"},
    "accessors": [
        {"min": [-1.0, 0.0, -1.0], "max": [1.0, 2.0, 1.0]},
        {"min": [0.0], "max": [1.0]}
    ],
    "meshes": [{"primitives": [{"attributes": {"POSITION": 0}}]}],
    "animations": [{"name": "Walk"}, {}]
}"#;

fn glb(json: &str) -> Vec<u8> {
    let mut chunk = json.as_bytes().to_vec();
    while chunk.len() % 4 != 0 {
        chunk.push(b' ');
    }
    let total = 12 + 8 + chunk.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
    out.extend_from_slice(&GLB_JSON_CHUNK.to_le_bytes());
    out.extend_from_slice(&chunk);
    out
}

#[test]
fn normalize_rel_path_rejects_traversal_and_empty() {
    assert_eq!(normalize_rel_path("a/./b\\c.png").unwrap(), "a/b/c.png");
    assert!(normalize_rel_path("../secret").is_err());
    assert!(normalize_rel_path("./").is_err());
}

#[test]
fn resolver_joins_root_and_rejects_remote() {
    let r = AssetResolver::new(Some(PathBuf::from("/srv/media")));
    assert_eq!(
        r.resolve("uploads/a.glb").unwrap(),
        PathBuf::from("/srv/media/uploads/a.glb")
    );
    assert!(matches!(
        r.resolve("https://cdn.example.com/a.mp4"),
        Err(ReviewError::Asset(_))
    ));
    assert!(r.resolve("  ").is_err());
}

#[test]
fn absolute_sources_stay_inside_the_root() {
    let r = AssetResolver::new(Some(PathBuf::from("/srv/media")));
    assert_eq!(
        r.resolve("/srv/media/uploads/a.png").unwrap(),
        PathBuf::from("/srv/media/uploads/a.png")
    );
    assert_eq!(
        r.resolve("file:///srv/media/b.png").unwrap(),
        PathBuf::from("/srv/media/b.png")
    );
    for src in [
        "/etc/passwd",
        "file:///tmp/x.png",
        "/srv/media/../secret.png",
        "/srv/media-other/a.png",
    ] {
        assert!(
            matches!(r.resolve(src), Err(ReviewError::Asset(_))),
            "{src} should be rejected"
        );
    }

    let open = AssetResolver::new(None);
    assert_eq!(
        open.resolve("file:///tmp/x.png").unwrap(),
        PathBuf::from("/tmp/x.png")
    );
}

#[test]
fn model_info_reads_gltf_and_glb() {
    let from_text = ModelInfo::parse(GLTF_JSON.as_bytes()).unwrap();
    let from_glb = ModelInfo::parse(&glb(GLTF_JSON)).unwrap();
    assert_eq!(from_text, from_glb);
    assert_eq!(from_text.animations, vec!["Walk", "animation-1"]);
    assert_eq!(
        from_text.bounds,
        Some(([-1.0, 0.0, -1.0], [1.0, 2.0, 1.0]))
    );
    assert_eq!(from_text.center(), [0.0, 1.0, 0.0]);
}

#[test]
fn model_info_rejects_truncated_glb() {
    let mut bytes = glb(GLTF_JSON);
    bytes.truncate(30);
    assert!(ModelInfo::parse(&bytes).is_err());
}

#[test]
fn gltf_viewer_frames_model_and_parses_attributes() {
    let dir = temp_dir("gltf_viewer");
    std::fs::write(dir.join("model.glb"), glb(GLTF_JSON)).unwrap();

    let mut viewer = GltfModelViewer::new(AssetResolver::new(Some(dir.clone())));
    viewer.load("model.glb").unwrap();
    assert_eq!(viewer.available_animations().len(), 2);

    let cam = viewer.camera();
    assert_eq!(cam.fov, DEFAULT_FOV_DEG);
    assert_eq!(cam.target.y, 1.0);
    let expected = 3f64.sqrt() / (22.5f64.to_radians().sin()) * AUTO_RADIUS_FACTOR;
    assert!((cam.orbit.radius - expected).abs() < 1e-9);

    viewer.set_camera_orbit("0.5rad 90deg 4m");
    viewer.set_camera_target("1m 2m 3m");
    viewer.set_field_of_view("30deg");
    let cam = viewer.camera();
    assert_eq!(cam.orbit.theta, 0.5);
    assert!((cam.orbit.phi - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    assert_eq!(cam.orbit.radius, 4.0);
    assert_eq!((cam.target.x, cam.target.y, cam.target.z), (1.0, 2.0, 3.0));
    assert_eq!(cam.fov, 30.0);

    viewer.set_camera_orbit("bogus auto 50%");
    let cam = viewer.camera();
    assert_eq!(cam.orbit.theta, 0.5);
    assert!((cam.orbit.phi - AUTO_PHI_DEG.to_radians()).abs() < 1e-12);

    viewer.set_field_of_view("auto");
    viewer.set_camera_target("auto auto auto");
    assert_eq!(viewer.camera().fov, DEFAULT_FOV_DEG);
    assert_eq!(viewer.camera().target.y, 1.0);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn gltf_viewer_tracks_animation_time() {
    let mut viewer = GltfModelViewer::new(AssetResolver::default());
    viewer.set_animation_name("Walk");
    viewer.play();
    assert!(viewer.is_playing());
    viewer.pause();
    viewer.set_current_time(-3.0);
    assert_eq!(viewer.current_time(), 0.0);
    viewer.set_current_time(2.5);
    assert_eq!(viewer.current_time(), 2.5);
    assert_eq!(viewer.animation_name(), Some("Walk"));
    assert!(viewer.render(Canvas::new(8, 8).unwrap()).unwrap().is_none());
}

#[test]
fn missing_model_is_an_error() {
    let dir = temp_dir("gltf_missing");
    let mut viewer = GltfModelViewer::new(AssetResolver::new(Some(dir.clone())));
    assert!(viewer.load("nope.glb").is_err());
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn image_viewer_decodes_and_premultiplies() {
    let dir = temp_dir("image_viewer");
    let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([200, 100, 0, 128]));
    img.save(dir.join("still.png")).unwrap();

    let mut viewer = FileImageViewer::new(AssetResolver::new(Some(dir.clone())));
    viewer.load("still.png").unwrap();
    let frame = viewer.frame().unwrap();
    assert_eq!((frame.width, frame.height), (3, 2));
    assert!(frame.premultiplied);
    assert_eq!(&frame.data[..4], &[100, 50, 0, 128]);

    assert!(viewer.load("missing.png").is_err());
    assert!(viewer.frame().is_none());
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn ready_provider_hands_out_viewer_once() {
    let mut provider = ReadyModelProvider::gltf(AssetResolver::default());
    assert!(provider.poll_viewer().is_some());
    assert!(provider.poll_viewer().is_none());
}
