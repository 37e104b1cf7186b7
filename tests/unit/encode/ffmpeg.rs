use super::*;

fn cfg(width: u32, height: u32, fps: u32) -> EncodeConfig {
    default_mp4_config("out/digest.mp4", width, height, fps)
}

#[test]
fn config_validation_catches_bad_values() {
    assert!(cfg(0, 10, 18).validate().is_err());
    assert!(cfg(11, 10, 18).validate().is_err());
    assert!(cfg(10, 10, 0).validate().is_err());
    assert!(cfg(1280, 720, 18).validate().is_ok());
}

#[test]
fn bitrate_targets_seven_mib() {
    // 7 MiB over 10 s is ~5.87 Mbit/s.
    let b = target_bitrate(10.0);
    assert!((b - 5_872_025.6).abs() < 1e-3);
    assert_eq!(bitrate_arg(b), "5872k");

    assert_eq!(target_bitrate(1.0), MAX_BITRATE);
    assert_eq!(target_bitrate(10_000.0), MIN_BITRATE);
    assert_eq!(target_bitrate(0.0), MAX_BITRATE);
    assert_eq!(bitrate_arg(MIN_BITRATE), "500k");
}

#[test]
fn planned_frames_set_the_cap() {
    let c = cfg(1280, 720, 18).with_planned_frames(180);
    assert_eq!(c.max_bitrate, Some(target_bitrate(10.0)));
}

#[test]
fn flatten_premul_over_black_produces_expected_rgb() {
    let src = vec![128u8, 0, 0, 128];
    let mut dst = vec![0u8; 4];
    flatten_to_opaque_rgba8(&mut dst, &src, true, [0, 0, 0, 255]).unwrap();
    assert_eq!(dst, vec![128, 0, 0, 255]);
}

#[test]
fn flatten_straight_over_white() {
    let src = vec![255u8, 0, 0, 128];
    let mut dst = vec![0u8; 4];
    flatten_to_opaque_rgba8(&mut dst, &src, false, [255, 255, 255, 255]).unwrap();
    assert_eq!(dst, vec![255, 127, 127, 255]);
}

#[test]
fn abort_removes_the_partial_output() {
    if !is_ffmpeg_on_path() {
        eprintln!("ffmpeg not on PATH, skipping");
        return;
    }
    let dir = std::env::temp_dir().join(format!(
        "review_render_abort_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    let out = dir.join("digest.mp4");
    let mut enc =
        FfmpegEncoder::new(default_mp4_config(out.clone(), 16, 16, 18), [0, 0, 0, 255]).unwrap();
    let frame = FrameRGBA {
        width: 16,
        height: 16,
        data: vec![255; 16 * 16 * 4],
        premultiplied: true,
    };
    for _ in 0..4 {
        enc.encode_frame(&frame).unwrap();
    }
    enc.abort();
    assert!(!out.exists());
}
