use super::*;

#[test]
fn canvas_rejects_zero_and_oversized() {
    assert!(Canvas::new(0, 10).is_err());
    assert!(Canvas::new(10, 0).is_err());
    assert!(Canvas::new(70_000, 10).is_err());
    assert!(Canvas::new(1280, 720).is_ok());
}

#[test]
fn canvas_orientation() {
    let wide = Canvas::new(1280, 720).unwrap();
    assert!(wide.is_landscape());
    assert!((wide.aspect() - 16.0 / 9.0).abs() < 1e-12);

    let square = Canvas::new(1000, 1000).unwrap();
    assert!(!square.is_landscape());
    assert_eq!(square.byte_len(), 4_000_000);
}

#[test]
fn premul_conversion_rounds() {
    let p = Rgba8::new(255, 128, 0, 128).to_premul();
    assert_eq!(p.to_array(), [128, 64, 0, 128]);
    assert_eq!(Rgba8::WHITE.to_premul().to_array(), [255, 255, 255, 255]);
}

#[test]
fn with_opacity_scales_alpha_only() {
    let c = Rgba8::opaque(10, 20, 30).with_opacity(0.4);
    assert_eq!((c.r, c.g, c.b, c.a), (10, 20, 30, 102));
    assert_eq!(Rgba8::WHITE.with_opacity(7.0).a, 255);
}
