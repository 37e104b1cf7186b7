use super::*;

#[test]
fn parses_hex_forms() {
    assert_eq!(parse_css_color("#ef4444").unwrap(), DEFAULT_ANNOTATION_COLOR);
    assert_eq!(
        parse_css_color("#0000ff80").unwrap(),
        Rgba8::new(0, 0, 255, 128)
    );
    assert_eq!(parse_css_color("#f00").unwrap(), Rgba8::opaque(255, 0, 0));
    assert_eq!(parse_css_color("#FFF8").unwrap(), Rgba8::new(255, 255, 255, 136));
}

#[test]
fn parses_rgb_functions_and_keywords() {
    assert_eq!(
        parse_css_color("rgb(16, 32, 48)").unwrap(),
        Rgba8::opaque(16, 32, 48)
    );
    assert_eq!(
        parse_css_color("RGBA(255, 0, 0, 0.5)").unwrap(),
        Rgba8::new(255, 0, 0, 128)
    );
    assert_eq!(parse_css_color(" Yellow ").unwrap(), Rgba8::opaque(255, 255, 0));
}

#[test]
fn rejects_garbage() {
    assert!(parse_css_color("#12345").is_err());
    assert!(parse_css_color("#zzzzzz").is_err());
    assert!(parse_css_color("rgb(1,2)").is_err());
    assert!(parse_css_color("chartreuse-ish").is_err());
}
