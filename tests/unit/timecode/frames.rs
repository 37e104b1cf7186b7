use super::*;

const RATES: [f64; 6] = [23.976, 24.0, 25.0, 29.97, 30.0, 60.0];

#[test]
fn seek_then_read_back_is_identity() {
    for rate in RATES {
        for n in [0_i64, 1, 2, 17, 100, 1_439, 86_399] {
            assert_eq!(time_to_frame(frame_to_time(n, rate), rate), n, "rate={rate} n={n}");
        }
    }
}

#[test]
fn whole_seconds_land_on_frame_boundaries() {
    assert_eq!(time_to_frame(1.0, 30.0), 30);
    assert_eq!(time_to_frame(0.0, 24.0), 0);
    // A hair below the boundary is rescued by the epsilon.
    assert_eq!(time_to_frame(0.033_333_333, 30.0), 1);
    // Farther below stays in the previous frame.
    assert_eq!(time_to_frame(0.0333, 30.0), 0);
}

#[test]
fn unusable_rates_collapse_to_zero() {
    assert_eq!(time_to_frame(5.0, 0.0), 0);
    assert_eq!(time_to_frame(5.0, -24.0), 0);
    assert_eq!(time_to_frame(5.0, f64::NAN), 0);
    assert_eq!(time_to_frame(f64::NAN, 24.0), 0);
    assert_eq!(frame_to_time(10, 0.0), 0.0);
    assert_eq!(format_smpte(12.0, 0.0, 0), "00:00:00:00");
}

#[test]
fn smpte_formats_from_integer_frame() {
    assert_eq!(format_smpte(1.5, 24.0, 0), "00:00:01:12");
    assert_eq!(format_smpte(3661.0, 30.0, 0), "01:01:01:00");
    assert_eq!(format_smpte(0.0, 25.0, 0), "00:00:00:00");
    assert_eq!(format_smpte(59.99, 25.0, 0), "00:00:59:24");
}

#[test]
fn smpte_ignores_start_offset() {
    assert_eq!(format_smpte(1.5, 24.0, 86_400), format_smpte(1.5, 24.0, 0));
}

#[test]
fn timecode_fields_are_exposed() {
    let tc = Timecode::from_time(3725.5, 24.0);
    assert_eq!(
        tc,
        Timecode {
            hours: 1,
            minutes: 2,
            seconds: 5,
            frames: 12,
        }
    );
}

#[test]
fn current_frame_adds_offset() {
    assert_eq!(calculate_current_frame(0.0, 24.0, 100), 100);
    assert_eq!(calculate_current_frame(2.0, 24.0, 100), 148);
}

#[test]
fn snap_moves_into_containing_frame() {
    let t = snap_to_frame(1.02, 24.0);
    assert_eq!(time_to_frame(t, 24.0), 24);
    assert!((t - (1.0 + TIME_BIAS_SECS)).abs() < 1e-9);
}

#[test]
fn step_frame_moves_and_clamps() {
    let next = step_frame(1.0 + TIME_BIAS_SECS, 24.0, 1, 10.0);
    assert_eq!(time_to_frame(next, 24.0), 25);

    let prev = step_frame(1.0 + TIME_BIAS_SECS, 24.0, -1, 10.0);
    assert_eq!(time_to_frame(prev, 24.0), 23);

    assert_eq!(step_frame(0.0, 24.0, -5, 10.0), 0.0);
    assert_eq!(step_frame(9.99, 24.0, 48, 10.0), 10.0);
}
