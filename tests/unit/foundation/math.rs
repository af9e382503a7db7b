use super::*;

#[test]
fn luminance_of_white_is_one() {
    assert!((luminance(Vec3::ONE) - 1.0).abs() < 1e-6);
    assert_eq!(luminance(Vec3::ZERO), 0.0);
}

#[test]
fn repeat_wraps_into_range() {
    assert!((repeat(1.25, 1.0) - 0.25).abs() < 1e-6);
    assert!((repeat(-0.25, 1.0) - 0.75).abs() < 1e-6);
    assert_eq!(repeat(3.0, 1.0), 0.0);
    assert_eq!(repeat(0.5, 0.0), 0.0);
}

#[test]
fn unorm8_round_trips_every_byte() {
    for v in 0..=255u8 {
        assert_eq!(encode_unorm8(decode_unorm8(v)), v);
    }
}

#[test]
fn lerp_endpoints() {
    let a = Vec4::splat(0.0);
    let b = Vec4::splat(1.0);
    assert_eq!(lerp(a, b, 0.0), a);
    assert_eq!(lerp(a, b, 1.0), b);
}

#[test]
fn hash01_is_stable_and_seeded() {
    assert_eq!(hash01(7, 3, 4), hash01(7, 3, 4));
    assert_ne!(hash01(7, 3, 4), hash01(8, 3, 4));
    let v = hash01(1, 100, 200);
    assert!((0.0..=1.0).contains(&v));
}

#[test]
fn smoothstep_edges() {
    assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
    assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
    assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
    // Degenerate range acts as a step.
    assert_eq!(smoothstep(0.5, 0.5, 0.6), 1.0);
}
