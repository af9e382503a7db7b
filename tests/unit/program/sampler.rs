use super::*;

fn gradient_2x1() -> Image {
    Image::from_rgba8(2, 1, vec![0, 0, 0, 255, 255, 255, 255, 255]).unwrap()
}

#[test]
fn texel_centers_are_exact_under_bilinear() {
    let img = gradient_2x1();
    let s = Sampler::new(&img);
    assert_eq!(s.sample(Vec2::new(0.25, 0.5)), Vec4::new(0.0, 0.0, 0.0, 1.0));
    assert_eq!(s.sample(Vec2::new(0.75, 0.5)), Vec4::ONE);
}

#[test]
fn bilinear_interpolates_between_centers() {
    let img = gradient_2x1();
    let v = Sampler::new(&img).sample(Vec2::new(0.5, 0.5));
    assert!((v.x - 0.5).abs() < 1e-6);
}

#[test]
fn nearest_snaps_to_texel() {
    let img = gradient_2x1().with_filter(FilterMode::Nearest);
    let v = Sampler::new(&img).sample(Vec2::new(0.49, 0.5));
    assert_eq!(v.x, 0.0);
}

#[test]
fn sampling_clamps_outside_the_image() {
    let img = gradient_2x1();
    let s = Sampler::new(&img);
    assert_eq!(s.sample(Vec2::new(-3.0, 0.5)).x, 0.0);
    assert_eq!(s.sample(Vec2::new(4.0, 9.0)).x, 1.0);
    assert_eq!(s.texel_size(), Vec2::new(0.5, 1.0));
}
