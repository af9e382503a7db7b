use super::*;
use crate::effects::Camera;
use crate::foundation::core::FilterMode;
use crate::render::cpu::CpuRenderer;

fn depth_normals(w: u32, h: u32, f: impl Fn(u32, u32) -> (Vec3, f32)) -> Image {
    let mut data = Vec::with_capacity((w * h * 4) as usize);
    for y in 0..h {
        for x in 0..w {
            let (n, d) = f(x, y);
            data.extend_from_slice(&encode_depth_normal(n, d));
        }
    }
    Image::from_rgba8(w, h, data)
        .unwrap()
        .with_filter(FilterMode::Nearest)
}

fn texel(bytes: [u8; 4]) -> Vec4 {
    Vec4::new(
        f32::from(bytes[0]),
        f32::from(bytes[1]),
        f32::from(bytes[2]),
        f32::from(bytes[3]),
    ) / 255.0
}

#[test]
fn depth_survives_encoding() {
    for d in [0.05f32, 0.25, 0.5, 0.8, 0.99] {
        let t = texel(encode_depth_normal(Vec3::Z, d));
        let back = decode_float_rg(Vec2::new(t.z, t.w));
        assert!((back - d).abs() < 1e-3, "{d} -> {back}");
    }
}

#[test]
fn facing_normal_encodes_to_center() {
    let [r, g, _, _] = encode_depth_normal(Vec3::Z, 0.5);
    assert_eq!((r, g), (128, 128));
}

#[test]
fn check_same_compares_normals_and_depth() {
    let a = texel(encode_depth_normal(Vec3::Z, 0.5));
    let far = texel(encode_depth_normal(Vec3::Z, 0.9));
    let tilted = texel(encode_depth_normal(Vec3::new(1.0, 0.0, 1.0), 0.5));
    let s = Vec2::ONE;
    assert!(check_same(a, a, s));
    assert!(!check_same(a, far, s));
    assert!(!check_same(a, tilted, s));
    // Zero sensitivity ignores the difference.
    assert!(check_same(a, tilted, Vec2::new(0.0, 1.0)));
}

fn run(cfg: EdgeDetectNormalsAndDepthConfig, src: &Image, dn: &Image) -> Image {
    let mut dst = Image::new(src.desc()).unwrap();
    let mut r = CpuRenderer::default();
    let frame = FrameInputs::new(Camera::default()).with_depth_normals(dn);
    EdgeDetectNormalsAndDepth::new(cfg)
        .render(&mut r, &frame, src, &mut dst)
        .unwrap();
    dst
}

#[test]
fn single_surface_has_no_edges() {
    let src = Image::solid(8, 8, [10, 20, 30, 255]).unwrap();
    let dn = depth_normals(8, 8, |_, _| (Vec3::Z, 0.5));
    let dst = run(EdgeDetectNormalsAndDepthConfig::default(), &src, &dn);
    assert_eq!(dst.data(), src.data());
}

#[test]
fn depth_step_draws_an_outline() {
    let src = Image::solid(8, 4, [10, 20, 30, 255]).unwrap();
    let dn = depth_normals(8, 4, |x, _| (Vec3::Z, if x < 4 { 0.2 } else { 0.8 }));
    let dst = run(
        EdgeDetectNormalsAndDepthConfig {
            edges_only: 1.0,
            ..Default::default()
        },
        &src,
        &dn,
    );
    for y in 0..4 {
        assert_eq!(dst.pixel_rgba8(0, y), [255, 255, 255, 255]);
        assert_eq!(dst.pixel_rgba8(3, y), [0, 0, 0, 255]);
        assert_eq!(dst.pixel_rgba8(7, y), [255, 255, 255, 255]);
    }
}

#[test]
fn missing_or_mismatched_texture_is_rejected() {
    let src = Image::solid(4, 4, [0, 0, 0, 255]).unwrap();
    let mut dst = Image::new(src.desc()).unwrap();
    let mut r = CpuRenderer::default();
    let mut effect = EdgeDetectNormalsAndDepth::default();

    let err = effect
        .render(&mut r, &FrameInputs::default(), &src, &mut dst)
        .unwrap_err();
    assert!(matches!(err, ScreenFxError::Validation(_)));

    let small = depth_normals(2, 2, |_, _| (Vec3::Z, 0.5));
    let frame = FrameInputs::default().with_depth_normals(&small);
    assert!(effect.render(&mut r, &frame, &src, &mut dst).is_err());
    assert_eq!(effect.depth_mode(), DepthTextureMode::DEPTH_NORMALS);
}

#[test]
fn missing_program_copies_without_depth_normals() {
    let src = Image::solid(6, 6, [200, 10, 60, 255]).unwrap();
    let mut dst = Image::new(src.desc()).unwrap();
    let mut r = CpuRenderer::default();
    let mut effect = EdgeDetectNormalsAndDepth::default();
    effect.set_program(None);
    assert_eq!(effect.required_textures(&r), DepthTextureMode::NONE);

    let report = effect
        .render(&mut r, &FrameInputs::new(Camera::default()), &src, &mut dst)
        .unwrap();
    assert!(report.fallback);
    assert_eq!(dst.data(), src.data());
    assert_eq!(r.pool_stats().acquisitions, 0);
}

#[test]
fn bound_program_still_needs_depth_normals() {
    let src = Image::solid(6, 6, [200, 10, 60, 255]).unwrap();
    let mut dst = Image::new(src.desc()).unwrap();
    let mut r = CpuRenderer::default();
    let mut effect = EdgeDetectNormalsAndDepth::default();
    assert_eq!(effect.required_textures(&r), DepthTextureMode::DEPTH_NORMALS);
    let err = effect
        .render(&mut r, &FrameInputs::new(Camera::default()), &src, &mut dst)
        .unwrap_err();
    assert!(matches!(err, ScreenFxError::Validation(_)));
}
