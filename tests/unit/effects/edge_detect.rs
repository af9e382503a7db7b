use super::*;
use crate::effects::Camera;
use crate::render::cpu::CpuRenderer;

fn split_image(w: u32, h: u32) -> Image {
    let mut data = Vec::with_capacity((w * h * 4) as usize);
    for _ in 0..h {
        for x in 0..w {
            let v = if x < w / 2 { 0 } else { 255 };
            data.extend_from_slice(&[v, v, v, 255]);
        }
    }
    Image::from_rgba8(w, h, data).unwrap()
}

fn detect(cfg: EdgeDetectionConfig, src: &Image) -> Image {
    let mut dst = Image::new(src.desc()).unwrap();
    let mut r = CpuRenderer::default();
    EdgeDetection::new(cfg)
        .render(&mut r, &FrameInputs::new(Camera::default()), src, &mut dst)
        .unwrap();
    dst
}

#[test]
fn flat_image_has_no_edges() {
    let src = Image::solid(10, 10, [30, 160, 90, 255]).unwrap();
    let dst = detect(EdgeDetectionConfig::default(), &src);
    assert_eq!(dst.data(), src.data());

    let only = detect(
        EdgeDetectionConfig {
            edges_only: 1.0,
            ..Default::default()
        },
        &src,
    );
    assert!(only.data().iter().all(|&b| b == 255));
}

#[test]
fn step_produces_an_edge_column() {
    let src = split_image(8, 6);
    let dst = detect(
        EdgeDetectionConfig {
            edges_only: 1.0,
            ..Default::default()
        },
        &src,
    );
    for y in 0..6 {
        assert_eq!(dst.pixel_rgba8(0, y), [255, 255, 255, 255]);
        assert_eq!(dst.pixel_rgba8(3, y), [0, 0, 0, 255]);
        assert_eq!(dst.pixel_rgba8(4, y), [0, 0, 0, 255]);
        assert_eq!(dst.pixel_rgba8(7, y), [255, 255, 255, 255]);
    }
}

#[test]
fn edge_color_is_used() {
    let src = split_image(8, 2);
    let dst = detect(
        EdgeDetectionConfig {
            edges_only: 0.0,
            edge_color: Color::rgb(1.0, 0.0, 0.0),
            background_color: Color::WHITE,
        },
        &src,
    );
    assert_eq!(dst.pixel_rgba8(3, 0), [255, 0, 0, 255]);
    // Away from the step the scene shows through.
    assert_eq!(dst.pixel_rgba8(0, 0), [0, 0, 0, 255]);
}

#[test]
fn sobel_is_one_on_flat_input() {
    let img = Image::solid(3, 3, [128, 128, 128, 255]).unwrap();
    let frag = Fragment {
        uv: Vec2::splat(0.5),
        main_tex: crate::program::Sampler::new(&img),
    };
    assert!((sobel(&frag) - 1.0).abs() < 1e-5);
}

#[test]
fn missing_program_copies_without_scratch() {
    let src = split_image(10, 6);
    let mut dst = Image::new(src.desc()).unwrap();
    let mut r = CpuRenderer::default();
    let mut effect = EdgeDetection::new(EdgeDetectionConfig {
        edges_only: 1.0,
        ..Default::default()
    });
    effect.set_program(None);
    let report = effect
        .render(&mut r, &FrameInputs::new(Camera::default()), &src, &mut dst)
        .unwrap();
    assert!(report.fallback);
    assert_eq!(dst.data(), src.data());
    assert_eq!(r.pool_stats().acquisitions, 0);
}
