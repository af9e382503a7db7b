use super::*;
use crate::foundation::core::PixelFormat;
use crate::program::PassThroughProgram;

fn checker(w: u32, h: u32) -> Image {
    let mut data = Vec::with_capacity((w * h * 4) as usize);
    for y in 0..h {
        for x in 0..w {
            let v = if (x + y) % 2 == 0 { 255 } else { 0 };
            data.extend_from_slice(&[v, 0, 255 - v, 255]);
        }
    }
    Image::from_rgba8(w, h, data).unwrap()
}

#[test]
fn same_size_copy_is_bit_exact() {
    let src = checker(7, 5);
    let mut dst = Image::new(src.desc()).unwrap();
    let mut r = CpuRenderer::default();
    r.copy(&src, &mut dst).unwrap();
    assert_eq!(dst.data(), src.data());
    assert_eq!(r.copies(), 1);
}

#[test]
fn half_size_copy_averages_pairs() {
    let src = checker(4, 4);
    let mut dst = Image::new(ImageDesc::rgba8(2, 2)).unwrap();
    CpuRenderer::default().copy(&src, &mut dst).unwrap();
    // Each 2x2 block of a checkerboard averages to mid grey.
    for y in 0..2 {
        for x in 0..2 {
            let px = dst.pixel_rgba8(x, y);
            assert_eq!(px[0], 128);
            assert_eq!(px[3], 255);
        }
    }
}

#[test]
fn pass_through_program_preserves_pixels() {
    let src = checker(6, 3);
    let mut dst = Image::new(src.desc()).unwrap();
    let mut r = CpuRenderer::default();
    r.run_pass(&PassThroughProgram, 1, &src, &mut dst, &PassParams::new())
        .unwrap();
    assert_eq!(dst.data(), src.data());
    assert_eq!(r.passes_run(), 1);
}

#[test]
fn unknown_pass_index_is_a_render_error() {
    let src = checker(2, 2);
    let mut dst = Image::new(src.desc()).unwrap();
    let err = CpuRenderer::default()
        .run_pass(&PassThroughProgram, 99, &src, &mut dst, &PassParams::new())
        .unwrap_err();
    assert!(matches!(err, ScreenFxError::Render(_)));
}

#[test]
fn parallel_rows_match_serial_rows() {
    let src = checker(33, 17);
    let target = ImageDesc::rgba8(13, 9);

    let mut serial = Image::new(target).unwrap();
    CpuRenderer::default().copy(&src, &mut serial).unwrap();

    let mut parallel = Image::new(target).unwrap();
    CpuRenderer::new(CpuRendererOpts {
        parallel_rows: true,
        ..CpuRendererOpts::default()
    })
    .copy(&src, &mut parallel)
    .unwrap();

    assert_eq!(serial.data(), parallel.data());
}

#[test]
fn scratch_goes_through_the_pool() {
    let mut r = CpuRenderer::default();
    let img = r
        .acquire_scratch(
            ImageDesc {
                width: 3,
                height: 3,
                format: PixelFormat::R32Float,
            },
            FilterMode::Nearest,
        )
        .unwrap();
    assert_eq!(r.pool_stats().live_images, 1);
    r.release_scratch(img);
    let st = r.pool_stats();
    assert_eq!((st.acquisitions, st.releases, st.live_images), (1, 1, 0));

    r.reset_counters();
    assert_eq!(r.pool_stats().acquisitions, 0);
}
