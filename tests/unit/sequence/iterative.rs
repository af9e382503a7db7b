use super::*;
use crate::foundation::core::Vec4;
use crate::program::{BoundPass, Fragment, PassInfo, PassThroughProgram};
use crate::render::cpu::{CpuRenderer, CpuRendererOpts};
use crate::render::scratch_pool::ScratchPoolOpts;

/// Wraps the CPU renderer and records every boundary call in order.
struct Recording {
    inner: CpuRenderer,
    calls: Vec<String>,
}

impl Recording {
    fn new() -> Self {
        Self::with(CpuRenderer::default())
    }

    fn with(inner: CpuRenderer) -> Self {
        Self {
            inner,
            calls: Vec::new(),
        }
    }

    fn count(&self, prefix: &str) -> usize {
        self.calls.iter().filter(|c| c.starts_with(prefix)).count()
    }
}

impl Renderer for Recording {
    fn acquire_scratch(&mut self, desc: ImageDesc, filter: FilterMode) -> ScreenFxResult<Image> {
        let img = self.inner.acquire_scratch(desc, filter)?;
        self.calls.push(format!("acquire {}x{}", desc.width, desc.height));
        Ok(img)
    }

    fn release_scratch(&mut self, image: Image) {
        self.calls.push("release".to_string());
        self.inner.release_scratch(image);
    }

    fn run_pass(
        &mut self,
        program: &dyn FilterProgram,
        pass: usize,
        input: &Image,
        output: &mut Image,
        params: &PassParams<'_>,
    ) -> ScreenFxResult<()> {
        self.calls.push(format!("pass {}", program.passes()[pass].name));
        self.inner.run_pass(program, pass, input, output, params)
    }

    fn copy(&mut self, input: &Image, output: &mut Image) -> ScreenFxResult<()> {
        self.calls.push("copy".to_string());
        self.inner.copy(input, output)
    }
}

fn bloom_like_plan<'p>(iterations: u32, downscale: u32) -> IterativePlan<'p> {
    IterativePlan {
        iterations,
        downscale,
        extract: ExtractStep::Pass(PassParams::new()),
        composite: CompositeStep::Pass {
            params: PassParams::new(),
            blurred: "bloom",
        },
    }
}

fn blur_like_plan<'p>(iterations: u32, downscale: u32) -> IterativePlan<'p> {
    IterativePlan {
        iterations,
        downscale,
        extract: ExtractStep::Copy,
        composite: CompositeStep::Blit,
    }
}

#[test]
fn acquisitions_match_releases_for_every_iteration_count() {
    for k in 0..=4u32 {
        let src = Image::solid(32, 16, [10, 200, 30, 255]).unwrap();
        let mut dst = Image::new(src.desc()).unwrap();
        let mut r = Recording::new();
        let report = run(
            &mut r,
            &src,
            &mut dst,
            Some(&PassThroughProgram),
            &bloom_like_plan(k, 2),
            |_| PassParams::new(),
        )
        .unwrap();

        let expected = (2 * k + 1) as usize;
        assert_eq!(r.count("acquire"), expected, "k={k}");
        assert_eq!(r.count("release"), expected, "k={k}");
        assert_eq!(report.acquisitions as usize, expected);
        assert_eq!(report.releases, report.acquisitions);

        let st = r.inner.pool_stats();
        assert_eq!(st.live_images, 0);
        assert!(st.peak_live_images <= 2);
    }
}

#[test]
fn passes_run_in_extract_vertical_horizontal_composite_order() {
    let src = Image::solid(8, 8, [1, 2, 3, 255]).unwrap();
    let mut dst = Image::new(src.desc()).unwrap();
    let mut r = Recording::new();
    run(
        &mut r,
        &src,
        &mut dst,
        Some(&PassThroughProgram),
        &bloom_like_plan(2, 1),
        |_| PassParams::new(),
    )
    .unwrap();

    let expected = [
        "acquire 8x8",
        "pass extract",
        "acquire 8x8",
        "pass vertical",
        "release",
        "acquire 8x8",
        "pass horizontal",
        "release",
        "acquire 8x8",
        "pass vertical",
        "release",
        "acquire 8x8",
        "pass horizontal",
        "release",
        "pass composite",
        "release",
    ];
    assert_eq!(r.calls, expected);
}

#[test]
fn zero_iterations_is_extract_then_composite() {
    let src = Image::solid(8, 8, [1, 2, 3, 255]).unwrap();
    let mut dst = Image::new(src.desc()).unwrap();
    let mut r = Recording::new();
    run(
        &mut r,
        &src,
        &mut dst,
        Some(&PassThroughProgram),
        &bloom_like_plan(0, 1),
        |_| PassParams::new(),
    )
    .unwrap();
    assert_eq!(
        r.calls,
        ["acquire 8x8", "pass extract", "pass composite", "release"]
    );

    let mut r = Recording::new();
    run(
        &mut r,
        &src,
        &mut dst,
        Some(&PassThroughProgram),
        &blur_like_plan(0, 1),
        |_| PassParams::new(),
    )
    .unwrap();
    assert_eq!(r.calls, ["acquire 8x8", "copy", "copy", "release"]);
    assert_eq!(dst.data(), src.data());
}

#[test]
fn missing_program_copies_source_bit_exactly() {
    for (w, h, k, d) in [(1u32, 1u32, 4u32, 8u32), (13, 7, 2, 3), (64, 32, 0, 1)] {
        let mut data = Vec::new();
        for i in 0..(w * h) {
            data.extend_from_slice(&[(i % 251) as u8, (i * 7 % 256) as u8, 3, (i % 200) as u8]);
        }
        let src = Image::from_rgba8(w, h, data).unwrap();
        let mut dst = Image::new(src.desc()).unwrap();
        let mut r = Recording::new();
        let report = run(&mut r, &src, &mut dst, None, &bloom_like_plan(k, d), |_| {
            PassParams::new()
        })
        .unwrap();

        assert!(report.fallback);
        assert_eq!(dst.data(), src.data());
        assert_eq!(r.calls, ["copy"]);
        assert_eq!(r.inner.pool_stats().acquisitions, 0);
    }
}

struct Unsupported;

impl FilterProgram for Unsupported {
    fn name(&self) -> &str {
        "unsupported"
    }

    fn passes(&self) -> &[PassInfo] {
        PassThroughProgram.passes()
    }

    fn is_supported(&self) -> bool {
        false
    }

    fn bind<'a>(&'a self, _pass: usize, _params: &PassParams<'a>) -> ScreenFxResult<BoundPass<'a>> {
        Err(ScreenFxError::render("should never be bound"))
    }
}

#[test]
fn unsupported_program_takes_the_fallback() {
    let src = Image::solid(4, 4, [9, 9, 9, 9]).unwrap();
    let mut dst = Image::new(src.desc()).unwrap();
    let mut r = Recording::new();
    let report = run(&mut r, &src, &mut dst, Some(&Unsupported), &bloom_like_plan(3, 2), |_| {
        PassParams::new()
    })
    .unwrap();
    assert!(report.fallback);
    assert_eq!(dst.data(), src.data());
}

#[test]
fn solid_red_survives_identity_passes() {
    let src = Image::solid(256, 256, [255, 0, 0, 255]).unwrap();
    let mut dst = Image::new(src.desc()).unwrap();
    let mut r = CpuRenderer::default();
    let report = run(
        &mut r,
        &src,
        &mut dst,
        Some(&PassThroughProgram),
        &bloom_like_plan(2, 1),
        |_| PassParams::new(),
    )
    .unwrap();
    assert_eq!((report.working_width, report.working_height), (256, 256));
    assert!(dst.data().chunks_exact(4).all(|px| px == [255, 0, 0, 255]));
}

#[test]
fn working_size_is_floor_division() {
    for d in 1..=8u32 {
        for dim in [d, 7, 64, 255, 1000] {
            if dim < d {
                continue;
            }
            let (w, h) = working_size(dim, dim + 1, d);
            assert_eq!(w, dim / d);
            assert_eq!(h, (dim + 1) / d);
            assert!(w > 0 && h > 0);
        }
    }
    assert_eq!(working_size(3, 3, 8), (1, 1));
    assert_eq!(working_size(10, 10, 0), (10, 10));
}

#[test]
fn blur_radius_is_monotonic_for_non_negative_spread() {
    for spread in [0.0f32, 0.2, 0.6, 3.0] {
        let s = BlurSchedule::new(1.0, spread);
        for i in 0..4 {
            assert!(s.radius(i) <= s.radius(i + 1));
        }
    }
    assert_eq!(BlurSchedule::new(1.0, 0.6).radius(0), 1.0);
}

#[test]
fn per_iteration_params_reach_both_blur_passes() {
    let src = Image::solid(4, 4, [0, 0, 0, 255]).unwrap();
    let mut dst = Image::new(src.desc()).unwrap();
    let mut seen = Vec::new();
    run(
        &mut CpuRenderer::default(),
        &src,
        &mut dst,
        Some(&PassThroughProgram),
        &blur_like_plan(3, 1),
        |i| {
            seen.push(i);
            PassParams::new().with_float("blur_size", BlurSchedule::new(1.0, 0.5).radius(i))
        },
    )
    .unwrap();
    assert_eq!(seen, [0, 1, 2]);
}

#[test]
fn exhausted_pool_fails_and_leaks_nothing() {
    let src = Image::solid(16, 16, [5, 5, 5, 255]).unwrap();
    let mut dst = Image::new(src.desc()).unwrap();
    // Room for exactly one 8x8 scratch: the first iteration's second buffer fails.
    let budget = ImageDesc::rgba8(8, 8).byte_len();
    let mut r = Recording::with(CpuRenderer::new(CpuRendererOpts {
        pool: ScratchPoolOpts {
            max_live_bytes: budget,
            ..ScratchPoolOpts::default()
        },
        ..CpuRendererOpts::default()
    }));

    let err = run(
        &mut r,
        &src,
        &mut dst,
        Some(&PassThroughProgram),
        &bloom_like_plan(2, 2),
        |_| PassParams::new(),
    )
    .unwrap_err();

    assert!(matches!(err, ScreenFxError::ResourceExhausted(_)));
    assert_eq!(r.count("acquire"), 1);
    assert_eq!(r.count("release"), 1);
    assert_eq!(r.inner.pool_stats().live_images, 0);
}

/// Fails the horizontal pass on the second iteration.
struct FailsLate;

const FAILS_LATE_PASSES: &[PassInfo] = &[
    PassInfo {
        name: "vertical",
        role: PassRole::Vertical,
    },
    PassInfo {
        name: "horizontal",
        role: PassRole::Horizontal,
    },
];

impl FilterProgram for FailsLate {
    fn name(&self) -> &str {
        "fails_late"
    }

    fn passes(&self) -> &[PassInfo] {
        FAILS_LATE_PASSES
    }

    fn bind<'a>(&'a self, pass: usize, params: &PassParams<'a>) -> ScreenFxResult<BoundPass<'a>> {
        if pass == 1 && params.float("iteration")? >= 1.0 {
            return Err(ScreenFxError::render("horizontal pass exploded"));
        }
        Ok(Box::new(|f: &Fragment<'_>| f.main_tex.sample(f.uv)))
    }
}

#[test]
fn failing_pass_releases_every_scratch() {
    let src = Image::solid(8, 8, [5, 5, 5, 255]).unwrap();
    let mut dst = Image::new(src.desc()).unwrap();
    let mut r = Recording::new();
    let err = run(
        &mut r,
        &src,
        &mut dst,
        Some(&FailsLate),
        &blur_like_plan(3, 1),
        |i| PassParams::new().with_float("iteration", i as f32),
    )
    .unwrap_err();

    assert!(err.to_string().contains("exploded"));
    assert_eq!(r.count("acquire"), r.count("release"));
    assert_eq!(r.inner.pool_stats().live_images, 0);
}

#[test]
fn missing_role_is_reported_before_any_acquisition() {
    let src = Image::solid(8, 8, [5, 5, 5, 255]).unwrap();
    let mut dst = Image::new(src.desc()).unwrap();
    let mut r = Recording::new();
    let err = run(
        &mut r,
        &src,
        &mut dst,
        Some(&FailsLate),
        &bloom_like_plan(1, 1),
        |_| PassParams::new(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("Extract"));
    assert!(r.calls.is_empty());
}

#[test]
fn downscaled_blur_upsamples_back_to_destination() {
    let src = Image::solid(40, 20, [0, 128, 255, 255]).unwrap();
    let mut dst = Image::new(src.desc()).unwrap();
    let report = run(
        &mut CpuRenderer::default(),
        &src,
        &mut dst,
        Some(&PassThroughProgram),
        &blur_like_plan(1, 4),
        |_| PassParams::new(),
    )
    .unwrap();
    assert_eq!((report.working_width, report.working_height), (10, 5));
    let expected = Vec4::new(0.0, 128.0, 255.0, 255.0);
    let px = dst.pixel_rgba8(17, 9);
    assert_eq!(
        Vec4::new(px[0] as f32, px[1] as f32, px[2] as f32, px[3] as f32),
        expected
    );
}
