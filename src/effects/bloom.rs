use std::sync::Arc;

use crate::effects::blur_kernel::blur_1d;
use crate::effects::{Effect, FrameInputs, ProgramSlot, check_frame};
use crate::foundation::core::{Image, Vec2};
use crate::foundation::error::{ScreenFxError, ScreenFxResult};
use crate::foundation::math::{luminance, saturate};
use crate::program::{BoundPass, FilterProgram, Fragment, PassInfo, PassParams, PassRole, Sampler};
use crate::render::backend::Renderer;
use crate::sequence::iterative::{
    self, BlurSchedule, CompositeStep, ExtractStep, IterativePlan, SequenceReport,
};

/// Texture parameter the composite pass reads the blurred bright areas from.
pub const BLOOM_TEXTURE: &str = "bloom";

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BloomConfig {
    /// Blur iterations, `0..=4`.
    pub iterations: u32,
    /// Radius growth per iteration, `0.2..=3.0`.
    pub blur_spread: f32,
    /// Working resolution divisor, `1..=8`.
    pub downsample: u32,
    /// Luminance above which a pixel contributes, `0.0..=4.0`.
    pub luminance_threshold: f32,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            iterations: 3,
            blur_spread: 0.6,
            downsample: 2,
            luminance_threshold: 0.6,
        }
    }
}

impl BloomConfig {
    pub fn clamped(self) -> Self {
        Self {
            iterations: self.iterations.min(4),
            blur_spread: clamp_finite(self.blur_spread, 0.2, 3.0),
            downsample: self.downsample.clamp(1, 8),
            luminance_threshold: clamp_finite(self.luminance_threshold, 0.0, 4.0),
        }
    }
}

/// Clamp into `lo..=hi`; NaN becomes `lo`.
pub(crate) fn clamp_finite(v: f32, lo: f32, hi: f32) -> f32 {
    if v.is_nan() { lo } else { v.clamp(lo, hi) }
}

/// Bright-pass, separable blur, additive composite.
pub struct Bloom {
    pub config: BloomConfig,
    program: ProgramSlot,
}

impl Bloom {
    pub fn new(config: BloomConfig) -> Self {
        Self {
            config,
            program: Some(Arc::new(BloomProgram)),
        }
    }

    /// Replace the program; `None` turns the effect into a copy.
    pub fn set_program(&mut self, program: ProgramSlot) {
        self.program = program;
    }
}

impl Default for Bloom {
    fn default() -> Self {
        Self::new(BloomConfig::default())
    }
}

impl Effect for Bloom {
    fn name(&self) -> &'static str {
        "bloom"
    }

    fn program(&self) -> Option<&dyn FilterProgram> {
        self.program.as_deref()
    }

    fn render(
        &mut self,
        renderer: &mut dyn Renderer,
        _frame: &FrameInputs<'_>,
        source: &Image,
        destination: &mut Image,
    ) -> ScreenFxResult<SequenceReport> {
        check_frame(source, destination)?;
        let cfg = self.config.clamped();

        let mut extract = PassParams::new();
        extract.set_float("luminance_threshold", cfg.luminance_threshold);
        let plan = IterativePlan {
            iterations: cfg.iterations,
            downscale: cfg.downsample,
            extract: ExtractStep::Pass(extract),
            composite: CompositeStep::Pass {
                params: PassParams::new(),
                blurred: BLOOM_TEXTURE,
            },
        };
        let schedule = BlurSchedule::new(1.0, cfg.blur_spread);

        iterative::run(renderer, source, destination, self.program(), &plan, |i| {
            PassParams::new().with_float("blur_size", schedule.radius(i))
        })
    }
}

/// CPU program for [`Bloom`]: extract, vertical, horizontal, composite.
#[derive(Clone, Copy, Debug, Default)]
pub struct BloomProgram;

const BLOOM_PASSES: &[PassInfo] = &[
    PassInfo {
        name: "extract_bright",
        role: PassRole::Extract,
    },
    PassInfo {
        name: "blur_vertical",
        role: PassRole::Vertical,
    },
    PassInfo {
        name: "blur_horizontal",
        role: PassRole::Horizontal,
    },
    PassInfo {
        name: "bloom_composite",
        role: PassRole::Composite,
    },
];

impl FilterProgram for BloomProgram {
    fn name(&self) -> &str {
        "bloom"
    }

    fn passes(&self) -> &[PassInfo] {
        BLOOM_PASSES
    }

    fn bind<'a>(&'a self, pass: usize, params: &PassParams<'a>) -> ScreenFxResult<BoundPass<'a>> {
        match pass {
            0 => {
                let threshold = params.float("luminance_threshold")?;
                Ok(Box::new(move |frag: &Fragment<'_>| {
                    let c = frag.main_tex.sample(frag.uv);
                    c * saturate(luminance(c.truncate()) - threshold)
                }))
            }
            1 | 2 => {
                let blur_size = params.float("blur_size")?;
                let axis = if pass == 1 { Vec2::Y } else { Vec2::X };
                Ok(Box::new(move |frag: &Fragment<'_>| {
                    blur_1d(&frag.main_tex, frag.uv, axis, blur_size)
                }))
            }
            3 => {
                let bloom = Sampler::new(params.texture(BLOOM_TEXTURE)?);
                Ok(Box::new(move |frag: &Fragment<'_>| {
                    frag.main_tex.sample(frag.uv) + bloom.sample(frag.uv)
                }))
            }
            _ => Err(ScreenFxError::render(format!("bloom has no pass {pass}"))),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/bloom.rs"]
mod tests;
