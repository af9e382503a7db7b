use std::sync::Arc;

use crate::effects::blur_kernel::blur_1d;
use crate::effects::bloom::clamp_finite;
use crate::effects::{Effect, FrameInputs, ProgramSlot, check_frame};
use crate::foundation::core::{Image, Vec2};
use crate::foundation::error::{ScreenFxError, ScreenFxResult};
use crate::program::{BoundPass, FilterProgram, Fragment, PassInfo, PassParams, PassRole};
use crate::render::backend::Renderer;
use crate::sequence::iterative::{
    self, BlurSchedule, CompositeStep, ExtractStep, IterativePlan, SequenceReport,
};

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GaussianBlurConfig {
    /// `0..=4`
    pub iterations: u32,
    /// `0.2..=3.0`
    pub blur_spread: f32,
    /// `1..=8`
    pub downsample: u32,
}

impl Default for GaussianBlurConfig {
    fn default() -> Self {
        Self {
            iterations: 3,
            blur_spread: 0.6,
            downsample: 2,
        }
    }
}

impl GaussianBlurConfig {
    pub fn clamped(self) -> Self {
        Self {
            iterations: self.iterations.min(4),
            blur_spread: clamp_finite(self.blur_spread, 0.2, 3.0),
            downsample: self.downsample.clamp(1, 8),
        }
    }
}

/// Downsample, blur with a growing radius, blit back.
pub struct GaussianBlur {
    pub config: GaussianBlurConfig,
    program: ProgramSlot,
}

impl GaussianBlur {
    pub fn new(config: GaussianBlurConfig) -> Self {
        Self {
            config,
            program: Some(Arc::new(GaussianBlurProgram)),
        }
    }

    pub fn set_program(&mut self, program: ProgramSlot) {
        self.program = program;
    }
}

impl Default for GaussianBlur {
    fn default() -> Self {
        Self::new(GaussianBlurConfig::default())
    }
}

impl Effect for GaussianBlur {
    fn name(&self) -> &'static str {
        "gaussian_blur"
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
        let plan = IterativePlan {
            iterations: cfg.iterations,
            downscale: cfg.downsample,
            extract: ExtractStep::Copy,
            composite: CompositeStep::Blit,
        };
        let schedule = BlurSchedule::new(1.0, cfg.blur_spread);

        iterative::run(renderer, source, destination, self.program(), &plan, |i| {
            PassParams::new().with_float("blur_size", schedule.radius(i))
        })
    }
}

/// Two-pass separable 5-tap Gaussian.
#[derive(Clone, Copy, Debug, Default)]
pub struct GaussianBlurProgram;

const BLUR_PASSES: &[PassInfo] = &[
    PassInfo {
        name: "blur_vertical",
        role: PassRole::Vertical,
    },
    PassInfo {
        name: "blur_horizontal",
        role: PassRole::Horizontal,
    },
];

impl FilterProgram for GaussianBlurProgram {
    fn name(&self) -> &str {
        "gaussian_blur"
    }

    fn passes(&self) -> &[PassInfo] {
        BLUR_PASSES
    }

    fn bind<'a>(&'a self, pass: usize, params: &PassParams<'a>) -> ScreenFxResult<BoundPass<'a>> {
        let axis = match pass {
            0 => Vec2::Y,
            1 => Vec2::X,
            _ => return Err(ScreenFxError::render(format!("gaussian_blur has no pass {pass}"))),
        };
        let blur_size = params.float("blur_size")?;
        Ok(Box::new(move |frag: &Fragment<'_>| {
            blur_1d(&frag.main_tex, frag.uv, axis, blur_size)
        }))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/gaussian_blur.rs"]
mod tests;
