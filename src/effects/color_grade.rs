use std::sync::Arc;

use crate::effects::bloom::clamp_finite;
use crate::effects::{Effect, FrameInputs, ProgramSlot, check_frame};
use crate::foundation::core::{Image, Vec3};
use crate::foundation::error::{ScreenFxError, ScreenFxResult};
use crate::foundation::math::luminance;
use crate::program::{BoundPass, FilterProgram, Fragment, PassInfo, PassParams, PassRole};
use crate::render::backend::Renderer;
use crate::sequence::iterative::SequenceReport;
use crate::sequence::single_pass::run_single_pass;

/// All three factors are `0.0..=3.0`; `1.0` leaves the image unchanged.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrightnessSaturationContrastConfig {
    pub brightness: f32,
    pub saturation: f32,
    pub contrast: f32,
}

impl Default for BrightnessSaturationContrastConfig {
    fn default() -> Self {
        Self {
            brightness: 1.0,
            saturation: 1.0,
            contrast: 1.0,
        }
    }
}

impl BrightnessSaturationContrastConfig {
    pub fn clamped(self) -> Self {
        Self {
            brightness: clamp_finite(self.brightness, 0.0, 3.0),
            saturation: clamp_finite(self.saturation, 0.0, 3.0),
            contrast: clamp_finite(self.contrast, 0.0, 3.0),
        }
    }
}

pub struct BrightnessSaturationContrast {
    pub config: BrightnessSaturationContrastConfig,
    program: ProgramSlot,
}

impl BrightnessSaturationContrast {
    pub fn new(config: BrightnessSaturationContrastConfig) -> Self {
        Self {
            config,
            program: Some(Arc::new(ColorGradeProgram)),
        }
    }

    pub fn set_program(&mut self, program: ProgramSlot) {
        self.program = program;
    }
}

impl Default for BrightnessSaturationContrast {
    fn default() -> Self {
        Self::new(BrightnessSaturationContrastConfig::default())
    }
}

impl Effect for BrightnessSaturationContrast {
    fn name(&self) -> &'static str {
        "brightness_saturation_contrast"
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
        let mut params = PassParams::new();
        params
            .set_float("brightness", cfg.brightness)
            .set_float("saturation", cfg.saturation)
            .set_float("contrast", cfg.contrast);
        run_single_pass(renderer, source, destination, self.program.as_deref(), &params)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ColorGradeProgram;

const GRADE_PASSES: &[PassInfo] = &[PassInfo {
    name: "grade",
    role: PassRole::Main,
}];

/// Scale by brightness, then pull toward gray luminance by saturation, then toward mid
/// gray by contrast.
pub(crate) fn grade(rgb: Vec3, brightness: f32, saturation: f32, contrast: f32) -> Vec3 {
    let scaled = rgb * brightness;
    let gray = Vec3::splat(luminance(rgb));
    let saturated = gray.lerp(scaled, saturation);
    Vec3::splat(0.5).lerp(saturated, contrast)
}

impl FilterProgram for ColorGradeProgram {
    fn name(&self) -> &str {
        "brightness_saturation_contrast"
    }

    fn passes(&self) -> &[PassInfo] {
        GRADE_PASSES
    }

    fn bind<'a>(&'a self, pass: usize, params: &PassParams<'a>) -> ScreenFxResult<BoundPass<'a>> {
        if pass != 0 {
            return Err(ScreenFxError::render(format!("grade has no pass {pass}")));
        }
        let brightness = params.float("brightness")?;
        let saturation = params.float("saturation")?;
        let contrast = params.float("contrast")?;
        Ok(Box::new(move |frag: &Fragment<'_>| {
            let c = frag.main_tex.sample(frag.uv);
            grade(c.truncate(), brightness, saturation, contrast).extend(c.w)
        }))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/color_grade.rs"]
mod tests;
