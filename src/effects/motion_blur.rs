use std::sync::Arc;

use crate::effects::bloom::clamp_finite;
use crate::effects::camera::Camera;
use crate::effects::fog::DEPTH_TEXTURE;
use crate::effects::{
    DepthTextureMode, Effect, FrameInputs, ProgramSlot, check_aux_texture, check_frame,
    usable_program,
};
use crate::foundation::core::{Image, Mat4, Vec2, Vec4};
use crate::foundation::error::{ScreenFxError, ScreenFxResult};
use crate::program::{BoundPass, FilterProgram, Fragment, PassInfo, PassParams, PassRole, Sampler};
use crate::render::backend::Renderer;
use crate::sequence::iterative::SequenceReport;
use crate::sequence::single_pass::run_single_pass;

/// Samples taken along each pixel's velocity, including the pixel itself.
const SAMPLES: u32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MotionBlurConfig {
    /// `0.0..=1.0`
    pub blur_size: f32,
}

impl Default for MotionBlurConfig {
    fn default() -> Self {
        Self { blur_size: 0.5 }
    }
}

impl MotionBlurConfig {
    pub fn clamped(self) -> Self {
        Self {
            blur_size: clamp_finite(self.blur_size, 0.0, 1.0),
        }
    }
}

/// Camera motion blur reconstructed from depth and last frame's view-projection.
pub struct MotionBlur {
    pub config: MotionBlurConfig,
    program: ProgramSlot,
    previous_view_projection: Option<Mat4>,
}

impl MotionBlur {
    pub fn new(config: MotionBlurConfig) -> Self {
        Self {
            config,
            program: Some(Arc::new(MotionBlurProgram)),
            previous_view_projection: None,
        }
    }

    pub fn set_program(&mut self, program: ProgramSlot) {
        self.program = program;
    }

    /// The matrix the next frame will reproject against.
    pub fn previous_view_projection(&self) -> Option<Mat4> {
        self.previous_view_projection
    }
}

impl Default for MotionBlur {
    fn default() -> Self {
        Self::new(MotionBlurConfig::default())
    }
}

impl Effect for MotionBlur {
    fn name(&self) -> &'static str {
        "motion_blur"
    }

    fn program(&self) -> Option<&dyn FilterProgram> {
        self.program.as_deref()
    }

    fn depth_mode(&self) -> DepthTextureMode {
        DepthTextureMode::DEPTH
    }

    fn on_enable(&mut self, camera: &Camera) {
        self.previous_view_projection = Some(camera.view_projection());
    }

    fn render(
        &mut self,
        renderer: &mut dyn Renderer,
        frame: &FrameInputs<'_>,
        source: &Image,
        destination: &mut Image,
    ) -> ScreenFxResult<SequenceReport> {
        check_frame(source, destination)?;
        let Some(program) = usable_program(self.program.as_deref(), renderer) else {
            return run_single_pass(renderer, source, destination, None, &PassParams::new());
        };
        let depth = frame.depth_texture()?;
        check_aux_texture("depth", depth, source)?;
        frame.camera.validate()?;

        let current = frame.camera.view_projection();
        let previous = self.previous_view_projection.unwrap_or(current);
        if current.determinant().abs() <= f32::EPSILON {
            return Err(ScreenFxError::validation("camera view-projection is not invertible"));
        }

        let cfg = self.config.clamped();
        let mut params = PassParams::new();
        params
            .set_float("blur_size", cfg.blur_size)
            .set_matrix("previous_view_projection", previous)
            .set_matrix("current_view_projection_inverse", current.inverse())
            .set_texture(DEPTH_TEXTURE, depth);
        let report = run_single_pass(renderer, source, destination, Some(program), &params)?;
        self.previous_view_projection = Some(current);
        Ok(report)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct MotionBlurProgram;

const MOTION_BLUR_PASSES: &[PassInfo] = &[PassInfo {
    name: "reproject_blur",
    role: PassRole::Main,
}];

/// Screen-space velocity in uv units for a pixel at `ndc_xy` with device depth `depth`.
pub(crate) fn uv_velocity(
    ndc_xy: Vec2,
    depth: f32,
    current_inverse: &Mat4,
    previous: &Mat4,
) -> Vec2 {
    let current = Vec4::new(ndc_xy.x, ndc_xy.y, depth * 2.0 - 1.0, 1.0);
    let world = *current_inverse * current;
    let world = world / world.w;
    let prev = *previous * world;
    let prev = prev / prev.w;
    let ndc_velocity = (Vec2::new(current.x, current.y) - Vec2::new(prev.x, prev.y)) / 2.0;
    // uv grows downward, ndc y grows upward.
    Vec2::new(ndc_velocity.x, -ndc_velocity.y)
}

impl FilterProgram for MotionBlurProgram {
    fn name(&self) -> &str {
        "motion_blur"
    }

    fn passes(&self) -> &[PassInfo] {
        MOTION_BLUR_PASSES
    }

    fn bind<'a>(&'a self, pass: usize, params: &PassParams<'a>) -> ScreenFxResult<BoundPass<'a>> {
        if pass != 0 {
            return Err(ScreenFxError::render(format!("reproject_blur has no pass {pass}")));
        }
        let blur_size = params.float("blur_size")?;
        let previous = params.matrix("previous_view_projection")?;
        let current_inverse = params.matrix("current_view_projection_inverse")?;
        let depth = Sampler::new(params.texture(DEPTH_TEXTURE)?);

        Ok(Box::new(move |frag: &Fragment<'_>| {
            let d = depth.sample(frag.uv).x;
            let velocity = uv_velocity(frag.ndc_xy(), d, &current_inverse, &previous);
            let step = velocity * blur_size;

            let mut uv = frag.uv;
            let mut sum = Vec4::ZERO;
            for _ in 0..SAMPLES {
                sum += frag.main_tex.sample(uv);
                uv += step;
            }
            (sum / SAMPLES as f32).truncate().extend(1.0)
        }))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/motion_blur.rs"]
mod tests;
