use std::sync::Arc;

use crate::effects::bloom::clamp_finite;
use crate::effects::camera::{clip_planes, linear_eye_depth};
use crate::effects::{
    DepthTextureMode, Effect, FrameInputs, ProgramSlot, check_aux_texture, check_frame,
    usable_program,
};
use crate::foundation::core::{Color, Image, Mat4, Vec2, Vec3, Vec4};
use crate::foundation::error::{ScreenFxError, ScreenFxResult};
use crate::foundation::math::saturate;
use crate::program::{BoundPass, FilterProgram, Fragment, PassInfo, PassParams, PassRole, Sampler};
use crate::render::backend::Renderer;
use crate::sequence::iterative::SequenceReport;
use crate::sequence::single_pass::run_single_pass;

pub const DEPTH_TEXTURE: &str = "depth";

/// Height fog: full strength at `fog_start` world height, gone at `fog_end`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FogConfig {
    /// `0.0..=3.0`
    pub fog_density: f32,
    pub fog_color: Color,
    pub fog_start: f32,
    pub fog_end: f32,
}

impl Default for FogConfig {
    fn default() -> Self {
        Self {
            fog_density: 1.0,
            fog_color: Color::WHITE,
            fog_start: 0.0,
            fog_end: 2.0,
        }
    }
}

impl FogConfig {
    pub fn clamped(self) -> Self {
        Self {
            fog_density: clamp_finite(self.fog_density, 0.0, 3.0),
            ..self
        }
    }
}

/// Fog factor at world height `y`.
pub fn fog_factor(y: f32, density: f32, start: f32, end: f32) -> f32 {
    let span = end - start;
    if span.abs() <= f32::EPSILON {
        return if y <= end { saturate(density) } else { 0.0 };
    }
    saturate(density * (end - y) / span)
}

pub struct Fog {
    pub config: FogConfig,
    program: ProgramSlot,
}

impl Fog {
    pub fn new(config: FogConfig) -> Self {
        Self {
            config,
            program: Some(Arc::new(FogProgram)),
        }
    }

    pub fn set_program(&mut self, program: ProgramSlot) {
        self.program = program;
    }
}

impl Default for Fog {
    fn default() -> Self {
        Self::new(FogConfig::default())
    }
}

impl Effect for Fog {
    fn name(&self) -> &'static str {
        "fog"
    }

    fn program(&self) -> Option<&dyn FilterProgram> {
        self.program.as_deref()
    }

    fn depth_mode(&self) -> DepthTextureMode {
        DepthTextureMode::DEPTH
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

        let cfg = self.config.clamped();
        let camera = &frame.camera;
        let mut params = PassParams::new();
        params
            .set_matrix("frustum_corners_ray", camera.frustum_corner_rays())
            .set_vector("camera_position", camera.position.extend(1.0))
            .set_vector("clip_planes", clip_planes(camera))
            .set_float("fog_density", cfg.fog_density)
            .set_color("fog_color", cfg.fog_color)
            .set_float("fog_start", cfg.fog_start)
            .set_float("fog_end", cfg.fog_end)
            .set_texture(DEPTH_TEXTURE, depth);
        run_single_pass(renderer, source, destination, Some(program), &params)
    }
}

/// Interpolate the corner rays (rows bottom-left, bottom-right, top-right, top-left) at a
/// top-left-origin uv.
pub(crate) fn interpolate_ray(corners: &Mat4, uv: Vec2) -> Vec3 {
    let row = |i: usize| corners.row(i).truncate();
    let s = uv.x;
    let t = 1.0 - uv.y;
    let bottom = row(0).lerp(row(1), s);
    let top = row(3).lerp(row(2), s);
    bottom.lerp(top, t)
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FogProgram;

const FOG_PASSES: &[PassInfo] = &[PassInfo {
    name: "height_fog",
    role: PassRole::Main,
}];

impl FilterProgram for FogProgram {
    fn name(&self) -> &str {
        "fog"
    }

    fn passes(&self) -> &[PassInfo] {
        FOG_PASSES
    }

    fn bind<'a>(&'a self, pass: usize, params: &PassParams<'a>) -> ScreenFxResult<BoundPass<'a>> {
        if pass != 0 {
            return Err(ScreenFxError::render(format!("height_fog has no pass {pass}")));
        }
        let corners = params.matrix("frustum_corners_ray")?;
        let eye = params.vector("camera_position")?.truncate();
        let planes = params.vector("clip_planes")?;
        let density = params.float("fog_density")?;
        let fog_color = params.color("fog_color")?;
        let start = params.float("fog_start")?;
        let end = params.float("fog_end")?;
        let depth = Sampler::new(params.texture(DEPTH_TEXTURE)?);

        Ok(Box::new(move |frag: &Fragment<'_>| {
            let eye_depth = linear_eye_depth(depth.sample(frag.uv).x, planes.x, planes.y);
            let world = eye + interpolate_ray(&corners, frag.uv) * eye_depth;
            let f = fog_factor(world.y, density, start, end);

            let c = frag.main_tex.sample(frag.uv);
            let rgb = c.truncate().lerp(fog_color.truncate(), f);
            Vec4::new(rgb.x, rgb.y, rgb.z, c.w)
        }))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/fog.rs"]
mod tests;
