use std::sync::Arc;

use crate::effects::bloom::clamp_finite;
use crate::effects::edge_detect::mix_edges;
use crate::effects::{
    DepthTextureMode, Effect, FrameInputs, ProgramSlot, check_aux_texture, check_frame,
    usable_program,
};
use crate::foundation::core::{Color, Image, Vec2, Vec3, Vec4};
use crate::foundation::error::{ScreenFxError, ScreenFxResult};
use crate::program::{BoundPass, FilterProgram, Fragment, PassInfo, PassParams, PassRole, Sampler};
use crate::render::backend::Renderer;
use crate::sequence::iterative::SequenceReport;
use crate::sequence::single_pass::run_single_pass;

pub const DEPTH_NORMALS_TEXTURE: &str = "depth_normals";

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EdgeDetectNormalsAndDepthConfig {
    /// `0.0..=1.0`
    pub edges_only: f32,
    pub edge_color: Color,
    pub background_color: Color,
    /// Neighbor distance in texels.
    pub sample_distance: f32,
    pub sensitivity_depth: f32,
    pub sensitivity_normals: f32,
}

impl Default for EdgeDetectNormalsAndDepthConfig {
    fn default() -> Self {
        Self {
            edges_only: 0.0,
            edge_color: Color::BLACK,
            background_color: Color::WHITE,
            sample_distance: 1.0,
            sensitivity_depth: 1.0,
            sensitivity_normals: 1.0,
        }
    }
}

impl EdgeDetectNormalsAndDepthConfig {
    pub fn clamped(self) -> Self {
        Self {
            edges_only: clamp_finite(self.edges_only, 0.0, 1.0),
            sample_distance: clamp_finite(self.sample_distance, 0.0, f32::MAX),
            sensitivity_depth: clamp_finite(self.sensitivity_depth, 0.0, f32::MAX),
            sensitivity_normals: clamp_finite(self.sensitivity_normals, 0.0, f32::MAX),
            ..self
        }
    }
}

/// Roberts-cross edges on the camera's depth-normals texture.
pub struct EdgeDetectNormalsAndDepth {
    pub config: EdgeDetectNormalsAndDepthConfig,
    program: ProgramSlot,
}

impl EdgeDetectNormalsAndDepth {
    pub fn new(config: EdgeDetectNormalsAndDepthConfig) -> Self {
        Self {
            config,
            program: Some(Arc::new(NormalsDepthEdgeProgram)),
        }
    }

    pub fn set_program(&mut self, program: ProgramSlot) {
        self.program = program;
    }
}

impl Default for EdgeDetectNormalsAndDepth {
    fn default() -> Self {
        Self::new(EdgeDetectNormalsAndDepthConfig::default())
    }
}

impl Effect for EdgeDetectNormalsAndDepth {
    fn name(&self) -> &'static str {
        "edge_detect_normals_and_depth"
    }

    fn program(&self) -> Option<&dyn FilterProgram> {
        self.program.as_deref()
    }

    fn depth_mode(&self) -> DepthTextureMode {
        DepthTextureMode::DEPTH_NORMALS
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
        let depth_normals = frame.depth_normals_texture()?;
        check_aux_texture("depth-normals", depth_normals, source)?;

        let cfg = self.config.clamped();
        let mut params = PassParams::new();
        params
            .set_float("edges_only", cfg.edges_only)
            .set_color("edge_color", cfg.edge_color)
            .set_color("background_color", cfg.background_color)
            .set_float("sample_distance", cfg.sample_distance)
            .set_vector(
                "sensitivity",
                Vec4::new(cfg.sensitivity_normals, cfg.sensitivity_depth, 0.0, 0.0),
            )
            .set_texture(DEPTH_NORMALS_TEXTURE, depth_normals);
        run_single_pass(renderer, source, destination, Some(program), &params)
    }
}

/// Pack a view-space unit normal and a linear `0..1` depth into one RGBA8 texel.
///
/// The normal is stereographically projected into rg; depth is split across ba with
/// 8+8 bits of precision.
pub fn encode_depth_normal(normal: Vec3, depth01: f32) -> [u8; 4] {
    const SCALE: f32 = 1.7777;
    let n = normal.try_normalize().unwrap_or(Vec3::Z);
    let enc = Vec2::new(n.x, n.y) / (n.z + 1.0).max(1e-4);
    let enc = enc / SCALE * 0.5 + Vec2::splat(0.5);
    let (hi, lo) = encode_float_rg(depth01.clamp(0.0, 0.999_99));
    let unorm = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    [unorm(enc.x), unorm(enc.y), unorm(hi), unorm(lo)]
}

fn encode_float_rg(v: f32) -> (f32, f32) {
    let x = v.fract();
    let y = (v * 255.0).fract();
    (x - y / 255.0, y)
}

pub(crate) fn decode_float_rg(enc: Vec2) -> f32 {
    enc.dot(Vec2::new(1.0, 1.0 / 255.0))
}

/// Whether two depth-normals texels belong to the same surface.
pub(crate) fn check_same(center: Vec4, sample: Vec4, sensitivity: Vec2) -> bool {
    let diff_normal =
        (center.truncate().truncate() - sample.truncate().truncate()).abs() * sensitivity.x;
    let same_normal = diff_normal.x + diff_normal.y < 0.1;

    let center_depth = decode_float_rg(Vec2::new(center.z, center.w));
    let sample_depth = decode_float_rg(Vec2::new(sample.z, sample.w));
    let diff_depth = (center_depth - sample_depth).abs() * sensitivity.y;
    let same_depth = diff_depth < 0.1 * center_depth;

    same_normal && same_depth
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NormalsDepthEdgeProgram;

const NORMALS_DEPTH_PASSES: &[PassInfo] = &[PassInfo {
    name: "roberts_cross",
    role: PassRole::Main,
}];

impl FilterProgram for NormalsDepthEdgeProgram {
    fn name(&self) -> &str {
        "edge_detect_normals_and_depth"
    }

    fn passes(&self) -> &[PassInfo] {
        NORMALS_DEPTH_PASSES
    }

    fn bind<'a>(&'a self, pass: usize, params: &PassParams<'a>) -> ScreenFxResult<BoundPass<'a>> {
        if pass != 0 {
            return Err(ScreenFxError::render(format!("roberts_cross has no pass {pass}")));
        }
        let edges_only = params.float("edges_only")?;
        let edge_color = params.color("edge_color")?;
        let background = params.color("background_color")?;
        let sample_distance = params.float("sample_distance")?;
        let sensitivity = params.vector("sensitivity")?;
        let sensitivity = Vec2::new(sensitivity.x, sensitivity.y);
        let depth_normals = Sampler::new(params.texture(DEPTH_NORMALS_TEXTURE)?);

        Ok(Box::new(move |frag: &Fragment<'_>| {
            let step = frag.main_tex.texel_size() * sample_distance;
            let at = |dx: f32, dy: f32| depth_normals.sample(frag.uv + Vec2::new(dx, dy) * step);

            let same_diagonal = check_same(at(1.0, 1.0), at(-1.0, -1.0), sensitivity);
            let same_anti_diagonal = check_same(at(-1.0, 1.0), at(1.0, -1.0), sensitivity);
            let edge = if same_diagonal && same_anti_diagonal { 1.0 } else { 0.0 };

            let scene = frag.main_tex.sample(frag.uv);
            mix_edges(scene, edge, edges_only, edge_color, background)
        }))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/edge_detect_depth_normals.rs"]
mod tests;
