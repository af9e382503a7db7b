use std::sync::Arc;

use crate::effects::bloom::clamp_finite;
use crate::effects::{Effect, FrameInputs, ProgramSlot, check_frame};
use crate::foundation::core::{Color, Image, Vec2, Vec4};
use crate::foundation::error::{ScreenFxError, ScreenFxResult};
use crate::foundation::math::{lerp, luminance};
use crate::program::{BoundPass, FilterProgram, Fragment, PassInfo, PassParams, PassRole};
use crate::render::backend::Renderer;
use crate::sequence::iterative::SequenceReport;
use crate::sequence::single_pass::run_single_pass;

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EdgeDetectionConfig {
    /// `0.0` keeps the scene under the edges, `1.0` shows edges over the background color.
    pub edges_only: f32,
    pub edge_color: Color,
    pub background_color: Color,
}

impl Default for EdgeDetectionConfig {
    fn default() -> Self {
        Self {
            edges_only: 0.0,
            edge_color: Color::BLACK,
            background_color: Color::WHITE,
        }
    }
}

impl EdgeDetectionConfig {
    pub fn clamped(self) -> Self {
        Self {
            edges_only: clamp_finite(self.edges_only, 0.0, 1.0),
            ..self
        }
    }
}

/// Sobel edges on luminance.
pub struct EdgeDetection {
    pub config: EdgeDetectionConfig,
    program: ProgramSlot,
}

impl EdgeDetection {
    pub fn new(config: EdgeDetectionConfig) -> Self {
        Self {
            config,
            program: Some(Arc::new(SobelProgram)),
        }
    }

    pub fn set_program(&mut self, program: ProgramSlot) {
        self.program = program;
    }
}

impl Default for EdgeDetection {
    fn default() -> Self {
        Self::new(EdgeDetectionConfig::default())
    }
}

impl Effect for EdgeDetection {
    fn name(&self) -> &'static str {
        "edge_detection"
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
            .set_float("edges_only", cfg.edges_only)
            .set_color("edge_color", cfg.edge_color)
            .set_color("background_color", cfg.background_color);
        run_single_pass(renderer, source, destination, self.program.as_deref(), &params)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SobelProgram;

const SOBEL_PASSES: &[PassInfo] = &[PassInfo {
    name: "sobel",
    role: PassRole::Main,
}];

const GX: [f32; 9] = [-1.0, 0.0, 1.0, -2.0, 0.0, 2.0, -1.0, 0.0, 1.0];
const GY: [f32; 9] = [-1.0, -2.0, -1.0, 0.0, 0.0, 0.0, 1.0, 2.0, 1.0];

/// `1 - |Gx| - |Gy|` over the 3x3 luminance neighborhood; 1 means no edge.
pub(crate) fn sobel(frag: &Fragment<'_>) -> f32 {
    let texel = frag.main_tex.texel_size();
    let (mut gx, mut gy) = (0.0, 0.0);
    for (i, (kx, ky)) in GX.iter().zip(GY.iter()).enumerate() {
        let offset = Vec2::new((i % 3) as f32 - 1.0, (i / 3) as f32 - 1.0);
        let lum = luminance(frag.main_tex.sample(frag.uv + offset * texel).truncate());
        gx += lum * kx;
        gy += lum * ky;
    }
    1.0 - f32::abs(gx) - f32::abs(gy)
}

/// Shared edge/background mix of both edge detectors.
pub(crate) fn mix_edges(
    scene: Vec4,
    edge: f32,
    edges_only: f32,
    edge_color: Vec4,
    background: Vec4,
) -> Vec4 {
    let with_edge = lerp(edge_color, scene, edge);
    let only_edge = lerp(edge_color, background, edge);
    lerp(with_edge, only_edge, edges_only)
}

impl FilterProgram for SobelProgram {
    fn name(&self) -> &str {
        "edge_detection"
    }

    fn passes(&self) -> &[PassInfo] {
        SOBEL_PASSES
    }

    fn bind<'a>(&'a self, pass: usize, params: &PassParams<'a>) -> ScreenFxResult<BoundPass<'a>> {
        if pass != 0 {
            return Err(ScreenFxError::render(format!("sobel has no pass {pass}")));
        }
        let edges_only = params.float("edges_only")?;
        let edge_color = params.color("edge_color")?;
        let background = params.color("background_color")?;
        Ok(Box::new(move |frag: &Fragment<'_>| {
            let edge = sobel(frag);
            let scene = frag.main_tex.sample(frag.uv);
            mix_edges(scene, edge, edges_only, edge_color, background)
        }))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/edge_detect.rs"]
mod tests;
