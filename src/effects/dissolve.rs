use std::sync::Arc;

use crate::effects::bloom::clamp_finite;
use crate::effects::camera::Camera;
use crate::effects::{Effect, FrameInputs, ProgramSlot, check_frame};
use crate::foundation::core::{Color, Image, Vec2, Vec4};
use crate::foundation::error::{ScreenFxError, ScreenFxResult};
use crate::foundation::math::{hash01, lerp, repeat, smoothstep};
use crate::program::{BoundPass, FilterProgram, Fragment, PassInfo, PassParams, PassRole, Sampler};
use crate::render::backend::Renderer;
use crate::sequence::iterative::SequenceReport;
use crate::sequence::single_pass::run_single_pass;

/// Optional texture parameter; its red channel replaces the procedural burn map.
pub const BURN_MAP_TEXTURE: &str = "burn_map";

/// Largest seed that survives the trip through a float parameter.
const MAX_SEED: u32 = (1 << 24) - 1;

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DissolveConfig {
    /// Burn cycles per second, `0.01..=1.0`.
    pub burn_speed: f32,
    /// Width of the glowing band in burn-map units, `0.0..=0.2`.
    pub line_width: f32,
    pub burn_first_color: Color,
    pub burn_second_color: Color,
    /// What shows through burnt-away pixels.
    pub background_color: Color,
    /// Procedural burn-map cells across the frame, `1.0..=256.0`.
    pub noise_scale: f32,
    pub seed: u32,
}

impl Default for DissolveConfig {
    fn default() -> Self {
        Self {
            burn_speed: 0.3,
            line_width: 0.1,
            burn_first_color: Color::rgb(1.0, 0.5, 0.0),
            burn_second_color: Color::rgb(0.5, 0.0, 0.0),
            background_color: Color::BLACK,
            noise_scale: 8.0,
            seed: 0,
        }
    }
}

impl DissolveConfig {
    pub fn clamped(self) -> Self {
        Self {
            burn_speed: clamp_finite(self.burn_speed, 0.01, 1.0),
            line_width: clamp_finite(self.line_width, 0.0, 0.2),
            noise_scale: clamp_finite(self.noise_scale, 1.0, 256.0),
            seed: self.seed.min(MAX_SEED),
            ..self
        }
    }
}

/// Drives the burn amount from a clock: `repeat(time * speed, 1)`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BurnDriver {
    amount: f32,
}

impl BurnDriver {
    pub fn reset(&mut self) {
        self.amount = 0.0;
    }

    pub fn update(&mut self, time_s: f32, burn_speed: f32) -> f32 {
        self.amount = repeat(time_s * burn_speed, 1.0);
        self.amount
    }

    pub fn amount(&self) -> f32 {
        self.amount
    }
}

/// Burns the frame away along a noise map, leaving a colored band at the edge.
pub struct Dissolve {
    pub config: DissolveConfig,
    driver: BurnDriver,
    burn_map: Option<Arc<Image>>,
    program: ProgramSlot,
}

impl Dissolve {
    pub fn new(config: DissolveConfig) -> Self {
        Self {
            config,
            driver: BurnDriver::default(),
            burn_map: None,
            program: Some(Arc::new(DissolveProgram)),
        }
    }

    pub fn set_program(&mut self, program: ProgramSlot) {
        self.program = program;
    }

    /// Use an explicit burn map instead of procedural noise.
    pub fn set_burn_map(&mut self, burn_map: Option<Arc<Image>>) {
        self.burn_map = burn_map;
    }

    pub fn burn_amount(&self) -> f32 {
        self.driver.amount()
    }
}

impl Default for Dissolve {
    fn default() -> Self {
        Self::new(DissolveConfig::default())
    }
}

impl Effect for Dissolve {
    fn name(&self) -> &'static str {
        "dissolve"
    }

    fn program(&self) -> Option<&dyn FilterProgram> {
        self.program.as_deref()
    }

    fn on_enable(&mut self, _camera: &Camera) {
        self.driver.reset();
    }

    fn render(
        &mut self,
        renderer: &mut dyn Renderer,
        frame: &FrameInputs<'_>,
        source: &Image,
        destination: &mut Image,
    ) -> ScreenFxResult<SequenceReport> {
        check_frame(source, destination)?;
        let cfg = self.config.clamped();
        let amount = self.driver.update(frame.time_s, cfg.burn_speed);
        tracing::trace!(amount, "burn amount");

        let mut params = PassParams::new();
        params
            .set_float("burn_amount", amount)
            .set_float("line_width", cfg.line_width)
            .set_color("burn_first_color", cfg.burn_first_color)
            .set_color("burn_second_color", cfg.burn_second_color)
            .set_color("background_color", cfg.background_color)
            .set_float("noise_scale", cfg.noise_scale)
            .set_float("seed", cfg.seed as f32);
        if let Some(map) = self.burn_map.as_deref() {
            params.set_texture(BURN_MAP_TEXTURE, map);
        }
        run_single_pass(renderer, source, destination, self.program.as_deref(), &params)
    }
}

/// Smoothly interpolated lattice noise in `0..=1`.
pub(crate) fn value_noise(seed: u64, p: Vec2) -> f32 {
    let cell = p.floor();
    let f = p - cell;
    let (x, y) = (cell.x.max(0.0) as u32, cell.y.max(0.0) as u32);
    let u = f * f * (Vec2::splat(3.0) - 2.0 * f);

    let a = hash01(seed, x, y);
    let b = hash01(seed, x.saturating_add(1), y);
    let c = hash01(seed, x, y.saturating_add(1));
    let d = hash01(seed, x.saturating_add(1), y.saturating_add(1));
    let top = a + (b - a) * u.x;
    let bottom = c + (d - c) * u.x;
    top + (bottom - top) * u.y
}

/// Color of one fragment with burn-map value `burn` at the current `amount`.
pub(crate) fn burn_shade(
    scene: Vec4,
    burn: f32,
    amount: f32,
    line_width: f32,
    first: Vec4,
    second: Vec4,
    background: Vec4,
) -> Vec4 {
    let remaining = burn - amount;
    if remaining < 0.0 {
        return background;
    }
    let t = 1.0 - smoothstep(0.0, line_width, remaining);
    let band = lerp(first, second, t);
    let band = band.truncate().powf(5.0).extend(1.0);
    let visible = if amount >= 0.0001 { t } else { 0.0 };
    lerp(scene, band, visible)
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DissolveProgram;

const DISSOLVE_PASSES: &[PassInfo] = &[PassInfo {
    name: "burn",
    role: PassRole::Main,
}];

impl FilterProgram for DissolveProgram {
    fn name(&self) -> &str {
        "dissolve"
    }

    fn passes(&self) -> &[PassInfo] {
        DISSOLVE_PASSES
    }

    fn bind<'a>(&'a self, pass: usize, params: &PassParams<'a>) -> ScreenFxResult<BoundPass<'a>> {
        if pass != 0 {
            return Err(ScreenFxError::render(format!("burn has no pass {pass}")));
        }
        let amount = params.float("burn_amount")?;
        let line_width = params.float("line_width")?;
        let first = params.color("burn_first_color")?;
        let second = params.color("burn_second_color")?;
        let background = params.color("background_color")?;
        let noise_scale = params.float("noise_scale")?;
        let seed = params.float("seed")? as u64;
        let burn_map = if params.contains(BURN_MAP_TEXTURE) {
            Some(Sampler::new(params.texture(BURN_MAP_TEXTURE)?))
        } else {
            None
        };

        Ok(Box::new(move |frag: &Fragment<'_>| {
            let burn = match &burn_map {
                Some(map) => map.sample(frag.uv).x,
                None => value_noise(seed, frag.uv * noise_scale),
            };
            let scene = frag.main_tex.sample(frag.uv);
            burn_shade(scene, burn, amount, line_width, first, second, background)
        }))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/dissolve.rs"]
mod tests;
