//! Filter programs: the passes a renderer can run, and the per-fragment interface they
//! expose to it.

pub mod params;
pub mod sampler;

use crate::foundation::core::{Vec2, Vec4};
use crate::foundation::error::ScreenFxResult;

pub use params::{ParamValue, PassParams};
pub use sampler::Sampler;

/// What a pass is for. Sequencers look passes up by role, never by index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassRole {
    /// Source -> working buffer preparation (bright-pass threshold, plain copy).
    Extract,
    /// Vertical half of a separable filter.
    Vertical,
    /// Horizontal half of a separable filter.
    Horizontal,
    /// Blend a processed buffer back over the source.
    Composite,
    /// The only pass of a single-pass effect.
    Main,
}

/// Static description of one pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassInfo {
    pub name: &'static str,
    pub role: PassRole,
}

/// One output pixel being shaded.
#[derive(Clone, Copy, Debug)]
pub struct Fragment<'a> {
    /// Pixel center in uv space, origin at the top-left.
    pub uv: Vec2,
    /// The pass input.
    pub main_tex: Sampler<'a>,
}

impl Fragment<'_> {
    /// The uv flipped to clip-space convention: x and y in `-1..=1`, y pointing up.
    pub fn ndc_xy(&self) -> Vec2 {
        Vec2::new(self.uv.x * 2.0 - 1.0, 1.0 - self.uv.y * 2.0)
    }
}

/// A pass with its parameters resolved, ready to be evaluated for every output pixel.
pub type BoundPass<'a> = Box<dyn Fn(&Fragment<'_>) -> Vec4 + Send + Sync + 'a>;

/// An external filter program with a finite set of numbered passes.
///
/// Renderers call [`FilterProgram::bind`] once per pass invocation; parameter lookups and
/// their failures happen there, so shading itself is infallible.
pub trait FilterProgram: Send + Sync {
    fn name(&self) -> &str;

    fn passes(&self) -> &[PassInfo];

    /// Whether this program can run at all. An unsupported program triggers the copy
    /// fallback in every sequencer.
    fn is_supported(&self) -> bool {
        true
    }

    fn bind<'a>(&'a self, pass: usize, params: &PassParams<'a>) -> ScreenFxResult<BoundPass<'a>>;

    fn pass_index(&self, role: PassRole) -> Option<usize> {
        self.passes().iter().position(|p| p.role == role)
    }
}

/// A program whose every pass returns its input unchanged. Composite passes return the
/// source. Useful as a baseline and for plumbing checks.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassThroughProgram;

const PASS_THROUGH_PASSES: &[PassInfo] = &[
    PassInfo {
        name: "extract",
        role: PassRole::Extract,
    },
    PassInfo {
        name: "vertical",
        role: PassRole::Vertical,
    },
    PassInfo {
        name: "horizontal",
        role: PassRole::Horizontal,
    },
    PassInfo {
        name: "composite",
        role: PassRole::Composite,
    },
    PassInfo {
        name: "main",
        role: PassRole::Main,
    },
];

impl FilterProgram for PassThroughProgram {
    fn name(&self) -> &str {
        "pass_through"
    }

    fn passes(&self) -> &[PassInfo] {
        PASS_THROUGH_PASSES
    }

    fn bind<'a>(&'a self, _pass: usize, _params: &PassParams<'a>) -> ScreenFxResult<BoundPass<'a>> {
        Ok(Box::new(|frag: &Fragment<'_>| frag.main_tex.sample(frag.uv)))
    }
}

#[cfg(test)]
#[path = "../tests/unit/program/program.rs"]
mod tests;
