//! JSON configuration for an effect stack.
//!
//! ```json
//! {"effects": [{"kind": "bloom", "iterations": 2}, {"kind": "fog", "fog_density": 0.5}]}
//! ```
//!
//! Unknown fields are rejected, missing fields take their defaults, and numeric fields are
//! clamped into range when the stack is built.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::effects::{
    Bloom, BloomConfig, BrightnessSaturationContrast, BrightnessSaturationContrastConfig, Camera,
    Dissolve, DissolveConfig, EdgeDetectNormalsAndDepth, EdgeDetectNormalsAndDepthConfig,
    EdgeDetection, EdgeDetectionConfig, Effect, EffectStack, Fog, FogConfig, GaussianBlur,
    GaussianBlurConfig, MotionBlur, MotionBlurConfig,
};
use crate::foundation::error::{ScreenFxError, ScreenFxResult};
use crate::render::cpu::CpuRendererOpts;

/// One effect entry, tagged by `kind`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffectConfig {
    Bloom(BloomConfig),
    GaussianBlur(GaussianBlurConfig),
    BrightnessSaturationContrast(BrightnessSaturationContrastConfig),
    EdgeDetection(EdgeDetectionConfig),
    EdgeDetectNormalsAndDepth(EdgeDetectNormalsAndDepthConfig),
    Fog(FogConfig),
    MotionBlur(MotionBlurConfig),
    Dissolve(DissolveConfig),
}

impl EffectConfig {
    /// Every kind with its default settings, in pipeline order.
    pub fn all_defaults() -> Vec<Self> {
        vec![
            Self::Bloom(BloomConfig::default()),
            Self::GaussianBlur(GaussianBlurConfig::default()),
            Self::BrightnessSaturationContrast(BrightnessSaturationContrastConfig::default()),
            Self::EdgeDetection(EdgeDetectionConfig::default()),
            Self::EdgeDetectNormalsAndDepth(EdgeDetectNormalsAndDepthConfig::default()),
            Self::Fog(FogConfig::default()),
            Self::MotionBlur(MotionBlurConfig::default()),
            Self::Dissolve(DissolveConfig::default()),
        ]
    }

    pub fn clamped(self) -> Self {
        match self {
            Self::Bloom(c) => Self::Bloom(c.clamped()),
            Self::GaussianBlur(c) => Self::GaussianBlur(c.clamped()),
            Self::BrightnessSaturationContrast(c) => {
                Self::BrightnessSaturationContrast(c.clamped())
            }
            Self::EdgeDetection(c) => Self::EdgeDetection(c.clamped()),
            Self::EdgeDetectNormalsAndDepth(c) => Self::EdgeDetectNormalsAndDepth(c.clamped()),
            Self::Fog(c) => Self::Fog(c.clamped()),
            Self::MotionBlur(c) => Self::MotionBlur(c.clamped()),
            Self::Dissolve(c) => Self::Dissolve(c.clamped()),
        }
    }

    pub fn build(self) -> Box<dyn Effect> {
        match self.clamped() {
            Self::Bloom(c) => Box::new(Bloom::new(c)),
            Self::GaussianBlur(c) => Box::new(GaussianBlur::new(c)),
            Self::BrightnessSaturationContrast(c) => Box::new(BrightnessSaturationContrast::new(c)),
            Self::EdgeDetection(c) => Box::new(EdgeDetection::new(c)),
            Self::EdgeDetectNormalsAndDepth(c) => Box::new(EdgeDetectNormalsAndDepth::new(c)),
            Self::Fog(c) => Box::new(Fog::new(c)),
            Self::MotionBlur(c) => Box::new(MotionBlur::new(c)),
            Self::Dissolve(c) => Box::new(Dissolve::new(c)),
        }
    }
}

/// A whole stack: effects in order, the camera they see, and renderer options.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StackConfig {
    pub effects: Vec<EffectConfig>,
    pub camera: Camera,
    pub renderer: CpuRendererOpts,
}

impl StackConfig {
    pub fn from_json_str(s: &str) -> ScreenFxResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_reader<R: std::io::Read>(r: R) -> ScreenFxResult<Self> {
        Ok(serde_json::from_reader(r)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> ScreenFxResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ScreenFxError::validation(format!("open stack config '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn to_json_pretty(&self) -> ScreenFxResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build the stack and run `on_enable` against the configured camera.
    pub fn build_stack(&self) -> ScreenFxResult<EffectStack> {
        self.camera.validate()?;
        let mut stack = EffectStack::new();
        for effect in &self.effects {
            stack.push(effect.build());
        }
        stack.enable(&self.camera);
        Ok(stack)
    }
}

#[cfg(test)]
#[path = "../tests/unit/config/config.rs"]
mod tests;
