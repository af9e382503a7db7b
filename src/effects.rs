//! Screen-space effects: parameter marshalling around a [`FilterProgram`], plus any state
//! an effect carries from one frame to the next.
//!
//! Every effect falls back to copying its source when its program slot is empty or the
//! renderer rejects the program.

pub mod bloom;
pub mod blur_kernel;
pub mod camera;
pub mod color_grade;
pub mod dissolve;
pub mod edge_detect;
pub mod edge_detect_depth_normals;
pub mod fog;
pub mod gaussian_blur;
pub mod motion_blur;
pub mod stack;

use std::ops::BitOr;
use std::sync::Arc;

use crate::foundation::core::Image;
use crate::foundation::error::{ScreenFxError, ScreenFxResult};
use crate::program::FilterProgram;
use crate::render::backend::Renderer;
use crate::sequence::iterative::SequenceReport;

pub use bloom::{Bloom, BloomConfig};
pub use camera::Camera;
pub use color_grade::{BrightnessSaturationContrast, BrightnessSaturationContrastConfig};
pub use dissolve::{BurnDriver, Dissolve, DissolveConfig};
pub use edge_detect::{EdgeDetection, EdgeDetectionConfig};
pub use edge_detect_depth_normals::{EdgeDetectNormalsAndDepth, EdgeDetectNormalsAndDepthConfig};
pub use fog::{Fog, FogConfig};
pub use gaussian_blur::{GaussianBlur, GaussianBlurConfig};
pub use motion_blur::{MotionBlur, MotionBlurConfig};
pub use stack::{EffectStack, StackReport};

/// Shared handle to a filter program. `None` means "no program bound".
pub type ProgramSlot = Option<Arc<dyn FilterProgram>>;

/// Camera textures an effect reads besides its source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DepthTextureMode {
    pub depth: bool,
    pub depth_normals: bool,
}

impl DepthTextureMode {
    pub const NONE: Self = Self {
        depth: false,
        depth_normals: false,
    };
    pub const DEPTH: Self = Self {
        depth: true,
        depth_normals: false,
    };
    pub const DEPTH_NORMALS: Self = Self {
        depth: false,
        depth_normals: true,
    };

    pub fn union(self, other: Self) -> Self {
        Self {
            depth: self.depth || other.depth,
            depth_normals: self.depth_normals || other.depth_normals,
        }
    }

    pub fn is_empty(self) -> bool {
        !self.depth && !self.depth_normals
    }
}

impl BitOr for DepthTextureMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Per-frame inputs from the host camera.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInputs<'a> {
    pub camera: Camera,
    /// `R32Float` device depth, same size as the frame.
    pub depth: Option<&'a Image>,
    /// Encoded view-space normals (rg) and depth (ba), see
    /// [`edge_detect_depth_normals::encode_depth_normal`].
    pub depth_normals: Option<&'a Image>,
    /// Seconds since the effect clock started.
    pub time_s: f32,
}

impl<'a> FrameInputs<'a> {
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            ..Self::default()
        }
    }

    pub fn with_depth(mut self, depth: &'a Image) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn with_depth_normals(mut self, depth_normals: &'a Image) -> Self {
        self.depth_normals = Some(depth_normals);
        self
    }

    pub fn with_time(mut self, time_s: f32) -> Self {
        self.time_s = time_s;
        self
    }

    pub fn provides(&self) -> DepthTextureMode {
        DepthTextureMode {
            depth: self.depth.is_some(),
            depth_normals: self.depth_normals.is_some(),
        }
    }

    /// Fail unless every texture in `required` is present.
    pub fn require(&self, required: DepthTextureMode) -> ScreenFxResult<()> {
        let have = self.provides();
        if required.depth && !have.depth {
            return Err(ScreenFxError::validation("effect needs a depth texture"));
        }
        if required.depth_normals && !have.depth_normals {
            return Err(ScreenFxError::validation(
                "effect needs a depth-normals texture",
            ));
        }
        Ok(())
    }

    pub(crate) fn depth_texture(&self) -> ScreenFxResult<&'a Image> {
        self.depth
            .ok_or_else(|| ScreenFxError::validation("effect needs a depth texture"))
    }

    pub(crate) fn depth_normals_texture(&self) -> ScreenFxResult<&'a Image> {
        self.depth_normals
            .ok_or_else(|| ScreenFxError::validation("effect needs a depth-normals texture"))
    }
}

/// A post-process step invoked once per frame with the previous step's output.
pub trait Effect: Send {
    fn name(&self) -> &'static str;

    /// Camera textures the effect's program reads.
    fn depth_mode(&self) -> DepthTextureMode {
        DepthTextureMode::NONE
    }

    /// The bound program, if any.
    fn program(&self) -> Option<&dyn FilterProgram>;

    /// Textures a frame must carry for `renderer`. An effect that will copy its source
    /// through needs none.
    fn required_textures(&self, renderer: &dyn Renderer) -> DepthTextureMode {
        match usable_program(self.program(), renderer) {
            Some(_) => self.depth_mode(),
            None => DepthTextureMode::NONE,
        }
    }

    /// Called when the effect is switched on, before its first frame.
    fn on_enable(&mut self, _camera: &Camera) {}

    fn render(
        &mut self,
        renderer: &mut dyn Renderer,
        frame: &FrameInputs<'_>,
        source: &Image,
        destination: &mut Image,
    ) -> ScreenFxResult<SequenceReport>;
}

/// `program` if the renderer accepts it.
pub(crate) fn usable_program<'p>(
    program: Option<&'p dyn FilterProgram>,
    renderer: &dyn Renderer,
) -> Option<&'p dyn FilterProgram> {
    program.filter(|p| renderer.program_is_valid(*p))
}

pub(crate) fn check_frame(source: &Image, destination: &Image) -> ScreenFxResult<()> {
    if source.desc() != destination.desc() {
        return Err(ScreenFxError::validation(format!(
            "destination {}x{} {:?} does not match source {}x{} {:?}",
            destination.width(),
            destination.height(),
            destination.format(),
            source.width(),
            source.height(),
            source.format()
        )));
    }
    Ok(())
}

/// Depth-based effects need a texture covering the frame.
pub(crate) fn check_aux_texture(name: &str, aux: &Image, source: &Image) -> ScreenFxResult<()> {
    if aux.width() != source.width() || aux.height() != source.height() {
        return Err(ScreenFxError::validation(format!(
            "{name} texture is {}x{}, frame is {}x{}",
            aux.width(),
            aux.height(),
            source.width(),
            source.height()
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../tests/unit/effects/effects.rs"]
mod tests;
