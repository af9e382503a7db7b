#![forbid(unsafe_code)]

pub mod config;
pub mod effects;
pub mod foundation;
pub mod program;
pub mod render;
pub mod sequence;

pub use config::{EffectConfig, StackConfig};
pub use effects::{Camera, DepthTextureMode, Effect, EffectStack, FrameInputs, StackReport};
pub use foundation::core::{Color, FilterMode, Image, ImageDesc, PixelFormat};
pub use foundation::error::{ScreenFxError, ScreenFxResult};
pub use program::{FilterProgram, PassInfo, PassParams, PassRole};
pub use render::backend::Renderer;
pub use render::cpu::{CpuRenderer, CpuRendererOpts};
pub use render::scratch_pool::{ScratchPool, ScratchPoolOpts, ScratchPoolStats};
pub use sequence::iterative::{
    BlurSchedule, CompositeStep, ExtractStep, IterativePlan, SequenceReport, run, working_size,
};
pub use sequence::single_pass::run_single_pass;
