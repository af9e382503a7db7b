use crate::foundation::core::{FilterMode, Image, ImageDesc};
use crate::foundation::error::ScreenFxResult;
use crate::program::{FilterProgram, PassParams};

/// The boundary every sequencer drives. Implementations own scratch allocation and pass
/// execution; sequencers own ordering and buffer lifetimes.
pub trait Renderer {
    /// Hand out a scratch image. Failure is fatal for the calling sequence.
    fn acquire_scratch(&mut self, desc: ImageDesc, filter: FilterMode) -> ScreenFxResult<Image>;

    /// Return a scratch image obtained from [`Renderer::acquire_scratch`].
    fn release_scratch(&mut self, image: Image);

    /// Run pass `pass` of `program`, reading `input` and writing every texel of `output`.
    fn run_pass(
        &mut self,
        program: &dyn FilterProgram,
        pass: usize,
        input: &Image,
        output: &mut Image,
        params: &PassParams<'_>,
    ) -> ScreenFxResult<()>;

    /// Copy `input` into `output`. Equal descriptors copy bytes exactly; otherwise the input
    /// is resampled with its own filter mode.
    fn copy(&mut self, input: &Image, output: &mut Image) -> ScreenFxResult<()>;

    /// Checked once per sequence before any scratch is acquired.
    fn program_is_valid(&self, program: &dyn FilterProgram) -> bool {
        program.is_supported() && !program.passes().is_empty()
    }
}

impl<R: Renderer + ?Sized> Renderer for &mut R {
    fn acquire_scratch(&mut self, desc: ImageDesc, filter: FilterMode) -> ScreenFxResult<Image> {
        (**self).acquire_scratch(desc, filter)
    }

    fn release_scratch(&mut self, image: Image) {
        (**self).release_scratch(image)
    }

    fn run_pass(
        &mut self,
        program: &dyn FilterProgram,
        pass: usize,
        input: &Image,
        output: &mut Image,
        params: &PassParams<'_>,
    ) -> ScreenFxResult<()> {
        (**self).run_pass(program, pass, input, output, params)
    }

    fn copy(&mut self, input: &Image, output: &mut Image) -> ScreenFxResult<()> {
        (**self).copy(input, output)
    }

    fn program_is_valid(&self, program: &dyn FilterProgram) -> bool {
        (**self).program_is_valid(program)
    }
}
