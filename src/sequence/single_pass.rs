use crate::foundation::core::Image;
use crate::foundation::error::{ScreenFxError, ScreenFxResult};
use crate::program::{FilterProgram, PassParams, PassRole};
use crate::render::backend::Renderer;
use crate::sequence::iterative::SequenceReport;

/// Run a program's [`PassRole::Main`] pass from `source` straight into `destination`.
///
/// Shares the copy fallback of the iterative sequencer and never touches scratch.
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(width = source.width(), height = source.height())
)]
pub fn run_single_pass<R: Renderer + ?Sized>(
    renderer: &mut R,
    source: &Image,
    destination: &mut Image,
    program: Option<&dyn FilterProgram>,
    params: &PassParams<'_>,
) -> ScreenFxResult<SequenceReport> {
    let Some(program) = program.filter(|p| renderer.program_is_valid(*p)) else {
        tracing::debug!("no valid program, copying source through");
        renderer.copy(source, destination)?;
        return Ok(SequenceReport::fallback());
    };

    let pass = program.pass_index(PassRole::Main).ok_or_else(|| {
        ScreenFxError::render(format!("program '{}' has no Main pass", program.name()))
    })?;
    renderer.run_pass(program, pass, source, destination, params)?;

    Ok(SequenceReport {
        working_width: destination.width(),
        working_height: destination.height(),
        ..SequenceReport::default()
    })
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/single_pass.rs"]
mod tests;
