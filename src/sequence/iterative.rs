use crate::foundation::core::{FilterMode, Image, ImageDesc, PixelFormat};
use crate::foundation::error::{ScreenFxError, ScreenFxResult};
use crate::program::{FilterProgram, PassParams, PassRole};
use crate::render::backend::Renderer;
use crate::sequence::slots::ScratchSlots;

/// How the working buffer is filled from the source.
#[derive(Clone, Debug)]
pub enum ExtractStep<'p> {
    /// Downsampling copy, no program involved.
    Copy,
    /// Run the program's [`PassRole::Extract`] pass (e.g. a bright-pass threshold).
    Pass(PassParams<'p>),
}

/// How the filtered working buffer reaches the destination.
#[derive(Clone, Debug)]
pub enum CompositeStep<'p> {
    /// Blit the working buffer straight into the destination.
    Blit,
    /// Run the program's [`PassRole::Composite`] pass over the source, with the working
    /// buffer bound as the texture parameter `blurred`.
    Pass {
        params: PassParams<'p>,
        blurred: &'static str,
    },
}

/// Shape of one iterative filter invocation.
#[derive(Clone, Debug)]
pub struct IterativePlan<'p> {
    pub iterations: u32,
    pub downscale: u32,
    pub extract: ExtractStep<'p>,
    pub composite: CompositeStep<'p>,
}

/// What a sequence actually did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SequenceReport {
    /// The program was missing or invalid and the source was copied through.
    pub fallback: bool,
    pub working_width: u32,
    pub working_height: u32,
    pub iterations: u32,
    pub acquisitions: u32,
    pub releases: u32,
}

impl SequenceReport {
    pub(crate) fn fallback() -> Self {
        Self {
            fallback: true,
            ..Self::default()
        }
    }
}

/// Growing per-iteration blur radius: `base + i * spread`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlurSchedule {
    pub base: f32,
    pub spread: f32,
}

impl BlurSchedule {
    pub fn new(base: f32, spread: f32) -> Self {
        Self { base, spread }
    }

    pub fn radius(self, iteration: u32) -> f32 {
        self.base + iteration as f32 * self.spread
    }
}

/// Working resolution for a downscale factor: `floor(dim / downscale)`, never below one
/// texel. A factor of zero is treated as one.
pub fn working_size(width: u32, height: u32, downscale: u32) -> (u32, u32) {
    let d = downscale.max(1);
    ((width / d).max(1), (height / d).max(1))
}

/// Run an iterative separable filter: extract into a downscaled scratch buffer, ping-pong
/// vertical/horizontal passes `plan.iterations` times, then composite into `destination`.
///
/// With no usable program the source is copied to the destination and no scratch is
/// touched. Otherwise exactly `2 * iterations + 1` scratch images are acquired and all of
/// them are released before returning, whether the sequence succeeds or fails.
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(
        iterations = plan.iterations,
        downscale = plan.downscale,
        width = source.width(),
        height = source.height()
    )
)]
pub fn run<'p, R, F>(
    renderer: &mut R,
    source: &Image,
    destination: &mut Image,
    program: Option<&dyn FilterProgram>,
    plan: &IterativePlan<'p>,
    per_iteration: F,
) -> ScreenFxResult<SequenceReport>
where
    R: Renderer + ?Sized,
    F: FnMut(u32) -> PassParams<'p>,
{
    let Some(program) = program.filter(|p| renderer.program_is_valid(*p)) else {
        tracing::debug!("no valid program, copying source through");
        renderer.copy(source, destination)?;
        return Ok(SequenceReport::fallback());
    };

    let roles = PassIndices::resolve(program, plan)?;
    let (w, h) = working_size(source.width(), source.height(), plan.downscale);

    let mut slots = ScratchSlots::default();
    let result = run_passes(
        renderer,
        &mut slots,
        source,
        destination,
        program,
        plan,
        roles,
        ImageDesc::rgba8(w, h),
        per_iteration,
    );
    slots.release_all(renderer);
    debug_assert_eq!(slots.live(), 0);

    result?;
    Ok(SequenceReport {
        fallback: false,
        working_width: w,
        working_height: h,
        iterations: plan.iterations,
        acquisitions: slots.acquisitions(),
        releases: slots.releases(),
    })
}

#[derive(Clone, Copy, Debug)]
struct PassIndices {
    extract: Option<usize>,
    vertical: usize,
    horizontal: usize,
    composite: Option<usize>,
}

impl PassIndices {
    fn resolve(program: &dyn FilterProgram, plan: &IterativePlan<'_>) -> ScreenFxResult<Self> {
        let need = |role: PassRole| {
            program.pass_index(role).ok_or_else(|| {
                ScreenFxError::render(format!(
                    "program '{}' has no {role:?} pass",
                    program.name()
                ))
            })
        };
        Ok(Self {
            extract: match plan.extract {
                ExtractStep::Copy => None,
                ExtractStep::Pass(_) => Some(need(PassRole::Extract)?),
            },
            // Zero iterations never run the blur passes; do not demand them.
            vertical: if plan.iterations > 0 { need(PassRole::Vertical)? } else { 0 },
            horizontal: if plan.iterations > 0 { need(PassRole::Horizontal)? } else { 0 },
            composite: match plan.composite {
                CompositeStep::Blit => None,
                CompositeStep::Pass { .. } => Some(need(PassRole::Composite)?),
            },
        })
    }
}

#[allow(clippy::too_many_arguments)]
fn run_passes<'p, R, F>(
    renderer: &mut R,
    slots: &mut ScratchSlots,
    source: &Image,
    destination: &mut Image,
    program: &dyn FilterProgram,
    plan: &IterativePlan<'p>,
    roles: PassIndices,
    working: ImageDesc,
    mut per_iteration: F,
) -> ScreenFxResult<()>
where
    R: Renderer + ?Sized,
    F: FnMut(u32) -> PassParams<'p>,
{
    debug_assert_eq!(working.format, PixelFormat::Rgba8Unorm);

    let mut current = slots.acquire(renderer, working, FilterMode::Bilinear)?;
    match (&plan.extract, roles.extract) {
        (ExtractStep::Pass(params), Some(pass)) => {
            renderer.run_pass(program, pass, source, slots.get_mut(current)?, params)?
        }
        _ => renderer.copy(source, slots.get_mut(current)?)?,
    }

    for i in 0..plan.iterations {
        let params = per_iteration(i);
        tracing::debug!(iteration = i, "blur iteration");

        let next = slots.acquire(renderer, working, FilterMode::Bilinear)?;
        {
            let (read, write) = slots.pair(current, next)?;
            renderer.run_pass(program, roles.vertical, read, write, &params)?;
        }
        slots.release(renderer, current);
        current = next;

        let next = slots.acquire(renderer, working, FilterMode::Bilinear)?;
        {
            let (read, write) = slots.pair(current, next)?;
            renderer.run_pass(program, roles.horizontal, read, write, &params)?;
        }
        slots.release(renderer, current);
        current = next;
    }

    match (&plan.composite, roles.composite) {
        (CompositeStep::Pass { params, blurred }, Some(pass)) => {
            let blurred_img = slots.get(current)?;
            let mut composite: PassParams<'_> = params.clone();
            composite.set_texture(*blurred, blurred_img);
            renderer.run_pass(program, pass, source, destination, &composite)?;
        }
        _ => renderer.copy(slots.get(current)?, destination)?,
    }

    slots.release(renderer, current);
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/iterative.rs"]
mod tests;
