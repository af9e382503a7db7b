use crate::effects::camera::Camera;
use crate::effects::{DepthTextureMode, Effect, FrameInputs, check_frame};
use crate::foundation::core::{FilterMode, Image};
use crate::foundation::error::ScreenFxResult;
use crate::render::backend::Renderer;
use crate::sequence::iterative::SequenceReport;
use crate::sequence::slots::{ScratchSlots, SlotId};

struct Entry {
    effect: Box<dyn Effect>,
    enabled: bool,
}

/// What one stack invocation did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StackReport {
    /// Per enabled effect, in order.
    pub effects: Vec<(&'static str, SequenceReport)>,
    /// Full-resolution intermediates acquired between effects.
    pub intermediates: u32,
    /// No enabled effect ran; the source was copied through.
    pub copied: bool,
}

/// An ordered chain of effects, each reading the previous one's output.
#[derive(Default)]
pub struct EffectStack {
    entries: Vec<Entry>,
}

impl EffectStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an enabled effect. Call [`EffectStack::enable`] before the first frame.
    pub fn push(&mut self, effect: Box<dyn Effect>) -> &mut Self {
        self.entries.push(Entry {
            effect,
            enabled: true,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.effect.name()).collect()
    }

    pub fn effect_mut(&mut self, index: usize) -> Option<&mut (dyn Effect + 'static)> {
        self.entries.get_mut(index).map(|e| e.effect.as_mut())
    }

    /// Run `on_enable` for every enabled effect.
    pub fn enable(&mut self, camera: &Camera) {
        for entry in self.entries.iter_mut().filter(|e| e.enabled) {
            entry.effect.on_enable(camera);
        }
    }

    /// Switch one effect on or off. Switching on runs its `on_enable`.
    pub fn set_enabled(&mut self, index: usize, enabled: bool, camera: &Camera) {
        if let Some(entry) = self.entries.get_mut(index) {
            if enabled && !entry.enabled {
                entry.effect.on_enable(camera);
            }
            entry.enabled = enabled;
        }
    }

    /// Union of the camera textures the enabled effects read when their programs run.
    pub fn depth_mode(&self) -> DepthTextureMode {
        self.entries
            .iter()
            .filter(|e| e.enabled)
            .fold(DepthTextureMode::NONE, |acc, e| acc | e.effect.depth_mode())
    }

    /// Textures the enabled effects need for `renderer`, skipping those that will copy
    /// through for lack of a usable program.
    pub fn required_textures(&self, renderer: &dyn Renderer) -> DepthTextureMode {
        self.entries
            .iter()
            .filter(|e| e.enabled)
            .fold(DepthTextureMode::NONE, |acc, e| acc | e.effect.required_textures(renderer))
    }

    /// Run the enabled effects from `source` into `destination`, ping-ponging through
    /// full-resolution intermediates. No scratch survives the call.
    #[tracing::instrument(level = "debug", skip_all, fields(effects = self.entries.len()))]
    pub fn render(
        &mut self,
        renderer: &mut dyn Renderer,
        frame: &FrameInputs<'_>,
        source: &Image,
        destination: &mut Image,
    ) -> ScreenFxResult<StackReport> {
        check_frame(source, destination)?;
        frame.require(self.required_textures(&*renderer))?;

        let mut active: Vec<&mut Box<dyn Effect>> = self
            .entries
            .iter_mut()
            .filter(|e| e.enabled)
            .map(|e| &mut e.effect)
            .collect();

        let mut report = StackReport::default();
        if active.is_empty() {
            tracing::debug!("no enabled effects, copying source through");
            renderer.copy(source, destination)?;
            report.copied = true;
            return Ok(report);
        }

        let mut slots = ScratchSlots::default();
        let result = run_chain(
            renderer,
            &mut slots,
            &mut active,
            frame,
            source,
            destination,
            &mut report,
        );
        slots.release_all(renderer);
        result?;

        report.intermediates = slots.acquisitions();
        Ok(report)
    }
}

fn run_chain(
    renderer: &mut dyn Renderer,
    slots: &mut ScratchSlots,
    active: &mut [&mut Box<dyn Effect>],
    frame: &FrameInputs<'_>,
    source: &Image,
    destination: &mut Image,
    report: &mut StackReport,
) -> ScreenFxResult<()> {
    let last = active.len() - 1;
    let mut current: Option<SlotId> = None;

    for (i, effect) in active.iter_mut().enumerate() {
        let name = effect.name();
        tracing::debug!(effect = name, "effect");

        if i == last {
            let input = match current {
                Some(id) => slots.get(id)?,
                None => source,
            };
            let r = effect.render(renderer, frame, input, destination)?;
            report.effects.push((name, r));
            break;
        }

        let next = slots.acquire(renderer, source.desc(), FilterMode::Bilinear)?;
        let r = match current {
            Some(id) => {
                let (input, output) = slots.pair(id, next)?;
                effect.render(renderer, frame, input, output)?
            }
            None => effect.render(renderer, frame, source, slots.get_mut(next)?)?,
        };
        report.effects.push((name, r));
        if let Some(id) = current {
            slots.release(renderer, id);
        }
        current = Some(next);
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/effects/stack.rs"]
mod tests;
