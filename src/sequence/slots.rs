use crate::foundation::core::{FilterMode, Image, ImageDesc};
use crate::foundation::error::{ScreenFxError, ScreenFxResult};
use crate::render::backend::Renderer;

/// Handle to a scratch image held by [`ScratchSlots`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SlotId(usize);

/// Scratch images held by one sequence call.
///
/// Every image acquired through here is either released explicitly or by
/// [`ScratchSlots::release_all`], which callers run on every exit path.
#[derive(Default)]
pub(crate) struct ScratchSlots {
    images: Vec<Option<Image>>,
    acquisitions: u32,
    releases: u32,
}

impl ScratchSlots {
    pub(crate) fn acquire<R: Renderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        desc: ImageDesc,
        filter: FilterMode,
    ) -> ScreenFxResult<SlotId> {
        let image = renderer.acquire_scratch(desc, filter)?;
        self.acquisitions += 1;
        let idx = match self.images.iter().position(Option::is_none) {
            Some(free) => {
                self.images[free] = Some(image);
                free
            }
            None => {
                self.images.push(Some(image));
                self.images.len() - 1
            }
        };
        Ok(SlotId(idx))
    }

    pub(crate) fn release<R: Renderer + ?Sized>(&mut self, renderer: &mut R, id: SlotId) {
        if let Some(image) = self.images.get_mut(id.0).and_then(Option::take) {
            renderer.release_scratch(image);
            self.releases += 1;
        }
    }

    pub(crate) fn release_all<R: Renderer + ?Sized>(&mut self, renderer: &mut R) {
        for slot in &mut self.images {
            if let Some(image) = slot.take() {
                renderer.release_scratch(image);
                self.releases += 1;
            }
        }
    }

    pub(crate) fn get(&self, id: SlotId) -> ScreenFxResult<&Image> {
        self.images
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or_else(|| ScreenFxError::render("scratch slot is empty"))
    }

    pub(crate) fn get_mut(&mut self, id: SlotId) -> ScreenFxResult<&mut Image> {
        self.images
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| ScreenFxError::render("scratch slot is empty"))
    }

    /// Borrow one slot for reading and another for writing.
    pub(crate) fn pair(
        &mut self,
        read: SlotId,
        write: SlotId,
    ) -> ScreenFxResult<(&Image, &mut Image)> {
        if read == write {
            return Err(ScreenFxError::render("pass cannot read and write the same scratch"));
        }
        let (r, w) = if read.0 < write.0 {
            let (lo, hi) = self.images.split_at_mut(write.0);
            (lo.get(read.0), hi.first_mut())
        } else {
            let (lo, hi) = self.images.split_at_mut(read.0);
            (hi.first(), lo.get_mut(write.0))
        };
        match (r.and_then(Option::as_ref), w.and_then(Option::as_mut)) {
            (Some(r), Some(w)) => Ok((r, w)),
            _ => Err(ScreenFxError::render("scratch slot is empty")),
        }
    }

    pub(crate) fn live(&self) -> usize {
        self.images.iter().filter(|s| s.is_some()).count()
    }

    pub(crate) fn acquisitions(&self) -> u32 {
        self.acquisitions
    }

    pub(crate) fn releases(&self) -> u32 {
        self.releases
    }
}
