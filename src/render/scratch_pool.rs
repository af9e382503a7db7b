use std::collections::HashMap;

use crate::foundation::core::{FilterMode, Image, ImageDesc};
use crate::foundation::error::{ScreenFxError, ScreenFxResult};

/// Pool configuration for scratch images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScratchPoolOpts {
    /// Maximum bytes retained across all buckets for reuse.
    pub max_pool_bytes: usize,
    /// Maximum number of retained images per `(w, h, format)` bucket.
    pub max_images_per_bucket: usize,
    /// Maximum bytes of scratch handed out and not yet released. Acquisitions beyond this
    /// budget fail with [`ScreenFxError::ResourceExhausted`].
    pub max_live_bytes: usize,
}

impl Default for ScratchPoolOpts {
    fn default() -> Self {
        Self {
            max_pool_bytes: 256 * 1024 * 1024,
            max_images_per_bucket: 8,
            max_live_bytes: 512 * 1024 * 1024,
        }
    }
}

/// Counters exposed for diagnostics and lifecycle checks.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScratchPoolStats {
    pub retained_images: usize,
    pub retained_bytes: usize,
    pub live_images: usize,
    pub live_bytes: usize,
    pub peak_live_images: usize,
    pub acquisitions: u64,
    pub releases: u64,
    pub alloc_images: u64,
    pub alloc_bytes: u64,
    pub dropped_on_release: u64,
}

struct Bucket {
    images: Vec<Image>,
}

/// Bounded pooled allocator for scratch images, keyed by `(width, height, format)`.
///
/// Acquire/release happens at pass granularity, never per pixel. Contents of a reused image
/// are whatever the previous holder left; passes overwrite every texel.
pub struct ScratchPool {
    opts: ScratchPoolOpts,
    stats: ScratchPoolStats,
    bucket_idx_by_key: HashMap<ImageDesc, usize>,
    buckets: Vec<Bucket>,
}

impl ScratchPool {
    pub fn new(opts: ScratchPoolOpts) -> Self {
        Self {
            opts,
            stats: ScratchPoolStats::default(),
            bucket_idx_by_key: HashMap::new(),
            buckets: Vec::new(),
        }
    }

    pub fn opts(&self) -> ScratchPoolOpts {
        self.opts
    }

    pub fn stats(&self) -> ScratchPoolStats {
        self.stats.clone()
    }

    pub fn acquire(&mut self, desc: ImageDesc, filter: FilterMode) -> ScreenFxResult<Image> {
        let bytes = desc.byte_len();
        if self.stats.live_bytes.saturating_add(bytes) > self.opts.max_live_bytes {
            return Err(ScreenFxError::resource_exhausted(format!(
                "scratch {}x{} {:?} needs {bytes} bytes, {} of {} already live",
                desc.width,
                desc.height,
                desc.format,
                self.stats.live_bytes,
                self.opts.max_live_bytes
            )));
        }

        let image = match self.take_retained(desc) {
            Some(img) => img,
            None => {
                let img = Image::new(desc)?;
                self.stats.alloc_images = self.stats.alloc_images.saturating_add(1);
                self.stats.alloc_bytes = self.stats.alloc_bytes.saturating_add(bytes as u64);
                img
            }
        };

        self.stats.acquisitions = self.stats.acquisitions.saturating_add(1);
        self.stats.live_images = self.stats.live_images.saturating_add(1);
        self.stats.live_bytes = self.stats.live_bytes.saturating_add(bytes);
        self.stats.peak_live_images = self.stats.peak_live_images.max(self.stats.live_images);
        tracing::trace!(
            width = desc.width,
            height = desc.height,
            live = self.stats.live_images,
            "scratch acquired"
        );
        Ok(image.with_filter(filter))
    }

    pub fn release(&mut self, image: Image) {
        let desc = image.desc();
        let bytes = desc.byte_len();
        self.stats.releases = self.stats.releases.saturating_add(1);
        self.stats.live_images = self.stats.live_images.saturating_sub(1);
        self.stats.live_bytes = self.stats.live_bytes.saturating_sub(bytes);
        tracing::trace!(
            width = desc.width,
            height = desc.height,
            live = self.stats.live_images,
            "scratch released"
        );

        if self.opts.max_pool_bytes == 0 || self.opts.max_images_per_bucket == 0 {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        if self.stats.retained_bytes.saturating_add(bytes) > self.opts.max_pool_bytes {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        let bi = match self.bucket_idx_by_key.get(&desc).copied() {
            Some(i) => i,
            None => {
                let i = self.buckets.len();
                self.buckets.push(Bucket { images: Vec::new() });
                self.bucket_idx_by_key.insert(desc, i);
                i
            }
        };

        let bucket = &mut self.buckets[bi];
        if bucket.images.len() >= self.opts.max_images_per_bucket {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        bucket.images.push(image);
        self.stats.retained_images = self.stats.retained_images.saturating_add(1);
        self.stats.retained_bytes = self.stats.retained_bytes.saturating_add(bytes);
    }

    /// Reset the per-call counters (acquisitions, releases, peak). Retained images stay.
    pub fn reset_counters(&mut self) {
        self.stats.acquisitions = 0;
        self.stats.releases = 0;
        self.stats.peak_live_images = self.stats.live_images;
    }

    fn take_retained(&mut self, desc: ImageDesc) -> Option<Image> {
        let &bi = self.bucket_idx_by_key.get(&desc)?;
        let img = self.buckets[bi].images.pop()?;
        self.stats.retained_images = self.stats.retained_images.saturating_sub(1);
        self.stats.retained_bytes = self.stats.retained_bytes.saturating_sub(desc.byte_len());
        Some(img)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/scratch_pool.rs"]
mod tests;
