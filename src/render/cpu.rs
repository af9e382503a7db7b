use rayon::prelude::*;

use crate::foundation::core::{FilterMode, Image, ImageDesc, Vec2, Vec4, encode_texel};
use crate::foundation::error::{ScreenFxError, ScreenFxResult};
use crate::program::{Fragment, FilterProgram, PassParams, Sampler};
use crate::render::backend::Renderer;
use crate::render::scratch_pool::{ScratchPool, ScratchPoolOpts, ScratchPoolStats};

/// Options for the CPU reference renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CpuRendererOpts {
    pub pool: ScratchPoolOpts,
    /// Shade rows on the rayon global pool. Each pass still completes before `run_pass`
    /// returns.
    pub parallel_rows: bool,
}

/// Reference [`Renderer`] that evaluates passes on the CPU, one fragment per output texel.
pub struct CpuRenderer {
    opts: CpuRendererOpts,
    pool: ScratchPool,
    passes_run: u64,
    copies: u64,
}

impl CpuRenderer {
    pub fn new(opts: CpuRendererOpts) -> Self {
        Self {
            opts,
            pool: ScratchPool::new(opts.pool),
            passes_run: 0,
            copies: 0,
        }
    }

    pub fn pool_stats(&self) -> ScratchPoolStats {
        self.pool.stats()
    }

    /// Reset per-call counters (acquisitions, releases, passes, copies).
    pub fn reset_counters(&mut self) {
        self.pool.reset_counters();
        self.passes_run = 0;
        self.copies = 0;
    }

    pub fn passes_run(&self) -> u64 {
        self.passes_run
    }

    pub fn copies(&self) -> u64 {
        self.copies
    }

    fn shade_into(&self, output: &mut Image, shader: &(dyn Fn(Vec2) -> Vec4 + Send + Sync)) {
        let desc = output.desc();
        let (w, h) = (desc.width, desc.height);
        let format = desc.format;
        let row_bytes = (w as usize) * format.bytes_per_pixel();
        let bpp = format.bytes_per_pixel();

        let shade_row = |(y, row): (usize, &mut [u8])| {
            let v = (y as f32 + 0.5) / h as f32;
            for (x, px) in row.chunks_exact_mut(bpp).enumerate() {
                let u = (x as f32 + 0.5) / w as f32;
                encode_texel(format, shader(Vec2::new(u, v)), px);
            }
        };

        let data = output.data_mut();
        if self.opts.parallel_rows {
            data.par_chunks_mut(row_bytes).enumerate().for_each(shade_row);
        } else {
            data.chunks_mut(row_bytes).enumerate().for_each(shade_row);
        }
    }
}

impl Default for CpuRenderer {
    fn default() -> Self {
        Self::new(CpuRendererOpts::default())
    }
}

impl Renderer for CpuRenderer {
    fn acquire_scratch(&mut self, desc: ImageDesc, filter: FilterMode) -> ScreenFxResult<Image> {
        self.pool.acquire(desc, filter)
    }

    fn release_scratch(&mut self, image: Image) {
        self.pool.release(image);
    }

    fn run_pass(
        &mut self,
        program: &dyn FilterProgram,
        pass: usize,
        input: &Image,
        output: &mut Image,
        params: &PassParams<'_>,
    ) -> ScreenFxResult<()> {
        let Some(info) = program.passes().get(pass) else {
            return Err(ScreenFxError::render(format!(
                "program '{}' has no pass {pass}",
                program.name()
            )));
        };
        tracing::trace!(
            program = program.name(),
            pass = info.name,
            width = output.width(),
            height = output.height(),
            "run pass"
        );

        let bound = program.bind(pass, params)?;
        let main_tex = Sampler::new(input);
        self.shade_into(output, &|uv| bound(&Fragment { uv, main_tex }));
        self.passes_run = self.passes_run.saturating_add(1);
        Ok(())
    }

    fn copy(&mut self, input: &Image, output: &mut Image) -> ScreenFxResult<()> {
        self.copies = self.copies.saturating_add(1);
        if input.desc() == output.desc() {
            output.data_mut().copy_from_slice(input.data());
            return Ok(());
        }
        let sampler = Sampler::new(input);
        self.shade_into(output, &|uv| sampler.sample(uv));
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
