use crate::foundation::core::{FilterMode, Image, Vec2, Vec4};

/// Clamp-to-edge texture sampling over an [`Image`], honoring its filter mode.
#[derive(Clone, Copy, Debug)]
pub struct Sampler<'a> {
    image: &'a Image,
}

impl<'a> Sampler<'a> {
    pub fn new(image: &'a Image) -> Self {
        Self { image }
    }

    pub fn image(&self) -> &'a Image {
        self.image
    }

    /// Size of one texel in uv units.
    pub fn texel_size(&self) -> Vec2 {
        Vec2::new(
            1.0 / self.image.width() as f32,
            1.0 / self.image.height() as f32,
        )
    }

    /// Sample at `uv`, where `(0, 0)` is the top-left corner and `(1, 1)` the bottom-right.
    pub fn sample(&self, uv: Vec2) -> Vec4 {
        match self.image.filter() {
            FilterMode::Nearest => self.sample_nearest(uv),
            FilterMode::Bilinear => self.sample_bilinear(uv),
        }
    }

    fn sample_nearest(&self, uv: Vec2) -> Vec4 {
        let x = clamp_index((uv.x * self.image.width() as f32).floor(), self.image.width());
        let y = clamp_index((uv.y * self.image.height() as f32).floor(), self.image.height());
        self.image.load(x, y)
    }

    fn sample_bilinear(&self, uv: Vec2) -> Vec4 {
        let (w, h) = (self.image.width(), self.image.height());
        let px = uv.x * w as f32 - 0.5;
        let py = uv.y * h as f32 - 0.5;
        let fx = px.floor();
        let fy = py.floor();
        let tx = px - fx;
        let ty = py - fy;

        let x0 = clamp_index(fx, w);
        let x1 = clamp_index(fx + 1.0, w);
        let y0 = clamp_index(fy, h);
        let y1 = clamp_index(fy + 1.0, h);

        let top = self.image.load(x0, y0) * (1.0 - tx) + self.image.load(x1, y0) * tx;
        let bottom = self.image.load(x0, y1) * (1.0 - tx) + self.image.load(x1, y1) * tx;
        top * (1.0 - ty) + bottom * ty
    }
}

fn clamp_index(v: f32, len: u32) -> u32 {
    if !v.is_finite() || v <= 0.0 {
        return 0;
    }
    (v as u32).min(len - 1)
}

#[cfg(test)]
#[path = "../../tests/unit/program/sampler.rs"]
mod tests;
