use glam::{Vec3, Vec4};

/// Rec. 709 luminance weights, matching the grading and bloom passes.
pub const LUMINANCE_WEIGHTS: Vec3 = Vec3::new(0.2125, 0.7154, 0.0721);

pub fn luminance(rgb: Vec3) -> f32 {
    rgb.dot(LUMINANCE_WEIGHTS)
}

pub fn saturate(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

pub fn lerp(a: Vec4, b: Vec4, t: f32) -> Vec4 {
    a + (b - a) * t
}

/// Wrap `t` into `[0, length)`, the way a looping parameter animation does.
pub fn repeat(t: f32, length: f32) -> f32 {
    if length <= 0.0 || !t.is_finite() {
        return 0.0;
    }
    let r = t - (t / length).floor() * length;
    r.clamp(0.0, length)
}

/// FNV-1a, used for deterministic procedural textures.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Fnv1a64(u64);

impl Fnv1a64 {
    pub(crate) const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01B3;

    pub(crate) fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub(crate) fn write_u64(&mut self, v: u64) {
        for b in v.to_le_bytes() {
            self.0 ^= u64::from(b);
            self.0 = self.0.wrapping_mul(Self::PRIME);
        }
    }

    pub(crate) fn finish(self) -> u64 {
        self.0
    }
}

/// Stable per-lattice-point hash in `0..=1`.
pub(crate) fn hash01(seed: u64, x: u32, y: u32) -> f32 {
    let mut h = Fnv1a64::new(seed ^ Fnv1a64::OFFSET_BASIS);
    h.write_u64(u64::from(x));
    h.write_u64(u64::from(y));
    (h.finish() & 0xFFFF) as f32 / 65535.0
}

pub fn smoothstep(a: f32, b: f32, x: f32) -> f32 {
    if x <= a {
        return 0.0;
    }
    if x >= b {
        return 1.0;
    }
    let t = (x - a) / (b - a);
    (t * t * (3.0 - 2.0 * t)).clamp(0.0, 1.0)
}

pub(crate) fn decode_unorm8(v: u8) -> f32 {
    f32::from(v) / 255.0
}

pub(crate) fn encode_unorm8(v: f32) -> u8 {
    if !v.is_finite() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
