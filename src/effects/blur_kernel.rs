use crate::foundation::core::{Vec2, Vec4};
use crate::foundation::error::{ScreenFxError, ScreenFxResult};
use crate::program::Sampler;

/// Normalized 1D Gaussian weights for offsets `0..=radius` (center first).
pub fn gaussian_weights(radius: u32, sigma: f32) -> ScreenFxResult<Vec<f32>> {
    if radius == 0 {
        return Ok(vec![1.0]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(ScreenFxError::validation("blur sigma must be > 0"));
    }

    let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
    let half: Vec<f64> = (0..=radius)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = half[0] + 2.0 * half[1..].iter().sum::<f64>();
    if sum <= 0.0 {
        return Err(ScreenFxError::validation("gaussian kernel sum is zero"));
    }
    Ok(half.iter().map(|w| (w / sum) as f32).collect())
}

/// The 5-tap kernel the blur passes use: radius 2, sigma 1 (0.4026, 0.2442, 0.0545).
pub(crate) const FIVE_TAP: [f32; 3] = [0.402_619_5, 0.244_201_34, 0.054_488_685];

/// One separable blur tap set along `axis` (in texels), spaced `blur_size` texels apart.
/// Output is opaque.
pub(crate) fn blur_1d(tex: &Sampler<'_>, uv: Vec2, axis: Vec2, blur_size: f32) -> Vec4 {
    let step = axis * tex.texel_size() * blur_size;
    let mut sum = tex.sample(uv) * FIVE_TAP[0];
    for (i, &w) in FIVE_TAP.iter().enumerate().skip(1) {
        let offset = step * i as f32;
        sum += tex.sample(uv + offset) * w;
        sum += tex.sample(uv - offset) * w;
    }
    sum.truncate().extend(1.0)
}

#[cfg(test)]
#[path = "../../tests/unit/effects/blur_kernel.rs"]
mod tests;
