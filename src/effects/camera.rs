use crate::foundation::core::{Mat4, Vec3, Vec4};
use crate::foundation::error::{ScreenFxError, ScreenFxResult};

/// A perspective camera as seen by depth-based effects.
///
/// View space is right-handed looking down `-Z`; clip space follows the OpenGL convention
/// (NDC depth in `-1..=1`). Depth textures store device depth `ndc_z * 0.5 + 0.5`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Camera {
    pub position: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            forward: Vec3::NEG_Z,
            up: Vec3::Y,
            fov_y_deg: 60.0,
            aspect: 16.0 / 9.0,
            near: 0.3,
            far: 1000.0,
        }
    }
}

/// Orthonormal camera axes in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraBasis {
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
}

impl Camera {
    pub fn validate(&self) -> ScreenFxResult<()> {
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(ScreenFxError::validation(format!(
                "camera clip planes must satisfy 0 < near < far, got near={} far={}",
                self.near, self.far
            )));
        }
        if !(self.fov_y_deg > 0.0 && self.fov_y_deg < 180.0) || !(self.aspect > 0.0) {
            return Err(ScreenFxError::validation(
                "camera fov must be in (0, 180) degrees and aspect > 0",
            ));
        }
        if self.forward.length_squared() == 0.0
            || self.forward.cross(self.up).length_squared() == 0.0
        {
            return Err(ScreenFxError::validation(
                "camera forward must be non-zero and not parallel to up",
            ));
        }
        Ok(())
    }

    pub fn basis(&self) -> CameraBasis {
        let forward = self.forward.normalize();
        let right = forward.cross(self.up).normalize();
        let up = right.cross(forward);
        CameraBasis { forward, right, up }
    }

    pub fn view_matrix(&self) -> Mat4 {
        let b = self.basis();
        Mat4::look_to_rh(self.position, b.forward, b.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y_deg.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Distance along the view axis for a stored device depth.
    pub fn linear_eye_depth(&self, device_depth: f32) -> f32 {
        linear_eye_depth(device_depth, self.near, self.far)
    }

    /// Device depth a depth texture would hold for `world`.
    pub fn device_depth(&self, world: Vec3) -> f32 {
        let clip = self.view_projection() * world.extend(1.0);
        (clip.z / clip.w) * 0.5 + 0.5
    }

    /// Rays from the camera through the four near-plane corners, scaled so that
    /// `position + ray * linear_eye_depth` lands on the surface.
    ///
    /// Rows are bottom-left, bottom-right, top-right, top-left.
    pub fn frustum_corner_rays(&self) -> Mat4 {
        let b = self.basis();
        let half_height = self.near * (self.fov_y_deg.to_radians() * 0.5).tan();
        let to_right = b.right * half_height * self.aspect;
        let to_top = b.up * half_height;
        let center = b.forward * self.near;

        let top_left = center + to_top - to_right;
        let scale = top_left.length() / self.near;
        let ray = |v: Vec3| (v.normalize() * scale).extend(0.0);

        let bottom_left = ray(center - to_top - to_right);
        let bottom_right = ray(center - to_top + to_right);
        let top_right = ray(center + to_top + to_right);
        let top_left = ray(top_left);

        Mat4::from_cols(bottom_left, bottom_right, top_right, top_left).transpose()
    }
}

pub(crate) fn linear_eye_depth(device_depth: f32, near: f32, far: f32) -> f32 {
    let ndc_z = device_depth * 2.0 - 1.0;
    (2.0 * near * far) / ((far + near) - ndc_z * (far - near))
}

/// Pack near/far into the vector layout the depth passes read.
pub(crate) fn clip_planes(camera: &Camera) -> Vec4 {
    Vec4::new(camera.near, camera.far, 0.0, 0.0)
}

#[cfg(test)]
#[path = "../../tests/unit/effects/camera.rs"]
mod tests;
