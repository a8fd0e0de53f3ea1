//! Sphere placement and screen projection.
//!
//! Both functions are pure: placement depends only on the clicked point and
//! the sphere dimensions, projection only on the point, the camera transform
//! and the viewport. Nothing here caches camera state, so callers recompute
//! projections after every resize or camera move.

use glam::{Mat4, Vec2, Vec3};

use crate::error::GeometryError;

/// Pixel dimensions of the surface the panorama is drawn into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height.max(1.0)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }
}

/// Right-handed perspective camera.
#[derive(Clone, Debug)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub aspect: f32,
    pub fovy_radians: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera {
    /// Camera sitting at the sphere center, rotated by `yaw` around +Y and
    /// `pitch` around the camera's right axis. `yaw = pitch = 0` looks down -Z.
    pub fn panorama(yaw: f32, pitch: f32, aspect: f32) -> Self {
        let forward = Vec3::new(
            -yaw.sin() * pitch.cos(),
            pitch.sin(),
            -yaw.cos() * pitch.cos(),
        );
        Self {
            eye: Vec3::ZERO,
            target: forward,
            up: Vec3::Y,
            aspect,
            fovy_radians: 80f32.to_radians(),
            znear: 0.05,
            zfar: 1000.0,
        }
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy_radians, self.aspect, self.znear, self.zfar)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    /// World to clip transform consumed by [`screen_position`].
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

/// Pushes a clicked point onto the sphere of radius `radius - inset`.
///
/// The magnitude of `raw_point` is irrelevant, only its direction is kept.
/// Zero and non-finite directions are rejected instead of producing NaN.
pub fn placement_position(raw_point: Vec3, radius: f32, inset: f32) -> Result<Vec3, GeometryError> {
    let effective = radius - inset;
    if !effective.is_finite() || effective <= 0.0 {
        return Err(GeometryError::InvalidRadius { radius, inset });
    }
    let direction = raw_point
        .try_normalize()
        .ok_or(GeometryError::DegenerateDirection)?;
    Ok(direction * effective)
}

/// Maps a world-space point to viewport pixels, Y growing downward.
pub fn screen_position(point: Vec3, camera_transform: Mat4, viewport: Viewport) -> Vec2 {
    let ndc = camera_transform.project_point3(point);
    Vec2::new(
        (ndc.x * 0.5 + 0.5) * viewport.width,
        (-ndc.y * 0.5 + 0.5) * viewport.height,
    )
}
