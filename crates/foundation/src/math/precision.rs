//! Precision policies.
//!
//! This module is intentionally small and conservative. It provides:
//! - A camera-relative `f32` conversion for GPU-bound positions (`CameraRelative`).
//! - Tolerant comparisons for matrices whose magnitudes span many orders
//!   (`approx_eq`, `mat4_approx_eq`).

use glam::{DMat4, DVec3};

/// Relative tolerance used by [`approx_eq`], matching gl-matrix's `EPSILON`.
pub const EPSILON: f64 = 1e-6;

/// GPU-friendly, camera-relative position in `f32`.
///
/// Convention: positions sent to the GPU should typically be expressed as
/// `world_pos - camera_origin`, then cast to `f32`.
pub type CameraRelativeF32 = [f32; 3];

/// Camera-relative precision model.
///
/// Store a high-precision `origin` (typically the viewport center), and
/// express all GPU positions relative to it. At zoom 20 world coordinates
/// reach ~5e8, far beyond what an `f32` resolves to a pixel.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraRelative {
    pub origin: DVec3,
}

impl CameraRelative {
    pub fn new(origin: DVec3) -> Self {
        Self { origin }
    }

    /// Convert a world-space point (f64) to a camera-relative `f32` offset.
    #[inline]
    pub fn to_f32(self, world: DVec3) -> CameraRelativeF32 {
        (world - self.origin).as_vec3().to_array()
    }
}

/// Scalar comparison with a tolerance relative to the operands' magnitude.
///
/// `|a - b| <= EPSILON * max(1, |a|, |b|)`
#[inline]
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON * 1.0_f64.max(a.abs()).max(b.abs())
}

/// Element-wise [`approx_eq`] over two matrices.
pub fn mat4_approx_eq(a: &DMat4, b: &DMat4) -> bool {
    a.to_cols_array()
        .iter()
        .zip(b.to_cols_array().iter())
        .all(|(x, y)| approx_eq(*x, *y))
}
