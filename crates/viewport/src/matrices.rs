//! Matrix pipeline: view-projection, pixel (un)projection and the camera
//! vectors, derived purely from a view matrix, a projection matrix and the
//! window size.
//!
//! Convention: `glam` column vectors, so `a * b` applies `b` first.

use glam::{DMat4, DVec3};
use tracing::warn;

use crate::error::ViewportError;

/// Inverse of `m`, or [`ViewportError::SingularMatrix`] naming `which`.
///
/// Singular means a zero or non-finite determinant, or an inverse with a
/// non-finite element.
pub fn invert(m: &DMat4, which: &'static str) -> Result<DMat4, ViewportError> {
    let det = m.determinant();
    if det == 0.0 || !det.is_finite() {
        return Err(ViewportError::SingularMatrix(which));
    }
    let inverse = m.inverse();
    if !inverse.is_finite() {
        return Err(ViewportError::SingularMatrix(which));
    }
    Ok(inverse)
}

/// Maps normalized device coordinates to window pixels:
/// `scale(w/2, -h/2, 1) * translation(1, -1, 0)`.
pub fn ndc_to_pixel_matrix(width: f64, height: f64) -> DMat4 {
    DMat4::from_scale(DVec3::new(width / 2.0, -height / 2.0, 1.0))
        * DMat4::from_translation(DVec3::new(1.0, -1.0, 0.0))
}

/// Homogeneous transform of a point followed by the perspective divide.
///
/// `None` when `w` is zero or any component ends up non-finite.
pub fn transform_point(m: &DMat4, p: DVec3) -> Option<DVec3> {
    let v = *m * p.extend(1.0);
    if v.w == 0.0 || !v.is_finite() {
        return None;
    }
    let out = v.truncate() / v.w;
    out.is_finite().then_some(out)
}

/// Camera frame decomposed from an inverse view matrix.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraVectors {
    /// Eye position (translation column).
    pub position: DVec3,
    /// Unit forward vector (the camera looks down its local -Z).
    pub direction: DVec3,
    /// Unit up vector (local +Y).
    pub up: DVec3,
}

impl CameraVectors {
    pub fn from_view_inverse(view_inverse: &DMat4) -> Self {
        Self {
            position: view_inverse.w_axis.truncate(),
            direction: view_inverse
                .transform_vector3(DVec3::NEG_Z)
                .normalize_or_zero(),
            up: view_inverse.transform_vector3(DVec3::Y).normalize_or_zero(),
        }
    }
}

/// Every matrix derived from a resolved view and projection.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MatrixPipeline {
    pub view_projection: DMat4,
    /// Falls back to the view matrix itself when that is singular.
    pub view_inverse: DMat4,
    pub view_invertible: bool,
    pub camera: CameraVectors,
    pub ndc_to_pixel: DMat4,
    pub pixel_projection: DMat4,
    /// `None` when the pixel projection is singular.
    pub pixel_unprojection: Option<DMat4>,
}

impl MatrixPipeline {
    /// Build the pipeline. Singular inputs never fail; they are logged once
    /// here and surface as `view_invertible == false` or a missing
    /// `pixel_unprojection`.
    pub fn build(view: &DMat4, projection: &DMat4, width: f64, height: f64) -> Self {
        let view_projection = *projection * *view;

        let (view_inverse, view_invertible) = match invert(view, "view matrix") {
            Ok(inverse) => (inverse, true),
            Err(err) => {
                warn!(%err, "falling back to the uninverted view matrix for camera vectors");
                (*view, false)
            }
        };
        let camera = CameraVectors::from_view_inverse(&view_inverse);

        let ndc_to_pixel = ndc_to_pixel_matrix(width, height);
        let pixel_projection = ndc_to_pixel * view_projection;
        let pixel_unprojection = match invert(&pixel_projection, "pixel projection matrix") {
            Ok(inverse) => Some(inverse),
            Err(err) => {
                warn!(%err, width, height, "unproject is disabled for this viewport");
                None
            }
        };

        Self {
            view_projection,
            view_inverse,
            view_invertible,
            camera,
            ndc_to_pixel,
            pixel_projection,
            pixel_unprojection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CameraVectors, MatrixPipeline, invert, ndc_to_pixel_matrix, transform_point};
    use crate::error::ViewportError;

    use foundation::math::mat4_approx_eq;
    use glam::{DMat4, DVec3};

    fn assert_vec_close(a: DVec3, b: DVec3, eps: f64) {
        let diff = (a - b).abs().max_element();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn perspective() -> DMat4 {
        DMat4::perspective_rh_gl(75f64.to_radians(), 800.0 / 600.0, 0.1, 1000.0)
    }

    #[test]
    fn ndc_corners_map_to_window_corners() {
        let m = ndc_to_pixel_matrix(800.0, 600.0);
        assert_vec_close(m.transform_point3(DVec3::new(-1.0, 1.0, 0.0)), DVec3::ZERO, 1e-12);
        assert_vec_close(
            m.transform_point3(DVec3::new(1.0, -1.0, 0.0)),
            DVec3::new(800.0, 600.0, 0.0),
            1e-12,
        );
        assert_vec_close(
            m.transform_point3(DVec3::new(0.0, 0.0, 0.5)),
            DVec3::new(400.0, 300.0, 0.5),
            1e-12,
        );
    }

    #[test]
    fn invert_rejects_singular_matrices() {
        assert_eq!(invert(&DMat4::IDENTITY, "identity"), Ok(DMat4::IDENTITY));
        assert_eq!(
            invert(&DMat4::ZERO, "zero"),
            Err(ViewportError::SingularMatrix("zero"))
        );
        let flattened = DMat4::from_scale(DVec3::new(1.0, 1.0, 0.0));
        assert!(invert(&flattened, "flattened").is_err());
        let mut poisoned = DMat4::IDENTITY;
        poisoned.x_axis.x = f64::NAN;
        assert!(invert(&poisoned, "poisoned").is_err());
    }

    #[test]
    fn transform_point_divides_by_w() {
        let m = DMat4::from_scale(DVec3::splat(2.0));
        assert_eq!(
            transform_point(&m, DVec3::new(1.0, 2.0, 3.0)),
            Some(DVec3::new(2.0, 4.0, 6.0))
        );

        // A point on the eye plane has w == 0 after a perspective projection.
        assert_eq!(transform_point(&perspective(), DVec3::ZERO), None);

        let p = transform_point(&perspective(), DVec3::new(0.0, 0.0, -10.0)).unwrap();
        assert!(p.z > -1.0 && p.z < 1.0);
    }

    #[test]
    fn pixel_matrices_are_inverse_pair() {
        let view = DMat4::look_at_rh(DVec3::new(3.0, -4.0, 20.0), DVec3::ZERO, DVec3::Y);
        let pipeline = MatrixPipeline::build(&view, &perspective(), 800.0, 600.0);
        let inverse = pipeline.pixel_unprojection.unwrap();
        assert!(mat4_approx_eq(
            &(inverse * pipeline.pixel_projection),
            &DMat4::IDENTITY
        ));
        assert!(mat4_approx_eq(
            &pipeline.view_projection,
            &(perspective() * view)
        ));
    }

    #[test]
    fn camera_vectors_come_from_view_inverse() {
        let eye = DVec3::new(0.0, 0.0, 10.0);
        let view = DMat4::look_at_rh(eye, DVec3::ZERO, DVec3::Y);
        let pipeline = MatrixPipeline::build(&view, &perspective(), 800.0, 600.0);
        assert!(pipeline.view_invertible);
        assert_vec_close(pipeline.camera.position, eye, 1e-12);
        assert_vec_close(pipeline.camera.direction, DVec3::NEG_Z, 1e-12);
        assert_vec_close(pipeline.camera.up, DVec3::Y, 1e-12);
    }

    #[test]
    fn singular_view_falls_back_observably() {
        let view = DMat4::from_scale(DVec3::new(1.0, 0.0, 1.0));
        let pipeline = MatrixPipeline::build(&view, &perspective(), 800.0, 600.0);
        assert!(!pipeline.view_invertible);
        assert_eq!(pipeline.view_inverse, view);
        assert_eq!(pipeline.camera, CameraVectors::from_view_inverse(&view));
        assert!(pipeline.pixel_unprojection.is_none());
    }

    #[test]
    fn singular_projection_leaves_unprojection_absent() {
        let pipeline = MatrixPipeline::build(&DMat4::IDENTITY, &DMat4::ZERO, 800.0, 600.0);
        assert!(pipeline.view_invertible);
        assert!(pipeline.pixel_unprojection.is_none());
    }
}
