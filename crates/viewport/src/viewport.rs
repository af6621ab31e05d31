//! The immutable [`Viewport`] value and its projection API.
//!
//! Pixel convention: the pixel matrices put the origin at the top-left
//! corner of the window with y growing downwards. `top_left: true` in the
//! options flips that to `y' = height - y`.

use std::sync::Arc;

use foundation::math::{CameraRelative, DistanceScales, distance_scales, mat4_approx_eq};
use glam::{DMat4, DVec2, DVec3, DVec4};

use crate::error::ViewportError;
use crate::flat::{FlatProjection, IdentityProjection, WebMercatorProjection};
use crate::frustum::Frustum;
use crate::matrices::{MatrixPipeline, invert, transform_point};
use crate::props::{DEFAULT_ID, ViewportProps};
use crate::resolve::{CameraState, resolve_camera};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ProjectOptions {
    pub top_left: bool,
}

#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct UnprojectOptions {
    pub top_left: bool,
    /// World z of the plane the pixel ray is intersected with. A third
    /// input component takes precedence.
    pub target_z: Option<f64>,
}

/// Matrices for drawing one model, as returned by [`Viewport::matrices`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewportMatrices {
    pub view_matrix: DMat4,
    pub projection_matrix: DMat4,
    pub view_projection_matrix: DMat4,
    pub model_view_projection_matrix: DMat4,
    pub pixel_projection_matrix: DMat4,
    pub pixel_unprojection_matrix: Option<DMat4>,
    pub width: f64,
    pub height: f64,
    pub scale: f64,
}

/// One fully resolved camera and projection state.
///
/// Built once per camera change and never mutated; replace it instead.
#[derive(Debug, Clone)]
pub struct Viewport {
    id: String,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    focal_distance: f64,
    state: CameraState,
    pipeline: MatrixPipeline,
    flat_projection: Arc<dyn FlatProjection>,
}

impl Viewport {
    /// Resolve `props` into a viewport, using web mercator when a finite
    /// longitude and latitude are given and the identity otherwise.
    pub fn new(props: ViewportProps) -> Result<Self, ViewportError> {
        let hook: Arc<dyn FlatProjection> = if props.is_geospatial() {
            Arc::new(WebMercatorProjection)
        } else {
            Arc::new(IdentityProjection)
        };
        Self::with_flat_projection(props, hook)
    }

    pub fn with_flat_projection(
        props: ViewportProps,
        flat_projection: Arc<dyn FlatProjection>,
    ) -> Result<Self, ViewportError> {
        let width = props.resolved_width();
        let height = props.resolved_height();
        let state = resolve_camera(&props, flat_projection.as_ref())?;
        let pipeline = MatrixPipeline::build(
            &state.view_matrix,
            &state.projection_matrix,
            width,
            height,
        );

        Ok(Self {
            id: props.id.unwrap_or_else(|| DEFAULT_ID.to_string()),
            x: props.x,
            y: props.y,
            width,
            height,
            focal_distance: props.focal_distance,
            state,
            pipeline,
            flat_projection,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn is_geospatial(&self) -> bool {
        self.state.is_geospatial
    }

    pub fn zoom(&self) -> f64 {
        self.state.zoom
    }

    pub fn scale(&self) -> f64 {
        self.state.scale
    }

    pub fn distance_scales(&self) -> &DistanceScales {
        &self.state.distance_scales
    }

    pub fn longitude(&self) -> Option<f64> {
        self.state.longitude
    }

    pub fn latitude(&self) -> Option<f64> {
        self.state.latitude
    }

    pub fn position(&self) -> DVec3 {
        self.state.position
    }

    pub fn meter_offset(&self) -> DVec3 {
        self.state.meter_offset
    }

    pub fn model_matrix(&self) -> Option<DMat4> {
        self.state.model_matrix
    }

    /// World-space center.
    pub fn center(&self) -> DVec3 {
        self.state.center
    }

    pub fn focal_distance(&self) -> f64 {
        self.focal_distance
    }

    pub fn view_matrix_uncentered(&self) -> DMat4 {
        self.state.view_matrix_uncentered
    }

    pub fn view_matrix(&self) -> DMat4 {
        self.state.view_matrix
    }

    pub fn projection_matrix(&self) -> DMat4 {
        self.state.projection_matrix
    }

    pub fn view_projection_matrix(&self) -> DMat4 {
        self.pipeline.view_projection
    }

    /// Inverse view matrix, or the view matrix itself when it has no
    /// inverse (see [`Viewport::has_invertible_view`]).
    pub fn view_matrix_inverse(&self) -> DMat4 {
        self.pipeline.view_inverse
    }

    pub fn has_invertible_view(&self) -> bool {
        self.pipeline.view_invertible
    }

    pub fn pixel_projection_matrix(&self) -> DMat4 {
        self.pipeline.pixel_projection
    }

    pub fn pixel_unprojection_matrix(&self) -> Option<DMat4> {
        self.pipeline.pixel_unprojection
    }

    pub fn camera_position(&self) -> DVec3 {
        self.pipeline.camera.position
    }

    pub fn camera_direction(&self) -> DVec3 {
        self.pipeline.camera.direction
    }

    pub fn camera_up(&self) -> DVec3 {
        self.pipeline.camera.up
    }

    pub fn flat_projection(&self) -> &dyn FlatProjection {
        self.flat_projection.as_ref()
    }

    /// Project a coordinate (`[x, y]` or `[x, y, z]`) to window pixels.
    ///
    /// The returned z, when present, is always 0.
    ///
    /// A point on the camera axis at the eye (clip `x == y == w == 0`) is
    /// taken without the perspective divide and lands at the window
    /// center. Any other point on the eye plane has no finite projection
    /// and yields non-finite pixels.
    pub fn project<const N: usize>(
        &self,
        xyz: [f64; N],
        opts: ProjectOptions,
    ) -> Result<[f64; N], ViewportError> {
        let p = coordinate(&xyz)?;
        let world = self.flat_projection.project_flat(p.truncate(), self.scale());

        let mut clip = self.pipeline.view_projection * DVec4::new(world.x, world.y, p.z, 1.0);
        if clip.w == 0.0 && clip.x == 0.0 && clip.y == 0.0 {
            clip.w = 1.0;
        }
        let mut pixel = self
            .pipeline
            .ndc_to_pixel
            .transform_point3(clip.truncate() / clip.w);
        if opts.top_left {
            pixel.y = self.height - pixel.y;
        }

        let mut out = [0.0; N];
        out[..2].copy_from_slice(&[pixel.x, pixel.y]);
        Ok(out)
    }

    /// Unproject window pixels (`[x, y]` or `[x, y, target_z]`) back onto
    /// the plane `z = target_z`.
    ///
    /// `Ok(None)` when the pixel projection has no inverse or the pixel ray
    /// cannot be formed. A ray parallel to the target plane resolves to its
    /// near end.
    pub fn unproject<const N: usize>(
        &self,
        xyz: [f64; N],
        opts: UnprojectOptions,
    ) -> Result<Option<[f64; N]>, ViewportError> {
        let p = coordinate(&xyz)?;
        let target_z = if N == 3 {
            p.z
        } else {
            let z = opts.target_z.unwrap_or(0.0);
            if !z.is_finite() {
                return Err(ViewportError::non_finite("target_z", z));
            }
            z
        };

        let Some(unprojection) = self.pipeline.pixel_unprojection else {
            return Ok(None);
        };

        let y = if opts.top_left { self.height - p.y } else { p.y };
        let (Some(coord0), Some(coord1)) = (
            transform_point(&unprojection, DVec3::new(p.x, y, 0.0)),
            transform_point(&unprojection, DVec3::new(p.x, y, 1.0)),
        ) else {
            return Ok(None);
        };

        let t = ray_parameter(coord0.z, coord1.z, target_z);
        let world = coord0.truncate().lerp(coord1.truncate(), t);
        let flat = self.flat_projection.unproject_flat(world, self.scale());

        let mut out = [0.0; N];
        out[..2].copy_from_slice(&[flat.x, flat.y]);
        Ok(Some(out))
    }

    /// Same size and approximately equal view and projection matrices.
    ///
    /// Distance scales are not compared: two viewports that differ only in
    /// them are reported equal.
    pub fn equals(&self, other: &Viewport) -> bool {
        self.width == other.width
            && self.height == other.height
            && mat4_approx_eq(&self.state.view_matrix, &other.state.view_matrix)
            && mat4_approx_eq(&self.state.projection_matrix, &other.state.projection_matrix)
    }

    /// Matrices for rendering with an optional model matrix. The stored
    /// matrices are left untouched.
    pub fn matrices(&self, model: Option<DMat4>) -> ViewportMatrices {
        let mut out = ViewportMatrices {
            view_matrix: self.state.view_matrix,
            projection_matrix: self.state.projection_matrix,
            view_projection_matrix: self.pipeline.view_projection,
            model_view_projection_matrix: self.pipeline.view_projection,
            pixel_projection_matrix: self.pipeline.pixel_projection,
            pixel_unprojection_matrix: self.pipeline.pixel_unprojection,
            width: self.width,
            height: self.height,
            scale: self.state.scale,
        };
        if let Some(model) = model {
            out.model_view_projection_matrix = self.pipeline.view_projection * model;
            out.pixel_projection_matrix = self.pipeline.pixel_projection * model;
            out.pixel_unprojection_matrix =
                invert(&out.pixel_projection_matrix, "model pixel projection matrix").ok();
        }
        out
    }

    /// World-space position of `(x, y, meters)`.
    pub fn project_position(&self, xyz: DVec3) -> DVec3 {
        let flat = self.flat_projection.project_flat(xyz.truncate(), self.scale());
        flat.extend(xyz.z * self.state.distance_scales.pixels_per_meter.z)
    }

    /// Inverse of [`Viewport::project_position`].
    pub fn unproject_position(&self, xyz: DVec3) -> DVec3 {
        let flat = self.flat_projection.unproject_flat(xyz.truncate(), self.scale());
        flat.extend(xyz.z * self.state.distance_scales.meters_per_pixel.z)
    }

    /// Distance scales at `origin` (longitude/latitude) in geospatial mode;
    /// the stored scales otherwise.
    pub fn distance_scales_at(&self, origin: Option<DVec2>) -> DistanceScales {
        match origin {
            Some(o) if self.state.is_geospatial => distance_scales(o.x, o.y, self.state.scale),
            _ => self.state.distance_scales,
        }
    }

    /// Whether the pixel rectangle overlaps this viewport's rectangle.
    pub fn contains_pixel(&self, x: f64, y: f64, width: f64, height: f64) -> bool {
        x < self.x + self.width
            && self.x < x + width
            && y < self.y + self.height
            && self.y < y + height
    }

    /// `world - center` as `f32`, for GPU-bound positions.
    pub fn camera_relative_f32(&self, world: DVec3) -> [f32; 3] {
        CameraRelative::new(self.state.center).to_f32(world)
    }

    pub fn frustum_planes(&self) -> Frustum {
        Frustum::from_view_projection(&self.pipeline.view_projection)
    }
}

const AXES: [&str; 3] = ["x", "y", "z"];

fn coordinate<const N: usize>(xyz: &[f64; N]) -> Result<DVec3, ViewportError> {
    if N != 2 && N != 3 {
        return Err(ViewportError::InvalidArgument(format!(
            "expected 2 or 3 components, got {N}"
        )));
    }
    for (axis, &v) in AXES.iter().zip(xyz.iter()) {
        if !v.is_finite() {
            return Err(ViewportError::non_finite(axis, v));
        }
    }
    let component = |i: usize| xyz.get(i).copied().unwrap_or(0.0);
    Ok(DVec3::new(component(0), component(1), component(2)))
}

/// Interpolation parameter reaching `target` between `z0` and `z1`; 0 when
/// the two coincide.
fn ray_parameter(z0: f64, z1: f64, target: f64) -> f64 {
    if z0 == z1 { 0.0 } else { (target - z0) / (z1 - z0) }
}
