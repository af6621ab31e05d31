//! Camera state resolution: turns loose [`ViewportProps`] into a complete,
//! self-consistent zoom, distance scales, center and view/projection pair.

use foundation::math::{DistanceScales, distance_scales, meter_zoom, zoom_to_scale};
use glam::{DMat4, DVec3};
use tracing::debug;

use crate::error::ViewportError;
use crate::flat::FlatProjection;
use crate::props::ViewportProps;

/// Zoom of flat viewports constructed without one.
pub const DEFAULT_ZOOM: f64 = 0.0;

/// Fully resolved camera parameters of one viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraState {
    pub is_geospatial: bool,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub zoom: f64,
    /// Always `2^zoom`.
    pub scale: f64,
    pub distance_scales: DistanceScales,
    pub position: DVec3,
    pub model_matrix: Option<DMat4>,
    pub meter_offset: DVec3,
    pub center: DVec3,
    pub view_matrix_uncentered: DMat4,
    pub view_matrix: DMat4,
    pub projection_matrix: DMat4,
}

/// Symmetric OpenGL-style perspective projection; `fovy` in degrees.
pub fn perspective_matrix(
    fovy: f64,
    aspect: f64,
    near: f64,
    far: f64,
) -> Result<DMat4, ViewportError> {
    for (name, value) in [("fovy", fovy), ("near", near), ("far", far)] {
        if !value.is_finite() {
            return Err(ViewportError::non_finite(name, value));
        }
    }
    Ok(DMat4::perspective_rh_gl(fovy.to_radians(), aspect, near, far))
}

pub fn resolve_camera(
    props: &ViewportProps,
    hook: &dyn FlatProjection,
) -> Result<CameraState, ViewportError> {
    let width = props.resolved_width();
    let height = props.resolved_height();

    // Geospatial mode is decided by the anchor alone.
    let anchor = props.geo_anchor();

    let zoom = props
        .zoom
        .filter(|z| z.is_finite())
        .or_else(|| anchor.map(|a| meter_zoom(a.y)).filter(|z| z.is_finite()))
        .unwrap_or(DEFAULT_ZOOM);
    let scale = zoom_to_scale(zoom);

    let scales = match anchor {
        Some(a) => distance_scales(a.x, a.y, scale),
        None => props.distance_scales.unwrap_or_default(),
    };

    let position = props.position.unwrap_or(DVec3::ZERO);
    let meter_offset = match (props.position, props.model_matrix) {
        (Some(p), Some(model)) => model.transform_point3(p),
        (Some(p), None) => p,
        (None, _) => DVec3::ZERO,
    };

    let view_matrix_uncentered = props.view_matrix.unwrap_or(DMat4::IDENTITY);
    let (center, view_matrix) = match anchor {
        Some(a) => {
            let center = hook.world_position(a, scale, meter_offset, &scales);
            // Flip y before centering: world y grows southwards.
            let view = view_matrix_uncentered
                * DMat4::from_scale(DVec3::new(1.0, -1.0, 1.0))
                * DMat4::from_translation(-center);
            (center, view)
        }
        None => (position, view_matrix_uncentered),
    };

    let projection_matrix = match props.projection_matrix {
        Some(m) => m,
        None => perspective_matrix(props.fovy, width / height, props.near, props.far)?,
    };

    debug!(
        geospatial = anchor.is_some(),
        zoom,
        center_x = center.x,
        center_y = center.y,
        center_z = center.z,
        "resolved camera state"
    );

    Ok(CameraState {
        is_geospatial: anchor.is_some(),
        longitude: anchor.map(|a| a.x),
        latitude: anchor.map(|a| a.y),
        zoom,
        scale,
        distance_scales: scales,
        position,
        model_matrix: props.model_matrix,
        meter_offset,
        center,
        view_matrix_uncentered,
        view_matrix,
        projection_matrix,
    })
}
