use foundation::math::DistanceScales;
use glam::{DMat4, DVec2, DVec3};
use serde::{Deserialize, Serialize};

use crate::error::ViewportError;

/// Id given to viewports constructed without one.
pub const DEFAULT_ID: &str = "viewport";
/// Vertical field of view (degrees) of the default perspective projection.
pub const DEFAULT_FOVY: f64 = 75.0;
pub const DEFAULT_NEAR: f64 = 0.1;
pub const DEFAULT_FAR: f64 = 1000.0;

/// Construction parameters of a [`Viewport`](crate::Viewport).
///
/// Every field has a default, so partial JSON documents and struct-update
/// syntax both work:
///
/// ```
/// use viewport::ViewportProps;
///
/// let props = ViewportProps {
///     width: 800.0,
///     height: 600.0,
///     ..Default::default()
/// };
/// assert_eq!(props.fovy, 75.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportProps {
    pub id: Option<String>,
    pub x: f64,
    pub y: f64,
    /// Pixels; floored at 1.
    pub width: f64,
    /// Pixels; floored at 1.
    pub height: f64,
    pub view_matrix: Option<DMat4>,
    /// When absent, built from `fovy`, `near` and `far`.
    pub projection_matrix: Option<DMat4>,
    /// Degrees.
    pub fovy: f64,
    pub near: f64,
    pub far: f64,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub zoom: Option<f64>,
    /// Meter offset from the geographic anchor, or the center in flat mode.
    pub position: Option<DVec3>,
    /// Applied to `position` when both are present.
    pub model_matrix: Option<DMat4>,
    /// Only honored in flat mode; geospatial viewports derive their own.
    pub distance_scales: Option<DistanceScales>,
    /// Not used by the projection math; carried for consumers.
    pub focal_distance: f64,
}

impl Default for ViewportProps {
    fn default() -> Self {
        Self {
            id: None,
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
            view_matrix: None,
            projection_matrix: None,
            fovy: DEFAULT_FOVY,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
            longitude: None,
            latitude: None,
            zoom: None,
            position: None,
            model_matrix: None,
            distance_scales: None,
            focal_distance: 1.0,
        }
    }
}

impl ViewportProps {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Parse props from JSON.
    ///
    /// Matrices are 16-element column-major arrays, vectors 3-element arrays.
    pub fn from_json(text: &str) -> Result<Self, ViewportError> {
        serde_json::from_str(text).map_err(|e| ViewportError::InvalidConfig(e.to_string()))
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_origin(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_view_matrix(mut self, view_matrix: DMat4) -> Self {
        self.view_matrix = Some(view_matrix);
        self
    }

    pub fn with_projection_matrix(mut self, projection_matrix: DMat4) -> Self {
        self.projection_matrix = Some(projection_matrix);
        self
    }

    pub fn with_perspective(mut self, fovy: f64, near: f64, far: f64) -> Self {
        self.fovy = fovy;
        self.near = near;
        self.far = far;
        self
    }

    /// Anchor the viewport geographically; this switches on geospatial mode.
    pub fn with_geo(mut self, longitude: f64, latitude: f64, zoom: Option<f64>) -> Self {
        self.longitude = Some(longitude);
        self.latitude = Some(latitude);
        self.zoom = zoom;
        self
    }

    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = Some(zoom);
        self
    }

    pub fn with_position(mut self, position: DVec3) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_model_matrix(mut self, model_matrix: DMat4) -> Self {
        self.model_matrix = Some(model_matrix);
        self
    }

    pub fn with_distance_scales(mut self, distance_scales: DistanceScales) -> Self {
        self.distance_scales = Some(distance_scales);
        self
    }

    pub fn with_focal_distance(mut self, focal_distance: f64) -> Self {
        self.focal_distance = focal_distance;
        self
    }

    /// Geospatial iff both longitude and latitude are present and finite.
    pub fn is_geospatial(&self) -> bool {
        self.geo_anchor().is_some()
    }

    pub(crate) fn geo_anchor(&self) -> Option<DVec2> {
        match (self.longitude, self.latitude) {
            (Some(lng), Some(lat)) if lng.is_finite() && lat.is_finite() => {
                Some(DVec2::new(lng, lat))
            }
            _ => None,
        }
    }

    pub(crate) fn resolved_width(&self) -> f64 {
        floor_dimension(self.width)
    }

    pub(crate) fn resolved_height(&self) -> f64 {
        floor_dimension(self.height)
    }
}

fn floor_dimension(v: f64) -> f64 {
    if v.is_finite() { v.max(1.0) } else { 1.0 }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_FAR, DEFAULT_FOVY, DEFAULT_NEAR, ViewportProps};
    use crate::error::ViewportError;

    use foundation::math::DistanceScales;
    use glam::{DMat4, DVec3};
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_documented_values() {
        let props = ViewportProps::default();
        assert_eq!(props.id, None);
        assert_eq!((props.width, props.height), (1.0, 1.0));
        assert_eq!(props.fovy, DEFAULT_FOVY);
        assert_eq!(props.near, DEFAULT_NEAR);
        assert_eq!(props.far, DEFAULT_FAR);
        assert_eq!(props.focal_distance, 1.0);
    }

    #[test]
    fn dimensions_floor_at_one() {
        let props = ViewportProps::new(0.0, -20.0);
        assert_eq!(props.resolved_width(), 1.0);
        assert_eq!(props.resolved_height(), 1.0);

        let props = ViewportProps::new(f64::NAN, 480.5);
        assert_eq!(props.resolved_width(), 1.0);
        assert_eq!(props.resolved_height(), 480.5);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let props = ViewportProps::from_json(
            r#"{ "width": 800, "height": 600, "longitude": -122.4, "latitude": 37.75, "zoom": 12 }"#,
        )
        .unwrap();

        let expected = ViewportProps::new(800.0, 600.0).with_geo(-122.4, 37.75, Some(12.0));
        assert_eq!(props, expected);
    }

    #[test]
    fn json_matrices_are_column_major() {
        let props = ViewportProps::from_json(
            r#"{
                "view_matrix": [1,0,0,0, 0,1,0,0, 0,0,1,0, 10,20,30,1],
                "position": [1, 2, 3],
                "distance_scales": {
                    "pixels_per_meter": [2, 2, 2],
                    "meters_per_pixel": [0.5, 0.5, 0.5],
                    "pixels_per_degree": [1, 1, 1],
                    "degrees_per_pixel": [1, 1, 1]
                }
            }"#,
        )
        .unwrap();

        assert_eq!(
            props.view_matrix,
            Some(DMat4::from_translation(DVec3::new(10.0, 20.0, 30.0)))
        );
        assert_eq!(props.position, Some(DVec3::new(1.0, 2.0, 3.0)));
        assert_eq!(
            props.distance_scales.map(|s| s.pixels_per_meter),
            Some(DVec3::splat(2.0))
        );
        assert_ne!(props.distance_scales, Some(DistanceScales::UNIT));
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = ViewportProps::from_json(r#"{ "width": "wide" }"#).unwrap_err();
        assert!(matches!(err, ViewportError::InvalidConfig(_)));

        let err = ViewportProps::from_json(r#"{ "view_matrix": [1, 2, 3] }"#).unwrap_err();
        assert!(matches!(err, ViewportError::InvalidConfig(_)));
    }

    #[test]
    fn builder_sets_fields() {
        let props = ViewportProps::default()
            .with_size(640.0, 480.0)
            .with_id("minimap")
            .with_origin(10.0, 20.0)
            .with_perspective(60.0, 1.0, 500.0)
            .with_position(DVec3::new(0.0, 0.0, 5.0))
            .with_focal_distance(2.0);

        assert_eq!(props.id.as_deref(), Some("minimap"));
        assert_eq!((props.width, props.height), (640.0, 480.0));
        assert!(!props.is_geospatial());
        assert_eq!((props.x, props.y), (10.0, 20.0));
        assert_eq!((props.fovy, props.near, props.far), (60.0, 1.0, 500.0));
        assert_eq!(props.position, Some(DVec3::new(0.0, 0.0, 5.0)));
        assert_eq!(props.focal_distance, 2.0);
    }
}
