//! Non-linear projection hook.
//!
//! Everything downstream of this hook is linear homogeneous math; the hook
//! is the only place where geographic coordinates are bent into the flat
//! world plane and back.

use std::fmt::Debug;

use foundation::math::{
    DistanceScales, lng_lat_to_world, north_up, world_position, world_to_lng_lat,
};
use glam::{DVec2, DVec3};

/// Forward/inverse pair mapping input coordinates to flat world coordinates.
///
/// Implementations must be exact inverses of each other for every scale
/// they support.
pub trait FlatProjection: Debug + Send + Sync {
    fn project_flat(&self, xy: DVec2, scale: f64) -> DVec2;
    fn unproject_flat(&self, xy: DVec2, scale: f64) -> DVec2;

    /// World-space anchor of a geospatial viewport: the projected anchor
    /// (z = 0) shifted by `meter_offset` (east, north, up) converted with
    /// `scales`. World y grows southwards, as in web mercator.
    fn world_position(
        &self,
        anchor: DVec2,
        scale: f64,
        meter_offset: DVec3,
        scales: &DistanceScales,
    ) -> DVec3 {
        self.project_flat(anchor, scale).extend(0.0)
            + north_up(meter_offset) * scales.pixels_per_meter
    }
}

/// Flat (cartesian) mode: input coordinates already are world coordinates.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct IdentityProjection;

impl FlatProjection for IdentityProjection {
    fn project_flat(&self, xy: DVec2, _scale: f64) -> DVec2 {
        xy
    }

    fn unproject_flat(&self, xy: DVec2, _scale: f64) -> DVec2 {
        xy
    }
}

/// Geospatial mode: longitude/latitude degrees to web-mercator world units.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct WebMercatorProjection;

impl FlatProjection for WebMercatorProjection {
    fn project_flat(&self, xy: DVec2, scale: f64) -> DVec2 {
        lng_lat_to_world(xy, scale)
    }

    fn unproject_flat(&self, xy: DVec2, scale: f64) -> DVec2 {
        world_to_lng_lat(xy, scale)
    }

    fn world_position(
        &self,
        anchor: DVec2,
        scale: f64,
        meter_offset: DVec3,
        scales: &DistanceScales,
    ) -> DVec3 {
        world_position(anchor.x, anchor.y, scale, meter_offset, Some(scales))
    }
}

#[cfg(test)]
mod tests {
    use super::{FlatProjection, IdentityProjection, WebMercatorProjection};
    use foundation::math::{DistanceScales, TILE_SIZE, distance_scales};
    use glam::{DVec2, DVec3};

    #[test]
    fn identity_returns_input() {
        let p = DVec2::new(-3.5, 1e9);
        assert_eq!(IdentityProjection.project_flat(p, 4096.0), p);
        assert_eq!(IdentityProjection.unproject_flat(p, 4096.0), p);
    }

    #[test]
    fn web_mercator_is_an_inverse_pair() {
        let hook = WebMercatorProjection;
        for &scale in &[1.0, 2.0, 4096.0, 1_048_576.0] {
            let lng_lat = DVec2::new(-122.4, 37.75);
            let world = hook.project_flat(lng_lat, scale);
            let back = hook.unproject_flat(world, scale);
            assert!((back - lng_lat).abs().max_element() < 1e-9, "{back:?} at {scale}");
        }
    }

    #[test]
    fn web_mercator_scales_the_world_tile() {
        let hook = WebMercatorProjection;
        let corner = hook.project_flat(DVec2::new(180.0, 0.0), 8.0);
        assert!((corner.x - TILE_SIZE * 8.0).abs() < 1e-9);
        assert!((corner.y - TILE_SIZE * 4.0).abs() < 1e-9);
    }

    #[test]
    fn hooks_are_usable_as_trait_objects() {
        let hooks: [&dyn FlatProjection; 2] = [&IdentityProjection, &WebMercatorProjection];
        for hook in hooks {
            let p = hook.project_flat(DVec2::new(10.0, 20.0), 1.0);
            assert!(p.is_finite());
        }
    }

    #[test]
    fn world_position_adds_the_meter_offset() {
        let offset = DVec3::new(10.0, -5.0, 2.0);
        let flat = IdentityProjection.world_position(
            DVec2::new(1.0, 2.0),
            1.0,
            offset,
            &DistanceScales::UNIT,
        );
        assert_eq!(flat, DVec3::new(11.0, 7.0, 2.0));

        let anchor = DVec2::new(-122.4, 37.75);
        let scales = distance_scales(anchor.x, anchor.y, 4096.0);
        let geo = WebMercatorProjection.world_position(anchor, 4096.0, offset, &scales);
        let base = WebMercatorProjection.project_flat(anchor, 4096.0);
        assert!((geo.x - base.x - 10.0 * scales.pixels_per_meter.x).abs() < 1e-9);
        // Five meters south.
        assert!((geo.y - base.y - 5.0 * scales.pixels_per_meter.y).abs() < 1e-9);
        assert!((geo.z - 2.0 * scales.pixels_per_meter.z).abs() < 1e-12);
    }
}
