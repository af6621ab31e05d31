//! Spherical web-mercator utilities.
//!
//! World coordinates are expressed in "tile units": at scale 1 the whole
//! world is a square `TILE_SIZE` units wide, x grows eastwards and y grows
//! southwards. Every function here is pure and works in `f64`.

use core::f64::consts::{FRAC_PI_4, PI};

use glam::{DMat4, DVec2, DVec3};
use serde::{Deserialize, Serialize};

/// Width of the world tile at scale 1 (zoom 0).
pub const TILE_SIZE: f64 = 512.0;
/// Earth circumference used for meter conversions (meters).
pub const EARTH_CIRCUMFERENCE: f64 = 40.03e6;
/// Camera altitude used by the map camera when none is given (screen heights).
pub const DEFAULT_ALTITUDE: f64 = 1.5;

#[inline]
pub fn zoom_to_scale(zoom: f64) -> f64 {
    zoom.exp2()
}

#[inline]
pub fn scale_to_zoom(scale: f64) -> f64 {
    scale.log2()
}

/// Project longitude/latitude (degrees) into world tile units at `scale`.
pub fn lng_lat_to_world(lng_lat: DVec2, scale: f64) -> DVec2 {
    let world_size = scale * TILE_SIZE;
    let lambda = lng_lat.x.to_radians();
    let phi = lng_lat.y.to_radians();
    let x = world_size * (lambda + PI) / (2.0 * PI);
    let y = world_size * (PI - (FRAC_PI_4 + phi * 0.5).tan().ln()) / (2.0 * PI);
    DVec2::new(x, y)
}

/// Inverse of [`lng_lat_to_world`].
pub fn world_to_lng_lat(world: DVec2, scale: f64) -> DVec2 {
    let world_size = scale * TILE_SIZE;
    let lambda = (world.x / world_size) * (2.0 * PI) - PI;
    let phi = 2.0 * ((PI - (world.y / world_size) * (2.0 * PI)).exp().atan() - FRAC_PI_4);
    DVec2::new(lambda.to_degrees(), phi.to_degrees())
}

/// Zoom at which one world unit covers one meter at `latitude`.
pub fn meter_zoom(latitude: f64) -> f64 {
    let lat_cosine = latitude.to_radians().cos();
    scale_to_zoom(EARTH_CIRCUMFERENCE * lat_cosine) - 9.0
}

/// Per-axis conversion factors between meters, world units and degrees.
///
/// The z component of the degree scales carries the meter scale, since
/// elevation is always expressed in meters.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceScales {
    pub pixels_per_meter: DVec3,
    pub meters_per_pixel: DVec3,
    pub pixels_per_degree: DVec3,
    pub degrees_per_pixel: DVec3,
}

impl DistanceScales {
    /// Unit scales, used for non-geospatial viewports.
    pub const UNIT: Self = Self {
        pixels_per_meter: DVec3::ONE,
        meters_per_pixel: DVec3::ONE,
        pixels_per_degree: DVec3::ONE,
        degrees_per_pixel: DVec3::ONE,
    };
}

impl Default for DistanceScales {
    fn default() -> Self {
        Self::UNIT
    }
}

/// Tangent-plane distance scales around `(longitude, latitude)` at `scale`.
///
/// Longitude only matters for API symmetry: on a sphere the scales depend
/// on latitude alone.
pub fn distance_scales(_longitude: f64, latitude: f64, scale: f64) -> DistanceScales {
    let world_size = TILE_SIZE * scale;
    let lat_cosine = latitude.to_radians().cos();

    let pixels_per_degree_x = world_size / 360.0;
    let pixels_per_degree_y = pixels_per_degree_x / lat_cosine;
    let alt_pixels_per_meter = world_size / EARTH_CIRCUMFERENCE / lat_cosine;

    let pixels_per_meter = DVec3::splat(alt_pixels_per_meter);
    let pixels_per_degree =
        DVec3::new(pixels_per_degree_x, pixels_per_degree_y, alt_pixels_per_meter);

    DistanceScales {
        pixels_per_meter,
        meters_per_pixel: pixels_per_meter.recip(),
        pixels_per_degree,
        degrees_per_pixel: pixels_per_degree.recip(),
    }
}

/// World-space position of `(longitude, latitude)` shifted by `meter_offset`
/// (east, north, up meters).
///
/// The offset is converted with the scales of the anchor itself; `scales`
/// may be passed in when the caller already has them.
pub fn world_position(
    longitude: f64,
    latitude: f64,
    scale: f64,
    meter_offset: DVec3,
    scales: Option<&DistanceScales>,
) -> DVec3 {
    let center = lng_lat_to_world(DVec2::new(longitude, latitude), scale).extend(0.0);
    if meter_offset == DVec3::ZERO {
        return center;
    }
    let local;
    let scales = match scales {
        Some(s) => s,
        None => {
            local = distance_scales(longitude, latitude, scale);
            &local
        }
    };
    center + north_up(meter_offset) * scales.pixels_per_meter
}

/// East/north/up meters to world axis directions: north is towards
/// decreasing world y.
#[inline]
pub fn north_up(meters: DVec3) -> DVec3 {
    meters * DVec3::new(1.0, -1.0, 1.0)
}

/// Offset a `(lng, lat, z)` position by east/north/up meters.
///
/// Uses the tangent-plane scales at the starting point, so accuracy
/// degrades for offsets of many kilometers.
pub fn add_meters_to_lng_lat(lng_lat_z: DVec3, meters: DVec3) -> DVec3 {
    let scales = distance_scales(lng_lat_z.x, lng_lat_z.y, 1.0);
    let mut world = lng_lat_to_world(lng_lat_z.truncate(), 1.0);
    world.x += meters.x * scales.pixels_per_meter.x;
    // North is towards decreasing world y.
    world.y -= meters.y * scales.pixels_per_meter.y;
    world_to_lng_lat(world, 1.0).extend(lng_lat_z.z + meters.z)
}

/// Map-style camera: looks down at the map center from `altitude`
/// screen heights, tilted by `pitch` and rotated by `bearing` (degrees).
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapCamera {
    pub height: f64,
    pub pitch: f64,
    pub bearing: f64,
    pub altitude: f64,
}

impl MapCamera {
    pub fn new(height: f64) -> Self {
        Self {
            height,
            pitch: 0.0,
            bearing: 0.0,
            altitude: DEFAULT_ALTITUDE,
        }
    }

    /// Vertical field of view (degrees) matching this camera's altitude.
    pub fn fovy(&self) -> f64 {
        altitude_to_fovy(self.altitude)
    }
}

/// Uncentered view matrix of a [`MapCamera`].
///
/// World units are scaled by `1 / height`, so with [`altitude_to_fovy`]
/// one world unit covers one pixel at the screen center.
pub fn map_view_matrix(camera: &MapCamera) -> DMat4 {
    let height = camera.height.max(1.0);
    DMat4::from_translation(DVec3::new(0.0, 0.0, -camera.altitude))
        * DMat4::from_rotation_x(-camera.pitch.to_radians())
        * DMat4::from_rotation_z(camera.bearing.to_radians())
        * DMat4::from_scale(DVec3::splat(1.0 / height))
}

/// Vertical field of view (degrees) that shows exactly one screen height
/// at distance `altitude`.
pub fn altitude_to_fovy(altitude: f64) -> f64 {
    (2.0 * (0.5 / altitude).atan()).to_degrees()
}
