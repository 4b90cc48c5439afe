//! Forward Web-Mercator (EPSG:3857) projection.
//!
//! The vector-tile quantizer works in projected meters so that tile-local
//! coordinates match what renderers expect. Only the forward projection is
//! needed; tile bboxes are produced from tile indices, never unprojected.

use std::f64::consts::FRAC_PI_4;

/// Earth radius of the spherical Mercator projection, in meters.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Projects WGS84 degrees to Web-Mercator meters.
///
/// Latitude must lie within the Mercator-valid range; callers clamp via
/// [`kachel_core::GeoBBox::limit_to_mercator`] or tile-derived bboxes.
pub fn project(lon: f64, lat: f64) -> [f64; 2] {
	[
		EARTH_RADIUS * lon.to_radians(),
		EARTH_RADIUS * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln(),
	]
}
