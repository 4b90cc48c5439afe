//! Web-Mercator tile addresses.
//!
//! A [`TileCoord`] names one tile in the slippy-map quadtree: zoom `level`
//! plus `x`/`y` indices counted from the north-west corner. The conversions
//! here implement the standard Web-Mercator formulas; geographic input is
//! clamped to the latitude range the projection can represent.

use crate::GeoBBox;
use anyhow::{Result, ensure};
use std::fmt::{self, Debug, Display};

/// Latitude limit of the Web-Mercator projection, in degrees.
pub const MAX_MERCATOR_LAT: f64 = 85.0511287;

/// Floor with a guard against floating-point noise at tile boundaries, so
/// a tile's own NW corner always maps back into that tile.
fn snap_floor(value: f64) -> f64 {
	let nearest = value.round();
	if (value - nearest).abs() < 1e-9 {
		nearest
	} else {
		value.floor()
	}
}

#[derive(Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct TileCoord {
	pub level: u8,
	pub x: u32,
	pub y: u32,
}

impl TileCoord {
	pub fn new(level: u8, x: u32, y: u32) -> Result<TileCoord> {
		ensure!(level <= 30, "level ({level}) must be <= 30");
		let max = 2u32.pow(u32::from(level));
		ensure!(x < max, "x ({x}) must be < 2^{level}");
		ensure!(y < max, "y ({y}) must be < 2^{level}");
		Ok(TileCoord { level, x, y })
	}

	/// Computes the tile containing a geographic point.
	///
	/// Latitude is clamped to ±[`MAX_MERCATOR_LAT`] and the resulting
	/// indices to `[0, 2^level)`, so points on the antimeridian or beyond
	/// the Mercator range land on the nearest edge tile. Non-finite
	/// coordinates are rejected.
	pub fn from_geo(lon: f64, lat: f64, level: u8) -> Result<TileCoord> {
		ensure!(level <= 30, "level ({level}) must be <= 30");
		ensure!(
			lon.is_finite() && lat.is_finite(),
			"coordinates ({lon}, {lat}) must be finite"
		);

		let n = 2.0f64.powi(i32::from(level));
		let max_index = n - 1.0;
		let lat_rad = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();

		let x = snap_floor((lon + 180.0) / 360.0 * n).clamp(0.0, max_index);
		let y = snap_floor((1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0 * n)
			.clamp(0.0, max_index);

		Ok(TileCoord {
			level,
			x: x as u32,
			y: y as u32,
		})
	}

	/// Geographic coordinates of the tile's north-west corner as `[lon, lat]`.
	pub fn nw(&self) -> [f64; 2] {
		let n = 2.0f64.powi(i32::from(self.level));
		let lon = f64::from(self.x) / n * 360.0 - 180.0;
		let lat = (std::f64::consts::PI * (1.0 - 2.0 * f64::from(self.y) / n))
			.sinh()
			.atan()
			.to_degrees();
		[lon, lat]
	}

	/// The tile's geographic bounding box.
	///
	/// Built from this tile's NW corner and the NW corner of the tile one
	/// step south-east, reordered into (SW, NE).
	pub fn as_geo_bbox(&self) -> GeoBBox {
		let nw = self.nw();
		let se = TileCoord {
			level: self.level,
			x: self.x + 1,
			y: self.y + 1,
		}
		.nw();
		GeoBBox::new_unchecked(nw[0], se[1], se[0], nw[1])
	}

	pub fn is_valid(&self) -> bool {
		if self.level > 30 {
			return false;
		}
		let max = 2u32.pow(u32::from(self.level));
		(self.x < max) && (self.y < max)
	}
}

impl Display for TileCoord {
	/// Formats as `z/x/y`, the form used for bucket keys and sink paths.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}/{}", self.level, self.x, self.y)
	}
}

impl Debug for TileCoord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_fmt(format_args!("TileCoord({}, [{}, {}])", &self.level, &self.x, &self.y))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use approx::assert_abs_diff_eq;

	#[test]
	fn new_rejects_out_of_range_indices() {
		assert!(TileCoord::new(31, 0, 0).is_err());
		assert!(TileCoord::new(2, 4, 0).is_err());
		assert!(TileCoord::new(2, 0, 4).is_err());
		assert!(TileCoord::new(2, 3, 3).is_ok());
	}

	#[test]
	fn from_geo_reference_point() {
		// Dresden city center at zoom 14
		let coord = TileCoord::from_geo(13.73630, 51.05377, 14).unwrap();
		assert_eq!(coord, TileCoord { level: 14, x: 8817, y: 5481 });
	}

	#[test]
	fn from_geo_clamps_world_corners() {
		assert_eq!(
			TileCoord::from_geo(180.0, -90.0, 1).unwrap(),
			TileCoord { level: 1, x: 1, y: 1 }
		);
		assert_eq!(
			TileCoord::from_geo(-180.0, 90.0, 1).unwrap(),
			TileCoord { level: 1, x: 0, y: 0 }
		);
	}

	#[test]
	fn from_geo_rejects_non_finite() {
		assert!(TileCoord::from_geo(f64::NAN, 0.0, 4).is_err());
		assert!(TileCoord::from_geo(0.0, f64::INFINITY, 4).is_err());
	}

	#[test]
	fn nw_corner_maps_back_to_same_tile() {
		let coord = TileCoord::new(7, 68, 44).unwrap();
		let nw = coord.nw();
		assert_eq!(TileCoord::from_geo(nw[0], nw[1], 7).unwrap(), coord);
	}

	#[test]
	fn nw_of_origin_tile() {
		let nw = TileCoord::new(0, 0, 0).unwrap().nw();
		assert_abs_diff_eq!(nw[0], -180.0);
		assert_abs_diff_eq!(nw[1], 85.0511287798, epsilon = 1e-9);
	}

	#[test]
	fn geo_bbox_is_ordered() {
		let bbox = TileCoord::new(5, 16, 10).unwrap().as_geo_bbox();
		assert!(bbox.x_min < bbox.x_max);
		assert!(bbox.y_min < bbox.y_max);
		assert_abs_diff_eq!(bbox.x_min, 0.0);
		assert_abs_diff_eq!(bbox.x_max, 11.25);
	}

	#[test]
	fn display_is_z_x_y() {
		let coord = TileCoord::new(14, 8817, 5481).unwrap();
		assert_eq!(coord.to_string(), "14/8817/5481");
	}
}
