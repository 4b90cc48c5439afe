//! Quantization of geographic coordinates into the tile-local integer
//! grid.

use crate::{geo::Coordinates, mercator};
use anyhow::{Result, ensure};
use kachel_core::{GeoBBox, TileCoord};

/// Default tile coordinate extent.
pub const DEFAULT_EXTENT: u32 = 4096;

/// Maps geographic coordinates into a tile's local `[0, extent]` grid.
///
/// The tile bbox and every vertex are projected to Web Mercator; the
/// projected south-west corner is the offset and the projected bbox span
/// the scale. The vertical axis is flipped because tile rows grow downward
/// while projected Y grows upward.
#[derive(Clone, Debug)]
pub struct TileTransform {
	x_offset: f64,
	y_offset: f64,
	x_span: f64,
	y_span: f64,
	extent: u32,
}

impl TileTransform {
	pub fn new(tile_bbox: &GeoBBox, extent: u32) -> Result<TileTransform> {
		ensure!(extent > 0, "extent must be positive");
		let sw = mercator::project(tile_bbox.x_min, tile_bbox.y_min);
		let ne = mercator::project(tile_bbox.x_max, tile_bbox.y_max);
		let x_span = ne[0] - sw[0];
		let y_span = ne[1] - sw[1];
		ensure!(x_span > 0.0 && y_span > 0.0, "tile bbox must have a positive extent");
		Ok(TileTransform {
			x_offset: sw[0],
			y_offset: sw[1],
			x_span,
			y_span,
			extent,
		})
	}

	pub fn from_coord(coord: &TileCoord, extent: u32) -> Result<TileTransform> {
		TileTransform::new(&coord.as_geo_bbox(), extent)
	}

	pub fn extent(&self) -> u32 {
		self.extent
	}

	/// Quantizes one coordinate into tile-local integers, Y flipped.
	pub fn apply(&self, c: &Coordinates) -> [i64; 2] {
		let m = c.to_mercator();
		let extent = f64::from(self.extent);
		let x = ((m.x() - self.x_offset) / self.x_span * extent).round() as i64;
		let y = ((m.y() - self.y_offset) / self.y_span * extent).round() as i64;
		[x, flip(y, i64::from(self.extent))]
	}
}

/// Flips the vertical axis: `0` maps to `extent`, `extent` to `0`.
fn flip(v: i64, extent: i64) -> i64 {
	if v == 0 {
		extent
	} else {
		(extent - v).rem_euclid(extent)
	}
}
