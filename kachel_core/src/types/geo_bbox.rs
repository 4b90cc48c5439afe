//! Geographic bounding boxes.

use crate::{MAX_MERCATOR_LAT, TileCoord};
use anyhow::{Result, ensure};
use std::fmt::Debug;

/// An axis-aligned geographic rectangle in WGS84 degrees.
///
/// Invariant: `x_min <= x_max` and `y_min <= y_max` — (`x_min`, `y_min`) is
/// the south-west corner, (`x_max`, `y_max`) the north-east corner.
///
/// # Examples
///
/// ```
/// use kachel_core::GeoBBox;
///
/// let mut bbox = GeoBBox::new(-10.0, -5.0, 10.0, 5.0).unwrap();
/// bbox.extend(&GeoBBox::new(-12.0, -3.0, 8.0, 6.0).unwrap());
/// assert_eq!(bbox.as_array(), [-12.0, -5.0, 10.0, 6.0]);
/// ```
#[derive(Clone, Copy, PartialEq)]
pub struct GeoBBox {
	pub x_min: f64,
	pub y_min: f64,
	pub x_max: f64,
	pub y_max: f64,
}

impl GeoBBox {
	/// Creates a new bbox from `west, south, east, north`, validating the
	/// corner ordering.
	pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Result<GeoBBox> {
		ensure!(
			x_min.is_finite() && y_min.is_finite() && x_max.is_finite() && y_max.is_finite(),
			"bbox coordinates must be finite"
		);
		ensure!(x_min <= x_max, "x_min ({x_min}) must be <= x_max ({x_max})");
		ensure!(y_min <= y_max, "y_min ({y_min}) must be <= y_max ({y_max})");
		Ok(GeoBBox {
			x_min,
			y_min,
			x_max,
			y_max,
		})
	}

	/// Creates a bbox without checking the corner ordering. Only for values
	/// that are ordered by construction (e.g. tile corners).
	#[must_use]
	pub fn new_unchecked(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> GeoBBox {
		GeoBBox {
			x_min,
			y_min,
			x_max,
			y_max,
		}
	}

	/// A zero-area bbox containing a single point.
	#[must_use]
	pub fn from_point(x: f64, y: f64) -> GeoBBox {
		GeoBBox {
			x_min: x,
			y_min: y,
			x_max: x,
			y_max: y,
		}
	}

	#[must_use]
	pub fn as_array(&self) -> [f64; 4] {
		[self.x_min, self.y_min, self.x_max, self.y_max]
	}

	/// Grows the bbox in place to include `other`.
	pub fn extend(&mut self, other: &GeoBBox) {
		self.x_min = self.x_min.min(other.x_min);
		self.y_min = self.y_min.min(other.y_min);
		self.x_max = self.x_max.max(other.x_max);
		self.y_max = self.y_max.max(other.y_max);
	}

	/// Non-mutating version of [`extend`](Self::extend).
	#[must_use]
	pub fn extended(mut self, other: &GeoBBox) -> GeoBBox {
		self.extend(other);
		self
	}

	/// `true` if the point lies within the bbox, boundary included.
	#[must_use]
	pub fn contains_point(&self, x: f64, y: f64) -> bool {
		(self.x_min <= x) && (x <= self.x_max) && (self.y_min <= y) && (y <= self.y_max)
	}

	/// `true` if `other` lies fully within this bbox, boundary included.
	#[must_use]
	pub fn contains_bbox(&self, other: &GeoBBox) -> bool {
		(self.x_min <= other.x_min)
			&& (other.x_max <= self.x_max)
			&& (self.y_min <= other.y_min)
			&& (other.y_max <= self.y_max)
	}

	/// `true` if the two bboxes share any point, boundaries included.
	#[must_use]
	pub fn overlaps(&self, other: &GeoBBox) -> bool {
		(self.x_min <= other.x_max)
			&& (other.x_min <= self.x_max)
			&& (self.y_min <= other.y_max)
			&& (other.y_min <= self.y_max)
	}

	/// Clamps the bbox in place to the coordinate range of the Web-Mercator
	/// projection.
	pub fn limit_to_mercator(&mut self) {
		self.x_min = self.x_min.clamp(-180.0, 180.0);
		self.x_max = self.x_max.clamp(-180.0, 180.0);
		self.y_min = self.y_min.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
		self.y_max = self.y_max.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
	}

	/// Enumerates all tiles of one zoom level that overlap this bbox.
	///
	/// The geographic NW and SE corners are projected to tile indices and
	/// the inclusive index rectangle between them is enumerated row by row.
	/// Because tile indices are monotonic in both axes this is exact: no
	/// tile is missed and none outside the bbox is produced.
	pub fn coverage(&self, level: u8) -> Result<Vec<TileCoord>> {
		let tl = TileCoord::from_geo(self.x_min, self.y_max, level)?;
		let br = TileCoord::from_geo(self.x_max, self.y_min, level)?;

		let mut tiles = Vec::with_capacity((br.x - tl.x + 1) as usize * (br.y - tl.y + 1) as usize);
		for x in tl.x..=br.x {
			for y in tl.y..=br.y {
				tiles.push(TileCoord { level, x, y });
			}
		}
		Ok(tiles)
	}
}

impl Debug for GeoBBox {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_fmt(format_args!(
			"GeoBBox({}, {}, {}, {})",
			self.x_min, self.y_min, self.x_max, self.y_max
		))
	}
}
