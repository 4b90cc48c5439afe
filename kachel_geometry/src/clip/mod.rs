//! Clipping of geometries to axis-aligned rectangles.
//!
//! [`clip_geometry`] cuts a geometry to a tile's bounding box and returns
//! zero or more geometries of the same base kind. Points are kept or
//! dropped, lines are split into their inside runs, polygons go through a
//! boundary-walk clipper that handles outer rings and holes.

mod line;
mod polygon;

pub use line::clip_line;
pub use polygon::clip_ring;
pub use polygon::clip_polygon;

use crate::geo::*;
use anyhow::Result;
use kachel_core::GeoBBox;

/// Clips a geometry to the inclusive bounds of `bbox`.
///
/// An empty result is a normal outcome, not an error. Errors are reserved
/// for malformed input (e.g. a self-intersecting polygon on which the
/// boundary walk cannot close a ring).
pub fn clip_geometry(geometry: &Geometry, bbox: &GeoBBox) -> Result<Vec<Geometry>> {
	Ok(match geometry {
		Geometry::Point(p) => {
			if bbox.contains_point(p.x(), p.y()) {
				vec![geometry.clone()]
			} else {
				vec![]
			}
		}
		Geometry::LineString(l) => clip_line(l, bbox).into_iter().map(Geometry::LineString).collect(),
		Geometry::Polygon(p) => clip_polygon(p, bbox)?.into_iter().map(Geometry::Polygon).collect(),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use kachel_core::GeoBBox;

	fn bbox() -> GeoBBox {
		GeoBBox::new(0.0, 0.0, 10.0, 10.0).unwrap()
	}

	#[test]
	fn point_inside_is_kept() {
		let point = Geometry::new_point([5.0, 5.0]);
		assert_eq!(clip_geometry(&point, &bbox()).unwrap(), vec![point]);
	}

	#[test]
	fn point_on_boundary_is_kept() {
		let point = Geometry::new_point([0.0, 10.0]);
		assert_eq!(clip_geometry(&point, &bbox()).unwrap().len(), 1);
	}

	#[test]
	fn point_outside_is_dropped() {
		let point = Geometry::new_point([10.5, 5.0]);
		assert!(clip_geometry(&point, &bbox()).unwrap().is_empty());
	}

	#[test]
	fn results_keep_the_base_kind() {
		let line = Geometry::new_line_string(&[[-5, 5], [15, 5]]);
		for clipped in clip_geometry(&line, &bbox()).unwrap() {
			assert_eq!(clipped.type_name(), "LineString");
		}

		let polygon = Geometry::new_polygon(&[vec![[-5, 2], [5, 2], [5, 8], [-5, 8], [-5, 2]]]);
		for clipped in clip_geometry(&polygon, &bbox()).unwrap() {
			assert_eq!(clipped.type_name(), "Polygon");
		}
	}
}
