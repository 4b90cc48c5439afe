use super::*;
use anyhow::{Result, ensure};
use std::fmt::Debug;

/// A polygon: ring 0 is the outer boundary, all further rings are holes.
#[derive(Clone, PartialEq)]
pub struct PolygonGeometry(pub Vec<RingGeometry>);

impl PolygonGeometry {
	#[must_use]
	pub fn outer(&self) -> Option<&RingGeometry> {
		self.0.first()
	}

	/// The hole rings, if any.
	#[must_use]
	pub fn holes(&self) -> &[RingGeometry] {
		self.0.get(1..).unwrap_or(&[])
	}
}

impl GeometryTrait for PolygonGeometry {
	fn area(&self) -> f64 {
		let mut outer = true;
		let mut sum = 0.0;
		for ring in &self.0 {
			if outer {
				sum = ring.area().abs();
				outer = false;
			} else {
				sum -= ring.area().abs();
			}
		}
		sum
	}

	fn verify(&self) -> Result<()> {
		ensure!(!self.0.is_empty(), "polygon must have at least one ring");
		for ring in &self.0 {
			ring.verify()?;
		}
		Ok(())
	}

	/// `true` if the point is inside the outer ring and outside every hole.
	fn contains_point(&self, x: f64, y: f64) -> bool {
		match self.outer() {
			Some(outer) if outer.contains_point(x, y) => {
				!self.holes().iter().any(|hole| hole.contains_point(x, y))
			}
			_ => false,
		}
	}

	fn compute_bounds(&self) -> Option<[f64; 4]> {
		let mut rings = self.0.iter();
		let mut bounds = rings.next()?.compute_bounds()?;
		for ring in rings {
			if let Some(b) = ring.compute_bounds() {
				bounds[0] = bounds[0].min(b[0]);
				bounds[1] = bounds[1].min(b[1]);
				bounds[2] = bounds[2].max(b[2]);
				bounds[3] = bounds[3].max(b[3]);
			}
		}
		Some(bounds)
	}
}

impl CompositeGeometryTrait<RingGeometry> for PolygonGeometry {
	fn new() -> Self {
		Self(Vec::new())
	}
	fn as_vec(&self) -> &Vec<RingGeometry> {
		&self.0
	}
	fn as_mut_vec(&mut self) -> &mut Vec<RingGeometry> {
		&mut self.0
	}
	fn into_inner(self) -> Vec<RingGeometry> {
		self.0
	}
}

impl Debug for PolygonGeometry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_list().entries(&self.0).finish()
	}
}

crate::impl_from_array!(PolygonGeometry, RingGeometry);

#[cfg(test)]
mod tests {
	use super::*;

	fn donut() -> PolygonGeometry {
		PolygonGeometry::from(&[
			vec![[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]],
			vec![[4, 4], [6, 4], [6, 6], [4, 6], [4, 4]],
		])
	}

	#[test]
	fn area_subtracts_holes() {
		// 2x the geometric area, like the ring formula
		assert_eq!(donut().area(), 192.0);
	}

	#[test]
	fn contains_point_respects_holes() {
		let poly = donut();
		assert!(poly.contains_point(2.0, 2.0));
		assert!(!poly.contains_point(5.0, 5.0)); // inside the hole
		assert!(!poly.contains_point(11.0, 5.0));
	}

	#[test]
	fn bounds_cover_all_rings() {
		assert_eq!(donut().compute_bounds().unwrap(), [0.0, 0.0, 10.0, 10.0]);
	}

	#[test]
	fn verify_propagates_to_rings() {
		assert!(donut().verify().is_ok());
		assert!(PolygonGeometry::new().verify().is_err());
		let open = PolygonGeometry::from(&[vec![[0, 0], [1, 0], [1, 1], [0, 1]]]);
		assert!(open.verify().is_err());
	}
}
