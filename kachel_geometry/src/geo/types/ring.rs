use super::{CompositeGeometryTrait, Coordinates, GeometryTrait, linestring::bounds_of};
use anyhow::{Result, ensure};
use std::fmt::Debug;

/// A closed ring: first and last point must be identical. Building block of
/// polygons.
#[derive(Clone, PartialEq)]
pub struct RingGeometry(pub Vec<Coordinates>);

impl RingGeometry {
	/// `true` if the ring is wound counter-clockwise (positive area).
	#[must_use]
	pub fn is_ccw(&self) -> bool {
		self.area() > 0.0
	}

	/// Reverses the winding in place.
	pub fn reverse(&mut self) {
		self.0.reverse();
	}

	/// Non-mutating version of [`reverse`](Self::reverse).
	#[must_use]
	pub fn reversed(mut self) -> RingGeometry {
		self.reverse();
		self
	}
}

impl GeometryTrait for RingGeometry {
	/// Signed area via the shoelace formula: positive for counter-clockwise
	/// winding, negative for clockwise. Twice the geometric area.
	fn area(&self) -> f64 {
		let mut sum = 0f64;
		if let Some(mut p2) = self.0.last() {
			for p1 in &self.0 {
				sum += (p2.x() - p1.x()) * (p1.y() + p2.y());
				p2 = p1;
			}
		}
		sum
	}

	fn verify(&self) -> Result<()> {
		ensure!(self.0.len() >= 4, "ring must have at least 4 points");
		ensure!(self.0.first() == self.0.last(), "ring must be closed");
		Ok(())
	}

	/// Ray-casting point-in-ring test.
	fn contains_point(&self, x: f64, y: f64) -> bool {
		let coords = &self.0;
		if coords.len() < 4 {
			return false;
		}

		let mut inside = false;
		let mut j = coords.len() - 1;

		for i in 0..coords.len() {
			let xi = coords[i].x();
			let yi = coords[i].y();
			let xj = coords[j].x();
			let yj = coords[j].y();

			if ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi) + xi) {
				inside = !inside;
			}
			j = i;
		}

		inside
	}

	fn compute_bounds(&self) -> Option<[f64; 4]> {
		bounds_of(&self.0)
	}
}

impl CompositeGeometryTrait<Coordinates> for RingGeometry {
	fn new() -> Self {
		Self(Vec::new())
	}
	fn as_vec(&self) -> &Vec<Coordinates> {
		&self.0
	}
	fn as_mut_vec(&mut self) -> &mut Vec<Coordinates> {
		&mut self.0
	}
	fn into_inner(self) -> Vec<Coordinates> {
		self.0
	}
}

impl Debug for RingGeometry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_list().entries(&self.0).finish()
	}
}

crate::impl_from_array!(RingGeometry, Coordinates);
