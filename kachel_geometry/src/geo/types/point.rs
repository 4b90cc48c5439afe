use super::{Coordinates, GeometryTrait};
use std::fmt::Debug;

/// A single geographic point.
#[derive(Clone, PartialEq)]
pub struct PointGeometry(pub Coordinates);

impl PointGeometry {
	#[must_use]
	pub fn new(c: Coordinates) -> Self {
		Self(c)
	}

	#[must_use]
	pub fn x(&self) -> f64 {
		self.0.x()
	}

	#[must_use]
	pub fn y(&self) -> f64 {
		self.0.y()
	}
}

impl GeometryTrait for PointGeometry {
	fn area(&self) -> f64 {
		0.0
	}

	/// A point is always valid.
	fn verify(&self) -> anyhow::Result<()> {
		Ok(())
	}

	fn contains_point(&self, _x: f64, _y: f64) -> bool {
		false
	}

	fn compute_bounds(&self) -> Option<[f64; 4]> {
		Some([self.0.x(), self.0.y(), self.0.x(), self.0.y()])
	}
}

impl Debug for PointGeometry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.0.fmt(f)
	}
}

impl<T> From<T> for PointGeometry
where
	Coordinates: From<T>,
{
	fn from(value: T) -> Self {
		Self(Coordinates::from(value))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn accessors_and_bounds() {
		let p = PointGeometry::from(&[3, 7]);
		assert_eq!(p.x(), 3.0);
		assert_eq!(p.y(), 7.0);
		assert_eq!(p.compute_bounds().unwrap(), [3.0, 7.0, 3.0, 7.0]);
	}

	#[test]
	fn always_valid_never_contains() {
		let p = PointGeometry::from([5.0, 5.0]);
		assert!(p.verify().is_ok());
		assert!(!p.contains_point(5.0, 5.0));
		assert_eq!(p.area(), 0.0);
	}
}
